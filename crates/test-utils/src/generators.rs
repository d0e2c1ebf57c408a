//! Test data generators for creating synthetic u/v payloads.
//!
//! These generators create predictable, verifiable vector fields that can
//! be fed straight into the decoder.

use chrono::{TimeZone, Utc};
use velocity_common::{RecordHeader, VectorRecord};

/// Geometry of a synthetic grid as it appears in a record header.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridLayout {
    pub lo1: f64,
    pub la1: f64,
    pub dx: f64,
    pub dy: f64,
    pub nx: usize,
    pub ny: usize,
    pub scan_mode: u8,
}

impl GridLayout {
    /// Regular grid scanning east then south from (`lo1`, `la1`).
    pub fn new(lo1: f64, la1: f64, dx: f64, dy: f64, nx: usize, ny: usize) -> Self {
        Self {
            lo1,
            la1,
            dx,
            dy,
            nx,
            ny,
            scan_mode: 0,
        }
    }

    /// Global grid from 0°E / 90°N at the given resolution in degrees.
    ///
    /// # Example
    ///
    /// ```
    /// use test_utils::GridLayout;
    ///
    /// let layout = GridLayout::global(1.0);
    /// assert_eq!(layout.nx, 360);
    /// assert_eq!(layout.ny, 181);
    /// ```
    pub fn global(resolution: f64) -> Self {
        let nx = (360.0 / resolution).round() as usize;
        let ny = (180.0 / resolution).round() as usize + 1;
        Self::new(0.0, 90.0, resolution, resolution, nx, ny)
    }

    /// Longitude of column `i` (ignores scan direction).
    pub fn lon(&self, i: usize) -> f64 {
        self.lo1 + i as f64 * self.dx
    }

    /// Latitude of row `j` for a north-to-south scan.
    pub fn lat(&self, j: usize) -> f64 {
        self.la1 - j as f64 * self.dy
    }
}

/// Header for a synthetic component record.
pub fn header(layout: &GridLayout, category: u8, number: u8) -> RecordHeader {
    RecordHeader {
        parameter_category: category,
        parameter_number: number,
        parameter_number_name: None,
        parameter_unit: Some("m.s-1".to_string()),
        lo1: layout.lo1,
        la1: layout.la1,
        dx: layout.dx,
        dy: layout.dy,
        nx: layout.nx,
        ny: layout.ny,
        ref_time: Utc
            .with_ymd_and_hms(2024, 3, 1, 0, 0, 0)
            .single()
            .unwrap_or_default(),
        forecast_time: 6,
        scan_mode: layout.scan_mode,
        grid_definition_template: Some(0),
    }
}

/// Build a u/v payload by evaluating `f(lon, lat)` at every grid point.
///
/// Returning `None` marks the point as no-data in both components.
pub fn payload_from_fn<F>(layout: &GridLayout, f: F) -> Vec<VectorRecord>
where
    F: Fn(f64, f64) -> Option<(f32, f32)>,
{
    let mut u_data = Vec::with_capacity(layout.nx * layout.ny);
    let mut v_data = Vec::with_capacity(layout.nx * layout.ny);

    for j in 0..layout.ny {
        for i in 0..layout.nx {
            match f(layout.lon(i), layout.lat(j)) {
                Some((u, v)) => {
                    u_data.push(Some(u));
                    v_data.push(Some(v));
                }
                None => {
                    u_data.push(None);
                    v_data.push(None);
                }
            }
        }
    }

    vec![
        VectorRecord {
            header: header(layout, 2, 2),
            data: u_data,
        },
        VectorRecord {
            header: header(layout, 2, 3),
            data: v_data,
        },
    ]
}

/// Uniform field with the same vector everywhere.
pub fn uniform_payload(layout: &GridLayout, u: f32, v: f32) -> Vec<VectorRecord> {
    payload_from_fn(layout, |_, _| Some((u, v)))
}

/// Uniform field with selected flat indices marked as no-data.
pub fn payload_with_holes(layout: &GridLayout, u: f32, v: f32, holes: &[usize]) -> Vec<VectorRecord> {
    let mut records = uniform_payload(layout, u, v);
    for record in &mut records {
        for &index in holes {
            if let Some(slot) = record.data.get_mut(index) {
                *slot = None;
            }
        }
    }
    records
}

/// Solid-body rotation around (`center_lon`, `center_lat`).
///
/// Speed grows linearly with distance from the centre, capped at
/// `max_speed` m/s, which gives every colour bucket some particles.
pub fn vortex_payload(
    layout: &GridLayout,
    center_lon: f64,
    center_lat: f64,
    max_speed: f32,
) -> Vec<VectorRecord> {
    payload_from_fn(layout, |lon, lat| {
        let dx = lon - center_lon;
        let dy = lat - center_lat;
        let distance = (dx * dx + dy * dy).sqrt();
        if distance < 1e-9 {
            return Some((0.0, 0.0));
        }
        let speed = (distance as f32 * 0.5).min(max_speed);
        let u = (-dy / distance) as f32 * speed;
        let v = (dx / distance) as f32 * speed;
        Some((u, v))
    })
}

/// Zonal jet pattern: westerlies in mid-latitudes, easterlies near the
/// equator, with a gentle meridional wave.
pub fn zonal_jet_payload(layout: &GridLayout) -> Vec<VectorRecord> {
    payload_from_fn(layout, |lon, lat| {
        let phi = lat.to_radians();
        let u = (15.0 * (2.0 * phi).sin().powi(2) - 5.0 * phi.cos().powi(8)) as f32;
        let v = (3.0 * (3.0 * lon.to_radians()).sin() * phi.cos()) as f32;
        Some((u, v))
    })
}

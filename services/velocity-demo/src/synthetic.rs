//! Synthetic global wind payload used when no data file is given.

use chrono::{Duration, DurationRound, Utc};
use velocity_common::{RecordHeader, VectorRecord};

const RESOLUTION: f64 = 1.0;

/// Cyclones as (lon, lat, radius in degrees, peak speed in m/s).
/// Negative speeds rotate clockwise.
const VORTICES: [(f64, f64, f64, f64); 4] = [
    (-40.0, 45.0, 12.0, 22.0),
    (150.0, 20.0, 8.0, 35.0),
    (70.0, -15.0, 10.0, -25.0),
    (-100.0, -50.0, 15.0, -18.0),
];

/// Mid-latitude westerlies, equatorial easterlies and a handful of
/// Rankine vortices on a one-degree global grid.
pub fn global_payload() -> Vec<VectorRecord> {
    let nx = (360.0 / RESOLUTION) as usize;
    let ny = (180.0 / RESOLUTION) as usize + 1;

    let mut u = Vec::with_capacity(nx * ny);
    let mut v = Vec::with_capacity(nx * ny);
    for j in 0..ny {
        let lat = 90.0 - j as f64 * RESOLUTION;
        for i in 0..nx {
            let lon = i as f64 * RESOLUTION;
            let (wu, wv) = wind_at(lon, lat);
            u.push(Some(wu as f32));
            v.push(Some(wv as f32));
        }
    }

    vec![
        VectorRecord {
            header: header(2, "U-component_of_wind", nx, ny),
            data: u,
        },
        VectorRecord {
            header: header(3, "V-component_of_wind", nx, ny),
            data: v,
        },
    ]
}

fn wind_at(lon: f64, lat: f64) -> (f64, f64) {
    let phi = lat.to_radians();
    let mut u = 14.0 * (2.0 * phi).sin().powi(2) - 6.0 * phi.cos().powi(8);
    let mut v = 2.5 * (4.0 * lon.to_radians()).sin() * phi.cos();

    for &(center_lon, center_lat, radius, peak) in &VORTICES {
        let mut dx = lon - center_lon;
        if dx > 180.0 {
            dx -= 360.0;
        } else if dx < -180.0 {
            dx += 360.0;
        }
        let dy = lat - center_lat;
        let r = dx.hypot(dy);
        if r < 1e-6 {
            continue;
        }
        let speed = if r < radius {
            peak * r / radius
        } else {
            peak * radius / r
        };
        u += -dy / r * speed;
        v += dx / r * speed;
    }
    (u, v)
}

fn header(number: u8, name: &str, nx: usize, ny: usize) -> RecordHeader {
    let now = Utc::now();
    let ref_time = now.duration_trunc(Duration::hours(6)).unwrap_or(now);
    RecordHeader {
        parameter_category: 2,
        parameter_number: number,
        parameter_number_name: Some(name.to_string()),
        parameter_unit: Some("m.s-1".to_string()),
        lo1: 0.0,
        la1: 90.0,
        dx: RESOLUTION,
        dy: RESOLUTION,
        nx,
        ny,
        ref_time,
        forecast_time: 0,
        scan_mode: 0,
        grid_definition_template: Some(0),
    }
}

//! Spherical web-mercator viewport.
//!
//! Maps a geographic extent onto a pixel canvas the way slippy maps do:
//! longitude is linear in x, and y is linear in the mercator ordinate
//! `ln(tan(φ/2 + π/4))`.

use std::f64::consts::FRAC_PI_4;

use velocity_common::GeoExtent;

use crate::error::ProjectionError;
use crate::Projection;

/// Latitude limit of the spherical mercator plane.
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

/// Web-mercator view of `extent` rendered at `width` x `height` pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct MercatorViewport {
    extent: GeoExtent,
    width: u32,
    height: u32,
    west: f64,
    east: f64,
    y_min: f64,
    y_max: f64,
}

impl MercatorViewport {
    /// Create a viewport.
    ///
    /// The extent must be non-degenerate and lie within the mercator
    /// latitude limits.
    pub fn new(extent: GeoExtent, width: u32, height: u32) -> Result<Self, ProjectionError> {
        if width == 0 || height == 0 {
            return Err(ProjectionError::InvalidSize { width, height });
        }
        if extent.east <= extent.west || extent.north <= extent.south {
            return Err(ProjectionError::InvalidExtent(format!(
                "degenerate extent {:?}",
                extent
            )));
        }
        if extent.south < -MAX_LATITUDE || extent.north > MAX_LATITUDE {
            return Err(ProjectionError::InvalidExtent(format!(
                "latitudes must be within ±{:.4}°, got {} to {}",
                MAX_LATITUDE, extent.south, extent.north
            )));
        }

        Ok(Self {
            extent,
            width,
            height,
            west: extent.west.to_radians(),
            east: extent.east.to_radians(),
            y_min: mercator_y(extent.south.to_radians()),
            y_max: mercator_y(extent.north.to_radians()),
        })
    }

    /// Geographic extent shown by this viewport.
    pub fn extent(&self) -> GeoExtent {
        self.extent
    }

    /// Canvas size in pixels.
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl Projection for MercatorViewport {
    fn project(&self, lat: f64, lon: f64) -> (f64, f64) {
        let y = mercator_y(lat.to_radians());
        let x = (lon.to_radians() - self.west) * self.width as f64 / (self.east - self.west);
        let y = (self.y_max - y) * self.height as f64 / (self.y_max - self.y_min);
        (x, y)
    }

    fn invert(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        if !x.is_finite() || !y.is_finite() {
            return None;
        }
        let lon = self.west + x / self.width as f64 * (self.east - self.west);
        let merc = self.y_max - y / self.height as f64 * (self.y_max - self.y_min);
        let lat = 2.0 * merc.exp().atan() - 2.0 * FRAC_PI_4;
        Some((lon.to_degrees(), lat.to_degrees()))
    }
}

/// Mercator ordinate of a latitude in radians.
pub fn mercator_y(lat: f64) -> f64 {
    (lat / 2.0 + FRAC_PI_4).tan().ln()
}

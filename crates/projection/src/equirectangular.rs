//! Plate carrée viewport: longitude and latitude both linear in pixels.

use velocity_common::GeoExtent;

use crate::error::ProjectionError;
use crate::Projection;

/// Equirectangular view of `extent` rendered at `width` x `height` pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct EquirectangularViewport {
    extent: GeoExtent,
    width: u32,
    height: u32,
}

impl EquirectangularViewport {
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
        if extent.south < -90.0 || extent.north > 90.0 {
            return Err(ProjectionError::InvalidExtent(format!(
                "latitudes must be within ±90°, got {} to {}",
                extent.south, extent.north
            )));
        }
        Ok(Self {
            extent,
            width,
            height,
        })
    }

    pub fn extent(&self) -> GeoExtent {
        self.extent
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn pixels_per_degree(&self) -> (f64, f64) {
        (
            self.width as f64 / self.extent.lon_span(),
            self.height as f64 / self.extent.lat_span(),
        )
    }
}

impl Projection for EquirectangularViewport {
    fn project(&self, lat: f64, lon: f64) -> (f64, f64) {
        let (sx, sy) = self.pixels_per_degree();
        ((lon - self.extent.west) * sx, (self.extent.north - lat) * sy)
    }

    fn invert(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        let (sx, sy) = self.pixels_per_degree();
        let lon = self.extent.west + x / sx;
        let lat = self.extent.north - y / sy;
        if !lon.is_finite() || !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return None;
        }
        Some((lon, lat))
    }
}

//! Coordinate transformations between the map viewport and geography.
//!
//! The engine only depends on the [`Projection`] trait; the host map
//! supplies the implementation. [`MercatorViewport`] and
//! [`EquirectangularViewport`] are provided for headless hosts and tests.

pub mod distortion;
pub mod equirectangular;
pub mod error;
pub mod mercator;

pub use distortion::{distort, distortion, DISTORTION_STEP};
pub use equirectangular::EquirectangularViewport;
pub use error::ProjectionError;
pub use mercator::MercatorViewport;

use velocity_common::{GeoExtent, PixelBounds};

/// Conversion between geographic coordinates (degrees) and canvas pixels.
///
/// Implementations must be continuous and invertible over the visible
/// bounds; nothing else is assumed about the underlying projection.
pub trait Projection {
    /// Pixel position `(x, y)` of a geographic point.
    fn project(&self, lat: f64, lon: f64) -> (f64, f64);

    /// Geographic position `(lon, lat)` of a pixel, or `None` when the
    /// pixel does not map to a point on the globe.
    fn invert(&self, x: f64, y: f64) -> Option<(f64, f64)>;

    /// Pixel bounds covered by `extent`, clamped to a `width` x `height`
    /// canvas.
    fn pixel_bounds(&self, extent: &GeoExtent, width: u32, height: u32) -> PixelBounds {
        let upper_left = self.project(extent.north, extent.west);
        let lower_right = self.project(extent.south, extent.east);
        PixelBounds::from_corners(upper_left, lower_right, width, height)
    }
}

impl<P: Projection + ?Sized> Projection for &P {
    fn project(&self, lat: f64, lon: f64) -> (f64, f64) {
        (**self).project(lat, lon)
    }

    fn invert(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        (**self).invert(x, y)
    }
}

//! Local distortion correction for geographic vectors.
//!
//! A vector given in east/north components is turned into a pixel
//! displacement by applying the projection's local Jacobian, estimated by
//! finite differences around the sample point.

use nalgebra::{Matrix2, Vector2};
use velocity_common::FieldVector;

use crate::Projection;

/// Angular step in degrees used for the finite differences (10^-5.2).
pub const DISTORTION_STEP: f64 = 6.309_573_444_801_933e-6;

/// Local Jacobian of `projection` at (`lon`, `lat`), whose pixel position
/// is (`x`, `y`).
///
/// Columns hold the pixel change per degree east and per degree north.
/// The eastward column is divided by `cos(lat)` so that one degree of
/// longitude has the same ground length as one degree of latitude. The
/// step is taken towards the interior of the map (positive for negative
/// coordinates, negative otherwise).
pub fn distortion<P: Projection + ?Sized>(
    projection: &P,
    lon: f64,
    lat: f64,
    x: f64,
    y: f64,
) -> Matrix2<f64> {
    let h_lon = if lon < 0.0 { DISTORTION_STEP } else { -DISTORTION_STEP };
    let h_lat = if lat < 0.0 { DISTORTION_STEP } else { -DISTORTION_STEP };

    let p_lon = projection.project(lat, lon + h_lon);
    let p_lat = projection.project(lat + h_lat, lon);

    // Meridian scale factor
    let k = lat.to_radians().cos();

    Matrix2::new(
        (p_lon.0 - x) / h_lon / k,
        (p_lat.0 - x) / h_lat,
        (p_lon.1 - y) / h_lon / k,
        (p_lat.1 - y) / h_lat,
    )
}

/// Convert a geographic vector at (`lon`, `lat`) into a screen-space
/// displacement at pixel (`x`, `y`).
///
/// The components are multiplied by `scale` before the Jacobian is
/// applied. The magnitude of the input is kept, since colour classification
/// works on geographic speed.
pub fn distort<P: Projection + ?Sized>(
    projection: &P,
    lon: f64,
    lat: f64,
    x: f64,
    y: f64,
    scale: f64,
    vector: FieldVector,
) -> FieldVector {
    let scaled = Vector2::new(vector.u as f64 * scale, vector.v as f64 * scale);
    let screen = distortion(projection, lon, lat, x, y) * scaled;
    FieldVector::with_magnitude(screen.x as f32, screen.y as f32, vector.magnitude)
}

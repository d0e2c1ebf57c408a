//! Velocity vectors shared by the sampler, the screen field and readouts.

use serde::{Deserialize, Serialize};

/// A velocity vector with its precomputed magnitude.
///
/// In geographic space `u`/`v` are m/s eastward/northward; after distortion
/// correction they are pixel displacements per animation tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldVector {
    pub u: f32,
    pub v: f32,
    pub magnitude: f32,
}

impl FieldVector {
    /// Build a vector, computing the magnitude from the components.
    pub fn new(u: f32, v: f32) -> Self {
        Self {
            u,
            v,
            magnitude: (u * u + v * v).sqrt(),
        }
    }

    /// Build a vector with an explicit magnitude.
    ///
    /// Distorted screen vectors keep the magnitude of the geographic vector
    /// they came from, since colour buckets are defined in m/s.
    pub fn with_magnitude(u: f32, v: f32, magnitude: f32) -> Self {
        Self { u, v, magnitude }
    }

    /// Component-wise comparison with an absolute tolerance.
    pub fn approx_eq(&self, other: &FieldVector, tolerance: f32) -> bool {
        (self.u - other.u).abs() <= tolerance
            && (self.v - other.v).abs() <= tolerance
            && (self.magnitude - other.magnitude).abs() <= tolerance
    }
}

//! Common types and utilities shared across the velocity layer crates.

pub mod bounds;
pub mod error;
pub mod grid;
pub mod record;
pub mod vector;

pub use bounds::{GeoExtent, PixelBounds};
pub use error::{VelocityError, VelocityResult};
pub use grid::{GridGeometry, ScanMode};
pub use record::{RecordHeader, VectorRecord};
pub use vector::FieldVector;

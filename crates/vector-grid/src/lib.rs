//! Vector grid decoding and sampling.
//!
//! Turns a pair of u/v component records into an immutable [`Grid`] that
//! answers bilinear vector lookups at arbitrary geographic positions.

pub mod builder;
pub mod decode;
pub mod error;
pub mod grid;
pub mod tables;

pub use builder::{ComponentRanges, WindBuilder};
pub use decode::{decode, DecodedGrid};
pub use error::DecodeError;
pub use grid::{bilinear_interpolate_vector, floor_mod, Grid};
pub use tables::ComponentKind;

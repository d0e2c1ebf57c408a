//! Errors raised while decoding component records.

use thiserror::Error;
use velocity_common::VelocityError;

/// Fatal problems with a vector payload. No partial grid is ever produced.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DecodeError {
    #[error("expected u and v components, found {found} of 2")]
    MissingComponents { found: usize },

    #[error("unsupported grid definition template {0} (only 0, regular lat/lon, is supported)")]
    UnsupportedTemplate(u8),

    #[error("unsupported scan mode bits {0:#04x}")]
    UnsupportedScanMode(u8),

    #[error("u and v components disagree on grid geometry: {0}")]
    GeometryMismatch(String),

    #[error("{component} component has {actual} values, header declares {expected}")]
    DataLength {
        component: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("grid has no points")]
    EmptyGrid,

    #[error("grid spacing must be non-zero and finite")]
    InvalidSpacing,
}

impl From<DecodeError> for VelocityError {
    fn from(err: DecodeError) -> Self {
        VelocityError::Decode(err.to_string())
    }
}

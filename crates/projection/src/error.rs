use thiserror::Error;
use velocity_common::VelocityError;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProjectionError {
    #[error("Invalid viewport size: {width}x{height}")]
    InvalidSize { width: u32, height: u32 },

    #[error("Invalid extent: {0}")]
    InvalidExtent(String),
}

impl From<ProjectionError> for VelocityError {
    fn from(err: ProjectionError) -> Self {
        VelocityError::Projection(err.to_string())
    }
}

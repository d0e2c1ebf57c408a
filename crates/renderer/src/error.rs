use thiserror::Error;
use velocity_common::VelocityError;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    #[error("Failed to allocate {width}x{height} canvas")]
    CanvasAllocation { width: u32, height: u32 },

    #[error("Invalid colour: {0}")]
    InvalidColor(String),

    #[error("Canvas operation failed: {0}")]
    Canvas(String),

    #[error("PNG encoding failed: {0}")]
    Encode(String),
}

impl From<RenderError> for VelocityError {
    fn from(err: RenderError) -> Self {
        VelocityError::Render(err.to_string())
    }
}

//! Error types for the velocity layer.

use thiserror::Error;

/// Result type alias using VelocityError.
pub type VelocityResult<T> = Result<T, VelocityError>;

/// Primary error type for engine operations.
///
/// Sample misses and cancelled field builds are not errors; they are
/// modelled as `Option::None` and a cancelled batch outcome respectively.
#[derive(Debug, Error)]
pub enum VelocityError {
    // === Data Errors ===
    #[error("Unsupported vector data: {0}")]
    Decode(String),

    // === Configuration Errors ===
    #[error("Invalid configuration value for '{param}': {message}")]
    InvalidConfig { param: String, message: String },

    // === Rendering Errors ===
    #[error("Projection error: {0}")]
    Projection(String),

    #[error("Rendering failed: {0}")]
    Render(String),

    #[error("Frame failed: {0}")]
    Frame(String),

    // === Lifecycle Errors ===
    #[error("Engine not ready: {0}")]
    NotReady(String),

    // === Infrastructure Errors ===
    #[error("I/O error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl VelocityError {
    /// Shorthand for an `InvalidConfig` error.
    pub fn invalid_config(param: impl Into<String>, message: impl Into<String>) -> Self {
        VelocityError::InvalidConfig {
            param: param.into(),
            message: message.into(),
        }
    }

    /// Whether the animation loop can carry on after this error.
    ///
    /// Frame and render failures only cost a single frame; everything else
    /// prevents an animation from starting.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, VelocityError::Frame(_) | VelocityError::Render(_))
    }
}

// Conversion from common error types
impl From<std::io::Error> for VelocityError {
    fn from(err: std::io::Error) -> Self {
        VelocityError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for VelocityError {
    fn from(err: serde_json::Error) -> Self {
        VelocityError::Serialization(format!("JSON error: {}", err))
    }
}

impl From<serde_yaml::Error> for VelocityError {
    fn from(err: serde_yaml::Error) -> Self {
        VelocityError::Serialization(format!("YAML error: {}", err))
    }
}

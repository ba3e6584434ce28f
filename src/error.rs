//! Error types for diagram generation and rendering.

use thiserror::Error;

/// Errors surfaced by the core and the renderers.
#[derive(Debug, Error)]
pub enum CardioidError {
    /// A request parameter is outside the accepted domain.
    #[error("Invalid parameter {name}={value}: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: u64,
        reason: String,
    },

    /// The renderer could not lay out the canvas.
    #[error("Render error: {0}")]
    Render(String),

    /// Image encoding failed.
    #[error("Encode error: {0}")]
    Encode(#[from] image::ImageError),
}

impl CardioidError {
    pub fn invalid(name: &'static str, value: u64, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            value,
            reason: reason.into(),
        }
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// True when the caller supplied bad input rather than hitting an internal failure.
    pub fn is_invalid_parameter(&self) -> bool {
        matches!(self, Self::InvalidParameter { .. })
    }
}

pub type Result<T> = std::result::Result<T, CardioidError>;

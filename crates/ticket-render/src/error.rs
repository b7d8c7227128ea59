//! Rendering error types.

use thiserror::Error;

/// Result type for rendering operations.
pub type Result<T> = std::result::Result<T, RenderError>;

/// Errors raised while composing a ticket image.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Asset not found: {0}")]
    AssetNotFound(String),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("QR encoding error: {0}")]
    Qr(#[from] qrcode::types::QrError),

    #[error("Unknown font family: {0}")]
    UnknownFont(String),

    #[error("Invalid font data: {0}")]
    InvalidFont(String),

    #[error("Invalid template: {0}")]
    InvalidTemplate(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RenderError {
    pub fn invalid_template(msg: impl Into<String>) -> Self {
        Self::InvalidTemplate(msg.into())
    }
}

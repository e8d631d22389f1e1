//! # Error Types
//!
//! This module defines error types used throughout the etiqueta library.

use thiserror::Error;

/// Main error type for etiqueta operations
#[derive(Debug, Error)]
pub enum EtiquetaError {
    /// Render options rejected before any drawing work
    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    /// Output path outside the allowed directory or malformed
    #[error("Invalid output path: {0}")]
    InvalidPath(String),

    /// No usable typeface for a text draw
    #[error("Font error: {0}")]
    Font(String),

    /// Symbology mapping or symbol encoding failure
    #[error("Barcode error: {0}")]
    Barcode(String),

    /// Downloaded or inline graphic could not be decoded
    #[error("Graphic error: {0}")]
    Graphic(String),

    /// Degenerate or unsupported drawing parameters
    #[error("Draw error: {0}")]
    Draw(String),

    /// Image decoding error
    #[error("Image error: {0}")]
    Image(String),

    /// Final frame encoding error
    #[error("Encode error: {0}")]
    Encode(String),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<image::ImageError> for EtiquetaError {
    fn from(err: image::ImageError) -> Self {
        EtiquetaError::Image(err.to_string())
    }
}

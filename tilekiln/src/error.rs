//! Error types used by the crate.

use thiserror::Error;
use tilekiln_mvt::error::MvtError;
use tilekiln_types::error::TypesError;

/// Tilekiln error type.
#[derive(Debug, Error)]
pub enum TilekilnError {
    /// Error reading a file from the FS.
    #[error("failed to read file")]
    FsIo(#[from] std::io::Error),
    /// Error decoding a vector tile payload.
    #[error("failed to decode vector tile")]
    Decoding(#[from] MvtError),
    /// Image decoding or encoding error.
    #[error("image error: {0:?}")]
    Image(#[from] image::ImageError),
    /// Invalid style document.
    #[error("invalid style: {0}")]
    Style(String),
    /// Invalid geographic input.
    #[error("invalid coordinates: {0}")]
    Coordinates(#[from] TypesError),
    /// Render requested before the context was initialized.
    #[error("render context is not initialized")]
    NotInitialized,
    /// The native rasterizer failed to render a tile.
    #[error("render failed: {0}")]
    Render(String),
    /// Generic error - details are inside.
    #[error("{0}")]
    Generic(String),
}

impl From<serde_json::Error> for TilekilnError {
    fn from(value: serde_json::Error) -> Self {
        Self::Style(value.to_string())
    }
}

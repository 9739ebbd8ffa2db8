//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait is the metadata/thumbnail service the rest of
//! the server consumes: identify, read orientation, find a pre-existing
//! thumbnail, render a thumbnail, render an upright rendition.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), pure Rust and statically
//! linked into the binary. Tests use `tests::MockBackend`.

use super::params::{Orientation, RotateParams, ThumbnailParams};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Trait for image processing backends.
///
/// Rendering operations return encoded JPEG bytes; nothing is written to
/// disk. Implementations must be shareable across request threads.
pub trait ImageBackend: Send + Sync {
    /// Get stored image dimensions (before orientation correction).
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError>;

    /// Read the EXIF orientation. Files without one are [`Orientation::Normal`].
    fn read_orientation(&self, path: &Path) -> Result<Orientation, BackendError>;

    /// Locate a thumbnail that already exists next to the image, if any.
    fn find_external_thumbnail(&self, path: &Path) -> Option<PathBuf>;

    /// Render a thumbnail (orient + scale to width) as JPEG.
    fn thumbnail(&self, params: &ThumbnailParams) -> Result<Vec<u8>, BackendError>;

    /// Render a full-size upright rendition as JPEG.
    fn rotate(&self, params: &RotateParams) -> Result<Vec<u8>, BackendError>;
}

//! High-level image operations.
//!
//! These functions combine calculations with backend execution.
//! They take configuration, compute parameters, and call the backend.

use super::backend::{BackendError, ImageBackend};
use super::params::{Orientation, Quality, RotateParams, ThumbnailParams};
use std::path::Path;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Configuration for thumbnail and rendition encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThumbnailConfig {
    pub width: u32,
    pub quality: Quality,
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            width: 160,
            quality: Quality::default(),
        }
    }
}

/// Plan a thumbnail operation without executing it.
///
/// Useful for testing parameter generation.
pub fn plan_thumbnail(
    source: &Path,
    orientation: Orientation,
    config: &ThumbnailConfig,
) -> ThumbnailParams {
    ThumbnailParams {
        source: source.to_path_buf(),
        width: config.width,
        orientation,
        quality: config.quality,
    }
}

/// Create a thumbnail, returning encoded JPEG bytes.
pub fn create_thumbnail(
    backend: &impl ImageBackend,
    source: &Path,
    orientation: Orientation,
    config: &ThumbnailConfig,
) -> Result<Vec<u8>> {
    backend.thumbnail(&plan_thumbnail(source, orientation, config))
}

/// Create a full-size upright rendition, returning encoded JPEG bytes.
///
/// Callers serve `Normal` images straight from disk; this is only reached
/// for images that actually need turning.
pub fn create_rotated(
    backend: &impl ImageBackend,
    source: &Path,
    orientation: Orientation,
    config: &ThumbnailConfig,
) -> Result<Vec<u8>> {
    backend.rotate(&RotateParams {
        source: source.to_path_buf(),
        orientation,
        quality: config.quality,
    })
}

//! Pure Rust image processing backend.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, GIF) | `image` crate (pure Rust decoders) |
//! | Orientation | `ImageDecoder::orientation` (EXIF tag 0x0112) |
//! | Rotate | `DynamicImage::rotate90` / `rotate180` / `rotate270` |
//! | Resize | `DynamicImage::resize_exact` with `Triangle` filter |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` |

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::calculations::calculate_thumbnail_dimensions;
use super::params::{Orientation, Quality, RotateParams, ThumbnailParams};
use image::imageops::FilterType;
use image::{DynamicImage, ImageDecoder, ImageEncoder, ImageReader};
use std::path::{Path, PathBuf};

/// Directory next to the photos that may hold pre-rendered thumbnails.
pub const THUMBNAIL_DIR: &str = ".thumbnails";

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Load and decode an image from disk. The format is sniffed from content
/// so a mislabeled extension still decodes.
fn load_image(path: &Path) -> Result<DynamicImage, BackendError> {
    ImageReader::open(path)
        .map_err(BackendError::Io)?
        .with_guessed_format()
        .map_err(BackendError::Io)?
        .decode()
        .map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to decode {}: {}", path.display(), e))
        })
}

fn apply_orientation(img: DynamicImage, orientation: Orientation) -> DynamicImage {
    match orientation {
        Orientation::Normal => img,
        Orientation::Rotate90 => img.rotate90(),
        Orientation::Rotate180 => img.rotate180(),
        Orientation::Rotate270 => img.rotate270(),
    }
}

/// Encode as baseline JPEG. Alpha is dropped.
fn encode_jpeg(img: &DynamicImage, quality: Quality) -> Result<Vec<u8>, BackendError> {
    let rgb = img.to_rgb8();
    let mut out = Vec::new();
    image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, quality.value() as u8)
        .write_image(
            rgb.as_raw(),
            rgb.width(),
            rgb.height(),
            image::ExtendedColorType::Rgb8,
        )
        .map_err(|e| BackendError::ProcessingFailed(format!("JPEG encode failed: {}", e)))?;
    Ok(out)
}

impl ImageBackend for RustBackend {
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
        let (width, height) = image::image_dimensions(path).map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to read dimensions: {}", e))
        })?;
        Ok(Dimensions { width, height })
    }

    fn read_orientation(&self, path: &Path) -> Result<Orientation, BackendError> {
        // Only an unopenable file is an error; missing metadata is Normal
        let reader = ImageReader::open(path)?.with_guessed_format()?;
        Ok(reader
            .into_decoder()
            .and_then(|mut decoder| decoder.orientation())
            .map(Orientation::from)
            .unwrap_or_default())
    }

    fn find_external_thumbnail(&self, path: &Path) -> Option<PathBuf> {
        let dir = path.parent()?.join(THUMBNAIL_DIR);
        let same_name = dir.join(path.file_name()?);
        let mut jpeg_name = path.file_stem()?.to_os_string();
        jpeg_name.push(".jpg");
        let as_jpeg = dir.join(jpeg_name);
        [same_name, as_jpeg].into_iter().find(|p| p.is_file())
    }

    fn thumbnail(&self, params: &ThumbnailParams) -> Result<Vec<u8>, BackendError> {
        let img = apply_orientation(load_image(&params.source)?, params.orientation);
        let (w, h) = calculate_thumbnail_dimensions((img.width(), img.height()), params.width);
        let scaled = img.resize_exact(w, h, FilterType::Triangle);
        encode_jpeg(&scaled, params.quality)
    }

    fn rotate(&self, params: &RotateParams) -> Result<Vec<u8>, BackendError> {
        let img = apply_orientation(load_image(&params.source)?, params.orientation);
        encode_jpeg(&img, params.quality)
    }
}

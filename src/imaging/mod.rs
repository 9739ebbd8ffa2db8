//! Image processing: pure Rust, no system libraries.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::image_dimensions` |
//! | **Orientation** | `ImageDecoder::orientation` |
//! | **Thumbnail** | orient + `resize_exact` → JPEG |
//! | **Upright rendition** | orient → JPEG |
//! | **Pre-rendered thumbnail** | `.thumbnails/` next to the photo |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: High-level functions combining calculations + backend

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use calculations::{calculate_thumbnail_dimensions, upright_dimensions};
pub use operations::{ThumbnailConfig, create_rotated, create_thumbnail};
pub use params::{Orientation, Quality, RotateParams, ThumbnailParams};
pub use rust_backend::RustBackend;

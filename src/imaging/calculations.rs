//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

use super::params::Orientation;

/// Dimensions of an image after its orientation correction is applied.
///
/// Quarter turns swap width and height; everything else is unchanged.
///
/// # Examples
/// ```
/// # use simple_photo_server::imaging::{Orientation, upright_dimensions};
/// assert_eq!(upright_dimensions((4000, 3000), Orientation::Rotate90), (3000, 4000));
/// assert_eq!(upright_dimensions((4000, 3000), Orientation::Rotate180), (4000, 3000));
/// ```
pub fn upright_dimensions(stored: (u32, u32), orientation: Orientation) -> (u32, u32) {
    let (w, h) = stored;
    if orientation.is_quarter_turn() {
        (h, w)
    } else {
        (w, h)
    }
}

/// Calculate thumbnail dimensions for a fixed target width.
///
/// The height keeps the source aspect ratio, rounded to the nearest pixel and
/// never less than 1. A degenerate source (zero width or height) yields a
/// square thumbnail.
///
/// # Arguments
/// * `source` - Upright source dimensions (width, height)
/// * `width` - Thumbnail width in pixels
///
/// # Examples
/// ```
/// # use simple_photo_server::imaging::calculate_thumbnail_dimensions;
/// // 4:3 landscape at 160px wide → 160x120
/// assert_eq!(calculate_thumbnail_dimensions((4000, 3000), 160), (160, 120));
/// ```
pub fn calculate_thumbnail_dimensions(source: (u32, u32), width: u32) -> (u32, u32) {
    let (src_w, src_h) = source;
    if src_w == 0 || src_h == 0 {
        return (width, width);
    }
    let h = (width as f64 * src_h as f64 / src_w as f64).round() as u32;
    (width, h.max(1))
}

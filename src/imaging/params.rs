//! Parameter types for image operations.
//!
//! These structs describe *what* to produce, not *how*. They are the
//! interface between the [`operations`](super::operations) module (which
//! decides what a request needs) and the [`backend`](super::backend) (which
//! does the pixel work), so tests can swap in a mock backend without touching
//! operation logic.
//!
//! ## Types
//!
//! - [`Quality`]: JPEG encoding quality (1–100, default 80). Clamped on construction.
//! - [`Orientation`]: Rotation needed to display an image upright, from its EXIF tag.
//! - [`ThumbnailParams`]: Source, target width, orientation and quality for a thumbnail.
//! - [`RotateParams`]: Source, orientation and quality for a full-size upright rendition.

use std::path::PathBuf;

/// Quality setting for JPEG encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(80)
    }
}

/// Clockwise rotation that turns the stored pixels upright.
///
/// Only the four pure rotations are modeled. Mirrored EXIF orientations
/// (2, 4, 5, 7) are rare in camera output and are displayed as stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Orientation {
    #[default]
    Normal,
    Rotate90,
    Rotate180,
    Rotate270,
}

impl Orientation {
    pub fn degrees(self) -> u16 {
        match self {
            Orientation::Normal => 0,
            Orientation::Rotate90 => 90,
            Orientation::Rotate180 => 180,
            Orientation::Rotate270 => 270,
        }
    }

    /// True when the rotation swaps width and height.
    pub fn is_quarter_turn(self) -> bool {
        matches!(self, Orientation::Rotate90 | Orientation::Rotate270)
    }
}

impl From<image::metadata::Orientation> for Orientation {
    fn from(value: image::metadata::Orientation) -> Self {
        use image::metadata::Orientation as Exif;
        match value {
            Exif::Rotate90 => Orientation::Rotate90,
            Exif::Rotate180 => Orientation::Rotate180,
            Exif::Rotate270 => Orientation::Rotate270,
            _ => Orientation::Normal,
        }
    }
}

/// Parameters for a thumbnail operation (orient + scale to width).
#[derive(Debug, Clone, PartialEq)]
pub struct ThumbnailParams {
    pub source: PathBuf,
    /// Target width; the height follows the upright aspect ratio.
    pub width: u32,
    pub orientation: Orientation,
    pub quality: Quality,
}

/// Parameters for a full-size upright rendition.
#[derive(Debug, Clone, PartialEq)]
pub struct RotateParams {
    pub source: PathBuf,
    pub orientation: Orientation,
    pub quality: Quality,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_clamps_to_valid_range() {
        assert_eq!(Quality::new(0).value(), 1);
        assert_eq!(Quality::new(50).value(), 50);
        assert_eq!(Quality::new(150).value(), 100);
    }

    #[test]
    fn quality_default_is_80() {
        assert_eq!(Quality::default().value(), 80);
    }

    fn from_tag(value: u8) -> Orientation {
        image::metadata::Orientation::from_exif(value)
            .map(Orientation::from)
            .unwrap_or_default()
    }

    #[test]
    fn orientation_from_exif_values() {
        assert_eq!(from_tag(1), Orientation::Normal);
        assert_eq!(from_tag(6), Orientation::Rotate90);
        assert_eq!(from_tag(3), Orientation::Rotate180);
        assert_eq!(from_tag(8), Orientation::Rotate270);
    }

    #[test]
    fn mirrored_and_unknown_orientations_are_normal() {
        for value in [0, 2, 4, 5, 7, 9, 255] {
            assert_eq!(from_tag(value), Orientation::Normal);
        }
    }

    #[test]
    fn orientation_degrees() {
        assert_eq!(Orientation::Normal.degrees(), 0);
        assert_eq!(Orientation::Rotate90.degrees(), 90);
        assert_eq!(Orientation::Rotate180.degrees(), 180);
        assert_eq!(Orientation::Rotate270.degrees(), 270);
    }

    #[test]
    fn quarter_turns_swap_axes() {
        assert!(Orientation::Rotate90.is_quarter_turn());
        assert!(Orientation::Rotate270.is_quarter_turn());
        assert!(!Orientation::Rotate180.is_quarter_turn());
        assert!(!Orientation::Normal.is_quarter_turn());
    }
}

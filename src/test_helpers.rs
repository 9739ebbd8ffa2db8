//! Shared test utilities for the simple-photo-server test suite.
//!
//! Builds photo trees in temp directories with controlled modification
//! times, writes real or placeholder media files, and provides name
//! extractors for entity listings.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = photo_tree();
//! let registry = EntityRegistry::new(0);
//! let root = registry.get_or_create_directory(tmp.path());
//!
//! assert_eq!(dir_names(&root.subdirectories(&registry)), ["2023", "Zeta"]);
//! assert_eq!(file_names(&root.files(&registry)), ["b.png", "a.jpg"]);
//! ```

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

use crate::entry::{DirectoryEntry, FileEntry};

// =========================================================================
// Fixture setup
// =========================================================================

/// Build the standard photo tree used across module tests.
///
/// ```text
/// root/
///   a.jpg        mtime 100
///   b.png        mtime 200
///   notes.txt
///   2023/
///     x.jpg      mtime 300
///     y.gif      mtime 400
///     empty/     (no media)
///   .hidden/
///     h.jpg
///   Zeta/
///     z.jpg      mtime 500
/// ```
///
/// Media files hold placeholder bytes, not decodable images.
pub fn photo_tree() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();

    write_media(&root.join("a.jpg"), 100);
    write_media(&root.join("b.png"), 200);
    std::fs::write(root.join("notes.txt"), "not a photo").unwrap();

    std::fs::create_dir_all(root.join("2023/empty")).unwrap();
    write_media(&root.join("2023/x.jpg"), 300);
    write_media(&root.join("2023/y.gif"), 400);

    std::fs::create_dir_all(root.join(".hidden")).unwrap();
    write_media(&root.join(".hidden/h.jpg"), 600);

    std::fs::create_dir_all(root.join("Zeta")).unwrap();
    write_media(&root.join("Zeta/z.jpg"), 500);

    tmp
}

/// Create a directory holding `count` placeholder photos named
/// `img00.jpg`, `img01.jpg`, ... where a higher index is newer.
pub fn numbered_photos(dir: &Path, count: usize) {
    std::fs::create_dir_all(dir).unwrap();
    for i in 0..count {
        write_media(&dir.join(format!("img{i:02}.jpg")), 1_000 + i as u64);
    }
}

/// Write placeholder media bytes and set the modification time.
pub fn write_media(path: &Path, mtime_secs: u64) {
    std::fs::write(path, b"placeholder image bytes").unwrap();
    set_mtime(path, mtime_secs);
}

/// Set a file's modification time to `secs` after the Unix epoch.
pub fn set_mtime(path: &Path, secs: u64) {
    let file = std::fs::File::options().write(true).open(path).unwrap();
    file.set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(secs))
        .unwrap();
}

// =========================================================================
// Image bytes
// =========================================================================

/// Encode a small gradient JPEG of the given size.
pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    use image::{ImageEncoder, RgbImage};

    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    let mut out = Vec::new();
    image::codecs::jpeg::JpegEncoder::new(&mut out)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
    out
}

/// Write a decodable JPEG, optionally tagged with an EXIF orientation.
pub fn write_jpeg(path: &Path, width: u32, height: u32, orientation: Option<u16>) {
    let mut bytes = jpeg_bytes(width, height);
    if let Some(value) = orientation {
        bytes = splice_after_soi(&bytes, &exif_orientation_segment(value, true));
    }
    std::fs::write(path, bytes).unwrap();
}

/// Build a complete APP1 segment (marker included) carrying a minimal EXIF
/// block whose IFD0 holds only the orientation tag.
pub fn exif_orientation_segment(orientation: u16, big_endian: bool) -> Vec<u8> {
    let u16_bytes = |v: u16| {
        if big_endian {
            v.to_be_bytes()
        } else {
            v.to_le_bytes()
        }
    };
    let u32_bytes = |v: u32| {
        if big_endian {
            v.to_be_bytes()
        } else {
            v.to_le_bytes()
        }
    };

    let mut tiff = Vec::new();
    tiff.extend_from_slice(if big_endian { b"MM" } else { b"II" });
    tiff.extend_from_slice(&u16_bytes(42));
    tiff.extend_from_slice(&u32_bytes(8));
    // IFD0: one entry
    tiff.extend_from_slice(&u16_bytes(1));
    tiff.extend_from_slice(&u16_bytes(0x0112));
    tiff.extend_from_slice(&u16_bytes(3));
    tiff.extend_from_slice(&u32_bytes(1));
    tiff.extend_from_slice(&u16_bytes(orientation));
    tiff.extend_from_slice(&[0, 0]);
    // No next IFD
    tiff.extend_from_slice(&u32_bytes(0));

    let mut payload = b"Exif\0\0".to_vec();
    payload.extend_from_slice(&tiff);

    let mut segment = vec![0xFF, 0xE1];
    segment.extend_from_slice(&((payload.len() + 2) as u16).to_be_bytes());
    segment.extend_from_slice(&payload);
    segment
}

/// Insert a marker segment directly after the JPEG SOI marker.
pub fn splice_after_soi(jpeg: &[u8], segment: &[u8]) -> Vec<u8> {
    let mut out = jpeg[..2].to_vec();
    out.extend_from_slice(segment);
    out.extend_from_slice(&jpeg[2..]);
    out
}

// =========================================================================
// Entity listings
// =========================================================================

/// Directory names in listing order.
pub fn dir_names(dirs: &[Arc<DirectoryEntry>]) -> Vec<String> {
    dirs.iter().map(|d| d.name().to_string()).collect()
}

/// File names in listing order.
pub fn file_names(files: &[Arc<FileEntry>]) -> Vec<String> {
    files.iter().map(|f| f.file_name()).collect()
}

//! In-memory tree nodes mirroring the photo directories on disk.
//!
//! A [`DirectoryEntry`] is created with only its media-file count; its child
//! lists are populated on first request and frozen for the rest of the
//! process. A [`FileEntry`] memoizes the expensive per-image lookups (external
//! thumbnail, dimensions, orientation) so each runs at most once.
//!
//! Entries are always obtained through the
//! [`EntityRegistry`](crate::registry::EntityRegistry), which guarantees one
//! live instance per path.
//!
//! A path that does not exist (or cannot be listed) yields an entry with empty
//! children rather than an error, so tree traversal never fails on a stale
//! path.

use crate::imaging::{Dimensions, Orientation};
use crate::registry::EntityRegistry;
use std::fs::DirEntry;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use std::time::SystemTime;

/// File extensions served as photos (compared case-insensitively).
pub const MEDIA_EXTENSIONS: &[&str] = &["jpg", "png", "gif"];

/// Path fragments of platform-internal trees that are never browsed.
const EXCLUDED_PATH_FRAGMENTS: &[&str] = &["/data/data", "/Android/data/"];

/// Whether a path has a recognized media extension.
pub fn has_media_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| MEDIA_EXTENSIONS.iter().any(|m| ext.eq_ignore_ascii_case(m)))
}

/// Whether a directory path may appear in the browsable tree.
///
/// Hidden directories (leading `.`) and platform-internal data directories are
/// excluded.
pub fn is_browsable_directory(path: &Path) -> bool {
    let hidden = path
        .file_name()
        .is_some_and(|n| n.to_string_lossy().starts_with('.'));
    if hidden {
        return false;
    }
    let full = path.to_string_lossy();
    !EXCLUDED_PATH_FRAGMENTS.iter().any(|frag| full.contains(frag))
}

/// Immediate children of `dir`, or nothing when it cannot be read.
fn list_children(dir: &Path) -> Vec<DirEntry> {
    match std::fs::read_dir(dir) {
        Ok(entries) => entries.filter_map(Result::ok).collect(),
        Err(e) => {
            log::debug!("Cannot list {}: {}", dir.display(), e);
            Vec::new()
        }
    }
}

/// Media files directly inside `dir`. A symlink to a file counts, under the
/// link's own path.
fn media_files_in(dir: &Path) -> impl Iterator<Item = PathBuf> {
    list_children(dir)
        .into_iter()
        .map(|e| e.path())
        .filter(|p| has_media_extension(p) && p.is_file())
}

/// Browsable subdirectories directly inside `dir`. Symlinked directories are
/// not followed, so the tree cannot contain cycles.
fn subdirectories_in(dir: &Path) -> impl Iterator<Item = PathBuf> {
    list_children(dir)
        .into_iter()
        .filter(|e| e.file_type().is_ok_and(|t| t.is_dir()))
        .map(|e| e.path())
        .filter(|p| is_browsable_directory(p))
}

// ============================================================================
// DirectoryEntry
// ============================================================================

/// One directory of the browsable tree.
#[derive(Debug)]
pub struct DirectoryEntry {
    path: PathBuf,
    name: String,
    media_file_count: usize,
    subdirectories: OnceLock<Vec<Arc<DirectoryEntry>>>,
    files: OnceLock<Vec<Arc<FileEntry>>>,
}

impl DirectoryEntry {
    /// Create an entry for `path`, counting its media files but listing
    /// nothing else.
    pub fn new(path: PathBuf) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        let media_file_count = media_files_in(&path).count();
        Self {
            path,
            name,
            media_file_count,
            subdirectories: OnceLock::new(),
            files: OnceLock::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Last path segment (the full path for a filesystem root).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of media files directly in this directory.
    pub fn media_file_count(&self) -> usize {
        self.media_file_count
    }

    /// Child directories, sorted ascending by name.
    ///
    /// Populated on first call; every child goes through the registry so it
    /// shares its instance with any other caller.
    pub fn subdirectories(&self, registry: &EntityRegistry) -> &[Arc<DirectoryEntry>] {
        self.subdirectories.get_or_init(|| {
            let mut dirs: Vec<_> = subdirectories_in(&self.path)
                .map(|p| registry.get_or_create_directory(&p))
                .collect();
            dirs.sort_by(|a, b| a.name.cmp(&b.name));
            log::debug!(
                "Listed {} subdirectories of {}",
                dirs.len(),
                self.path.display()
            );
            dirs
        })
    }

    /// Media files, most recently modified first.
    ///
    /// Files with equal timestamps keep their listing order.
    pub fn files(&self, registry: &EntityRegistry) -> &[Arc<FileEntry>] {
        self.files.get_or_init(|| {
            let mut files: Vec<_> = media_files_in(&self.path)
                .map(|p| registry.get_or_create_file(&p))
                .collect();
            files.sort_by(|a, b| b.last_modified.cmp(&a.last_modified));
            files
        })
    }

    /// Whether the child lists have been populated yet.
    pub fn is_populated(&self) -> bool {
        self.subdirectories.get().is_some() && self.files.get().is_some()
    }

    /// True when this directory or any descendant holds a media file.
    ///
    /// Used by the tree renderer to prune empty branches.
    pub fn has_media_in_subtree(&self, registry: &EntityRegistry) -> bool {
        self.media_file_count > 0
            || self
                .subdirectories(registry)
                .iter()
                .any(|d| d.has_media_in_subtree(registry))
    }
}

impl PartialEq for DirectoryEntry {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path && self.name == other.name
    }
}

impl Eq for DirectoryEntry {}

// ============================================================================
// FileEntry
// ============================================================================

/// One media file.
#[derive(Debug)]
pub struct FileEntry {
    path: PathBuf,
    last_modified: SystemTime,
    /// Set exactly once, after the first external thumbnail lookup.
    external_thumbnail: OnceLock<Option<PathBuf>>,
    dimensions: OnceLock<Dimensions>,
    orientation: OnceLock<Orientation>,
}

impl FileEntry {
    /// Create an entry, reading the modification time. A missing file gets
    /// the Unix epoch.
    pub fn new(path: PathBuf) -> Self {
        let last_modified = std::fs::metadata(&path)
            .and_then(|m| m.modified())
            .unwrap_or(SystemTime::UNIX_EPOCH);
        Self {
            path,
            last_modified,
            external_thumbnail: OnceLock::new(),
            dimensions: OnceLock::new(),
            orientation: OnceLock::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn last_modified(&self) -> SystemTime {
        self.last_modified
    }

    /// Pre-existing thumbnail for this file, looked up at most once.
    pub fn external_thumbnail(
        &self,
        lookup: impl FnOnce(&Path) -> Option<PathBuf>,
    ) -> Option<&Path> {
        self.external_thumbnail
            .get_or_init(|| lookup(&self.path))
            .as_deref()
    }

    /// Whether the external thumbnail lookup has already run.
    pub fn thumbnail_checked(&self) -> bool {
        self.external_thumbnail.get().is_some()
    }

    /// Orientation, read at most once.
    pub fn orientation(&self, read: impl FnOnce(&Path) -> Orientation) -> Orientation {
        *self.orientation.get_or_init(|| read(&self.path))
    }

    /// Stored dimensions, identified at most once. A failed identify is not
    /// memoized.
    pub fn dimensions<E>(
        &self,
        identify: impl FnOnce(&Path) -> Result<Dimensions, E>,
    ) -> Result<Dimensions, E> {
        if let Some(dims) = self.dimensions.get() {
            return Ok(*dims);
        }
        let dims = identify(&self.path)?;
        Ok(*self.dimensions.get_or_init(|| dims))
    }
}

impl PartialEq for FileEntry {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl Eq for FileEntry {}

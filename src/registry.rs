//! Process-wide registry of directory and file entries.
//!
//! The registry is constructed once at startup and shared by reference with
//! every request thread. It maps canonical paths to the single live
//! [`DirectoryEntry`] / [`FileEntry`] for that path, and owns the
//! [`ContentCache`] for derived image bytes.
//!
//! Directories are keyed by [`canonical_path`]. Files are keyed by
//! [`file_key`]: the canonical parent joined with the file's own name, so a
//! symlinked photo stays listed under the directory that holds the link.
//!
//! ## Get-or-create
//!
//! Each map sits behind its own [`parking_lot::Mutex`], held across the whole
//! check-then-create sequence, so racing callers for the same path construct
//! exactly one entry and all observe it. Construction never calls back into
//! the registry (a directory only counts its media files; child lists are
//! populated later, outside the lock), so holding the lock cannot deadlock.

use crate::content_cache::ContentCache;
use crate::entry::{DirectoryEntry, FileEntry};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Absolute form of `path` with symlinks and `..` resolved when the path
/// exists. A missing path is made absolute lexically so it still has a
/// stable identity.
pub fn canonical_path(path: &Path) -> PathBuf {
    std::fs::canonicalize(path)
        .or_else(|_| std::path::absolute(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

/// Registry key of a file: canonical parent plus the unresolved file name.
pub fn file_key(path: &Path) -> PathBuf {
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) => {
            let parent = if parent.as_os_str().is_empty() {
                Path::new(".")
            } else {
                parent
            };
            canonical_path(parent).join(name)
        }
        _ => canonical_path(path),
    }
}

pub struct EntityRegistry {
    directories: Mutex<HashMap<PathBuf, Arc<DirectoryEntry>>>,
    files: Mutex<HashMap<PathBuf, Arc<FileEntry>>>,
    content: ContentCache,
}

impl EntityRegistry {
    /// Create an empty registry whose content cache holds up to
    /// `cache_max_bytes` bytes.
    pub fn new(cache_max_bytes: usize) -> Self {
        Self {
            directories: Mutex::new(HashMap::new()),
            files: Mutex::new(HashMap::new()),
            content: ContentCache::new(cache_max_bytes),
        }
    }

    /// The single entry for a directory, creating it on first access.
    pub fn get_or_create_directory(&self, path: &Path) -> Arc<DirectoryEntry> {
        let key = canonical_path(path);
        let mut directories = self.directories.lock();
        directories
            .entry(key)
            .or_insert_with_key(|key| {
                log::debug!("Registering directory {}", key.display());
                Arc::new(DirectoryEntry::new(key.clone()))
            })
            .clone()
    }

    /// The single entry for a file, creating it on first access.
    pub fn get_or_create_file(&self, path: &Path) -> Arc<FileEntry> {
        let key = file_key(path);
        let mut files = self.files.lock();
        files
            .entry(key)
            .or_insert_with_key(|key| Arc::new(FileEntry::new(key.clone())))
            .clone()
    }

    /// The directory entry, if one has been created.
    pub fn directory(&self, path: &Path) -> Option<Arc<DirectoryEntry>> {
        self.directories.lock().get(&canonical_path(path)).cloned()
    }

    /// The file entry, if one has been created.
    pub fn file(&self, path: &Path) -> Option<Arc<FileEntry>> {
        self.files.lock().get(&file_key(path)).cloned()
    }

    /// Register an externally built directory entry under its canonical
    /// path.
    ///
    /// Idempotent: if the path is already registered the existing entry is
    /// kept and returned.
    pub fn register_directory(&self, entry: DirectoryEntry) -> Arc<DirectoryEntry> {
        let key = canonical_path(entry.path());
        self.directories
            .lock()
            .entry(key)
            .or_insert_with(|| Arc::new(entry))
            .clone()
    }

    /// Register an externally built file entry. Idempotent like
    /// [`register_directory`](Self::register_directory).
    pub fn register_file(&self, entry: FileEntry) -> Arc<FileEntry> {
        let key = file_key(entry.path());
        self.files
            .lock()
            .entry(key)
            .or_insert_with(|| Arc::new(entry))
            .clone()
    }

    /// Cache of derived image bytes.
    pub fn content(&self) -> &ContentCache {
        &self.content
    }

    /// Number of registered directories and files.
    pub fn counts(&self) -> (usize, usize) {
        (self.directories.lock().len(), self.files.lock().len())
    }
}

//! The photo library: everything a request handler needs, behind one handle.
//!
//! A [`PhotoLibrary`] is built once at startup from the [`ServerConfig`] and
//! shared (by `Arc`) with every connection thread. It owns the
//! [`EntityRegistry`], the image backend and the configured roots, and
//! exposes the operations the HTTP layer calls:
//!
//! | Operation | Purpose |
//! |---|---|
//! | [`resolve_directory`](PhotoLibrary::resolve_directory) / [`resolve_file`](PhotoLibrary::resolve_file) | Entity lookup through the registry |
//! | [`resolve_navigation_state`](PhotoLibrary::resolve_navigation_state) | Request → navigation state |
//! | [`sibling_paths`](PhotoLibrary::sibling_paths) | Previous/next image |
//! | [`get_cached_bytes`](PhotoLibrary::get_cached_bytes) / [`put_cached_bytes`](PhotoLibrary::put_cached_bytes) | Content cache access |
//! | [`thumbnail_bytes`](PhotoLibrary::thumbnail_bytes) | Thumbnail JPEG, cached |
//! | [`image_bytes`](PhotoLibrary::image_bytes) | Upright image, cached when it had to be turned |
//!
//! ## Generation
//!
//! Producing a thumbnail or rendition decodes a full-size photo. All
//! generation runs under one global lock, independent of the cache lock, so
//! at most one photo is decoded at a time. A request that waited for the lock
//! checks the cache again before generating.
//!
//! A failed generation is returned as [`ConversionError`] and never cached.

use crate::config::ServerConfig;
use crate::content_cache::CacheKey;
use crate::entry::{DirectoryEntry, FileEntry, is_browsable_directory};
use crate::imaging::{
    BackendError, Dimensions, ImageBackend, Orientation, Quality, ThumbnailConfig,
    create_rotated, create_thumbnail, upright_dimensions,
};
use crate::navigation::{self, NavigationRequest, NavigationState, Siblings};
use crate::registry::{EntityRegistry, canonical_path, file_key};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConversionError {
    #[error("Image conversion failed: {0}")]
    Backend(#[from] BackendError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Library settings derived from the server config.
#[derive(Debug, Clone)]
pub struct LibraryConfig {
    pub roots: Vec<PathBuf>,
    pub cache_max_bytes: usize,
    pub thumbnails: ThumbnailConfig,
    pub page_size: usize,
}

impl LibraryConfig {
    /// Build a LibraryConfig from ServerConfig values.
    pub fn from_server_config(config: &ServerConfig) -> Self {
        Self {
            roots: config.roots.clone(),
            cache_max_bytes: config.cache.max_bytes,
            thumbnails: ThumbnailConfig {
                width: config.thumbnails.width,
                quality: Quality::new(config.thumbnails.quality),
            },
            page_size: config.page_size(),
        }
    }
}

pub struct PhotoLibrary<B: ImageBackend> {
    roots: Vec<PathBuf>,
    registry: EntityRegistry,
    backend: B,
    thumbnails: ThumbnailConfig,
    page_size: usize,
    generation: Mutex<()>,
}

impl<B: ImageBackend> PhotoLibrary<B> {
    /// Create a library. Roots are canonicalized; duplicates are dropped.
    pub fn new(config: LibraryConfig, backend: B) -> Self {
        let mut roots: Vec<PathBuf> = Vec::new();
        for root in &config.roots {
            let root = canonical_path(root);
            if !roots.contains(&root) {
                roots.push(root);
            }
        }
        Self {
            roots,
            registry: EntityRegistry::new(config.cache_max_bytes),
            backend,
            thumbnails: config.thumbnails,
            page_size: config.page_size.max(1),
            generation: Mutex::new(()),
        }
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Whether a resolved path is served: it lies inside (or is) one of the
    /// roots and no directory below that root is left out of the tree.
    fn is_within_roots(&self, path: &Path) -> bool {
        self.roots.iter().any(|root| {
            let Ok(relative) = path.strip_prefix(root) else {
                return false;
            };
            relative
                .ancestors()
                .filter(|a| !a.as_os_str().is_empty())
                .map(|a| root.join(a))
                .filter(|dir| dir.as_path() != path || path.is_dir())
                .all(|dir| is_browsable_directory(&dir))
        })
    }

    /// Registry form of a requested path if it exists inside the roots.
    ///
    /// Directories are fully canonicalized. A file keeps its own name, so a
    /// symlinked photo is located where its link lives.
    ///
    /// `None` means the request should be answered with "not found".
    pub fn locate(&self, path: &Path) -> Option<PathBuf> {
        let mut path = file_key(path);
        if path.is_dir() {
            path = canonical_path(&path);
        }
        if !path.exists() {
            return None;
        }
        if !self.is_within_roots(&path) {
            log::warn!("Rejected path outside the browsable roots: {}", path.display());
            return None;
        }
        Some(path)
    }

    // ------------------------------------------------------------------
    // Entity and navigation operations
    // ------------------------------------------------------------------

    pub fn resolve_directory(&self, path: &Path) -> Arc<DirectoryEntry> {
        self.registry.get_or_create_directory(path)
    }

    pub fn resolve_file(&self, path: &Path) -> Arc<FileEntry> {
        self.registry.get_or_create_file(path)
    }

    /// Directory entries of all roots, in configured order.
    pub fn root_directories(&self) -> Vec<Arc<DirectoryEntry>> {
        self.roots
            .iter()
            .map(|root| self.registry.get_or_create_directory(root))
            .collect()
    }

    pub fn resolve_navigation_state(&self, request: &NavigationRequest) -> NavigationState {
        navigation::resolve_navigation_state(&self.registry, request, self.page_size)
    }

    /// Apply default selection to a resolved state, using the directory's
    /// files. Returns `true` if an image was selected.
    pub fn select_default_image(&self, state: &mut NavigationState) -> bool {
        let Some(dir) = state.current_directory.clone() else {
            return false;
        };
        let directory = self.resolve_directory(&dir);
        navigation::select_default_image(state, directory.files(&self.registry), self.page_size)
    }

    pub fn sibling_paths(&self, directory: &DirectoryEntry, image: &Path) -> Siblings {
        navigation::sibling_paths(directory.files(&self.registry), image)
    }

    // ------------------------------------------------------------------
    // Content cache
    // ------------------------------------------------------------------

    pub fn get_cached_bytes(&self, key: &CacheKey) -> Option<Arc<[u8]>> {
        self.registry.content().get(key)
    }

    /// Store derived bytes. Returns `false` if the cache declined them.
    pub fn put_cached_bytes(&self, key: CacheKey, bytes: impl Into<Arc<[u8]>>) -> bool {
        self.registry.content().put(key, bytes)
    }

    // ------------------------------------------------------------------
    // Image metadata
    // ------------------------------------------------------------------

    /// Orientation of a file, read once. Unreadable files count as upright.
    pub fn orientation(&self, file: &FileEntry) -> Orientation {
        file.orientation(|path| {
            self.backend.read_orientation(path).unwrap_or_else(|e| {
                log::warn!("Cannot read orientation of {}: {}", path.display(), e);
                Orientation::Normal
            })
        })
    }

    /// Stored dimensions of a file, identified once.
    pub fn dimensions(&self, file: &FileEntry) -> Result<Dimensions, ConversionError> {
        Ok(file.dimensions(|path| self.backend.identify(path))?)
    }

    /// Size of the image as displayed, if it can be identified.
    pub fn display_dimensions(&self, file: &FileEntry) -> Option<(u32, u32)> {
        let dims = self
            .dimensions(file)
            .inspect_err(|e| log::debug!("Cannot identify {}: {}", file.path().display(), e))
            .ok()?;
        Some(upright_dimensions(
            (dims.width, dims.height),
            self.orientation(file),
        ))
    }

    // ------------------------------------------------------------------
    // Derived content
    // ------------------------------------------------------------------

    /// Thumbnail JPEG for a file.
    ///
    /// Order: content cache, then a pre-existing thumbnail on disk (served
    /// as-is, uncached), then generation.
    pub fn thumbnail_bytes(&self, file: &FileEntry) -> Result<Arc<[u8]>, ConversionError> {
        let key = CacheKey::thumbnail(file.path(), self.thumbnails.width);
        if let Some(bytes) = self.get_cached_bytes(&key) {
            return Ok(bytes);
        }

        if let Some(external) =
            file.external_thumbnail(|path| self.backend.find_external_thumbnail(path))
        {
            log::debug!("Serving pre-rendered thumbnail {}", external.display());
            return Ok(std::fs::read(external)?.into());
        }

        self.generate(key, || {
            let orientation = self.orientation(file);
            create_thumbnail(&self.backend, file.path(), orientation, &self.thumbnails)
        })
    }

    /// The image as it should be displayed.
    ///
    /// Upright files are read straight from disk and never cached. Files that
    /// need turning are served from a cached rotated rendition.
    pub fn image_bytes(&self, file: &FileEntry) -> Result<Arc<[u8]>, ConversionError> {
        let orientation = self.orientation(file);
        if orientation == Orientation::Normal {
            return Ok(std::fs::read(file.path())?.into());
        }

        let key = CacheKey::rotated(file.path(), orientation.degrees());
        if let Some(bytes) = self.get_cached_bytes(&key) {
            return Ok(bytes);
        }
        self.generate(key, || {
            create_rotated(&self.backend, file.path(), orientation, &self.thumbnails)
        })
    }

    /// Run one generation under the global lock and cache its result.
    fn generate(
        &self,
        key: CacheKey,
        produce: impl FnOnce() -> Result<Vec<u8>, BackendError>,
    ) -> Result<Arc<[u8]>, ConversionError> {
        let _guard = self.generation.lock();
        // Another request may have produced it while this one waited
        if let Some(bytes) = self.registry.content().get(&key) {
            return Ok(bytes);
        }
        let bytes: Arc<[u8]> = produce()
            .inspect_err(|e| log::warn!("Generating {} failed: {}", key, e))?
            .into();
        log::debug!("Generated {} ({} bytes)", key, bytes.len());
        self.registry.content().put(key, bytes.clone());
        log::debug!("Content cache: {}", self.registry.content().stats());
        Ok(bytes)
    }
}

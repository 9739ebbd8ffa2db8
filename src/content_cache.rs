//! In-memory cache for derived image bytes.
//!
//! Every generated thumbnail and upright rendition is kept in a
//! [`ContentCache`] and served from memory on the next request.
//!
//! # Design
//!
//! The cache is **budgeted by bytes, not by entry count**: the sum of the
//! lengths of all cached values never exceeds `max_bytes`.
//!
//! ## Cache keys
//!
//! Keys are structured ([`CacheKey`]): the source path plus the
//! [`Transform`] that produced the bytes. Nothing is concatenated into a
//! string, so no character that can legally appear in a path can make two
//! keys collide.
//!
//! ## Eviction
//!
//! Strict least-recently-used. Both [`get`](ContentCache::get) hits and
//! successful [`put`](ContentCache::put) calls move an entry to the front.
//! An insertion that would overflow the budget evicts from the back, one
//! entry at a time, until the new value fits.
//!
//! Values whose size is `>= max_bytes` are never admitted. A `put` for a key
//! that is already present is a no-op, so the first writer wins.
//!
//! ## Locking
//!
//! One [`parking_lot::Mutex`] guards the map and the running size together,
//! so `currentSize <= max_bytes` holds after every operation regardless of
//! how many request threads hit the cache.

use lru::LruCache;
use parking_lot::Mutex;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Default byte budget (2 MiB of encoded image data).
pub const DEFAULT_MAX_BYTES: usize = 2 * 1024 * 1024;

/// The derivation that produced a cached value from its source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transform {
    /// Reduced-resolution JPEG at the given pixel width.
    Thumbnail { width: u32 },
    /// Full-size JPEG with an orientation correction applied.
    Rotated { degrees: u16 },
}

/// Key of a cached value: source path + transform.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub path: PathBuf,
    pub transform: Transform,
}

impl CacheKey {
    pub fn thumbnail(path: &Path, width: u32) -> Self {
        Self {
            path: path.to_path_buf(),
            transform: Transform::Thumbnail { width },
        }
    }

    pub fn rotated(path: &Path, degrees: u16) -> Self {
        Self {
            path: path.to_path_buf(),
            transform: Transform::Rotated { degrees },
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.transform {
            Transform::Thumbnail { width } => {
                write!(f, "{} [thumbnail {}px]", self.path.display(), width)
            }
            Transform::Rotated { degrees } => {
                write!(f, "{} [rotated {}°]", self.path.display(), degrees)
            }
        }
    }
}

struct Inner {
    entries: LruCache<CacheKey, Arc<[u8]>>,
    current_bytes: usize,
    stats: CacheStats,
}

/// Byte-budgeted LRU cache of encoded image data.
pub struct ContentCache {
    max_bytes: usize,
    inner: Mutex<Inner>,
}

impl ContentCache {
    pub fn new(max_bytes: usize) -> Self {
        Self {
            max_bytes,
            inner: Mutex::new(Inner {
                entries: LruCache::unbounded(),
                current_bytes: 0,
                stats: CacheStats::default(),
            }),
        }
    }

    /// Look up a value, promoting it to most-recently-used on a hit.
    pub fn get(&self, key: &CacheKey) -> Option<Arc<[u8]>> {
        let mut inner = self.inner.lock();
        let found = inner.entries.get(key).cloned();
        if found.is_some() {
            inner.stats.hit();
            log::debug!("Cache HIT: {}", key);
        } else {
            inner.stats.miss();
            log::debug!("Cache MISS: {}", key);
        }
        found
    }

    /// Insert a value, evicting least-recently-used entries to make room.
    ///
    /// Returns `true` if the value was stored. Oversized values and keys that
    /// are already cached are skipped silently and return `false`.
    pub fn put(&self, key: CacheKey, data: impl Into<Arc<[u8]>>) -> bool {
        let data = data.into();
        let size = data.len();
        let mut inner = self.inner.lock();

        if size >= self.max_bytes {
            inner.stats.reject();
            log::debug!(
                "Cache REJECT: {} ({} bytes, budget {})",
                key,
                size,
                self.max_bytes
            );
            return false;
        }
        if inner.entries.contains(&key) {
            return false;
        }

        while inner.current_bytes + size > self.max_bytes {
            let Some((evicted_key, evicted)) = inner.entries.pop_lru() else {
                break;
            };
            inner.current_bytes -= evicted.len();
            inner.stats.evict();
            log::debug!("Cache EVICT: {} ({} bytes)", evicted_key, evicted.len());
        }

        inner.current_bytes += size;
        inner.entries.put(key, data);
        inner.stats.insert();
        true
    }

    /// Sum of the sizes of all cached values.
    pub fn current_bytes(&self) -> usize {
        self.inner.lock().current_bytes
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the hit/miss counters.
    pub fn stats(&self) -> CacheStats {
        self.inner.lock().stats.clone()
    }
}

impl Default for ContentCache {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_BYTES)
    }
}

/// Counters describing cache effectiveness since startup.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub insertions: u64,
    pub evictions: u64,
    pub rejections: u64,
}

impl CacheStats {
    fn hit(&mut self) {
        self.hits += 1;
    }

    fn miss(&mut self) {
        self.misses += 1;
    }

    fn insert(&mut self) {
        self.insertions += 1;
    }

    fn evict(&mut self) {
        self.evictions += 1;
    }

    fn reject(&mut self) {
        self.rejections += 1;
    }

    pub fn lookups(&self) -> u64 {
        self.hits + self.misses
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.lookups() == 0 {
            return write!(f, "no lookups");
        }
        write!(
            f,
            "{} hits, {} misses ({} lookups)",
            self.hits,
            self.misses,
            self.lookups()
        )?;
        if self.evictions > 0 || self.rejections > 0 {
            write!(
                f,
                ", {} evicted, {} rejected",
                self.evictions, self.rejections
            )?;
        }
        Ok(())
    }
}

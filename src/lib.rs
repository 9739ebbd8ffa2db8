//! # Simple Photo Server
//!
//! Browse one or more photo directories from any browser on the local
//! network. The filesystem is the only data source: no database, no index
//! files, nothing written to disk.
//!
//! # Architecture
//!
//! A request goes through three layers:
//!
//! ```text
//! server      request line → route + query        (HTTP shim)
//! library     path → entries, state, image bytes  (the core)
//! render      navigation state → HTML             (maud templates)
//! ```
//!
//! The core is built once at startup and shared by every connection thread.
//! It keeps one in-memory entry per directory and per photo, created on first
//! access and never refreshed, and one byte-budgeted cache for generated
//! thumbnails and upright renditions.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`entry`] | Directory and file entries: lazily listed children, memoized image metadata |
//! | [`registry`] | One live entry per path, plus the content cache |
//! | [`content_cache`] | Byte-budgeted LRU cache keyed by (path, transform) |
//! | [`navigation`] | Request → navigation state, paging, default selection, siblings |
//! | [`imaging`] | Pure-Rust image operations: identify, EXIF orientation, thumbnails, rotation |
//! | [`library`] | The facade request handlers use; serializes image generation |
//! | [`render`] | HTML for the directory tree, thumbnail grid and image panel |
//! | [`server`] | Thread-per-connection HTTP/1.1 front end and routing |
//! | [`config`] | `photo-server.toml` loading, merging and validation |
//! | [`output`] | CLI output formatting for `check` and `serve` |
//!
//! # Design Decisions
//!
//! ## Explicit State Instead of Globals
//!
//! The registry is an ordinary value owned by the
//! [`PhotoLibrary`](library::PhotoLibrary) and handed to request threads
//! through an `Arc`. Tests build as many independent libraries as they like.
//!
//! ## Entries Are Frozen After First Listing
//!
//! A directory's children are listed the first time someone asks for them and
//! then kept for the life of the process. Photos added later are not picked
//! up until restart. This keeps every request after the first one free of
//! directory scans.
//!
//! ## Structured Cache Keys
//!
//! Cached bytes are keyed by the source path plus a typed
//! [`Transform`](content_cache::Transform). No separator character can make
//! two different derivations collide.
//!
//! ## One Image Decode at a Time
//!
//! Decoding a camera JPEG takes tens of megabytes. All generation runs under
//! a single lock in [`library`], independent of the cache lock, which bounds
//! peak memory on small machines.

pub mod config;
pub mod content_cache;
pub mod entry;
pub mod imaging;
pub mod library;
pub mod navigation;
pub mod output;
pub mod registry;
pub mod render;
pub mod server;

#[cfg(test)]
pub(crate) mod test_helpers;

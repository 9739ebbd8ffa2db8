//! Server configuration module.
//!
//! Handles loading, validating, and merging `photo-server.toml`. Stock
//! defaults are overridden by the user's config file, which is in turn
//! overridden by command-line flags.
//!
//! ## Config File Location
//!
//! Pass `--config <FILE>`, or place `photo-server.toml` in the working
//! directory. Without either, the stock defaults are used.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! roots = ["."]             # Directories exposed to the browser
//!
//! [server]
//! bind = "0.0.0.0"          # Listen address
//! port = 9009               # Listen port (0 = pick a free port)
//!
//! [cache]
//! max_bytes = 2097152       # In-memory budget for thumbnails and renditions
//!
//! [thumbnails]
//! width = 160               # Thumbnail width in pixels
//! quality = 80              # JPEG quality (1-100)
//!
//! [gallery]
//! rows = 4                  # Thumbnail rows per page
//! columns = 5               # Thumbnail columns per page
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse, so override just the values you want:
//!
//! ```toml
//! roots = ["/srv/photos", "/home/me/Pictures"]
//!
//! [gallery]
//! rows = 6
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File looked up in the working directory when no `--config` is given.
pub const CONFIG_FILE_NAME: &str = "photo-server.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Server configuration loaded from `photo-server.toml`.
///
/// All fields have sensible defaults. User config files need only specify
/// the values they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Directories exposed to the browser. Only paths inside these are served.
    pub roots: Vec<PathBuf>,
    /// Listen address and port.
    pub server: ListenConfig,
    /// In-memory content cache budget.
    pub cache: CacheConfig,
    /// Thumbnail and rendition encoding.
    pub thumbnails: ThumbnailsConfig,
    /// Thumbnail grid layout.
    pub gallery: GalleryConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            roots: vec![PathBuf::from(".")],
            server: ListenConfig::default(),
            cache: CacheConfig::default(),
            thumbnails: ThumbnailsConfig::default(),
            gallery: GalleryConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.roots.is_empty() {
            return Err(ConfigError::Validation("roots must not be empty".into()));
        }
        if self.server.bind.trim().is_empty() {
            return Err(ConfigError::Validation(
                "server.bind must not be empty".into(),
            ));
        }
        if self.cache.max_bytes == 0 {
            return Err(ConfigError::Validation(
                "cache.max_bytes must be non-zero".into(),
            ));
        }
        if self.thumbnails.width == 0 {
            return Err(ConfigError::Validation(
                "thumbnails.width must be non-zero".into(),
            ));
        }
        if !(1..=100).contains(&self.thumbnails.quality) {
            return Err(ConfigError::Validation(
                "thumbnails.quality must be 1-100".into(),
            ));
        }
        if self.gallery.rows == 0 || self.gallery.columns == 0 {
            return Err(ConfigError::Validation(
                "gallery.rows and gallery.columns must be non-zero".into(),
            ));
        }
        Ok(())
    }

    /// Thumbnails per page.
    pub fn page_size(&self) -> usize {
        self.gallery.rows * self.gallery.columns
    }

    /// `bind:port` as accepted by `TcpListener::bind`.
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.server.bind, self.server.port)
    }

    /// Apply command-line overrides and re-validate.
    pub fn with_overrides(mut self, overrides: &Overrides) -> Result<Self, ConfigError> {
        if !overrides.roots.is_empty() {
            self.roots = overrides.roots.clone();
        }
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        if let Some(bind) = &overrides.bind {
            self.server.bind = bind.clone();
        }
        self.validate()?;
        Ok(self)
    }
}

/// Values given on the command line; each replaces the file value when set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub roots: Vec<PathBuf>,
    pub port: Option<u16>,
    pub bind: Option<String>,
}

/// Listen address settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ListenConfig {
    /// Interface to bind; `0.0.0.0` reaches every device on the network.
    pub bind: String,
    /// TCP port. `0` lets the OS pick a free one.
    pub port: u16,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 9009,
        }
    }
}

/// Content cache settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    /// Upper bound on the summed size of cached thumbnails and renditions.
    pub max_bytes: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_bytes: crate::content_cache::DEFAULT_MAX_BYTES,
        }
    }
}

/// Thumbnail generation settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThumbnailsConfig {
    /// Thumbnail width in pixels; the height keeps the aspect ratio.
    pub width: u32,
    /// JPEG quality for thumbnails and upright renditions (1 = worst, 100 = best).
    pub quality: u32,
}

impl Default for ThumbnailsConfig {
    fn default() -> Self {
        Self {
            width: 160,
            quality: 80,
        }
    }
}

/// Thumbnail grid layout. One page holds `rows * columns` thumbnails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GalleryConfig {
    pub rows: usize,
    pub columns: usize,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            rows: 4,
            columns: 5,
        }
    }
}

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(ServerConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(file: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !file.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(file)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<ServerConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: ServerConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the server config.
///
/// An explicitly named file must exist. Without one, `photo-server.toml` in
/// `working_dir` is used when present, else the stock defaults.
pub fn load_config(
    explicit: Option<&Path>,
    working_dir: &Path,
) -> Result<ServerConfig, ConfigError> {
    let overlay = match explicit {
        Some(file) => {
            let content = fs::read_to_string(file)?;
            Some(toml::from_str(&content)?)
        }
        None => load_raw_config(&working_dir.join(CONFIG_FILE_NAME))?,
    };
    resolve_config(stock_defaults_value(), overlay)
}

/// Returns a fully-commented stock `photo-server.toml` with all keys and
/// explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Simple Photo Server Configuration
# =================================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Command-line flags (--root, --port, --bind) override these values.
# Unknown keys will cause an error.

# Directories exposed to the browser. Relative paths are resolved against
# the working directory. Only files inside these directories are served.
roots = ["."]

# ---------------------------------------------------------------------------
# Listening
# ---------------------------------------------------------------------------
[server]
# Interface to bind. "0.0.0.0" makes the server reachable from other
# devices on the local network; "127.0.0.1" keeps it on this machine.
bind = "0.0.0.0"

# TCP port. 0 lets the operating system pick a free port.
port = 9009

# ---------------------------------------------------------------------------
# In-memory cache
# ---------------------------------------------------------------------------
[cache]
# Budget in bytes for generated thumbnails and upright renditions.
# Items as large as the whole budget are never cached.
max_bytes = 2097152

# ---------------------------------------------------------------------------
# Thumbnails
# ---------------------------------------------------------------------------
[thumbnails]
# Thumbnail width in pixels. The height follows the image's aspect ratio.
width = 160

# JPEG quality for thumbnails and rotated renditions (1 = worst, 100 = best).
quality = 80

# ---------------------------------------------------------------------------
# Thumbnail grid
# ---------------------------------------------------------------------------
[gallery]
# One page shows rows x columns thumbnails.
rows = 4
columns = 5
"##
}

//! CLI output formatting.
//!
//! # Information-First Display
//!
//! Output leads with what the server will show, not with file paths: each
//! root is a numbered header with its photo count, followed by its top-level
//! directories as indented context lines.
//!
//! # Output Format
//!
//! ## Check
//!
//! ```text
//! Roots
//! 001 /srv/photos (2 photos)
//!     2023 (14 photos)
//!     Scans (no photos)
//! 002 /mnt/missing (not found)
//!
//! Settings
//!     Listen: 0.0.0.0:9009
//!     Page: 4 x 5 thumbnails
//!     Thumbnails: 160px at quality 80
//!     Cache: 2.0 MiB
//! ```
//!
//! ## Serve
//!
//! ```text
//! Serving 2 roots on http://0.0.0.0:9009
//!     /srv/photos
//!     /home/me/Pictures
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::config::ServerConfig;
use crate::registry::EntityRegistry;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

// ============================================================================
// Shared entity display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn photo_count(n: usize) -> String {
    match n {
        0 => "no photos".to_string(),
        1 => "1 photo".to_string(),
        n => format!("{n} photos"),
    }
}

/// Human-readable byte size with one decimal.
fn format_bytes(bytes: usize) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

// ============================================================================
// Check
// ============================================================================

/// What `check` reports for one root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootSummary {
    pub path: PathBuf,
    pub exists: bool,
    pub media_files: usize,
    /// Top-level subdirectories with their own media counts.
    pub subdirectories: Vec<(String, usize)>,
}

/// Collect the summary of one root through the registry.
pub fn summarize_root(registry: &EntityRegistry, root: &Path) -> RootSummary {
    let dir = registry.get_or_create_directory(root);
    RootSummary {
        path: dir.path().to_path_buf(),
        exists: dir.path().is_dir(),
        media_files: dir.media_file_count(),
        subdirectories: dir
            .subdirectories(registry)
            .iter()
            .map(|sub| (sub.name().to_string(), sub.media_file_count()))
            .collect(),
    }
}

/// Format the `check` report.
pub fn format_check_output(roots: &[RootSummary], config: &ServerConfig) -> Vec<String> {
    let mut lines = vec!["Roots".to_string()];

    for (i, root) in roots.iter().enumerate() {
        let detail = if root.exists {
            photo_count(root.media_files)
        } else {
            "not found".to_string()
        };
        lines.push(format!(
            "{} {} ({})",
            format_index(i + 1),
            root.path.display(),
            detail
        ));
        for (name, count) in &root.subdirectories {
            lines.push(format!("{}{} ({})", indent(1), name, photo_count(*count)));
        }
    }

    lines.push(String::new());
    lines.push("Settings".to_string());
    lines.push(format!("{}Listen: {}", indent(1), config.listen_address()));
    lines.push(format!(
        "{}Page: {} x {} thumbnails",
        indent(1),
        config.gallery.rows,
        config.gallery.columns
    ));
    lines.push(format!(
        "{}Thumbnails: {}px at quality {}",
        indent(1),
        config.thumbnails.width,
        config.thumbnails.quality
    ));
    lines.push(format!(
        "{}Cache: {}",
        indent(1),
        format_bytes(config.cache.max_bytes)
    ));
    lines
}

pub fn print_check_output(roots: &[RootSummary], config: &ServerConfig) {
    for line in format_check_output(roots, config) {
        println!("{}", line);
    }
}

// ============================================================================
// Serve
// ============================================================================

/// Format the banner printed when the server starts listening.
pub fn format_startup_banner(address: SocketAddr, roots: &[PathBuf]) -> Vec<String> {
    let noun = if roots.len() == 1 { "root" } else { "roots" };
    let mut lines = vec![format!(
        "Serving {} {} on http://{}",
        roots.len(),
        noun,
        address
    )];
    for root in roots {
        lines.push(format!("{}{}", indent(1), root.display()));
    }
    lines
}

pub fn print_startup_banner(address: SocketAddr, roots: &[PathBuf]) {
    for line in format_startup_banner(address, roots) {
        println!("{}", line);
    }
}

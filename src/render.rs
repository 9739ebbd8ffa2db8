//! HTML rendering.
//!
//! Every browsing page has the same three parts, left to right:
//!
//! - **Directory tree**: one tree per root. Directories without any photo in
//!   their subtree are pruned. Only the ancestors of the current directory
//!   are expanded, unless the request asked for the whole tree (`tree=1`).
//! - **Thumbnail grid**: one page (`rows * columns` thumbnails) of the
//!   current directory, newest first, with links to the other pages.
//! - **Image panel**: the selected image with previous / next / download
//!   links.
//!
//! When a directory is shown without a selected image, the first thumbnail
//! of the displayed page is selected before rendering.
//!
//! Templates use [maud](https://maud.lambda.xyz/); all text and attribute
//! values are escaped by the macro.

use crate::entry::DirectoryEntry;
use crate::imaging::ImageBackend;
use crate::library::PhotoLibrary;
use crate::navigation::{self, NavigationState, Siblings};
use crate::registry::EntityRegistry;
use crate::server::percent_encode;
use maud::{DOCTYPE, Markup, html};
use std::path::Path;

/// Embedded stylesheet, served at [`STYLESHEET_ROUTE`].
pub const STYLESHEET: &str = include_str!("../static/style.css");

pub const STYLESHEET_ROUTE: &str = "/default_style.css";
pub const SHOW_DIR_ROUTE: &str = "/show_dir";
pub const SHOW_IMAGE_ROUTE: &str = "/show_image";
pub const THUMBNAIL_ROUTE: &str = "/thumbnail";
pub const IMAGE_ROUTE: &str = "/image";
pub const DOWNLOAD_ROUTE: &str = "/download";

/// Link to a route taking a `path` parameter.
///
/// ```text
/// /show_image?path=/photos/2023/x.jpg&page=1&tree=1
/// ```
pub fn route_link(route: &str, path: &Path, page: Option<usize>, tree: bool) -> String {
    let mut url = format!("{}?path={}", route, percent_encode(&path.to_string_lossy()));
    if let Some(page) = page {
        url.push_str(&format!("&page={page}"));
    }
    if tree {
        url.push_str("&tree=1");
    }
    url
}

// ============================================================================
// Page Renderers
// ============================================================================

/// Render the browsing page for a resolved navigation state.
///
/// Default selection runs here, on a copy of the state.
pub fn render_browser<B: ImageBackend>(
    library: &PhotoLibrary<B>,
    state: &NavigationState,
    columns: usize,
) -> Markup {
    let mut state = state.clone();
    library.select_default_image(&mut state);

    let directory = state
        .current_directory
        .as_deref()
        .map(|dir| library.resolve_directory(dir));
    let title = directory
        .as_ref()
        .map_or_else(|| "Photos".to_string(), |d| d.name().to_string());

    let content = html! {
        div.browser {
            nav.tree {
                ul {
                    @for root in library.root_directories() {
                        (render_tree(library.registry(), &root, &state))
                    }
                }
            }
            @if let Some(dir) = &directory {
                section.gallery {
                    (render_grid(library.registry(), dir, &state, library.page_size(), columns))
                }
                @if let Some(image) = state.current_image.as_deref() {
                    @let dimensions = library.display_dimensions(&library.resolve_file(image));
                    (render_image_panel(image, dimensions, &library.sibling_paths(dir, image), state.force_show_directory_tree))
                }
            }
        }
    };
    page_document(&title, content)
}

/// Render an error page.
pub fn render_error(status: u16, reason: &str, detail: &str) -> Markup {
    let content = html! {
        div.error {
            h1 { (status) " " (reason) }
            p { (detail) }
            p { a href="/" { "Back to all photos" } }
        }
    };
    page_document(reason, content)
}

// ============================================================================
// HTML Components
// ============================================================================

/// Renders the base HTML document structure
fn page_document(title: &str, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) }
                link rel="stylesheet" href=(STYLESHEET_ROUTE);
            }
            body {
                (content)
            }
        }
    }
}

/// Renders one directory and, when expanded, its non-empty subdirectories.
fn render_tree(registry: &EntityRegistry, dir: &DirectoryEntry, state: &NavigationState) -> Markup {
    let current = state.current_directory.as_deref();
    let on_current_path = |p: &Path| current.is_some_and(|c| c.starts_with(p));
    let is_current = current == Some(dir.path());
    let expanded = state.force_show_directory_tree || on_current_path(dir.path());

    let children: Vec<&DirectoryEntry> = if expanded {
        dir.subdirectories(registry)
            .iter()
            .filter(|child| child.has_media_in_subtree(registry) || on_current_path(child.path()))
            .map(|child| &**child)
            .collect()
    } else {
        Vec::new()
    };

    html! {
        li {
            a.current[is_current] href=(route_link(SHOW_DIR_ROUTE, dir.path(), None, state.force_show_directory_tree)) {
                (dir.name())
            }
            @if dir.media_file_count() > 0 {
                " "
                span.count { "(" (dir.media_file_count()) ")" }
            }
            @if !children.is_empty() {
                ul {
                    @for child in children {
                        (render_tree(registry, child, state))
                    }
                }
            }
        }
    }
}

/// Renders the current page of thumbnails plus page links.
fn render_grid(
    registry: &EntityRegistry,
    dir: &DirectoryEntry,
    state: &NavigationState,
    page_size: usize,
    columns: usize,
) -> Markup {
    let files = dir.files(registry);
    let page = state.display_page();
    let pages = navigation::page_count(files.len(), page_size);
    let tree = state.force_show_directory_tree;

    html! {
        h1 { (dir.name()) }
        @if files.is_empty() {
            p.empty { "No photos in this directory." }
        } @else {
            div.thumbnails style={ "grid-template-columns: repeat(" (columns) ", auto)" } {
                @for file in navigation::page_slice(files, page, page_size) {
                    @let selected = state.current_image.as_deref() == Some(file.path());
                    a.thumb.selected[selected] href=(route_link(SHOW_IMAGE_ROUTE, file.path(), Some(page), tree)) {
                        img src=(route_link(THUMBNAIL_ROUTE, file.path(), None, false)) alt=(file.file_name()) loading="lazy";
                    }
                }
            }
            @if pages > 1 {
                nav.pages {
                    @for p in 0..pages {
                        @if p == page {
                            span.current-page { (p + 1) }
                        } @else {
                            a href=(route_link(SHOW_DIR_ROUTE, dir.path(), Some(p), tree)) { (p + 1) }
                        }
                    }
                }
            }
        }
    }
}

/// Renders the selected image with its navigation links.
fn render_image_panel(
    image: &Path,
    dimensions: Option<(u32, u32)>,
    siblings: &Siblings,
    tree: bool,
) -> Markup {
    let name = image
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let src = route_link(IMAGE_ROUTE, image, None, false);

    html! {
        section.viewer {
            nav.image-nav {
                @if let Some(prev) = &siblings.previous {
                    a.prev href=(route_link(SHOW_IMAGE_ROUTE, prev, None, tree)) { "← Previous" }
                }
                span.image-name {
                    (name)
                    @if let Some((width, height)) = dimensions {
                        " (" (width) " × " (height) ")"
                    }
                }
                @if let Some(next) = &siblings.next {
                    a.next href=(route_link(SHOW_IMAGE_ROUTE, next, None, tree)) { "Next →" }
                }
                a.download href=(route_link(DOWNLOAD_ROUTE, image, None, false)) { "Download" }
            }
            a href=(src) {
                img.photo src=(src) alt=(name);
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::ThumbnailConfig;
    use crate::imaging::backend::tests::MockBackend;
    use crate::library::LibraryConfig;
    use crate::navigation::NavigationRequest;
    use crate::registry::canonical_path;
    use crate::test_helpers::*;

    fn library(root: &Path, page_size: usize) -> PhotoLibrary<MockBackend> {
        PhotoLibrary::new(
            LibraryConfig {
                roots: vec![root.to_path_buf()],
                cache_max_bytes: 1024,
                thumbnails: ThumbnailConfig::default(),
                page_size,
            },
            MockBackend::new(),
        )
    }

    fn render(lib: &PhotoLibrary<MockBackend>, request: NavigationRequest) -> String {
        let state = lib.resolve_navigation_state(&request);
        render_browser(lib, &state, 5).into_string()
    }

    fn encoded(path: &Path) -> String {
        percent_encode(&canonical_path(path).to_string_lossy())
    }

    #[test]
    fn route_link_formats_query() {
        let link = route_link(SHOW_DIR_ROUTE, Path::new("/photos/my trip"), Some(2), true);
        assert_eq!(link, "/show_dir?path=/photos/my%20trip&page=2&tree=1");

        let bare = route_link(THUMBNAIL_ROUTE, Path::new("/a.jpg"), None, false);
        assert_eq!(bare, "/thumbnail?path=/a.jpg");
    }

    #[test]
    fn page_document_links_stylesheet() {
        let html = render_error(404, "Not Found", "gone").into_string();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains(r#"href="/default_style.css""#));
    }

    #[test]
    fn empty_state_shows_only_tree() {
        let tmp = photo_tree();
        let lib = library(tmp.path(), 20);
        let html = render(&lib, NavigationRequest::default());

        assert!(html.contains("<title>Photos</title>"));
        assert!(!html.contains("thumbnails"));
        assert!(!html.contains("viewer"));
        // Roots are expanded only along the current path; there is none
        assert!(!html.contains(">2023<"));
    }

    #[test]
    fn tree_expands_ancestors_of_current_directory() {
        let tmp = photo_tree();
        let lib = library(tmp.path(), 20);
        let html = render(&lib, NavigationRequest::directory(tmp.path().join("2023"), None));

        assert!(html.contains(">2023<"));
        assert!(html.contains(">Zeta<"));
        // 2023/empty has no media anywhere below it
        assert!(!html.contains(">empty<"));
        assert!(!html.contains(".hidden"));
        assert!(html.contains(r#"class="current""#));
    }

    #[test]
    fn tree_flag_expands_everything() {
        let tmp = tempfile::TempDir::new().unwrap();
        std::fs::create_dir_all(tmp.path().join("a/b")).unwrap();
        write_media(&tmp.path().join("a/b/deep.jpg"), 1);
        std::fs::create_dir_all(tmp.path().join("c")).unwrap();
        write_media(&tmp.path().join("c/top.jpg"), 1);
        let lib = library(tmp.path(), 20);

        let collapsed = render(&lib, NavigationRequest::directory(tmp.path().join("c"), None));
        assert!(collapsed.contains(">a<"));
        assert!(!collapsed.contains(">b<"));

        let expanded = render(
            &lib,
            NavigationRequest::directory(tmp.path().join("c"), None).with_directory_tree(true),
        );
        assert!(expanded.contains(">b<"));
        assert!(expanded.contains("tree=1"));
    }

    #[test]
    fn directory_view_selects_first_thumbnail() {
        let tmp = photo_tree();
        let lib = library(tmp.path(), 20);
        let html = render(&lib, NavigationRequest::directory(tmp.path(), None));

        // b.png is newer than a.jpg
        let b = encoded(&tmp.path().join("b.png"));
        assert!(html.contains(&format!("/image?path={b}")));
        assert!(html.contains(r#"class="thumb selected""#));
        assert!(html.contains(&format!("/thumbnail?path={}", encoded(&tmp.path().join("a.jpg")))));
    }

    #[test]
    fn grid_paginates_with_page_links() {
        let tmp = tempfile::TempDir::new().unwrap();
        numbered_photos(tmp.path(), 25);
        let lib = library(tmp.path(), 10);
        let html = render(&lib, NavigationRequest::directory(tmp.path(), Some(1)));

        assert_eq!(html.matches("/thumbnail?path=").count(), 10);
        assert!(html.contains(r#"<span class="current-page">2</span>"#));
        assert!(html.contains("page=2"));
        // Page 2 (index 1) starts at the 11th newest file
        assert!(html.contains(&format!("/image?path={}", encoded(&tmp.path().join("img14.jpg")))));
    }

    #[test]
    fn page_past_end_renders_empty_grid() {
        let tmp = photo_tree();
        let lib = library(tmp.path(), 20);
        let html = render(&lib, NavigationRequest::directory(tmp.path(), Some(9)));

        assert!(!html.contains("/thumbnail?path="));
        assert!(!html.contains("viewer"));
    }

    #[test]
    fn image_panel_links_siblings_and_download() {
        let tmp = tempfile::TempDir::new().unwrap();
        numbered_photos(tmp.path(), 3);
        let lib = library(tmp.path(), 20);
        let html = render(&lib, NavigationRequest::image(tmp.path().join("img01.jpg"), None));

        assert!(html.contains(&format!("/show_image?path={}", encoded(&tmp.path().join("img02.jpg")))));
        assert!(html.contains(&format!("/show_image?path={}", encoded(&tmp.path().join("img00.jpg")))));
        assert!(html.contains(&format!("/download?path={}", encoded(&tmp.path().join("img01.jpg")))));
        assert!(html.contains("Previous"));
        assert!(html.contains("Next"));
    }

    #[test]
    fn image_panel_shows_upright_size() {
        let tmp = photo_tree();
        let path = canonical_path(&tmp.path().join("a.jpg"));
        let lib = PhotoLibrary::new(
            LibraryConfig {
                roots: vec![tmp.path().to_path_buf()],
                cache_max_bytes: 1024,
                thumbnails: ThumbnailConfig::default(),
                page_size: 20,
            },
            MockBackend::new()
                .with_dimensions(&path, 640, 480)
                .with_orientation(&path, crate::imaging::Orientation::Rotate270),
        );
        let html = render(&lib, NavigationRequest::image(&path, None));

        assert!(html.contains("a.jpg (480 × 640)"));
    }

    #[test]
    fn first_image_has_no_previous_link() {
        let tmp = tempfile::TempDir::new().unwrap();
        numbered_photos(tmp.path(), 2);
        let lib = library(tmp.path(), 20);
        // img01 is the newest, so first in the list
        let html = render(&lib, NavigationRequest::image(tmp.path().join("img01.jpg"), None));

        assert!(!html.contains("Previous"));
        assert!(html.contains("Next"));
    }

    #[test]
    fn empty_directory_message() {
        let tmp = photo_tree();
        let lib = library(tmp.path(), 20);
        let html = render(&lib, NavigationRequest::directory(tmp.path().join("2023/empty"), None));

        assert!(html.contains("No photos in this directory."));
        // The current directory stays visible even though it is pruned otherwise
        assert!(html.contains(">empty<"));
    }

    #[test]
    fn names_are_escaped() {
        let tmp = tempfile::TempDir::new().unwrap();
        std::fs::create_dir_all(tmp.path().join("<b>")).unwrap();
        write_media(&tmp.path().join("<b>/x.jpg"), 1);
        let lib = library(tmp.path(), 20);
        let html = render(&lib, NavigationRequest::directory(tmp.path().join("<b>"), None));

        assert!(html.contains("&lt;b&gt;"));
        assert!(!html.contains("<b>"));
    }
}

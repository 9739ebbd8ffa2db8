//! Request-state resolution: what a single request should display.
//!
//! A request carries at most a target path, a page number and whether the
//! target is a directory or an image. [`resolve_navigation_state`] turns that
//! into a [`NavigationState`] (current directory, current image, thumbnail
//! page) using only the directory tree. Nothing is remembered between
//! requests.
//!
//! Two follow-up computations consume the resolved state:
//!
//! - [`select_default_image`] picks the first thumbnail of the displayed page
//!   when no image was requested. It is a separate step, run by the renderer
//!   after resolution.
//! - [`sibling_paths`] finds the previous/next image in the directory's
//!   sorted file list.

use crate::entry::FileEntry;
use crate::registry::{EntityRegistry, canonical_path, file_key};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Raw navigation parameters of one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavigationRequest {
    pub path: Option<PathBuf>,
    pub page: Option<usize>,
    pub is_directory_request: bool,
    pub force_show_directory_tree: bool,
}

impl NavigationRequest {
    pub fn directory(path: impl Into<PathBuf>, page: Option<usize>) -> Self {
        Self {
            path: Some(path.into()),
            page,
            is_directory_request: true,
            force_show_directory_tree: false,
        }
    }

    pub fn image(path: impl Into<PathBuf>, page: Option<usize>) -> Self {
        Self {
            path: Some(path.into()),
            page,
            is_directory_request: false,
            force_show_directory_tree: false,
        }
    }

    pub fn with_directory_tree(mut self, force: bool) -> Self {
        self.force_show_directory_tree = force;
        self
    }
}

/// Which of the three views a state describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    /// No target: only the directory trees of the roots.
    Empty,
    DirectoryOnly,
    DirectoryWithImage,
}

/// Canonical navigation state of one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavigationState {
    pub current_directory: Option<PathBuf>,
    pub current_image: Option<PathBuf>,
    /// `None` is "unset", distinct from an explicit page 0.
    pub thumbnail_page: Option<usize>,
    pub force_show_directory_tree: bool,
}

impl NavigationState {
    pub fn kind(&self) -> ViewKind {
        match (&self.current_directory, &self.current_image) {
            (None, _) => ViewKind::Empty,
            (Some(_), None) => ViewKind::DirectoryOnly,
            (Some(_), Some(_)) => ViewKind::DirectoryWithImage,
        }
    }

    /// Page to display; unset means the first page.
    pub fn display_page(&self) -> usize {
        self.thumbnail_page.unwrap_or(0)
    }
}

/// Resolve a request against the directory tree.
///
/// - No path: the empty state.
/// - Directory request: that directory, no image, the page as given.
/// - Image request: the image and its parent directory. Without an explicit
///   page, the page is the one holding the image in the parent's sorted file
///   list; if the image is not in that list the page stays unset.
pub fn resolve_navigation_state(
    registry: &EntityRegistry,
    request: &NavigationRequest,
    page_size: usize,
) -> NavigationState {
    let force_show_directory_tree = request.force_show_directory_tree;
    let Some(path) = request.path.as_deref() else {
        return NavigationState {
            force_show_directory_tree,
            ..NavigationState::default()
        };
    };
    if request.is_directory_request {
        return NavigationState {
            current_directory: Some(canonical_path(path)),
            current_image: None,
            thumbnail_page: request.page,
            force_show_directory_tree,
        };
    }

    let path = file_key(path);
    let directory = path.parent().map(Path::to_path_buf).unwrap_or_else(|| path.clone());
    let thumbnail_page = request.page.or_else(|| {
        let dir = registry.get_or_create_directory(&directory);
        page_of(dir.files(registry), &path, page_size)
    });

    NavigationState {
        current_directory: Some(directory),
        current_image: Some(path),
        thumbnail_page,
        force_show_directory_tree,
    }
}

/// Page holding `path` in `files`, if present.
pub fn page_of(files: &[Arc<FileEntry>], path: &Path, page_size: usize) -> Option<usize> {
    files
        .iter()
        .position(|f| f.path() == path)
        .map(|index| index / page_size.max(1))
}

/// Number of pages needed for `total` files.
pub fn page_count(total: usize, page_size: usize) -> usize {
    total.div_ceil(page_size.max(1))
}

/// The files shown on `page`. A page past the end is empty.
pub fn page_slice(files: &[Arc<FileEntry>], page: usize, page_size: usize) -> &[Arc<FileEntry>] {
    let page_size = page_size.max(1);
    let start = page.saturating_mul(page_size).min(files.len());
    let end = start.saturating_add(page_size).min(files.len());
    &files[start..end]
}

/// Default selection: with a directory but no image, select the first file
/// of the displayed page.
///
/// Returns `true` when an image was selected. Leaves the state untouched if
/// an image is already set, there is no directory, or the page is empty.
pub fn select_default_image(
    state: &mut NavigationState,
    files: &[Arc<FileEntry>],
    page_size: usize,
) -> bool {
    if state.current_directory.is_none() || state.current_image.is_some() {
        return false;
    }
    match page_slice(files, state.display_page(), page_size).first() {
        Some(first) => {
            state.current_image = Some(first.path().to_path_buf());
            true
        }
        None => false,
    }
}

/// Previous and next image around the current one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Siblings {
    pub previous: Option<PathBuf>,
    pub next: Option<PathBuf>,
}

/// Neighbors of `image` in `files`. Both are absent when the image is not in
/// the list.
pub fn sibling_paths(files: &[Arc<FileEntry>], image: &Path) -> Siblings {
    let Some(index) = files.iter().position(|f| f.path() == image) else {
        return Siblings::default();
    };
    Siblings {
        previous: index
            .checked_sub(1)
            .map(|i| files[i].path().to_path_buf()),
        next: files.get(index + 1).map(|f| f.path().to_path_buf()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;

    fn files_of(registry: &EntityRegistry, dir: &Path) -> Vec<Arc<FileEntry>> {
        registry.get_or_create_directory(dir).files(registry).to_vec()
    }

    // =========================================================================
    // resolve_navigation_state
    // =========================================================================

    #[test]
    fn no_path_is_empty_state() {
        let registry = EntityRegistry::new(1024);
        let state = resolve_navigation_state(&registry, &NavigationRequest::default(), 20);

        assert_eq!(state.kind(), ViewKind::Empty);
        assert_eq!(state.thumbnail_page, None);
    }

    #[test]
    fn empty_state_keeps_tree_flag() {
        let registry = EntityRegistry::new(1024);
        let request = NavigationRequest::default().with_directory_tree(true);
        let state = resolve_navigation_state(&registry, &request, 20);
        assert!(state.force_show_directory_tree);
    }

    #[test]
    fn directory_request_without_page() {
        let tmp = photo_tree();
        let registry = EntityRegistry::new(1024);
        let request = NavigationRequest::directory(tmp.path().join("2023"), None);

        let state = resolve_navigation_state(&registry, &request, 20);
        assert_eq!(state.kind(), ViewKind::DirectoryOnly);
        assert_eq!(
            state.current_directory,
            Some(canonical_path(&tmp.path().join("2023")))
        );
        assert_eq!(state.current_image, None);
        assert_eq!(state.thumbnail_page, None);
    }

    #[test]
    fn directory_request_explicit_zero_page_is_set() {
        let tmp = photo_tree();
        let registry = EntityRegistry::new(1024);
        let request = NavigationRequest::directory(tmp.path(), Some(0));

        let state = resolve_navigation_state(&registry, &request, 20);
        assert_eq!(state.thumbnail_page, Some(0));
    }

    #[test]
    fn image_request_computes_page_from_position() {
        let tmp = tempfile::TempDir::new().unwrap();
        numbered_photos(tmp.path(), 25);
        let registry = EntityRegistry::new(1024);
        let files = files_of(&registry, tmp.path());
        let image = files[21].path().to_path_buf();

        let state =
            resolve_navigation_state(&registry, &NavigationRequest::image(&image, None), 20);
        assert_eq!(state.kind(), ViewKind::DirectoryWithImage);
        assert_eq!(state.thumbnail_page, Some(1));
        assert_eq!(state.current_image, Some(image));
        assert_eq!(state.current_directory, Some(canonical_path(tmp.path())));
    }

    #[test]
    fn image_request_explicit_page_wins() {
        let tmp = tempfile::TempDir::new().unwrap();
        numbered_photos(tmp.path(), 25);
        let registry = EntityRegistry::new(1024);
        let image = tmp.path().join("img03.jpg");

        let state =
            resolve_navigation_state(&registry, &NavigationRequest::image(&image, Some(0)), 20);
        assert_eq!(state.thumbnail_page, Some(0));
    }

    #[test]
    fn image_not_in_listing_leaves_page_unset() {
        let tmp = photo_tree();
        let registry = EntityRegistry::new(1024);
        let request = NavigationRequest::image(tmp.path().join("deleted.jpg"), None);

        let state = resolve_navigation_state(&registry, &request, 20);
        assert_eq!(state.thumbnail_page, None);
        assert_eq!(state.kind(), ViewKind::DirectoryWithImage);
    }

    // =========================================================================
    // Paging
    // =========================================================================

    #[test]
    fn page_count_rounds_up() {
        assert_eq!(page_count(0, 20), 0);
        assert_eq!(page_count(20, 20), 1);
        assert_eq!(page_count(21, 20), 2);
    }

    #[test]
    fn page_slice_bounds() {
        let tmp = tempfile::TempDir::new().unwrap();
        numbered_photos(tmp.path(), 25);
        let registry = EntityRegistry::new(1024);
        let files = files_of(&registry, tmp.path());

        assert_eq!(page_slice(&files, 0, 20).len(), 20);
        assert_eq!(page_slice(&files, 1, 20).len(), 5);
        assert!(page_slice(&files, 2, 20).is_empty());
        assert!(page_slice(&files, usize::MAX, 20).is_empty());
    }

    // =========================================================================
    // select_default_image
    // =========================================================================

    #[test]
    fn default_selection_picks_first_of_page() {
        let tmp = tempfile::TempDir::new().unwrap();
        numbered_photos(tmp.path(), 25);
        let registry = EntityRegistry::new(1024);
        let files = files_of(&registry, tmp.path());

        let mut state = resolve_navigation_state(
            &registry,
            &NavigationRequest::directory(tmp.path(), Some(1)),
            20,
        );
        assert!(select_default_image(&mut state, &files, 20));
        assert_eq!(state.current_image.as_deref(), Some(files[20].path()));
        assert_eq!(state.kind(), ViewKind::DirectoryWithImage);
    }

    #[test]
    fn default_selection_keeps_requested_image() {
        let tmp = photo_tree();
        let registry = EntityRegistry::new(1024);
        let files = files_of(&registry, tmp.path());
        let image = files[1].path().to_path_buf();

        let mut state =
            resolve_navigation_state(&registry, &NavigationRequest::image(&image, None), 20);
        assert!(!select_default_image(&mut state, &files, 20));
        assert_eq!(state.current_image, Some(image));
    }

    #[test]
    fn default_selection_past_last_page_selects_nothing() {
        let tmp = photo_tree();
        let registry = EntityRegistry::new(1024);
        let files = files_of(&registry, tmp.path());

        let mut state = resolve_navigation_state(
            &registry,
            &NavigationRequest::directory(tmp.path(), Some(7)),
            20,
        );
        assert!(!select_default_image(&mut state, &files, 20));
        assert_eq!(state.kind(), ViewKind::DirectoryOnly);
    }

    #[test]
    fn default_selection_needs_a_directory() {
        let mut state = NavigationState::default();
        assert!(!select_default_image(&mut state, &[], 20));
    }

    // =========================================================================
    // sibling_paths
    // =========================================================================

    #[test]
    fn siblings_at_boundaries() {
        let tmp = tempfile::TempDir::new().unwrap();
        numbered_photos(tmp.path(), 3);
        let registry = EntityRegistry::new(1024);
        let files = files_of(&registry, tmp.path());
        let path = |i: usize| files[i].path().to_path_buf();

        let first = sibling_paths(&files, &path(0));
        assert_eq!(first.previous, None);
        assert_eq!(first.next, Some(path(1)));

        let middle = sibling_paths(&files, &path(1));
        assert_eq!(middle.previous, Some(path(0)));
        assert_eq!(middle.next, Some(path(2)));

        let last = sibling_paths(&files, &path(2));
        assert_eq!(last.previous, Some(path(1)));
        assert_eq!(last.next, None);
    }

    #[test]
    fn siblings_of_unknown_image() {
        let tmp = photo_tree();
        let registry = EntityRegistry::new(1024);
        let files = files_of(&registry, tmp.path());

        assert_eq!(
            sibling_paths(&files, &tmp.path().join("gone.jpg")),
            Siblings::default()
        );
    }

    #[test]
    fn single_file_has_no_siblings() {
        let tmp = photo_tree();
        let registry = EntityRegistry::new(1024);
        let files = files_of(&registry, &tmp.path().join("Zeta"));

        assert_eq!(sibling_paths(&files, files[0].path()), Siblings::default());
    }
}

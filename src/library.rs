//! Album and photo listings from the source tree.
//!
//! The filesystem is the data source: every directory directly under the
//! source root is an album, every image file inside an album is a photo.
//! Listings are pure reads with a stable, case-insensitive order so the
//! gallery renders the same way on every request.

use std::path::Path;

use crate::paths::is_safe_component;

/// Extensions admitted as photos (lowercased before comparison).
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];

fn is_image_file(name: &str) -> bool {
    let ext = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    IMAGE_EXTENSIONS.contains(&ext.as_str())
}

/// Case-insensitive lexicographic sort, applied to every listing.
fn sort_names(names: &mut [String]) {
    names.sort_by_key(|name| name.to_lowercase());
}

/// List album directories under `source_root`.
///
/// A missing or unreadable root yields an empty list rather than an error;
/// an empty gallery is a presentation question, not a failure. Hidden
/// directories (leading dot) are skipped, as is any entry whose name would
/// not survive path resolution.
pub fn list_albums(source_root: &Path) -> Vec<String> {
    let Ok(entries) = std::fs::read_dir(source_root) else {
        return Vec::new();
    };

    let mut albums: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_dir())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| !name.starts_with('.') && is_safe_component(name))
        .collect();

    sort_names(&mut albums);
    albums
}

/// List photo files inside one album directory.
///
/// Same non-existence and hidden-entry rules as [`list_albums`], restricted
/// to files whose lowercased extension is a known image format.
pub fn list_photos(album_dir: &Path) -> Vec<String> {
    let Ok(entries) = std::fs::read_dir(album_dir) else {
        return Vec::new();
    };

    let mut photos: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_file())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| !name.starts_with('.') && is_safe_component(name) && is_image_file(name))
        .collect();

    sort_names(&mut photos);
    photos
}

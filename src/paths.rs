//! Request-to-filesystem path resolution.
//!
//! A request names a photo by two opaque identifiers (album, photo). This
//! module turns that pair into the real source file inside the trusted album
//! tree and the cache location for the requested variant, rejecting anything
//! that could reach outside either root.
//!
//! Validation happens in two layers:
//!
//! 1. **Component check**: each identifier must be a single path component:
//!    non-empty, not `.` or `..`, no separators. This check never touches the
//!    filesystem.
//! 2. **Containment check**: the joined source path is canonicalized
//!    (resolving symlinks and relative segments) and must lie strictly inside
//!    the canonicalized source root. A symlinked album pointing elsewhere
//!    fails here even though its components look innocent.

use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveError {
    #[error("album or photo name is not a valid path component")]
    InvalidComponent,
    #[error("resolved path lies outside the album source root")]
    OutsideRoot,
}

/// Which derived artifact a request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariantKind {
    Thumbnail,
    Preview,
    Full,
}

impl VariantKind {
    /// Subdirectory under the per-album cache tree.
    fn cache_dir_name(self) -> &'static str {
        match self {
            VariantKind::Thumbnail => "thumbnails",
            VariantKind::Preview => "previews",
            VariantKind::Full => "full",
        }
    }
}

/// Resolved filesystem locations for one request.
///
/// For `Full` without enhancement, `cache_path` equals `source_path`: the
/// original file is served as-is and the cache is never involved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPaths {
    pub source_path: PathBuf,
    pub cache_path: PathBuf,
    /// Content type implied by the *source* extension. The served artifact
    /// may still be a JPEG; callers prefer the served path's own extension
    /// and fall back to this.
    pub content_type: &'static str,
}

/// True if `part` is usable as a single path component.
pub fn is_safe_component(part: &str) -> bool {
    !part.is_empty() && part != "." && part != ".." && !part.contains('/') && !part.contains('\\')
}

/// Map a source file extension to the content type reported for it.
pub fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        _ => "image/webp",
    }
}

/// Resolve an album directory with the same component and containment rules
/// as [`resolve`], for listing endpoints that address a whole album.
pub fn resolve_album_dir(source_root: &Path, album: &str) -> Result<PathBuf, ResolveError> {
    if !is_safe_component(album) {
        return Err(ResolveError::InvalidComponent);
    }
    let joined = source_root.join(album);
    match joined.canonicalize() {
        Ok(canonical) => {
            let root = source_root
                .canonicalize()
                .map_err(|_| ResolveError::OutsideRoot)?;
            if canonical == root || !canonical.starts_with(&root) {
                return Err(ResolveError::OutsideRoot);
            }
            Ok(canonical)
        }
        Err(_) => Ok(joined),
    }
}

/// Resolve `(album, photo, enhanced, kind)` against the configured roots.
///
/// Fails with [`ResolveError`] when an identifier is not a plain path
/// component or when the canonical source path escapes `source_root`. A
/// request for a file that simply does not exist resolves fine; existence is
/// the caller's concern (it distinguishes not-found from invalid).
pub fn resolve(
    source_root: &Path,
    cache_root: &Path,
    album: &str,
    photo: &str,
    enhanced: bool,
    kind: VariantKind,
) -> Result<ResolvedPaths, ResolveError> {
    if !is_safe_component(album) || !is_safe_component(photo) {
        return Err(ResolveError::InvalidComponent);
    }

    let joined = source_root.join(album).join(photo);
    let source_path = match joined.canonicalize() {
        Ok(canonical) => {
            let root = source_root
                .canonicalize()
                .map_err(|_| ResolveError::OutsideRoot)?;
            if canonical == root || !canonical.starts_with(&root) {
                return Err(ResolveError::OutsideRoot);
            }
            canonical
        }
        // Nothing on disk to canonicalize. The validated components make the
        // joined path lexically contained, and the caller's existence check
        // will turn it into a not-found.
        Err(_) => joined,
    };

    let content_type = content_type_for(&source_path);

    if kind == VariantKind::Full && !enhanced {
        return Ok(ResolvedPaths {
            cache_path: source_path.clone(),
            source_path,
            content_type,
        });
    }

    let cache_path = cache_root
        .join(if enhanced { "enhanced" } else { "original" })
        .join("albums")
        .join(album)
        .join(kind.cache_dir_name())
        .join(photo);

    Ok(ResolvedPaths {
        source_path,
        cache_path,
        content_type,
    })
}

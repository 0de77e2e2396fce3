//! On-disk artifact cache with exactly-once, atomic generation.
//!
//! The cache has no manifest and no index: the resolved cache path *is* the
//! key, and presence on disk is the sole source of truth. A hit is a single
//! `exists` check; a miss renders the variant and publishes it atomically.
//!
//! # Publication discipline
//!
//! Artifacts are never written directly to their final path. The encoded
//! bytes go to a temp file in the destination directory, are fsynced, and
//! are renamed over the final path. A reader therefore only ever sees a
//! complete artifact, and two generators racing on a cold key both succeed:
//! renders are deterministic, so whichever rename lands last overwrites the
//! same bytes.
//!
//! An in-process, per-key lock sits in front of generation so a stampede of
//! requests for one cold artifact encodes it once instead of N times. That
//! lock is an optimization only; correctness (and safety across processes
//! sharing a cache directory) rests entirely on the atomic rename.

use std::collections::HashMap;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, Weak};

use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::debug;

use crate::imaging::{self, ImagingError};
use crate::paths::{ResolveError, ResolvedPaths, VariantKind};

#[derive(Error, Debug)]
pub enum StoreError {
    /// Malformed or unsafe identifiers. Mapped to a client error upstream.
    #[error(transparent)]
    InvalidPath(#[from] ResolveError),
    /// The resolved source file is absent.
    #[error("source photo not found")]
    SourceNotFound,
    /// The source exists but could not be read or decoded.
    #[error("source photo unreadable: {0}")]
    SourceUnreadable(#[source] ImagingError),
    /// Temp-write or rename failed; no partial file is left at the cache path.
    #[error("failed to write cache artifact: {0}")]
    CacheWriteFailed(#[source] std::io::Error),
}

/// Coordinates artifact lookup and generation over a cache directory tree.
#[derive(Default)]
pub struct ArtifactStore {
    // Per-cache-path generation locks. Values are weak so entries reclaim
    // themselves once the last in-flight generator drops its handle.
    locks: Mutex<HashMap<PathBuf, Weak<Mutex<()>>>>,
}

impl ArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the ready-to-serve path for a cached artifact, if present.
    ///
    /// Checks the literal cache path first (a pre-existing non-JPEG artifact
    /// is served as-is), then the `.jpg`-suffixed sibling the encoder would
    /// have published.
    pub fn lookup(&self, paths: &ResolvedPaths) -> Option<PathBuf> {
        if paths.cache_path.exists() {
            return Some(paths.cache_path.clone());
        }
        let published = published_path(&paths.cache_path);
        if published != paths.cache_path && published.exists() {
            return Some(published);
        }
        None
    }

    /// Ensure the requested artifact exists and return the path to serve.
    ///
    /// `Full` without enhancement bypasses the cache entirely and returns
    /// the source path. Otherwise: cache hit → the existing file, cache miss
    /// → render, publish atomically, return the written path. The returned
    /// path can differ from `paths.cache_path` in suffix because the engine
    /// always emits JPEG.
    pub fn ensure(
        &self,
        paths: &ResolvedPaths,
        kind: VariantKind,
        enhanced: bool,
    ) -> Result<PathBuf, StoreError> {
        if kind == VariantKind::Full && !enhanced {
            return Ok(paths.source_path.clone());
        }

        if let Some(hit) = self.lookup(paths) {
            debug!(path = %hit.display(), "artifact cache hit");
            return Ok(hit);
        }

        let out_path = published_path(&paths.cache_path);
        let key_lock = self.key_lock(&out_path);
        let _guard = key_lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        // A generator that held the lock while we waited may have published.
        if let Some(hit) = self.lookup(paths) {
            debug!(path = %hit.display(), "artifact published while waiting");
            return Ok(hit);
        }

        debug!(path = %out_path.display(), "artifact cache miss, generating");
        self.generate(&paths.source_path, &out_path, kind, enhanced)?;
        Ok(out_path)
    }

    fn generate(
        &self,
        source_path: &Path,
        out_path: &Path,
        kind: VariantKind,
        enhanced: bool,
    ) -> Result<(), StoreError> {
        let source_bytes = std::fs::read(source_path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => StoreError::SourceNotFound,
            _ => StoreError::SourceUnreadable(ImagingError::Decode(image::ImageError::IoError(e))),
        })?;

        let encoded = imaging::render_variant(&source_bytes, kind, enhanced)
            .map_err(StoreError::SourceUnreadable)?;

        let parent = out_path.parent().ok_or_else(|| {
            StoreError::CacheWriteFailed(std::io::Error::other("cache path has no parent"))
        })?;
        std::fs::create_dir_all(parent).map_err(StoreError::CacheWriteFailed)?;

        // Temp file in the destination directory so the rename stays on one
        // filesystem and is atomic.
        let mut tmp = NamedTempFile::new_in(parent).map_err(StoreError::CacheWriteFailed)?;
        tmp.write_all(&encoded).map_err(StoreError::CacheWriteFailed)?;
        tmp.as_file()
            .sync_all()
            .map_err(StoreError::CacheWriteFailed)?;
        tmp.persist(out_path)
            .map_err(|e| StoreError::CacheWriteFailed(e.error))?;

        debug!(path = %out_path.display(), bytes = encoded.len(), "artifact published");
        Ok(())
    }

    fn key_lock(&self, path: &Path) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(existing) = locks.get(path).and_then(Weak::upgrade) {
            return existing;
        }
        locks.retain(|_, weak| weak.strong_count() > 0);
        let lock = Arc::new(Mutex::new(()));
        locks.insert(path.to_path_buf(), Arc::downgrade(&lock));
        lock
    }
}

/// The path the encoder actually publishes to: unchanged when the requested
/// cache path already carries a lowercase `.jpg`/`.jpeg` suffix, otherwise
/// rewritten to `.jpg` (the engine only emits JPEG).
fn published_path(cache_path: &Path) -> PathBuf {
    let ext = cache_path.extension().and_then(|e| e.to_str());
    match ext {
        Some("jpg") | Some("jpeg") => cache_path.to_path_buf(),
        _ => cache_path.with_extension("jpg"),
    }
}

//! Bulk cache pre-generation.
//!
//! `photoshelf warm` walks every album and renders the thumbnail and
//! preview artifacts that browsing would otherwise generate lazily, so the
//! first visitor after a library import is not the one paying for the
//! encodes. Work is spread across a rayon pool; artifacts already in the
//! cache are counted, not re-encoded.

use std::fmt;

use rayon::prelude::*;
use tracing::{info, warn};

use crate::config::Settings;
use crate::library;
use crate::paths::{self, VariantKind};
use crate::store::ArtifactStore;

/// Outcome counts for one warm run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct WarmStats {
    pub generated: u32,
    pub cached: u32,
    pub failed: u32,
}

impl WarmStats {
    fn merge(mut self, other: Self) -> Self {
        self.generated += other.generated;
        self.cached += other.cached;
        self.failed += other.failed;
        self
    }

    pub fn total(&self) -> u32 {
        self.generated + self.cached + self.failed
    }
}

impl fmt::Display for WarmStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.failed > 0 {
            write!(
                f,
                "{} generated, {} cached, {} failed ({} total)",
                self.generated,
                self.cached,
                self.failed,
                self.total()
            )
        } else {
            write!(
                f,
                "{} generated, {} cached ({} total)",
                self.generated,
                self.cached,
                self.total()
            )
        }
    }
}

/// Pre-generate thumbnail and preview artifacts for the whole library,
/// additionally covering the enhanced variants when `enhanced` is set.
///
/// Failures are logged and counted, never fatal: one corrupt photo must not
/// stop the rest of the library from warming.
pub fn warm(settings: &Settings, store: &ArtifactStore, enhanced: bool) -> WarmStats {
    let albums = library::list_albums(&settings.source_dir);
    info!(albums = albums.len(), enhanced, "warming artifact cache");

    let variants: &[(VariantKind, bool)] = if enhanced {
        &[
            (VariantKind::Thumbnail, false),
            (VariantKind::Preview, false),
            (VariantKind::Thumbnail, true),
            (VariantKind::Preview, true),
        ]
    } else {
        &[(VariantKind::Thumbnail, false), (VariantKind::Preview, false)]
    };

    let jobs: Vec<(String, String, VariantKind, bool)> = albums
        .iter()
        .flat_map(|album| {
            library::list_photos(&settings.source_dir.join(album))
                .into_iter()
                .flat_map(move |photo| {
                    variants
                        .iter()
                        .map(move |&(kind, enhanced)| (album.clone(), photo.clone(), kind, enhanced))
                })
        })
        .collect();

    jobs.par_iter()
        .fold(WarmStats::default, |mut stats, (album, photo, kind, enhanced)| {
            match warm_one(settings, store, album, photo, *kind, *enhanced) {
                Ok(true) => stats.generated += 1,
                Ok(false) => stats.cached += 1,
                Err(err) => {
                    warn!(album = %album, photo = %photo, error = %err, "failed to warm artifact");
                    stats.failed += 1;
                }
            }
            stats
        })
        .reduce(WarmStats::default, WarmStats::merge)
}

/// Returns `Ok(true)` when an artifact was generated, `Ok(false)` on a hit.
fn warm_one(
    settings: &Settings,
    store: &ArtifactStore,
    album: &str,
    photo: &str,
    kind: VariantKind,
    enhanced: bool,
) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
    let paths = paths::resolve(
        &settings.source_dir,
        &settings.cache_dir,
        album,
        photo,
        enhanced,
        kind,
    )?;

    if store.lookup(&paths).is_some() {
        return Ok(false);
    }
    store.ensure(&paths, kind, enhanced)?;
    Ok(true)
}

//! # Photoshelf
//!
//! A self-hosted photo album server. Your filesystem is the data source:
//! directories under one source root become albums, the image files inside
//! them become photos, and everything a browser sees (thumbnails, previews,
//! enhanced renders) is derived on demand and cached on disk.
//!
//! # Architecture: Resolve → Ensure → Stream
//!
//! Every image request moves through the same three steps:
//!
//! ```text
//! 1. Resolve   (album, photo, enhanced, kind)  →  source path + cache path
//! 2. Ensure    cache hit? serve it : render once, publish atomically
//! 3. Stream    file response with the right content type
//! ```
//!
//! The cache has no manifest and no database: the cache path itself is the
//! key, presence on disk is the truth, and eviction is somebody else's `rm`.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`paths`] | Validates identifiers, computes contained source + cache paths |
//! | [`library`] | Stable, filtered album and photo listings |
//! | [`store`] | Artifact cache: hit checks, exactly-once atomic generation |
//! | [`imaging`] | Decode → enhance → resize → JPEG encode pipeline |
//! | [`auth`] | Users file, HMAC-signed session tokens |
//! | [`server`] | axum routes, session cookies, error → status mapping |
//! | [`web`] | Maud-rendered login, album index, and photo grid pages |
//! | [`warm`] | Parallel pre-generation of the whole cache |
//! | [`config`] | `Settings` from flags/environment, built once at startup |
//!
//! # Design Decisions
//!
//! ## Atomic publish instead of a lock manager
//!
//! Concurrent first requests for the same artifact are resolved
//! structurally: every generator writes to a temp file and renames it over
//! the final path. Renders are deterministic, so racing writers produce the
//! same bytes and either rename is correct: no cross-process lock, no
//! deadlock surface. An in-process per-key lock exists purely to avoid
//! burning CPU on duplicate encodes during a stampede.
//!
//! ## JPEG-only output
//!
//! Every derived artifact is a progressive JPEG at quality 88, whatever the
//! source format. One encode path keeps cache size and latency predictable
//! and sidesteps per-format quality tuning. Originals are still served
//! verbatim: a full-size, unenhanced request streams the source file and
//! never touches the cache.
//!
//! ## Stateless sessions
//!
//! Sessions are HMAC-signed tokens in an HttpOnly cookie; the server stores
//! nothing. Restarting the process logs nobody out and needs no session
//! store to replicate.
//!
//! ## Server-rendered pages
//!
//! The browsing UI is compile-time-checked Maud markup served by the same
//! process, as plain HTML a browser can render with no JavaScript runtime.

pub mod auth;
pub mod config;
pub mod imaging;
pub mod library;
pub mod paths;
pub mod server;
pub mod store;
pub mod warm;
pub mod web;

#[cfg(test)]
pub(crate) mod test_helpers;

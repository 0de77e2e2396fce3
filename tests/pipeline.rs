//! End-to-end tests of the resolve → ensure pipeline over a real
//! filesystem: traversal rejection, cache layout, idempotence, the resize
//! law, and the cold-cache stampede.

mod common;

use std::sync::Arc;

use common::{fixture, write_jpeg};
use photoshelf::paths::{self, ResolveError, VariantKind};
use photoshelf::store::{ArtifactStore, StoreError};

#[test]
fn traversal_identifiers_are_rejected_outright() {
    let fx = fixture();
    for (album, photo) in [
        ("../etc", "passwd"),
        ("..", "x.jpg"),
        (".", "x.jpg"),
        ("", "x.jpg"),
        ("Vacation", "../IMG_1.JPG"),
        ("Vacation", "a/b.jpg"),
        ("Vacation", ""),
    ] {
        let err = paths::resolve(
            &fx.settings.source_dir,
            &fx.settings.cache_dir,
            album,
            photo,
            false,
            VariantKind::Thumbnail,
        )
        .unwrap_err();
        assert_eq!(err, ResolveError::InvalidComponent, "{album:?}/{photo:?}");
    }
}

#[test]
fn traversal_rejected_regardless_of_target_existence() {
    // `/etc` exists on the test machine; the rejection must not depend on it.
    let fx = fixture();
    let err = paths::resolve(
        &fx.settings.source_dir,
        &fx.settings.cache_dir,
        "../etc",
        "hosts",
        false,
        VariantKind::Full,
    )
    .unwrap_err();
    assert_eq!(err, ResolveError::InvalidComponent);
}

#[test]
fn thumbnail_scenario_publishes_expected_artifact() {
    let fx = fixture();
    let store = ArtifactStore::new();

    let paths = paths::resolve(
        &fx.settings.source_dir,
        &fx.settings.cache_dir,
        "Vacation",
        "IMG_1.JPG",
        false,
        VariantKind::Thumbnail,
    )
    .unwrap();
    let served = store.ensure(&paths, VariantKind::Thumbnail, false).unwrap();

    assert_eq!(
        served,
        fx.settings
            .cache_dir
            .join("original/albums/Vacation/thumbnails/IMG_1.jpg")
    );
    let decoded = image::load_from_memory(&std::fs::read(&served).unwrap()).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (200, 150));
    assert_eq!(
        image::guess_format(&std::fs::read(&served).unwrap()).unwrap(),
        image::ImageFormat::Jpeg
    );
}

#[test]
fn full_unenhanced_streams_source_without_caching() {
    let fx = fixture();
    let store = ArtifactStore::new();

    let paths = paths::resolve(
        &fx.settings.source_dir,
        &fx.settings.cache_dir,
        "Vacation",
        "IMG_1.JPG",
        false,
        VariantKind::Full,
    )
    .unwrap();
    let served = store.ensure(&paths, VariantKind::Full, false).unwrap();

    assert_eq!(served, paths.source_path);
    assert!(
        !fx.settings.cache_dir.exists(),
        "no cache directory may appear for original full-size requests"
    );
}

#[test]
fn ensure_is_idempotent() {
    let fx = fixture();
    let store = ArtifactStore::new();

    let paths = paths::resolve(
        &fx.settings.source_dir,
        &fx.settings.cache_dir,
        "Vacation",
        "IMG_1.JPG",
        false,
        VariantKind::Preview,
    )
    .unwrap();

    let first = store.ensure(&paths, VariantKind::Preview, false).unwrap();
    let first_bytes = std::fs::read(&first).unwrap();
    let second = store.ensure(&paths, VariantKind::Preview, false).unwrap();

    assert_eq!(first, second);
    assert_eq!(first_bytes, std::fs::read(&second).unwrap());
}

#[test]
fn resize_law_holds_across_sizes() {
    let fx = fixture();
    let store = ArtifactStore::new();
    let album_dir = fx.settings.source_dir.join("Vacation");

    // (source dims, kind, expected output dims)
    let cases = [
        ((3000, 2000), VariantKind::Preview, (1600, 1067)),
        ((2000, 3000), VariantKind::Preview, (1067, 1600)),
        ((120, 90), VariantKind::Thumbnail, (120, 90)), // never upscale
        ((500, 500), VariantKind::Thumbnail, (200, 200)),
    ];

    for (i, ((w, h), kind, (expect_w, expect_h))) in cases.into_iter().enumerate() {
        let name = format!("case_{i}.jpg");
        write_jpeg(&album_dir.join(&name), w, h);

        let paths = paths::resolve(
            &fx.settings.source_dir,
            &fx.settings.cache_dir,
            "Vacation",
            &name,
            false,
            kind,
        )
        .unwrap();
        let served = store.ensure(&paths, kind, false).unwrap();
        let decoded = image::load_from_memory(&std::fs::read(served).unwrap()).unwrap();
        assert_eq!(
            (decoded.width(), decoded.height()),
            (expect_w, expect_h),
            "source {w}x{h} kind {kind:?}"
        );
    }
}

#[test]
fn enhanced_and_original_artifacts_are_separate() {
    let fx = fixture();
    let store = ArtifactStore::new();

    let mut served = Vec::new();
    for enhanced in [false, true] {
        let paths = paths::resolve(
            &fx.settings.source_dir,
            &fx.settings.cache_dir,
            "Vacation",
            "IMG_1.JPG",
            enhanced,
            VariantKind::Thumbnail,
        )
        .unwrap();
        served.push(store.ensure(&paths, VariantKind::Thumbnail, enhanced).unwrap());
    }

    assert!(served[0].starts_with(fx.settings.cache_dir.join("original")));
    assert!(served[1].starts_with(fx.settings.cache_dir.join("enhanced")));
    assert_ne!(
        std::fs::read(&served[0]).unwrap(),
        std::fs::read(&served[1]).unwrap(),
        "the enhancement pipeline must change the artifact"
    );
}

#[test]
fn stampede_on_cold_cache_yields_one_complete_artifact() {
    let fx = fixture();
    let store = Arc::new(ArtifactStore::new());
    let settings = Arc::new(fx.settings.clone());

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let store = Arc::clone(&store);
            let settings = Arc::clone(&settings);
            std::thread::spawn(move || {
                let paths = paths::resolve(
                    &settings.source_dir,
                    &settings.cache_dir,
                    "Vacation",
                    "IMG_1.JPG",
                    false,
                    VariantKind::Preview,
                )
                .unwrap();
                store.ensure(&paths, VariantKind::Preview, false).unwrap()
            })
        })
        .collect();

    let served: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let first = &served[0];
    assert!(served.iter().all(|p| p == first));

    // Every caller sees a complete, decodable artifact.
    let bytes = std::fs::read(first).unwrap();
    image::load_from_memory(&bytes).unwrap();

    // No stray temp files survive in the cache tree.
    let dir = first.parent().unwrap();
    let leftovers: Vec<_> = std::fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name() != "IMG_1.jpg")
        .collect();
    assert!(leftovers.is_empty(), "{leftovers:?}");
}

#[test]
fn missing_source_surfaces_as_not_found() {
    let fx = fixture();
    let store = ArtifactStore::new();

    let paths = paths::resolve(
        &fx.settings.source_dir,
        &fx.settings.cache_dir,
        "Vacation",
        "missing.jpg",
        false,
        VariantKind::Thumbnail,
    )
    .unwrap();
    assert!(!paths.source_path.exists());

    let err = store.ensure(&paths, VariantKind::Thumbnail, false).unwrap_err();
    assert!(matches!(err, StoreError::SourceNotFound));
}

//! Shared test utilities for the photoshelf test suite.
//!
//! Synthetic image fixtures (gradient JPEG/PNG files used by the decode and
//! resize tests) and a `Settings` builder so tests never depend on real
//! environment variables.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use image::{ImageEncoder, Rgb, RgbImage};

use crate::config::Settings;

fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    })
}

/// Encode a small gradient image as JPEG bytes.
pub fn test_jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = gradient(width, height);
    let mut out = std::io::Cursor::new(Vec::new());
    image::codecs::jpeg::JpegEncoder::new(&mut out)
        .write_image(
            img.as_raw(),
            width,
            height,
            image::ExtendedColorType::Rgb8,
        )
        .unwrap();
    out.into_inner()
}

/// Encode a small gradient image as PNG bytes.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = gradient(width, height);
    let mut out = std::io::Cursor::new(Vec::new());
    image::codecs::png::PngEncoder::new(&mut out)
        .write_image(
            img.as_raw(),
            width,
            height,
            image::ExtendedColorType::Rgb8,
        )
        .unwrap();
    out.into_inner()
}

/// Write a valid JPEG file with the given dimensions.
pub fn create_test_jpeg(path: &Path, width: u32, height: u32) {
    std::fs::write(path, test_jpeg_bytes(width, height)).unwrap();
}

/// Write a valid PNG file with the given dimensions.
pub fn create_test_png(path: &Path, width: u32, height: u32) {
    std::fs::write(path, png_bytes(width, height)).unwrap();
}

/// Settings pointed at test directories, with a fixed secret and an
/// ephemeral listen address.
pub fn test_settings(source_dir: PathBuf, cache_dir: PathBuf, users_file: PathBuf) -> Settings {
    Settings {
        source_dir,
        cache_dir,
        users_file,
        listen_addr: "127.0.0.1:0".parse::<SocketAddr>().unwrap(),
        session_secret: "test-secret".to_string(),
        root_path: String::new(),
    }
}

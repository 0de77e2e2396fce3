//! Fixtures shared by the integration tests.

use std::net::SocketAddr;
use std::path::Path;

use image::{ImageEncoder, Rgb, RgbImage};
use photoshelf::config::Settings;
use tempfile::TempDir;

/// Encode a gradient image as JPEG bytes.
pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
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

/// Write a valid JPEG file with the given dimensions.
pub fn write_jpeg(path: &Path, width: u32, height: u32) {
    std::fs::write(path, jpeg_bytes(width, height)).unwrap();
}

/// A library with one album (`Vacation`) holding an 800×600 `IMG_1.JPG`,
/// an empty cache directory, and a users file with `alice:wonder`.
pub struct Fixture {
    pub tmp: TempDir,
    pub settings: Settings,
}

pub fn fixture() -> Fixture {
    let tmp = TempDir::new().unwrap();
    let source = tmp.path().join("albums");
    let cache = tmp.path().join("cache");
    let users_file = tmp.path().join("users.txt");

    std::fs::create_dir_all(source.join("Vacation")).unwrap();
    write_jpeg(&source.join("Vacation/IMG_1.JPG"), 800, 600);
    std::fs::write(&users_file, "alice:wonder\n").unwrap();

    let settings = Settings {
        source_dir: source,
        cache_dir: cache,
        users_file,
        listen_addr: "127.0.0.1:0".parse::<SocketAddr>().unwrap(),
        session_secret: "integration-secret".to_string(),
        root_path: String::new(),
    };

    Fixture { tmp, settings }
}

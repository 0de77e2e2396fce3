//! Image transform engine: pure Rust, no external binaries.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** (JPEG, PNG, WebP) | `image::load_from_memory` |
//! | **Enhance** | [`enhance`] pipeline (autocontrast → contrast → sharpness → unsharp mask) |
//! | **Resize** | `image::imageops::resize` with `Lanczos3` |
//! | **Encode** | `jpeg_encoder` (quality 88, progressive, optimized Huffman) |
//!
//! The module is split into:
//! - **Calculations**: pure functions for dimension math (unit testable)
//! - **Enhance**: pixel-level enhancement operations with fixed constants
//! - **This file**: [`render_variant`], the decode → transform → encode path
//!
//! Every output is a JPEG regardless of the source format. One encoding path
//! keeps the artifact cache predictable: any two renders of the same source
//! with the same parameters are byte-identical.

mod calculations;
mod enhance;

pub use calculations::fit_within;
pub use enhance::enhance as enhance_image;

use image::imageops::{self, FilterType};
use image::RgbImage;
use jpeg_encoder::{ColorType, Encoder};
use thiserror::Error;

use crate::paths::VariantKind;

/// Fixed JPEG quality for every cached artifact.
pub const JPEG_QUALITY: u8 = 88;
/// Thumbnail bounding box (longest edge, pixels).
pub const MAX_THUMBNAIL_PX: u32 = 200;
/// Preview bounding box (longest edge, pixels).
pub const MAX_PREVIEW_PX: u32 = 1600;

#[derive(Error, Debug)]
pub enum ImagingError {
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("failed to encode JPEG: {0}")]
    Encode(#[from] jpeg_encoder::EncodingError),
    #[error("image dimensions {0}x{1} exceed the JPEG encoder limit")]
    TooLarge(u32, u32),
}

fn bounding_box(kind: VariantKind) -> Option<u32> {
    match kind {
        VariantKind::Thumbnail => Some(MAX_THUMBNAIL_PX),
        VariantKind::Preview => Some(MAX_PREVIEW_PX),
        VariantKind::Full => None,
    }
}

/// Render one variant of a source image to encoded JPEG bytes.
///
/// Decodes, normalizes to RGB (grayscale and alpha sources included), runs
/// the enhancement pipeline when `enhanced`, fits into the variant's
/// bounding box (never upscaling), and encodes with the fixed output
/// contract. Deterministic: same inputs, same bytes.
pub fn render_variant(
    source_bytes: &[u8],
    kind: VariantKind,
    enhanced: bool,
) -> Result<Vec<u8>, ImagingError> {
    let decoded = image::load_from_memory(source_bytes)?;
    let mut rgb = decoded.to_rgb8();

    if enhanced {
        rgb = enhance::enhance(rgb);
    }

    if let Some(max_px) = bounding_box(kind)
        && let Some((w, h)) = fit_within(rgb.dimensions(), max_px)
    {
        rgb = imageops::resize(&rgb, w, h, FilterType::Lanczos3);
    }

    encode_jpeg(&rgb)
}

/// Encode an RGB image with the fixed output contract: JPEG quality 88,
/// progressive scan layout, optimized Huffman tables.
fn encode_jpeg(img: &RgbImage) -> Result<Vec<u8>, ImagingError> {
    let (w, h) = img.dimensions();
    let width = u16::try_from(w).map_err(|_| ImagingError::TooLarge(w, h))?;
    let height = u16::try_from(h).map_err(|_| ImagingError::TooLarge(w, h))?;

    let mut out = Vec::new();
    let mut encoder = Encoder::new(&mut out, JPEG_QUALITY);
    encoder.set_progressive(true);
    encoder.set_optimized_huffman_tables(true);
    encoder.encode(img.as_raw(), width, height, ColorType::Rgb)?;
    Ok(out)
}

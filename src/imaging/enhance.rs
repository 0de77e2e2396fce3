//! Pixel-level enhancement operations.
//!
//! The enhancement pipeline applied to "enhanced" variants, in fixed order
//! with fixed constants:
//!
//! 1. [`autocontrast`]: per-channel histogram stretch
//! 2. [`adjust_contrast`] ×1.12: spread values around the luminance mean
//! 3. [`adjust_sharpness`] ×1.25: pull away from a 3×3 smoothed copy
//! 4. [`unsharp_mask`] radius 1.6, amount 140%, threshold 3
//!
//! The constants are the contract: callers get no knobs, so two generators
//! racing on the same artifact always produce byte-identical output.

use image::{Rgb, RgbImage, imageops};

pub const CONTRAST_FACTOR: f32 = 1.12;
pub const SHARPNESS_FACTOR: f32 = 1.25;
pub const UNSHARP_RADIUS: f32 = 1.6;
pub const UNSHARP_PERCENT: u32 = 140;
pub const UNSHARP_THRESHOLD: u8 = 3;

/// Run the full fixed enhancement pipeline.
pub fn enhance(img: RgbImage) -> RgbImage {
    let img = autocontrast(&img);
    let img = adjust_contrast(&img, CONTRAST_FACTOR);
    let img = adjust_sharpness(&img, SHARPNESS_FACTOR);
    unsharp_mask(&img, UNSHARP_RADIUS, UNSHARP_PERCENT, UNSHARP_THRESHOLD)
}

/// Stretch each channel so its darkest value maps to 0 and its brightest
/// to 255. A channel with a single value is left unchanged.
pub fn autocontrast(img: &RgbImage) -> RgbImage {
    let mut lo = [u8::MAX; 3];
    let mut hi = [u8::MIN; 3];
    for Rgb(px) in img.pixels() {
        for c in 0..3 {
            lo[c] = lo[c].min(px[c]);
            hi[c] = hi[c].max(px[c]);
        }
    }

    let scale: [f32; 3] = std::array::from_fn(|c| {
        if hi[c] > lo[c] {
            255.0 / f32::from(hi[c] - lo[c])
        } else {
            1.0
        }
    });

    map_pixels(img, |px| {
        std::array::from_fn(|c| clamp_u8((f32::from(px[c]) - f32::from(lo[c])) * scale[c]))
    })
}

/// Scale the distance of every channel value from the image's mean
/// luminance. Factor 1.0 is the identity; greater spreads, smaller flattens.
pub fn adjust_contrast(img: &RgbImage, factor: f32) -> RgbImage {
    let mut sum: u64 = 0;
    for Rgb([r, g, b]) in img.pixels() {
        sum += luminance(*r, *g, *b) as u64;
    }
    let count = (img.width() as u64 * img.height() as u64).max(1);
    let mean = (sum as f32 / count as f32).round();

    map_pixels(img, |px| {
        std::array::from_fn(|c| clamp_u8(mean + (f32::from(px[c]) - mean) * factor))
    })
}

/// Blend between a 3×3-smoothed copy and the original: factor 1.0 is the
/// identity, greater overshoots toward the original (sharpens).
pub fn adjust_sharpness(img: &RgbImage, factor: f32) -> RgbImage {
    let degenerate = smooth(img);
    let mut out = img.clone();
    for (x, y, px) in out.enumerate_pixels_mut() {
        let base = degenerate.get_pixel(x, y);
        for c in 0..3 {
            px[c] = clamp_u8(
                f32::from(base[c]) + (f32::from(px[c]) - f32::from(base[c])) * factor,
            );
        }
    }
    out
}

/// Classic unsharp mask: add back `percent`% of the difference between the
/// image and its Gaussian blur. Pixels differing from their blurred
/// neighborhood by less than `threshold` are left unchanged.
pub fn unsharp_mask(img: &RgbImage, radius: f32, percent: u32, threshold: u8) -> RgbImage {
    let blurred = imageops::blur(img, radius);
    let amount = percent as f32 / 100.0;

    let mut out = img.clone();
    for (x, y, px) in out.enumerate_pixels_mut() {
        let soft = blurred.get_pixel(x, y);
        for c in 0..3 {
            let diff = i16::from(px[c]) - i16::from(soft[c]);
            if diff.unsigned_abs() >= u16::from(threshold) {
                px[c] = clamp_u8(f32::from(px[c]) + f32::from(diff) * amount);
            }
        }
    }
    out
}

/// 3×3 smoothing filter (center weight 5, neighbors 1, divisor 13). The
/// one-pixel border, where the kernel does not fit, is copied through.
fn smooth(img: &RgbImage) -> RgbImage {
    let (w, h) = img.dimensions();
    let mut out = img.clone();
    if w < 3 || h < 3 {
        return out;
    }

    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let mut acc = [0u32; 3];
            for (dx, dy, weight) in [
                (-1i32, -1i32, 1u32),
                (0, -1, 1),
                (1, -1, 1),
                (-1, 0, 1),
                (0, 0, 5),
                (1, 0, 1),
                (-1, 1, 1),
                (0, 1, 1),
                (1, 1, 1),
            ] {
                let px = img.get_pixel((x as i32 + dx) as u32, (y as i32 + dy) as u32);
                for c in 0..3 {
                    acc[c] += u32::from(px[c]) * weight;
                }
            }
            out.put_pixel(
                x,
                y,
                Rgb(std::array::from_fn(|c| ((acc[c] + 6) / 13) as u8)),
            );
        }
    }
    out
}

/// ITU-R 601-2 luma, the same weighting used for grayscale conversion.
fn luminance(r: u8, g: u8, b: u8) -> u32 {
    (u32::from(r) * 299 + u32::from(g) * 587 + u32::from(b) * 114) / 1000
}

fn clamp_u8(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

fn map_pixels(img: &RgbImage, f: impl Fn(&[u8; 3]) -> [u8; 3]) -> RgbImage {
    let mut out = img.clone();
    for px in out.pixels_mut() {
        let Rgb(values) = *px;
        *px = Rgb(f(&values));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(w: u32, h: u32, color: [u8; 3]) -> RgbImage {
        RgbImage::from_pixel(w, h, Rgb(color))
    }

    fn gradient(w: u32, h: u32) -> RgbImage {
        RgbImage::from_fn(w, h, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
        })
    }

    #[test]
    fn autocontrast_is_identity_on_solid_color() {
        let img = solid(16, 16, [90, 120, 40]);
        assert_eq!(autocontrast(&img), img);
    }

    #[test]
    fn autocontrast_stretches_to_full_range() {
        let mut img = solid(2, 1, [100, 100, 100]);
        img.put_pixel(1, 0, Rgb([150, 150, 150]));
        let out = autocontrast(&img);
        assert_eq!(out.get_pixel(0, 0), &Rgb([0, 0, 0]));
        assert_eq!(out.get_pixel(1, 0), &Rgb([255, 255, 255]));
    }

    #[test]
    fn contrast_factor_one_is_identity() {
        let img = gradient(12, 9);
        assert_eq!(adjust_contrast(&img, 1.0), img);
    }

    #[test]
    fn contrast_leaves_uniform_image_alone() {
        let img = solid(8, 8, [77, 77, 77]);
        assert_eq!(adjust_contrast(&img, 1.5), img);
    }

    #[test]
    fn contrast_spreads_values_around_mean() {
        let mut img = solid(2, 1, [100, 100, 100]);
        img.put_pixel(1, 0, Rgb([200, 200, 200]));
        // mean luminance = 150
        let out = adjust_contrast(&img, 2.0);
        assert_eq!(out.get_pixel(0, 0), &Rgb([50, 50, 50]));
        assert_eq!(out.get_pixel(1, 0), &Rgb([250, 250, 250]));
    }

    #[test]
    fn sharpness_factor_one_is_identity() {
        let img = gradient(10, 10);
        assert_eq!(adjust_sharpness(&img, 1.0), img);
    }

    #[test]
    fn sharpness_keeps_border_pixels() {
        let img = gradient(10, 10);
        let out = adjust_sharpness(&img, SHARPNESS_FACTOR);
        assert_eq!(out.get_pixel(0, 0), img.get_pixel(0, 0));
        assert_eq!(out.get_pixel(9, 9), img.get_pixel(9, 9));
    }

    #[test]
    fn unsharp_mask_skips_flat_regions() {
        // A solid image never differs from its blur, so threshold keeps
        // every pixel untouched.
        let img = solid(20, 20, [128, 64, 32]);
        assert_eq!(unsharp_mask(&img, 1.6, 140, 3), img);
    }

    #[test]
    fn unsharp_mask_boosts_edges() {
        let mut img = solid(20, 20, [60, 60, 60]);
        for y in 0..20 {
            for x in 10..20 {
                img.put_pixel(x, y, Rgb([190, 190, 190]));
            }
        }
        let out = unsharp_mask(&img, 1.6, 140, 3);
        // A pixel just dark of the edge gets pushed darker, one just
        // bright of it gets pushed brighter.
        assert!(out.get_pixel(9, 10)[0] < 60);
        assert!(out.get_pixel(10, 10)[0] > 190);
    }

    #[test]
    fn enhance_is_deterministic() {
        let img = gradient(24, 16);
        assert_eq!(enhance(img.clone()), enhance(img));
    }
}

//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Calculate the output size for a fit-within resize.
///
/// Returns `None` when the image already fits inside the `max_px` bounding
/// box (the resize is a no-op); otherwise the uniformly scaled dimensions,
/// rounded to the nearest pixel and never below 1. Upscaling never happens.
///
/// # Examples
/// ```
/// # use photoshelf::imaging::fit_within;
/// // 800x600 into a 200px box → 200x150
/// assert_eq!(fit_within((800, 600), 200), Some((200, 150)));
///
/// // Already small enough → untouched
/// assert_eq!(fit_within((180, 120), 200), None);
/// ```
pub fn fit_within(source: (u32, u32), max_px: u32) -> Option<(u32, u32)> {
    let (w, h) = source;
    if w <= max_px && h <= max_px {
        return None;
    }

    let scale = f64::from(max_px) / f64::from(w.max(h));
    let out_w = (f64::from(w) * scale).round().max(1.0) as u32;
    let out_h = (f64::from(h) * scale).round().max(1.0) as u32;
    Some((out_w, out_h))
}

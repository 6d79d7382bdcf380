//! Pure calculation functions for image dimensions and search ladders.
//!
//! All functions here are pure and testable without any I/O or images.
//! Pixel values are produced by truncating toward zero after scaling, so the
//! same inputs always land on the same pixel boundaries.

use super::params::{MIN_QUALITY, Quality};

/// Smallest width or height the dimension search may produce.
pub const MIN_SEARCH_DIMENSION: u32 = 200;

/// Uniform downscale factors tried by the dimension search, in tenths
/// (0.9, 0.8, ... 0.3). Integer tenths keep the arithmetic exact.
pub const DIMENSION_STEPS_TENTHS: [u32; 7] = [9, 8, 7, 6, 5, 4, 3];

/// Scale factor that fits `content` inside `bounds` without ever enlarging.
///
/// Returns `min(max_w / w, max_h / h, 1.0)`. Degenerate (zero or negative)
/// content yields `1.0`.
///
/// # Examples
/// ```
/// # use catalog_imaging::imaging::fit_scale;
/// assert_eq!(fit_scale((3840.0, 1080.0), (1920, 1080)), 0.5);
/// assert_eq!(fit_scale((800.0, 600.0), (1920, 1080)), 1.0);
/// ```
pub fn fit_scale(content: (f64, f64), bounds: (u32, u32)) -> f64 {
    let (w, h) = content;
    if w <= 0.0 || h <= 0.0 {
        return 1.0;
    }
    let sx = bounds.0 as f64 / w;
    let sy = bounds.1 as f64 / h;
    sx.min(sy).min(1.0)
}

/// Scale a coordinate and truncate toward zero.
pub fn scale_px(value: f64, scale: f64) -> u32 {
    let scaled = value * scale;
    if scaled <= 0.0 { 0 } else { scaled as u32 }
}

/// Scale an extent and truncate, never dropping below one pixel.
pub fn scale_extent(value: f64, scale: f64) -> u32 {
    scale_px(value, scale).max(1)
}

/// Downscale `(width, height)` uniformly so both fit inside `bounds`.
///
/// Dimensions already inside the bounds are returned unchanged.
pub fn clamp_dimensions(dims: (u32, u32), bounds: (u32, u32)) -> (u32, u32) {
    let (w, h) = dims;
    if w <= bounds.0 && h <= bounds.1 {
        return dims;
    }
    let scale = fit_scale((w as f64, h as f64), bounds);
    (
        scale_extent(w as f64, scale),
        scale_extent(h as f64, scale),
    )
}

/// Dimensions for one dimension-search step, or `None` if either side would
/// fall below [`MIN_SEARCH_DIMENSION`].
pub fn search_dimensions(dims: (u32, u32), tenths: u32) -> Option<(u32, u32)> {
    let w = (dims.0 as u64 * tenths as u64 / 10) as u32;
    let h = (dims.1 as u64 * tenths as u64 / 10) as u32;
    if w < MIN_SEARCH_DIMENSION || h < MIN_SEARCH_DIMENSION {
        None
    } else {
        Some((w, h))
    }
}

/// Descending quality ladder starting at `start`, stepping by `step`.
///
/// The ladder always ends at the minimum quality (10). `include_start`
/// controls whether `start` itself is the first rung.
///
/// ```text
/// start=80, step=5, exclusive → 75 70 … 15 10
/// start=80, step=10, inclusive → 80 70 … 20 10
/// start=12, step=5, exclusive → 10
/// ```
pub fn quality_ladder(start: Quality, step: u32, include_start: bool) -> Vec<Quality> {
    let start = start.value();
    let mut ladder = Vec::new();
    let mut q = if include_start {
        start
    } else {
        start.saturating_sub(step)
    };
    while q > MIN_QUALITY {
        ladder.push(Quality::new(q));
        q = q.saturating_sub(step);
    }
    if include_start || start > MIN_QUALITY {
        ladder.push(Quality::lowest());
    }
    ladder
}

//! Compositor: renders layout plans onto white canvases and encodes them.
//!
//! Up to four images become one composite. Longer lists are split into
//! consecutive chunks of four (the last chunk holds the remainder) and each
//! chunk becomes its own composite, so `N` sources yield `ceil(N / 4)`
//! outputs. Chunks are independent and rendered in parallel with rayon; the
//! returned list is always in chunk order.

use super::backend::{Dimensions, ImageBackend};
use super::layout::{MAX_IMAGES_PER_LAYOUT, compute_layout};
use super::params::{CombinationSettings, LayoutPlan, Quality};
use super::rust_backend::{RustBackend, flatten_on_white};
use super::{ImagingError, Result, SourceImage};
use image::{DynamicImage, Rgb, RgbImage};
use rayon::prelude::*;
use std::ops::Range;

/// One encoded composite plus the layout that produced it.
#[derive(Debug, Clone)]
pub struct CombinedImage {
    /// JPEG bytes.
    pub data: Vec<u8>,
    pub plan: LayoutPlan,
    /// Indices of the sources (in the caller's list) this composite covers.
    pub sources: Range<usize>,
}

/// Combine decoded images into one composite per chunk of four.
pub fn combine(
    images: &[SourceImage],
    settings: &CombinationSettings,
) -> Result<Vec<CombinedImage>> {
    combine_with_backend(&RustBackend::new(), images, settings)
}

/// Combine using a specific backend (allows testing with mock).
pub fn combine_with_backend(
    backend: &impl ImageBackend,
    images: &[SourceImage],
    settings: &CombinationSettings,
) -> Result<Vec<CombinedImage>> {
    if images.is_empty() {
        return Err(ImagingError::InvalidInput(
            "no usable images to combine".into(),
        ));
    }

    images
        .par_chunks(MAX_IMAGES_PER_LAYOUT)
        .enumerate()
        .map(|(chunk, group)| {
            let start = chunk * MAX_IMAGES_PER_LAYOUT;
            let combined = combine_chunk(backend, group, settings, start..start + group.len())?;
            tracing::debug!(
                chunk,
                width = combined.plan.canvas_width,
                height = combined.plan.canvas_height,
                bytes = combined.data.len(),
                "rendered composite"
            );
            Ok(combined)
        })
        .collect()
}

fn combine_chunk(
    backend: &impl ImageBackend,
    group: &[SourceImage],
    settings: &CombinationSettings,
    sources: Range<usize>,
) -> Result<CombinedImage> {
    let dims: Vec<Dimensions> = group.iter().map(SourceImage::dimensions).collect();
    let plan = compute_layout(&dims, settings)?;
    let canvas = render_plan(backend, group, &plan)?;
    let data = backend.encode_jpeg(&DynamicImage::ImageRgb8(canvas), Quality::composite())?;
    Ok(CombinedImage {
        data,
        plan,
        sources,
    })
}

/// Paint every placement of `plan` onto an opaque white canvas.
///
/// `images` must be the group the plan was computed for; each placement's
/// `source_index` indexes into it.
pub fn render_plan(
    backend: &impl ImageBackend,
    images: &[SourceImage],
    plan: &LayoutPlan,
) -> Result<RgbImage> {
    let mut canvas = RgbImage::from_pixel(
        plan.canvas_width,
        plan.canvas_height,
        Rgb([255, 255, 255]),
    );

    for placement in &plan.placements {
        let source = images.get(placement.source_index).ok_or_else(|| {
            ImagingError::InvalidInput(format!(
                "placement refers to missing image {}",
                placement.source_index
            ))
        })?;
        let resized = backend.resize(&source.image, placement.width, placement.height)?;
        let tile = flatten_on_white(&resized);
        image::imageops::replace(&mut canvas, &tile, placement.x as i64, placement.y as i64);
    }

    Ok(canvas)
}

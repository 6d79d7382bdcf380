//! Image composition and optimization: pure Rust, no system libraries.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** | `image::load_from_memory` (JPEG, PNG, WebP, TIFF) |
//! | **Layout** | pure geometry in [`layout`] |
//! | **Resample** | `DynamicImage::resize_exact` with `Lanczos3` |
//! | **Composite** | white `RgbImage` canvas + `imageops::replace` |
//! | **Encode** | `image::codecs::jpeg::JpegEncoder` |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for scale math and search ladders (unit testable)
//! - **Parameters**: Settings and plan data structures
//! - **Layout**: [`compute_layout`] for groups of one to four images
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Compositor / Optimizer**: the two engines, generic over the backend
//!
//! Both engines are synchronous and CPU-bound. Call them from a worker
//! thread or a blocking-task pool, never directly on an async event loop.

pub mod backend;
mod calculations;
pub mod compositor;
pub mod layout;
pub mod optimizer;
mod params;
pub mod rust_backend;

use image::DynamicImage;
use thiserror::Error;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use calculations::{
    DIMENSION_STEPS_TENTHS, MIN_SEARCH_DIMENSION, clamp_dimensions, fit_scale, quality_ladder,
};
pub use compositor::{CombinedImage, combine, combine_with_backend};
pub use layout::{MAX_IMAGES_PER_LAYOUT, compute_layout};
pub use optimizer::{OptimizationResult, optimize, optimize_with_backend};
pub use params::{
    CombinationSettings, LayoutPlan, MAX_QUALITY, MIN_QUALITY, OptimizationSettings, Placement,
    Quality,
};
pub use rust_backend::{RustBackend, supported_input_extensions};

/// Errors surfaced by the compositor and optimizer.
///
/// Budget misses are not errors: see
/// [`OptimizationResult::target_achieved`].
#[derive(Error, Debug)]
pub enum ImagingError {
    /// Empty or undecodable input, or no usable images.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// Encoding or resampling failed.
    #[error("Render failed: {0}")]
    RenderFailure(#[from] BackendError),
}

/// Result type for imaging operations.
pub type Result<T> = std::result::Result<T, ImagingError>;

/// A decoded source photograph, borrowed read-only by the engines.
#[derive(Debug, Clone)]
pub struct SourceImage {
    pub image: DynamicImage,
    /// Where the image came from, for log and event messages.
    pub label: String,
}

impl SourceImage {
    pub fn new(image: DynamicImage, label: impl Into<String>) -> Self {
        Self {
            image,
            label: label.into(),
        }
    }

    pub fn dimensions(&self) -> Dimensions {
        Dimensions::of(&self.image)
    }
}

//! Image backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the three pixel operations the
//! compositor and optimizer need: decode, exact resize, and JPEG encode.
//! Everything above this seam (layout math, chunking, the quality and
//! dimension search) is backend-agnostic, so tests can drive it with a mock
//! whose encoded sizes are known in advance.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend).

use super::params::Quality;
use image::DynamicImage;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Decode failed: {0}")]
    Decode(String),
    #[error("Resample failed: {0}")]
    Resample(String),
    #[error("Encode failed: {0}")]
    Encode(String),
}

/// Pixel dimensions of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn of(image: &DynamicImage) -> Self {
        Self::new(image.width(), image.height())
    }

    /// Portrait means strictly taller than wide.
    pub fn is_portrait(self) -> bool {
        self.height > self.width
    }
}

impl From<(u32, u32)> for Dimensions {
    fn from((width, height): (u32, u32)) -> Self {
        Self { width, height }
    }
}

/// Trait for image processing backends.
///
/// `Sync` so a single backend can be shared across rayon workers.
pub trait ImageBackend: Sync {
    /// Decode an encoded buffer (JPEG, PNG, WebP, TIFF).
    fn decode(&self, bytes: &[u8]) -> Result<DynamicImage, BackendError>;

    /// Resample to exactly `width`×`height` with a high-quality filter.
    fn resize(
        &self,
        image: &DynamicImage,
        width: u32,
        height: u32,
    ) -> Result<DynamicImage, BackendError>;

    /// Encode as baseline JPEG at the given quality.
    fn encode_jpeg(&self, image: &DynamicImage, quality: Quality)
    -> Result<Vec<u8>, BackendError>;
}

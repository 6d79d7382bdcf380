//! Optimizer: bounded search for a JPEG that fits a byte budget.
//!
//! Stages run strictly in order and each runs only if the previous one
//! missed the budget:
//!
//! ```text
//! 1. decode                      (InvalidInput if empty or undecodable)
//! 2. clamp to max_width/height   (aspect-preserving, Lanczos3)
//! 3. encode at settings.quality  → return if within budget
//! 4. quality ladder, step 5      → first fit wins; always ends at 10
//! 5. scale 0.9 … 0.3 of stage 2  → coarse ladder (step 10) per scale;
//!                                  no side may drop below 200px
//! 6. best effort                 → smallest attempt, target_achieved=false
//! ```
//!
//! The search order is fixed, so identical input bytes and settings always
//! produce identical output bytes. Re-optimizing an already small image
//! re-encodes it: the size class is stable but byte identity with the input
//! is not guaranteed.

use super::backend::{Dimensions, ImageBackend};
use super::calculations::{
    DIMENSION_STEPS_TENTHS, clamp_dimensions, quality_ladder, search_dimensions,
};
use super::params::{OptimizationSettings, Quality};
use super::rust_backend::RustBackend;
use super::{ImagingError, Result};
use image::DynamicImage;

/// Quality step for the full-size search.
const FINE_QUALITY_STEP: u32 = 5;

/// Quality step used at each reduced scale.
const COARSE_QUALITY_STEP: u32 = 10;

/// Outcome of an optimization, successful or best effort.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizationResult {
    /// JPEG bytes.
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Quality of the returned encode.
    pub quality: Quality,
    pub original_bytes: usize,
    /// False when even the smallest attempt exceeded the budget.
    pub target_achieved: bool,
}

impl OptimizationResult {
    pub fn optimized_bytes(&self) -> usize {
        self.data.len()
    }

    /// `optimized_bytes / original_bytes`; below 1.0 means the output shrank.
    pub fn ratio(&self) -> f64 {
        if self.original_bytes == 0 {
            return 1.0;
        }
        self.data.len() as f64 / self.original_bytes as f64
    }
}

/// Optimize an encoded image to fit `settings`.
pub fn optimize(bytes: &[u8], settings: &OptimizationSettings) -> Result<OptimizationResult> {
    optimize_with_backend(&RustBackend::new(), bytes, settings)
}

/// Optimize using a specific backend (allows testing with mock).
pub fn optimize_with_backend(
    backend: &impl ImageBackend,
    bytes: &[u8],
    settings: &OptimizationSettings,
) -> Result<OptimizationResult> {
    if bytes.is_empty() {
        return Err(ImagingError::InvalidInput("empty image buffer".into()));
    }
    let decoded = backend
        .decode(bytes)
        .map_err(|e| ImagingError::InvalidInput(format!("undecodable image: {e}")))?;

    let original = Dimensions::of(&decoded);
    let (width, height) = clamp_dimensions(
        (original.width, original.height),
        (settings.max_width, settings.max_height),
    );
    let base = if (width, height) != (original.width, original.height) {
        backend.resize(&decoded, width, height)?
    } else {
        decoded
    };

    let mut search = Search::new(backend, settings.budget_bytes());

    if search.attempt(&base, settings.quality)? {
        return Ok(search.finish(bytes.len(), true));
    }

    for quality in quality_ladder(settings.quality, FINE_QUALITY_STEP, false) {
        if search.attempt(&base, quality)? {
            return Ok(search.finish(bytes.len(), true));
        }
    }

    for tenths in DIMENSION_STEPS_TENTHS {
        let Some((w, h)) = search_dimensions((width, height), tenths) else {
            break;
        };
        let scaled = backend.resize(&base, w, h)?;
        for quality in quality_ladder(settings.quality, COARSE_QUALITY_STEP, true) {
            if search.attempt(&scaled, quality)? {
                return Ok(search.finish(bytes.len(), true));
            }
        }
    }

    let result = search.finish(bytes.len(), false);
    tracing::warn!(
        budget = settings.budget_bytes(),
        best = result.data.len(),
        width = result.width,
        height = result.height,
        "byte budget unreachable, returning smallest attempt"
    );
    Ok(result)
}

/// One encode tried during the search.
struct Attempt {
    data: Vec<u8>,
    width: u32,
    height: u32,
    quality: Quality,
}

/// Tracks the winning (or smallest) attempt across all stages.
struct Search<'a, B: ImageBackend> {
    backend: &'a B,
    budget: usize,
    best: Option<Attempt>,
}

impl<'a, B: ImageBackend> Search<'a, B> {
    fn new(backend: &'a B, budget: usize) -> Self {
        Self {
            backend,
            budget,
            best: None,
        }
    }

    /// Encode once. Returns `true` when the encode fits the budget, in which
    /// case it becomes the result.
    fn attempt(&mut self, image: &DynamicImage, quality: Quality) -> Result<bool> {
        let data = self.backend.encode_jpeg(image, quality)?;
        let fits = data.len() <= self.budget;
        tracing::debug!(
            width = image.width(),
            height = image.height(),
            quality = quality.value(),
            bytes = data.len(),
            fits,
            "optimizer attempt"
        );

        let smaller = self
            .best
            .as_ref()
            .is_none_or(|best| data.len() < best.data.len());
        if fits || smaller {
            self.best = Some(Attempt {
                data,
                width: image.width(),
                height: image.height(),
                quality,
            });
        }
        Ok(fits)
    }

    fn finish(self, original_bytes: usize, target_achieved: bool) -> OptimizationResult {
        // At least one attempt always precedes finish().
        let best = self.best.unwrap_or(Attempt {
            data: Vec::new(),
            width: 0,
            height: 0,
            quality: Quality::lowest(),
        });
        OptimizationResult {
            data: best.data,
            width: best.width,
            height: best.height,
            quality: best.quality,
            original_bytes,
            target_achieved,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};
    use crate::imaging::calculations::MIN_SEARCH_DIMENSION;
    use image::{Rgb, RgbImage};

    fn settings(max_file_size_kb: u32) -> OptimizationSettings {
        OptimizationSettings {
            max_file_size_kb,
            max_width: 1920,
            max_height: 1080,
            quality: Quality::new(80),
        }
    }

    fn resizes(backend: &MockBackend) -> Vec<(u32, u32)> {
        backend
            .get_operations()
            .into_iter()
            .filter_map(|op| match op {
                RecordedOp::Resize { width, height } => Some((width, height)),
                _ => None,
            })
            .collect()
    }

    // =========================================================================
    // Input validation
    // =========================================================================

    #[test]
    fn empty_buffer_is_invalid() {
        let backend = MockBackend::new();
        let result = optimize_with_backend(&backend, &[], &settings(500));
        assert!(matches!(result, Err(ImagingError::InvalidInput(_))));
        assert!(backend.get_operations().is_empty());
    }

    #[test]
    fn undecodable_buffer_is_invalid() {
        let backend = MockBackend::new();
        let result = optimize_with_backend(&backend, b"garbage", &settings(500));
        assert!(matches!(result, Err(ImagingError::InvalidInput(_))));
    }

    #[test]
    fn encode_failure_is_render_failure() {
        let backend = MockBackend::new().failing_encode();
        let result = optimize_with_backend(&backend, b"jpeg", &settings(500));
        assert!(matches!(result, Err(ImagingError::RenderFailure(_))));
    }

    // =========================================================================
    // Stage ordering
    // =========================================================================

    #[test]
    fn small_image_returns_after_first_encode() {
        // 100x100 at q80 → 8000 bytes, well within 500KB
        let backend = MockBackend::new();
        let result = optimize_with_backend(&backend, b"jpeg", &settings(500)).unwrap();

        assert!(result.target_achieved);
        assert_eq!(result.quality.value(), 80);
        assert_eq!((result.width, result.height), (100, 100));
        assert_eq!(backend.encodes(), vec![(100, 100, 80)]);
        assert!(resizes(&backend).is_empty());
    }

    #[test]
    fn oversized_image_is_clamped_first() {
        let backend = MockBackend::decoding_to(Dimensions::new(4000, 2000)).with_divisor(1000);
        let result = optimize_with_backend(&backend, b"jpeg", &settings(500)).unwrap();

        assert_eq!(resizes(&backend), vec![(1920, 960)]);
        assert_eq!(backend.encodes(), vec![(1920, 960, 80)]);
        assert_eq!((result.width, result.height), (1920, 960));
    }

    #[test]
    fn quality_search_stops_at_first_fit() {
        // 1000x1000: size = 10_000 * q; budget 512_000 → q50 is the first fit
        let backend = MockBackend::decoding_to(Dimensions::new(1000, 1000));
        let result = optimize_with_backend(&backend, b"jpeg", &settings(500)).unwrap();

        let qualities: Vec<u32> = backend.encodes().iter().map(|e| e.2).collect();
        assert_eq!(qualities, vec![80, 75, 70, 65, 60, 55, 50]);
        assert!(result.target_achieved);
        assert_eq!(result.quality.value(), 50);
        assert_eq!(result.optimized_bytes(), 500_000);
    }

    #[test]
    fn dimension_search_runs_after_quality_floor() {
        // Full size at q10 is 1_000_000 bytes. At 0.7 scale, q10 gives 490_000.
        let backend = MockBackend::decoding_to(Dimensions::new(1000, 1000)).with_divisor(10);
        let result = optimize_with_backend(&backend, b"jpeg", &settings(500)).unwrap();

        assert_eq!(resizes(&backend), vec![(900, 900), (800, 800), (700, 700)]);
        let encodes = backend.encodes();
        // 1 initial + 14 fine rungs + 3 scales × 8 coarse rungs
        assert_eq!(encodes.len(), 1 + 14 + 3 * 8);
        assert_eq!(encodes[15], (900, 900, 80));
        assert_eq!(encodes[16], (900, 900, 70));

        assert!(result.target_achieved);
        assert_eq!((result.width, result.height), (700, 700));
        assert_eq!(result.quality.value(), 10);
        assert_eq!(result.optimized_bytes(), 490_000);
    }

    #[test]
    fn unreachable_budget_returns_smallest_attempt() {
        let backend = MockBackend::decoding_to(Dimensions::new(1000, 1000)).with_divisor(1);
        let result = optimize_with_backend(&backend, b"jpeg", &settings(500)).unwrap();

        assert!(!result.target_achieved);
        assert_eq!((result.width, result.height), (300, 300));
        assert_eq!(result.quality.value(), 10);

        let smallest = backend
            .encodes()
            .iter()
            .map(|&(w, h, q)| backend.encoded_len(w, h, q))
            .min()
            .unwrap();
        assert_eq!(result.optimized_bytes(), smallest);
    }

    #[test]
    fn dimension_search_respects_minimum_side() {
        let backend = MockBackend::decoding_to(Dimensions::new(250, 1000)).with_divisor(1);
        let result = optimize_with_backend(&backend, b"jpeg", &settings(50)).unwrap();

        // 0.7 would make the width 175px, so the search stops after 0.8
        assert_eq!(resizes(&backend), vec![(225, 900), (200, 800)]);
        for (w, h, _) in backend.encodes() {
            assert!(w >= MIN_SEARCH_DIMENSION && h >= MIN_SEARCH_DIMENSION);
        }
        assert!(!result.target_achieved);
        assert_eq!((result.width, result.height), (200, 800));
    }

    #[test]
    fn ratio_compares_output_to_input() {
        let result = OptimizationResult {
            data: vec![0; 250],
            width: 1,
            height: 1,
            quality: Quality::default(),
            original_bytes: 1000,
            target_achieved: true,
        };
        assert_eq!(result.ratio(), 0.25);
    }

    // =========================================================================
    // Real encoder
    // =========================================================================

    /// Deterministic high-entropy image that compresses poorly.
    fn noise(width: u32, height: u32) -> Vec<u8> {
        let mut state: u32 = 0x9E37_79B9;
        let img = RgbImage::from_fn(width, height, |_, _| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            let [a, b, c, _] = state.to_le_bytes();
            Rgb([a, b, c])
        });
        RustBackend::new()
            .encode_jpeg(&DynamicImage::ImageRgb8(img), Quality::new(95))
            .unwrap()
    }

    #[test]
    fn real_encoder_output_is_reproducible() {
        let input = noise(320, 240);
        let s = settings(50);
        let first = optimize(&input, &s).unwrap();
        let second = optimize(&input, &s).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn real_encoder_meets_or_reports_budget() {
        let input = noise(640, 480);
        let s = settings(50);
        let result = optimize(&input, &s).unwrap();

        let decoded = RustBackend::new().decode(&result.data).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (result.width, result.height));
        assert!(result.width >= MIN_SEARCH_DIMENSION && result.height >= MIN_SEARCH_DIMENSION);
        if result.target_achieved {
            assert!(result.optimized_bytes() <= s.budget_bytes());
        } else {
            assert!(result.optimized_bytes() > s.budget_bytes());
        }
    }
}

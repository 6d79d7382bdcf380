//! Parameter and plan types for the imaging core.
//!
//! These structs describe *what* to produce, not *how*. Settings are plain
//! immutable values handed to each call; plans are pure data computed by the
//! [`layout`](super::layout) engine and consumed by the
//! [`compositor`](super::compositor).
//!
//! ## Types
//!
//! - [`Quality`]: JPEG quality (10–100). Clamped on construction.
//! - [`CombinationSettings`]: spacing and canvas bounds for composites.
//! - [`OptimizationSettings`]: byte budget, dimension bounds, starting quality.
//! - [`Placement`]: where one source lands on the canvas.
//! - [`LayoutPlan`]: canvas size plus ordered placements for ≤4 sources.

/// Lowest JPEG quality the optimizer will ever try.
pub const MIN_QUALITY: u32 = 10;

/// Highest JPEG quality.
pub const MAX_QUALITY: u32 = 100;

/// Quality setting for JPEG encoding (10-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Quality(u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(MIN_QUALITY, MAX_QUALITY))
    }

    /// Fixed quality used for freshly rendered composites.
    pub fn composite() -> Self {
        Self(95)
    }

    pub fn lowest() -> Self {
        Self(MIN_QUALITY)
    }

    pub fn value(self) -> u32 {
        self.0
    }

    /// Quality as the `u8` the JPEG encoder expects.
    pub fn as_u8(self) -> u8 {
        self.0 as u8
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(80)
    }
}

/// How sources are arranged into a composite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CombinationSettings {
    /// Gap between neighbouring images, in pixels at natural scale.
    pub spacing: u32,
    pub max_width: u32,
    pub max_height: u32,
}

impl Default for CombinationSettings {
    fn default() -> Self {
        Self {
            spacing: 10,
            max_width: 1920,
            max_height: 1080,
        }
    }
}

/// Targets for byte-budget optimization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptimizationSettings {
    pub max_file_size_kb: u32,
    pub max_width: u32,
    pub max_height: u32,
    /// Starting quality for the search.
    pub quality: Quality,
}

impl OptimizationSettings {
    /// Byte budget derived from `max_file_size_kb`.
    pub fn budget_bytes(&self) -> usize {
        self.max_file_size_kb as usize * 1024
    }
}

impl Default for OptimizationSettings {
    fn default() -> Self {
        Self {
            max_file_size_kb: 500,
            max_width: 1920,
            max_height: 1080,
            quality: Quality::default(),
        }
    }
}

/// Top-left rectangle of one source image on the output canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    /// Index into the slice handed to the layout engine.
    pub source_index: usize,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Placement {
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    /// True when the two rectangles share at least one pixel.
    pub fn overlaps(&self, other: &Placement) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }
}

/// Canvas dimensions plus placements for one group of at most four images.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutPlan {
    pub grid_cols: u32,
    pub grid_rows: u32,
    pub canvas_width: u32,
    pub canvas_height: u32,
    /// One entry per source, in source order.
    pub placements: Vec<Placement>,
}

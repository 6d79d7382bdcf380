//! Layout engine: arranges one to four images on a single canvas.
//!
//! Each case builds an *arrangement* in natural (source pixel) coordinates,
//! then one uniform scale factor is applied to every rectangle, the spacing
//! included. Coordinates and sizes are truncated toward zero after scaling,
//! which can leave up to one pixel of asymmetric slack when centering.
//!
//! | Count | Rule |
//! |---|---|
//! | 1 | shrink to fit the canvas bounds |
//! | 2 | side by side when the pair is portrait-leaning, stacked otherwise |
//! | 3 | main image plus a column (portrait main) or row (landscape main) of two halves |
//! | 4 | 2×2 grid sized from the actual scaled content |
//!
//! Scale factors never exceed 1.0: images are only ever shrunk. Grouping of
//! five or more images into chunks happens in the
//! [`compositor`](super::compositor).

use super::ImagingError;
use super::backend::Dimensions;
use super::calculations::{fit_scale, scale_extent, scale_px};
use super::params::{CombinationSettings, LayoutPlan, Placement};

/// Largest group a single layout can describe.
pub const MAX_IMAGES_PER_LAYOUT: usize = 4;

/// A rectangle in natural, unscaled coordinates.
#[derive(Debug, Clone, Copy)]
struct Rect {
    x: f64,
    y: f64,
    w: f64,
    h: f64,
}

impl Rect {
    fn sized(d: Dimensions) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            w: d.width as f64,
            h: d.height as f64,
        }
    }

    fn at(self, x: f64, y: f64) -> Self {
        Self { x, y, ..self }
    }
}

/// Unscaled layout: grid shape, total extent and one rect per source.
struct Arrangement {
    cols: u32,
    rows: u32,
    width: f64,
    height: f64,
    rects: Vec<Rect>,
}

impl Arrangement {
    /// Shrink uniformly to fit the canvas bounds (never enlarges).
    fn fit(self, settings: &CombinationSettings) -> LayoutPlan {
        let scale = fit_scale(
            (self.width, self.height),
            (settings.max_width, settings.max_height),
        );
        self.scaled(scale)
    }

    fn scaled(self, scale: f64) -> LayoutPlan {
        let placements: Vec<Placement> = self
            .rects
            .iter()
            .enumerate()
            .map(|(i, r)| Placement {
                source_index: i,
                x: scale_px(r.x, scale),
                y: scale_px(r.y, scale),
                width: scale_extent(r.w, scale),
                height: scale_extent(r.h, scale),
            })
            .collect();

        // Sub-pixel sources are floored to 1px, so the content extent can
        // poke past the truncated natural extent.
        let content_w = placements.iter().map(Placement::right).max().unwrap_or(1);
        let content_h = placements.iter().map(Placement::bottom).max().unwrap_or(1);

        LayoutPlan {
            grid_cols: self.cols,
            grid_rows: self.rows,
            canvas_width: scale_px(self.width, scale).max(content_w).max(1),
            canvas_height: scale_px(self.height, scale).max(content_h).max(1),
            placements,
        }
    }
}

/// Compute the layout plan for 1–4 images.
///
/// Fails with [`ImagingError::InvalidInput`] when the slice is empty, holds
/// more than [`MAX_IMAGES_PER_LAYOUT`] entries, or any image has a zero
/// dimension.
pub fn compute_layout(
    images: &[Dimensions],
    settings: &CombinationSettings,
) -> Result<LayoutPlan, ImagingError> {
    if images.is_empty() {
        return Err(ImagingError::InvalidInput("no images to lay out".into()));
    }
    if images.len() > MAX_IMAGES_PER_LAYOUT {
        return Err(ImagingError::InvalidInput(format!(
            "a single layout holds at most {MAX_IMAGES_PER_LAYOUT} images, got {}",
            images.len()
        )));
    }
    if let Some((i, d)) = images
        .iter()
        .enumerate()
        .find(|(_, d)| d.width == 0 || d.height == 0)
    {
        return Err(ImagingError::InvalidInput(format!(
            "image {i} has degenerate size {}x{}",
            d.width, d.height
        )));
    }

    let spacing = settings.spacing as f64;
    let plan = match images {
        [only] => single(*only).fit(settings),
        [a, b] => pair(*a, *b, spacing).fit(settings),
        [main, a, b] => triple(*main, *a, *b, spacing).fit(settings),
        _ => grid(images, settings),
    };
    Ok(plan)
}

fn single(d: Dimensions) -> Arrangement {
    let r = Rect::sized(d);
    Arrangement {
        cols: 1,
        rows: 1,
        width: r.w,
        height: r.h,
        rects: vec![r],
    }
}

/// Two images: side by side when the average height exceeds the average
/// width, otherwise stacked. The cross axis is centered.
fn pair(a: Dimensions, b: Dimensions, spacing: f64) -> Arrangement {
    let (a, b) = (Rect::sized(a), Rect::sized(b));
    let avg_w = (a.w + b.w) / 2.0;
    let avg_h = (a.h + b.h) / 2.0;

    if avg_h > avg_w {
        let height = a.h.max(b.h);
        Arrangement {
            cols: 2,
            rows: 1,
            width: a.w + spacing + b.w,
            height,
            rects: vec![
                a.at(0.0, (height - a.h) / 2.0),
                b.at(a.w + spacing, (height - b.h) / 2.0),
            ],
        }
    } else {
        let width = a.w.max(b.w);
        Arrangement {
            cols: 1,
            rows: 2,
            width,
            height: a.h + spacing + b.h,
            rects: vec![
                a.at((width - a.w) / 2.0, 0.0),
                b.at((width - b.w) / 2.0, a.h + spacing),
            ],
        }
    }
}

/// Three images: the first is the main image.
///
/// A portrait main fills the left column and the other two stack on the
/// right, each exactly half the main's height. A landscape (or square) main
/// fills the top row and the other two sit beneath it, each exactly half the
/// main's width. The secondary column/row spans `half + spacing + half`, so
/// the main image is centered along that axis.
fn triple(main: Dimensions, a: Dimensions, b: Dimensions, spacing: f64) -> Arrangement {
    let m = Rect::sized(main);

    if main.is_portrait() {
        let half = m.h / 2.0;
        let sa = to_height(a, half);
        let sb = to_height(b, half);
        let column_w = sa.w.max(sb.w);
        let column_h = half + spacing + half;
        let height = m.h.max(column_h);
        let column_x = m.w + spacing;

        Arrangement {
            cols: 2,
            rows: 2,
            width: column_x + column_w,
            height,
            rects: vec![
                m.at(0.0, (height - m.h) / 2.0),
                sa.at(column_x + (column_w - sa.w) / 2.0, 0.0),
                sb.at(column_x + (column_w - sb.w) / 2.0, half + spacing),
            ],
        }
    } else {
        let half = m.w / 2.0;
        let sa = to_width(a, half);
        let sb = to_width(b, half);
        let row_h = sa.h.max(sb.h);
        let row_w = half + spacing + half;
        let width = m.w.max(row_w);
        let row_y = m.h + spacing;

        Arrangement {
            cols: 2,
            rows: 2,
            width,
            height: row_y + row_h,
            rects: vec![
                m.at((width - m.w) / 2.0, 0.0),
                sa.at(0.0, row_y + (row_h - sa.h) / 2.0),
                sb.at(half + spacing, row_y + (row_h - sb.h) / 2.0),
            ],
        }
    }
}

fn to_height(d: Dimensions, height: f64) -> Rect {
    Rect {
        x: 0.0,
        y: 0.0,
        w: d.width as f64 * height / d.height as f64,
        h: height,
    }
}

fn to_width(d: Dimensions, width: f64) -> Rect {
    Rect {
        x: 0.0,
        y: 0.0,
        w: width,
        h: d.height as f64 * width / d.width as f64,
    }
}

/// Four images in a 2×2 grid, row-major.
///
/// Every image is shrunk on its own to fit one cell bound
/// `((max_w - spacing) / 2, (max_h - spacing) / 2)`. The real cell size is
/// then the widest scaled image by the tallest, so mismatched shapes do not
/// leave a fixed grid's worth of whitespace. Each image is centered in its
/// cell. If the result still exceeds the canvas bounds (large spacing), the
/// whole grid is shrunk once more.
fn grid(images: &[Dimensions], settings: &CombinationSettings) -> LayoutPlan {
    let spacing = settings.spacing as f64;
    let cell_bound = (
        (settings.max_width.saturating_sub(settings.spacing) / 2).max(1),
        (settings.max_height.saturating_sub(settings.spacing) / 2).max(1),
    );

    let sized: Vec<(f64, f64)> = images
        .iter()
        .map(|d| {
            let (w, h) = (d.width as f64, d.height as f64);
            let s = fit_scale((w, h), cell_bound);
            (scale_extent(w, s) as f64, scale_extent(h, s) as f64)
        })
        .collect();

    let cell_w = sized.iter().map(|&(w, _)| w).fold(0.0, f64::max);
    let cell_h = sized.iter().map(|&(_, h)| h).fold(0.0, f64::max);

    let rects = sized
        .iter()
        .enumerate()
        .map(|(i, &(w, h))| {
            let col = (i % 2) as f64;
            let row = (i / 2) as f64;
            Rect {
                x: col * (cell_w + spacing) + (cell_w - w) / 2.0,
                y: row * (cell_h + spacing) + (cell_h - h) / 2.0,
                w,
                h,
            }
        })
        .collect();

    Arrangement {
        cols: 2,
        rows: 2,
        width: cell_w * 2.0 + spacing,
        height: cell_h * 2.0 + spacing,
        rects,
    }
    .fit(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn dims(list: &[(u32, u32)]) -> Vec<Dimensions> {
        list.iter().map(|&d| Dimensions::from(d)).collect()
    }

    fn layout(list: &[(u32, u32)]) -> LayoutPlan {
        compute_layout(&dims(list), &CombinationSettings::default()).unwrap()
    }

    fn assert_contained(plan: &LayoutPlan) {
        for p in &plan.placements {
            assert!(
                p.right() <= plan.canvas_width && p.bottom() <= plan.canvas_height,
                "{p:?} escapes {}x{}",
                plan.canvas_width,
                plan.canvas_height
            );
        }
    }

    fn assert_disjoint(plan: &LayoutPlan) {
        for (i, a) in plan.placements.iter().enumerate() {
            for b in &plan.placements[i + 1..] {
                assert!(!a.overlaps(b), "{a:?} overlaps {b:?}");
            }
        }
    }

    // =========================================================================
    // Preconditions
    // =========================================================================

    #[test]
    fn empty_input_is_invalid() {
        let result = compute_layout(&[], &CombinationSettings::default());
        assert!(matches!(result, Err(ImagingError::InvalidInput(_))));
    }

    #[test]
    fn five_images_is_invalid() {
        let result = compute_layout(&dims(&[(10, 10); 5]), &CombinationSettings::default());
        assert!(matches!(result, Err(ImagingError::InvalidInput(_))));
    }

    #[test]
    fn zero_dimension_is_invalid() {
        let result = compute_layout(&dims(&[(100, 0)]), &CombinationSettings::default());
        assert!(matches!(result, Err(ImagingError::InvalidInput(_))));
    }

    // =========================================================================
    // N = 1
    // =========================================================================

    #[test]
    fn single_small_image_is_not_enlarged() {
        let plan = layout(&[(800, 600)]);
        assert_eq!((plan.canvas_width, plan.canvas_height), (800, 600));
        assert_eq!(
            plan.placements,
            vec![Placement {
                source_index: 0,
                x: 0,
                y: 0,
                width: 800,
                height: 600
            }]
        );
        assert_eq!((plan.grid_cols, plan.grid_rows), (1, 1));
    }

    #[test]
    fn single_large_image_shrinks_to_bounds() {
        // 3840x2160 → 0.5 on both axes
        let plan = layout(&[(3840, 2160)]);
        assert_eq!((plan.canvas_width, plan.canvas_height), (1920, 1080));
        assert_eq!(plan.placements[0].width, 1920);
    }

    // =========================================================================
    // N = 2
    // =========================================================================

    #[test]
    fn portrait_pair_goes_side_by_side() {
        // avg 1100x1700: portrait-leaning → horizontal
        let plan = layout(&[(1000, 1600), (1200, 1800)]);
        assert_eq!((plan.grid_cols, plan.grid_rows), (2, 1));

        let [a, b] = [plan.placements[0], plan.placements[1]];
        assert!(b.x >= a.right(), "second image must sit to the right");
        // Height binds: 1080 / 1800 = 0.6
        assert_eq!((a.width, a.height), (600, 960));
        assert_eq!((b.width, b.height), (720, 1080));
        assert_eq!(plan.canvas_height, 1080);
        assert_eq!(plan.canvas_width, 1326);
        assert_contained(&plan);
    }

    #[test]
    fn landscape_pair_stacks_vertically() {
        let plan = layout(&[(800, 600), (400, 300)]);
        assert_eq!((plan.grid_cols, plan.grid_rows), (1, 2));

        let [a, b] = [plan.placements[0], plan.placements[1]];
        assert!(b.y >= a.bottom());
        // Fits at natural scale: 800 wide, 600 + 10 + 300 high
        assert_eq!((plan.canvas_width, plan.canvas_height), (800, 910));
        // Narrower image is centered horizontally
        assert_eq!(b.x, 200);
        assert_eq!(b.y, 610);
    }

    #[test]
    fn square_pair_stacks() {
        // avg_h == avg_w is not portrait-leaning
        let plan = layout(&[(300, 300), (300, 300)]);
        assert_eq!((plan.grid_cols, plan.grid_rows), (1, 2));
    }

    #[test]
    fn spacing_scales_with_arrangement() {
        let settings = CombinationSettings {
            spacing: 100,
            max_width: 1000,
            max_height: 1000,
        };
        // 1000 + 100 + 1000 wide at natural scale → 1000 / 2100
        let plan = compute_layout(&dims(&[(1000, 2000), (1000, 2000)]), &settings).unwrap();
        let gap = plan.placements[1].x - plan.placements[0].right();
        assert!(gap <= 48 && gap >= 46, "gap {gap} should shrink with the layout");
    }

    // =========================================================================
    // N = 3
    // =========================================================================

    #[test]
    fn portrait_main_with_right_column() {
        let plan = layout(&[(600, 900), (400, 300), (400, 300)]);
        assert_eq!((plan.grid_cols, plan.grid_rows), (2, 2));

        let [main, a, b] = [plan.placements[0], plan.placements[1], plan.placements[2]];
        assert_eq!(main.x, 0);
        // Halves are exactly 450px high at natural scale
        assert_eq!(a.height, 450);
        assert_eq!(b.height, 450);
        assert_eq!(a.width, 600);
        assert_eq!(a.x, 610);
        assert_eq!(b.y, 460);
        // 900 + 10 high, main centered vertically
        assert_eq!(plan.canvas_height, 910);
        assert_eq!(main.y, 5);
        assert_eq!(plan.canvas_width, 1210);
        assert_contained(&plan);
        assert_disjoint(&plan);
    }

    #[test]
    fn landscape_main_with_bottom_row() {
        let plan = layout(&[(800, 400), (400, 400), (400, 200)]);
        let [main, a, b] = [plan.placements[0], plan.placements[1], plan.placements[2]];

        // Halves are exactly 400px wide
        assert_eq!(a.width, 400);
        assert_eq!(b.width, 400);
        assert_eq!(a.height, 400);
        assert_eq!(b.height, 200);
        assert_eq!(a.y, 410);
        // Shorter image centered in the 400px row
        assert_eq!(b.y, 510);
        assert_eq!(b.x, 410);
        assert_eq!((plan.canvas_width, plan.canvas_height), (810, 810));
        assert_eq!(main.x, 5);
        assert_contained(&plan);
        assert_disjoint(&plan);
    }

    #[test]
    fn triple_shrinks_uniformly_when_too_big() {
        let plan = layout(&[(3000, 2000), (1000, 1000), (1000, 1000)]);
        assert!(plan.canvas_width <= 1920 && plan.canvas_height <= 1080);
        // Halves keep equal widths after scaling
        assert_eq!(plan.placements[1].width, plan.placements[2].width);
        assert_contained(&plan);
        assert_disjoint(&plan);
    }

    // =========================================================================
    // N = 4
    // =========================================================================

    #[test]
    fn four_equal_landscapes_form_a_grid() {
        let plan = layout(&[(800, 600); 4]);
        assert_eq!((plan.grid_cols, plan.grid_rows), (2, 2));
        assert_eq!(plan.placements.len(), 4);
        assert!(plan.canvas_width <= 1920 && plan.canvas_height <= 1080);
        assert_contained(&plan);
        assert_disjoint(&plan);

        // Row-major order
        let p = &plan.placements;
        assert!(p[1].x > p[0].x && p[1].y == p[0].y);
        assert!(p[2].y > p[0].y && p[2].x == p[0].x);
    }

    #[test]
    fn grid_canvas_follows_content_not_bounds() {
        // Small images fit unscaled: canvas = 2 * 200 + 10 by 2 * 100 + 10
        let plan = layout(&[(200, 100), (100, 100), (100, 50), (200, 100)]);
        assert_eq!((plan.canvas_width, plan.canvas_height), (410, 210));
        // 100x50 centered in its 200x100 cell at (0, 110)
        assert_eq!(plan.placements[2].x, 50);
        assert_eq!(plan.placements[2].y, 135);
        assert_contained(&plan);
    }

    #[test]
    fn grid_with_huge_spacing_still_fits() {
        let settings = CombinationSettings {
            spacing: 2000,
            max_width: 1920,
            max_height: 1080,
        };
        let plan = compute_layout(&dims(&[(800, 600); 4]), &settings).unwrap();
        assert!(plan.canvas_width <= 1920 && plan.canvas_height <= 1080);
        assert_contained(&plan);
    }

    #[test]
    fn layout_is_deterministic() {
        let input = [(1234, 987), (333, 777), (1600, 900)];
        assert_eq!(layout(&input), layout(&input));
    }

    // =========================================================================
    // Properties
    // =========================================================================

    fn image_dims() -> impl Strategy<Value = (u32, u32)> {
        (50u32..4000, 50u32..4000)
    }

    proptest! {
        #[test]
        fn placements_stay_inside_bounded_canvas(
            images in prop::collection::vec(image_dims(), 1..=4),
            spacing in 0u32..60,
        ) {
            let settings = CombinationSettings { spacing, ..Default::default() };
            let plan = compute_layout(&dims(&images), &settings).unwrap();

            prop_assert_eq!(plan.placements.len(), images.len());
            prop_assert!(plan.canvas_width <= settings.max_width);
            prop_assert!(plan.canvas_height <= settings.max_height);
            for (i, p) in plan.placements.iter().enumerate() {
                prop_assert_eq!(p.source_index, i);
                prop_assert!(p.right() <= plan.canvas_width);
                prop_assert!(p.bottom() <= plan.canvas_height);
            }
        }

        #[test]
        fn layouts_never_enlarge_sources(
            images in prop::collection::vec(image_dims(), 1..=4),
        ) {
            let plan = compute_layout(&dims(&images), &CombinationSettings::default()).unwrap();
            // With three images the secondaries are sized relative to the
            // main image by rule; only the main is bound by its own size.
            let checked = if images.len() == 3 { 1 } else { images.len() };
            for (p, &(w, h)) in plan.placements.iter().zip(&images).take(checked) {
                prop_assert!(p.width <= w && p.height <= h, "{:?} from {}x{}", p, w, h);
            }
        }
    }
}

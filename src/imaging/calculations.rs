//! Pure calculation functions for thumbnail and watermark geometry.
//!
//! All functions here are pure and testable without any I/O or images.

use super::params::Quality;
use crate::config::{HAlign, Position, RepeatMode, VAlign};

/// Which target edge drives the uniform scale factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeAxis {
    Width,
    Height,
}

/// How a source is scaled and cropped to fill a target exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizePlan {
    pub axis: ResizeAxis,
    pub resized_width: u32,
    pub resized_height: u32,
    pub crop_x: u32,
    pub crop_y: u32,
}

/// Plan a cover-fit resize followed by a centered crop.
///
/// When the source is relatively wider than the target, the height is scaled
/// to the target height and the width overflows; otherwise the width is
/// matched and the height overflows. Equal ratios take the width branch.
/// The overflowing edge is rounded up so the crop window always fits.
///
/// Both dimensions of `source` and `target` must be non-zero.
///
/// # Examples
/// ```
/// # use thumbgen::imaging::{plan_resize, ResizeAxis};
/// // 400x300 (4:3) into 200x200: height drives, width overflows to 267
/// let plan = plan_resize((400, 300), (200, 200));
/// assert_eq!(plan.axis, ResizeAxis::Height);
/// assert_eq!((plan.resized_width, plan.resized_height), (267, 200));
/// assert_eq!((plan.crop_x, plan.crop_y), (33, 0));
/// ```
pub fn plan_resize(source: (u32, u32), target: (u32, u32)) -> ResizePlan {
    let (src_w, src_h) = (source.0 as u64, source.1 as u64);
    let (tgt_w, tgt_h) = (target.0 as u64, target.1 as u64);

    // src_w / src_h > tgt_w / tgt_h, compared without rounding
    if src_w * tgt_h > tgt_w * src_h {
        let resized_width = (tgt_h * src_w).div_ceil(src_h);
        ResizePlan {
            axis: ResizeAxis::Height,
            resized_width: resized_width as u32,
            resized_height: target.1,
            crop_x: ((resized_width - tgt_w) / 2) as u32,
            crop_y: 0,
        }
    } else {
        let resized_height = (tgt_w * src_h).div_ceil(src_w);
        ResizePlan {
            axis: ResizeAxis::Width,
            resized_width: target.0,
            resized_height: resized_height as u32,
            crop_x: 0,
            crop_y: ((resized_height - tgt_h) / 2) as u32,
        }
    }
}

/// Map encoding quality to a PNG compression level (0–9).
///
/// `round(9 - quality * 0.09)` with halves rounded up, so higher quality means
/// less compression. Computed in integers to avoid `0.09` representation error.
pub fn png_compression_level(quality: Quality) -> u8 {
    ((900 - 9 * quality.value() + 50) / 100) as u8
}

/// Top-left corner of a watermark of size `cell` inside `canvas`.
///
/// Offsets push the watermark away from the aligned edge for `left`/`right`
/// and `top`/`bottom`, and shift it right/down when centered. The result is
/// negative when the watermark does not fit.
pub fn watermark_origin(canvas: (u32, u32), cell: (u32, u32), position: &Position) -> (i64, i64) {
    let (canvas_w, canvas_h) = (canvas.0 as i64, canvas.1 as i64);
    let (cell_w, cell_h) = (cell.0 as i64, cell.1 as i64);
    let (offset_x, offset_y) = (position.x as i64, position.y as i64);

    let x = match position.h_align {
        HAlign::Right => canvas_w - cell_w - offset_x,
        HAlign::Center => half_rounded(canvas_w) - half_rounded(cell_w) + offset_x,
        HAlign::Left => offset_x,
    };
    let y = match position.v_align {
        VAlign::Bottom => canvas_h - cell_h - offset_y,
        VAlign::Middle => half_rounded(canvas_h) - half_rounded(cell_h) + offset_y,
        VAlign::Top => offset_y,
    };
    (x, y)
}

/// `round(value / 2)` with halves away from zero, for non-negative values.
fn half_rounded(value: i64) -> i64 {
    (value + 1) / 2
}

/// Every cell origin a watermark is composited at, in drawing order.
///
/// Repeating axes start at zero and step by cell size plus padding until the
/// canvas edge; non-repeating axes use `origin`. For `repeat-xy` the x loop is
/// outermost.
pub fn tile_origins(
    mode: RepeatMode,
    origin: (i64, i64),
    cell: (u32, u32),
    padding: (u32, u32),
    canvas: (u32, u32),
) -> Vec<(i64, i64)> {
    let columns = || axis_steps(cell.0, padding.0, canvas.0);
    let rows = || axis_steps(cell.1, padding.1, canvas.1);

    match mode {
        RepeatMode::NoRepeat => vec![origin],
        RepeatMode::RepeatX => columns().map(|x| (x, origin.1)).collect(),
        RepeatMode::RepeatY => rows().map(|y| (origin.0, y)).collect(),
        RepeatMode::RepeatXy => columns()
            .flat_map(|x| rows().map(move |y| (x, y)))
            .collect(),
    }
}

fn axis_steps(cell: u32, padding: u32, extent: u32) -> impl Iterator<Item = i64> {
    let step = (cell as usize + padding as usize).max(1);
    (0..extent as i64).step_by(step)
}

// =============================================================================
// Alpha on GD's 7-bit scale
// =============================================================================

/// Fully transparent on the 7-bit scale. Zero is fully opaque.
pub const GD_TRANSPARENT: u8 = 127;

/// Convert an 8-bit alpha (255 = opaque) to the 7-bit scale (0 = opaque).
pub fn to_gd_alpha(alpha: u8) -> u8 {
    GD_TRANSPARENT - (alpha >> 1)
}

/// Convert a 7-bit alpha (0 = opaque) back to 8-bit (255 = opaque).
pub fn from_gd_alpha(gd_alpha: u8) -> u8 {
    let gd_alpha = gd_alpha.min(GD_TRANSPARENT);
    255 - ((gd_alpha << 1) + (gd_alpha >> 6))
}

/// Rescale one pixel's 7-bit alpha for the requested opacity.
///
/// `min_alpha` is the most opaque value present in the watermark. When the
/// watermark has any non-transparent pixel, that pixel lands exactly at the
/// requested opacity and every other pixel keeps its relative transparency.
/// A fully transparent watermark takes the additive branch, which always
/// saturates at [`GD_TRANSPARENT`].
///
/// The result is truncated toward zero and clamped to `0..=127`.
pub fn scaled_gd_alpha(alpha: u8, min_alpha: u8, opacity_percent: u32) -> u8 {
    let fraction = opacity_percent as f64 / 100.0;
    let alpha = alpha as f64;
    let full = GD_TRANSPARENT as f64;

    let scaled = if min_alpha != GD_TRANSPARENT {
        full + full * fraction * (alpha - full) / (full - min_alpha as f64)
    } else {
        alpha + full * fraction
    };
    scaled.clamp(0.0, full) as u8
}

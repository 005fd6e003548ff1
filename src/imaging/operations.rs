//! High-level pixel operations.
//!
//! These functions combine the pure [`calculations`](super::calculations)
//! with `image::imageops`. They take and return owned buffers; nothing here
//! touches the filesystem or a codec.

use super::PixelBuffer;
use super::calculations::{
    GD_TRANSPARENT, ResizePlan, from_gd_alpha, plan_resize, scaled_gd_alpha, to_gd_alpha,
};
use super::params::Dimensions;
use image::imageops::{self, FilterType};
use image::{Rgba, Rgba32FImage};

/// Scale and crop `source` so it exactly fills `target`.
///
/// Returns the plan that was executed, or `None` when the source already has
/// the target size and is returned untouched.
pub fn resize_and_crop(
    source: PixelBuffer,
    target: Dimensions,
) -> (PixelBuffer, Option<ResizePlan>) {
    if source.dimensions() == target.as_tuple() {
        return (source, None);
    }

    let plan = plan_resize(source.dimensions(), target.as_tuple());
    let resized = imageops::resize(
        &source,
        plan.resized_width,
        plan.resized_height,
        FilterType::Lanczos3,
    );
    drop(source);

    let cropped = imageops::crop_imm(
        &resized,
        plan.crop_x,
        plan.crop_y,
        target.width,
        target.height,
    )
    .to_image();
    (cropped, Some(plan))
}

/// Lanczos3 resample of `buffer` to `width` x `height`, weighting each
/// sample by its alpha.
///
/// Colour under fully transparent pixels does not leak into visible edges,
/// and ringing is clamped back into range.
pub fn resize_premultiplied(buffer: &PixelBuffer, width: u32, height: u32) -> PixelBuffer {
    let premultiplied = Rgba32FImage::from_fn(buffer.width(), buffer.height(), |x, y| {
        let [r, g, b, a] = buffer.get_pixel(x, y).0.map(|c| f32::from(c) / 255.0);
        Rgba([r * a, g * a, b * a, a])
    });
    let resized = imageops::resize(&premultiplied, width, height, FilterType::Lanczos3);

    let to_u8 = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    PixelBuffer::from_fn(width, height, |x, y| {
        let [r, g, b, a] = resized.get_pixel(x, y).0;
        let alpha = to_u8(a);
        if alpha == 0 {
            return Rgba([0, 0, 0, 0]);
        }
        Rgba([to_u8(r / a), to_u8(g / a), to_u8(b / a), alpha])
    })
}

/// Most opaque alpha present in `buffer`, on the 7-bit scale.
///
/// An empty or fully transparent buffer yields [`GD_TRANSPARENT`].
pub fn min_gd_alpha(buffer: &PixelBuffer) -> u8 {
    buffer
        .pixels()
        .map(|p| to_gd_alpha(p[3]))
        .min()
        .unwrap_or(GD_TRANSPARENT)
}

/// Copy of `watermark` with every pixel's alpha rescaled for `opacity_percent`.
///
/// Colour channels are copied as-is. The input is left untouched.
pub fn apply_opacity(watermark: &PixelBuffer, opacity_percent: u32) -> PixelBuffer {
    let min_alpha = min_gd_alpha(watermark);
    let mut adjusted = watermark.clone();
    for pixel in adjusted.pixels_mut() {
        let gd_alpha = scaled_gd_alpha(to_gd_alpha(pixel[3]), min_alpha, opacity_percent);
        pixel[3] = from_gd_alpha(gd_alpha);
    }
    adjusted
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(width: u32, height: u32) -> PixelBuffer {
        PixelBuffer::from_fn(width, height, |x, y| {
            Rgba([(x % 256) as u8, (y % 256) as u8, 128, 255])
        })
    }

    // =========================================================================
    // resize_and_crop tests
    // =========================================================================

    #[test]
    fn exact_size_is_returned_unchanged() {
        let source = gradient(200, 150);
        let (result, plan) = resize_and_crop(source.clone(), Dimensions::new(200, 150));
        assert!(plan.is_none());
        assert_eq!(result, source);
    }

    #[test]
    fn landscape_source_fills_target_exactly() {
        let (result, plan) = resize_and_crop(gradient(800, 400), Dimensions::new(200, 150));
        assert_eq!(result.dimensions(), (200, 150));
        assert_eq!(plan.map(|p| p.crop_x), Some(50));
    }

    #[test]
    fn portrait_source_fills_target_exactly() {
        let (result, _) = resize_and_crop(gradient(300, 600), Dimensions::new(150, 260));
        assert_eq!(result.dimensions(), (150, 260));
    }

    #[test]
    fn upscaling_small_source() {
        let (result, _) = resize_and_crop(gradient(10, 10), Dimensions::new(200, 150));
        assert_eq!(result.dimensions(), (200, 150));
    }

    #[test]
    fn crop_is_centered() {
        // Left third red, middle blue, right third red; the square crop
        // of a 3:1 source keeps only the middle
        let source = PixelBuffer::from_fn(300, 100, |x, _| {
            if (100..200).contains(&x) {
                Rgba([0, 0, 255, 255])
            } else {
                Rgba([255, 0, 0, 255])
            }
        });
        let (result, _) = resize_and_crop(source, Dimensions::new(50, 50));
        let center = result.get_pixel(25, 25);
        assert!(center[2] > 200 && center[0] < 50, "{center:?}");
    }

    // =========================================================================
    // resize_premultiplied tests
    // =========================================================================

    #[test]
    fn transparent_colour_does_not_bleed_into_edges() {
        // Opaque red left half, fully transparent green right half
        let source = PixelBuffer::from_fn(16, 16, |x, _| {
            if x < 8 {
                Rgba([255, 0, 0, 255])
            } else {
                Rgba([0, 255, 0, 0])
            }
        });
        let result = resize_premultiplied(&source, 6, 6);

        assert_eq!(result.dimensions(), (6, 6));
        for pixel in result.pixels() {
            assert_eq!(pixel[1], 0, "{pixel:?}");
        }
        assert!(result.get_pixel(0, 3)[3] > 200);
        assert!(result.get_pixel(5, 3)[3] < 55);
    }

    #[test]
    fn uniform_opaque_buffer_resamples_unchanged() {
        let source = PixelBuffer::from_pixel(64, 64, Rgba([10, 20, 30, 255]));
        let result = resize_premultiplied(&source, 4, 4);
        assert_eq!(result, PixelBuffer::from_pixel(4, 4, Rgba([10, 20, 30, 255])));
    }

    // =========================================================================
    // Opacity tests
    // =========================================================================

    #[test]
    fn full_opacity_keeps_opaque_watermark_opaque() {
        let watermark = PixelBuffer::from_pixel(4, 4, Rgba([9, 8, 7, 255]));
        let adjusted = apply_opacity(&watermark, 100);
        assert_eq!(adjusted, watermark);
    }

    #[test]
    fn opacity_never_mutates_the_input() {
        let watermark = PixelBuffer::from_pixel(2, 2, Rgba([9, 8, 7, 255]));
        let before = watermark.clone();
        let adjusted = apply_opacity(&watermark, 30);
        assert_eq!(watermark, before);
        assert!(adjusted.get_pixel(0, 0)[3] < 255);
        assert_eq!(adjusted.get_pixel(0, 0)[0], 9);
    }

    #[test]
    fn fully_transparent_watermark_stays_transparent() {
        let watermark = PixelBuffer::from_pixel(3, 3, Rgba([1, 2, 3, 0]));
        let adjusted = apply_opacity(&watermark, 75);
        assert!(adjusted.pixels().all(|p| p[3] == 0));
    }

    #[test]
    fn most_opaque_pixel_reaches_requested_opacity() {
        let mut watermark = PixelBuffer::from_pixel(2, 1, Rgba([0, 0, 0, 0]));
        watermark.put_pixel(0, 0, Rgba([0, 0, 0, 255]));
        let adjusted = apply_opacity(&watermark, 75);
        // GD 31 → 8-bit 255 - (62 + 0)
        assert_eq!(adjusted.get_pixel(0, 0)[3], 193);
        assert_eq!(adjusted.get_pixel(1, 0)[3], 0);
    }

    #[test]
    fn min_alpha_of_mixed_buffer() {
        let mut buffer = PixelBuffer::from_pixel(2, 1, Rgba([0, 0, 0, 0]));
        assert_eq!(min_gd_alpha(&buffer), 127);
        buffer.put_pixel(1, 0, Rgba([0, 0, 0, 201]));
        assert_eq!(min_gd_alpha(&buffer), 127 - 100);
    }
}

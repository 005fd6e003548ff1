//! Image processing: pure Rust, no system libraries.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** (GIF, JPEG, PNG) | `image::ImageReader` with content sniffing |
//! | **Cover resize** | `imageops::resize` (Lanczos3) + `imageops::crop_imm` |
//! | **Opacity** | per-pixel alpha rescale on GD's 7-bit scale |
//! | **Encode** (GIF, JPEG, PNG) | `image::codecs::*` encoders |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for resize, placement, tiling and alpha math (unit testable)
//! - **Parameters**: Quality, output/source formats, dimensions
//! - **Codec**: [`ImageCodec`] trait + [`RustCodec`]
//! - **Operations**: Pixel functions combining calculations + `imageops`

mod calculations;
pub mod codec;
pub mod operations;
mod params;
pub mod rust_codec;

/// Decoded pixels. Every stage between decode and encode works on RGBA8.
pub type PixelBuffer = image::RgbaImage;

pub use calculations::{
    ResizeAxis, ResizePlan, plan_resize, png_compression_level, tile_origins, watermark_origin,
};
pub use codec::{CodecError, DecodedImage, ImageCodec};
pub use operations::{apply_opacity, resize_and_crop, resize_premultiplied};
pub use params::{Dimensions, FormatSpec, OutputFormat, Quality, SourceFormat};
pub use rust_codec::RustCodec;

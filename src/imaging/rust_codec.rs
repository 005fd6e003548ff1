//! Pure Rust codec built on the `image` crate.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Sniff + decode (GIF, JPEG, PNG) | `image::ImageReader::with_guessed_format` |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` with quality |
//! | Encode → PNG | `image::codecs::png::PngEncoder`, zlib level from quality |
//! | Encode → GIF | `image::codecs::gif::GifEncoder` (first frame only) |
//!
//! Animated GIF sources decode to their first frame.

use super::PixelBuffer;
use super::calculations::png_compression_level;
use super::codec::{CodecError, DecodedImage, ImageCodec};
use super::params::{OutputFormat, Quality, SourceFormat};
use image::codecs::gif::GifEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, PngEncoder};
use image::{DynamicImage, ImageReader};
use std::io::Cursor;

/// Pure Rust codec using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
#[derive(Debug, Clone, Copy, Default)]
pub struct RustCodec;

impl RustCodec {
    pub fn new() -> Self {
        Self
    }
}

/// zlib level (0-9) to the encoder setting. Level 0 stores the data
/// uncompressed.
fn png_compression(level: u8) -> CompressionType {
    match level {
        0 => CompressionType::Uncompressed,
        n => CompressionType::Level(n.min(9)),
    }
}

fn encode_jpeg(image: &DynamicImage, quality: Quality) -> Result<Vec<u8>, CodecError> {
    let mut bytes = Vec::new();
    // The encoder accepts 1-100; 0 would be rejected
    let quality = quality.value().clamp(1, Quality::MAX) as u8;
    let encoder = JpegEncoder::new_with_quality(&mut bytes, quality);
    // JPEG has no alpha channel
    DynamicImage::ImageRgb8(image.to_rgb8())
        .write_with_encoder(encoder)
        .map_err(|e| CodecError::Encode(format!("JPEG: {e}")))?;
    Ok(bytes)
}

fn encode_png(image: &DynamicImage, quality: Quality) -> Result<Vec<u8>, CodecError> {
    let mut bytes = Vec::new();
    let encoder = PngEncoder::new_with_quality(
        &mut bytes,
        png_compression(png_compression_level(quality)),
        image::codecs::png::FilterType::Adaptive,
    );
    image
        .write_with_encoder(encoder)
        .map_err(|e| CodecError::Encode(format!("PNG: {e}")))?;
    Ok(bytes)
}

fn encode_gif(image: &DynamicImage) -> Result<Vec<u8>, CodecError> {
    let mut bytes = Vec::new();
    {
        let mut encoder = GifEncoder::new(&mut bytes);
        encoder
            .encode_frame(image::Frame::new(image.to_rgba8()))
            .map_err(|e| CodecError::Encode(format!("GIF: {e}")))?;
    }
    Ok(bytes)
}

impl ImageCodec for RustCodec {
    fn decode(&self, bytes: &[u8]) -> Result<DecodedImage, CodecError> {
        let reader = ImageReader::new(Cursor::new(bytes)).with_guessed_format()?;
        let format = reader
            .format()
            .ok_or_else(|| CodecError::UnsupportedFormat("unrecognized image data".into()))?;
        let source_format = SourceFormat::from_image_format(format)
            .ok_or_else(|| CodecError::UnsupportedFormat(format!("{format:?}")))?;

        let image = reader
            .decode()
            .map_err(|e| CodecError::Decode(format!("{}: {e}", source_format.name())))?;
        Ok(DecodedImage {
            buffer: image.into_rgba8(),
            format: source_format,
        })
    }

    fn encode(
        &self,
        buffer: &PixelBuffer,
        format: OutputFormat,
        quality: Quality,
    ) -> Result<Vec<u8>, CodecError> {
        let image = DynamicImage::ImageRgba8(buffer.clone());
        match format {
            OutputFormat::Jpg => encode_jpeg(&image, quality),
            OutputFormat::Png => encode_png(&image, quality),
            OutputFormat::Gif => encode_gif(&image),
        }
    }
}

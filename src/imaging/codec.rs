//! Image codec trait and shared types.
//!
//! The [`ImageCodec`] trait is the seam between pixel work and file formats:
//! `decode` turns encoded bytes into an RGBA [`PixelBuffer`], `encode` turns a
//! buffer back into bytes of one [`OutputFormat`]. Everything between those
//! two calls operates on pixels only.
//!
//! The production implementation is [`RustCodec`](super::rust_codec::RustCodec),
//! built on the `image` crate's pure Rust GIF, JPEG and PNG codecs.

use super::PixelBuffer;
use super::params::{OutputFormat, Quality, SourceFormat};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),
    #[error("Decode failed: {0}")]
    Decode(String),
    #[error("Encode failed: {0}")]
    Encode(String),
}

/// A decoded source image.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub buffer: PixelBuffer,
    /// Format sniffed from the encoded bytes.
    pub format: SourceFormat,
}

impl DecodedImage {
    pub fn dimensions(&self) -> (u32, u32) {
        self.buffer.dimensions()
    }
}

/// Trait for image codecs.
///
/// Implementations must sniff the input format from content, never from a
/// file name, and reject anything outside GIF, JPEG and PNG.
pub trait ImageCodec {
    /// Decode encoded bytes into an RGBA buffer.
    fn decode(&self, bytes: &[u8]) -> Result<DecodedImage, CodecError>;

    /// Encode a buffer as `format`. `quality` is ignored by formats that
    /// don't use it.
    fn encode(
        &self,
        buffer: &PixelBuffer,
        format: OutputFormat,
        quality: Quality,
    ) -> Result<Vec<u8>, CodecError>;
}

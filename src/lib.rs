//! # thumbgen
//!
//! Fixed-size thumbnails from GIF, JPEG and PNG sources, with an optional
//! disk cache and an optional tiled, alpha-aware watermark.
//!
//! # Architecture: One Request, Five Stages
//!
//! ```text
//! 1. Resolve   request + config    →  size, format
//! 2. Cache     cache dir + mtimes  →  hit: done
//! 3. Decode    source bytes        →  RGBA buffer
//! 4. Resize    cover-fit + crop    →  exact-size buffer (+ watermark)
//! 5. Encode    buffer              →  bytes (+ cache write)
//! ```
//!
//! Every stage between decode and encode works on a plain RGBA
//! [`PixelBuffer`](imaging::PixelBuffer). Codecs sit behind the
//! [`ImageCodec`](imaging::ImageCodec) trait, so the pipeline can be tested
//! with a mock codec that records calls instead of encoding.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`service`] | `ThumbnailService`: request resolution, cache check, generation, output |
//! | [`imaging`] | Resize/crop planning, opacity math, codec trait + `image` crate codec |
//! | [`watermark`] | `WatermarkCompositor`: placement, tiling and alpha blending |
//! | [`cache`] | Canonical cache paths and the mtime freshness rule |
//! | [`config`] | `thumbgen.toml` loading, merging and validation |
//! | [`scan`] | Source discovery for batch runs |
//! | [`output`] | CLI output formatting for service events |
//!
//! # Design Decisions
//!
//! ## Cover Fit, Never Letterbox
//!
//! A thumbnail always has exactly the requested size. The source is scaled
//! uniformly until it covers the target box and the overflow is cropped
//! equally from both sides. Ratios are compared by cross-multiplication, so
//! the branch choice is exact even for very large images.
//!
//! ## GD Alpha Scale
//!
//! Watermark opacity math runs on the 7-bit alpha scale used by GD
//! (0 = opaque, 127 = transparent). Buffers stay 8-bit RGBA; pixels are
//! converted in and out around the opacity transform only.
//!
//! ## Path-Addressed Cache
//!
//! The cache is a directory of ready-to-serve files named after the source
//! stem, size and format. A cache hit returns the file's bytes unchanged.

pub mod cache;
pub mod config;
pub mod imaging;
pub mod output;
pub mod scan;
pub mod service;
pub mod watermark;

#[cfg(test)]
pub(crate) mod test_helpers;

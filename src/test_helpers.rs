//! Shared test utilities for the thumbgen test suite.
//!
//! Provides synthetic image encoders and filesystem helpers so unit tests
//! never depend on fixture files.
//!
//! # Usage
//!
//! ```rust,ignore
//! use crate::test_helpers::*;
//!
//! let tmp = tempfile::TempDir::new().unwrap();
//! let source = write_test_jpeg(tmp.path(), "pic.jpg", 400, 300);
//! set_mtime(&source, 1_000_000);
//! ```

use image::{ImageEncoder, Rgb, RgbImage, Rgba, RgbaImage};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::{Duration, UNIX_EPOCH};

// =========================================================================
// Synthetic images
// =========================================================================

/// JPEG bytes of a gradient image with the given dimensions.
pub fn encode_test_jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    let mut bytes = Vec::new();
    image::codecs::jpeg::JpegEncoder::new(&mut bytes)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
    bytes
}

/// PNG bytes of a solid black image where every pixel has the given alpha.
pub fn encode_test_png(width: u32, height: u32, alpha: u8) -> Vec<u8> {
    encode_png(&RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, alpha])))
}

/// PNG bytes of an arbitrary RGBA buffer.
pub fn encode_png(img: &RgbaImage) -> Vec<u8> {
    let mut bytes = Vec::new();
    image::codecs::png::PngEncoder::new(&mut bytes)
        .write_image(
            img.as_raw(),
            img.width(),
            img.height(),
            image::ExtendedColorType::Rgba8,
        )
        .unwrap();
    bytes
}

/// Write a gradient JPEG into `dir` and return its path.
pub fn write_test_jpeg(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, encode_test_jpeg(width, height)).unwrap();
    path
}

/// Write a solid PNG with the given alpha into `dir` and return its path.
pub fn write_test_png(dir: &Path, name: &str, width: u32, height: u32, alpha: u8) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, encode_test_png(width, height, alpha)).unwrap();
    path
}

// =========================================================================
// Filesystem
// =========================================================================

/// Set a file's modification time to `secs` after the Unix epoch.
pub fn set_mtime(path: &Path, secs: u64) {
    File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(UNIX_EPOCH + Duration::from_secs(secs))
        .unwrap();
}

//! Alpha-aware watermark compositing.
//!
//! A [`WatermarkCompositor`] owns a decoded watermark image and its
//! [`WatermarkConfig`]. [`apply`](WatermarkCompositor::apply) takes a
//! thumbnail buffer and returns it with the watermark drawn on top:
//!
//! 1. The watermark's alpha is rescaled for the configured opacity
//!    ([`apply_opacity`]) into a working copy.
//! 2. The copy is resampled once to the configured cell size, with
//!    premultiplied alpha.
//! 3. The cell is alpha-blended at every origin from [`tile_origins`],
//!    clipped to the thumbnail. Later tiles draw over earlier ones.
//!
//! Placement and tiling are pure functions in
//! [`imaging`](crate::imaging); this module only wires them to pixels.

use crate::config::{ConfigError, WatermarkConfig};
use crate::imaging::{
    ImageCodec, PixelBuffer, SourceFormat, apply_opacity, resize_premultiplied, tile_origins,
    watermark_origin,
};
use image::imageops;
use std::fs;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WatermarkError {
    #[error("Invalid watermark image: {0}")]
    InvalidWatermarkImage(String),
    #[error("Invalid watermark config: {0}")]
    InvalidConfig(#[from] ConfigError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A validated watermark ready to composite onto thumbnails.
#[derive(Debug, Clone)]
pub struct WatermarkCompositor {
    config: WatermarkConfig,
    image: PixelBuffer,
}

impl WatermarkCompositor {
    /// Read and decode `config.image`, which must be a PNG.
    pub fn load(codec: &impl ImageCodec, config: WatermarkConfig) -> Result<Self, WatermarkError> {
        config.validate()?;
        let path = &config.image;
        if !path.is_file() {
            return Err(WatermarkError::InvalidWatermarkImage(format!(
                "{} does not exist",
                path.display()
            )));
        }

        let bytes = fs::read(path)?;
        let decoded = codec.decode(&bytes).map_err(|e| {
            WatermarkError::InvalidWatermarkImage(format!("{}: {e}", path.display()))
        })?;
        if decoded.format != SourceFormat::Png {
            return Err(WatermarkError::InvalidWatermarkImage(format!(
                "{} is {}, not png",
                path.display(),
                decoded.format.name()
            )));
        }

        Ok(Self {
            config,
            image: decoded.buffer,
        })
    }

    /// Build from an already decoded watermark.
    pub fn from_image(config: WatermarkConfig, image: PixelBuffer) -> Result<Self, WatermarkError> {
        config.validate()?;
        Ok(Self { config, image })
    }

    pub fn config(&self) -> &WatermarkConfig {
        &self.config
    }

    pub fn image(&self) -> &PixelBuffer {
        &self.image
    }

    fn cell(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    /// Every origin the cell is drawn at on a canvas of this size.
    pub fn origins(&self, canvas: (u32, u32)) -> Vec<(i64, i64)> {
        let origin = watermark_origin(canvas, self.cell(), &self.config.position);
        let repetition = &self.config.repetition;
        tile_origins(
            repetition.mode,
            origin,
            self.cell(),
            (repetition.padding_x, repetition.padding_y),
            canvas,
        )
    }

    /// Composite the watermark onto `thumbnail`.
    pub fn apply(&self, mut thumbnail: PixelBuffer) -> PixelBuffer {
        let adjusted = apply_opacity(&self.image, self.config.opacity);
        let (cell_w, cell_h) = self.cell();
        let cell = if adjusted.dimensions() == (cell_w, cell_h) {
            adjusted
        } else {
            resize_premultiplied(&adjusted, cell_w, cell_h)
        };

        for (x, y) in self.origins(thumbnail.dimensions()) {
            imageops::overlay(&mut thumbnail, &cell, x, y);
        }
        thumbnail
    }
}

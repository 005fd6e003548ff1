//! Thumbnail orchestration.
//!
//! [`ThumbnailService`] runs one request at a time through these stages,
//! none of them retried:
//!
//! ```text
//! resolve format/size → cache check ─hit─→ done
//!                           │miss
//!                           ▼
//!   decode source → resize + crop → [watermark] → encode → cache write → done
//! ```
//!
//! The result is kept as [`ThumbnailData`]: encoded bytes tagged with their
//! format and size. It is replaced whole by every successful request and left
//! untouched by failed ones.
//!
//! ## Progress events
//!
//! When built [`with_events`](ThumbnailService::with_events), the service
//! sends a [`ThumbnailEvent`] for every cache decision and write. The library
//! never prints; the CLI formats events through [`output`](crate::output).

use crate::cache::{self, CacheLocator};
use crate::config::{ConfigError, ThumbnailConfig, validate_cache_directory, validate_dimensions};
use crate::imaging::{
    CodecError, Dimensions, ImageCodec, OutputFormat, Quality, RustCodec, resize_and_crop,
};
use crate::watermark::{WatermarkCompositor, WatermarkError};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ThumbnailError {
    #[error("Source image not found: {0}")]
    SourceNotFound(PathBuf),
    #[error("Unsupported image type: {0}")]
    UnsupportedImageType(String),
    #[error("Invalid image data: {0}")]
    InvalidImageData(String),
    #[error(transparent)]
    InvalidConfig(#[from] ConfigError),
    #[error(transparent)]
    Watermark(#[from] WatermarkError),
    #[error("Unsupported output format: {0}. Valid options: gif, jpg, png")]
    UnsupportedOutputFormat(String),
    #[error("Encode failed: {0}")]
    Encode(CodecError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ThumbnailError>;

/// The current thumbnail: encoded bytes plus what they contain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThumbnailData {
    pub bytes: Vec<u8>,
    pub format: OutputFormat,
    /// `None` when the bytes were supplied unvalidated.
    pub dimensions: Option<Dimensions>,
}

/// Per-call overrides. Unset or zero values fall back to the service config.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThumbnailRequest {
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// Format name; anything outside gif/jpg/png is ignored.
    pub format: Option<String>,
}

impl ThumbnailRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }
}

/// A request after defaults have been applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedRequest {
    pub dimensions: Dimensions,
    pub format: OutputFormat,
}

/// Progress reported while serving a request.
#[derive(Debug, Clone, PartialEq)]
pub enum ThumbnailEvent {
    CacheHit {
        source: PathBuf,
        cache_path: PathBuf,
    },
    CacheMiss {
        source: PathBuf,
        cache_path: PathBuf,
    },
    Generated {
        source: PathBuf,
        dimensions: Dimensions,
        format: OutputFormat,
        bytes: usize,
        /// False when the source already had the requested size.
        resized: bool,
    },
    CacheWritten {
        path: PathBuf,
    },
    CacheWriteFailed {
        path: PathBuf,
        error: String,
    },
    WatermarkApplied {
        tiles: usize,
    },
}

/// Generates, caches and holds one thumbnail at a time.
pub struct ThumbnailService<C: ImageCodec = RustCodec> {
    codec: C,
    config: ThumbnailConfig,
    watermark: Option<WatermarkCompositor>,
    thumbnail: Option<ThumbnailData>,
    events: Option<Sender<ThumbnailEvent>>,
}

impl ThumbnailService<RustCodec> {
    /// Service backed by the `image` crate codec.
    pub fn with_config(config: ThumbnailConfig) -> Result<Self> {
        Self::new(RustCodec, config)
    }
}

impl<C: ImageCodec> ThumbnailService<C> {
    /// Validate `config` and build a service around `codec`.
    ///
    /// When caching is enabled with a directory, the directory must exist and
    /// be writable.
    pub fn new(codec: C, config: ThumbnailConfig) -> Result<Self> {
        config.validate()?;
        if config.cache.enabled
            && let Some(dir) = &config.cache.directory
        {
            validate_cache_directory(dir)?;
        }
        Ok(Self {
            codec,
            config,
            watermark: None,
            thumbnail: None,
            events: None,
        })
    }

    /// Report progress on `sender`.
    pub fn with_events(mut self, sender: Sender<ThumbnailEvent>) -> Self {
        self.events = Some(sender);
        self
    }

    /// Composite `watermark` onto every generated thumbnail before it is
    /// encoded and cached.
    pub fn with_watermark(mut self, watermark: WatermarkCompositor) -> Self {
        self.watermark = Some(watermark);
        self
    }

    pub fn config(&self) -> &ThumbnailConfig {
        &self.config
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    /// The most recent thumbnail, if any request has succeeded.
    pub fn thumbnail(&self) -> Option<&ThumbnailData> {
        self.thumbnail.as_ref()
    }

    fn emit(&self, event: ThumbnailEvent) {
        if let Some(tx) = &self.events {
            // A dropped receiver only means nobody is listening
            tx.send(event).ok();
        }
    }

    // =========================================================================
    // Setters
    // =========================================================================

    pub fn set_format(&mut self, name: &str) -> Result<()> {
        self.config.format = OutputFormat::parse(name)
            .ok_or_else(|| ThumbnailError::UnsupportedOutputFormat(name.to_string()))?;
        Ok(())
    }

    pub fn set_dimensions(&mut self, width: u32, height: u32) -> Result<()> {
        validate_dimensions("thumbnail", width, height)?;
        self.config.width = width;
        self.config.height = height;
        Ok(())
    }

    pub fn set_quality(&mut self, quality: u32) -> Result<()> {
        self.config.quality = Quality::new(quality).ok_or_else(|| {
            ConfigError::Validation(format!("thumbnail.quality must be 0-100, got {quality}"))
        })?;
        Ok(())
    }

    pub fn set_caching(&mut self, enabled: bool) {
        self.config.cache.enabled = enabled;
    }

    /// Use `dir` for cached thumbnails. It must already exist and be writable.
    pub fn set_cache_location(&mut self, dir: impl Into<PathBuf>) -> Result<()> {
        let dir = dir.into();
        validate_cache_directory(&dir)?;
        self.config.cache.directory = Some(dir);
        Ok(())
    }

    pub fn set_cache_duration(&mut self, seconds: u64) {
        self.config.cache.duration = seconds;
    }

    pub fn set_watermark(&mut self, watermark: Option<WatermarkCompositor>) {
        self.watermark = watermark;
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Apply config defaults to `request`.
    pub fn resolve(&self, request: &ThumbnailRequest) -> ResolvedRequest {
        let positive_or = |value: Option<u32>, default: u32| {
            value.filter(|&v| v > 0).unwrap_or(default)
        };
        ResolvedRequest {
            dimensions: Dimensions::new(
                positive_or(request.width, self.config.width),
                positive_or(request.height, self.config.height),
            ),
            format: request
                .format
                .as_deref()
                .and_then(OutputFormat::parse)
                .unwrap_or(self.config.format),
        }
    }

    fn cache_locator(&self) -> Option<CacheLocator> {
        let cache = &self.config.cache;
        cache
            .directory
            .as_ref()
            .filter(|_| cache.enabled)
            .map(CacheLocator::new)
    }

    /// Where the thumbnail for this request is cached, when caching is active.
    pub fn cache_path(&self, source: &Path, request: &ThumbnailRequest) -> Option<PathBuf> {
        let resolved = self.resolve(request);
        self.cache_locator()
            .map(|locator| locator.path(source, resolved.dimensions, resolved.format))
    }

    /// Whether a fresh cached thumbnail exists for this request.
    pub fn is_cached(&self, source: &Path, request: &ThumbnailRequest) -> bool {
        self.cache_path(source, request).is_some_and(|path| {
            cache::is_cached(source, &path, self.config.cache.duration)
        })
    }

    // =========================================================================
    // Generation
    // =========================================================================

    /// Produce the thumbnail for `source`, from cache when fresh.
    pub fn get_thumbnail(
        &mut self,
        source: &Path,
        request: &ThumbnailRequest,
    ) -> Result<&ThumbnailData> {
        let resolved = self.resolve(request);
        let cache_path = self.cache_path(source, request);

        if let Some(path) = &cache_path {
            if let Some(data) = self.load_cached(source, path, resolved) {
                self.emit(ThumbnailEvent::CacheHit {
                    source: source.to_path_buf(),
                    cache_path: path.clone(),
                });
                return Ok(&*self.thumbnail.insert(data));
            }
            self.emit(ThumbnailEvent::CacheMiss {
                source: source.to_path_buf(),
                cache_path: path.clone(),
            });
        }

        let data = self.generate(source, resolved)?;

        if let Some(path) = cache_path {
            // The thumbnail is still served when the cache cannot be written
            match fs::write(&path, &data.bytes) {
                Ok(()) => self.emit(ThumbnailEvent::CacheWritten { path }),
                Err(e) => self.emit(ThumbnailEvent::CacheWriteFailed {
                    path,
                    error: e.to_string(),
                }),
            }
        }

        Ok(&*self.thumbnail.insert(data))
    }

    /// Read a fresh cache file. A file that no longer decodes counts as a miss.
    fn load_cached(
        &self,
        source: &Path,
        path: &Path,
        resolved: ResolvedRequest,
    ) -> Option<ThumbnailData> {
        if !cache::is_cached(source, path, self.config.cache.duration) {
            return None;
        }
        let bytes = fs::read(path).ok()?;
        let decoded = self.codec.decode(&bytes).ok()?;
        let (width, height) = decoded.dimensions();
        Some(ThumbnailData {
            bytes,
            format: resolved.format,
            dimensions: Some(Dimensions::new(width, height)),
        })
    }

    fn generate(&self, source: &Path, resolved: ResolvedRequest) -> Result<ThumbnailData> {
        if !source.is_file() {
            return Err(ThumbnailError::SourceNotFound(source.to_path_buf()));
        }
        let bytes = fs::read(source)?;
        let decoded = self.codec.decode(&bytes).map_err(|e| {
            ThumbnailError::UnsupportedImageType(format!("{}: {e}", source.display()))
        })?;
        drop(bytes);

        let (mut buffer, plan) = resize_and_crop(decoded.buffer, resolved.dimensions);
        if let Some(watermark) = &self.watermark {
            buffer = watermark.apply(buffer);
            self.emit(ThumbnailEvent::WatermarkApplied {
                tiles: watermark.origins(buffer.dimensions()).len(),
            });
        }

        let encoded = self
            .codec
            .encode(&buffer, resolved.format, self.config.quality)
            .map_err(ThumbnailError::Encode)?;

        self.emit(ThumbnailEvent::Generated {
            source: source.to_path_buf(),
            dimensions: resolved.dimensions,
            format: resolved.format,
            bytes: encoded.len(),
            resized: plan.is_some(),
        });

        Ok(ThumbnailData {
            bytes: encoded,
            format: resolved.format,
            dimensions: Some(resolved.dimensions),
        })
    }

    // =========================================================================
    // Externally supplied data
    // =========================================================================

    /// Replace the current thumbnail with `bytes`.
    ///
    /// With `validate`, the bytes must decode as gif, jpeg or png and the
    /// thumbnail is tagged with the detected format and size. Without it, the
    /// bytes are taken as the configured format.
    pub fn update_thumbnail_data(&mut self, bytes: Vec<u8>, validate: bool) -> Result<()> {
        let data = if validate {
            let decoded = self
                .codec
                .decode(&bytes)
                .map_err(|e| ThumbnailError::InvalidImageData(e.to_string()))?;
            let (width, height) = decoded.dimensions();
            ThumbnailData {
                bytes,
                format: decoded.format.output_format(),
                dimensions: Some(Dimensions::new(width, height)),
            }
        } else {
            ThumbnailData {
                bytes,
                format: self.config.format,
                dimensions: None,
            }
        };
        self.thumbnail = Some(data);
        Ok(())
    }

    /// Composite `watermark` onto the current thumbnail and re-encode it in
    /// the same format at the configured quality.
    pub fn apply_watermark(&mut self, watermark: &WatermarkCompositor) -> Result<&ThumbnailData> {
        let current = self.current()?;
        let decoded = self
            .codec
            .decode(&current.bytes)
            .map_err(|e| ThumbnailError::InvalidImageData(e.to_string()))?;
        let format = current.format;

        let buffer = watermark.apply(decoded.buffer);
        let (width, height) = buffer.dimensions();
        let tiles = watermark.origins((width, height)).len();
        let bytes = self
            .codec
            .encode(&buffer, format, self.config.quality)
            .map_err(ThumbnailError::Encode)?;

        self.emit(ThumbnailEvent::WatermarkApplied { tiles });
        Ok(&*self.thumbnail.insert(ThumbnailData {
            bytes,
            format,
            dimensions: Some(Dimensions::new(width, height)),
        }))
    }

    /// Write the current thumbnail to `writer` and return its content type.
    pub fn output_thumbnail(&self, writer: &mut impl Write) -> Result<&'static str> {
        let current = self.current()?;
        writer.write_all(&current.bytes)?;
        Ok(current.format.content_type())
    }

    fn current(&self) -> Result<&ThumbnailData> {
        self.thumbnail
            .as_ref()
            .ok_or_else(|| ThumbnailError::InvalidImageData("no thumbnail generated yet".into()))
    }
}

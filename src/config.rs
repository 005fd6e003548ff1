//! Configuration for thumbnails, the on-disk cache, and watermarks.
//!
//! Settings are loaded from an optional `thumbgen.toml`. Stock defaults are
//! serialized to a TOML table and the user file is merged on top, so a file
//! only needs the keys it wants to change.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [thumbnail]
//! width = 200               # Target width in pixels (> 0)
//! height = 150              # Target height in pixels (> 0)
//! format = "jpg"            # gif, jpg or png
//! quality = 80              # 0-100; PNG maps this to a compression level
//!
//! [thumbnail.cache]
//! enabled = false
//! # directory = "cache"     # Existing, writable directory
//! duration = 86400          # Seconds; 0 = valid until the source changes
//!
//! [watermark]               # Section absent = no watermark
//! image = "wm.png"          # Must be a PNG
//! width = 20
//! height = 10
//! opacity = 75              # 0-100
//!
//! [watermark.position]
//! h_align = "right"         # left, center, right
//! v_align = "bottom"        # top, middle, bottom
//! x = 5
//! y = 5
//!
//! [watermark.repetition]
//! mode = "no-repeat"        # no-repeat, repeat-x, repeat-y, repeat-xy
//! padding_x = 0
//! padding_y = 0
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::{OutputFormat, Quality};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Default config file name looked up by the CLI.
pub const CONFIG_FILENAME: &str = "thumbgen.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Everything a `thumbgen.toml` can hold.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub thumbnail: ThumbnailConfig,
    /// Watermark applied after every thumbnail, when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub watermark: Option<WatermarkConfig>,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.thumbnail.validate()?;
        if let Some(watermark) = &self.watermark {
            watermark.validate()?;
        }
        Ok(())
    }
}

/// Thumbnail generation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThumbnailConfig {
    pub width: u32,
    pub height: u32,
    pub format: OutputFormat,
    pub quality: Quality,
    pub cache: CacheConfig,
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            width: 200,
            height: 150,
            format: OutputFormat::default(),
            quality: Quality::default(),
            cache: CacheConfig::default(),
        }
    }
}

impl ThumbnailConfig {
    /// Validate value ranges. Does not touch the filesystem; see
    /// [`validate_cache_directory`] for the cache directory check.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_dimensions("thumbnail", self.width, self.height)?;
        if Quality::new(self.quality.value()).is_none() {
            return Err(ConfigError::Validation(
                "thumbnail.quality must be 0-100".into(),
            ));
        }
        Ok(())
    }
}

/// On-disk cache settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    pub enabled: bool,
    /// Cache directory. Caching is inactive while this is unset, even when
    /// `enabled` is true.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,
    /// Lifetime of a cached file in seconds. Zero keeps the file until the
    /// source image is modified after it.
    pub duration: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            directory: None,
            duration: 86_400,
        }
    }
}

/// Check that `path` is an existing directory we can write into.
pub fn validate_cache_directory(path: &Path) -> Result<(), ConfigError> {
    let metadata = fs::metadata(path).map_err(|e| {
        ConfigError::Validation(format!(
            "cache directory {} is not accessible: {e}",
            path.display()
        ))
    })?;
    if !metadata.is_dir() {
        return Err(ConfigError::Validation(format!(
            "cache directory {} is not a directory",
            path.display()
        )));
    }
    if metadata.permissions().readonly() {
        return Err(ConfigError::Validation(format!(
            "cache directory {} is not writable",
            path.display()
        )));
    }
    Ok(())
}

/// Reject zero-sized dimensions. `what` prefixes the error message.
pub fn validate_dimensions(what: &str, width: u32, height: u32) -> Result<(), ConfigError> {
    if width == 0 || height == 0 {
        return Err(ConfigError::Validation(format!(
            "{what} dimensions must be positive, got {width}x{height}"
        )));
    }
    Ok(())
}

// =============================================================================
// Watermark settings
// =============================================================================

/// Watermark image, size, placement, tiling and opacity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WatermarkConfig {
    /// PNG file composited onto the thumbnail.
    pub image: PathBuf,
    /// Size each watermark cell is resampled to.
    pub width: u32,
    pub height: u32,
    /// Opacity in percent (0 = invisible, 100 = as drawn).
    pub opacity: u32,
    pub position: Position,
    pub repetition: Repetition,
}

impl Default for WatermarkConfig {
    fn default() -> Self {
        Self {
            image: PathBuf::new(),
            width: 20,
            height: 10,
            opacity: 75,
            position: Position::default(),
            repetition: Repetition::default(),
        }
    }
}

impl WatermarkConfig {
    pub fn new(image: impl Into<PathBuf>) -> Self {
        Self {
            image: image.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_dimensions("watermark", self.width, self.height)?;
        validate_opacity(self.opacity)
    }

    /// Set the cell size. Leaves the config unchanged on error.
    pub fn set_dimensions(&mut self, width: u32, height: u32) -> Result<(), ConfigError> {
        validate_dimensions("watermark", width, height)?;
        self.width = width;
        self.height = height;
        Ok(())
    }

    /// Set the opacity percentage. Leaves the config unchanged on error.
    pub fn set_opacity(&mut self, opacity: u32) -> Result<(), ConfigError> {
        validate_opacity(opacity)?;
        self.opacity = opacity;
        Ok(())
    }

    pub fn set_position(&mut self, h_align: HAlign, v_align: VAlign, x: u32, y: u32) {
        self.position = Position {
            h_align,
            v_align,
            x,
            y,
        };
    }

    pub fn set_repetition(&mut self, mode: RepeatMode, padding_x: u32, padding_y: u32) {
        self.repetition = Repetition {
            mode,
            padding_x,
            padding_y,
        };
    }
}

/// The watermark to use once command line overrides are applied.
///
/// `image` replaces the configured watermark image, or enables a default
/// watermark when none is configured. An opacity override without any
/// watermark is an error.
pub fn override_watermark(
    configured: Option<WatermarkConfig>,
    image: Option<&Path>,
    opacity: Option<u32>,
) -> Result<Option<WatermarkConfig>, ConfigError> {
    let watermark = match (image, configured) {
        (Some(image), Some(config)) => Some(WatermarkConfig {
            image: image.to_path_buf(),
            ..config
        }),
        (Some(image), None) => Some(WatermarkConfig::new(image)),
        (None, config) => config,
    };

    match (watermark, opacity) {
        (Some(mut watermark), Some(opacity)) => {
            watermark.set_opacity(opacity)?;
            Ok(Some(watermark))
        }
        (None, Some(_)) => Err(ConfigError::Validation(
            "watermark opacity set but no watermark image is configured".into(),
        )),
        (watermark, None) => Ok(watermark),
    }
}

fn validate_opacity(opacity: u32) -> Result<(), ConfigError> {
    if opacity > 100 {
        return Err(ConfigError::Validation(format!(
            "watermark.opacity must be 0-100, got {opacity}"
        )));
    }
    Ok(())
}

/// Alignment plus an offset from the aligned edge (or from center).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Position {
    pub h_align: HAlign,
    pub v_align: VAlign,
    pub x: u32,
    pub y: u32,
}

impl Default for Position {
    fn default() -> Self {
        Self {
            h_align: HAlign::Right,
            v_align: VAlign::Bottom,
            x: 5,
            y: 5,
        }
    }
}

/// Tiling mode and the gap between tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Repetition {
    pub mode: RepeatMode,
    pub padding_x: u32,
    pub padding_y: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HAlign {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VAlign {
    Top,
    Middle,
    Bottom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RepeatMode {
    #[default]
    NoRepeat,
    RepeatX,
    RepeatY,
    RepeatXy,
}

/// `FromStr` + `Display` for the closed keyword enums, so the CLI can parse
/// them with the same names the config file uses.
macro_rules! keyword_enum {
    ($ty:ident, $kind:literal, { $($variant:ident => $name:literal),+ $(,)? }) => {
        impl $ty {
            pub fn name(self) -> &'static str {
                match self {
                    $(Self::$variant => $name),+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.name())
            }
        }

        impl FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($name => Ok(Self::$variant),)+
                    _ => Err(format!(
                        concat!("invalid ", $kind, ": {}. Valid options: {}"),
                        s,
                        [$($name),+].join(", ")
                    )),
                }
            }
        }
    };
}

keyword_enum!(HAlign, "horizontal alignment", {
    Left => "left",
    Center => "center",
    Right => "right",
});

keyword_enum!(VAlign, "vertical alignment", {
    Top => "top",
    Middle => "middle",
    Bottom => "bottom",
});

keyword_enum!(RepeatMode, "repetition", {
    NoRepeat => "no-repeat",
    RepeatX => "repeat-x",
    RepeatY => "repeat-y",
    RepeatXy => "repeat-xy",
});

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer user overrides are merged on top of.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(AppConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist, `Err` if it exists but
/// contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<AppConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: AppConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `path`, falling back to stock defaults when it is absent.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(path)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `thumbgen.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# thumbgen configuration
# ======================
# All settings are optional. Values shown below are the defaults.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Thumbnail generation
# ---------------------------------------------------------------------------
[thumbnail]
# Exact output size in pixels. The source is scaled to cover this box and
# the overflow is cropped equally from both sides.
width = 200
height = 150

# Output format: gif, jpg or png.
format = "jpg"

# Encoding quality (0-100). JPEG uses it directly; PNG turns it into a
# compression level (100 = no compression, 0 = maximum); GIF ignores it.
quality = 80

# ---------------------------------------------------------------------------
# Disk cache
# ---------------------------------------------------------------------------
[thumbnail.cache]
enabled = false

# Existing, writable directory. Files are named <stem>_<w>x<h>.<format>.
# directory = "cache"

# Seconds a cached thumbnail stays valid. With 0 it stays valid until the
# source image is modified; a positive value ignores source changes.
duration = 86400

# ---------------------------------------------------------------------------
# Watermark (remove the comment markers to enable)
# ---------------------------------------------------------------------------
# [watermark]
# image = "wm.png"       # PNG with or without transparency
# width = 20             # Cell size the watermark is resampled to
# height = 10
# opacity = 75           # 0-100
#
# [watermark.position]
# h_align = "right"      # left, center, right
# v_align = "bottom"     # top, middle, bottom
# x = 5                  # Offset from the aligned edge
# y = 5
#
# [watermark.repetition]
# mode = "no-repeat"     # no-repeat, repeat-x, repeat-y, repeat-xy
# padding_x = 0          # Gap between tiles
# padding_y = 0
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, content: &str) -> PathBuf {
        let path = dir.path().join(CONFIG_FILENAME);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn default_thumbnail_config() {
        let config = ThumbnailConfig::default();
        assert_eq!((config.width, config.height), (200, 150));
        assert_eq!(config.format, OutputFormat::Jpg);
        assert_eq!(config.quality.value(), 80);
        assert!(!config.cache.enabled);
        assert_eq!(config.cache.directory, None);
    }

    #[test]
    fn watermark_overrides_merge_with_file() {
        let configured = WatermarkConfig {
            opacity: 40,
            ..WatermarkConfig::new("file.png")
        };
        let merged = override_watermark(Some(configured), Some(Path::new("flag.png")), None)
            .unwrap()
            .unwrap();
        assert_eq!(merged.image, PathBuf::from("flag.png"));
        assert_eq!(merged.opacity, 40);

        let merged = override_watermark(None, Some(Path::new("flag.png")), Some(10))
            .unwrap()
            .unwrap();
        assert_eq!(merged.opacity, 10);

        assert_eq!(override_watermark(None, None, None).unwrap(), None);
    }

    #[test]
    fn watermark_opacity_without_watermark_is_rejected() {
        let result = override_watermark(None, None, Some(50));
        assert!(matches!(result, Err(ConfigError::Validation(_))));

        let result = override_watermark(None, Some(Path::new("wm.png")), Some(101));
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn default_watermark_config() {
        let config = WatermarkConfig::default();
        assert_eq!((config.width, config.height), (20, 10));
        assert_eq!(config.opacity, 75);
        assert_eq!(config.position.h_align, HAlign::Right);
        assert_eq!(config.position.v_align, VAlign::Bottom);
        assert_eq!((config.position.x, config.position.y), (5, 5));
        assert_eq!(config.repetition.mode, RepeatMode::NoRepeat);
    }

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(&tmp.path().join(CONFIG_FILENAME)).unwrap();
        assert_eq!(config.thumbnail, ThumbnailConfig::default());
        assert!(config.watermark.is_none());
    }

    #[test]
    fn load_config_merges_partial_file() {
        let tmp = TempDir::new().unwrap();
        let path = write_config(
            &tmp,
            r#"
[thumbnail]
format = "png"

[thumbnail.cache]
duration = 0
"#,
        );

        let config = load_config(&path).unwrap();
        assert_eq!(config.thumbnail.format, OutputFormat::Png);
        assert_eq!(config.thumbnail.cache.duration, 0);
        // Unspecified values keep their defaults
        assert_eq!(config.thumbnail.width, 200);
        assert_eq!(config.thumbnail.quality.value(), 80);
    }

    #[test]
    fn load_config_reads_watermark_section() {
        let tmp = TempDir::new().unwrap();
        let path = write_config(
            &tmp,
            r#"
[watermark]
image = "wm.png"
opacity = 50

[watermark.position]
h_align = "center"
v_align = "middle"

[watermark.repetition]
mode = "repeat-xy"
padding_x = 5
padding_y = 5
"#,
        );

        let wm = load_config(&path).unwrap().watermark.unwrap();
        assert_eq!(wm.image, PathBuf::from("wm.png"));
        assert_eq!(wm.opacity, 50);
        assert_eq!((wm.width, wm.height), (20, 10));
        assert_eq!(wm.position.h_align, HAlign::Center);
        assert_eq!(wm.position.x, 5);
        assert_eq!(wm.repetition.mode, RepeatMode::RepeatXy);
        assert_eq!(wm.repetition.padding_y, 5);
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        let path = write_config(&tmp, "this is not valid toml [[[");
        assert!(matches!(load_config(&path), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn load_config_rejects_unknown_keys() {
        let tmp = TempDir::new().unwrap();
        let path = write_config(&tmp, "[thumbnail]\nwidht = 10\n");
        assert!(matches!(load_config(&path), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn load_config_rejects_unknown_format() {
        let tmp = TempDir::new().unwrap();
        let path = write_config(&tmp, "[thumbnail]\nformat = \"bmp\"\n");
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn load_config_validates_ranges() {
        let tmp = TempDir::new().unwrap();
        let path = write_config(&tmp, "[thumbnail]\nquality = 101\n");
        assert!(matches!(load_config(&path), Err(ConfigError::Validation(_))));

        let path = write_config(&tmp, "[thumbnail]\nwidth = 0\n");
        assert!(matches!(load_config(&path), Err(ConfigError::Validation(_))));

        let path = write_config(&tmp, "[watermark]\nopacity = 120\n");
        assert!(matches!(load_config(&path), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn stock_config_parses_to_defaults() {
        let value: toml::Value = toml::from_str(stock_config_toml()).unwrap();
        let config = resolve_config(stock_defaults_value(), Some(value)).unwrap();
        assert_eq!(config.thumbnail, ThumbnailConfig::default());
        assert!(config.watermark.is_none());
    }

    #[test]
    fn merge_toml_overlays_nested_tables() {
        let base: toml::Value = toml::from_str("[a]\nx = 1\ny = 2\n").unwrap();
        let overlay: toml::Value = toml::from_str("[a]\ny = 3\n").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["a"]["x"].as_integer(), Some(1));
        assert_eq!(merged["a"]["y"].as_integer(), Some(3));
    }

    #[test]
    fn watermark_setters_reject_invalid_values() {
        let mut config = WatermarkConfig::new("wm.png");
        assert!(config.set_opacity(101).is_err());
        assert_eq!(config.opacity, 75);
        assert!(config.set_dimensions(0, 10).is_err());
        assert_eq!((config.width, config.height), (20, 10));

        config.set_opacity(100).unwrap();
        config.set_dimensions(30, 30).unwrap();
        assert_eq!(config.opacity, 100);
        assert_eq!((config.width, config.height), (30, 30));
    }

    #[test]
    fn keyword_enums_parse_config_names() {
        assert_eq!("center".parse::<HAlign>(), Ok(HAlign::Center));
        assert_eq!("bottom".parse::<VAlign>(), Ok(VAlign::Bottom));
        assert_eq!("repeat-xy".parse::<RepeatMode>(), Ok(RepeatMode::RepeatXy));
        assert!("diagonal".parse::<RepeatMode>().is_err());
        assert_eq!(RepeatMode::RepeatX.to_string(), "repeat-x");
    }

    #[test]
    fn cache_directory_must_exist() {
        let tmp = TempDir::new().unwrap();
        assert!(validate_cache_directory(tmp.path()).is_ok());
        assert!(validate_cache_directory(&tmp.path().join("missing")).is_err());

        let file = tmp.path().join("file.txt");
        fs::write(&file, "x").unwrap();
        assert!(validate_cache_directory(&file).is_err());
    }
}

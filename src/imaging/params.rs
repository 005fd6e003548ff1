//! Parameter types for image operations.
//!
//! These types describe *what* to produce, not *how*. They are shared by the
//! pure [`calculations`](super::calculations), the [`codec`](super::codec)
//! seam, and the service layer.
//!
//! ## Types
//!
//! - [`Quality`]: encoding quality (0-100, default 80). Rejected, not clamped, when out of range.
//! - [`OutputFormat`]: the closed set of thumbnail formats plus their dispatch table.
//! - [`SourceFormat`]: formats accepted as input.
//! - [`Dimensions`]: a width/height pair in pixels.

use image::ImageFormat;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Encoding quality (0-100).
///
/// JPEG uses the value directly. PNG translates it to a zlib compression
/// level via [`png_compression_level`](super::calculations::png_compression_level).
/// GIF ignores it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quality(u32);

impl Quality {
    pub const MAX: u32 = 100;

    /// Returns `None` when `value` is above 100.
    pub fn new(value: u32) -> Option<Self> {
        (value <= Self::MAX).then_some(Self(value))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(80)
    }
}

/// Pixel dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn as_tuple(self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Thumbnail output format.
///
/// Every per-format decision goes through [`OutputFormat::spec`] so no
/// component compares format strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Gif,
    Jpg,
    Png,
}

/// Static description of an [`OutputFormat`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatSpec {
    /// File extension, also the name accepted in config and on the CLI.
    pub extension: &'static str,
    pub content_type: &'static str,
    pub image_format: ImageFormat,
    /// Whether [`Quality`] influences the encoded output.
    pub uses_quality: bool,
}

const GIF: FormatSpec = FormatSpec {
    extension: "gif",
    content_type: "image/gif",
    image_format: ImageFormat::Gif,
    uses_quality: false,
};

const JPG: FormatSpec = FormatSpec {
    extension: "jpg",
    content_type: "image/jpeg",
    image_format: ImageFormat::Jpeg,
    uses_quality: true,
};

const PNG: FormatSpec = FormatSpec {
    extension: "png",
    content_type: "image/png",
    image_format: ImageFormat::Png,
    uses_quality: true,
};

impl OutputFormat {
    pub const ALL: [OutputFormat; 3] = [OutputFormat::Gif, OutputFormat::Jpg, OutputFormat::Png];

    pub fn spec(self) -> &'static FormatSpec {
        match self {
            Self::Gif => &GIF,
            Self::Jpg => &JPG,
            Self::Png => &PNG,
        }
    }

    pub fn extension(self) -> &'static str {
        self.spec().extension
    }

    pub fn content_type(self) -> &'static str {
        self.spec().content_type
    }

    /// Parse a format name, returning `None` for anything outside the table.
    ///
    /// Only the canonical extensions are accepted (`"jpg"`, not `"jpeg"`).
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|format| format.extension() == name)
    }
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::Jpg
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| {
            format!("unsupported output format: {s}. Valid options: gif, jpg, png")
        })
    }
}

/// Formats accepted as decode input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Gif,
    Jpeg,
    Png,
}

impl SourceFormat {
    /// Map a sniffed [`ImageFormat`] to a supported source format.
    pub fn from_image_format(format: ImageFormat) -> Option<Self> {
        match format {
            ImageFormat::Gif => Some(Self::Gif),
            ImageFormat::Jpeg => Some(Self::Jpeg),
            ImageFormat::Png => Some(Self::Png),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Gif => "gif",
            Self::Jpeg => "jpeg",
            Self::Png => "png",
        }
    }

    /// The output format that produces this kind of file.
    pub fn output_format(self) -> OutputFormat {
        match self {
            Self::Gif => OutputFormat::Gif,
            Self::Jpeg => OutputFormat::Jpg,
            Self::Png => OutputFormat::Png,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_rejects_values_above_100() {
        assert_eq!(Quality::new(0).map(Quality::value), Some(0));
        assert_eq!(Quality::new(100).map(Quality::value), Some(100));
        assert_eq!(Quality::new(101), None);
    }

    #[test]
    fn quality_default_is_80() {
        assert_eq!(Quality::default().value(), 80);
    }

    #[test]
    fn output_format_table_lookups() {
        assert_eq!(OutputFormat::Jpg.content_type(), "image/jpeg");
        assert_eq!(OutputFormat::Png.extension(), "png");
        assert!(!OutputFormat::Gif.spec().uses_quality);
        assert_eq!(OutputFormat::Gif.spec().image_format, ImageFormat::Gif);
    }

    #[test]
    fn output_format_parse_only_accepts_canonical_names() {
        assert_eq!(OutputFormat::parse("gif"), Some(OutputFormat::Gif));
        assert_eq!(OutputFormat::parse("jpg"), Some(OutputFormat::Jpg));
        assert_eq!(OutputFormat::parse("png"), Some(OutputFormat::Png));
        assert_eq!(OutputFormat::parse("jpeg"), None);
        assert_eq!(OutputFormat::parse("PNG"), None);
        assert!("bmp".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn output_format_default_is_jpg() {
        assert_eq!(OutputFormat::default(), OutputFormat::Jpg);
    }

    #[test]
    fn source_format_rejects_other_formats() {
        assert_eq!(
            SourceFormat::from_image_format(ImageFormat::Png),
            Some(SourceFormat::Png)
        );
        assert_eq!(SourceFormat::from_image_format(ImageFormat::Bmp), None);
        assert_eq!(SourceFormat::Jpeg.output_format(), OutputFormat::Jpg);
    }

    #[test]
    fn dimensions_display() {
        assert_eq!(Dimensions::new(200, 150).to_string(), "200x150");
    }
}

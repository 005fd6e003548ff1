//! CLI output formatting.
//!
//! Every `format_*` function is pure and returns the lines to print, so the
//! exact output is unit testable. The `print_*` wrappers write them to stdout.
//!
//! # Output Format
//!
//! ## Thumbnail
//!
//! ```text
//! photos/pic.jpg
//!     Cache: miss (cache/pic_200x150.jpg)
//!     Generated: 200x150 jpg, 8412 bytes
//!     Cache: written cache/pic_200x150.jpg
//! Wrote thumbs/pic_200x150.jpg (image/jpeg)
//! ```
//!
//! ## Cache path
//!
//! ```text
//! cache/pic_200x150.jpg
//!     Status: fresh
//! ```

use crate::cache::CacheStats;
use crate::imaging::OutputFormat;
use crate::service::ThumbnailEvent;
use std::path::Path;

/// Indented context lines for one service event.
pub fn format_event(event: &ThumbnailEvent) -> Vec<String> {
    match event {
        ThumbnailEvent::CacheHit { cache_path, .. } => {
            vec![format!("    Cache: hit ({})", cache_path.display())]
        }
        ThumbnailEvent::CacheMiss { cache_path, .. } => {
            vec![format!("    Cache: miss ({})", cache_path.display())]
        }
        ThumbnailEvent::Generated {
            dimensions,
            format,
            bytes,
            resized,
            ..
        } => {
            let note = if *resized { "" } else { " (already at size)" };
            vec![format!(
                "    Generated: {dimensions} {format}, {bytes} bytes{note}"
            )]
        }
        ThumbnailEvent::CacheWritten { path } => {
            vec![format!("    Cache: written {}", path.display())]
        }
        ThumbnailEvent::CacheWriteFailed { path, error } => {
            vec![format!("    Cache: not written {} ({error})", path.display())]
        }
        ThumbnailEvent::WatermarkApplied { tiles } => {
            let noun = if *tiles == 1 { "tile" } else { "tiles" };
            vec![format!("    Watermark: {tiles} {noun}")]
        }
    }
}

/// Header line naming the source being processed.
pub fn format_source_header(source: &Path) -> Vec<String> {
    vec![source.display().to_string()]
}

/// Final line after a thumbnail has been written.
pub fn format_written(output: &Path, format: OutputFormat) -> Vec<String> {
    vec![format!(
        "Wrote {} ({})",
        output.display(),
        format.content_type()
    )]
}

/// Result of a `cache-path` query. `None` means caching is not active.
pub fn format_cache_path(path: Option<&Path>, fresh: bool) -> Vec<String> {
    match path {
        Some(path) => vec![
            path.display().to_string(),
            format!("    Status: {}", if fresh { "fresh" } else { "stale or missing" }),
        ],
        None => vec!["Caching is disabled (set a cache directory to enable it)".to_string()],
    }
}

/// Closing summary of a batch run.
pub fn format_batch_summary(stats: &CacheStats, failures: usize) -> Vec<String> {
    let mut lines = vec![format!("Thumbnails: {stats}")];
    if failures > 0 {
        lines.push(format!("Failed: {failures}"));
    }
    lines
}

fn print_lines(lines: Vec<String>) {
    for line in lines {
        println!("{line}");
    }
}

pub fn print_event(event: &ThumbnailEvent) {
    print_lines(format_event(event));
}

pub fn print_source_header(source: &Path) {
    print_lines(format_source_header(source));
}

pub fn print_written(output: &Path, format: OutputFormat) {
    print_lines(format_written(output, format));
}

pub fn print_cache_path(path: Option<&Path>, fresh: bool) {
    print_lines(format_cache_path(path, fresh));
}

pub fn print_batch_summary(stats: &CacheStats, failures: usize) {
    print_lines(format_batch_summary(stats, failures));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::Dimensions;
    use std::path::PathBuf;

    #[test]
    fn cache_events_show_path() {
        let event = ThumbnailEvent::CacheHit {
            source: PathBuf::from("photos/pic.jpg"),
            cache_path: PathBuf::from("cache/pic_200x150.jpg"),
        };
        assert_eq!(
            format_event(&event),
            vec!["    Cache: hit (cache/pic_200x150.jpg)"]
        );

        let event = ThumbnailEvent::CacheWritten {
            path: PathBuf::from("cache/pic_200x150.jpg"),
        };
        assert_eq!(
            format_event(&event),
            vec!["    Cache: written cache/pic_200x150.jpg"]
        );

        let event = ThumbnailEvent::CacheWriteFailed {
            path: PathBuf::from("cache/pic_200x150.jpg"),
            error: "Permission denied".into(),
        };
        assert_eq!(
            format_event(&event),
            vec!["    Cache: not written cache/pic_200x150.jpg (Permission denied)"]
        );
    }

    #[test]
    fn generated_event_shows_size_and_format() {
        let event = ThumbnailEvent::Generated {
            source: PathBuf::from("photos/pic.jpg"),
            dimensions: Dimensions::new(200, 150),
            format: OutputFormat::Png,
            bytes: 1234,
            resized: true,
        };
        assert_eq!(
            format_event(&event),
            vec!["    Generated: 200x150 png, 1234 bytes"]
        );
    }

    #[test]
    fn generated_event_notes_untouched_source() {
        let event = ThumbnailEvent::Generated {
            source: PathBuf::from("a.gif"),
            dimensions: Dimensions::new(20, 10),
            format: OutputFormat::Gif,
            bytes: 9,
            resized: false,
        };
        assert_eq!(
            format_event(&event),
            vec!["    Generated: 20x10 gif, 9 bytes (already at size)"]
        );
    }

    #[test]
    fn watermark_event_pluralizes() {
        assert_eq!(
            format_event(&ThumbnailEvent::WatermarkApplied { tiles: 1 }),
            vec!["    Watermark: 1 tile"]
        );
        assert_eq!(
            format_event(&ThumbnailEvent::WatermarkApplied { tiles: 36 }),
            vec!["    Watermark: 36 tiles"]
        );
    }

    #[test]
    fn written_line_has_content_type() {
        assert_eq!(
            format_written(Path::new("out/pic.jpg"), OutputFormat::Jpg),
            vec!["Wrote out/pic.jpg (image/jpeg)"]
        );
    }

    #[test]
    fn cache_path_states() {
        assert_eq!(
            format_cache_path(Some(Path::new("c/pic_1x1.png")), true),
            vec!["c/pic_1x1.png", "    Status: fresh"]
        );
        assert_eq!(format_cache_path(None, false).len(), 1);
    }

    #[test]
    fn batch_summary_lists_failures_only_when_present() {
        let mut stats = CacheStats::default();
        stats.miss();
        assert_eq!(
            format_batch_summary(&stats, 0),
            vec!["Thumbnails: 1 generated"]
        );
        assert_eq!(
            format_batch_summary(&stats, 2),
            vec!["Thumbnails: 1 generated", "Failed: 2"]
        );
    }
}

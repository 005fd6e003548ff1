//! Disk cache for generated thumbnails.
//!
//! Decoding and resampling a large source takes far longer than reading a
//! small file back, so the service can keep each encoded thumbnail on disk
//! and reuse it on the next request.
//!
//! # Design
//!
//! The cache is **path-addressed**: one file per (source stem, size, format),
//! named `<stem>_<width>x<height>.<ext>` inside the configured directory. The
//! file's existence and modification time are the whole cache state; there
//! is no manifest.
//!
//! ## Freshness
//!
//! Timestamps are compared in whole seconds.
//!
//! - **`duration == 0`**: fresh while the source has not been modified after
//!   the cache file (`source_mtime <= cache_mtime`).
//! - **`duration > 0`**: fresh until `cache_mtime + duration`, whatever
//!   happens to the source in the meantime.
//!
//! A missing source or cache file is never fresh.
//!
//! Two sources with the same stem in different directories share a cache
//! file. Writers overwrite in place; the last one wins.

use crate::imaging::{Dimensions, OutputFormat};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Maps a source image and request to its canonical cache file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheLocator {
    dir: PathBuf,
}

impl CacheLocator {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `<dir>/<source stem>_<width>x<height>.<ext>`
    pub fn path(&self, source: &Path, dimensions: Dimensions, format: OutputFormat) -> PathBuf {
        let mut name = source.file_stem().unwrap_or_default().to_os_string();
        name.push(format!("_{dimensions}.{}", format.extension()));
        self.dir.join(name)
    }
}

/// Seconds since the Unix epoch. Times before the epoch read as zero.
pub fn unix_seconds(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

/// Modification time of `path` in whole seconds.
pub fn modified_seconds(path: &Path) -> io::Result<u64> {
    Ok(unix_seconds(fs::metadata(path)?.modified()?))
}

/// Pure freshness rule, see the [module docs](self).
pub fn is_fresh(source_mtime: u64, cache_mtime: u64, now: u64, duration: u64) -> bool {
    if duration == 0 {
        source_mtime <= cache_mtime
    } else {
        now <= cache_mtime.saturating_add(duration)
    }
}

/// Whether `cache_file` may be served in place of regenerating from `source`.
pub fn is_cached(source: &Path, cache_file: &Path, duration: u64) -> bool {
    is_cached_at(source, cache_file, duration, unix_seconds(SystemTime::now()))
}

/// [`is_cached`] with an explicit clock.
pub fn is_cached_at(source: &Path, cache_file: &Path, duration: u64, now: u64) -> bool {
    let (Ok(source_mtime), Ok(cache_mtime)) =
        (modified_seconds(source), modified_seconds(cache_file))
    else {
        return false;
    };
    is_fresh(source_mtime, cache_mtime, now, duration)
}

/// Summary of cache performance for a batch run.
#[derive(Debug, Default)]
pub struct CacheStats {
    pub hits: u32,
    pub misses: u32,
}

impl CacheStats {
    pub fn hit(&mut self) {
        self.hits += 1;
    }

    pub fn miss(&mut self) {
        self.misses += 1;
    }

    pub fn total(&self) -> u32 {
        self.hits + self.misses
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hits > 0 {
            write!(
                f,
                "{} cached, {} generated ({} total)",
                self.hits,
                self.misses,
                self.total()
            )
        } else {
            write!(f, "{} generated", self.misses)
        }
    }
}

use clap::{Parser, Subcommand};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use thumbgen::cache::{CacheLocator, CacheStats};
use thumbgen::config::{self, AppConfig};
use thumbgen::imaging::{OutputFormat, RustCodec};
use thumbgen::service::{ThumbnailEvent, ThumbnailRequest, ThumbnailService};
use thumbgen::watermark::WatermarkCompositor;
use thumbgen::{output, scan};

/// Shared flags for commands that produce thumbnails. Each one overrides the
/// matching config file value.
#[derive(clap::Args, Clone)]
struct ThumbArgs {
    /// Thumbnail width in pixels
    #[arg(long)]
    width: Option<u32>,

    /// Thumbnail height in pixels
    #[arg(long)]
    height: Option<u32>,

    /// Output format (gif, jpg, png)
    #[arg(long)]
    format: Option<OutputFormat>,

    /// Encoding quality, 0-100
    #[arg(long)]
    quality: Option<u32>,

    /// Cache thumbnails in this existing directory
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Seconds a cached thumbnail stays valid (0 = until the source changes)
    #[arg(long)]
    cache_duration: Option<u64>,

    /// PNG watermark to composite onto every thumbnail
    #[arg(long)]
    watermark: Option<PathBuf>,

    /// Watermark opacity, 0-100 (needs a watermark from --watermark or the config)
    #[arg(long)]
    watermark_opacity: Option<u32>,
}

#[derive(Parser)]
#[command(name = "thumbgen")]
#[command(about = "Fixed-size thumbnails with disk caching and tiled watermarks")]
#[command(long_about = "\
Fixed-size thumbnails with disk caching and tiled watermarks

Sources (GIF, JPEG, PNG) are scaled to cover the requested size and the
overflow is cropped equally from both sides, so every thumbnail has exactly
the requested dimensions.

Settings come from thumbgen.toml when present; command line flags override
the file. Cached thumbnails are named <stem>_<width>x<height>.<format>.

Run 'thumbgen gen-config' to generate a documented thumbgen.toml.")]
#[command(version)]
struct Cli {
    /// Config file (optional; stock defaults apply when missing)
    #[arg(long, default_value = config::CONFIG_FILENAME, global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create one thumbnail
    Thumbnail {
        /// Source image
        source: PathBuf,
        /// File to write the thumbnail to
        #[arg(long, short)]
        output: PathBuf,
        #[command(flatten)]
        args: ThumbArgs,
    },
    /// Create thumbnails for every image under a directory
    Batch {
        /// Directory to search for gif/jpg/jpeg/png files
        dir: PathBuf,
        /// Directory the thumbnails are written to
        #[arg(long)]
        output_dir: PathBuf,
        #[command(flatten)]
        args: ThumbArgs,
    },
    /// Print the cache file a source maps to and whether it is fresh
    CachePath {
        /// Source image
        source: PathBuf,
        #[command(flatten)]
        args: ThumbArgs,
    },
    /// Print a stock thumbgen.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Thumbnail {
            source,
            output: target,
            args,
        } => {
            let (tx, rx) = mpsc::channel();
            let mut service = build_service(&cli.config, &args)?.with_events(tx);

            output::print_source_header(&source);
            let result = service.get_thumbnail(&source, &ThumbnailRequest::new());
            drain_events(&rx);
            let format = result?.format;

            let mut writer = BufWriter::new(File::create(&target)?);
            service.output_thumbnail(&mut writer)?;
            writer.flush()?;
            output::print_written(&target, format);
        }
        Command::Batch {
            dir,
            output_dir,
            args,
        } => {
            let sources = scan::find_source_images(&dir)?;
            fs::create_dir_all(&output_dir)?;

            let (tx, rx) = mpsc::channel();
            let mut service = build_service(&cli.config, &args)?.with_events(tx);
            let request = ThumbnailRequest::new();
            let resolved = service.resolve(&request);
            let targets = CacheLocator::new(&output_dir);

            let mut stats = CacheStats::default();
            let mut failures = 0;
            for source in &sources {
                output::print_source_header(source);
                let result = service
                    .get_thumbnail(source, &request)
                    .map(|data| data.bytes.clone());
                for event in drain_events(&rx) {
                    match event {
                        ThumbnailEvent::CacheHit { .. } => stats.hit(),
                        ThumbnailEvent::Generated { .. } => stats.miss(),
                        _ => {}
                    }
                }

                match result {
                    Ok(bytes) => {
                        let target = targets.path(source, resolved.dimensions, resolved.format);
                        fs::write(&target, bytes)?;
                        output::print_written(&target, resolved.format);
                    }
                    Err(e) => {
                        eprintln!("    Error: {e}");
                        failures += 1;
                    }
                }
            }
            output::print_batch_summary(&stats, failures);
        }
        Command::CachePath { source, args } => {
            let service = build_service(&cli.config, &args)?;
            let request = ThumbnailRequest::new();
            let path = service.cache_path(&source, &request);
            let fresh = service.is_cached(&source, &request);
            output::print_cache_path(path.as_deref(), fresh);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Load the config file, apply flag overrides, and build the service.
fn build_service(
    config_path: &Path,
    args: &ThumbArgs,
) -> Result<ThumbnailService<RustCodec>, Box<dyn std::error::Error>> {
    let AppConfig {
        mut thumbnail,
        watermark,
    } = config::load_config(config_path)?;

    if let Some(width) = args.width {
        thumbnail.width = width;
    }
    if let Some(height) = args.height {
        thumbnail.height = height;
    }
    if let Some(format) = args.format {
        thumbnail.format = format;
    }
    if let Some(dir) = &args.cache_dir {
        thumbnail.cache.enabled = true;
        thumbnail.cache.directory = Some(dir.clone());
    }
    if let Some(duration) = args.cache_duration {
        thumbnail.cache.duration = duration;
    }

    let mut service = ThumbnailService::with_config(thumbnail)?;
    if let Some(quality) = args.quality {
        service.set_quality(quality)?;
    }

    let watermark = config::override_watermark(
        watermark,
        args.watermark.as_deref(),
        args.watermark_opacity,
    )?;
    if let Some(watermark) = watermark {
        service.set_watermark(Some(WatermarkCompositor::load(&RustCodec, watermark)?));
    }

    Ok(service)
}

/// Print and return every event queued since the last call.
fn drain_events(rx: &Receiver<ThumbnailEvent>) -> Vec<ThumbnailEvent> {
    let events: Vec<ThumbnailEvent> = rx.try_iter().collect();
    for event in &events {
        output::print_event(event);
    }
    events
}

//! maxdisk: pack maximal inscribed disks into mask images and trace spines.
//!
//! Each `<MASK>` argument is one plane of a stack. Every plane is packed
//! with the same region and parameters; results can be written as JSON,
//! SVG, a raster overlay and a CSV results table.
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin maxdisk -- [OPTIONS] <MASK>...
//! ```
//!
//! Logging goes through `tracing`; set `RUST_LOG=debug` to see the
//! per-iteration packing log.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use maxdisk_export::SvgMetadata;
use maxdisk_pipeline::{
    Mask, PackConfig, PipelineConfig, PipelineError, Point, ProcessResult, Region, SpineConfig,
    SpineOutcome,
};

/// Pack maximal inscribed disks into binary masks and trace a spine
/// through them.
#[derive(Parser)]
#[command(name = "maxdisk", version)]
struct Cli {
    /// Mask images (PNG, JPEG, BMP, WebP), one per plane.
    #[arg(required = true)]
    masks: Vec<PathBuf>,

    /// Minimum disk diameter in pixels; 0 keeps only the largest disk.
    #[arg(long, default_value_t = PackConfig::DEFAULT_MIN_DIAMETER, allow_negative_numbers = true)]
    min_diameter: f64,

    /// Pack into the region's own shape instead of the mask.
    #[arg(long, requires = "region")]
    selection_only: bool,

    /// Rectangular region as `X,Y,W,H`.
    #[arg(long, group = "region", value_parser = parse_rect)]
    rect: Option<Region>,

    /// Polygonal region as space-separated `X,Y` vertices.
    #[arg(long, group = "region", value_parser = parse_polygon)]
    polygon: Option<Region>,

    /// Trace a spine through the packed disks.
    #[arg(long)]
    spine: bool,

    /// Extra gap in pixels allowed between adjacent disks.
    #[arg(long, default_value_t = SpineConfig::DEFAULT_CLOSENESS_TOLERANCE)]
    closeness_tolerance: f64,

    /// Cosine similarity a spine step must exceed (-1 to 1).
    #[arg(long, default_value_t = SpineConfig::DEFAULT_MIN_SIMILARITY, allow_negative_numbers = true)]
    min_similarity: f64,

    /// Append `-P_<plane>` to disk and spine names.
    #[arg(long)]
    append_position: bool,

    /// Treat dark pixels as foreground.
    #[arg(long)]
    invert: bool,

    /// Full pipeline config as a JSON string.
    ///
    /// When provided, the packing and spine flags are ignored. The JSON
    /// must be a valid `PipelineConfig` serialization.
    #[arg(long)]
    config_json: Option<String>,

    /// Write all results as JSON.
    #[arg(long)]
    json: Option<PathBuf>,

    /// Write an SVG drawing (one file per plane for stacks).
    #[arg(long)]
    svg: Option<PathBuf>,

    /// Write a raster overlay image (one file per plane for stacks).
    #[arg(long)]
    overlay: Option<PathBuf>,

    /// Write a CSV results table.
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Print per-stage timing and packing diagnostics.
    #[arg(long)]
    diagnostics: bool,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("error reading {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("error writing {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("error decoding {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        source: PipelineError,
    },

    #[error("error writing overlay {}: {source}", path.display())]
    Overlay {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error(transparent)]
    Config(#[from] PipelineError),

    #[error("error parsing --config-json: {0}")]
    ConfigJson(serde_json::Error),

    #[error("error serializing results: {0}")]
    Serialize(serde_json::Error),
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), CliError> {
    let config = config_from_cli(cli)?;
    let region = cli.rect.as_ref().or(cli.polygon.as_ref());

    let planes = cli
        .masks
        .iter()
        .map(|path| read_mask(path, cli.invert))
        .collect::<Result<Vec<_>, _>>()?;

    let results: Vec<ProcessResult> = if cli.diagnostics {
        let count = planes.len();
        planes
            .iter()
            .enumerate()
            .map(|(i, plane)| {
                tracing::info!("processing slice {} of {count}", i + 1);
                let (mut result, diagnostics) =
                    maxdisk_pipeline::process_with_diagnostics(plane, region, &config);
                println!("{}", diagnostics.report());
                result.stamp_slice(i + 1, config.append_position_to_name);
                result
            })
            .collect()
    } else {
        maxdisk_pipeline::process_stack(&planes, region, &config)
    };

    for (path, result) in cli.masks.iter().zip(&results) {
        eprintln!("{}: {}", path.display(), summarize(result));
    }

    write_outputs(cli, &config, &planes, &results)
}

/// Build a [`PipelineConfig`] from CLI arguments.
///
/// `--config-json` wins over the individual flags.
fn config_from_cli(cli: &Cli) -> Result<PipelineConfig, CliError> {
    if let Some(ref json) = cli.config_json {
        return serde_json::from_str(json).map_err(CliError::ConfigJson);
    }

    let spine = if cli.spine {
        Some(SpineConfig::try_new(
            cli.closeness_tolerance,
            cli.min_similarity,
        )?)
    } else {
        None
    };

    Ok(PipelineConfig {
        pack: PackConfig::try_new(cli.min_diameter, cli.selection_only)?,
        spine,
        append_position_to_name: cli.append_position,
    })
}

fn read_mask(path: &Path, invert: bool) -> Result<Mask, CliError> {
    let bytes = std::fs::read(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let mask = Mask::decode(&bytes, invert).map_err(|source| CliError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(
        path = %path.display(),
        width = mask.width(),
        height = mask.height(),
        "mask loaded"
    );
    Ok(mask)
}

fn summarize(result: &ProcessResult) -> String {
    let spine = match &result.spine {
        SpineOutcome::NotRequested => String::new(),
        SpineOutcome::Traced(spine) => format!(
            ", spine {} points, length {:.3}",
            spine.polyline.len(),
            spine.length()
        ),
        SpineOutcome::Failed(e) => format!(", no spine: {e}"),
    };
    format!("{} disks{spine}", result.disks.len())
}

fn write_outputs(
    cli: &Cli,
    config: &PipelineConfig,
    planes: &[Mask],
    results: &[ProcessResult],
) -> Result<(), CliError> {
    let count = results.len();

    if let Some(ref path) = cli.json {
        let json = serde_json::to_string_pretty(results).map_err(CliError::Serialize)?;
        write_file(path, &json)?;
    }

    if let Some(ref path) = cli.csv {
        write_file(path, &maxdisk_export::to_csv(results))?;
    }

    if let Some(ref svg_path) = cli.svg {
        let desc = format!("{config:?}");
        for (i, (mask_path, result)) in cli.masks.iter().zip(results).enumerate() {
            let title = mask_path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("maxdisk");
            let metadata = SvgMetadata {
                title: Some(title),
                description: Some(&desc),
            };
            let svg = maxdisk_export::to_svg(result, &metadata);
            write_file(&plane_path(svg_path, i + 1, count), &svg)?;
        }
    }

    if let Some(ref overlay_path) = cli.overlay {
        for (i, (plane, result)) in planes.iter().zip(results).enumerate() {
            let path = plane_path(overlay_path, i + 1, count);
            maxdisk_export::render_overlay(plane, result)
                .save(&path)
                .map_err(|source| CliError::Overlay {
                    path: path.clone(),
                    source,
                })?;
            eprintln!("Overlay written to {}", path.display());
        }
    }

    Ok(())
}

fn write_file(path: &Path, contents: &str) -> Result<(), CliError> {
    std::fs::write(path, contents).map_err(|source| CliError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    eprintln!("Written to {} ({} bytes)", path.display(), contents.len());
    Ok(())
}

/// Per-plane output path: `out.svg` becomes `out-P_2.svg` for plane 2
/// of a multi-plane stack. Single planes keep the path unchanged.
fn plane_path(path: &Path, index: usize, count: usize) -> PathBuf {
    if count <= 1 {
        return path.to_path_buf();
    }
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{stem}-P_{index}.{}", ext.to_string_lossy()),
        None => format!("{stem}-P_{index}"),
    };
    path.with_file_name(name)
}

/// Parse `X,Y,W,H` into a rectangle region.
fn parse_rect(s: &str) -> Result<Region, String> {
    let fields = s
        .split(',')
        .map(|f| f.trim().parse::<u32>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| format!("invalid rectangle {s:?}: {e}"))?;
    let [x, y, width, height] = fields[..] else {
        return Err(format!("rectangle needs 4 values X,Y,W,H, got {s:?}"));
    };
    Ok(Region::Rectangle {
        x,
        y,
        width,
        height,
    })
}

/// Parse space-separated `X,Y` pairs into a polygon region.
fn parse_polygon(s: &str) -> Result<Region, String> {
    let vertices = s
        .split_whitespace()
        .map(|pair| {
            let (x, y) = pair
                .split_once(',')
                .ok_or_else(|| format!("vertex {pair:?} is not X,Y"))?;
            let x = x.parse::<f64>().map_err(|e| format!("vertex {pair:?}: {e}"))?;
            let y = y.parse::<f64>().map_err(|e| format!("vertex {pair:?}: {e}"))?;
            Ok(Point::new(x, y))
        })
        .collect::<Result<Vec<_>, String>>()?;
    if vertices.len() < 3 {
        return Err(format!(
            "polygon needs at least 3 vertices, got {}",
            vertices.len()
        ));
    }
    Ok(Region::Polygon(vertices))
}

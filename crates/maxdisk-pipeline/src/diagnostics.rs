//! Pipeline diagnostics: timing, counts, and other metrics for each stage.
//!
//! [`process_with_diagnostics`] runs the same stages as
//! [`process`](crate::process) and records how long each took and what it
//! produced. Intended for threshold tuning: the per-iteration packing
//! metrics show where small disks start to dominate the run time.
//!
//! Durations are serialized as fractional seconds (`f64`) for JSON
//! compatibility, since `std::time::Duration` does not implement serde
//! traits.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::mask::Mask;
use crate::pack::{self, PackIteration};
use crate::region::Region;
use crate::types::{PipelineConfig, ProcessResult, SpineOutcome};

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a `Duration` as fractional seconds (`f64`).
    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    /// Deserialize a `Duration` from fractional seconds (`f64`).
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "duration seconds must be finite, non-negative, and representable as a Duration",
            )
        })
    }
}

/// Diagnostics collected from a single [`process_with_diagnostics`] run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineDiagnostics {
    /// Stage 1: effective mask and supersampled working raster.
    pub preparation: StageDiagnostics,
    /// Stage 2: iterative disk packing.
    pub packing: StageDiagnostics,
    /// Stage 3: spine tracing (only when a spine was requested).
    pub spine: Option<StageDiagnostics>,
    /// Total wall-clock duration of the run (seconds).
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
    /// Summary counts across all stages.
    pub summary: PipelineSummary,
}

/// Diagnostics for a single pipeline stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageDiagnostics {
    /// Wall-clock duration of this stage (seconds).
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    /// Stage-specific metrics.
    pub metrics: StageMetrics,
}

/// Stage-specific metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StageMetrics {
    /// Working raster preparation.
    Preparation {
        /// Working raster width in pixels.
        working_width: u32,
        /// Working raster height in pixels.
        working_height: u32,
        /// Foreground pixels in the working raster before packing.
        foreground_pixels: usize,
        /// Whether a region restricted the working raster.
        region: bool,
    },
    /// Disk packing.
    Packing {
        /// Number of distance-map iterations.
        iteration_count: usize,
        /// Disks accepted across all iterations.
        disk_count: usize,
        /// Largest accepted radius in source pixels.
        max_radius: f64,
        /// Smallest accepted radius in source pixels.
        min_radius: f64,
        /// Per-iteration breakdown.
        iterations: Vec<IterationMetrics>,
    },
    /// Spine tracing.
    Spine {
        /// Spine vertices (0 when tracing failed).
        point_count: usize,
        /// Visualisation parts (0 when tracing failed).
        part_count: usize,
        /// Spine length in source pixels.
        length: f64,
        /// Failure message when no spine could be traced.
        failure: Option<String>,
    },
}

/// Metrics for one packing iteration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct IterationMetrics {
    /// Maxima found in the distance map.
    pub maxima: usize,
    /// Maxima above the size threshold.
    pub candidates: usize,
    /// Top-tier radius in source pixels.
    pub tier_radius: f64,
    /// Tier members at that radius.
    pub tier_size: usize,
    /// Disks accepted.
    pub accepted: usize,
}

/// High-level summary counts for the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSummary {
    /// Source mask width in pixels.
    pub image_width: u32,
    /// Source mask height in pixels.
    pub image_height: u32,
    /// Foreground pixels in the source mask.
    pub foreground_pixels: usize,
    /// Disks found.
    pub disk_count: usize,
    /// Spine vertices, when a spine was traced.
    pub spine_point_count: Option<usize>,
}

/// Run [`process`](crate::process) on one plane, collecting diagnostics.
#[must_use]
pub fn process_with_diagnostics(
    mask: &Mask,
    region: Option<&Region>,
    config: &PipelineConfig,
) -> (ProcessResult, PipelineDiagnostics) {
    let total_start = Instant::now();

    let start = Instant::now();
    let prepared = pack::working_mask(mask, region, config.pack.selection_only());
    let (working_width, working_height, working_foreground) = prepared
        .as_ref()
        .map_or((0, 0, 0), |(w, _)| (w.width(), w.height(), w.foreground_count()));
    let preparation = StageDiagnostics {
        duration: start.elapsed(),
        metrics: StageMetrics::Preparation {
            working_width,
            working_height,
            foreground_pixels: working_foreground,
            region: region.is_some(),
        },
    };

    let start = Instant::now();
    let (disks, iterations) = match prepared {
        Some((mut working, frame)) => {
            pack::pack_working_with_stats(&mut working, &frame, config.pack.min_diameter())
        }
        None => (Vec::new(), Vec::new()),
    };
    crate::note_empty_packing(&disks);
    let scale = f64::from(pack::SUPERSAMPLE);
    let packing = StageDiagnostics {
        duration: start.elapsed(),
        metrics: StageMetrics::Packing {
            iteration_count: iterations.len(),
            disk_count: disks.len(),
            max_radius: disks.iter().map(|d| d.radius).fold(0.0, f64::max),
            min_radius: disks.iter().map(|d| d.radius).reduce(f64::min).unwrap_or(0.0),
            iterations: iterations
                .iter()
                .map(|it| iteration_metrics(it, scale))
                .collect(),
        },
    };

    let start = Instant::now();
    let spine = if config.spine.is_some() {
        let effective = pack::effective_mask(mask, region, config.pack.selection_only());
        crate::trace_spine(&disks, &effective, config.spine.as_ref())
    } else {
        SpineOutcome::NotRequested
    };
    let spine_stage = match &spine {
        SpineOutcome::NotRequested => None,
        SpineOutcome::Traced(s) => Some(StageMetrics::Spine {
            point_count: s.polyline.len(),
            part_count: s.parts.len(),
            length: s.length(),
            failure: None,
        }),
        SpineOutcome::Failed(e) => Some(StageMetrics::Spine {
            point_count: 0,
            part_count: 0,
            length: 0.0,
            failure: Some(e.to_string()),
        }),
    }
    .map(|metrics| StageDiagnostics {
        duration: start.elapsed(),
        metrics,
    });

    let summary = PipelineSummary {
        image_width: mask.width(),
        image_height: mask.height(),
        foreground_pixels: mask.foreground_count(),
        disk_count: disks.len(),
        spine_point_count: spine.spine().map(|s| s.polyline.len()),
    };

    let result = ProcessResult {
        disks,
        spine,
        dimensions: mask.dimensions(),
        slice: None,
    };
    let diagnostics = PipelineDiagnostics {
        preparation,
        packing,
        spine: spine_stage,
        total_duration: total_start.elapsed(),
        summary,
    };
    (result, diagnostics)
}

fn iteration_metrics(it: &PackIteration, scale: f64) -> IterationMetrics {
    IterationMetrics {
        maxima: it.maxima,
        candidates: it.candidates,
        tier_radius: it.tier_value / scale,
        tier_size: it.tier_size,
        accepted: it.accepted,
    }
}

impl PipelineDiagnostics {
    /// Format diagnostics as a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Pipeline Diagnostics Report\n{}", "=".repeat(60)));
        lines.push(format!(
            "Mask: {}x{} ({} foreground pixels)",
            self.summary.image_width, self.summary.image_height, self.summary.foreground_pixels,
        ));
        lines.push(format!(
            "Total duration: {:.3}ms",
            duration_ms(self.total_duration),
        ));
        lines.push(String::new());

        lines.push(format!(
            "{:<16} {:>10} {:>10}  {}",
            "Stage", "Duration", "% Total", "Details"
        ));
        lines.push("-".repeat(72));

        let total_ms = duration_ms(self.total_duration);
        let mut stages = vec![("Preparation", &self.preparation), ("Packing", &self.packing)];
        if let Some(ref spine) = self.spine {
            stages.push(("Spine", spine));
        }

        for (name, diag) in &stages {
            let ms = duration_ms(diag.duration);
            let pct = if total_ms > 0.0 {
                ms / total_ms * 100.0
            } else {
                0.0
            };
            let details = format_metrics(&diag.metrics);
            lines.push(format!("{name:<16} {ms:>8.3}ms {pct:>9.1}%  {details}"));
        }

        if let StageMetrics::Packing { iterations, .. } = &self.packing.metrics {
            if !iterations.is_empty() {
                lines.push(String::new());
                lines.push(format!(
                    "{:>5} {:>8} {:>10} {:>10} {:>6} {:>9}",
                    "Iter", "Maxima", "Candidates", "Radius", "Tier", "Accepted"
                ));
                for (i, it) in iterations.iter().enumerate() {
                    lines.push(format!(
                        "{i:>5} {:>8} {:>10} {:>10.3} {:>6} {:>9}",
                        it.maxima, it.candidates, it.tier_radius, it.tier_size, it.accepted,
                    ));
                }
            }
        }

        lines.push(String::new());
        let spine = self
            .summary
            .spine_point_count
            .map_or_else(|| "none".to_string(), |n| format!("{n} points"));
        lines.push(format!(
            "Disks: {}  |  Spine: {spine}",
            self.summary.disk_count,
        ));

        lines.join("\n")
    }
}

/// Convert a `Duration` to milliseconds as `f64`.
fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

/// Format stage metrics into a compact detail string.
fn format_metrics(metrics: &StageMetrics) -> String {
    match metrics {
        StageMetrics::Preparation {
            working_width,
            working_height,
            foreground_pixels,
            region,
        } => {
            let scope = if *region { "region" } else { "full mask" };
            format!("{scope} -> {working_width}x{working_height}, {foreground_pixels} fg px")
        }
        StageMetrics::Packing {
            iteration_count,
            disk_count,
            max_radius,
            min_radius,
            ..
        } => format!(
            "{disk_count} disks in {iteration_count} iterations (r {min_radius:.2}..{max_radius:.2})",
        ),
        StageMetrics::Spine {
            point_count,
            part_count,
            length,
            failure,
        } => failure.as_ref().map_or_else(
            || format!("{point_count} pts, {part_count} parts, length={length:.2}"),
            |msg| format!("failed: {msg}"),
        ),
    }
}

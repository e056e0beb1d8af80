//! maxdisk-pipeline: maximal inscribed disk packing and spine tracing (sans-IO).
//!
//! Turns a binary mask into geometry through:
//! working raster (region crop, ×2 supersampling) -> iterated distance
//! transform + tiered non-maximum suppression -> disks -> optional
//! greedy spine walk through adjacent disks.
//!
//! This crate has **no I/O dependencies** -- it operates on in-memory
//! rasters and returns structured data. File handling lives in the CLI.

pub mod diagnostics;
pub mod distance;
pub mod geometry;
pub mod mask;
pub mod maxima;
pub mod pack;
pub mod region;
pub mod spine;
pub mod types;

pub use diagnostics::{PipelineDiagnostics, process_with_diagnostics};
pub use mask::Mask;
pub use region::Region;
pub use types::{
    Dimensions, Disk, PackConfig, PipelineConfig, PipelineError, Point, Polyline, ProcessResult,
    Spine, SpineConfig, SpineError, SpineOutcome, SpinePart, SpinePartKind,
};

/// Log a hint when packing found nothing. Returns whether it fired.
pub(crate) fn note_empty_packing(disks: &[Disk]) -> bool {
    if disks.is_empty() {
        tracing::info!("no circles found, consider decreasing the minimum circle diameter");
    }
    disks.is_empty()
}

/// Process one mask plane: pack disks, then optionally trace a spine.
///
/// The spine is traced on the effective mask (the mask as restricted or
/// replaced by `region`), the same raster the disks were packed into.
/// Empty masks and zero-area regions yield an empty disk list; a spine
/// that cannot be traced is reported through [`SpineOutcome::Failed`].
///
/// # Pipeline steps
///
/// 1. Build the effective mask and the supersampled working raster
/// 2. Iteratively pack disks (largest first)
/// 3. Trace the spine when `config.spine` is set
#[must_use]
pub fn process(mask: &Mask, region: Option<&Region>, config: &PipelineConfig) -> ProcessResult {
    let disks = pack::pack(mask, region, &config.pack);
    note_empty_packing(&disks);

    let spine = if config.spine.is_some() {
        let effective = pack::effective_mask(mask, region, config.pack.selection_only());
        trace_spine(&disks, &effective, config.spine.as_ref())
    } else {
        SpineOutcome::NotRequested
    };

    ProcessResult {
        disks,
        spine,
        dimensions: mask.dimensions(),
        slice: None,
    }
}

/// Process every plane of a stack with the same region and configuration.
///
/// Each result, and every disk, spine and spine part in it, is stamped
/// with the 1-based plane index. With
/// [`append_position_to_name`](PipelineConfig::append_position_to_name)
/// set, `-P_<index>` is appended to every name as well.
#[must_use]
pub fn process_stack(
    planes: &[Mask],
    region: Option<&Region>,
    config: &PipelineConfig,
) -> Vec<ProcessResult> {
    let count = planes.len();
    planes
        .iter()
        .enumerate()
        .map(|(i, plane)| {
            let index = i + 1;
            tracing::info!("processing slice {index} of {count}");
            let mut result = process(plane, region, config);
            result.stamp_slice(index, config.append_position_to_name);
            result
        })
        .collect()
}

/// Trace the spine if requested, logging why it failed otherwise.
pub(crate) fn trace_spine(
    disks: &[Disk],
    mask: &Mask,
    config: Option<&SpineConfig>,
) -> SpineOutcome {
    let Some(config) = config else {
        return SpineOutcome::NotRequested;
    };
    match spine::trace(disks, mask, config) {
        Ok(spine) => {
            tracing::info!(
                points = spine.polyline.len(),
                length = spine.length(),
                "spine traced"
            );
            SpineOutcome::Traced(spine)
        }
        Err(e) => {
            tracing::warn!("no spine found: {e}");
            SpineOutcome::Failed(e)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn bar_mask(width: u32, height: u32) -> Mask {
        Mask::from_fn(width, height, |x, y| {
            (10..width - 10).contains(&x) && (5..height - 5).contains(&y)
        })
    }

    fn spine_config() -> PipelineConfig {
        PipelineConfig {
            pack: PackConfig::try_new(6.0, false).unwrap(),
            spine: Some(SpineConfig::default()),
            append_position_to_name: false,
        }
    }

    #[test]
    fn process_empty_mask() {
        let result = process(&Mask::new(20, 20), None, &spine_config());
        assert!(result.disks.is_empty());
        assert_eq!(result.spine, SpineOutcome::Failed(SpineError::NoDisks));
        assert_eq!(
            result.dimensions,
            Dimensions {
                width: 20,
                height: 20
            }
        );
    }

    #[test]
    fn process_without_spine_request() {
        let result = process(&bar_mask(100, 24), None, &PipelineConfig::default());
        assert!(!result.disks.is_empty());
        assert_eq!(result.spine, SpineOutcome::NotRequested);
        assert!(result.slice.is_none());
    }

    #[test]
    fn process_bar_traces_spine() {
        let result = process(&bar_mask(120, 24), None, &spine_config());
        assert!(result.disks.len() >= 2);
        let spine = result.spine.spine().unwrap();
        assert!(spine.polyline.len() >= 4);
        assert!((spine.width - result.disks[0].diameter()).abs() < f64::EPSILON);
    }

    #[test]
    fn stack_stamps_slices_without_renaming() {
        let planes = [bar_mask(120, 24), Mask::new(120, 24), bar_mask(120, 24)];
        let results = process_stack(&planes, None, &spine_config());
        assert_eq!(results.len(), 3);
        assert_eq!(results[1].slice, Some(2));
        assert!(results[1].disks.is_empty());

        let third = &results[2];
        assert_eq!(third.slice, Some(3));
        assert!(third.disks.iter().all(|d| d.slice == Some(3)));
        assert!(
            third
                .disks
                .iter()
                .all(|d| d.name.as_deref().is_some_and(|n| n.starts_with("Circle-r_") && !n.contains("-P_")))
        );
        let spine = third.spine.spine().unwrap();
        assert_eq!(spine.slice, Some(3));
        assert_eq!(spine.name, "Spine");
    }

    #[test]
    fn stack_appends_position_to_names() {
        let config = PipelineConfig {
            append_position_to_name: true,
            ..spine_config()
        };
        let planes = [bar_mask(120, 24), bar_mask(120, 24)];
        let results = process_stack(&planes, None, &config);
        let second = &results[1];
        assert!(
            second
                .disks
                .iter()
                .all(|d| d.name.as_deref().is_some_and(|n| n.ends_with("-P_2")))
        );
        let spine = second.spine.spine().unwrap();
        assert_eq!(spine.name, "Spine-P_2");
        assert!(spine.parts.iter().all(|p| p.name == "SpinePart-P_2" && p.slice == Some(2)));

        // Same geometry on every plane.
        assert_eq!(results[0].disks.len(), second.disks.len());
    }

    #[test]
    fn process_is_deterministic() {
        let mask = bar_mask(150, 30);
        let a = process(&mask, None, &spine_config());
        let b = process(&mask, None, &spine_config());
        assert_eq!(a, b);
    }
}

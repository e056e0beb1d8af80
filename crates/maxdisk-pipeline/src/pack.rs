//! Maximal inscribed disk packing.
//!
//! The packer supersamples the working raster ×2, then repeatedly:
//! computes the distance map, finds its tolerance-filtered maxima, keeps
//! only the top-value tier above the size threshold, accepts every tier
//! member not dominated by a strictly larger overlapping one, and carves
//! the accepted disks out of the raster. Processing only the top tier per
//! iteration fixes the discovery order: disks come out largest first and
//! smaller candidates are re-evaluated against the carved raster.

use crate::distance::DistanceMap;
use crate::mask::Mask;
use crate::maxima::{self, Maximum};
use crate::region::Region;
use crate::types::{Disk, PackConfig, Point};

/// Supersampling factor applied to the working raster.
pub const SUPERSAMPLE: u32 = 2;

/// Background border, in working pixels, added around a region crop.
pub const PADDING: u32 = 2;

/// Affine map from working-raster pixels back to source-mask pixels:
/// `source = working / scale + offset`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorkingFrame {
    /// Working pixels per source pixel.
    pub scale: f64,
    /// Source position of working pixel `(0, 0)`.
    pub offset: Point,
}

impl WorkingFrame {
    /// Frame for an unpadded, uncropped working raster.
    #[must_use]
    pub fn identity_scaled() -> Self {
        Self {
            scale: f64::from(SUPERSAMPLE),
            offset: Point::new(0.0, 0.0),
        }
    }

    /// Map a working-raster position to the source mask.
    #[must_use]
    pub fn to_source(&self, p: Point) -> Point {
        Point::new(p.x / self.scale + self.offset.x, p.y / self.scale + self.offset.y)
    }

    /// Map a working-raster length to the source mask.
    #[must_use]
    pub fn length_to_source(&self, length: f64) -> f64 {
        length / self.scale
    }
}

/// Statistics for one packing iteration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PackIteration {
    /// Maxima found in the distance map.
    pub maxima: usize,
    /// Maxima above the size threshold.
    pub candidates: usize,
    /// Distance value of the top tier, in working pixels.
    pub tier_value: f64,
    /// Tier members kept at that value.
    pub tier_size: usize,
    /// Disks accepted this iteration.
    pub accepted: usize,
}

/// The full-size mask the packer actually works on.
///
/// Without a region this is `mask` itself. With a region it is the
/// region's own shape when `selection_only` is set, otherwise the mask
/// restricted to the region.
#[must_use]
pub fn effective_mask(mask: &Mask, region: Option<&Region>, selection_only: bool) -> Mask {
    match region {
        None => mask.clone(),
        Some(region) => {
            let shape = region.to_mask(mask.dimensions());
            if selection_only {
                shape
            } else {
                mask.intersect(&shape)
            }
        }
    }
}

/// Build the supersampled working raster and its frame.
///
/// Returns `None` when the region has zero area inside the mask.
#[must_use]
pub fn working_mask(
    mask: &Mask,
    region: Option<&Region>,
    selection_only: bool,
) -> Option<(Mask, WorkingFrame)> {
    let effective = effective_mask(mask, region, selection_only);
    let Some(region) = region else {
        return Some((effective.upsample(SUPERSAMPLE), WorkingFrame::identity_scaled()));
    };

    let bounds = region.bounds(mask.dimensions())?;
    let working = effective
        .crop(bounds.x, bounds.y, bounds.width, bounds.height)
        .upsample(SUPERSAMPLE)
        .pad(PADDING);
    let scale = f64::from(SUPERSAMPLE);
    // The padding is exactly one source pixel, hence the bounds origin minus one.
    let shift = f64::from(PADDING) / scale;
    let frame = WorkingFrame {
        scale,
        offset: Point::new(f64::from(bounds.x) - shift, f64::from(bounds.y) - shift),
    };
    Some((working, frame))
}

/// Pack maximal inscribed disks into `mask`.
///
/// Disks are returned in discovery order (non-increasing radius) with
/// centres and radii in source pixels. An empty mask or a zero-area
/// region yields an empty result.
#[must_use]
pub fn pack(mask: &Mask, region: Option<&Region>, config: &PackConfig) -> Vec<Disk> {
    pack_with_stats(mask, region, config).0
}

/// [`pack`], also returning per-iteration statistics.
#[must_use]
pub fn pack_with_stats(
    mask: &Mask,
    region: Option<&Region>,
    config: &PackConfig,
) -> (Vec<Disk>, Vec<PackIteration>) {
    let Some((mut working, frame)) = working_mask(mask, region, config.selection_only()) else {
        tracing::debug!("region has zero area inside the mask");
        return (Vec::new(), Vec::new());
    };
    pack_working_with_stats(&mut working, &frame, config.min_diameter())
}

/// Run the packing loop on an already prepared working raster.
///
/// `working` is carved in place: on return, every accepted disk has been
/// cleared to background.
#[must_use]
pub fn pack_working(working: &mut Mask, frame: &WorkingFrame, min_diameter: f64) -> Vec<Disk> {
    pack_working_with_stats(working, frame, min_diameter).0
}

/// [`pack_working`], also returning per-iteration statistics.
#[must_use]
pub fn pack_working_with_stats(
    working: &mut Mask,
    frame: &WorkingFrame,
    min_diameter: f64,
) -> (Vec<Disk>, Vec<PackIteration>) {
    let largest_only = min_diameter == 0.0;
    let mut disks = Vec::new();
    let mut iterations = Vec::new();

    loop {
        let map = DistanceMap::compute(working);
        let found = maxima::find_maxima(&map, maxima::DEFAULT_TOLERANCE);
        let candidates: Vec<Maximum> = found
            .iter()
            .copied()
            .filter(|m| m.value > min_diameter)
            .collect();
        let Some(tier_value) = candidates.iter().map(|m| m.value).reduce(f64::max) else {
            break;
        };
        let tier: Vec<Maximum> = candidates
            .iter()
            .copied()
            .filter(|m| m.value == tier_value)
            .collect();

        let accepted: Vec<Maximum> = tier
            .iter()
            .copied()
            .filter(|p| !is_dominated(p, &tier))
            .collect();

        for p in &accepted {
            carve(working, p);
            let radius = frame.length_to_source(p.value);
            let center = frame.to_source(Point::new(f64::from(p.x), f64::from(p.y)));
            disks.push(Disk {
                name: Some(Disk::default_name(radius)),
                ..Disk::new(center, radius)
            });
        }

        let stats = PackIteration {
            maxima: found.len(),
            candidates: candidates.len(),
            tier_value,
            tier_size: tier.len(),
            accepted: accepted.len(),
        };
        tracing::debug!(
            iteration = iterations.len(),
            maxima = stats.maxima,
            candidates = stats.candidates,
            tier_value = stats.tier_value,
            accepted = stats.accepted,
            "packing iteration",
        );
        iterations.push(stats);

        if largest_only && !accepted.is_empty() {
            break;
        }
    }

    (disks, iterations)
}

/// Whether an overlapping tier member has a strictly larger radius.
fn is_dominated(p: &Maximum, tier: &[Maximum]) -> bool {
    let centre = |m: &Maximum| Point::new(f64::from(m.x), f64::from(m.y));
    tier.iter().any(|q| {
        centre(p).distance(centre(q)) < p.value + q.value && q.value > p.value
    })
}

/// Clear every working pixel closer than the disk radius to its centre.
fn carve(working: &mut Mask, disk: &Maximum) {
    let r = disk.value;
    let (cx, cy) = (f64::from(disk.x), f64::from(disk.y));
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let (x0, x1, y0, y1) = (
        (cx - r).floor().max(0.0) as u32,
        (cx + r).ceil().min(f64::from(working.width())) as u32,
        (cy - r).floor().max(0.0) as u32,
        (cy + r).ceil().min(f64::from(working.height())) as u32,
    );
    let r_sq = r * r;
    for y in y0..y1 {
        for x in x0..x1 {
            let p = Point::new(f64::from(x), f64::from(y));
            if p.distance_squared(Point::new(cx, cy)) < r_sq {
                working.set(x, y, false);
            }
        }
    }
}

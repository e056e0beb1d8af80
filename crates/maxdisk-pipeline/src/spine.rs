//! Circle-based spine tracing.
//!
//! Starting from the largest disk (the root) and its largest adjacent
//! disk (the anchor), two greedy walks run in opposite directions. Each
//! step moves to the largest remaining disk that is adjacent to the
//! current one and continues roughly in the same direction. When no such
//! disk exists the walk ends by marching straight out to the mask
//! boundary. Disks passed by either walk are removed from the shared pool
//! so no disk appears twice.

use crate::geometry::{cosine_similarity, segment_in_mask};
use crate::mask::Mask;
use crate::types::{Disk, Point, Polyline, Spine, SpineConfig, SpineError, SpinePart, SpinePartKind};

/// Default spine name.
pub const SPINE_NAME: &str = "Spine";

/// Default spine part name.
pub const SPINE_PART_NAME: &str = "SpinePart";

/// Trace a spine through `disks`, which must be ordered largest first.
///
/// `mask` is used for visibility between disk centres and for the
/// boundary marches at both ends.
///
/// # Errors
///
/// Returns [`SpineError::NoDisks`] or [`SpineError::SingleDisk`] when
/// there are fewer than two disks, and [`SpineError::NoAdjacentDisks`]
/// when the largest disk has no adjacent disk.
pub fn trace(disks: &[Disk], mask: &Mask, config: &SpineConfig) -> Result<Spine, SpineError> {
    match disks.len() {
        0 => return Err(SpineError::NoDisks),
        1 => return Err(SpineError::SingleDisk),
        _ => {}
    }

    let mut tracer = Tracer {
        disks,
        mask,
        config,
        pool: vec![true; disks.len()],
        parts: Vec::new(),
    };

    let root = 0;
    let anchor = tracer
        .largest((1..disks.len()).filter(|&k| tracer.adjacent(root, k)))
        .ok_or(SpineError::NoAdjacentDisks)?;
    tracer.parts.push(part(
        disks[root].center,
        disks[anchor].center,
        SpinePartKind::Connector,
    ));

    let backward = tracer.walk(anchor, root);
    let forward = tracer.walk(root, anchor);

    let mut points: Vec<Point> = backward.into_iter().rev().collect();
    points.push(disks[root].center);
    points.push(disks[anchor].center);
    points.extend(forward);

    tracing::debug!(
        points = points.len(),
        parts = tracer.parts.len(),
        "spine traced",
    );

    Ok(Spine {
        polyline: Polyline::new(points),
        parts: tracer.parts,
        width: disks[root].diameter(),
        slice: None,
        name: SPINE_NAME.to_string(),
    })
}

struct Tracer<'a> {
    disks: &'a [Disk],
    mask: &'a Mask,
    config: &'a SpineConfig,
    /// Disks still eligible as walk candidates.
    pool: Vec<bool>,
    parts: Vec<SpinePart>,
}

impl Tracer<'_> {
    /// Close enough and mutually visible through foreground.
    fn adjacent(&self, a: usize, b: usize) -> bool {
        let (da, db) = (&self.disks[a], &self.disks[b]);
        let d = da.center.distance(db.center);
        d > 0.0
            && d < da.radius + db.radius + self.config.closeness_tolerance()
            && segment_in_mask(self.mask, da.center, db.center)
    }

    /// Index of the largest disk among `candidates`; the first one wins ties.
    fn largest(&self, candidates: impl Iterator<Item = usize>) -> Option<usize> {
        candidates.reduce(|best, k| {
            if self.disks[k].radius > self.disks[best].radius {
                k
            } else {
                best
            }
        })
    }

    /// Walk from `cur` away from `prev`, returning the visited centres
    /// followed by the boundary terminus.
    fn walk(&mut self, mut prev: usize, mut cur: usize) -> Vec<Point> {
        let mut points = Vec::new();
        loop {
            self.pool[prev] = false;
            let centre = self.disks[cur].center;
            let v_in = self.disks[prev].center.vector_to(centre);

            let next = self.largest((0..self.disks.len()).filter(|&k| {
                self.pool[k]
                    && k != cur
                    && self.adjacent(cur, k)
                    && cosine_similarity(v_in, centre.vector_to(self.disks[k].center))
                        .is_some_and(|s| s > self.config.min_similarity())
            }));

            if let Some(next) = next {
                let to = self.disks[next].center;
                self.parts.push(part(centre, to, SpinePartKind::Connector));
                points.push(to);
                self.pool[cur] = false;
                prev = cur;
                cur = next;
            } else {
                self.pool[cur] = false;
                let terminus = march(self.mask, &self.disks[cur], v_in);
                self.parts.push(part(centre, terminus, SpinePartKind::Extension));
                points.push(terminus);
                return points;
            }
        }
    }
}

fn part(from: Point, to: Point, kind: SpinePartKind) -> SpinePart {
    SpinePart {
        from,
        to,
        kind,
        slice: None,
        name: SPINE_PART_NAME.to_string(),
    }
}

/// March from `disk`'s centre along `direction` to the mask boundary.
///
/// Starts just inside the disk rim at `max(r - 1, 0)`, then probes one
/// pixel at a time from `r` outward while the probe is foreground. The
/// last foreground position is returned unrounded, so the pixel it
/// rounds to is foreground and one more step lands on background.
fn march(mask: &Mask, disk: &Disk, direction: Point) -> Point {
    let norm = direction.norm();
    if norm == 0.0 || !norm.is_finite() {
        return disk.center;
    }
    let u = Point::new(direction.x / norm, direction.y / norm);
    let c = disk.center;
    let r = disk.radius;

    let mut last = c.step(u, (r - 1.0).max(0.0));
    let mut t = r;
    loop {
        let probe = c.step(u, t);
        if !mask.is_foreground_at(probe) {
            return last;
        }
        last = probe;
        t += 1.0;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn disk(x: f64, y: f64, r: f64) -> Disk {
        Disk::new(Point::new(x, y), r)
    }

    fn config(min_similarity: f64) -> SpineConfig {
        SpineConfig::try_new(10.0, min_similarity).unwrap()
    }

    #[test]
    fn too_few_disks() {
        let mask = Mask::from_fn(20, 20, |_, _| true);
        assert_eq!(
            trace(&[], &mask, &config(0.5)),
            Err(SpineError::NoDisks)
        );
        assert_eq!(
            trace(&[disk(5.0, 5.0, 3.0)], &mask, &config(0.5)),
            Err(SpineError::SingleDisk)
        );
    }

    #[test]
    fn distant_disks_are_not_adjacent() {
        let mask = Mask::from_fn(100, 20, |_, _| true);
        let disks = [disk(10.0, 10.0, 4.0), disk(60.0, 10.0, 3.0)];
        assert_eq!(
            trace(&disks, &mask, &config(0.5)),
            Err(SpineError::NoAdjacentDisks)
        );
    }

    #[test]
    fn background_gap_blocks_adjacency() {
        let mask = Mask::from_fn(40, 20, |x, _| x != 20);
        let disks = [disk(14.0, 10.0, 5.0), disk(26.0, 10.0, 5.0)];
        assert_eq!(
            trace(&disks, &mask, &config(0.5)),
            Err(SpineError::NoAdjacentDisks)
        );
    }

    #[test]
    fn straight_chain_is_ordered_boundary_to_boundary() {
        let mask = Mask::from_fn(100, 21, |x, y| (10..90).contains(&x) && (5..16).contains(&y));
        let disks = [
            disk(50.0, 10.0, 5.0),
            disk(60.0, 10.0, 4.5),
            disk(40.0, 10.0, 4.0),
            disk(70.0, 10.0, 4.0),
            disk(30.0, 10.0, 3.5),
        ];
        let spine = trace(&disks, &mask, &config(0.5)).unwrap();
        let xs: Vec<f64> = spine.polyline.points().iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![9.5, 30.0, 40.0, 50.0, 60.0, 70.0, 89.0]);
        assert!(spine.polyline.points().iter().all(|p| (p.y - 10.0).abs() < f64::EPSILON));

        assert_eq!(spine.parts.len(), 6);
        assert_eq!(
            spine
                .parts
                .iter()
                .filter(|p| p.kind == SpinePartKind::Extension)
                .count(),
            2
        );
        assert_eq!(spine.parts[0].from, Point::new(50.0, 10.0));
        assert_eq!(spine.parts[0].to, Point::new(60.0, 10.0));
        assert!((spine.width - 10.0).abs() < f64::EPSILON);
        assert!((spine.length() - 79.5).abs() < 1e-9);
        assert_eq!(spine.name, SPINE_NAME);
    }

    #[test]
    fn similarity_threshold_excludes_sharp_turns() {
        let mask = Mask::from_fn(100, 100, |_, _| true);
        let disks = [
            disk(50.0, 50.0, 6.0),
            disk(62.0, 50.0, 5.0),
            disk(50.0, 38.0, 5.0),
        ];

        let strict = trace(&disks, &mask, &config(0.5)).unwrap();
        assert_eq!(
            strict.polyline.points(),
            &[
                Point::new(0.0, 50.0),
                Point::new(50.0, 50.0),
                Point::new(62.0, 50.0),
                Point::new(99.0, 50.0),
            ]
        );

        let loose = trace(&disks, &mask, &config(-0.8)).unwrap();
        assert_eq!(
            loose.polyline.points(),
            &[
                Point::new(50.0, 0.0),
                Point::new(50.0, 38.0),
                Point::new(50.0, 50.0),
                Point::new(62.0, 50.0),
                Point::new(99.0, 50.0),
            ]
        );
    }

    #[test]
    fn anchor_tie_goes_to_first_disk() {
        let mask = Mask::from_fn(100, 100, |_, _| true);
        let disks = [
            disk(50.0, 50.0, 6.0),
            disk(38.0, 50.0, 5.0),
            disk(62.0, 50.0, 5.0),
        ];
        let spine = trace(&disks, &mask, &config(0.5)).unwrap();
        assert_eq!(spine.parts[0].to, Point::new(38.0, 50.0));
    }

    #[test]
    fn march_stops_on_last_foreground_probe() {
        let mask = Mask::from_fn(40, 10, |x, _| x < 25);
        let terminus = march(&mask, &disk(10.0, 5.0, 4.0), Point::new(3.0, 0.0));
        assert_eq!(terminus, Point::new(24.0, 5.0));
        assert!(mask.is_foreground_at(terminus));
        assert!(!mask.is_foreground_at(terminus.step(Point::new(1.0, 0.0), 1.0)));
    }

    #[test]
    fn march_keeps_rim_start_when_boundary_is_close() {
        let mask = Mask::from_fn(40, 10, |x, _| x < 14);
        let terminus = march(&mask, &disk(10.0, 5.0, 4.0), Point::new(1.0, 0.0));
        // The first probe at the rim (x = 14) is already background.
        assert_eq!(terminus, Point::new(13.0, 5.0));
    }
}

//! Small geometric predicates used by the spine tracer.

use crate::mask::Mask;
use crate::types::Point;

/// Cosine of the angle between two vectors.
///
/// Returns `None` if either vector has zero length; such a pair is never
/// considered similar.
#[must_use]
pub fn cosine_similarity(u: Point, v: Point) -> Option<f64> {
    let denom = u.norm() * v.norm();
    if denom == 0.0 || !denom.is_finite() {
        return None;
    }
    Some(u.dot(v) / denom)
}

/// Whether the straight segment `a → b` lies entirely on foreground.
///
/// The segment is sampled at `n = round(|b - a|)` equal steps (`n + 1`
/// samples including both ends), each rounded to the nearest pixel.
/// Any background sample disqualifies the segment.
#[must_use]
pub fn segment_in_mask(mask: &Mask, a: Point, b: Point) -> bool {
    let d = a.distance(b);
    if !d.is_finite() {
        return false;
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let n = d.round() as u64;
    if n == 0 {
        return mask.is_foreground_at(a);
    }
    let direction = a.vector_to(b);
    (0..=n).all(|i| {
        #[allow(clippy::cast_precision_loss)]
        let t = i as f64 / n as f64;
        mask.is_foreground_at(a.step(direction, t))
    })
}

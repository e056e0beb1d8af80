//! Local maxima of a distance map with plateau and noise tolerance.
//!
//! A pixel is a local-maximum candidate when it is positive and none of
//! its 8 neighbours is strictly greater. Candidates are examined from the
//! highest value down. Each one floods outward over 8-connected pixels
//! whose value is at least `value - tolerance`; the candidate is rejected
//! if the flood meets a strictly higher pixel or a pixel already claimed
//! by an earlier flood. Every pixel the flood touches is claimed, so a
//! plateau (or a noisy ridge within `tolerance`) yields one maximum.
//!
//! The representative of an accepted maximum is the pixel of exactly the
//! peak value that lies nearest the centroid of all such pixels in the
//! flood. Ties go to the lowest raster index.

use std::collections::VecDeque;

use crate::distance::DistanceMap;

/// Tolerance used by the packer: maxima within one unit collapse.
pub const DEFAULT_TOLERANCE: f64 = 1.0;

/// One accepted maximum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Maximum {
    /// Representative column.
    pub x: u32,
    /// Representative row.
    pub y: u32,
    /// Distance value at the representative.
    pub value: f64,
}

const NEIGHBOURS: [(i64, i64); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Find the tolerance-filtered local maxima of `map`.
///
/// The result is sorted by descending value, then by raster order
/// (row, then column) of the representative pixel.
#[must_use]
pub fn find_maxima(map: &DistanceMap, tolerance: f64) -> Vec<Maximum> {
    let (width, height) = (map.width(), map.height());
    let values = map.values();
    let at = |x: i64, y: i64| -> Option<usize> {
        let (xu, yu) = (u32::try_from(x).ok()?, u32::try_from(y).ok()?);
        (xu < width && yu < height).then(|| yu as usize * width as usize + xu as usize)
    };

    let mut candidates: Vec<usize> = Vec::new();
    for y in 0..i64::from(height) {
        for x in 0..i64::from(width) {
            let Some(i) = at(x, y) else { continue };
            let v = values[i];
            if v <= 0.0 {
                continue;
            }
            let dominated = NEIGHBOURS.iter().any(|&(dx, dy)| {
                at(x + dx, y + dy).is_some_and(|j| values[j] > v)
            });
            if !dominated {
                candidates.push(i);
            }
        }
    }
    // Stable: equal values stay in raster order.
    candidates.sort_by(|&a, &b| values[b].total_cmp(&values[a]));

    let mut processed = vec![false; values.len()];
    let mut visited = vec![false; values.len()];
    let mut maxima = Vec::new();
    let mut queue = VecDeque::new();
    let mut flood: Vec<usize> = Vec::new();

    for &seed in &candidates {
        if processed[seed] {
            continue;
        }
        let v0 = values[seed];
        let mut is_maximum = true;

        flood.clear();
        queue.clear();
        visited[seed] = true;
        flood.push(seed);
        queue.push_back(seed);

        while let Some(i) = queue.pop_front() {
            let (x, y) = coords(i, width);
            for &(dx, dy) in &NEIGHBOURS {
                let Some(j) = at(x + dx, y + dy) else { continue };
                if visited[j] {
                    continue;
                }
                let v = values[j];
                if v <= 0.0 || v < v0 - tolerance {
                    continue;
                }
                if processed[j] || v > v0 {
                    is_maximum = false;
                    if processed[j] {
                        continue;
                    }
                }
                visited[j] = true;
                flood.push(j);
                queue.push_back(j);
            }
        }

        if is_maximum {
            let rep = representative(&flood, values, v0, width);
            let (x, y) = coords(rep, width);
            maxima.push(Maximum {
                x: u32::try_from(x).unwrap_or(0),
                y: u32::try_from(y).unwrap_or(0),
                value: v0,
            });
        }

        for &i in &flood {
            processed[i] = true;
            visited[i] = false;
        }
    }

    maxima.sort_by(|a, b| {
        b.value
            .total_cmp(&a.value)
            .then(a.y.cmp(&b.y))
            .then(a.x.cmp(&b.x))
    });
    maxima
}

/// The peak-valued pixel nearest the centroid of all peak-valued pixels.
fn representative(flood: &[usize], values: &[f64], v0: f64, width: u32) -> usize {
    let equal: Vec<usize> = flood.iter().copied().filter(|&i| values[i] == v0).collect();
    #[allow(clippy::cast_precision_loss)]
    let (cx, cy) = {
        let n = equal.len() as f64;
        let (sx, sy) = equal.iter().fold((0.0, 0.0), |(sx, sy), &i| {
            let (x, y) = coords(i, width);
            (sx + x as f64, sy + y as f64)
        });
        (sx / n, sy / n)
    };
    equal
        .iter()
        .copied()
        .map(|i| {
            let (x, y) = coords(i, width);
            #[allow(clippy::cast_precision_loss)]
            let (dx, dy) = (x as f64 - cx, y as f64 - cy);
            (i, dx.mul_add(dx, dy * dy))
        })
        .fold(None, |best: Option<(usize, f64)>, (i, d)| match best {
            Some((bi, bd)) if bd < d || (bd == d && bi < i) => Some((bi, bd)),
            _ => Some((i, d)),
        })
        .map_or(flood[0], |(i, _)| i)
}

fn coords(i: usize, width: u32) -> (i64, i64) {
    let w = width as usize;
    #[allow(clippy::cast_possible_wrap)]
    ((i % w) as i64, (i / w) as i64)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::mask::Mask;

    fn disk_mask(width: u32, height: u32, cx: f64, cy: f64, r: f64) -> Mask {
        Mask::from_fn(width, height, |x, y| {
            (f64::from(x) - cx).hypot(f64::from(y) - cy) <= r
        })
    }

    #[test]
    fn empty_map_has_no_maxima() {
        let map = DistanceMap::compute(&Mask::new(8, 8));
        assert!(find_maxima(&map, DEFAULT_TOLERANCE).is_empty());
    }

    #[test]
    fn single_disk_has_one_central_maximum() {
        let map = DistanceMap::compute(&disk_mask(41, 41, 20.0, 20.0, 12.0));
        let maxima = find_maxima(&map, DEFAULT_TOLERANCE);
        assert_eq!(maxima.len(), 1);
        assert_eq!((maxima[0].x, maxima[0].y), (20, 20));
        assert!((maxima[0].value - map.max()).abs() < f64::EPSILON);
    }

    #[test]
    fn two_separate_disks_sorted_by_value() {
        let small = disk_mask(80, 40, 60.0, 20.0, 8.0);
        let big = disk_mask(80, 40, 18.0, 20.0, 14.0);
        let mask = Mask::from_fn(80, 40, |x, y| {
            small.is_foreground(i64::from(x), i64::from(y))
                || big.is_foreground(i64::from(x), i64::from(y))
        });
        let maxima = find_maxima(&DistanceMap::compute(&mask), DEFAULT_TOLERANCE);
        assert_eq!(maxima.len(), 2);
        assert_eq!((maxima[0].x, maxima[0].y), (18, 20));
        assert_eq!((maxima[1].x, maxima[1].y), (60, 20));
        assert!(maxima[0].value > maxima[1].value);
    }

    #[test]
    fn plateau_collapses_to_lowest_index_on_tie() {
        // A one-row strip of four pixels: all tie on value 1 and the
        // centroid falls between the middle two columns.
        let mask = Mask::from_fn(8, 3, |x, y| y == 1 && (2..6).contains(&x));
        let maxima = find_maxima(&DistanceMap::compute(&mask), DEFAULT_TOLERANCE);
        assert_eq!(maxima.len(), 1);
        assert_eq!((maxima[0].x, maxima[0].y), (3, 1));
    }

    #[test]
    fn ridge_representative_is_centred() {
        // 30x7 bar: the ridge of value 4 runs along row 4, columns 8..=31.
        let mask = Mask::from_fn(40, 9, |x, y| (5..35).contains(&x) && (1..8).contains(&y));
        let map = DistanceMap::compute(&mask);
        let maxima = find_maxima(&map, DEFAULT_TOLERANCE);
        assert_eq!(maxima.len(), 1);
        assert_eq!(maxima[0].y, 4);
        assert_eq!(maxima[0].x, 19);
        assert!((maxima[0].value - 4.0).abs() < 1e-12);
    }

    #[test]
    fn tolerance_merges_close_peaks() {
        // Two lobes of slightly different size joined by a wide neck: with a
        // large tolerance only one maximum survives.
        let a = disk_mask(60, 30, 15.0, 15.0, 10.0);
        let b = disk_mask(60, 30, 40.0, 15.0, 9.0);
        let mask = Mask::from_fn(60, 30, |x, y| {
            let (xi, yi) = (i64::from(x), i64::from(y));
            a.is_foreground(xi, yi)
                || b.is_foreground(xi, yi)
                || ((15..=40).contains(&x) && (8..=22).contains(&y))
        });
        let map = DistanceMap::compute(&mask);
        assert_eq!(find_maxima(&map, 100.0).len(), 1);
        assert!(find_maxima(&map, 0.0).len() >= 2);
    }
}

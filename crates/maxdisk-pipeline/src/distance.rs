//! Euclidean distance map of a mask.
//!
//! Wraps [`imageproc::distance_transform::euclidean_squared_distance_transform`],
//! which measures the squared distance to the nearest *non-zero* pixel. The
//! mask is inverted first so that background pixels become the seeds, and
//! the square root is taken afterwards. The seed image carries a one-pixel
//! background frame, so the raster edge always bounds the distance.

use image::{GrayImage, Luma};
use imageproc::distance_transform::euclidean_squared_distance_transform;

use crate::mask::Mask;

/// Per-pixel distance to the nearest background pixel.
///
/// Background pixels have distance `0`. A foreground pixel touching
/// background has distance `1`.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMap {
    width: u32,
    height: u32,
    values: Vec<f64>,
}

impl DistanceMap {
    /// Compute the exact Euclidean distance map of `mask`.
    ///
    /// Everything outside the raster counts as background: the transform
    /// is seeded with a one-pixel background frame, so a pixel on the
    /// raster edge gets distance `1` whether or not the raster holds any
    /// background of its own.
    #[must_use]
    pub fn compute(mask: &Mask) -> Self {
        let (width, height) = (mask.width(), mask.height());

        if !mask.has_foreground() {
            return Self {
                width,
                height,
                values: vec![0.0; pixel_count(width, height)],
            };
        }

        // Framed seed image: pixel (x, y) of the mask sits at (x + 1, y + 1).
        let seeds = GrayImage::from_fn(width + 2, height + 2, |x, y| {
            let inside = mask.is_foreground(i64::from(x) - 1, i64::from(y) - 1);
            Luma([if inside { 0 } else { 255 }])
        });
        let framed = euclidean_squared_distance_transform(&seeds);

        let mut values = Vec::with_capacity(pixel_count(width, height));
        for y in 0..height {
            for x in 0..width {
                values.push(framed.get_pixel(x + 1, y + 1).0[0].sqrt());
            }
        }

        Self {
            width,
            height,
            values,
        }
    }

    /// Map width in pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Map height in pixels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Distance at an in-bounds pixel; `0.0` outside the raster.
    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> f64 {
        if x >= self.width || y >= self.height {
            return 0.0;
        }
        self.values[self.index(x, y)]
    }

    /// Largest distance in the map (`0.0` for an empty map).
    #[must_use]
    pub fn max(&self) -> f64 {
        self.values.iter().copied().fold(0.0, f64::max)
    }

    /// Row-major distance values.
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }
}

fn pixel_count(width: u32, height: u32) -> usize {
    width as usize * height as usize
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    /// Brute-force distance to the nearest background pixel, counting
    /// the pixels just outside the raster as background.
    fn brute_force(mask: &Mask, x: u32, y: u32) -> f64 {
        let frame = (x + 1).min(y + 1).min(mask.width() - x).min(mask.height() - y);
        let mut best = f64::from(frame);
        for by in 0..mask.height() {
            for bx in 0..mask.width() {
                if !mask.is_foreground(i64::from(bx), i64::from(by)) {
                    let dx = f64::from(bx) - f64::from(x);
                    let dy = f64::from(by) - f64::from(y);
                    best = best.min(dx.hypot(dy));
                }
            }
        }
        best
    }

    #[test]
    fn empty_mask_is_all_zero() {
        let map = DistanceMap::compute(&Mask::new(5, 4));
        assert_eq!(map.values().len(), 20);
        assert!(map.max().abs() < f64::EPSILON);
    }

    #[test]
    fn background_is_zero_and_border_is_one() {
        let mask = Mask::from_fn(9, 9, |x, y| (2..7).contains(&x) && (2..7).contains(&y));
        let map = DistanceMap::compute(&mask);
        assert!(map.get(0, 0).abs() < f64::EPSILON);
        assert!((map.get(2, 4) - 1.0).abs() < 1e-12);
        assert!((map.get(4, 4) - 3.0).abs() < 1e-12);
        assert!((map.max() - 3.0).abs() < 1e-12);
    }

    #[test]
    fn matches_brute_force_on_irregular_shape() {
        let mask = Mask::from_fn(24, 18, |x, y| {
            let dx = f64::from(x) - 11.0;
            let dy = f64::from(y) - 8.0;
            dx.hypot(dy) < 7.5 && !(x == 14 && y == 6)
        });
        let map = DistanceMap::compute(&mask);
        for y in 0..mask.height() {
            for x in 0..mask.width() {
                let expected = brute_force(&mask, x, y);
                assert!(
                    (map.get(x, y) - expected).abs() < 1e-9,
                    "({x}, {y}): got {}, expected {expected}",
                    map.get(x, y),
                );
            }
        }
    }

    #[test]
    fn full_mask_uses_frame_distance() {
        let map = DistanceMap::compute(&Mask::from_fn(5, 7, |_, _| true));
        assert!((map.get(0, 3) - 1.0).abs() < f64::EPSILON);
        assert!((map.get(4, 3) - 1.0).abs() < f64::EPSILON);
        assert!((map.get(2, 3) - 3.0).abs() < f64::EPSILON);
        assert!((map.max() - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn shape_touching_the_edge_is_bounded_by_the_frame() {
        // Foreground everywhere except one far corner pixel.
        let mask = Mask::from_fn(12, 8, |x, y| !(x == 11 && y == 7));
        let map = DistanceMap::compute(&mask);
        assert!((map.get(0, 0) - 1.0).abs() < f64::EPSILON);
        assert!((map.get(0, 4) - 1.0).abs() < f64::EPSILON);
        assert!((map.get(5, 0) - 1.0).abs() < f64::EPSILON);
        assert!(map.get(11, 7).abs() < f64::EPSILON);
        assert!((map.max() - 4.0).abs() < f64::EPSILON);
        for y in 0..mask.height() {
            for x in 0..mask.width() {
                assert!((map.get(x, y) - brute_force(&mask, x, y)).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn out_of_bounds_reads_zero() {
        let map = DistanceMap::compute(&Mask::from_fn(3, 3, |_, _| true));
        assert!(map.get(3, 0).abs() < f64::EPSILON);
    }
}

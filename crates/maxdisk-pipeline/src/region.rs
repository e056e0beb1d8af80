//! Regions of interest.
//!
//! A region restricts packing to part of a mask. Membership is decided
//! per pixel centre: pixel `(i, j)` belongs to the region when the point
//! `(i + 0.5, j + 0.5)` lies inside the shape. Polygon vertices are given
//! in pixel-corner coordinates, so a rectangle polygon
//! `(x, y) (x + w, y) (x + w, y + h) (x, y + h)` covers exactly the same
//! pixels as `Region::Rectangle { x, y, width: w, height: h }`.

use geo::{Contains, LineString, Polygon};
use serde::{Deserialize, Serialize};

use crate::mask::Mask;
use crate::types::{Dimensions, Point};

/// A rectangular or polygonal region of interest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Region {
    /// Axis-aligned rectangle in integer pixels.
    Rectangle {
        /// Left edge.
        x: u32,
        /// Top edge.
        y: u32,
        /// Width in pixels.
        width: u32,
        /// Height in pixels.
        height: u32,
    },
    /// Closed polygon; the last vertex connects back to the first.
    Polygon(Vec<Point>),
}

/// Integer pixel bounds of a region, clipped to an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelBounds {
    /// Left column (inclusive).
    pub x: u32,
    /// Top row (inclusive).
    pub y: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Region {
    /// Pixel bounds of the region clipped to `dims`.
    ///
    /// Returns `None` when the clipped bounds have zero area.
    #[must_use]
    pub fn bounds(&self, dims: Dimensions) -> Option<PixelBounds> {
        let (x0, y0, x1, y1) = match self {
            Self::Rectangle {
                x,
                y,
                width,
                height,
            } => (
                i64::from(*x),
                i64::from(*y),
                i64::from(*x) + i64::from(*width),
                i64::from(*y) + i64::from(*height),
            ),
            Self::Polygon(vertices) => {
                if vertices.len() < 3 {
                    return None;
                }
                let fold = vertices.iter().fold(
                    (f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
                    |(min_x, min_y, max_x, max_y), p| {
                        (min_x.min(p.x), min_y.min(p.y), max_x.max(p.x), max_y.max(p.y))
                    },
                );
                if !(fold.0.is_finite() && fold.1.is_finite() && fold.2.is_finite() && fold.3.is_finite()) {
                    return None;
                }
                #[allow(clippy::cast_possible_truncation)]
                (
                    fold.0.floor() as i64,
                    fold.1.floor() as i64,
                    fold.2.ceil() as i64,
                    fold.3.ceil() as i64,
                )
            }
        };

        let clip = |v: i64, max: u32| u32::try_from(v.clamp(0, i64::from(max))).unwrap_or(0);
        let (cx0, cx1) = (clip(x0, dims.width), clip(x1, dims.width));
        let (cy0, cy1) = (clip(y0, dims.height), clip(y1, dims.height));
        if cx1 <= cx0 || cy1 <= cy0 {
            return None;
        }
        Some(PixelBounds {
            x: cx0,
            y: cy0,
            width: cx1 - cx0,
            height: cy1 - cy0,
        })
    }

    /// Rasterise the region's own shape at full image size.
    ///
    /// Pixels inside the region are foreground, all others background.
    #[must_use]
    pub fn to_mask(&self, dims: Dimensions) -> Mask {
        let Some(bounds) = self.bounds(dims) else {
            return Mask::new(dims.width, dims.height);
        };
        let inside_bounds = |x: u32, y: u32| {
            x >= bounds.x
                && x < bounds.x + bounds.width
                && y >= bounds.y
                && y < bounds.y + bounds.height
        };
        match self {
            Self::Rectangle { .. } => Mask::from_fn(dims.width, dims.height, inside_bounds),
            Self::Polygon(vertices) => {
                let polygon = to_geo_polygon(vertices);
                Mask::from_fn(dims.width, dims.height, |x, y| {
                    inside_bounds(x, y) && polygon.contains(&pixel_centre(x, y))
                })
            }
        }
    }
}

fn to_geo_polygon(vertices: &[Point]) -> Polygon<f64> {
    let ring: Vec<(f64, f64)> = vertices.iter().map(|p| (p.x, p.y)).collect();
    Polygon::new(LineString::from(ring), vec![])
}

fn pixel_centre(x: u32, y: u32) -> geo::Point<f64> {
    geo::Point::new(f64::from(x) + 0.5, f64::from(y) + 0.5)
}

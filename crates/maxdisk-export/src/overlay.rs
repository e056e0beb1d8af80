//! Raster overlay export.
//!
//! Draws the packing result over the mask it came from: foreground in
//! grey on black, disk outlines, then the spine parts on top.

use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_circle_mut, draw_line_segment_mut};

use maxdisk_pipeline::{Mask, Point, ProcessResult, SpinePartKind};

/// Mask foreground colour.
pub const FOREGROUND: Rgb<u8> = Rgb([96, 96, 96]);

/// Disk outline colour.
pub const DISK: Rgb<u8> = Rgb([0, 176, 255]);

/// Connector part colour.
pub const CONNECTOR: Rgb<u8> = Rgb([128, 255, 128]);

/// Boundary extension part colour.
pub const EXTENSION: Rgb<u8> = Rgb([255, 0, 0]);

/// Render `result` on top of `mask` as an RGB image of the mask's size.
#[must_use]
pub fn render_overlay(mask: &Mask, result: &ProcessResult) -> RgbImage {
    let mut canvas = RgbImage::from_fn(mask.width(), mask.height(), |x, y| {
        if mask.as_image().get_pixel(x, y).0[0] > 0 {
            FOREGROUND
        } else {
            Rgb([0, 0, 0])
        }
    });

    for disk in &result.disks {
        draw_hollow_circle_mut(
            &mut canvas,
            pixel(disk.center),
            to_i32(disk.radius),
            DISK,
        );
    }

    if let Some(spine) = result.spine.spine() {
        for part in &spine.parts {
            let color = match part.kind {
                SpinePartKind::Connector => CONNECTOR,
                SpinePartKind::Extension => EXTENSION,
            };
            draw_line_segment_mut(&mut canvas, to_f32(part.from), to_f32(part.to), color);
        }
    }

    canvas
}

fn pixel(p: Point) -> (i32, i32) {
    (to_i32(p.x), to_i32(p.y))
}

#[allow(clippy::cast_possible_truncation)]
fn to_i32(v: f64) -> i32 {
    v.round().clamp(f64::from(i32::MIN), f64::from(i32::MAX)) as i32
}

#[allow(clippy::cast_possible_truncation)]
fn to_f32(p: Point) -> (f32, f32) {
    (p.x as f32, p.y as f32)
}

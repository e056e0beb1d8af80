//! Binary raster masks.
//!
//! A [`Mask`] wraps an 8-bit [`GrayImage`] holding only two values:
//! [`FOREGROUND`] (255) and [`BACKGROUND`] (0). Reads outside the raster
//! are background. The packer clears pixels in place as it accepts disks,
//! so a working mask is owned by exactly one packing run.

use image::{GrayImage, Luma};

use crate::types::{Dimensions, PipelineError, Point};

/// Pixel value for foreground.
pub const FOREGROUND: u8 = 255;

/// Pixel value for background.
pub const BACKGROUND: u8 = 0;

/// Gray values strictly above this threshold count as foreground.
pub const THRESHOLD: u8 = 127;

/// A binary raster mask.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask {
    image: GrayImage,
}

impl Mask {
    /// An all-background mask.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: GrayImage::new(width, height),
        }
    }

    /// Build a mask from a per-pixel predicate (`true` = foreground).
    #[must_use]
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> bool) -> Self {
        Self {
            image: GrayImage::from_fn(width, height, |x, y| Luma([to_value(f(x, y))])),
        }
    }

    /// Threshold a grayscale image: values above [`THRESHOLD`] are foreground.
    #[must_use]
    pub fn from_gray(image: &GrayImage) -> Self {
        Self::from_fn(image.width(), image.height(), |x, y| {
            image.get_pixel(x, y).0[0] > THRESHOLD
        })
    }

    /// Decode raw image bytes (PNG, JPEG, BMP, WebP) into a mask.
    ///
    /// The image is converted to luma and thresholded. With `invert`,
    /// dark pixels become foreground instead.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::EmptyInput`] if `bytes` is empty.
    /// Returns [`PipelineError::ImageDecode`] if the image format is
    /// unrecognized or the data is corrupt.
    pub fn decode(bytes: &[u8], invert: bool) -> Result<Self, PipelineError> {
        if bytes.is_empty() {
            return Err(PipelineError::EmptyInput);
        }
        let gray = image::load_from_memory(bytes)?.to_luma8();
        let mask = Self::from_gray(&gray);
        Ok(if invert { mask.inverted() } else { mask })
    }

    /// Swap foreground and background.
    #[must_use]
    pub fn inverted(&self) -> Self {
        Self::from_fn(self.width(), self.height(), |x, y| !self.get(x, y))
    }

    /// Raster width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Raster height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Raster dimensions.
    #[must_use]
    pub fn dimensions(&self) -> Dimensions {
        Dimensions {
            width: self.width(),
            height: self.height(),
        }
    }

    /// The underlying 0/255 image.
    #[must_use]
    pub const fn as_image(&self) -> &GrayImage {
        &self.image
    }

    /// Foreground test for an in-bounds pixel.
    ///
    /// Callers must keep `x < width` and `y < height`.
    fn get(&self, x: u32, y: u32) -> bool {
        self.image.get_pixel(x, y).0[0] == FOREGROUND
    }

    /// Foreground test by signed pixel index. Out of bounds is background.
    #[must_use]
    pub fn is_foreground(&self, x: i64, y: i64) -> bool {
        match (u32::try_from(x), u32::try_from(y)) {
            (Ok(x), Ok(y)) if x < self.width() && y < self.height() => self.get(x, y),
            _ => false,
        }
    }

    /// Foreground test at a real-valued point, rounded to the nearest pixel.
    #[must_use]
    pub fn is_foreground_at(&self, p: Point) -> bool {
        if !p.x.is_finite() || !p.y.is_finite() {
            return false;
        }
        #[allow(clippy::cast_possible_truncation)]
        let (x, y) = (p.x.round() as i64, p.y.round() as i64);
        self.is_foreground(x, y)
    }

    /// Set an in-bounds pixel. Out-of-bounds writes are ignored.
    pub fn set(&mut self, x: u32, y: u32, foreground: bool) {
        if x < self.width() && y < self.height() {
            self.image.put_pixel(x, y, Luma([to_value(foreground)]));
        }
    }

    /// Number of foreground pixels.
    #[must_use]
    pub fn foreground_count(&self) -> usize {
        self.image.pixels().filter(|p| p.0[0] == FOREGROUND).count()
    }

    /// Whether any pixel is foreground.
    #[must_use]
    pub fn has_foreground(&self) -> bool {
        self.image.pixels().any(|p| p.0[0] == FOREGROUND)
    }

    /// Pixel-wise AND with another mask of the same size.
    ///
    /// Pixels outside `other` are treated as background.
    #[must_use]
    pub fn intersect(&self, other: &Self) -> Self {
        Self::from_fn(self.width(), self.height(), |x, y| {
            self.get(x, y) && other.is_foreground(i64::from(x), i64::from(y))
        })
    }

    /// Copy a rectangular window. The window must lie inside the raster.
    #[must_use]
    pub fn crop(&self, x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            image: image::imageops::crop_imm(&self.image, x, y, width, height).to_image(),
        }
    }

    /// Nearest-neighbour upsampling by an integer factor.
    ///
    /// Every source pixel becomes a `factor × factor` block.
    #[must_use]
    pub fn upsample(&self, factor: u32) -> Self {
        let factor = factor.max(1);
        Self {
            image: GrayImage::from_fn(self.width() * factor, self.height() * factor, |x, y| {
                *self.image.get_pixel(x / factor, y / factor)
            }),
        }
    }

    /// Surround the raster with a background border of `border` pixels.
    #[must_use]
    pub fn pad(&self, border: u32) -> Self {
        let mut padded = GrayImage::new(self.width() + 2 * border, self.height() + 2 * border);
        image::imageops::replace(&mut padded, &self.image, i64::from(border), i64::from(border));
        Self { image: padded }
    }
}

const fn to_value(foreground: bool) -> u8 {
    if foreground { FOREGROUND } else { BACKGROUND }
}

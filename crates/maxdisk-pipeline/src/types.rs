//! Shared types for the maxdisk packing and spine pipeline.

use serde::{Deserialize, Serialize};

/// Re-export `GrayImage` so downstream crates can build and inspect
/// masks without depending on `image` directly.
pub use image::GrayImage;

/// A 2D point in image coordinates.
///
/// Coordinates are pixel indices: pixel `(i, j)` sits at `(i, j)`, and a
/// real-valued point is sampled by rounding to the nearest pixel.
/// The same type doubles as a direction vector in the spine tracer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal position (pixels from left edge).
    pub x: f64,
    /// Vertical position (pixels from top edge).
    pub y: f64,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance to another point.
    ///
    /// Avoids the square root for comparison purposes.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx.mul_add(dx, dy * dy)
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        self.distance_squared(other).sqrt()
    }

    /// Vector pointing from `self` to `other`.
    #[must_use]
    pub fn vector_to(self, other: Self) -> Self {
        Self::new(other.x - self.x, other.y - self.y)
    }

    /// Dot product, treating both points as vectors.
    #[must_use]
    pub fn dot(self, other: Self) -> f64 {
        self.x.mul_add(other.x, self.y * other.y)
    }

    /// Vector magnitude.
    #[must_use]
    pub fn norm(self) -> f64 {
        self.dot(self).sqrt()
    }

    /// The point `self + t * direction`.
    #[must_use]
    pub fn step(self, direction: Self, t: f64) -> Self {
        Self::new(t.mul_add(direction.x, self.x), t.mul_add(direction.y, self.y))
    }
}

/// A sequence of connected points forming a path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polyline(Vec<Point>);

impl Polyline {
    /// Create a new polyline from a vector of points.
    #[must_use]
    pub const fn new(points: Vec<Point>) -> Self {
        Self(points)
    }

    /// Returns `true` if the polyline has no points.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of points in the polyline.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns the first point, if any.
    #[must_use]
    pub fn first(&self) -> Option<&Point> {
        self.0.first()
    }

    /// Returns the last point, if any.
    #[must_use]
    pub fn last(&self) -> Option<&Point> {
        self.0.last()
    }

    /// Returns a slice of all points.
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.0
    }

    /// Consumes the polyline and returns the underlying vector of points.
    #[must_use]
    pub fn into_points(self) -> Vec<Point> {
        self.0
    }

    /// Total Euclidean length of all segments.
    #[must_use]
    pub fn length(&self) -> f64 {
        self.0.windows(2).map(|w| w[0].distance(w[1])).sum()
    }
}

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// A maximal inscribed disk found by the packer.
///
/// Center and radius are in the source mask's coordinate system and
/// native resolution, regardless of the supersampling used internally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Disk {
    /// Disk centre.
    pub center: Point,
    /// Disk radius in source pixels.
    pub radius: f64,
    /// 1-based plane index when the disk comes from a stack.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slice: Option<usize>,
    /// Display name, `Circle-r_<radius>` unless renamed by the caller.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Disk {
    /// Create an unnamed disk.
    #[must_use]
    pub const fn new(center: Point, radius: f64) -> Self {
        Self {
            center,
            radius,
            slice: None,
            name: None,
        }
    }

    /// Disk diameter in source pixels.
    #[must_use]
    pub fn diameter(&self) -> f64 {
        2.0 * self.radius
    }

    /// The default generated name for a disk of this radius.
    ///
    /// `radius` is in source pixels, the same value written to the radius
    /// column of exports, so the name matches the reported size.
    #[must_use]
    pub fn default_name(radius: f64) -> String {
        format!("Circle-r_{radius:.3}")
    }
}

/// Role of a [`SpinePart`] segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpinePartKind {
    /// Segment between the centres of two consecutive spine disks.
    Connector,
    /// Segment from the last disk of a walk out to the mask boundary.
    Extension,
}

/// One visualisation segment of a spine.
///
/// Parts are not needed to use the spine polyline; they exist so that
/// exporters can draw connectors and boundary extensions differently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpinePart {
    /// Segment start.
    pub from: Point,
    /// Segment end.
    pub to: Point,
    /// Connector or boundary extension.
    pub kind: SpinePartKind,
    /// 1-based plane index when the spine comes from a stack.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slice: Option<usize>,
    /// Display name (`SpinePart` unless renamed).
    pub name: String,
}

/// Medial polyline threaded through a chain of adjacent disks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spine {
    /// Ordered spine vertices, boundary to boundary.
    pub polyline: Polyline,
    /// Visualisation segments (connectors and both boundary extensions).
    pub parts: Vec<SpinePart>,
    /// Diameter of the root (largest) disk.
    pub width: f64,
    /// 1-based plane index when the spine comes from a stack.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slice: Option<usize>,
    /// Display name (`Spine` unless renamed).
    pub name: String,
}

impl Spine {
    /// Total polyline length in source pixels.
    #[must_use]
    pub fn length(&self) -> f64 {
        self.polyline.length()
    }
}

/// Why a spine could not be traced.
///
/// Each variant tells the caller which threshold is worth adjusting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
pub enum SpineError {
    /// The disk set is empty.
    #[error("no circles found, consider decreasing the minimum circle diameter")]
    NoDisks,

    /// Only one disk was found, so there is nothing to connect.
    #[error("a single circle was found, consider decreasing the minimum circle diameter")]
    SingleDisk,

    /// The largest disk has no adjacent disk.
    #[error(
        "no adjacent circles found, consider decreasing the minimum circle diameter \
         or increasing the closeness tolerance"
    )]
    NoAdjacentDisks,
}

/// Result of the spine stage for one plane.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SpineOutcome {
    /// No spine was requested in the configuration.
    NotRequested,
    /// A spine was traced.
    Traced(Spine),
    /// Tracing was requested but the disks do not support a spine.
    Failed(SpineError),
}

impl SpineOutcome {
    /// The traced spine, if any.
    #[must_use]
    pub const fn spine(&self) -> Option<&Spine> {
        match self {
            Self::Traced(spine) => Some(spine),
            Self::NotRequested | Self::Failed(_) => None,
        }
    }
}

// ───────────────────────────── Configuration ─────────────────────────────

/// Parameters for the disk packer.
///
/// Constructed through [`PackConfig::try_new`] so that a `min_diameter`
/// that is negative or not finite can never reach the packer.
/// Deserialization runs the same validation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PackConfigFields")]
pub struct PackConfig {
    min_diameter: f64,
    selection_only: bool,
}

#[derive(Deserialize)]
struct PackConfigFields {
    min_diameter: f64,
    #[serde(default)]
    selection_only: bool,
}

impl TryFrom<PackConfigFields> for PackConfig {
    type Error = PipelineError;

    fn try_from(fields: PackConfigFields) -> Result<Self, Self::Error> {
        Self::try_new(fields.min_diameter, fields.selection_only)
    }
}

impl PackConfig {
    /// Default minimum disk diameter in source pixels.
    pub const DEFAULT_MIN_DIAMETER: f64 = 10.0;

    /// Validate and build a packer configuration.
    ///
    /// `min_diameter` is in source pixels; `0.0` selects largest-only mode.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] if `min_diameter` is
    /// negative or not finite.
    pub fn try_new(min_diameter: f64, selection_only: bool) -> Result<Self, PipelineError> {
        if !min_diameter.is_finite() || min_diameter < 0.0 {
            return Err(PipelineError::InvalidConfig(format!(
                "min_diameter must be a finite value >= 0, got {min_diameter}"
            )));
        }
        Ok(Self {
            min_diameter,
            selection_only,
        })
    }

    /// Minimum disk diameter in source pixels (`0.0` = largest only).
    #[must_use]
    pub const fn min_diameter(&self) -> f64 {
        self.min_diameter
    }

    /// Whether a region's own shape replaces the mask.
    #[must_use]
    pub const fn selection_only(&self) -> bool {
        self.selection_only
    }

    /// Whether only the largest inscribed disk(s) are wanted.
    #[must_use]
    pub fn largest_only(&self) -> bool {
        self.min_diameter == 0.0
    }
}

impl Default for PackConfig {
    fn default() -> Self {
        Self {
            min_diameter: Self::DEFAULT_MIN_DIAMETER,
            selection_only: false,
        }
    }
}

/// Parameters for the spine tracer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SpineConfigFields")]
pub struct SpineConfig {
    closeness_tolerance: f64,
    min_similarity: f64,
}

#[derive(Deserialize)]
struct SpineConfigFields {
    closeness_tolerance: f64,
    min_similarity: f64,
}

impl TryFrom<SpineConfigFields> for SpineConfig {
    type Error = PipelineError;

    fn try_from(fields: SpineConfigFields) -> Result<Self, Self::Error> {
        Self::try_new(fields.closeness_tolerance, fields.min_similarity)
    }
}

impl SpineConfig {
    /// Default extra slack, in pixels, allowed between two adjacent disks.
    pub const DEFAULT_CLOSENESS_TOLERANCE: f64 = 10.0;
    /// Default cosine-similarity threshold for directional continuity.
    pub const DEFAULT_MIN_SIMILARITY: f64 = 0.5;

    /// Validate and build a tracer configuration.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] if `closeness_tolerance`
    /// is not a finite positive value or `min_similarity` lies outside
    /// `[-1, 1]`.
    pub fn try_new(closeness_tolerance: f64, min_similarity: f64) -> Result<Self, PipelineError> {
        if !closeness_tolerance.is_finite() || closeness_tolerance <= 0.0 {
            return Err(PipelineError::InvalidConfig(format!(
                "closeness_tolerance must be a finite value > 0, got {closeness_tolerance}"
            )));
        }
        if !(-1.0..=1.0).contains(&min_similarity) {
            return Err(PipelineError::InvalidConfig(format!(
                "min_similarity must lie in [-1, 1], got {min_similarity}"
            )));
        }
        Ok(Self {
            closeness_tolerance,
            min_similarity,
        })
    }

    /// Extra slack in pixels beyond the sum of two radii.
    #[must_use]
    pub const fn closeness_tolerance(&self) -> f64 {
        self.closeness_tolerance
    }

    /// Cosine-similarity threshold, compared with strict `>`.
    #[must_use]
    pub const fn min_similarity(&self) -> f64 {
        self.min_similarity
    }
}

impl Default for SpineConfig {
    fn default() -> Self {
        Self {
            closeness_tolerance: Self::DEFAULT_CLOSENESS_TOLERANCE,
            min_similarity: Self::DEFAULT_MIN_SIMILARITY,
        }
    }
}

/// Configuration for one [`process`](crate::process) call.
///
/// The component configs are validated on construction, so any value of
/// this struct is usable as-is.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Disk packer parameters.
    pub pack: PackConfig,
    /// Spine tracer parameters; `None` skips spine tracing.
    pub spine: Option<SpineConfig>,
    /// Append `-P_<plane>` to every generated name in stack processing.
    pub append_position_to_name: bool,
}

/// Result of processing one mask plane.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessResult {
    /// Disks in discovery order (largest first).
    pub disks: Vec<Disk>,
    /// Spine stage outcome.
    pub spine: SpineOutcome,
    /// Dimensions of the source mask in pixels.
    pub dimensions: Dimensions,
    /// 1-based plane index when produced by stack processing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slice: Option<usize>,
}

impl ProcessResult {
    /// Stamp this result, and every disk, spine and spine part in it,
    /// with the 1-based plane `index`.
    ///
    /// With `append_position`, `-P_<index>` is also appended to every
    /// name. Unnamed disks stay unnamed.
    pub fn stamp_slice(&mut self, index: usize, append_position: bool) {
        let suffix = format!("-P_{index}");
        self.slice = Some(index);
        for disk in &mut self.disks {
            disk.slice = Some(index);
            if append_position && let Some(name) = disk.name.as_mut() {
                name.push_str(&suffix);
            }
        }
        if let SpineOutcome::Traced(spine) = &mut self.spine {
            spine.slice = Some(index);
            if append_position {
                spine.name.push_str(&suffix);
            }
            for part in &mut spine.parts {
                part.slice = Some(index);
                if append_position {
                    part.name.push_str(&suffix);
                }
            }
        }
    }
}

/// Errors that can occur while preparing pipeline input.
///
/// Algorithmic outcomes (empty disk sets, missing spines) are not errors;
/// see [`SpineOutcome`].
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Failed to decode the input image.
    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    /// The input image bytes were empty.
    #[error("input image data is empty")]
    EmptyInput,

    /// Configuration is invalid.
    #[error("invalid pipeline configuration: {0}")]
    InvalidConfig(String),
}

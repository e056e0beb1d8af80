//! SVG export serializer.
//!
//! Renders one [`ProcessResult`] as an SVG document built with the
//! [`svg`] crate. The `viewBox` matches the source mask's pixel grid, so
//! disk and spine coordinates are emitted unchanged.
//!
//! Layout of the document:
//!
//! - optional `<title>` and `<desc>` from [`SvgMetadata`]
//! - `<g id="disks">` with one `<circle>` per disk
//! - `<g id="spine">` with the spine as one `<path>` followed by one
//!   `<line>` per spine part (connectors and boundary extensions in
//!   different colours)
//!
//! This is a pure function with no I/O -- it returns a `String`.

use svg::Document;
use svg::node::element::path::Data;
use svg::node::element::{Circle, Description, Group, Line, Path, Title};
use svg::node::{Text, Value};

use maxdisk_pipeline::{Polyline, ProcessResult, SpinePartKind};

/// Stroke colour of disk outlines.
pub const DISK_COLOR: &str = "#00b0ff";

/// Stroke colour of the spine polyline.
pub const SPINE_COLOR: &str = "#000000";

/// Stroke colour of connector parts.
pub const CONNECTOR_COLOR: &str = "#80ff80";

/// Stroke colour of boundary extension parts.
pub const EXTENSION_COLOR: &str = "#ff0000";

/// Metadata to embed in the SVG document.
///
/// When present, a `<title>` and/or `<desc>` element is emitted right
/// after the opening `<svg>` tag. Text is XML-escaped by the `svg` crate.
#[derive(Debug, Clone, Default)]
pub struct SvgMetadata<'a> {
    /// Document title, typically the source mask's file stem.
    pub title: Option<&'a str>,

    /// Document description, typically the packing parameters.
    pub description: Option<&'a str>,
}

/// Build an SVG path `d` attribute string from a polyline.
///
/// Uses `M` for the first point and `L` for the rest. Returns an empty
/// string for polylines with fewer than 2 points.
///
/// # Examples
///
/// ```
/// use maxdisk_pipeline::{Point, Polyline};
/// use maxdisk_export::build_path_data;
///
/// let polyline = Polyline::new(vec![
///     Point::new(10.0, 20.0),
///     Point::new(30.5, 40.0),
/// ]);
/// assert_eq!(build_path_data(&polyline), "M10,20 L30.5,40");
/// ```
#[must_use]
pub fn build_path_data(polyline: &Polyline) -> String {
    let points = polyline.points();
    if points.len() < 2 {
        return String::new();
    }

    let first = &points[0];
    let mut data = Data::new().move_to((first.x, first.y));
    for p in &points[1..] {
        data = data.line_to((p.x, p.y));
    }
    String::from(Value::from(data))
}

/// Serialize disks and spine of one processed plane into an SVG string.
///
/// Each disk becomes a `<circle>` carrying its name as a `<title>`
/// child. A traced spine adds a `<path>` and one `<line>` per part:
/// connectors in [`CONNECTOR_COLOR`], boundary extensions in
/// [`EXTENSION_COLOR`]. Without a traced spine the `spine` group is
/// omitted.
///
/// # Examples
///
/// ```
/// use maxdisk_pipeline::{Dimensions, Disk, Point, ProcessResult, SpineOutcome};
/// use maxdisk_export::{SvgMetadata, to_svg};
///
/// let result = ProcessResult {
///     disks: vec![Disk::new(Point::new(50.0, 40.0), 12.5)],
///     spine: SpineOutcome::NotRequested,
///     dimensions: Dimensions { width: 100, height: 80 },
///     slice: None,
/// };
/// let metadata = SvgMetadata {
///     title: Some("blob"),
///     ..SvgMetadata::default()
/// };
/// let svg = to_svg(&result, &metadata);
/// assert!(svg.contains("<title>blob</title>"));
/// assert!(svg.contains(r#"viewBox="0 0 100 80""#));
/// assert!(svg.contains("<circle"));
/// ```
#[must_use]
pub fn to_svg(result: &ProcessResult, metadata: &SvgMetadata<'_>) -> String {
    let w = result.dimensions.width;
    let h = result.dimensions.height;
    let mut doc = Document::new()
        .set("width", w)
        .set("height", h)
        .set("viewBox", (0, 0, w, h));

    if let Some(title) = metadata.title {
        doc = doc.add(Title::new(title));
    }
    if let Some(description) = metadata.description {
        doc = doc.add(Description::new().add(Text::new(description)));
    }

    let mut disks = Group::new().set("id", "disks");
    for disk in &result.disks {
        let mut circle = Circle::new()
            .set("cx", disk.center.x)
            .set("cy", disk.center.y)
            .set("r", disk.radius)
            .set("fill", "none")
            .set("stroke", DISK_COLOR)
            .set("stroke-width", 1);
        if let Some(name) = &disk.name {
            circle = circle.add(Title::new(name.as_str()));
        }
        disks = disks.add(circle);
    }
    doc = doc.add(disks);

    if let Some(spine) = result.spine.spine() {
        let mut group = Group::new().set("id", "spine");

        let d = build_path_data(&spine.polyline);
        if !d.is_empty() {
            group = group.add(
                Path::new()
                    .set("d", d)
                    .set("fill", "none")
                    .set("stroke", SPINE_COLOR)
                    .set("stroke-width", 1)
                    .add(Title::new(spine.name.as_str())),
            );
        }

        for part in &spine.parts {
            let color = match part.kind {
                SpinePartKind::Connector => CONNECTOR_COLOR,
                SpinePartKind::Extension => EXTENSION_COLOR,
            };
            group = group.add(
                Line::new()
                    .set("x1", part.from.x)
                    .set("y1", part.from.y)
                    .set("x2", part.to.x)
                    .set("y2", part.to.y)
                    .set("stroke", color)
                    .set("stroke-width", 1),
            );
        }
        doc = doc.add(group);
    }

    // The svg crate omits the XML declaration.
    format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{doc}\n")
}

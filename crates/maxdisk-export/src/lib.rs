//! maxdisk-export: Pure format serializers (sans-IO)
//!
//! Converts packing results into output formats: SVG drawings, raster
//! overlays and CSV results tables.

pub mod csv;
pub mod overlay;
pub mod svg;

pub use csv::to_csv;
pub use overlay::render_overlay;
pub use svg::{SvgMetadata, build_path_data, to_svg};

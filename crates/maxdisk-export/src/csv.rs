//! Results table export.
//!
//! One CSV document covering every processed plane: a disk table
//! (`name,slice,x,y,radius,diameter`) followed by a blank line and a
//! spine table (`name,slice,length,width`). The spine table is omitted
//! when no plane produced a spine. An unstamped result leaves the
//! `slice` column empty.

use std::fmt::Write;

use maxdisk_pipeline::ProcessResult;

/// Header row of the disk table.
pub const DISK_HEADER: &str = "name,slice,x,y,radius,diameter";

/// Header row of the spine table.
pub const SPINE_HEADER: &str = "name,slice,length,width";

/// Serialize the disks and spines of `results` as CSV.
///
/// Coordinates and lengths are written with three decimals. Unnamed
/// disks get their default `Circle-r_<radius>` name.
#[must_use]
pub fn to_csv(results: &[ProcessResult]) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "{DISK_HEADER}");
    for result in results {
        for disk in &result.disks {
            let name = disk
                .name
                .clone()
                .unwrap_or_else(|| maxdisk_pipeline::Disk::default_name(disk.radius));
            let _ = writeln!(
                out,
                "{},{},{:.3},{:.3},{:.3},{:.3}",
                escape(&name),
                slice_field(disk.slice.or(result.slice)),
                disk.center.x,
                disk.center.y,
                disk.radius,
                disk.diameter(),
            );
        }
    }

    let spines: Vec<_> = results
        .iter()
        .filter_map(|r| r.spine.spine().map(|s| (r, s)))
        .collect();
    if !spines.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "{SPINE_HEADER}");
        for (result, spine) in spines {
            let _ = writeln!(
                out,
                "{},{},{:.3},{:.3}",
                escape(&spine.name),
                slice_field(spine.slice.or(result.slice)),
                spine.length(),
                spine.width,
            );
        }
    }

    out
}

fn slice_field(slice: Option<usize>) -> String {
    slice.map_or_else(String::new, |s| s.to_string())
}

/// Quote a field containing a delimiter, quote or line break.
fn escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

//! Report writers
//!
//! Consumers of the manifest snapshot only: `manifest.json` (structured),
//! `report.csv` (tabular), and `report.md` (human summary), all written into
//! the output root after the run finishes.

mod csv;
mod json;
mod markdown;

pub use csv::write_report_csv;
pub use json::write_manifest_json;
pub use markdown::write_markdown_report;

use crate::archive::ArchiveTimestamp;
use crate::manifest::ManifestRecord;
use crate::Result;
use std::path::Path;

/// Writes the full report set into the output root.
pub fn write_reports(
    output_root: &Path,
    domain: &str,
    cutoff: &ArchiveTimestamp,
    records: &[ManifestRecord],
) -> Result<()> {
    write_manifest_json(&output_root.join("manifest.json"), domain, cutoff, records)?;
    write_report_csv(&output_root.join("report.csv"), records)?;
    write_markdown_report(&output_root.join("report.md"), domain, cutoff, records)?;
    Ok(())
}

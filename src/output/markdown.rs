//! Human-readable run report

use crate::archive::ArchiveTimestamp;
use crate::manifest::{ManifestRecord, Outcome};
use crate::pipeline::MirrorSummary;
use crate::Result;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writes the markdown summary report.
pub fn write_markdown_report(
    path: &Path,
    domain: &str,
    cutoff: &ArchiveTimestamp,
    records: &[ManifestRecord],
) -> Result<()> {
    let markdown = format_markdown_report(domain, cutoff, records);

    let mut file = File::create(path)?;
    file.write_all(markdown.as_bytes())?;
    Ok(())
}

/// Formats the report as markdown.
pub fn format_markdown_report(
    domain: &str,
    cutoff: &ArchiveTimestamp,
    records: &[ManifestRecord],
) -> String {
    let summary = MirrorSummary::from_records(records);
    let mut md = String::new();

    md.push_str("# Wayback Mirror Report\n\n");
    md.push_str(&format!("- Domain: `{}`\n", domain));
    md.push_str(&format!("- Cutoff: `{}`\n", cutoff));
    md.push_str(&format!("- Units processed: `{}`\n", summary.processed()));
    md.push_str(&format!(
        "- Written: `{}`  Partial: `{}`  Failed: `{}`\n",
        summary.written, summary.partial, summary.failed
    ));
    md.push_str(&format!("- Bytes written: `{}`\n\n", summary.total_bytes));

    if summary.failed > 0 {
        md.push_str("## Failures\n\n");
        for record in records {
            if let Outcome::Failed(kind) = record.outcome {
                md.push_str(&format!(
                    "- {}  kind: {}  detail: {}\n",
                    record.url,
                    kind,
                    record.error.as_deref().unwrap_or("-")
                ));
            }
        }
        md.push_str("\nSee `report.csv` and `manifest.json` for details.\n");
    }

    md
}

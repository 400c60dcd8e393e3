use crate::manifest::ManifestRecord;
use crate::Result;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Writes the tabular report, one row per manifest record in completion
/// order.
pub fn write_report_csv(path: &Path, records: &[ManifestRecord]) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);

    writeln!(
        writer,
        "original,local,class,outcome,error-kind,timestamp,size,elapsed-ms,error"
    )?;

    for record in records {
        writeln!(
            writer,
            "{},{},{},{},{},{},{},{},{}",
            escape(&record.url),
            escape(record.local_path.as_deref().unwrap_or("")),
            record.class,
            record.outcome.label(),
            escape(record.error_kind.as_deref().unwrap_or("")),
            record
                .timestamp
                .as_ref()
                .map(|t| t.as_str())
                .unwrap_or(""),
            record.size,
            record.elapsed_ms,
            escape(record.error.as_deref().unwrap_or("")),
        )?;
    }

    writer.flush()?;
    Ok(())
}

/// Quotes a field when it contains CSV metacharacters.
fn escape(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

use crate::archive::ArchiveTimestamp;
use crate::manifest::ManifestRecord;
use crate::Result;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

#[derive(Serialize)]
struct ManifestDocument<'a> {
    domain: &'a str,
    #[serde(rename = "cutoff-ts")]
    cutoff_ts: &'a str,
    #[serde(rename = "generated-at")]
    generated_at: String,
    pages: &'a [ManifestRecord],
}

/// Writes the structured manifest artifact.
pub fn write_manifest_json(
    path: &Path,
    domain: &str,
    cutoff: &ArchiveTimestamp,
    records: &[ManifestRecord],
) -> Result<()> {
    let document = ManifestDocument {
        domain,
        cutoff_ts: cutoff.as_str(),
        generated_at: chrono::Utc::now().to_rfc3339(),
        pages: records,
    };

    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, &document)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontier::ResourceClass;
    use crate::manifest::Outcome;
    use tempfile::TempDir;

    #[test]
    fn test_manifest_json_roundtrips() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("manifest.json");
        let cutoff = ArchiveTimestamp::parse("20230101235959").unwrap();

        let records = vec![ManifestRecord {
            url: "https://example.org/".to_string(),
            local_path: Some("index.html".to_string()),
            class: ResourceClass::Html,
            outcome: Outcome::Written,
            error_kind: None,
            error: None,
            timestamp: Some(ArchiveTimestamp::parse("20221201000000").unwrap()),
            size: 123,
            elapsed_ms: 45,
            digest: Some("ab".repeat(32)),
        }];

        write_manifest_json(&path, "example.org", &cutoff, &records).unwrap();

        let parsed: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed["domain"], "example.org");
        assert_eq!(parsed["cutoff-ts"], "20230101235959");
        assert_eq!(parsed["pages"][0]["local"], "index.html");
        assert_eq!(parsed["pages"][0]["outcome"], "written");
        assert_eq!(parsed["pages"][0]["timestamp"], "20221201000000");
    }
}

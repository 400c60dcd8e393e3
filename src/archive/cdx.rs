//! Capture index (CDX) client
//!
//! The index is queried per URL with an inclusive upper timestamp bound. The
//! response is a JSON array of arrays whose first row names the columns;
//! parsing is header-driven so servers that omit optional columns (such as
//! `redirect`) still round-trip.

use crate::archive::ArchiveTimestamp;
use crate::{MirrorError, Result};
use reqwest::Client;

/// Columns requested from the capture index.
const CDX_FIELDS: &str = "timestamp,original,mimetype,statuscode,redirect";

/// One capture row from the index.
#[derive(Debug, Clone)]
pub struct CdxRow {
    /// When the capture was taken.
    pub timestamp: ArchiveTimestamp,

    /// The originally archived URL.
    pub original: String,

    /// Recorded MIME type, if the index supplied one.
    pub mimetype: Option<String>,

    /// HTTP status recorded at capture time. Revisit records carry none.
    pub statuscode: Option<u16>,

    /// Redirect target when the capture itself is a redirect record.
    pub redirect: Option<String>,
}

impl CdxRow {
    /// True when the recorded status is a client or server error.
    ///
    /// An absent status (revisit records report `-`) counts as non-error;
    /// the fetch decides the final outcome.
    pub fn is_error_status(&self) -> bool {
        matches!(self.statuscode, Some(s) if s >= 400)
    }

    /// True when this capture is a redirect alias to another archived URL.
    pub fn is_redirect(&self) -> bool {
        self.redirect.is_some() || matches!(self.statuscode, Some(s) if (300..400).contains(&s))
    }
}

/// Client for the archive's capture index endpoint.
pub struct CdxClient {
    client: Client,
    endpoint: String,
}

impl CdxClient {
    /// Creates a client against an archive base URL
    /// (e.g. `https://web.archive.org`).
    pub fn new(client: Client, archive_base: &str) -> Self {
        Self {
            client,
            endpoint: format!("{}/cdx/search/cdx", archive_base.trim_end_matches('/')),
        }
    }

    /// Returns all captures of `url` taken at or before `to`, oldest first.
    pub async fn captures(&self, url: &str, to: &ArchiveTimestamp) -> Result<Vec<CdxRow>> {
        tracing::debug!("CDX query: {} to={}", url, to);

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("url", url),
                ("output", "json"),
                ("to", to.as_str()),
                ("fl", CDX_FIELDS),
            ])
            .send()
            .await
            .map_err(|e| classify_request_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MirrorError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }

        let rows: Vec<Vec<String>> = serde_json::from_str(&text)
            .map_err(|e| MirrorError::CdxFormat(format!("invalid JSON: {}", e)))?;

        parse_rows(rows)
    }
}

fn classify_request_error(url: &str, e: reqwest::Error) -> MirrorError {
    if e.is_timeout() {
        MirrorError::Timeout {
            url: url.to_string(),
        }
    } else {
        MirrorError::Network {
            url: url.to_string(),
            source: e,
        }
    }
}

/// Parses header-row JSON into capture rows.
fn parse_rows(rows: Vec<Vec<String>>) -> Result<Vec<CdxRow>> {
    let mut iter = rows.into_iter();
    let header = match iter.next() {
        Some(h) => h,
        None => return Ok(Vec::new()),
    };

    let col = |name: &str| header.iter().position(|h| h == name);
    let ts_col = col("timestamp")
        .ok_or_else(|| MirrorError::CdxFormat("missing timestamp column".to_string()))?;
    let orig_col = col("original")
        .ok_or_else(|| MirrorError::CdxFormat("missing original column".to_string()))?;
    let mime_col = col("mimetype");
    let status_col = col("statuscode");
    let redirect_col = col("redirect");

    let field = |row: &[String], idx: Option<usize>| -> Option<String> {
        idx.and_then(|i| row.get(i))
            .filter(|v| !v.is_empty() && *v != "-")
            .cloned()
    };

    let mut captures = Vec::new();
    for row in iter {
        let ts = match row.get(ts_col) {
            Some(ts) => ts,
            None => continue,
        };
        let timestamp = match ArchiveTimestamp::parse(ts) {
            Ok(t) => t,
            Err(_) => {
                tracing::warn!("Skipping capture row with malformed timestamp '{}'", ts);
                continue;
            }
        };
        let original = match row.get(orig_col) {
            Some(o) if !o.is_empty() => o.clone(),
            _ => continue,
        };

        captures.push(CdxRow {
            timestamp,
            original,
            mimetype: field(&row, mime_col),
            statuscode: field(&row, status_col).and_then(|s| s.parse().ok()),
            redirect: field(&row, redirect_col),
        });
    }

    Ok(captures)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(json: &str) -> Vec<Vec<String>> {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_parse_full_rows() {
        let parsed = parse_rows(rows(
            r#"[["timestamp","original","mimetype","statuscode","redirect"],
                ["20221201000000","https://example.org/","text/html","200","-"],
                ["20221115000000","https://example.org/about","text/html","404","-"]]"#,
        ))
        .unwrap();

        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].timestamp.as_str(), "20221201000000");
        assert_eq!(parsed[0].statuscode, Some(200));
        assert!(parsed[0].redirect.is_none());
        assert!(!parsed[0].is_error_status());
        assert!(parsed[1].is_error_status());
    }

    #[test]
    fn test_parse_missing_optional_columns() {
        let parsed = parse_rows(rows(
            r#"[["timestamp","original"],
                ["20221201000000","https://example.org/"]]"#,
        ))
        .unwrap();

        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].statuscode, None);
        assert!(!parsed[0].is_error_status());
    }

    #[test]
    fn test_parse_redirect_row() {
        let parsed = parse_rows(rows(
            r#"[["timestamp","original","statuscode","redirect"],
                ["20221201000000","https://example.org/old","301","https://example.org/new"]]"#,
        ))
        .unwrap();

        assert!(parsed[0].is_redirect());
        assert_eq!(
            parsed[0].redirect.as_deref(),
            Some("https://example.org/new")
        );
    }

    #[test]
    fn test_parse_dash_status_is_none() {
        let parsed = parse_rows(rows(
            r#"[["timestamp","original","statuscode"],
                ["20221201000000","https://example.org/","-"]]"#,
        ))
        .unwrap();

        assert_eq!(parsed[0].statuscode, None);
    }

    #[test]
    fn test_parse_skips_malformed_timestamp() {
        let parsed = parse_rows(rows(
            r#"[["timestamp","original"],
                ["bogus","https://example.org/"],
                ["20221201000000","https://example.org/"]]"#,
        ))
        .unwrap();

        assert_eq!(parsed.len(), 1);
    }

    #[test]
    fn test_parse_empty_input() {
        assert!(parse_rows(Vec::new()).unwrap().is_empty());
    }

    #[test]
    fn test_parse_header_only() {
        let parsed = parse_rows(rows(r#"[["timestamp","original"]]"#)).unwrap();
        assert!(parsed.is_empty());
    }

    #[test]
    fn test_missing_timestamp_column_is_error() {
        let result = parse_rows(rows(r#"[["original"],["https://example.org/"]]"#));
        assert!(matches!(result, Err(MirrorError::CdxFormat(_))));
    }
}

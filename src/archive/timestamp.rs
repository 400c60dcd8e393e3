use crate::{ConfigError, ConfigResult};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A 14-digit archive timestamp (`YYYYMMDDhhmmss`).
///
/// Stored in its wire form; digit strings of equal length compare
/// lexicographically in chronological order, so the derived `Ord` is the
/// temporal order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArchiveTimestamp(String);

impl ArchiveTimestamp {
    /// Parses an exact 14-digit timestamp.
    pub fn parse(ts: &str) -> ConfigResult<Self> {
        if ts.len() == 14 && ts.bytes().all(|b| b.is_ascii_digit()) {
            Ok(Self(ts.to_string()))
        } else {
            Err(ConfigError::InvalidTimestamp(format!(
                "expected 14 digits (YYYYMMDDhhmmss), got '{}'",
                ts
            )))
        }
    }

    /// Parses a cutoff date (`YYYY-MM-DD` or `YYYYMMDD`), interpreted as the
    /// end of that day so every capture on the date itself is eligible.
    pub fn from_cutoff_date(date: &str) -> ConfigResult<Self> {
        let parsed = NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .or_else(|_| NaiveDate::parse_from_str(date, "%Y%m%d"))
            .map_err(|_| {
                ConfigError::InvalidTimestamp(format!(
                    "expected YYYY-MM-DD or YYYYMMDD, got '{}'",
                    date
                ))
            })?;

        Ok(Self(format!("{}235959", parsed.format("%Y%m%d"))))
    }

    /// Returns the timestamp in wire form.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the date portion as `YYYY-MM-DD` (used in the banner and the
    /// default output directory name).
    pub fn date_ymd(&self) -> String {
        format!("{}-{}-{}", &self.0[0..4], &self.0[4..6], &self.0[6..8])
    }

    /// Returns the date portion as `YYYYMMDD`.
    pub fn date_compact(&self) -> &str {
        &self.0[0..8]
    }
}

impl fmt::Display for ArchiveTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_exact() {
        let ts = ArchiveTimestamp::parse("20221201000000").unwrap();
        assert_eq!(ts.as_str(), "20221201000000");
    }

    #[test]
    fn test_parse_rejects_short() {
        assert!(ArchiveTimestamp::parse("2022").is_err());
    }

    #[test]
    fn test_parse_rejects_non_digits() {
        assert!(ArchiveTimestamp::parse("2022120100000x").is_err());
    }

    #[test]
    fn test_cutoff_date_dashed() {
        let ts = ArchiveTimestamp::from_cutoff_date("2023-01-01").unwrap();
        assert_eq!(ts.as_str(), "20230101235959");
    }

    #[test]
    fn test_cutoff_date_compact() {
        let ts = ArchiveTimestamp::from_cutoff_date("20230101").unwrap();
        assert_eq!(ts.as_str(), "20230101235959");
    }

    #[test]
    fn test_cutoff_date_invalid() {
        assert!(ArchiveTimestamp::from_cutoff_date("not-a-date").is_err());
        assert!(ArchiveTimestamp::from_cutoff_date("2023-13-40").is_err());
    }

    #[test]
    fn test_ordering_is_chronological() {
        let older = ArchiveTimestamp::parse("20221115000000").unwrap();
        let newer = ArchiveTimestamp::parse("20221201000000").unwrap();
        assert!(older < newer);
    }

    #[test]
    fn test_date_ymd() {
        let ts = ArchiveTimestamp::parse("20221201123456").unwrap();
        assert_eq!(ts.date_ymd(), "2022-12-01");
        assert_eq!(ts.date_compact(), "20221201");
    }
}

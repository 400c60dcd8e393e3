//! Per-unit manifest records and the completion-ordered aggregator
//!
//! One immutable record per crawl unit that ever left the initial state.
//! The aggregate order is completion order, not discovery order; reporting
//! collaborators consume snapshots and never mutate past records.

use crate::archive::ArchiveTimestamp;
use crate::frontier::ResourceClass;
use crate::MirrorError;
use serde::{Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::Mutex;

/// Why a unit failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The archive has no capture at or before the cutoff
    NotArchived,
    /// Redirect-alias resolution exceeded the hop bound
    RedirectLoop,
    /// The fetch timed out on every attempt
    Timeout,
    /// Network-level failure after retries were exhausted
    Network,
    /// The archive replayed an error status for the chosen capture
    Http(u16),
    /// The unit's file could not be written
    Io,
}

impl FailureKind {
    /// Maps a unit-processing error to its manifest kind. Returns `None`
    /// for errors that are not per-unit failures (IO, config).
    pub fn from_error(err: &MirrorError) -> Option<Self> {
        match err {
            MirrorError::NotArchived { .. } => Some(Self::NotArchived),
            MirrorError::RedirectLoop { .. } => Some(Self::RedirectLoop),
            MirrorError::Timeout { .. } => Some(Self::Timeout),
            MirrorError::Network { .. } => Some(Self::Network),
            MirrorError::Reqwest(_) => Some(Self::Network),
            MirrorError::HttpStatus { status, .. } => Some(Self::Http(*status)),
            MirrorError::Io(_) => Some(Self::Io),
            _ => None,
        }
    }

    /// Stable label for reports.
    pub fn label(&self) -> String {
        match self {
            Self::NotArchived => "not-archived".to_string(),
            Self::RedirectLoop => "redirect-loop".to_string(),
            Self::Timeout => "timeout".to_string(),
            Self::Network => "network".to_string(),
            Self::Http(status) => format!("http-{}", status),
            Self::Io => "io".to_string(),
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Terminal outcome of a crawl unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Fetched, rewritten where applicable, and written to disk
    Written,
    /// Written verbatim because rewriting failed; the bytes are preserved
    Partial,
    /// Not written (or written state is unusable); carries the reason
    Failed(FailureKind),
}

impl Outcome {
    /// True for outcomes that produced a usable local file.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Written | Self::Partial)
    }

    /// Stable label for reports.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Written => "written",
            Self::Partial => "partial",
            Self::Failed(_) => "failed",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Failed(kind) => write!(f, "failed({})", kind),
            other => write!(f, "{}", other.label()),
        }
    }
}

impl Serialize for Outcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// Immutable record of one processed unit.
#[derive(Debug, Clone, Serialize)]
pub struct ManifestRecord {
    /// The original URL.
    pub url: String,

    /// Output-root-relative path, when a file was written.
    #[serde(rename = "local")]
    pub local_path: Option<String>,

    /// Resource class.
    pub class: ResourceClass,

    /// Terminal outcome.
    pub outcome: Outcome,

    /// Failure reason label, when failed.
    #[serde(rename = "error-kind")]
    pub error_kind: Option<String>,

    /// Human-readable error detail, when failed.
    pub error: Option<String>,

    /// Chosen capture timestamp, when resolution succeeded.
    pub timestamp: Option<ArchiveTimestamp>,

    /// Body size in bytes.
    pub size: u64,

    /// Wall time spent fetching, in milliseconds.
    #[serde(rename = "elapsed-ms")]
    pub elapsed_ms: u64,

    /// SHA-256 of the written bytes.
    pub digest: Option<String>,
}

impl ManifestRecord {
    /// Hex SHA-256 digest of mirrored content.
    pub fn digest_of(bytes: &[u8]) -> String {
        hex::encode(Sha256::digest(bytes))
    }
}

/// Collects manifest records in completion order.
#[derive(Debug, Default)]
pub struct ManifestAggregator {
    records: Mutex<Vec<ManifestRecord>>,
}

impl ManifestAggregator {
    /// Creates an empty aggregator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one record. Insertion order is completion order.
    pub fn record(&self, record: ManifestRecord) {
        let mut records = self.records.lock().unwrap();
        records.push(record);
    }

    /// Returns a copy of all records in completion order.
    pub fn snapshot(&self) -> Vec<ManifestRecord> {
        self.records.lock().unwrap().clone()
    }

    /// Number of records so far.
    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    /// True when nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

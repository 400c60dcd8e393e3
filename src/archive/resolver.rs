//! Snapshot resolution: URL + cutoff -> chosen capture
//!
//! The selection rule is "freshest-good, else freshest-any": among captures
//! at or before the cutoff, prefer the latest whose recorded status is not a
//! 4xx/5xx; only when every eligible capture is an error capture fall back
//! to the latest of any status. This intentionally differs from plain
//! "always freshest": the most recent capture may itself be a stored error
//! page while an older good capture exists.

use crate::archive::{ArchiveTimestamp, CdxClient, CdxRow};
use crate::{MirrorError, Result};
use url::Url;

/// The capture chosen for a URL, consumed by one fetch.
#[derive(Debug, Clone)]
pub struct CaptureDescriptor {
    /// Timestamp of the chosen capture.
    pub timestamp: ArchiveTimestamp,

    /// The archived URL the capture belongs to.
    pub original: String,

    /// Status recorded by the archive, when known.
    pub status: Option<u16>,

    /// Target URL when the capture is a redirect alias.
    pub redirect: Option<String>,
}

/// Resolves live URLs to archived captures.
pub struct SnapshotResolver {
    cdx: CdxClient,
    cutoff: ArchiveTimestamp,
    exact: Option<ArchiveTimestamp>,
}

impl SnapshotResolver {
    /// Creates a resolver for one run.
    ///
    /// When `exact` is given it takes precedence over cutoff-based search:
    /// every URL resolves directly to that timestamp without consulting the
    /// capture index.
    pub fn new(cdx: CdxClient, cutoff: ArchiveTimestamp, exact: Option<ArchiveTimestamp>) -> Self {
        Self { cdx, cutoff, exact }
    }

    /// The cutoff this resolver selects against.
    pub fn cutoff(&self) -> &ArchiveTimestamp {
        &self.cutoff
    }

    /// Picks the capture for `url`, failing with `NotArchived` when the
    /// index has nothing at or before the cutoff.
    pub async fn resolve(&self, url: &Url) -> Result<CaptureDescriptor> {
        if let Some(exact) = &self.exact {
            return Ok(CaptureDescriptor {
                timestamp: exact.clone(),
                original: url.as_str().to_string(),
                status: None,
                redirect: None,
            });
        }

        let rows = self.cdx.captures(url.as_str(), &self.cutoff).await?;

        let chosen = select_capture(&rows, &self.cutoff).ok_or_else(|| MirrorError::NotArchived {
            url: url.as_str().to_string(),
        })?;

        tracing::debug!(
            "Resolved {} -> {} (status {:?})",
            url,
            chosen.timestamp,
            chosen.statuscode
        );

        Ok(CaptureDescriptor {
            timestamp: chosen.timestamp.clone(),
            original: chosen.original.clone(),
            status: chosen.statuscode,
            redirect: chosen.redirect.clone(),
        })
    }
}

/// Applies the freshest-good-else-freshest-any rule over capture rows.
///
/// Rows after the cutoff are ignored even if the index returned them.
pub fn select_capture<'a>(rows: &'a [CdxRow], cutoff: &ArchiveTimestamp) -> Option<&'a CdxRow> {
    let eligible = || rows.iter().filter(|r| &r.timestamp <= cutoff);

    eligible()
        .filter(|r| !r.is_error_status())
        .max_by(|a, b| a.timestamp.cmp(&b.timestamp))
        .or_else(|| eligible().max_by(|a, b| a.timestamp.cmp(&b.timestamp)))
}

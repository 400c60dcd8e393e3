//! Content rewriting: local-mirror references and further discovery
//!
//! Fetched HTML and CSS pass through here once. Every reference is resolved
//! against the page's own URL; in-scope references of an included class are
//! rewritten to the eventual local relative path and reported back for
//! admission into the frontier, while out-of-scope references keep their
//! absolute original target. Non-text resource classes pass through
//! unmodified.

mod css;
mod html;

pub use css::rewrite_css_text;
pub use html::banner_html;

use crate::archive::ArchiveTimestamp;
use crate::frontier::{ResourceClass, ScopeFilter};
use crate::{MirrorError, Result};
use url::Url;

/// A same-scope reference found while rewriting, to be offered to the
/// frontier with the current page as referrer.
#[derive(Debug, Clone)]
pub struct DiscoveredRef {
    /// Absolute resolved URL of the reference.
    pub url: Url,
    /// Class implied by the markup context (or the path, for anchors).
    pub class: ResourceClass,
}

/// Result of rewriting one unit.
#[derive(Debug)]
pub struct RewriteOutput {
    /// Bytes to write under the output root.
    pub bytes: Vec<u8>,
    /// Same-scope references found during the pass.
    pub discovered: Vec<DiscoveredRef>,
}

/// Rewrites fetched units according to the run's scope rules.
pub struct Rewriter {
    scope: ScopeFilter,
    strip_js: bool,
    domain: String,
}

impl Rewriter {
    /// Creates a rewriter for one run.
    pub fn new(scope: ScopeFilter, strip_js: bool, domain: &str) -> Self {
        Self {
            scope,
            strip_js,
            domain: domain.to_string(),
        }
    }

    /// Rewrites one fetched unit.
    ///
    /// HTML gets the full streaming pass (reference rewriting, discovery,
    /// banner injection, optional script stripping); stylesheets get the
    /// `url(...)` pass; everything else is returned unchanged with no
    /// discoveries.
    pub fn rewrite(
        &self,
        class: ResourceClass,
        page_url: &Url,
        capture: &ArchiveTimestamp,
        bytes: &[u8],
    ) -> Result<RewriteOutput> {
        match class {
            ResourceClass::Html => {
                let banner = banner_html(&self.domain, &capture.date_ymd());
                html::rewrite_html(bytes, page_url, &self.scope, self.strip_js, &banner).map_err(
                    |message| MirrorError::Rewrite {
                        url: page_url.as_str().to_string(),
                        message,
                    },
                )
            }
            ResourceClass::Stylesheet => {
                let text = String::from_utf8_lossy(bytes);
                let from_local = crate::url::local_rel_path(page_url);
                let (rewritten, discovered) =
                    rewrite_css_text(&text, page_url, &from_local, &self.scope);
                Ok(RewriteOutput {
                    bytes: rewritten.into_bytes(),
                    discovered,
                })
            }
            _ => Ok(RewriteOutput {
                bytes: bytes.to_vec(),
                discovered: Vec::new(),
            }),
        }
    }
}

//! Crawl unit definitions and lifecycle states

use crate::archive::ArchiveTimestamp;
use crate::url::UrlKey;
use serde::Serialize;
use std::fmt;
use url::Url;

/// Lifecycle state of a crawl unit.
///
/// Units only ever move forward; a terminal state is never re-entered or
/// left. `Failed` is reachable from any non-terminal state after `Queued`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitState {
    /// Admitted by the scope filter but not yet queued
    Discovered,

    /// Waiting to be handed to a worker
    Queued,

    /// A worker is resolving the capture for this unit
    Resolving,

    /// The resolved capture is being fetched
    Fetching,

    /// Fetched bytes are being rewritten
    Rewriting,

    /// Success terminal: the unit's file exists under the output root
    Written,

    /// Failure terminal; the manifest record carries the reason
    Failed,
}

impl UnitState {
    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Written | Self::Failed)
    }

    /// Position in the forward-only ordering.
    fn rank(&self) -> u8 {
        match self {
            Self::Discovered => 0,
            Self::Queued => 1,
            Self::Resolving => 2,
            Self::Fetching => 3,
            Self::Rewriting => 4,
            Self::Written | Self::Failed => 5,
        }
    }

    /// Whether moving to `next` is a legal forward transition.
    pub fn can_transition_to(&self, next: UnitState) -> bool {
        !self.is_terminal() && next.rank() > self.rank()
    }

    /// Stable string form for logs and reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Discovered => "discovered",
            Self::Queued => "queued",
            Self::Resolving => "resolving",
            Self::Fetching => "fetching",
            Self::Rewriting => "rewriting",
            Self::Written => "written",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for UnitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What kind of resource a unit is, as known at discovery time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceClass {
    /// An HTML page
    Html,
    /// A CSS stylesheet
    Stylesheet,
    /// A script file
    Script,
    /// An image (including icons)
    Image,
    /// Any other binary document (PDFs, archives, fonts, ...)
    Document,
}

impl ResourceClass {
    /// Classifies a URL by its path extension. Used for references whose
    /// markup context does not already imply a class (plain anchors).
    pub fn from_url_path(path: &str) -> Self {
        let ext = path
            .rsplit('/')
            .next()
            .and_then(|name| name.rsplit_once('.'))
            .map(|(_, ext)| ext.to_ascii_lowercase());

        match ext.as_deref() {
            Some("css") => Self::Stylesheet,
            Some("js" | "mjs") => Self::Script,
            Some("png" | "jpg" | "jpeg" | "gif" | "svg" | "webp" | "ico" | "bmp" | "avif") => {
                Self::Image
            }
            Some(
                "pdf" | "zip" | "gz" | "tar" | "doc" | "docx" | "xls" | "xlsx" | "ppt" | "pptx"
                | "woff" | "woff2" | "ttf" | "otf" | "eot" | "mp3" | "mp4" | "webm",
            ) => Self::Document,
            _ => Self::Html,
        }
    }

    /// Stable string form for reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Stylesheet => "stylesheet",
            Self::Script => "script",
            Self::Image => "image",
            Self::Document => "document",
        }
    }
}

impl fmt::Display for ResourceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-URL work item owned by the frontier.
#[derive(Debug, Clone)]
pub struct CrawlUnit {
    /// The canonical URL this unit mirrors.
    pub url: Url,

    /// Deduplication identity; never changes after creation.
    pub key: UrlKey,

    /// Link distance from the seed.
    pub depth: u32,

    /// Key of the page that first discovered this unit. Diagnostics only.
    pub referrer: Option<UrlKey>,

    /// Admission sequence number; defines discovery order.
    pub sequence: u64,

    /// Resource class as known at discovery time.
    pub class: ResourceClass,

    /// Current lifecycle state.
    pub state: UnitState,

    /// Chosen capture timestamp, once resolved.
    pub timestamp: Option<ArchiveTimestamp>,

    /// Output-root-relative path, once written.
    pub local_path: Option<String>,

    /// Body size in bytes, once fetched.
    pub size: u64,
}

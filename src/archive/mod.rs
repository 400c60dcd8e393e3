//! Archive access: capture index lookups and snapshot resolution
//!
//! The archive exposes two surfaces the mirror consumes: a capture index
//! (queried by URL, returning timestamped capture rows) and a raw replay
//! endpoint (fetch-by-URL-and-timestamp, handled in [`crate::fetch`]). This
//! module owns the index client and the capture selection policy.

mod cdx;
mod resolver;
mod timestamp;

pub use cdx::{CdxClient, CdxRow};
pub use resolver::{select_capture, CaptureDescriptor, SnapshotResolver};
pub use timestamp::ArchiveTimestamp;

/// Maximum redirect-alias resolution hops before a unit fails.
pub const MAX_REDIRECT_HOPS: u32 = 4;

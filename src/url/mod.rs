//! URL handling for the mirror
//!
//! This module provides canonical URL keys (the frontier's deduplication
//! identity), reference resolution against a base page, and the mapping from
//! archived URLs to local file paths under the output root.

mod canonical;
mod local_path;

pub use canonical::{canonicalize, resolve_reference, UrlKey};
pub use local_path::{local_rel_path, relative_href};

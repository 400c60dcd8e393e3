//! Run configuration
//!
//! A run is fully described by one immutable [`MirrorConfig`]: seed domain,
//! cutoff, scope rules, archive endpoint and politeness budget, and limits.
//! The CLI builds one from flags or loads it from a TOML file; either way it
//! is validated before the frontier starts.

mod parser;
mod types;
mod validation;

pub use parser::load_config;
pub use types::{ArchiveConfig, LimitsConfig, MirrorConfig, ScopeConfig};
pub use validation::validate;

//! Wayback Mirror: a static site reconstructor for web archives
//!
//! This crate rebuilds a browsable offline copy of a website as it existed at
//! a chosen cutoff instant, fetching every page and asset from a web
//! archive's stored captures instead of the live server.

pub mod archive;
pub mod config;
pub mod consolidate;
pub mod fetch;
pub mod frontier;
pub mod manifest;
pub mod output;
pub mod pipeline;
pub mod rewrite;
pub mod url;

use thiserror::Error;

/// Main error type for mirror operations
#[derive(Debug, Error)]
pub enum MirrorError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("No archived capture at or before the cutoff for {url}")]
    NotArchived { url: String },

    #[error("Redirect resolution exceeded {hops} hops starting from {url}")]
    RedirectLoop { url: String, hops: u32 },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Network error for {url}: {source}")]
    Network { url: String, source: reqwest::Error },

    #[error("Archive returned HTTP {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Malformed capture index response: {0}")]
    CdxFormat(String),

    #[error("Rewrite failed for {url}: {message}")]
    Rewrite { url: String, message: String },

    #[error("Invalid state transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: frontier::UnitState,
        to: frontier::UnitState,
    },

    #[error("Unknown crawl unit: {0}")]
    UnknownUnit(String),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,
}

/// Result type alias for mirror operations
pub type Result<T> = std::result::Result<T, MirrorError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use archive::{ArchiveTimestamp, CaptureDescriptor, SnapshotResolver};
pub use config::MirrorConfig;
pub use frontier::{Frontier, ResourceClass, UnitState};
pub use manifest::{FailureKind, ManifestAggregator, ManifestRecord, Outcome};
pub use pipeline::{run_mirror, Coordinator, MirrorRun, MirrorSummary};

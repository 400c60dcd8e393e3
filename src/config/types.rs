use crate::archive::ArchiveTimestamp;
use crate::frontier::ScopeFilter;
use crate::{ConfigError, ConfigResult};
use serde::Deserialize;
use std::path::PathBuf;
use url::Url;

/// Main configuration for one mirror run. Immutable once the run starts.
#[derive(Debug, Clone, Deserialize)]
pub struct MirrorConfig {
    /// Root domain to mirror, e.g. `example.org`.
    pub domain: String,

    /// Cutoff date (`YYYY-MM-DD` or `YYYYMMDD`), interpreted as end of day.
    #[serde(default)]
    pub cutoff: Option<String>,

    /// Exact 14-digit capture timestamp; takes precedence over the cutoff.
    #[serde(rename = "exact-timestamp", default)]
    pub exact_timestamp: Option<String>,

    /// Output directory. Defaults to `{domain}_{YYYYMMDD}`.
    #[serde(rename = "output-dir", default)]
    pub output_dir: Option<PathBuf>,

    #[serde(default)]
    pub scope: ScopeConfig,

    #[serde(default)]
    pub archive: ArchiveConfig,

    #[serde(default)]
    pub limits: LimitsConfig,
}

/// Which URLs are eligible for mirroring.
#[derive(Debug, Clone, Deserialize)]
pub struct ScopeConfig {
    /// Include subdomains of the root domain.
    #[serde(rename = "include-subdomains", default = "default_true")]
    pub include_subdomains: bool,

    /// Only mirror URLs whose path starts with this prefix.
    #[serde(rename = "path-prefix", default)]
    pub path_prefix: Option<String>,

    /// Mirror non-HTML resources (stylesheets, images, documents).
    #[serde(rename = "include-assets", default = "default_true")]
    pub include_assets: bool,

    /// Remove all scripts and inline event handlers.
    #[serde(rename = "strip-js", default)]
    pub strip_js: bool,

    /// Treat URLs differing only in query string as the same unit.
    #[serde(rename = "ignore-query", default)]
    pub ignore_query: bool,
}

/// Archive endpoint and politeness budget.
#[derive(Debug, Clone, Deserialize)]
pub struct ArchiveConfig {
    /// Base URL of the archive (capture index and replay endpoints).
    #[serde(rename = "base-url", default = "default_archive_base")]
    pub base_url: String,

    /// Outbound requests per second, shared by the whole run.
    #[serde(default = "default_rps")]
    pub rps: f64,

    /// Token-bucket burst capacity.
    #[serde(default = "default_burst")]
    pub burst: u32,

    /// Per-request timeout in seconds.
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Run limits.
#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    /// Maximum units to admit (0 = unlimited).
    #[serde(rename = "max-pages", default)]
    pub max_pages: u64,

    /// Concurrent workers.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

fn default_true() -> bool {
    true
}

fn default_archive_base() -> String {
    "https://web.archive.org".to_string()
}

fn default_rps() -> f64 {
    0.5
}

fn default_burst() -> u32 {
    2
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_concurrency() -> usize {
    4
}

impl Default for ScopeConfig {
    fn default() -> Self {
        Self {
            include_subdomains: true,
            path_prefix: None,
            include_assets: true,
            strip_js: false,
            ignore_query: false,
        }
    }
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            base_url: default_archive_base(),
            rps: default_rps(),
            burst: default_burst(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_pages: 0,
            concurrency: default_concurrency(),
        }
    }
}

impl MirrorConfig {
    /// Creates a config with defaults for everything but the domain.
    pub fn new(domain: &str) -> Self {
        Self {
            domain: domain.to_string(),
            cutoff: None,
            exact_timestamp: None,
            output_dir: None,
            scope: ScopeConfig::default(),
            archive: ArchiveConfig::default(),
            limits: LimitsConfig::default(),
        }
    }

    /// The lowercased root domain.
    pub fn root_host(&self) -> String {
        self.domain.to_lowercase()
    }

    /// The cutoff the resolver selects against. When only an exact
    /// timestamp is configured it doubles as the cutoff.
    pub fn cutoff_ts(&self) -> ConfigResult<ArchiveTimestamp> {
        if let Some(cutoff) = &self.cutoff {
            return ArchiveTimestamp::from_cutoff_date(cutoff);
        }
        if let Some(exact) = &self.exact_timestamp {
            return ArchiveTimestamp::parse(exact);
        }
        Err(ConfigError::Validation(
            "either cutoff or exact-timestamp is required".to_string(),
        ))
    }

    /// The exact capture timestamp, when configured.
    pub fn exact_ts(&self) -> ConfigResult<Option<ArchiveTimestamp>> {
        self.exact_timestamp
            .as_deref()
            .map(ArchiveTimestamp::parse)
            .transpose()
    }

    /// The crawl seed: the root of the mirrored domain.
    pub fn seed_url(&self) -> ConfigResult<Url> {
        Url::parse(&format!("https://{}/", self.root_host()))
            .map_err(|e| ConfigError::InvalidUrl(format!("domain '{}': {}", self.domain, e)))
    }

    /// The output root, defaulting to `{domain}_{YYYYMMDD}`.
    pub fn output_root(&self) -> ConfigResult<PathBuf> {
        if let Some(dir) = &self.output_dir {
            return Ok(dir.clone());
        }
        let cutoff = self.cutoff_ts()?;
        Ok(PathBuf::from(format!(
            "{}_{}",
            self.root_host(),
            cutoff.date_compact()
        )))
    }

    /// The admission filter implied by the scope section.
    pub fn scope_filter(&self) -> ScopeFilter {
        ScopeFilter::new(
            &self.root_host(),
            self.scope.include_subdomains,
            self.scope.path_prefix.clone(),
            self.scope.include_assets,
            self.scope.strip_js,
        )
    }
}

//! Wayback Mirror command-line entry point

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use wayback_mirror::config::{load_config, MirrorConfig};
use wayback_mirror::output::write_reports;
use wayback_mirror::Coordinator;

/// Build a browsable static replica of a website from a web archive's
/// captures at or before a cutoff date.
#[derive(Parser, Debug)]
#[command(name = "wayback-mirror")]
#[command(version)]
#[command(about = "Build a static site replica from a web archive", long_about = None)]
struct Cli {
    /// Root domain to mirror, e.g. example.org
    #[arg(value_name = "DOMAIN", required_unless_present = "config")]
    domain: Option<String>,

    /// Cutoff date (YYYY-MM-DD or YYYYMMDD), interpreted as end of day
    #[arg(long)]
    cutoff: Option<String>,

    /// Exact 14-digit capture timestamp; takes precedence over --cutoff
    #[arg(long = "exact-timestamp")]
    exact_timestamp: Option<String>,

    /// Output directory (default: {domain}_{YYYYMMDD})
    #[arg(long)]
    outdir: Option<PathBuf>,

    /// Load the full run configuration from a TOML file instead of flags
    #[arg(long, conflicts_with = "domain")]
    config: Option<PathBuf>,

    /// Do not mirror subdomains
    #[arg(long = "no-subdomains")]
    no_subdomains: bool,

    /// Only mirror URLs whose path starts with this prefix, e.g. /en/
    #[arg(long = "path-prefix")]
    path_prefix: Option<String>,

    /// Remove all scripts and inline event handlers
    #[arg(long = "strip-js")]
    strip_js: bool,

    /// Mirror HTML pages only, skipping stylesheets, images and documents
    #[arg(long = "no-assets")]
    no_assets: bool,

    /// Treat URLs differing only in query string as the same page
    #[arg(long = "ignore-query")]
    ignore_query: bool,

    /// Maximum pages to admit (0 = unlimited)
    #[arg(long = "max-pages", default_value_t = 0)]
    max_pages: u64,

    /// Requests per second toward the archive
    #[arg(long, default_value_t = 0.5)]
    rps: f64,

    /// Rate limiter burst size
    #[arg(long, default_value_t = 2)]
    burst: u32,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 30)]
    timeout: u64,

    /// Concurrent workers
    #[arg(long, default_value_t = 4)]
    concurrency: usize,

    /// Archive base URL (capture index and replay endpoints)
    #[arg(long = "archive-base", default_value = "https://web.archive.org")]
    archive_base: String,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

impl Cli {
    /// Builds the run configuration: either the TOML file as-is, or one
    /// assembled from the flags.
    fn into_config(self) -> anyhow::Result<MirrorConfig> {
        if let Some(path) = &self.config {
            return load_config(path)
                .with_context(|| format!("loading config {}", path.display()));
        }

        let domain = self.domain.context("a domain is required")?;
        let mut config = MirrorConfig::new(&domain);
        config.cutoff = self.cutoff;
        config.exact_timestamp = self.exact_timestamp;
        config.output_dir = self.outdir;
        config.scope.include_subdomains = !self.no_subdomains;
        config.scope.path_prefix = self.path_prefix;
        config.scope.strip_js = self.strip_js;
        config.scope.include_assets = !self.no_assets;
        config.scope.ignore_query = self.ignore_query;
        config.archive.base_url = self.archive_base;
        config.archive.rps = self.rps;
        config.archive.burst = self.burst;
        config.archive.timeout_secs = self.timeout;
        config.limits.max_pages = self.max_pages;
        config.limits.concurrency = self.concurrency;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose, cli.quiet);

    let config = cli.into_config()?;
    let cutoff = config.cutoff_ts().context("resolving cutoff")?;
    let domain = config.root_host();

    let coordinator = Coordinator::new(config)?;

    // An interrupt stops admission and dequeuing; in-flight units finish so
    // no file is left half-written.
    let frontier = coordinator.frontier();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received; finishing in-flight units");
            frontier.halt();
        }
    });

    let summary = coordinator.run().await?;

    let records = coordinator.manifest_snapshot();
    write_reports(coordinator.output_root(), &domain, &cutoff, &records)
        .context("writing reports")?;

    println!(
        "Mirrored {} -> {}: {} written, {} partial, {} failed",
        domain,
        coordinator.output_root().display(),
        summary.written,
        summary.partial,
        summary.failed
    );

    if summary.all_failed() {
        anyhow::bail!("every unit failed; see report.md for details");
    }
    Ok(())
}

/// Maps -v/-q flags onto the tracing filter.
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("wayback_mirror=info,warn"),
            1 => EnvFilter::new("wayback_mirror=debug,info"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

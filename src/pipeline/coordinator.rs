//! Crawl orchestration
//!
//! The coordinator wires the services together, seeds the frontier with the
//! domain root, runs the worker pool to drain, and then runs the stylesheet
//! consolidation pass over the finished tree.

use crate::archive::{CdxClient, SnapshotResolver};
use crate::config::{validate, MirrorConfig};
use crate::consolidate;
use crate::fetch::{build_http_client, Fetcher, TokenBucket};
use crate::frontier::Frontier;
use crate::manifest::{ManifestAggregator, ManifestRecord, Outcome};
use crate::pipeline::worker::{worker_loop, WorkerContext};
use crate::rewrite::Rewriter;
use crate::Result;
use std::path::PathBuf;
use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::Instant;

/// Counts over a finished run's manifest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MirrorSummary {
    /// Units written after full rewriting.
    pub written: u64,
    /// Units written verbatim because rewriting failed.
    pub partial: u64,
    /// Units that produced no usable file.
    pub failed: u64,
    /// Total bytes written.
    pub total_bytes: u64,
}

impl MirrorSummary {
    /// Derives the summary from manifest records.
    pub fn from_records(records: &[ManifestRecord]) -> Self {
        let mut summary = Self::default();
        for record in records {
            match record.outcome {
                Outcome::Written => summary.written += 1,
                Outcome::Partial => summary.partial += 1,
                Outcome::Failed(_) => summary.failed += 1,
            }
            summary.total_bytes += record.size;
        }
        summary
    }

    /// Units that reached a terminal state.
    pub fn processed(&self) -> u64 {
        self.written + self.partial + self.failed
    }

    /// True when the run produced nothing usable at all.
    pub fn all_failed(&self) -> bool {
        self.processed() > 0 && self.written + self.partial == 0
    }
}

/// A finished run: its summary, records, and output location.
#[derive(Debug)]
pub struct MirrorRun {
    /// Aggregate counts.
    pub summary: MirrorSummary,
    /// Manifest records in completion order.
    pub records: Vec<ManifestRecord>,
    /// Where the mirror tree was written.
    pub output_root: PathBuf,
}

/// Owns the services of one run.
pub struct Coordinator {
    config: MirrorConfig,
    output_root: PathBuf,
    frontier: Arc<Frontier>,
    resolver: Arc<SnapshotResolver>,
    fetcher: Arc<Fetcher>,
    rewriter: Arc<Rewriter>,
    manifest: Arc<ManifestAggregator>,
}

impl Coordinator {
    /// Validates the configuration and builds the run's services.
    pub fn new(config: MirrorConfig) -> Result<Self> {
        validate(&config)?;

        let cutoff = config.cutoff_ts()?;
        let exact = config.exact_ts()?;
        let output_root = config.output_root()?;

        let client = build_http_client(Duration::from_secs(config.archive.timeout_secs))?;
        let limiter = Arc::new(TokenBucket::new(config.archive.rps, config.archive.burst));

        let cdx = CdxClient::new(client.clone(), &config.archive.base_url);
        let resolver = Arc::new(SnapshotResolver::new(cdx, cutoff, exact));
        let fetcher = Arc::new(Fetcher::new(client, limiter, &config.archive.base_url));

        let scope = config.scope_filter();
        let frontier = Arc::new(Frontier::new(
            config.scope_filter(),
            config.limits.max_pages,
            config.scope.ignore_query,
        ));
        let rewriter = Arc::new(Rewriter::new(
            scope,
            config.scope.strip_js,
            &config.root_host(),
        ));

        Ok(Self {
            config,
            output_root,
            frontier,
            resolver,
            fetcher,
            rewriter,
            manifest: Arc::new(ManifestAggregator::new()),
        })
    }

    /// The frontier, for wiring an external stop signal.
    pub fn frontier(&self) -> Arc<Frontier> {
        Arc::clone(&self.frontier)
    }

    /// Where this run writes its tree.
    pub fn output_root(&self) -> &PathBuf {
        &self.output_root
    }

    /// Manifest records accumulated so far, completion-ordered.
    pub fn manifest_snapshot(&self) -> Vec<ManifestRecord> {
        self.manifest.snapshot()
    }

    /// Runs the crawl to drain, then consolidates stylesheets.
    pub async fn run(&self) -> Result<MirrorSummary> {
        let cutoff = self.resolver.cutoff().clone();
        tracing::info!(
            "Mirroring {} up to {} into {}",
            self.config.root_host(),
            cutoff,
            self.output_root.display()
        );

        tokio::fs::create_dir_all(&self.output_root).await?;
        self.frontier.seed(&self.config.seed_url()?)?;

        let mut workers = JoinSet::new();
        let processed = Arc::new(AtomicU64::new(0));
        let started = Instant::now();
        for id in 0..self.config.limits.concurrency {
            let ctx = WorkerContext {
                frontier: Arc::clone(&self.frontier),
                resolver: Arc::clone(&self.resolver),
                fetcher: Arc::clone(&self.fetcher),
                rewriter: Arc::clone(&self.rewriter),
                manifest: Arc::clone(&self.manifest),
                output_root: self.output_root.clone(),
                processed: Arc::clone(&processed),
                started,
            };
            workers.spawn(worker_loop(id, ctx));
        }

        // Full barrier: consolidation depends on every page's final state.
        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                tracing::error!("Worker task failed: {}", e);
            }
        }

        let written = self.frontier.written_units();
        consolidate::consolidate(&self.output_root, &written)?;

        let summary = MirrorSummary::from_records(&self.manifest.snapshot());
        tracing::info!(
            "Run complete in {:.1}s: {} written, {} partial, {} failed, {} bytes",
            started.elapsed().as_secs_f64(),
            summary.written,
            summary.partial,
            summary.failed,
            summary.total_bytes
        );
        Ok(summary)
    }
}

/// Runs a complete mirror operation for a validated configuration.
pub async fn run_mirror(config: MirrorConfig) -> Result<MirrorRun> {
    let coordinator = Coordinator::new(config)?;
    let summary = coordinator.run().await?;
    Ok(MirrorRun {
        summary,
        records: coordinator.manifest_snapshot(),
        output_root: coordinator.output_root().clone(),
    })
}

//! Per-unit processing
//!
//! One worker invocation owns one crawl unit from hand-off to its terminal
//! state. Failures are local: they end the unit, produce its manifest
//! record, and never abort the run.

use crate::archive::{ArchiveTimestamp, CaptureDescriptor, SnapshotResolver, MAX_REDIRECT_HOPS};
use crate::fetch::Fetcher;
use crate::frontier::{Frontier, PendingUnit, ResourceClass, UnitState};
use crate::manifest::{FailureKind, ManifestAggregator, ManifestRecord, Outcome};
use crate::rewrite::Rewriter;
use crate::url::{local_rel_path, resolve_reference};
use crate::{MirrorError, Result};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::time::Instant;

/// Everything a worker needs, shared across the pool.
#[derive(Clone)]
pub(crate) struct WorkerContext {
    pub frontier: Arc<Frontier>,
    pub resolver: Arc<SnapshotResolver>,
    pub fetcher: Arc<Fetcher>,
    pub rewriter: Arc<Rewriter>,
    pub manifest: Arc<ManifestAggregator>,
    pub output_root: PathBuf,
    pub processed: Arc<AtomicU64>,
    pub started: Instant,
}

/// Worker loop body: drain the frontier until it is empty or halted.
pub(crate) async fn worker_loop(id: usize, ctx: WorkerContext) {
    tracing::debug!("Worker {} started", id);
    while let Some(unit) = ctx.frontier.next().await {
        process_unit(&ctx, unit).await;

        let done = ctx.processed.fetch_add(1, Ordering::Relaxed) + 1;
        let minutes = ctx.started.elapsed().as_secs_f64() / 60.0;
        let rate = if minutes > 0.0 {
            done as f64 / minutes
        } else {
            0.0
        };
        tracing::info!(
            "Progress: {} processed, {} pending, ~{:.1} urls/min",
            done,
            ctx.frontier.pending(),
            rate
        );
    }
    tracing::debug!("Worker {} finished", id);
}

/// Processes one unit end to end, recording its terminal outcome.
pub(crate) async fn process_unit(ctx: &WorkerContext, unit: PendingUnit) {
    let mut resolved_ts = None;

    match mirror_unit(ctx, &unit, &mut resolved_ts).await {
        Ok(()) => {}
        Err(error) => record_failure(ctx, &unit, error, resolved_ts),
    }
}

async fn mirror_unit(
    ctx: &WorkerContext,
    unit: &PendingUnit,
    resolved_ts: &mut Option<ArchiveTimestamp>,
) -> Result<()> {
    let descriptor = resolve_with_redirects(ctx, unit).await?;
    *resolved_ts = Some(descriptor.timestamp.clone());

    ctx.frontier.mark(&unit.key, UnitState::Fetching)?;
    let fetched = ctx.fetcher.fetch(&descriptor).await?;
    let raw = fetched.bytes;
    let elapsed_ms = fetched.elapsed.as_millis() as u64;

    let mut rewrite_note = None;
    let (bytes, outcome, discovered) = match unit.class {
        ResourceClass::Html | ResourceClass::Stylesheet => {
            ctx.frontier.mark(&unit.key, UnitState::Rewriting)?;
            match ctx
                .rewriter
                .rewrite(unit.class, &unit.url, &descriptor.timestamp, &raw)
            {
                Ok(output) => (output.bytes, Outcome::Written, output.discovered),
                Err(error) => {
                    // Preserving the original bytes beats dropping content.
                    tracing::warn!("Writing {} verbatim: {}", unit.url, error);
                    rewrite_note = Some(error.to_string());
                    (raw, Outcome::Partial, Vec::new())
                }
            }
        }
        _ => (raw, Outcome::Written, Vec::new()),
    };

    for reference in &discovered {
        ctx.frontier
            .discover(&reference.url, reference.class, &unit.key, unit.depth + 1);
    }

    let local = local_rel_path(&unit.url);
    let path = ctx.output_root.join(&local);
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(&path, &bytes).await?;

    let size = bytes.len() as u64;
    ctx.frontier.complete(
        &unit.key,
        &outcome,
        Some(local.clone()),
        Some(descriptor.timestamp.clone()),
        size,
    )?;
    ctx.manifest.record(ManifestRecord {
        url: unit.url.to_string(),
        local_path: Some(local.clone()),
        class: unit.class,
        outcome,
        error_kind: None,
        error: rewrite_note,
        timestamp: Some(descriptor.timestamp.clone()),
        size,
        elapsed_ms,
        digest: Some(ManifestRecord::digest_of(&bytes)),
    });

    tracing::info!(
        "Mirrored {} -> {} ({} bytes, capture {})",
        unit.url,
        local,
        size,
        descriptor.timestamp
    );
    Ok(())
}

/// Resolves a unit's capture, following redirect aliases for a bounded
/// number of hops.
async fn resolve_with_redirects(
    ctx: &WorkerContext,
    unit: &PendingUnit,
) -> Result<CaptureDescriptor> {
    let mut target = unit.url.clone();

    for _ in 0..=MAX_REDIRECT_HOPS {
        let descriptor = ctx.resolver.resolve(&target).await?;

        let redirect = match &descriptor.redirect {
            Some(redirect) => redirect.clone(),
            None => return Ok(descriptor),
        };

        tracing::debug!("Capture of {} is a redirect alias to {}", target, redirect);
        target = resolve_reference(&redirect, &target).ok_or_else(|| {
            MirrorError::CdxFormat(format!("unresolvable redirect target '{}'", redirect))
        })?;
    }

    Err(MirrorError::RedirectLoop {
        url: unit.url.to_string(),
        hops: MAX_REDIRECT_HOPS,
    })
}

fn record_failure(
    ctx: &WorkerContext,
    unit: &PendingUnit,
    error: MirrorError,
    resolved_ts: Option<ArchiveTimestamp>,
) {
    let kind = FailureKind::from_error(&error).unwrap_or(FailureKind::Network);
    let outcome = Outcome::Failed(kind);

    tracing::warn!("Failed {}: {}", unit.url, error);

    if let Err(state_err) = ctx
        .frontier
        .complete(&unit.key, &outcome, None, resolved_ts.clone(), 0)
    {
        tracing::error!("Could not finalize {}: {}", unit.url, state_err);
    }

    ctx.manifest.record(ManifestRecord {
        url: unit.url.to_string(),
        local_path: None,
        class: unit.class,
        outcome,
        error_kind: Some(kind.label()),
        error: Some(error.to_string()),
        timestamp: resolved_ts,
        size: 0,
        elapsed_ms: 0,
        digest: None,
    });
}

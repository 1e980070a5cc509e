//! Batch runner: drives the per-target pipeline over a target list
//!
//! This module contains:
//! - The shared [`RunContext`] owning checkpoint, counters and output sinks
//! - The worker-pool and concurrent scheduling models
//! - Resume handling and the end-of-run reports

mod concurrent;
mod context;
mod pool;
mod shutdown;

pub use context::RunContext;
pub use shutdown::ShutdownSignal;

use crate::config::{compute_config_hash, Config, RunnerKind};
use crate::fetch::build_fetcher;
use crate::input::LoadedInput;
use crate::model::Target;
use crate::output::{
    generate_markdown_summary, write_analytics, InputSummary, RunAnalytics, ANALYTICS_FILE,
    SUMMARY_FILE,
};
use crate::pipeline::Pipeline;
use crate::storage::{open_sinks, Checkpoint};
use crate::MinerError;
use chrono::Utc;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

/// Outcome of a batch run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub analytics: RunAnalytics,

    /// Directory holding partitions, checkpoint and reports
    pub output_dir: PathBuf,
}

impl RunReport {
    pub fn interrupted(&self) -> bool {
        self.analytics.interrupted
    }
}

/// Runs a batch of targets to completion or interruption
///
/// This is the main entry point for a run. It will:
/// 1. Load the checkpoint when resuming (or start a fresh one)
/// 2. Skip targets completed by an earlier run
/// 3. Open the output sinks (truncating on fresh runs)
/// 4. Dispatch the remaining targets with the configured runner
/// 5. Flush, then write `analytics.json` and `summary.md`
///
/// # Arguments
///
/// * `config` - The validated configuration
/// * `input` - Targets and input counts
/// * `shutdown` - Signal that stops dispatching when triggered
///
/// # Returns
///
/// * `Ok(RunReport)` - The run finished or was interrupted cleanly
/// * `Err(MinerError)` - Outputs or checkpoint could not be written
pub async fn run_batch(
    config: &Config,
    input: LoadedInput,
    shutdown: ShutdownSignal,
) -> Result<RunReport, MinerError> {
    let started_at = Utc::now();
    let clock = Instant::now();

    let output_dir = PathBuf::from(&config.output.directory);
    std::fs::create_dir_all(&output_dir)?;

    let fingerprint = compute_config_hash(config)?;
    let checkpoint_path = config.checkpoint_path();

    let previous = if config.checkpoint.resume {
        let loaded = Checkpoint::load(&checkpoint_path)?;
        if loaded.is_none() {
            tracing::warn!(
                "No checkpoint at {}, starting a fresh run",
                checkpoint_path.display()
            );
        }
        loaded
    } else {
        None
    };
    let resumed = previous.is_some();

    let mut checkpoint = match previous {
        Some(checkpoint) => {
            if checkpoint.fingerprint.as_deref() != Some(fingerprint.as_str()) {
                tracing::warn!(
                    "Checkpoint was written with different settings; results may mix both"
                );
            }
            tracing::info!(
                "Resuming: {} targets already completed, {} emails found so far",
                checkpoint.completed.len(),
                checkpoint.emails_found
            );
            checkpoint
        }
        None => Checkpoint::new(Some(fingerprint)),
    };

    // A fresh run invalidates any older checkpoint before touching outputs
    if !resumed {
        checkpoint.save_atomic(&checkpoint_path)?;
    }

    let (targets, skipped_completed) = pending_targets(input.targets, &checkpoint);
    let input_summary = InputSummary {
        rows: input.stats.rows,
        invalid: input.stats.invalid,
        duplicates: input.stats.duplicates,
        skipped_completed,
        dispatched: targets.len(),
    };

    let sinks = open_sinks(&config.output, &output_dir, !resumed)?;
    let fetcher = build_fetcher(config)?;
    let pipeline = Arc::new(Pipeline::new(fetcher, config));
    let ctx = Arc::new(RunContext::new(
        config,
        checkpoint,
        sinks,
        targets.len(),
        shutdown.clone(),
    ));

    tracing::info!(
        "Dispatching {} targets ({} skipped as completed) with the {:?} runner, {} workers",
        targets.len(),
        skipped_completed,
        config.runner.kind,
        config.runner.workers
    );

    let dispatched = targets.len() as u64;
    let outcome = match config.runner.kind {
        RunnerKind::Pool => {
            pool::run_pool(
                Arc::clone(&ctx),
                Arc::clone(&pipeline),
                targets,
                config.runner.workers,
            )
            .await
        }
        RunnerKind::Concurrent => {
            concurrent::run_concurrent(
                Arc::clone(&ctx),
                Arc::clone(&pipeline),
                targets,
                config.runner.workers,
            )
            .await
        }
    };

    // Flush whatever is buffered even when a worker failed
    let flushed = ctx.flush_offloaded().await;
    outcome?;
    flushed?;

    let processed = ctx.processed();
    let interrupted = shutdown.is_triggered() && processed < dispatched;
    let analytics = RunAnalytics::finalize(
        ctx.checkpoint().counters,
        input_summary,
        processed,
        started_at,
        clock.elapsed(),
        resumed,
        interrupted,
    );

    write_analytics(&analytics, &output_dir.join(ANALYTICS_FILE))?;
    generate_markdown_summary(&analytics, &output_dir.join(SUMMARY_FILE))?;

    if interrupted {
        tracing::warn!(
            "Run interrupted after {} of {} targets; rerun with --resume to continue",
            processed,
            dispatched
        );
    } else {
        tracing::info!(
            "Run completed: {} targets, {} succeeded, {} emails, {:.1}s",
            analytics.totals.attempted,
            analytics.totals.succeeded,
            analytics.totals.emails_found,
            analytics.elapsed_secs
        );
    }

    Ok(RunReport {
        analytics,
        output_dir,
    })
}

/// Drops targets the checkpoint already names, returning how many were dropped
fn pending_targets(targets: Vec<Target>, checkpoint: &Checkpoint) -> (Vec<Target>, usize) {
    let total = targets.len();
    let pending: Vec<Target> = targets
        .into_iter()
        .filter(|t| !checkpoint.is_completed(&t.id))
        .collect();
    let skipped = total - pending.len();
    (pending, skipped)
}

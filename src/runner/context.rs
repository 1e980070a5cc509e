//! Shared run state: checkpoint, counters and the output buffer
//!
//! All three live behind one lock. The lock is taken only to merge a
//! completed target or to flush, never while a network request is pending.

use crate::config::{Config, EmailCardinality};
use crate::model::TargetResult;
use crate::output::{rows_for, OutputRow};
use crate::runner::ShutdownSignal;
use crate::storage::{Checkpoint, Partition, ResultSink, StorageResult};
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

/// Everything a runner shares between its workers
pub struct RunContext {
    state: Mutex<RunState>,
    checkpoint_path: PathBuf,
    cardinality: EmailCardinality,
    flush_emails: usize,
    flush_rows: usize,
    progress_every: usize,
    total: usize,
    started: Instant,
    shutdown: ShutdownSignal,
}

struct RunState {
    /// Progress as of the last flush
    checkpoint: Checkpoint,

    /// Completed targets not yet written
    buffer: Vec<TargetResult>,
    buffered_emails: usize,

    /// Batch taken out of the buffer whose writes have not all succeeded
    pending: Option<PendingBatch>,

    sinks: Vec<Box<dyn ResultSink>>,

    /// Targets completed by this invocation, flushed or not
    processed: u64,
}

impl RunContext {
    /// Creates the context of one invocation
    ///
    /// # Arguments
    ///
    /// * `config` - Run configuration (flush thresholds, cardinality)
    /// * `checkpoint` - Loaded or fresh checkpoint
    /// * `sinks` - Output backends
    /// * `total` - Targets to be dispatched, for progress lines
    /// * `shutdown` - Signal shared with the runner
    pub fn new(
        config: &Config,
        checkpoint: Checkpoint,
        sinks: Vec<Box<dyn ResultSink>>,
        total: usize,
        shutdown: ShutdownSignal,
    ) -> Self {
        Self {
            state: Mutex::new(RunState {
                checkpoint,
                buffer: Vec::new(),
                buffered_emails: 0,
                pending: None,
                sinks,
                processed: 0,
            }),
            checkpoint_path: config.checkpoint_path(),
            cardinality: config.output.email_output,
            flush_emails: config.checkpoint.interval.max(1),
            flush_rows: config.checkpoint.max_buffered_rows.max(1),
            progress_every: config.runner.progress_every,
            total,
            started: Instant::now(),
            shutdown,
        }
    }

    pub fn shutdown(&self) -> &ShutdownSignal {
        &self.shutdown
    }

    /// Targets completed by this invocation
    pub fn processed(&self) -> u64 {
        self.state.lock().processed
    }

    /// Copy of the checkpoint as of the last flush
    pub fn checkpoint(&self) -> Checkpoint {
        self.state.lock().checkpoint.clone()
    }

    /// Merges a completed target, flushing once a threshold is crossed
    ///
    /// A persistence failure triggers shutdown: nothing more may be
    /// dispatched once rows can no longer be written.
    pub fn record(&self, result: TargetResult) -> StorageResult<()> {
        let mut state = self.state.lock();

        tracing::debug!(
            "{} -> {}{}",
            result.target.label(),
            result.status.as_str(),
            result
                .failure_reason
                .as_ref()
                .map(|r| format!(" ({})", r))
                .unwrap_or_default()
        );

        state.processed += 1;
        state.buffered_emails += result.email_count();
        state.buffer.push(result);

        if self.progress_every > 0 && state.processed % self.progress_every as u64 == 0 {
            let elapsed = self.started.elapsed().as_secs_f64();
            let rate = if elapsed > 0.0 {
                state.processed as f64 / elapsed
            } else {
                0.0
            };
            tracing::info!(
                "Progress: {}/{} targets, {} emails found, {:.2} targets/sec",
                state.processed,
                self.total,
                state.checkpoint.emails_found + state.buffered_emails as u64,
                rate
            );
        }

        if state.buffered_emails >= self.flush_emails || state.buffer.len() >= self.flush_rows {
            if let Err(e) = self.flush_locked(&mut state) {
                self.shutdown.trigger();
                return Err(e);
            }
        }

        Ok(())
    }

    /// Writes buffered rows and saves the checkpoint, even when nothing is buffered
    pub fn flush(&self) -> StorageResult<()> {
        let mut state = self.state.lock();
        self.flush_locked(&mut state)
    }

    /// Runs `record` on the blocking pool
    ///
    /// Sink writes of a threshold flush never happen on a runtime worker thread.
    pub async fn record_offloaded(self: &Arc<Self>, result: TargetResult) -> StorageResult<()> {
        let ctx = Arc::clone(self);
        tokio::task::spawn_blocking(move || ctx.record(result)).await?
    }

    /// Runs `flush` on the blocking pool
    pub async fn flush_offloaded(self: &Arc<Self>) -> StorageResult<()> {
        let ctx = Arc::clone(self);
        tokio::task::spawn_blocking(move || ctx.flush()).await?
    }

    fn flush_locked(&self, state: &mut RunState) -> StorageResult<()> {
        let mut flushed = 0;
        let mut rows = 0;

        loop {
            if state.pending.is_none() {
                if state.buffer.is_empty() {
                    break;
                }
                let results: Vec<TargetResult> = state.buffer.drain(..).collect();
                state.buffered_emails = 0;
                let sinks = state.sinks.len();
                state.pending = Some(PendingBatch::new(results, self.cardinality, sinks));
            }

            let RunState {
                pending,
                sinks,
                checkpoint,
                ..
            } = &mut *state;
            let Some(batch) = pending.as_mut() else {
                break;
            };
            batch.write(sinks)?;

            // Rows are durable before the checkpoint names their targets
            for result in &batch.results {
                checkpoint.emails_found += result.email_count() as u64;
                checkpoint.counters.record(result);
                checkpoint.completed.insert(result.target.id.clone());
            }
            flushed += batch.results.len();
            rows += batch.rows[2].len();
            *pending = None;
        }

        state.checkpoint.save_atomic(&self.checkpoint_path)?;

        if flushed > 0 {
            tracing::debug!(
                "Flushed {} targets ({} rows), {} completed in total",
                flushed,
                rows,
                state.checkpoint.completed.len()
            );
        }
        Ok(())
    }
}

/// Rows of one flush, with the appends already done per sink
///
/// A failed flush keeps its batch. The retry appends only the partitions
/// that are still missing, so no sink receives a row twice.
struct PendingBatch {
    results: Vec<TargetResult>,

    /// Rows indexed like `Partition::ALL`
    rows: [Vec<OutputRow>; 3],

    /// One entry per sink, indexed like `Partition::ALL`
    written: Vec<[bool; 3]>,
}

impl PendingBatch {
    fn new(results: Vec<TargetResult>, cardinality: EmailCardinality, sinks: usize) -> Self {
        let mut success = Vec::new();
        let mut failed = Vec::new();
        let mut all = Vec::new();

        for result in &results {
            let rows = rows_for(result, cardinality);
            if result.is_success() {
                success.extend(rows.iter().cloned());
            } else {
                failed.extend(rows.iter().cloned());
            }
            all.extend(rows);
        }

        Self {
            results,
            rows: [success, failed, all],
            written: vec![[false; 3]; sinks],
        }
    }

    fn write(&mut self, sinks: &mut [Box<dyn ResultSink>]) -> StorageResult<()> {
        for (sink, written) in sinks.iter_mut().zip(self.written.iter_mut()) {
            for (index, partition) in Partition::ALL.iter().enumerate() {
                if written[index] {
                    continue;
                }
                if let Err(e) = sink.append(*partition, &self.rows[index]) {
                    tracing::error!(
                        "Writing {} rows to the {} sink failed: {}",
                        partition.name(),
                        sink.name(),
                        e
                    );
                    return Err(e);
                }
                written[index] = true;
            }
        }
        Ok(())
    }
}

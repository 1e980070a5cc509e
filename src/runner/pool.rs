//! Bounded worker pool over a shared queue
//!
//! N long-lived workers pull targets from one queue and run each through the
//! pipeline to completion before taking the next. Completion order is
//! unconstrained.

use crate::model::Target;
use crate::pipeline::Pipeline;
use crate::runner::RunContext;
use crate::storage::{StorageError, StorageResult};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

/// Runs all targets through `workers` workers
///
/// Returns the first persistence error raised by any worker. Workers stop
/// taking new targets once shutdown is requested.
pub(crate) async fn run_pool(
    ctx: Arc<RunContext>,
    pipeline: Arc<Pipeline>,
    targets: Vec<Target>,
    workers: usize,
) -> StorageResult<()> {
    let workers = workers.min(targets.len()).max(1);
    let queue = Arc::new(Mutex::new(VecDeque::from(targets)));

    let handles: Vec<_> = (0..workers)
        .map(|worker_id| {
            let queue = Arc::clone(&queue);
            let ctx = Arc::clone(&ctx);
            let pipeline = Arc::clone(&pipeline);
            tokio::spawn(worker_loop(worker_id, queue, ctx, pipeline))
        })
        .collect();

    let mut first_error: Option<StorageError> = None;
    for joined in futures::future::join_all(handles).await {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                first_error.get_or_insert(e);
            }
            Err(e) => tracing::error!("Worker task failed: {}", e),
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

async fn worker_loop(
    worker_id: usize,
    queue: Arc<Mutex<VecDeque<Target>>>,
    ctx: Arc<RunContext>,
    pipeline: Arc<Pipeline>,
) -> StorageResult<()> {
    loop {
        if ctx.shutdown().is_triggered() {
            tracing::debug!("Worker {} stopping on shutdown", worker_id);
            break;
        }

        let next = queue.lock().pop_front();
        let Some(target) = next else {
            break;
        };

        let result = pipeline.process(target).await;
        ctx.record_offloaded(result).await?;
    }

    Ok(())
}

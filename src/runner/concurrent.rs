//! Semaphore-admitted concurrent runner
//!
//! Every target runs as its own task; a semaphore of N permits bounds how
//! many are in flight. Requests go through the pooled fetcher, so the
//! connection pool and DNS cache are shared by all tasks.

use crate::model::Target;
use crate::pipeline::Pipeline;
use crate::runner::RunContext;
use crate::storage::{StorageError, StorageResult};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Runs all targets with at most `max_in_flight` in progress at once
///
/// Dispatch stops on shutdown; tasks already admitted run to completion and
/// their results are recorded.
pub(crate) async fn run_concurrent(
    ctx: Arc<RunContext>,
    pipeline: Arc<Pipeline>,
    targets: Vec<Target>,
    max_in_flight: usize,
) -> StorageResult<()> {
    let semaphore = Arc::new(Semaphore::new(max_in_flight.max(1)));
    let shutdown = ctx.shutdown().clone();
    let mut tasks = JoinSet::new();

    for target in targets {
        let permit = tokio::select! {
            biased;
            _ = shutdown.wait() => break,
            permit = Arc::clone(&semaphore).acquire_owned() => match permit {
                Ok(permit) => permit,
                Err(_) => break,
            },
        };

        let ctx = Arc::clone(&ctx);
        let pipeline = Arc::clone(&pipeline);
        tasks.spawn(async move {
            let _permit = permit;
            let result = pipeline.process(target).await;
            ctx.record_offloaded(result).await
        });
    }

    if shutdown.is_triggered() {
        tracing::info!("Dispatch stopped, waiting for {} in-flight targets", tasks.len());
    }

    let mut first_error: Option<StorageError> = None;
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                first_error.get_or_insert(e);
            }
            Err(e) => tracing::error!("Target task failed: {}", e),
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

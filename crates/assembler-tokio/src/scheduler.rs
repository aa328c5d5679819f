//! Schedulers deciding where a streamed pass runs its lookups

use std::sync::Arc;

use assembler_core::{AggregationFailure, ErasedResults, MapperSource};
use async_trait::async_trait;
use tokio::runtime::Handle;

use crate::pool::WorkerPool;

/// Runs one lookup of a streamed assembly pass.
#[async_trait]
pub trait Scheduler: Send + Sync {
    /// Run `source` to completion and hand back its result map
    async fn schedule(&self, source: MapperSource) -> Result<ErasedResults, AggregationFailure>;
}

#[async_trait]
impl<S> Scheduler for Arc<S>
where
    S: Scheduler + ?Sized,
{
    async fn schedule(&self, source: MapperSource) -> Result<ErasedResults, AggregationFailure> {
        (**self).schedule(source).await
    }
}

/// Resolve the runtime to run blocking lookups on: the given handle, else
/// the runtime of the calling task, else the shared [`WorkerPool`].
pub(crate) fn resolve_handle(handle: Option<&Handle>) -> Result<Handle, AggregationFailure> {
    if let Some(handle) = handle {
        return Ok(handle.clone());
    }
    if let Ok(current) = Handle::try_current() {
        return Ok(current);
    }
    WorkerPool::shared()
        .map(WorkerPool::handle)
        .map_err(|e| AggregationFailure::execution(format!("no worker pool available: {e}")))
}

/// Await a lookup dispatched onto a blocking pool.
pub(crate) async fn join_blocking(
    task: tokio::task::JoinHandle<Result<ErasedResults, AggregationFailure>>,
) -> Result<ErasedResults, AggregationFailure> {
    task.await.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "lookup task did not complete");
        Err(AggregationFailure::execution(format!(
            "lookup task did not complete: {e}"
        )))
    })
}

/// Runs every lookup on the blocking pool of a tokio runtime, in parallel.
#[derive(Debug, Clone, Default)]
pub struct BlockingScheduler {
    handle: Option<Handle>,
}

impl BlockingScheduler {
    /// Use the runtime polling the stream, else the shared pool
    pub fn new() -> Self {
        Self::default()
    }

    /// Always use the runtime behind `handle`
    pub fn with_handle(handle: Handle) -> Self {
        Self {
            handle: Some(handle),
        }
    }

    /// Always use `pool`
    pub fn on(pool: &WorkerPool) -> Self {
        Self::with_handle(pool.handle())
    }
}

#[async_trait]
impl Scheduler for BlockingScheduler {
    async fn schedule(&self, source: MapperSource) -> Result<ErasedResults, AggregationFailure> {
        let handle = resolve_handle(self.handle.as_ref())?;
        join_blocking(handle.spawn_blocking(source)).await
    }
}

/// Runs each lookup inline on the task polling the stream.
///
/// Lookups of a pass then run one after another, and the first failure
/// stops the remaining ones from being invoked.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImmediateScheduler;

#[async_trait]
impl Scheduler for ImmediateScheduler {
    async fn schedule(&self, source: MapperSource) -> Result<ErasedResults, AggregationFailure> {
        source()
    }
}

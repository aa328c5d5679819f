//! Streaming execution adapter

use std::sync::Arc;

use assembler_core::{
    AggregateBuilder, AggregationFailure, AssemblerAdapter, ErrorConverter, MapperSource,
};
use futures::future;
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};

use crate::scheduler::{BlockingScheduler, Scheduler};

/// Emits the aggregates of a pass one by one as a lazy stream.
///
/// Nothing runs until the stream is first polled; at that point every
/// lookup is handed to the scheduler and their results are joined in lookup
/// order. A failure ends the stream with a single error item.
#[derive(Clone)]
pub struct StreamAdapter {
    scheduler: Arc<dyn Scheduler>,
}

impl std::fmt::Debug for StreamAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamAdapter").finish_non_exhaustive()
    }
}

impl Default for StreamAdapter {
    fn default() -> Self {
        Self::with_scheduler(BlockingScheduler::new())
    }
}

impl StreamAdapter {
    /// Run lookups on the blocking pool of the polling runtime, else the shared pool
    pub fn new() -> Self {
        Self::default()
    }

    /// Run lookups through `scheduler`
    pub fn with_scheduler(scheduler: impl Scheduler + 'static) -> Self {
        Self {
            scheduler: Arc::new(scheduler),
        }
    }
}

impl<A, E> AssemblerAdapter<A, E> for StreamAdapter
where
    A: Send + 'static,
    E: Send + 'static,
{
    type Output = BoxStream<'static, Result<A, E>>;

    fn convert(
        &self,
        sources: Vec<MapperSource>,
        build: AggregateBuilder<A>,
        errors: ErrorConverter<E>,
    ) -> Self::Output {
        let scheduler = Arc::clone(&self.scheduler);

        stream::once(async move {
            tracing::trace!(lookups = sources.len(), "stream polled, scheduling lookups");
            let scheduled = sources.into_iter().map(|source| scheduler.schedule(source));
            future::try_join_all(scheduled).await.and_then(build)
        })
        .map_ok(|aggregates| {
            stream::iter(aggregates.into_iter().map(Ok::<A, AggregationFailure>))
        })
        .try_flatten()
        .map_err(move |failure| {
            tracing::warn!(error = %failure, "streamed assembly failed");
            errors(failure)
        })
        .boxed()
    }

    fn reject(&self, error: E) -> Self::Output {
        stream::once(future::ready(Err(error))).boxed()
    }
}

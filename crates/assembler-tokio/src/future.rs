//! Parallel-future execution adapter

use std::marker::PhantomData;

use assembler_core::{AggregateBuilder, AssemblerAdapter, ErrorConverter, MapperSource};
use futures::future::{self, BoxFuture, FutureExt};
use tokio::runtime::Handle;

use crate::pool::WorkerPool;
use crate::scheduler::{join_blocking, resolve_handle};

/// Submits every lookup of a pass to a blocking pool as soon as the pass
/// starts, and resolves to the aggregates collected into `C`.
///
/// The returned future is `'static` and may be awaited on any executor.
/// The first failing lookup fails the future immediately; lookups still
/// running complete in the background and their results are discarded.
pub struct FutureAdapter<C> {
    handle: Option<Handle>,
    _output: PhantomData<fn() -> C>,
}

impl<C> Clone for FutureAdapter<C> {
    fn clone(&self) -> Self {
        Self {
            handle: self.handle.clone(),
            _output: PhantomData,
        }
    }
}

impl<C> Default for FutureAdapter<C> {
    fn default() -> Self {
        Self {
            handle: None,
            _output: PhantomData,
        }
    }
}

impl<C> std::fmt::Debug for FutureAdapter<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FutureAdapter")
            .field("handle", &self.handle)
            .finish()
    }
}

impl<C> FutureAdapter<C> {
    /// Dispatch onto the current runtime, else the shared [`WorkerPool`]
    pub fn new() -> Self {
        Self::default()
    }

    /// Dispatch onto the runtime behind `handle`
    pub fn with_handle(handle: Handle) -> Self {
        Self {
            handle: Some(handle),
            _output: PhantomData,
        }
    }

    /// Dispatch onto `pool`
    pub fn on(pool: &WorkerPool) -> Self {
        Self::with_handle(pool.handle())
    }
}

impl<A, E, C> AssemblerAdapter<A, E> for FutureAdapter<C>
where
    A: Send + 'static,
    E: Send + 'static,
    C: FromIterator<A> + Send + 'static,
{
    type Output = BoxFuture<'static, Result<C, E>>;

    fn convert(
        &self,
        sources: Vec<MapperSource>,
        build: AggregateBuilder<A>,
        errors: ErrorConverter<E>,
    ) -> Self::Output {
        let handle = match resolve_handle(self.handle.as_ref()) {
            Ok(handle) => handle,
            Err(failure) => return future::ready(Err(errors(failure))).boxed(),
        };

        let lookups = sources.len();
        let tasks: Vec<_> = sources
            .into_iter()
            .map(|source| join_blocking(handle.spawn_blocking(source)))
            .collect();
        tracing::trace!(lookups, "lookups submitted to worker pool");

        async move {
            future::try_join_all(tasks)
                .await
                .and_then(build)
                .map(|aggregates| aggregates.into_iter().collect::<C>())
                .map_err(|failure| {
                    tracing::warn!(error = %failure, "parallel assembly failed");
                    errors(failure)
                })
        }
        .boxed()
    }

    fn reject(&self, error: E) -> Self::Output {
        future::ready(Err(error)).boxed()
    }
}

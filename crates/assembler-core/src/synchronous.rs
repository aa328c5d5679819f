//! Synchronous execution adapter

use crate::adapter::{AggregateBuilder, AssemblerAdapter, MapperSource};
use crate::error::ErrorConverter;

/// Runs lookups one after another on the calling thread.
///
/// The first failing lookup aborts the pass; later lookups are not invoked.
#[derive(Debug, Clone, Copy, Default)]
pub struct SynchronousAdapter;

impl SynchronousAdapter {
    /// Create the adapter
    pub fn new() -> Self {
        Self
    }
}

impl<A, E> AssemblerAdapter<A, E> for SynchronousAdapter {
    type Output = Result<Vec<A>, E>;

    fn convert(
        &self,
        sources: Vec<MapperSource>,
        build: AggregateBuilder<A>,
        errors: ErrorConverter<E>,
    ) -> Self::Output {
        sources
            .into_iter()
            .map(|source| source())
            .collect::<Result<Vec<_>, _>>()
            .and_then(build)
            .map_err(|failure| {
                tracing::warn!(error = %failure, "synchronous assembly failed");
                errors(failure)
            })
    }

    fn reject(&self, error: E) -> Self::Output {
        Err(error)
    }
}

//! Execution adapter contract
//!
//! An adapter decides how the lookups of one assembly pass are dispatched
//! and awaited, and how the resulting aggregates are packaged. The join
//! itself (correlating result maps back to entities and invoking the
//! combiner) is handed to the adapter pre-built as an [`AggregateBuilder`],
//! so every adapter shares one implementation of it.
//!
//! Adapters must be all-or-nothing: if any source fails, the pass fails
//! and no aggregate is produced.

use std::any::Any;

use crate::error::{AggregationFailure, ErrorConverter};

/// Type-erased result map of one lookup (`HashMap<ID, R>` for its `R`).
pub type ErasedResults = Box<dyn Any + Send>;

/// Zero-argument unit of work running one lookup over the pass's id batch.
pub type MapperSource = Box<dyn FnOnce() -> Result<ErasedResults, AggregationFailure> + Send>;

/// Correlates the result maps (in lookup order) with the entities of the pass.
pub type AggregateBuilder<A> =
    Box<dyn FnOnce(Vec<ErasedResults>) -> Result<Vec<A>, AggregationFailure> + Send>;

/// Strategy for dispatching lookups and packaging aggregates.
///
/// `A` is the aggregate type and `E` the caller's error type.
pub trait AssemblerAdapter<A, E> {
    /// Container or stream the caller receives
    type Output;

    /// Run `sources`, pass their results (in the order given) to `build`,
    /// and package the aggregates. Failures go through `errors` exactly once.
    fn convert(
        &self,
        sources: Vec<MapperSource>,
        build: AggregateBuilder<A>,
        errors: ErrorConverter<E>,
    ) -> Self::Output;

    /// Package a failure detected while setting up the pass.
    fn reject(&self, error: E) -> Self::Output;
}

impl<A, E, T> AssemblerAdapter<A, E> for &T
where
    T: AssemblerAdapter<A, E> + ?Sized,
{
    type Output = T::Output;

    fn convert(
        &self,
        sources: Vec<MapperSource>,
        build: AggregateBuilder<A>,
        errors: ErrorConverter<E>,
    ) -> Self::Output {
        (**self).convert(sources, build, errors)
    }

    fn reject(&self, error: E) -> Self::Output {
        (**self).reject(error)
    }
}

//! Join engine
//!
//! An [`Assembler`] ties an entity source, an id extractor, an ordered tuple
//! of mappers and a combiner together. Each pass:
//!
//! 1. materializes the entity batch once,
//! 2. derives the id batch (one id per entity, duplicates kept),
//! 3. wraps every mapper into a [`MapperSource`] over that shared batch,
//! 4. lets the adapter dispatch and await the sources,
//! 5. combines each entity, in input order, with its per-lookup values.
//!
//! The combiner receives the entity plus a tuple holding one value per
//! mapper, in mapper order: `Fn(T, (R0, R1, ..)) -> A`.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use crate::adapter::{AggregateBuilder, AssemblerAdapter, ErasedResults, MapperSource};
use crate::error::{
    identity_converter, AggregationFailure, BoxError, ConfigurationError, ErrorConverter,
    RetrievalFailure,
};
use crate::mapper::{EntityId, Mapper};

/// Shared, read-only id batch of one pass.
pub type IdBatch<ID> = Arc<[ID]>;

type EntityLoader<T> = Arc<dyn Fn() -> Result<Vec<T>, RetrievalFailure> + Send + Sync>;
type IdExtractor<T, ID> = Arc<dyn Fn(&T) -> ID + Send + Sync>;

fn shared_loader<T>(entities: Vec<T>) -> EntityLoader<T>
where
    T: Clone + Send + Sync + 'static,
{
    let entities: Arc<[T]> = entities.into();
    Arc::new(move || Ok(entities.to_vec()))
}

// =============================================================================
// Entity Source
// =============================================================================

/// Top-level entities of a pass plus the function extracting their ids.
pub struct EntitySource<T, ID> {
    load: EntityLoader<T>,
    id_of: IdExtractor<T, ID>,
}

impl<T, ID> Clone for EntitySource<T, ID> {
    fn clone(&self) -> Self {
        Self {
            load: Arc::clone(&self.load),
            id_of: Arc::clone(&self.id_of),
        }
    }
}

impl<T, ID> EntitySource<T, ID>
where
    T: Send + 'static,
    ID: EntityId,
{
    /// Assemble an already materialized batch; it is cloned for every pass.
    pub fn from_entities<X>(entities: Vec<T>, id_of: X) -> Self
    where
        T: Clone + Sync,
        X: Fn(&T) -> ID + Send + Sync + 'static,
    {
        Self {
            load: shared_loader(entities),
            id_of: Arc::new(id_of),
        }
    }

    /// Assemble the batch produced by `supplier`, invoked once per pass.
    pub fn from_supplier<S, I, E, X>(supplier: S, id_of: X) -> Self
    where
        S: Fn() -> Result<I, E> + Send + Sync + 'static,
        I: IntoIterator<Item = T> + 'static,
        E: Into<BoxError> + 'static,
        X: Fn(&T) -> ID + Send + Sync + 'static,
    {
        Self {
            load: Arc::new(move || {
                supplier()
                    .map(|entities| entities.into_iter().collect())
                    .map_err(RetrievalFailure::new)
            }),
            id_of: Arc::new(id_of),
        }
    }

    /// Configure the lookups and the combiner for this source.
    pub fn assemble_with<M, C, A>(self, mappers: M, combiner: C) -> Assembler<T, ID, M, C>
    where
        M: MapperSet<ID>,
        C: Fn(T, M::Values) -> A + Send + Sync + 'static,
    {
        Assembler {
            source: self,
            mappers: Arc::new(mappers),
            combiner: Arc::new(combiner),
            errors: identity_converter(),
        }
    }
}

// =============================================================================
// Assembler
// =============================================================================

/// A configured assembly pipeline.
///
/// Reusable: every call to [`assemble_using`](Self::assemble_using) is an
/// independent pass, while mapper state (such as a [`Cached`](crate::Cached)
/// decorator) lives as long as the assembler.
pub struct Assembler<T, ID, M, C, E = AggregationFailure> {
    source: EntitySource<T, ID>,
    mappers: Arc<M>,
    combiner: Arc<C>,
    errors: ErrorConverter<E>,
}

impl<T, ID, M, C, E> Clone for Assembler<T, ID, M, C, E> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
            mappers: Arc::clone(&self.mappers),
            combiner: Arc::clone(&self.combiner),
            errors: Arc::clone(&self.errors),
        }
    }
}

impl<T, ID, M, C, E> Assembler<T, ID, M, C, E>
where
    T: Send + 'static,
    ID: EntityId,
    M: MapperSet<ID>,
{
    /// Surface failures as `E` instead of [`AggregationFailure`].
    pub fn with_error_converter<E2, F>(self, converter: F) -> Assembler<T, ID, M, C, E2>
    where
        F: Fn(AggregationFailure) -> E2 + Send + Sync + 'static,
    {
        Assembler {
            source: self.source,
            mappers: self.mappers,
            combiner: self.combiner,
            errors: Arc::new(converter),
        }
    }

    /// Same lookups, combiner and error converter over another batch.
    ///
    /// Mappers are shared, not copied, so caches carry over.
    pub fn with_entities(&self, entities: Vec<T>) -> Self
    where
        T: Clone + Sync,
    {
        Self {
            source: EntitySource {
                load: shared_loader(entities),
                id_of: Arc::clone(&self.source.id_of),
            },
            mappers: Arc::clone(&self.mappers),
            combiner: Arc::clone(&self.combiner),
            errors: Arc::clone(&self.errors),
        }
    }

    /// Number of configured lookups
    pub fn lookups(&self) -> usize {
        self.mappers.len()
    }

    /// Run one assembly pass through `adapter`.
    pub fn assemble_using<A, Ad>(&self, adapter: Ad) -> Ad::Output
    where
        C: Fn(T, M::Values) -> A + Send + Sync + 'static,
        A: Send + 'static,
        Ad: AssemblerAdapter<A, E>,
    {
        let entities = match (self.source.load)() {
            Ok(entities) => entities,
            Err(source) => {
                tracing::warn!(error = %source, "entity source failed");
                return adapter.reject((self.errors)(AggregationFailure::EntitySource(source)));
            }
        };

        let ids: IdBatch<ID> = entities.iter().map(|e| (self.source.id_of)(e)).collect();
        tracing::debug!(
            entities = entities.len(),
            lookups = self.mappers.len(),
            "dispatching lookups"
        );

        let sources = M::sources(&self.mappers, &ids);
        let build = aggregate_builder::<T, ID, M, C, A>(
            entities,
            Arc::clone(&self.source.id_of),
            Arc::clone(&self.combiner),
        );
        adapter.convert(sources, build, Arc::clone(&self.errors))
    }
}

/// Correlate result maps back to `entities`, in order, through `combiner`.
fn aggregate_builder<T, ID, M, C, A>(
    entities: Vec<T>,
    id_of: IdExtractor<T, ID>,
    combiner: Arc<C>,
) -> AggregateBuilder<A>
where
    T: Send + 'static,
    ID: EntityId,
    M: MapperSet<ID>,
    C: Fn(T, M::Values) -> A + Send + Sync + 'static,
    A: Send + 'static,
{
    Box::new(move |results| {
        let results = M::downcast(results)?;
        let aggregates = entities
            .into_iter()
            .map(|entity| {
                let id = id_of(&entity);
                M::values(&results, &id)
                    .map(|values| combiner(entity, values))
                    .map_err(|lookup| AggregationFailure::MissingResult { lookup })
            })
            .collect::<Result<Vec<A>, _>>()?;
        tracing::debug!(aggregates = aggregates.len(), "assembly pass complete");
        Ok(aggregates)
    })
}

// =============================================================================
// Mapper Sets
// =============================================================================

/// Ordered, heterogeneous set of mappers sharing one id type.
///
/// Implemented for tuples of up to eight mappers; `()` configures no lookup.
pub trait MapperSet<ID>: Send + Sync + 'static {
    /// Typed result maps, one per mapper
    type Results;

    /// Per-entity values handed to the combiner, one per mapper
    type Values;

    /// Number of mappers
    fn len(&self) -> usize;

    /// Whether the set is empty
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// One unit of work per mapper, each reading the shared id batch
    fn sources(this: &Arc<Self>, ids: &IdBatch<ID>) -> Vec<MapperSource>;

    /// Restore the typed result maps from adapter output
    fn downcast(results: Vec<ErasedResults>) -> Result<Self::Results, ConfigurationError>;

    /// Values for `id`, or the index of the lookup that has no entry
    fn values(results: &Self::Results, id: &ID) -> Result<Self::Values, usize>;
}

fn check_count(results: &[ErasedResults], expected: usize) -> Result<(), ConfigurationError> {
    if results.len() == expected {
        Ok(())
    } else {
        Err(ConfigurationError::ResultCountMismatch {
            expected,
            actual: results.len(),
        })
    }
}

fn next_results<R: Any>(
    results: &mut impl Iterator<Item = ErasedResults>,
    lookup: usize,
    expected: usize,
) -> Result<R, ConfigurationError> {
    let erased = results
        .next()
        .ok_or(ConfigurationError::ResultCountMismatch {
            expected,
            actual: lookup,
        })?;
    erased
        .downcast::<R>()
        .map(|typed| *typed)
        .map_err(|_| ConfigurationError::ResultTypeMismatch { lookup })
}

fn run_lookup<ID, M>(
    mapper: &M,
    ids: &[ID],
    lookup: usize,
) -> Result<ErasedResults, AggregationFailure>
where
    ID: EntityId,
    M: Mapper<ID>,
    M::Output: Send + 'static,
{
    tracing::trace!(lookup, ids = ids.len(), "running lookup");
    mapper
        .map(ids)
        .map(|found| Box::new(found) as ErasedResults)
        .map_err(|source| AggregationFailure::Retrieval { lookup, source })
}

impl<ID: EntityId> MapperSet<ID> for () {
    type Results = ();
    type Values = ();

    fn len(&self) -> usize {
        0
    }

    fn sources(_this: &Arc<Self>, _ids: &IdBatch<ID>) -> Vec<MapperSource> {
        Vec::new()
    }

    fn downcast(results: Vec<ErasedResults>) -> Result<(), ConfigurationError> {
        check_count(&results, 0)
    }

    fn values(_results: &(), _id: &ID) -> Result<(), usize> {
        Ok(())
    }
}

macro_rules! impl_mapper_set {
    ($count:expr; $($idx:tt => $m:ident),+) => {
        impl<ID, $($m),+> MapperSet<ID> for ($($m,)+)
        where
            ID: EntityId,
            $(
                $m: Mapper<ID> + 'static,
                <$m as Mapper<ID>>::Output: Clone + Send + 'static,
            )+
        {
            type Results = ($(HashMap<ID, <$m as Mapper<ID>>::Output>,)+);
            type Values = ($(<$m as Mapper<ID>>::Output,)+);

            fn len(&self) -> usize {
                $count
            }

            fn sources(this: &Arc<Self>, ids: &IdBatch<ID>) -> Vec<MapperSource> {
                vec![$({
                    let set = Arc::clone(this);
                    let ids = Arc::clone(ids);
                    Box::new(move || run_lookup(&set.$idx, &ids, $idx)) as MapperSource
                }),+]
            }

            fn downcast(results: Vec<ErasedResults>) -> Result<Self::Results, ConfigurationError> {
                check_count(&results, $count)?;
                let mut results = results.into_iter();
                Ok(($(
                    next_results::<HashMap<ID, <$m as Mapper<ID>>::Output>>(
                        &mut results,
                        $idx,
                        $count,
                    )?,
                )+))
            }

            fn values(results: &Self::Results, id: &ID) -> Result<Self::Values, usize> {
                Ok(($(
                    results.$idx.get(id).cloned().ok_or($idx as usize)?,
                )+))
            }
        }
    };
}

impl_mapper_set!(1; 0 => M0);
impl_mapper_set!(2; 0 => M0, 1 => M1);
impl_mapper_set!(3; 0 => M0, 1 => M1, 2 => M2);
impl_mapper_set!(4; 0 => M0, 1 => M1, 2 => M2, 3 => M3);
impl_mapper_set!(5; 0 => M0, 1 => M1, 2 => M2, 3 => M3, 4 => M4);
impl_mapper_set!(6; 0 => M0, 1 => M1, 2 => M2, 3 => M3, 4 => M4, 5 => M5);
impl_mapper_set!(7; 0 => M0, 1 => M1, 2 => M2, 3 => M3, 4 => M4, 5 => M5, 6 => M6);
impl_mapper_set!(8; 0 => M0, 1 => M1, 2 => M2, 3 => M3, 4 => M4, 5 => M5, 6 => M6, 7 => M7);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapper::{from_fn, FnMapper};

    type Lookup = FnMapper<fn(&[u64]) -> Result<HashMap<u64, u64>, RetrievalFailure>, u64>;

    fn squares(ids: &[u64]) -> Result<HashMap<u64, u64>, RetrievalFailure> {
        Ok(ids.iter().map(|id| (*id, id * id)).collect())
    }

    fn lookup() -> Lookup {
        from_fn(squares as fn(&[u64]) -> Result<HashMap<u64, u64>, RetrievalFailure>)
    }

    #[test]
    fn sources_follow_mapper_order() {
        let set = Arc::new((lookup(), lookup()));
        let ids: IdBatch<u64> = vec![2, 3].into();

        let results: Vec<ErasedResults> = <(Lookup, Lookup) as MapperSet<u64>>::sources(&set, &ids)
            .into_iter()
            .map(|source| source().unwrap())
            .collect();
        let (first, second) = <(Lookup, Lookup) as MapperSet<u64>>::downcast(results).unwrap();

        assert_eq!(set.len(), 2);
        assert_eq!(first[&3], 9);
        assert_eq!(second[&2], 4);
    }

    #[test]
    fn downcast_rejects_wrong_result_count() {
        let results: Vec<ErasedResults> = vec![Box::new(HashMap::<u64, u64>::new())];

        let err = <(Lookup, Lookup) as MapperSet<u64>>::downcast(results).unwrap_err();

        assert_eq!(
            err,
            ConfigurationError::ResultCountMismatch {
                expected: 2,
                actual: 1
            }
        );
    }

    #[test]
    fn downcast_rejects_wrong_result_type() {
        let results: Vec<ErasedResults> = vec![Box::new(HashMap::<u64, String>::new())];

        let err = <(Lookup,) as MapperSet<u64>>::downcast(results).unwrap_err();

        assert_eq!(err, ConfigurationError::ResultTypeMismatch { lookup: 0 });
    }

    #[test]
    fn values_report_lookup_without_entry() {
        let results = (
            HashMap::from([(1u64, 1u64)]),
            HashMap::<u64, u64>::new(),
        );

        assert_eq!(<(Lookup, Lookup) as MapperSet<u64>>::values(&results, &1), Err(1));
        assert_eq!(<(Lookup, Lookup) as MapperSet<u64>>::values(&results, &2), Err(0));
    }

    #[test]
    fn widest_set_reports_last_lookup_without_entry() {
        type Eight = (Lookup, Lookup, Lookup, Lookup, Lookup, Lookup, Lookup, Lookup);
        let hit = || HashMap::from([(5u64, 25u64)]);
        let results = (
            hit(),
            hit(),
            hit(),
            hit(),
            hit(),
            hit(),
            hit(),
            HashMap::<u64, u64>::new(),
        );

        assert_eq!(<Eight as MapperSet<u64>>::values(&results, &5), Err(7));
    }
}

//! Keyed lookups ("mappers")
//!
//! A mapper resolves a batch of ids to an `id -> value` map with one
//! batched retrieval. The constructors in this module wrap caller-supplied
//! retrieval functions and shape their raw results:
//!
//! - [`one_to_one`] / [`one_to_one_with_default`]: one value per id, misses
//!   resolved through a default provider
//! - [`one_to_many`] / [`one_to_many_as_list`] / [`one_to_many_as_set`]:
//!   results grouped per id into a collection, misses resolved to an empty one
//! - [`cached`]: per-id memoization over any mapper
//!
//! Retrieval functions receive the id batch in the collection shape they
//! declare (`Vec<ID>` keeps duplicates, `HashSet<ID>` / `BTreeSet<ID>` do not).

mod cached;
mod one_to_many;
mod one_to_one;

pub use cached::Cached;
pub use one_to_many::OneToMany;
pub use one_to_one::OneToOne;

use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::error::{BoxError, RetrievalFailure};

/// Bound satisfied by every id type the engine can correlate on.
pub trait EntityId: Eq + Hash + Clone + Send + Sync + 'static {}

impl<T> EntityId for T where T: Eq + Hash + Clone + Send + Sync + 'static {}

/// Resolves a batch of ids to per-id results.
///
/// Implementations must return an entry for every id of the batch; the
/// constructors in this module guarantee that by substituting defaults.
/// The id batch is shared by every lookup of a pass and is read-only.
pub trait Mapper<ID>: Send + Sync {
    /// Value stored per id
    type Output;

    /// Run the retrieval for `ids` and key its results by id
    fn map(&self, ids: &[ID]) -> Result<HashMap<ID, Self::Output>, RetrievalFailure>;
}

impl<ID, M> Mapper<ID> for Arc<M>
where
    M: Mapper<ID> + ?Sized,
{
    type Output = M::Output;

    fn map(&self, ids: &[ID]) -> Result<HashMap<ID, Self::Output>, RetrievalFailure> {
        (**self).map(ids)
    }
}

/// Retrieval function after its result collection and error have been normalised.
pub(crate) type QueryFn<IDC, R> =
    Box<dyn Fn(IDC) -> Result<Vec<R>, RetrievalFailure> + Send + Sync>;

/// Extracts the id a retrieved value belongs to.
pub(crate) type IdFn<R, ID> = Box<dyn Fn(&R) -> ID + Send + Sync>;

fn query_fn<IDC, R, C, E, Q>(query: Q) -> QueryFn<IDC, R>
where
    Q: Fn(IDC) -> Result<C, E> + Send + Sync + 'static,
    C: IntoIterator<Item = R> + 'static,
    E: Into<BoxError> + 'static,
    IDC: 'static,
    R: 'static,
{
    Box::new(move |ids| {
        query(ids)
            .map(|found| found.into_iter().collect())
            .map_err(RetrievalFailure::new)
    })
}

/// One value per id; ids without a result map to `None`.
pub fn one_to_one<ID, IDC, R, C, E, Q, X>(query: Q, id_of: X) -> OneToOne<ID, IDC, R, Option<R>>
where
    ID: EntityId,
    IDC: FromIterator<ID> + 'static,
    R: Send + 'static,
    C: IntoIterator<Item = R> + 'static,
    E: Into<BoxError> + 'static,
    Q: Fn(IDC) -> Result<C, E> + Send + Sync + 'static,
    X: Fn(&R) -> ID + Send + Sync + 'static,
{
    one_to_one_with_default(query, id_of, |_: &ID| None)
}

/// One value per id; ids without a result map to `default(id)`.
pub fn one_to_one_with_default<ID, IDC, R, V, C, E, Q, X, D>(
    query: Q,
    id_of: X,
    default: D,
) -> OneToOne<ID, IDC, R, V>
where
    ID: EntityId,
    IDC: FromIterator<ID> + 'static,
    R: Into<V> + Send + 'static,
    C: IntoIterator<Item = R> + 'static,
    E: Into<BoxError> + 'static,
    Q: Fn(IDC) -> Result<C, E> + Send + Sync + 'static,
    X: Fn(&R) -> ID + Send + Sync + 'static,
    D: Fn(&ID) -> V + Send + Sync + 'static,
{
    OneToOne::new(query_fn(query), Box::new(id_of), Box::new(default))
}

/// Results grouped per id into collections built by `factory`; ids without
/// results map to an empty collection.
pub fn one_to_many<ID, IDC, R, D, C, E, Q, X, F>(
    query: Q,
    id_of: X,
    factory: F,
) -> OneToMany<ID, IDC, R, D>
where
    ID: EntityId,
    IDC: FromIterator<ID> + 'static,
    R: Send + 'static,
    D: Extend<R>,
    C: IntoIterator<Item = R> + 'static,
    E: Into<BoxError> + 'static,
    Q: Fn(IDC) -> Result<C, E> + Send + Sync + 'static,
    X: Fn(&R) -> ID + Send + Sync + 'static,
    F: Fn() -> D + Send + Sync + 'static,
{
    OneToMany::new(query_fn(query), Box::new(id_of), Box::new(factory))
}

/// [`one_to_many`] collecting into a `Vec`, in retrieval order.
pub fn one_to_many_as_list<ID, IDC, R, C, E, Q, X>(
    query: Q,
    id_of: X,
) -> OneToMany<ID, IDC, R, Vec<R>>
where
    ID: EntityId,
    IDC: FromIterator<ID> + 'static,
    R: Send + 'static,
    C: IntoIterator<Item = R> + 'static,
    E: Into<BoxError> + 'static,
    Q: Fn(IDC) -> Result<C, E> + Send + Sync + 'static,
    X: Fn(&R) -> ID + Send + Sync + 'static,
{
    one_to_many(query, id_of, Vec::new)
}

/// [`one_to_many`] collecting into a `HashSet`.
pub fn one_to_many_as_set<ID, IDC, R, C, E, Q, X>(
    query: Q,
    id_of: X,
) -> OneToMany<ID, IDC, R, HashSet<R>>
where
    ID: EntityId,
    IDC: FromIterator<ID> + 'static,
    R: Eq + Hash + Send + 'static,
    C: IntoIterator<Item = R> + 'static,
    E: Into<BoxError> + 'static,
    Q: Fn(IDC) -> Result<C, E> + Send + Sync + 'static,
    X: Fn(&R) -> ID + Send + Sync + 'static,
{
    one_to_many(query, id_of, HashSet::new)
}

/// Memoize `mapper` per id for the lifetime of the returned decorator.
pub fn cached<ID, M>(mapper: M) -> Cached<ID, M>
where
    ID: EntityId,
    M: Mapper<ID>,
    M::Output: Clone + Send,
{
    Cached::new(mapper)
}

/// Mapper backed by a closure that already produces the keyed map.
pub struct FnMapper<F, R> {
    lookup: F,
    _output: PhantomData<fn() -> R>,
}

/// Use `lookup` as a mapper as-is.
pub fn from_fn<ID, R, F>(lookup: F) -> FnMapper<F, R>
where
    F: Fn(&[ID]) -> Result<HashMap<ID, R>, RetrievalFailure> + Send + Sync,
{
    FnMapper {
        lookup,
        _output: PhantomData,
    }
}

impl<ID, R, F> Mapper<ID> for FnMapper<F, R>
where
    F: Fn(&[ID]) -> Result<HashMap<ID, R>, RetrievalFailure> + Send + Sync,
{
    type Output = R;

    fn map(&self, ids: &[ID]) -> Result<HashMap<ID, R>, RetrievalFailure> {
        (self.lookup)(ids)
    }
}

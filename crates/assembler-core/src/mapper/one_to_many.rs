//! One-to-many keyed lookup

use std::collections::HashMap;
use std::iter;

use super::{EntityId, IdFn, Mapper, QueryFn};
use crate::error::RetrievalFailure;

/// Retrieved values grouped per id into a caller-chosen collection `D`.
pub struct OneToMany<ID, IDC, R, D> {
    query: QueryFn<IDC, R>,
    id_of: IdFn<R, ID>,
    factory: Box<dyn Fn() -> D + Send + Sync>,
}

impl<ID, IDC, R, D> OneToMany<ID, IDC, R, D> {
    pub(crate) fn new(
        query: QueryFn<IDC, R>,
        id_of: IdFn<R, ID>,
        factory: Box<dyn Fn() -> D + Send + Sync>,
    ) -> Self {
        Self {
            query,
            id_of,
            factory,
        }
    }
}

impl<ID, IDC, R, D> Mapper<ID> for OneToMany<ID, IDC, R, D>
where
    ID: EntityId,
    IDC: FromIterator<ID>,
    D: Extend<R>,
{
    type Output = D;

    fn map(&self, ids: &[ID]) -> Result<HashMap<ID, D>, RetrievalFailure> {
        let found = (self.query)(ids.iter().cloned().collect())?;

        let mut grouped: HashMap<ID, D> = HashMap::with_capacity(ids.len());
        for value in found {
            grouped
                .entry((self.id_of)(&value))
                .or_insert_with(|| (self.factory)())
                .extend(iter::once(value));
        }

        // Ids without results still get an (empty) collection
        for id in ids {
            if !grouped.contains_key(id) {
                grouped.insert(id.clone(), (self.factory)());
            }
        }

        Ok(grouped)
    }
}

//! One-to-one keyed lookup

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use super::{EntityId, IdFn, Mapper, QueryFn};
use crate::error::RetrievalFailure;

/// One retrieved value per id, with a default provider for misses.
///
/// `R` is the retrieved type and `V` the stored type; `one_to_one` stores
/// `Option<R>`, `one_to_one_with_default` stores whatever its provider yields.
pub struct OneToOne<ID, IDC, R, V> {
    query: QueryFn<IDC, R>,
    id_of: IdFn<R, ID>,
    default: Box<dyn Fn(&ID) -> V + Send + Sync>,
}

impl<ID, IDC, R, V> OneToOne<ID, IDC, R, V> {
    pub(crate) fn new(
        query: QueryFn<IDC, R>,
        id_of: IdFn<R, ID>,
        default: Box<dyn Fn(&ID) -> V + Send + Sync>,
    ) -> Self {
        Self {
            query,
            id_of,
            default,
        }
    }
}

impl<ID, IDC, R, V> Mapper<ID> for OneToOne<ID, IDC, R, V>
where
    ID: EntityId,
    IDC: FromIterator<ID>,
    R: Into<V>,
{
    type Output = V;

    fn map(&self, ids: &[ID]) -> Result<HashMap<ID, V>, RetrievalFailure> {
        let found = (self.query)(ids.iter().cloned().collect())?;

        let retrieved = found.len();
        let mut duplicates = 0usize;
        let mut mapped = HashMap::with_capacity(ids.len().max(retrieved));
        for value in found {
            match mapped.entry((self.id_of)(&value)) {
                Entry::Vacant(slot) => {
                    slot.insert(value.into());
                }
                // First match wins
                Entry::Occupied(_) => duplicates += 1,
            }
        }
        if duplicates > 0 {
            tracing::warn!(
                retrieved,
                duplicates,
                "one-to-one retrieval returned several results for one id"
            );
        }

        for id in ids {
            if !mapped.contains_key(id) {
                let fallback = (self.default)(id);
                mapped.insert(id.clone(), fallback);
            }
        }

        Ok(mapped)
    }
}

//! Per-id memoizing mapper decorator
//!
//! Every id is retrieved through the wrapped mapper at most once over the
//! lifetime of the decorator. Each id of a request is either *claimed* (the
//! caller inserts a pending slot and fetches it) or *awaited* (another
//! caller already owns the slot). Claims are made under a short lock over
//! the slot table; the retrieval itself runs without any lock held, so
//! lookups over disjoint ids proceed in parallel.
//!
//! A failed retrieval releases its claims: the slots are removed and
//! waiters re-claim the ids themselves, so a transient failure is never
//! memoized.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};

use super::{EntityId, Mapper};
use crate::error::RetrievalFailure;

enum SlotState<V> {
    Pending,
    /// `None` records that the wrapped mapper had no entry for the id
    Resolved(Option<V>),
    Abandoned,
}

struct Slot<V> {
    state: Mutex<SlotState<V>>,
    settled: Condvar,
}

impl<V: Clone> Slot<V> {
    fn pending() -> Self {
        Self {
            state: Mutex::new(SlotState::Pending),
            settled: Condvar::new(),
        }
    }

    fn settle(&self, outcome: SlotState<V>) {
        *self.state.lock() = outcome;
        self.settled.notify_all();
    }

    /// Block until the owning caller settles the slot.
    ///
    /// Returns `None` when the owner gave up and the id must be claimed again.
    fn wait(&self) -> Option<Option<V>> {
        let mut state = self.state.lock();
        loop {
            match &*state {
                SlotState::Pending => self.settled.wait(&mut state),
                SlotState::Resolved(value) => return Some(value.clone()),
                SlotState::Abandoned => return None,
            }
        }
    }
}

type SlotTable<ID, V> = Mutex<HashMap<ID, Arc<Slot<V>>>>;

/// Ids claimed by one caller; abandoned on drop unless settled.
struct Claim<'a, ID: EntityId, V: Clone> {
    table: &'a SlotTable<ID, V>,
    slots: Vec<(ID, Arc<Slot<V>>)>,
}

impl<ID: EntityId, V: Clone> Claim<'_, ID, V> {
    fn ids(&self) -> Vec<ID> {
        self.slots.iter().map(|(id, _)| id.clone()).collect()
    }

    fn settle(mut self, mut fetched: HashMap<ID, V>, resolved: &mut HashMap<ID, V>) {
        for (id, slot) in self.slots.drain(..) {
            let value = fetched.remove(&id);
            slot.settle(SlotState::Resolved(value.clone()));
            if let Some(value) = value {
                resolved.insert(id, value);
            }
        }
    }
}

impl<ID: EntityId, V: Clone> Drop for Claim<'_, ID, V> {
    fn drop(&mut self) {
        if self.slots.is_empty() {
            return;
        }
        let mut table = self.table.lock();
        for (id, slot) in self.slots.drain(..) {
            table.remove(&id);
            slot.settle(SlotState::Abandoned);
        }
    }
}

/// Memoizing decorator returned by [`cached`](super::cached).
pub struct Cached<ID, M: Mapper<ID>> {
    inner: M,
    slots: SlotTable<ID, M::Output>,
}

impl<ID, M> Cached<ID, M>
where
    ID: EntityId,
    M: Mapper<ID>,
    M::Output: Clone + Send,
{
    /// Wrap `inner`
    pub fn new(inner: M) -> Self {
        Self {
            inner,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Number of ids with a settled or in-flight retrieval
    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    /// Whether no id has been requested yet
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Split `ids` into ids this caller now owns and slots owned by others.
    fn claim(&self, ids: &[ID]) -> (Claim<'_, ID, M::Output>, Vec<(ID, Arc<Slot<M::Output>>)>) {
        let mut claimed = Vec::new();
        let mut awaited = Vec::new();

        let mut table = self.slots.lock();
        for id in ids {
            match table.get(id) {
                Some(slot) => awaited.push((id.clone(), Arc::clone(slot))),
                None => {
                    let slot = Arc::new(Slot::pending());
                    table.insert(id.clone(), Arc::clone(&slot));
                    claimed.push((id.clone(), slot));
                }
            }
        }
        drop(table);

        let claim = Claim {
            table: &self.slots,
            slots: claimed,
        };
        (claim, awaited)
    }
}

impl<ID, M> Mapper<ID> for Cached<ID, M>
where
    ID: EntityId,
    M: Mapper<ID>,
    M::Output: Clone + Send,
{
    type Output = M::Output;

    fn map(&self, ids: &[ID]) -> Result<HashMap<ID, M::Output>, RetrievalFailure> {
        let mut seen = HashSet::with_capacity(ids.len());
        let mut outstanding: Vec<ID> = ids
            .iter()
            .filter(|id| seen.insert(*id))
            .cloned()
            .collect();
        let mut resolved = HashMap::with_capacity(outstanding.len());

        while !outstanding.is_empty() {
            let (claim, awaited) = self.claim(&outstanding);

            if !claim.slots.is_empty() {
                let missing = claim.ids();
                tracing::trace!(
                    fetched = missing.len(),
                    cached = awaited.len(),
                    "cached lookup fetching unseen ids"
                );
                // An error drops the claim, which abandons its slots
                let fetched = self.inner.map(&missing)?;
                claim.settle(fetched, &mut resolved);
            }

            outstanding = Vec::new();
            for (id, slot) in awaited {
                match slot.wait() {
                    Some(Some(value)) => {
                        resolved.insert(id, value);
                    }
                    Some(None) => {}
                    None => outstanding.push(id),
                }
            }
        }

        Ok(resolved)
    }
}

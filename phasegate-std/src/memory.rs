//! An in-memory persistence port.
//!
//! [`MemoryStore`] keeps records in insertion order behind a lock. It backs
//! the crate's tests and is a reasonable port for prototypes and fixtures.

use phasegate_core::{Actor, Change, PersistenceError, PersistencePort, Query, Record, Selector};
use std::marker::PhantomData;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A query the in-memory store can evaluate.
pub trait RecordQuery<R>: Query {
    /// Whether `record` is selected by this query.
    fn matches(&self, record: &R) -> bool;

    /// The maximum number of records a read returns.
    fn limit(&self) -> Option<usize> {
        None
    }
}

/// A [`PersistencePort`] over a `Vec` of records.
///
/// Records without an identifier can be inserted but never selected by id.
/// Selective record updates are applied as full overwrites.
pub struct MemoryStore<R, Q> {
    records: RwLock<Vec<R>>,
    _query: PhantomData<fn() -> Q>,
}

impl<R: Record, Q> MemoryStore<R, Q> {
    /// An empty store.
    pub fn new() -> Self {
        Self::with_records([])
    }

    /// A store seeded with `records`.
    pub fn with_records(records: impl IntoIterator<Item = R>) -> Self {
        Self {
            records: RwLock::new(records.into_iter().collect()),
            _query: PhantomData,
        }
    }

    /// A copy of every stored record, in insertion order.
    pub fn snapshot(&self) -> Result<Vec<R>, PersistenceError> {
        Ok(self.read()?.clone())
    }

    /// Number of stored records.
    pub fn len(&self) -> Result<usize, PersistenceError> {
        Ok(self.read()?.len())
    }

    /// Whether the store holds no records.
    pub fn is_empty(&self) -> Result<bool, PersistenceError> {
        Ok(self.read()?.is_empty())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Vec<R>>, PersistenceError> {
        self.records
            .read()
            .map_err(|_| PersistenceError::Backend("memory store lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Vec<R>>, PersistenceError> {
        self.records
            .write()
            .map_err(|_| PersistenceError::Backend("memory store lock poisoned".into()))
    }
}

impl<R: Record, Q> Default for MemoryStore<R, Q> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Record, Q> std::fmt::Debug for MemoryStore<R, Q> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("record", &R::DESCRIPTOR.name)
            .finish_non_exhaustive()
    }
}

fn selected<R: Record, Q: RecordQuery<R>>(selector: &Selector<R::Id, Q>, record: &R) -> bool {
    match selector {
        Selector::Id(id) => record.id() == Some(id),
        Selector::Ids(ids) => record.id().is_some_and(|id| ids.contains(id)),
        Selector::Query(query) => query.matches(record),
    }
}

impl<R: Record, Q: RecordQuery<R>> PersistencePort<R> for MemoryStore<R, Q> {
    type Query = Q;

    fn select_by_query(
        &self,
        query: &Q,
        _actor: Option<&Actor>,
    ) -> Result<Vec<R>, PersistenceError> {
        let records = self.read()?;
        let matching = records.iter().filter(|record| query.matches(record)).cloned();
        Ok(match query.limit() {
            Some(limit) => matching.take(limit).collect(),
            None => matching.collect(),
        })
    }

    fn select_by_id(
        &self,
        id: &R::Id,
        _actor: Option<&Actor>,
    ) -> Result<Option<R>, PersistenceError> {
        let records = self.read()?;
        Ok(records.iter().find(|record| record.id() == Some(id)).cloned())
    }

    fn count(&self, query: &Q) -> Result<u64, PersistenceError> {
        let records = self.read()?;
        Ok(records.iter().filter(|record| query.matches(record)).count() as u64)
    }

    fn insert(&self, records: &[R], ignore: bool) -> Result<u64, PersistenceError> {
        let mut stored = self.write()?;
        let mut accepted: Vec<R> = Vec::with_capacity(records.len());
        for record in records {
            let duplicate = record.id().is_some_and(|id| {
                stored
                    .iter()
                    .chain(accepted.iter())
                    .any(|existing| existing.id() == Some(id))
            });
            if !duplicate {
                accepted.push(record.clone());
            } else if !ignore {
                return Err(PersistenceError::Constraint(format!(
                    "duplicate {} id {:?}",
                    R::DESCRIPTOR.name,
                    record.id()
                )));
            }
        }
        let inserted = accepted.len() as u64;
        stored.extend(accepted);
        Ok(inserted)
    }

    fn update(
        &self,
        change: &Change<R>,
        selector: &Selector<R::Id, Q>,
    ) -> Result<u64, PersistenceError> {
        let mut stored = self.write()?;
        let mut affected = 0;
        for record in stored.iter_mut().filter(|record| selected(selector, record)) {
            change.apply_to(record);
            affected += 1;
        }
        Ok(affected)
    }

    fn delete(&self, selector: &Selector<R::Id, Q>) -> Result<u64, PersistenceError> {
        let mut stored = self.write()?;
        let before = stored.len();
        stored.retain(|record| !selected(selector, record));
        Ok((before - stored.len()) as u64)
    }
}

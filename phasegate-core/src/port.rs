//! The persistence port: the storage surface dispatchers read and write through.

use crate::actor::Actor;
use crate::error::PersistenceError;
use crate::record::Record;
use crate::selector::{Change, Selector};
use std::fmt::Debug;

/// Marker for query types understood by a persistence port.
///
/// Queries are opaque to the pipeline; query consumers may rewrite them in
/// place before the port sees them.
pub trait Query: Clone + Debug + Send + Sync + 'static {}

impl<T: Clone + Debug + Send + Sync + 'static> Query for T {}

/// The storage read/write surface for one record type.
///
/// All methods are synchronous. Empty and absent results are valid; only the
/// dispatchers decide when "nothing matched" is a failure.
///
/// ## Thread Safety
///
/// Ports are shared by every dispatcher of a record type and called from
/// whatever threads call those dispatchers, so they must be `Send + Sync`.
pub trait PersistencePort<R: Record>: Send + Sync + 'static {
    /// The query type this port understands.
    type Query: Query;

    /// Every record matching `query`.
    fn select_by_query(
        &self,
        query: &Self::Query,
        actor: Option<&Actor>,
    ) -> Result<Vec<R>, PersistenceError>;

    /// The record with identifier `id`, if any.
    fn select_by_id(&self, id: &R::Id, actor: Option<&Actor>)
    -> Result<Option<R>, PersistenceError>;

    /// The records with the given identifiers, skipping unknown ones.
    fn select_by_ids(
        &self,
        ids: &[R::Id],
        actor: Option<&Actor>,
    ) -> Result<Vec<R>, PersistenceError> {
        let mut found = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(record) = self.select_by_id(id, actor)? {
                found.push(record);
            }
        }
        Ok(found)
    }

    /// The first record matching `query`, if any.
    fn select_one(
        &self,
        query: &Self::Query,
        actor: Option<&Actor>,
    ) -> Result<Option<R>, PersistenceError> {
        Ok(self.select_by_query(query, actor)?.into_iter().next())
    }

    /// The number of records matching `query`.
    fn count(&self, query: &Self::Query) -> Result<u64, PersistenceError>;

    /// Writes `records`; with `ignore`, duplicates are skipped instead of failing.
    fn insert(&self, records: &[R], ignore: bool) -> Result<u64, PersistenceError>;

    /// Applies `change` to the selected records, returning the affected count.
    fn update(
        &self,
        change: &Change<R>,
        selector: &Selector<R::Id, Self::Query>,
    ) -> Result<u64, PersistenceError>;

    /// Deletes the selected records, returning the affected count.
    fn delete(&self, selector: &Selector<R::Id, Self::Query>) -> Result<u64, PersistenceError>;

    /// Resolves any selector into the records it designates.
    fn select(
        &self,
        selector: &Selector<R::Id, Self::Query>,
        actor: Option<&Actor>,
    ) -> Result<Vec<R>, PersistenceError> {
        match selector {
            Selector::Id(id) => Ok(self.select_by_id(id, actor)?.into_iter().collect()),
            Selector::Ids(ids) => self.select_by_ids(ids, actor),
            Selector::Query(query) => self.select_by_query(query, actor),
        }
    }
}

//! Default core functions backed by a [`PersistencePort`].
//!
//! The factory binds these unless a registration overrides the function of
//! an operation.

use phasegate_core::{
    ActionError, Actor, AuditValue, Change, InsertFunction, MutationFunction, OperationKind,
    Patch, PersistenceError, PersistencePort, Record, SelectFunction, Selector, Yn,
};
use std::sync::Arc;

fn persistence(operation: OperationKind) -> impl FnOnce(PersistenceError) -> ActionError {
    move |source| ActionError::Persistence { operation, source }
}

/// Inserts through [`PersistencePort::insert`].
pub struct PortInsert<P> {
    port: Arc<P>,
}

impl<P> PortInsert<P> {
    /// Binds the function to `port`.
    pub fn new(port: Arc<P>) -> Self {
        Self { port }
    }
}

impl<R: Record, P: PersistencePort<R>> InsertFunction<R> for PortInsert<P> {
    fn insert(&self, records: &[R], ignore: bool, _actor: &Actor) -> Result<u64, ActionError> {
        self.port
            .insert(records, ignore)
            .map_err(persistence(OperationKind::Create))
    }
}

/// Reads every record a selector designates.
///
/// Serves `ListByQuery` and `Export`, and loads the subjects of mutations.
pub struct PortList<P> {
    port: Arc<P>,
    operation: OperationKind,
}

impl<P> PortList<P> {
    /// Binds the function to `port` for `operation`.
    pub fn new(port: Arc<P>, operation: OperationKind) -> Self {
        Self { port, operation }
    }
}

impl<R, P> SelectFunction<R, P::Query, Vec<R>> for PortList<P>
where
    R: Record,
    P: PersistencePort<R>,
{
    fn select(
        &self,
        selector: &Selector<R::Id, P::Query>,
        actor: &Actor,
    ) -> Result<Vec<R>, ActionError> {
        self.port
            .select(selector, Some(actor))
            .map_err(persistence(self.operation))
    }
}

/// Reads at most one record.
pub struct PortDetail<P> {
    port: Arc<P>,
    operation: OperationKind,
}

impl<P> PortDetail<P> {
    /// Binds the function to `port` for `operation`.
    pub fn new(port: Arc<P>, operation: OperationKind) -> Self {
        Self { port, operation }
    }
}

impl<R, P> SelectFunction<R, P::Query, Option<R>> for PortDetail<P>
where
    R: Record,
    P: PersistencePort<R>,
{
    fn select(
        &self,
        selector: &Selector<R::Id, P::Query>,
        actor: &Actor,
    ) -> Result<Option<R>, ActionError> {
        let found = match selector {
            Selector::Id(id) => self.port.select_by_id(id, Some(actor)),
            Selector::Query(query) => self.port.select_one(query, Some(actor)),
            Selector::Ids(ids) => self
                .port
                .select_by_ids(ids, Some(actor))
                .map(|records| records.into_iter().next()),
        };
        found.map_err(persistence(self.operation))
    }
}

/// Counts through [`PersistencePort::count`].
pub struct PortCount<P> {
    port: Arc<P>,
}

impl<P> PortCount<P> {
    /// Binds the function to `port`.
    pub fn new(port: Arc<P>) -> Self {
        Self { port }
    }
}

impl<R, P> SelectFunction<R, P::Query, u64> for PortCount<P>
where
    R: Record,
    P: PersistencePort<R>,
{
    fn select(
        &self,
        selector: &Selector<R::Id, P::Query>,
        actor: &Actor,
    ) -> Result<u64, ActionError> {
        let counted = match selector {
            Selector::Query(query) => self.port.count(query),
            other => self
                .port
                .select(other, Some(actor))
                .map(|records| records.len() as u64),
        };
        counted.map_err(persistence(OperationKind::Count))
    }
}

/// Deletes through [`PersistencePort::delete`].
pub struct PortDelete<P> {
    port: Arc<P>,
    operation: OperationKind,
}

impl<P> PortDelete<P> {
    /// Binds the function to `port` for `operation`.
    pub fn new(port: Arc<P>, operation: OperationKind) -> Self {
        Self { port, operation }
    }
}

impl<R, P> MutationFunction<R, P::Query, ()> for PortDelete<P>
where
    R: Record,
    P: PersistencePort<R>,
{
    fn mutate(
        &self,
        _subjects: &[R],
        selector: &Selector<R::Id, P::Query>,
        _value: &(),
        _actor: &Actor,
    ) -> Result<u64, ActionError> {
        self.port
            .delete(selector)
            .map_err(persistence(self.operation))
    }
}

/// Updates through [`PersistencePort::update`], turning the caller's value
/// into a [`Change`].
pub struct PortUpdate<P, R: Record, V> {
    port: Arc<P>,
    operation: OperationKind,
    change: fn(&V) -> Change<R>,
}

impl<P, R: Record, V> PortUpdate<P, R, V> {
    /// Binds the function to `port` for `operation`.
    pub fn new(port: Arc<P>, operation: OperationKind, change: fn(&V) -> Change<R>) -> Self {
        Self {
            port,
            operation,
            change,
        }
    }

    /// The operation this function serves.
    pub fn operation(&self) -> OperationKind {
        self.operation
    }
}

impl<P, R: Record> PortUpdate<P, R, Patch<R>> {
    /// `Update`: overwrite with the patch's record.
    pub fn record(port: Arc<P>) -> Self {
        Self::new(port, OperationKind::Update, |patch| Change::Record {
            value: patch.record.clone(),
            selective: patch.selective,
        })
    }
}

impl<P, R: Record> PortUpdate<P, R, R::Status> {
    /// `UpdateStatus`.
    pub fn status(port: Arc<P>) -> Self {
        Self::new(port, OperationKind::UpdateStatus, |status| {
            Change::Status(status.clone())
        })
    }
}

impl<P, R: Record> PortUpdate<P, R, bool> {
    /// `UpdateLock`.
    pub fn lock(port: Arc<P>) -> Self {
        Self::new(port, OperationKind::UpdateLock, |locked| Change::Locked(*locked))
    }
}

impl<P, R: Record> PortUpdate<P, R, Yn> {
    /// `UpdateYn`.
    pub fn yn(port: Arc<P>) -> Self {
        Self::new(port, OperationKind::UpdateYn, |yn| Change::Yn(*yn))
    }
}

impl<P, R: Record> PortUpdate<P, R, AuditValue> {
    /// `UpdateAuditStatus`.
    pub fn audit(port: Arc<P>) -> Self {
        Self::new(port, OperationKind::UpdateAuditStatus, |audit| {
            Change::Audit(audit.clone())
        })
    }
}

impl<R, P, V> MutationFunction<R, P::Query, V> for PortUpdate<P, R, V>
where
    R: Record,
    P: PersistencePort<R>,
    V: 'static,
{
    fn mutate(
        &self,
        _subjects: &[R],
        selector: &Selector<R::Id, P::Query>,
        value: &V,
        _actor: &Actor,
    ) -> Result<u64, ActionError> {
        self.port
            .update(&(self.change)(value), selector)
            .map_err(persistence(self.operation))
    }
}

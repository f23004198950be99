//! The assembled dispatcher set of one record type.

use crate::dispatch::{InsertDispatcher, MutationDispatcher, SelectDispatcher};
use phasegate_core::{
    ActionError, Actor, AuditValue, OperationKind, Patch, PersistencePort, Record, Selector, Yn,
};
use std::fmt::Debug;
use std::sync::Arc;

type Query<R, P> = <P as PersistencePort<R>>::Query;

/// Selects records of `R` through port `P`.
pub type PortSelector<R, P> = Selector<<R as Record>::Id, Query<R, P>>;

/// Every operation a record type supports, ready to call.
///
/// Built by [`DispatcherFactory::build`](crate::DispatcherFactory::build).
/// Read-only and shareable across threads; each method runs one complete
/// call, extensions included.
pub struct Actions<R: Record, P: PersistencePort<R>> {
    pub(crate) create: InsertDispatcher<R, Query<R, P>>,
    pub(crate) list: SelectDispatcher<R, Query<R, P>, Vec<R>>,
    pub(crate) export: SelectDispatcher<R, Query<R, P>, Vec<R>>,
    pub(crate) detail_by_query: SelectDispatcher<R, Query<R, P>, Option<R>>,
    pub(crate) detail_by_id: SelectDispatcher<R, Query<R, P>, Option<R>>,
    pub(crate) count: SelectDispatcher<R, Query<R, P>, u64>,
    pub(crate) delete_by_query: MutationDispatcher<R, Query<R, P>, ()>,
    pub(crate) delete_by_id: MutationDispatcher<R, Query<R, P>, ()>,
    pub(crate) update: MutationDispatcher<R, Query<R, P>, Patch<R>>,
    pub(crate) update_status: Option<MutationDispatcher<R, Query<R, P>, R::Status>>,
    pub(crate) update_lock: Option<MutationDispatcher<R, Query<R, P>, bool>>,
    pub(crate) update_yn: Option<MutationDispatcher<R, Query<R, P>, Yn>>,
    pub(crate) update_audit_status: Option<MutationDispatcher<R, Query<R, P>, AuditValue>>,
    pub(crate) port: Arc<P>,
}

impl<R, P> Actions<R, P>
where
    R: Record,
    P: PersistencePort<R>,
{
    /// Inserts `records`, after filters drop the ones they reject.
    ///
    /// Returns the number of records written.
    pub fn create(&self, records: Vec<R>, actor: &Actor) -> Result<u64, ActionError> {
        self.create.dispatch(records, actor)
    }

    /// Every record matching `query`.
    pub fn list(&self, query: Query<R, P>, actor: &Actor) -> Result<Vec<R>, ActionError> {
        self.list.dispatch(Selector::Query(query), actor)
    }

    /// Every record matching `query`, for bulk export.
    pub fn export(&self, query: Query<R, P>, actor: &Actor) -> Result<Vec<R>, ActionError> {
        self.export.dispatch(Selector::Query(query), actor)
    }

    /// The first record matching `query`.
    ///
    /// # Errors
    ///
    /// [`ActionError::NotFound`] when nothing matches.
    pub fn detail(&self, query: Query<R, P>, actor: &Actor) -> Result<R, ActionError> {
        let selector: PortSelector<R, P> = Selector::Query(query);
        let rendered = selector.to_string();
        let found = self.detail_by_query.dispatch(selector, actor)?;
        found.ok_or_else(|| not_found::<R>(OperationKind::DetailByQuery, rendered))
    }

    /// The record with identifier `id`.
    ///
    /// # Errors
    ///
    /// [`ActionError::NotFound`] when no such record exists.
    pub fn detail_by_id(&self, id: R::Id, actor: &Actor) -> Result<R, ActionError> {
        let selector: PortSelector<R, P> = Selector::Id(id);
        let rendered = selector.to_string();
        let found = self.detail_by_id.dispatch(selector, actor)?;
        found.ok_or_else(|| not_found::<R>(OperationKind::DetailById, rendered))
    }

    /// The number of records matching `query`.
    pub fn count(&self, query: Query<R, P>, actor: &Actor) -> Result<u64, ActionError> {
        self.count.dispatch(Selector::Query(query), actor)
    }

    /// Deletes every record matching `query`.
    pub fn delete(&self, query: Query<R, P>, actor: &Actor) -> Result<u64, ActionError> {
        self.delete_by_query.dispatch(Selector::Query(query), (), actor)
    }

    /// Deletes the record with identifier `id`.
    pub fn delete_by_id(&self, id: R::Id, actor: &Actor) -> Result<u64, ActionError> {
        self.delete_by_id.dispatch(Selector::Id(id), (), actor)
    }

    /// Deletes the records with the given identifiers.
    pub fn delete_by_ids(&self, ids: Vec<R::Id>, actor: &Actor) -> Result<u64, ActionError> {
        self.delete_by_id.dispatch(Selector::Ids(ids), (), actor)
    }

    /// Overwrites what `selector` designates with `patch`.
    pub fn update(
        &self,
        selector: PortSelector<R, P>,
        patch: Patch<R>,
        actor: &Actor,
    ) -> Result<u64, ActionError> {
        self.update.dispatch(selector, patch, actor)
    }

    /// Sets the status column.
    pub fn update_status(
        &self,
        selector: PortSelector<R, P>,
        status: R::Status,
        actor: &Actor,
    ) -> Result<u64, ActionError> {
        supported::<R, _>(&self.update_status, OperationKind::UpdateStatus)?
            .dispatch(selector, status, actor)
    }

    /// Sets the lock flag.
    pub fn update_lock(
        &self,
        selector: PortSelector<R, P>,
        locked: bool,
        actor: &Actor,
    ) -> Result<u64, ActionError> {
        supported::<R, _>(&self.update_lock, OperationKind::UpdateLock)?
            .dispatch(selector, locked, actor)
    }

    /// Sets the yes/no flag.
    pub fn update_yn(
        &self,
        selector: PortSelector<R, P>,
        yn: Yn,
        actor: &Actor,
    ) -> Result<u64, ActionError> {
        supported::<R, _>(&self.update_yn, OperationKind::UpdateYn)?.dispatch(selector, yn, actor)
    }

    /// Records an audit decision on subjects awaiting one.
    pub fn update_audit_status(
        &self,
        selector: PortSelector<R, P>,
        audit: AuditValue,
        actor: &Actor,
    ) -> Result<u64, ActionError> {
        supported::<R, _>(&self.update_audit_status, OperationKind::UpdateAuditStatus)?
            .dispatch(selector, audit, actor)
    }

    /// The operation kinds available for `R`, in declaration order.
    pub fn operations(&self) -> Vec<OperationKind> {
        OperationKind::ALL
            .into_iter()
            .filter(|&operation| self.supports(operation))
            .collect()
    }

    /// Whether `operation` is available for `R`.
    pub fn supports(&self, operation: OperationKind) -> bool {
        match operation {
            OperationKind::UpdateStatus => self.update_status.is_some(),
            OperationKind::UpdateLock => self.update_lock.is_some(),
            OperationKind::UpdateYn => self.update_yn.is_some(),
            OperationKind::UpdateAuditStatus => self.update_audit_status.is_some(),
            _ => true,
        }
    }

    /// The port every dispatcher writes through.
    pub fn port(&self) -> &Arc<P> {
        &self.port
    }
}

fn supported<R: Record, D>(
    dispatcher: &Option<D>,
    operation: OperationKind,
) -> Result<&D, ActionError> {
    dispatcher.as_ref().ok_or_else(|| {
        ActionError::bad_request(
            operation,
            format!("`{}` does not support {operation}", R::DESCRIPTOR.name),
        )
    })
}

fn not_found<R: Record>(operation: OperationKind, selector: String) -> ActionError {
    ActionError::NotFound {
        record: R::DESCRIPTOR.name,
        operation,
        selector,
    }
}

impl<R, P> Debug for Actions<R, P>
where
    R: Record,
    P: PersistencePort<R>,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Actions")
            .field("record", &R::DESCRIPTOR.name)
            .field("operations", &self.operations())
            .finish_non_exhaustive()
    }
}

//! Assembly of the dispatchers of one record type.

use crate::actions::Actions;
use crate::config::FactoryConfig;
use crate::dispatch::{
    InsertDispatcher, MutationDispatcher, MutationPhases, SelectDispatcher, SelectPhases,
};
use crate::function::{PortCount, PortDelete, PortDetail, PortInsert, PortList, PortUpdate};
use crate::hooks::AuditTransitionValidator;
use crate::registry::ExtensionRegistry;
use phasegate_core::{
    AuditValue, BuildError, Capabilities, InsertFunction, MutationFunction, OperationKind,
    PersistencePort, Record, SelectFunction, Selection, Validator,
};
use std::fmt::Debug;
use std::sync::Arc;

/// Builds the full set of dispatchers for a record type.
///
/// Every phase of every operation is resolved through the registry once, at
/// build time; the resulting [`Actions`] never consult the registry again.
///
/// # Example
///
/// ```rust,ignore
/// let config = FactoryConfig::new().insert_ignore(true);
/// let factory = DispatcherFactory::new(registry).with_config(config);
/// let orders = factory.build::<Order, _>(Arc::new(OrderStore::connect(url)?))?;
///
/// orders.update_status(Selector::Id(7), OrderStatus::Shipped, &actor)?;
/// ```
#[derive(Debug, Default)]
pub struct DispatcherFactory {
    registry: ExtensionRegistry,
    config: FactoryConfig,
}

impl DispatcherFactory {
    /// A factory over `registry` with the default configuration.
    pub fn new(registry: ExtensionRegistry) -> Self {
        Self {
            registry,
            config: FactoryConfig::default(),
        }
    }

    /// Replaces the configuration.
    pub fn with_config(mut self, config: FactoryConfig) -> Self {
        self.config = config;
        self
    }

    /// The registry dispatchers are resolved from.
    pub fn registry(&self) -> &ExtensionRegistry {
        &self.registry
    }

    /// The configuration in effect.
    pub fn config(&self) -> &FactoryConfig {
        &self.config
    }

    /// Builds every dispatcher `R` supports, bound to `port`.
    ///
    /// The create, read, delete and update kinds are always built; the
    /// status, lock, yes/no and audit kinds only when `R` declares the
    /// matching capability.
    ///
    /// # Errors
    ///
    /// [`BuildError::MissingIdentifier`] if `R` declares no identifier field.
    pub fn build<R, P>(&self, port: Arc<P>) -> Result<Actions<R, P>, BuildError>
    where
        R: Record,
        P: PersistencePort<R>,
    {
        let descriptor = R::DESCRIPTOR;
        if descriptor.id_field.is_none() {
            return Err(BuildError::MissingIdentifier {
                record: descriptor.name,
            });
        }
        let span = tracing::debug_span!("assemble", record = descriptor.name);
        let _enter = span.enter();

        let create: Arc<dyn InsertFunction<R>> = Arc::new(PortInsert::new(port.clone()));
        let create = InsertDispatcher::resolve(
            &self.registry,
            self.function(OperationKind::Create, create),
            &self.config,
        );

        let capable = |capability| descriptor.capabilities.contains(capability);
        let actions = Actions {
            create,
            list: self.list(&port, OperationKind::ListByQuery),
            export: self.list(&port, OperationKind::Export),
            detail_by_query: self.detail(&port, OperationKind::DetailByQuery),
            detail_by_id: self.detail(&port, OperationKind::DetailById),
            count: self.count(&port),
            delete_by_query: self.delete(&port, OperationKind::DeleteByQuery),
            delete_by_id: self.delete(&port, OperationKind::DeleteById),
            update: self.update(&port, PortUpdate::record(port.clone()), None),
            update_status: capable(Capabilities::STATUS)
                .then(|| self.update(&port, PortUpdate::status(port.clone()), None)),
            update_lock: capable(Capabilities::LOCK)
                .then(|| self.update(&port, PortUpdate::lock(port.clone()), None)),
            update_yn: capable(Capabilities::YN)
                .then(|| self.update(&port, PortUpdate::yn(port.clone()), None)),
            update_audit_status: capable(Capabilities::AUDIT).then(|| {
                let check: Arc<dyn Validator<R, AuditValue>> = Arc::new(AuditTransitionValidator);
                self.update(&port, PortUpdate::audit(port.clone()), Some(check))
            }),
            port,
        };
        tracing::debug!(operations = ?actions.operations(), "assembled");
        Ok(actions)
    }

    fn function<F: ?Sized + 'static>(&self, operation: OperationKind, default: Arc<F>) -> Arc<F> {
        self.registry.function::<F>(operation).unwrap_or(default)
    }

    fn select<R, Q, T>(
        &self,
        operation: OperationKind,
        default: Arc<dyn SelectFunction<R, Q, T>>,
    ) -> SelectDispatcher<R, Q, T>
    where
        R: Record,
        Q: Debug + Send + Sync + 'static,
        T: Selection<R>,
    {
        SelectDispatcher::new(
            operation,
            SelectPhases::resolve(&self.registry, operation, &self.config.audit_log),
            self.function(operation, default),
        )
    }

    fn list<R, P>(
        &self,
        port: &Arc<P>,
        operation: OperationKind,
    ) -> SelectDispatcher<R, P::Query, Vec<R>>
    where
        R: Record,
        P: PersistencePort<R>,
    {
        let default: Arc<dyn SelectFunction<R, P::Query, Vec<R>>> =
            Arc::new(PortList::new(port.clone(), operation));
        self.select(operation, default)
    }

    fn detail<R, P>(
        &self,
        port: &Arc<P>,
        operation: OperationKind,
    ) -> SelectDispatcher<R, P::Query, Option<R>>
    where
        R: Record,
        P: PersistencePort<R>,
    {
        let default: Arc<dyn SelectFunction<R, P::Query, Option<R>>> =
            Arc::new(PortDetail::new(port.clone(), operation));
        self.select(operation, default)
    }

    fn count<R, P>(&self, port: &Arc<P>) -> SelectDispatcher<R, P::Query, u64>
    where
        R: Record,
        P: PersistencePort<R>,
    {
        let default: Arc<dyn SelectFunction<R, P::Query, u64>> =
            Arc::new(PortCount::new(port.clone()));
        self.select(OperationKind::Count, default)
    }

    fn delete<R, P>(
        &self,
        port: &Arc<P>,
        operation: OperationKind,
    ) -> MutationDispatcher<R, P::Query, ()>
    where
        R: Record,
        P: PersistencePort<R>,
    {
        let default: Arc<dyn MutationFunction<R, P::Query, ()>> =
            Arc::new(PortDelete::new(port.clone(), operation));
        let phases = MutationPhases::resolve(&self.registry, operation, &self.config.audit_log);
        self.bind(port, operation, phases, default)
    }

    /// Binds the update-family kind whose value type is `V`.
    fn update<R, P, V>(
        &self,
        port: &Arc<P>,
        default: PortUpdate<P, R, V>,
        check: Option<Arc<dyn Validator<R, V>>>,
    ) -> MutationDispatcher<R, P::Query, V>
    where
        R: Record,
        P: PersistencePort<R>,
        V: 'static,
    {
        let operation = default.operation();
        let mut phases = MutationPhases::resolve(&self.registry, operation, &self.config.audit_log);
        if let Some(check) = check {
            phases = phases.with_validator(check);
        }
        let default: Arc<dyn MutationFunction<R, P::Query, V>> = Arc::new(default);
        self.bind(port, operation, phases, default)
    }

    fn bind<R, P, V>(
        &self,
        port: &Arc<P>,
        operation: OperationKind,
        phases: MutationPhases<R, P::Query, V>,
        default: Arc<dyn MutationFunction<R, P::Query, V>>,
    ) -> MutationDispatcher<R, P::Query, V>
    where
        R: Record,
        P: PersistencePort<R>,
        V: 'static,
    {
        let subjects: Arc<dyn SelectFunction<R, P::Query, Vec<R>>> =
            Arc::new(PortList::new(port.clone(), operation));
        MutationDispatcher::new(operation, phases, subjects, self.function(operation, default))
    }
}

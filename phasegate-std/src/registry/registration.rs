//! Explicit, typed extension registrations.

use phasegate_core::{
    AfterReturningConsumer, AfterThrowingConsumer, Consumer, ExtensionPointKind, Filter,
    InsertFunction, MutationFunction, OperationKind, Phase, QueryConsumer, Record,
    ResultQueryConsumer, ResultTransform, SelectFunction, TerminalConsumer, Validator,
    ValueConsumer,
};
use std::any::{Any, TypeId, type_name};
use std::borrow::Cow;
use std::sync::Arc;

/// The lookup key of an extension.
///
/// Record and value types are the concrete types given as generic parameters
/// at registration, so matching is exact: a registration for one record type
/// never matches another, however related.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MatchKey {
    /// The operation the extension applies to.
    pub operation: OperationKind,
    /// The phase it runs in.
    pub phase: Phase,
    /// The capability interface it implements.
    pub kind: ExtensionPointKind,
    record: TypeId,
    value: Option<TypeId>,
}

impl MatchKey {
    /// A key for record type `R` with no value type.
    pub fn of<R: Record>(operation: OperationKind, phase: Phase, kind: ExtensionPointKind) -> Self {
        Self {
            operation,
            phase,
            kind,
            record: TypeId::of::<R>(),
            value: None,
        }
    }

    /// Adds the value type `V` to the key.
    pub fn with_value<V: 'static>(mut self) -> Self {
        self.value = Some(TypeId::of::<V>());
        self
    }
}

/// The lookup key of a core-function override.
///
/// The signature is the type of the function's trait object, which encodes
/// the record, query and value types at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FunctionKey {
    /// The operation the function serves.
    pub operation: OperationKind,
    signature: TypeId,
}

impl FunctionKey {
    /// A key for the function trait object `F`.
    pub fn of<F: ?Sized + 'static>(operation: OperationKind) -> Self {
        Self {
            operation,
            signature: TypeId::of::<F>(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum Binding {
    Extension(MatchKey),
    Function(FunctionKey),
}

/// One extension (or core function) together with its explicit keys.
///
/// Construct with the constructor matching the extension's kind. Kinds that
/// can run in more than one phase take the phase as an argument; the others
/// are bound to their only phase.
///
/// # Example
///
/// ```rust,ignore
/// let registration = Registration::value_consumer::<Order, OrderStatus, _>(
///     OperationKind::UpdateStatus,
///     Phase::Pre,
///     NotifyWarehouse,
/// )
/// .priority(10);
/// ```
pub struct Registration {
    pub(crate) binding: Binding,
    pub(crate) record: &'static str,
    pub(crate) name: Cow<'static, str>,
    pub(crate) priority: i32,
    pub(crate) target: Arc<dyn Any + Send + Sync>,
}

impl Registration {
    fn extension<R: Record, X: ?Sized + Send + Sync + 'static>(
        key: MatchKey,
        name: &'static str,
        target: Arc<X>,
    ) -> Self {
        Self {
            binding: Binding::Extension(key),
            record: R::DESCRIPTOR.name,
            name: Cow::Borrowed(name),
            priority: 0,
            target: Arc::new(target),
        }
    }

    fn function<R: Record, X: ?Sized + Send + Sync + 'static>(
        operation: OperationKind,
        name: &'static str,
        target: Arc<X>,
    ) -> Self {
        Self {
            binding: Binding::Function(FunctionKey::of::<X>(operation)),
            record: R::DESCRIPTOR.name,
            name: Cow::Borrowed(name),
            priority: 0,
            target: Arc::new(target),
        }
    }

    /// A create-time filter.
    pub fn filter<R, F>(operation: OperationKind, filter: F) -> Self
    where
        R: Record,
        F: Filter<R>,
    {
        let key = MatchKey::of::<R>(operation, Phase::Pre, ExtensionPointKind::Filter);
        let target: Arc<dyn Filter<R>> = Arc::new(filter);
        Self::extension::<R, _>(key, type_name::<F>(), target)
    }

    /// A pre-mutation validator for values of type `V`.
    pub fn validator<R, V, X>(operation: OperationKind, validator: X) -> Self
    where
        R: Record,
        V: 'static,
        X: Validator<R, V>,
    {
        let key = MatchKey::of::<R>(operation, Phase::Pre, ExtensionPointKind::Validator)
            .with_value::<V>();
        let target: Arc<dyn Validator<R, V>> = Arc::new(validator);
        Self::extension::<R, _>(key, type_name::<X>(), target)
    }

    /// A subject consumer for the given phase.
    pub fn consumer<R, C>(operation: OperationKind, phase: Phase, consumer: C) -> Self
    where
        R: Record,
        C: Consumer<R>,
    {
        let key = MatchKey::of::<R>(operation, phase, ExtensionPointKind::Consumer);
        let target: Arc<dyn Consumer<R>> = Arc::new(consumer);
        Self::extension::<R, _>(key, type_name::<C>(), target)
    }

    /// A subject-and-value consumer for the given phase.
    pub fn value_consumer<R, V, C>(operation: OperationKind, phase: Phase, consumer: C) -> Self
    where
        R: Record,
        V: 'static,
        C: ValueConsumer<R, V>,
    {
        let key = MatchKey::of::<R>(operation, phase, ExtensionPointKind::ValueConsumer)
            .with_value::<V>();
        let target: Arc<dyn ValueConsumer<R, V>> = Arc::new(consumer);
        Self::extension::<R, _>(key, type_name::<C>(), target)
    }

    /// A pre query consumer for queries of type `Q`.
    pub fn query_consumer<R, Q, C>(operation: OperationKind, consumer: C) -> Self
    where
        R: Record,
        Q: 'static,
        C: QueryConsumer<R, Q>,
    {
        let key = MatchKey::of::<R>(operation, Phase::Pre, ExtensionPointKind::QueryConsumer)
            .with_value::<Q>();
        let target: Arc<dyn QueryConsumer<R, Q>> = Arc::new(consumer);
        Self::extension::<R, _>(key, type_name::<C>(), target)
    }

    /// A post consumer of subjects and the query that selected them.
    pub fn result_query_consumer<R, Q, C>(operation: OperationKind, consumer: C) -> Self
    where
        R: Record,
        Q: 'static,
        C: ResultQueryConsumer<R, Q>,
    {
        let key = MatchKey::of::<R>(
            operation,
            Phase::Post,
            ExtensionPointKind::ResultQueryConsumer,
        )
        .with_value::<Q>();
        let target: Arc<dyn ResultQueryConsumer<R, Q>> = Arc::new(consumer);
        Self::extension::<R, _>(key, type_name::<C>(), target)
    }

    /// A transform of results of type `T`.
    pub fn result_transform<R, T, C>(operation: OperationKind, transform: C) -> Self
    where
        R: Record,
        T: 'static,
        C: ResultTransform<R, T>,
    {
        let key = MatchKey::of::<R>(operation, Phase::Post, ExtensionPointKind::ResultTransform)
            .with_value::<T>();
        let target: Arc<dyn ResultTransform<R, T>> = Arc::new(transform);
        Self::extension::<R, _>(key, type_name::<C>(), target)
    }

    /// A failure observer.
    pub fn after_throwing<R, Q, C>(operation: OperationKind, consumer: C) -> Self
    where
        R: Record,
        Q: 'static,
        C: AfterThrowingConsumer<R, Q>,
    {
        let key = MatchKey::of::<R>(
            operation,
            Phase::AfterThrowing,
            ExtensionPointKind::AfterThrowingConsumer,
        )
        .with_value::<Q>();
        let target: Arc<dyn AfterThrowingConsumer<R, Q>> = Arc::new(consumer);
        Self::extension::<R, _>(key, type_name::<C>(), target)
    }

    /// An outcome observer.
    pub fn after_returning<R, Q, C>(operation: OperationKind, consumer: C) -> Self
    where
        R: Record,
        Q: 'static,
        C: AfterReturningConsumer<R, Q>,
    {
        let key = MatchKey::of::<R>(
            operation,
            Phase::AfterReturning,
            ExtensionPointKind::AfterReturningConsumer,
        )
        .with_value::<Q>();
        let target: Arc<dyn AfterReturningConsumer<R, Q>> = Arc::new(consumer);
        Self::extension::<R, _>(key, type_name::<C>(), target)
    }

    /// A terminal observer, run after every other extension.
    pub fn terminal<R, Q, C>(operation: OperationKind, consumer: C) -> Self
    where
        R: Record,
        Q: 'static,
        C: TerminalConsumer<R, Q>,
    {
        let key = MatchKey::of::<R>(operation, Phase::After, ExtensionPointKind::TerminalConsumer)
            .with_value::<Q>();
        let target: Arc<dyn TerminalConsumer<R, Q>> = Arc::new(consumer);
        Self::extension::<R, _>(key, type_name::<C>(), target)
    }

    /// Replaces the default insert function of `Create`.
    pub fn insert_function<R, F>(function: F) -> Self
    where
        R: Record,
        F: InsertFunction<R>,
    {
        let target: Arc<dyn InsertFunction<R>> = Arc::new(function);
        Self::function::<R, _>(OperationKind::Create, type_name::<F>(), target)
    }

    /// Replaces the default read function of a read-only operation.
    pub fn select_function<R, Q, T, F>(operation: OperationKind, function: F) -> Self
    where
        R: Record,
        Q: 'static,
        T: 'static,
        F: SelectFunction<R, Q, T>,
    {
        let target: Arc<dyn SelectFunction<R, Q, T>> = Arc::new(function);
        Self::function::<R, _>(operation, type_name::<F>(), target)
    }

    /// Replaces the default write function of a mutation.
    pub fn mutation_function<R, Q, V, F>(operation: OperationKind, function: F) -> Self
    where
        R: Record,
        Q: 'static,
        V: 'static,
        F: MutationFunction<R, Q, V>,
    {
        let target: Arc<dyn MutationFunction<R, Q, V>> = Arc::new(function);
        Self::function::<R, _>(operation, type_name::<F>(), target)
    }

    /// Sets the ordering priority. Higher values run first; ties keep registration order.
    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Overrides the name used in assembly logs (defaults to the Rust type name).
    pub fn named(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = name.into();
        self
    }

    /// Overrides the phase of an extension registration.
    ///
    /// The registry rejects phases the extension's kind cannot run in.
    pub fn in_phase(mut self, phase: Phase) -> Self {
        if let Binding::Extension(key) = &mut self.binding {
            key.phase = phase;
        }
        self
    }

    /// The registration's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The extension key, or `None` for core-function overrides.
    pub fn key(&self) -> Option<&MatchKey> {
        match &self.binding {
            Binding::Extension(key) => Some(key),
            Binding::Function(_) => None,
        }
    }
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("binding", &self.binding)
            .field("record", &self.record)
            .field("name", &self.name)
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}

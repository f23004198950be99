//! The extension registry.
//!
//! Extensions are registered explicitly, each under a [`MatchKey`] computed
//! from the registration's generic parameters. Lookups are exact: the record
//! type and the value type must be the very types given at registration.
//!
//! ```rust,ignore
//! let registry = ExtensionRegistry::builder()
//!     .register(Registration::filter::<Order, _>(OperationKind::Create, NotCancelled))
//!     .register(
//!         Registration::consumer::<Order, _>(OperationKind::Create, Phase::Pre, StampCreator)
//!             .priority(10),
//!     )
//!     .build()?;
//! ```

mod builder;
mod registration;

pub use builder::RegistryBuilder;
pub use registration::{FunctionKey, MatchKey, Registration};

use crate::composite::Composite;
use crate::config::AuditLogConfig;
use crate::hooks::{AcceptAll, AuditLogConsumer};
use phasegate_core::{
    ExtensionPointKind, Filter, OperationKind, Phase, Record, ResultTransform, TerminalConsumer,
};
use std::any::Any;
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

pub(crate) struct Entry {
    pub(crate) name: Cow<'static, str>,
    pub(crate) record: &'static str,
    pub(crate) priority: i32,
    pub(crate) target: Arc<dyn Any + Send + Sync>,
}

impl Entry {
    fn downcast<X: ?Sized + 'static>(&self) -> Option<Arc<X>> {
        self.target.downcast_ref::<Arc<X>>().cloned()
    }
}

/// A validated, read-only set of registrations.
///
/// Built once by a [`RegistryBuilder`] and then only queried, so it can be
/// shared freely between factories.
pub struct ExtensionRegistry {
    extensions: HashMap<MatchKey, Vec<Entry>>,
    functions: HashMap<FunctionKey, Entry>,
}

impl ExtensionRegistry {
    /// Create a new registry builder.
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// A registry with no registrations.
    pub fn empty() -> Self {
        Self {
            extensions: HashMap::new(),
            functions: HashMap::new(),
        }
    }

    /// Total number of registered extensions and core functions.
    pub fn len(&self) -> usize {
        self.extensions.values().map(Vec::len).sum::<usize>() + self.functions.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The extensions registered under `key` as trait objects `X`, in run order.
    ///
    /// `X` must be the trait object matching `key.kind` (for example
    /// `dyn Consumer<R>` for [`ExtensionPointKind::Consumer`]); anything else
    /// yields an empty list.
    pub fn find<X: ?Sized + 'static>(&self, key: &MatchKey) -> Vec<Arc<X>> {
        let Some(entries) = self.extensions.get(key) else {
            return Vec::new();
        };
        entries
            .iter()
            .filter_map(|entry| {
                let found = entry.downcast::<X>();
                if found.is_some() {
                    tracing::debug!(
                        record = entry.record,
                        name = %entry.name,
                        operation = %key.operation,
                        phase = %key.phase,
                        kind = %key.kind,
                        "matched extension"
                    );
                }
                found
            })
            .collect()
    }

    /// The names of the extensions registered under `key`, in run order.
    pub fn names(&self, key: &MatchKey) -> Vec<&str> {
        self.extensions
            .get(key)
            .map(|entries| entries.iter().map(|entry| entry.name.as_ref()).collect())
            .unwrap_or_default()
    }

    /// The extensions registered under `key`, as one composite.
    pub fn composite<X: ?Sized + 'static>(&self, key: &MatchKey) -> Composite<X> {
        Composite::new(self.find(key))
    }

    /// The create filters of `R`, or a single accept-all filter when none is registered.
    pub fn filters<R: Record>(&self, operation: OperationKind) -> Composite<dyn Filter<R>> {
        let key = MatchKey::of::<R>(operation, Phase::Pre, ExtensionPointKind::Filter);
        let mut filters = self.composite::<dyn Filter<R>>(&key);
        if filters.is_empty() {
            filters.push(Arc::new(AcceptAll));
        }
        filters
    }

    /// The terminal consumers of `R`, followed by the audit logger.
    pub fn terminals<R, Q>(
        &self,
        operation: OperationKind,
        audit_log: &AuditLogConfig,
    ) -> Composite<dyn TerminalConsumer<R, Q>>
    where
        R: Record,
        Q: Debug + Send + Sync + 'static,
    {
        let key = MatchKey::of::<R>(operation, Phase::After, ExtensionPointKind::TerminalConsumer)
            .with_value::<Q>();
        let mut terminals = self.composite::<dyn TerminalConsumer<R, Q>>(&key);
        terminals.push(Arc::new(AuditLogConsumer::new(audit_log.clone())));
        terminals
    }

    /// The result transform of `R` for results of type `T`, if one is registered.
    pub fn result_transform<R: Record, T: 'static>(
        &self,
        operation: OperationKind,
    ) -> Option<Arc<dyn ResultTransform<R, T>>> {
        let key = MatchKey::of::<R>(operation, Phase::Post, ExtensionPointKind::ResultTransform)
            .with_value::<T>();
        self.find::<dyn ResultTransform<R, T>>(&key).into_iter().next()
    }

    /// The core-function override `F` for `operation`, if one is registered.
    pub fn function<F: ?Sized + 'static>(&self, operation: OperationKind) -> Option<Arc<F>> {
        let entry = self.functions.get(&FunctionKey::of::<F>(operation))?;
        tracing::debug!(
            record = entry.record,
            name = %entry.name,
            operation = %operation,
            "using core function override"
        );
        entry.downcast::<F>()
    }
}

impl Default for ExtensionRegistry {
    fn default() -> Self {
        Self::empty()
    }
}

impl Debug for ExtensionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtensionRegistry")
            .field("extensions", &self.extensions.len())
            .field("functions", &self.functions.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Note, NoteQuery, NoteStatus, RecordingConsumer};
    use phasegate_core::{
        ActionError, Actor, BoxError, BuildError, Consumer, InsertFunction, ValueConsumer,
    };

    #[test]
    fn test_find_orders_by_priority_then_registration() {
        let registry = ExtensionRegistry::builder()
            .register(
                Registration::consumer::<Note, _>(
                    OperationKind::Create,
                    Phase::Pre,
                    RecordingConsumer::named("a"),
                )
                .named("a"),
            )
            .register(
                Registration::consumer::<Note, _>(
                    OperationKind::Create,
                    Phase::Pre,
                    RecordingConsumer::named("b"),
                )
                .named("b")
                .priority(5),
            )
            .register(
                Registration::consumer::<Note, _>(
                    OperationKind::Create,
                    Phase::Pre,
                    RecordingConsumer::named("c"),
                )
                .named("c"),
            )
            .build()
            .unwrap();

        let key =
            MatchKey::of::<Note>(OperationKind::Create, Phase::Pre, ExtensionPointKind::Consumer);
        assert_eq!(registry.names(&key), ["b", "a", "c"]);
        assert_eq!(registry.find::<dyn Consumer<Note>>(&key).len(), 3);
    }

    #[test]
    fn test_match_is_exact() {
        let registry = ExtensionRegistry::builder()
            .register(Registration::consumer::<Note, _>(
                OperationKind::Create,
                Phase::Pre,
                RecordingConsumer::named("pre"),
            ))
            .build()
            .unwrap();

        let post =
            MatchKey::of::<Note>(OperationKind::Create, Phase::Post, ExtensionPointKind::Consumer);
        let other_op =
            MatchKey::of::<Note>(OperationKind::Update, Phase::Pre, ExtensionPointKind::Consumer);
        assert!(registry.find::<dyn Consumer<Note>>(&post).is_empty());
        assert!(registry.find::<dyn Consumer<Note>>(&other_op).is_empty());
    }

    #[test]
    fn test_value_type_must_match() {
        struct Observe;
        impl ValueConsumer<Note, NoteStatus> for Observe {
            fn accept(
                &self,
                _: OperationKind,
                _: &[Note],
                _: &NoteStatus,
                _: &Actor,
            ) -> Result<(), BoxError> {
                Ok(())
            }
        }

        let registry = ExtensionRegistry::builder()
            .register(Registration::value_consumer::<Note, NoteStatus, _>(
                OperationKind::UpdateStatus,
                Phase::Pre,
                Observe,
            ))
            .build()
            .unwrap();

        let base = MatchKey::of::<Note>(
            OperationKind::UpdateStatus,
            Phase::Pre,
            ExtensionPointKind::ValueConsumer,
        );
        let status = base.with_value::<NoteStatus>();
        let string = base.with_value::<String>();
        assert_eq!(registry.find::<dyn ValueConsumer<Note, NoteStatus>>(&status).len(), 1);
        assert!(registry.find::<dyn ValueConsumer<Note, String>>(&string).is_empty());
    }

    #[test]
    fn test_default_filter_and_audit_logger() {
        let registry = ExtensionRegistry::empty();
        assert_eq!(registry.filters::<Note>(OperationKind::Create).len(), 1);
        let terminals = registry
            .terminals::<Note, NoteQuery>(OperationKind::Create, &AuditLogConfig::default());
        assert_eq!(terminals.len(), 1);
    }

    #[test]
    fn test_rejects_illegal_phase() {
        let err = ExtensionRegistry::builder()
            .register(
                Registration::filter::<Note, _>(
                    OperationKind::Create,
                    |_: OperationKind, _: &Note, _: &Actor| true,
                )
                .named("late-filter")
                .in_phase(Phase::Post),
            )
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            BuildError::PhaseNotPermitted {
                name: "late-filter".into(),
                kind: ExtensionPointKind::Filter,
                phase: Phase::Post,
            }
        );
    }

    #[test]
    fn test_rejects_duplicate_result_transform() {
        let double = |_: OperationKind, list: Vec<Note>, _: &Actor| -> Result<Vec<Note>, BoxError> {
            Ok(list)
        };
        let err = ExtensionRegistry::builder()
            .register(Registration::result_transform::<Note, Vec<Note>, _>(
                OperationKind::ListByQuery,
                double,
            ))
            .register(Registration::result_transform::<Note, Vec<Note>, _>(
                OperationKind::ListByQuery,
                double,
            ))
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            BuildError::DuplicateResultTransform {
                record: "note",
                operation: OperationKind::ListByQuery,
            }
        );
    }

    #[test]
    fn test_rejects_extensions_the_operation_never_runs() {
        let err = ExtensionRegistry::builder()
            .register(
                Registration::filter::<Note, _>(
                    OperationKind::DeleteById,
                    |_: OperationKind, _: &Note, _: &Actor| false,
                )
                .named("keep-all"),
            )
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            BuildError::NeverRun {
                name: "keep-all".into(),
                operation: OperationKind::DeleteById,
                kind: ExtensionPointKind::Filter,
                phase: Phase::Pre,
            }
        );
    }

    #[test]
    fn test_first_duplicate_transform_in_registration_order_is_reported() {
        let same = |_: OperationKind, n: u64, _: &Actor| -> Result<u64, BoxError> { Ok(n) };
        let list = |_: OperationKind, l: Vec<Note>, _: &Actor| -> Result<Vec<Note>, BoxError> {
            Ok(l)
        };
        for _ in 0..8 {
            let err = ExtensionRegistry::builder()
                .register(Registration::result_transform::<Note, u64, _>(
                    OperationKind::Count,
                    same,
                ))
                .register(Registration::result_transform::<Note, Vec<Note>, _>(
                    OperationKind::ListByQuery,
                    list,
                ))
                .register(Registration::result_transform::<Note, Vec<Note>, _>(
                    OperationKind::ListByQuery,
                    list,
                ))
                .register(Registration::result_transform::<Note, u64, _>(
                    OperationKind::Count,
                    same,
                ))
                .build()
                .unwrap_err();
            assert_eq!(
                err,
                BuildError::DuplicateResultTransform {
                    record: "note",
                    operation: OperationKind::ListByQuery,
                }
            );
        }
    }

    struct NoInsert;

    impl InsertFunction<Note> for NoInsert {
        fn insert(&self, _: &[Note], _: bool, _: &Actor) -> Result<u64, ActionError> {
            Ok(0)
        }
    }

    #[test]
    fn test_function_override() {
        let registry = ExtensionRegistry::builder()
            .register(Registration::insert_function::<Note, _>(NoInsert))
            .build()
            .unwrap();
        assert!(
            registry
                .function::<dyn InsertFunction<Note>>(OperationKind::Create)
                .is_some()
        );
        assert!(
            registry
                .function::<dyn InsertFunction<Note>>(OperationKind::Update)
                .is_none()
        );

        let err = ExtensionRegistry::builder()
            .register(Registration::insert_function::<Note, _>(NoInsert))
            .register(Registration::insert_function::<Note, _>(NoInsert))
            .build()
            .unwrap_err();
        assert!(matches!(err, BuildError::DuplicateFunction { .. }));
    }
}

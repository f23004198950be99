//! Builder for constructing an [`ExtensionRegistry`].

use super::registration::{Binding, Registration};
use super::{Entry, ExtensionRegistry};
use phasegate_core::{BuildError, ExtensionPointKind};
use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};

/// Collects registrations and validates them into an [`ExtensionRegistry`].
///
/// Registrations are matched in the order they were added, reordered only by
/// explicit priority.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    registrations: Vec<Registration>,
}

impl RegistryBuilder {
    /// Create a new empty registry builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one extension or core-function override.
    pub fn register(mut self, registration: Registration) -> Self {
        self.registrations.push(registration);
        self
    }

    /// Register every item of `registrations`, in order.
    pub fn register_all(mut self, registrations: impl IntoIterator<Item = Registration>) -> Self {
        self.registrations.extend(registrations);
        self
    }

    /// Number of registrations collected so far.
    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    /// Whether nothing has been registered.
    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    /// Validate the registrations and build the registry.
    ///
    /// # Errors
    ///
    /// - [`BuildError::PhaseNotPermitted`] if a registration's phase is not
    ///   one its kind can run in
    /// - [`BuildError::NeverRun`] if the registration's operation never runs
    ///   its kind in that phase
    /// - [`BuildError::DuplicateResultTransform`] if more than one result
    ///   transform shares a key
    /// - [`BuildError::DuplicateFunction`] if more than one core function
    ///   overrides the same operation and signature
    pub fn build(self) -> Result<ExtensionRegistry, BuildError> {
        let mut extensions: HashMap<_, Vec<Entry>> = HashMap::new();
        let mut functions = HashMap::new();
        let mut transforms = HashSet::new();

        for registration in self.registrations {
            let entry = Entry {
                name: registration.name,
                record: registration.record,
                priority: registration.priority,
                target: registration.target,
            };
            match registration.binding {
                Binding::Extension(key) => {
                    if !key.kind.permits(key.phase) {
                        return Err(BuildError::PhaseNotPermitted {
                            name: entry.name.into_owned(),
                            kind: key.kind,
                            phase: key.phase,
                        });
                    }
                    if !key.operation.runs(key.phase, key.kind) {
                        return Err(BuildError::NeverRun {
                            name: entry.name.into_owned(),
                            operation: key.operation,
                            kind: key.kind,
                            phase: key.phase,
                        });
                    }
                    if key.kind == ExtensionPointKind::ResultTransform
                        && !transforms.insert(key)
                    {
                        return Err(BuildError::DuplicateResultTransform {
                            record: entry.record,
                            operation: key.operation,
                        });
                    }
                    tracing::debug!(
                        record = entry.record,
                        name = %entry.name,
                        operation = %key.operation,
                        phase = %key.phase,
                        kind = %key.kind,
                        priority = entry.priority,
                        "registered extension"
                    );
                    extensions.entry(key).or_default().push(entry);
                }
                Binding::Function(key) => {
                    if functions.contains_key(&key) {
                        return Err(BuildError::DuplicateFunction {
                            record: entry.record,
                            operation: key.operation,
                        });
                    }
                    tracing::debug!(
                        record = entry.record,
                        name = %entry.name,
                        operation = %key.operation,
                        "registered core function"
                    );
                    functions.insert(key, entry);
                }
            }
        }

        for entries in extensions.values_mut() {
            // Stable: equal priorities keep registration order.
            entries.sort_by_key(|entry| Reverse(entry.priority));
        }

        Ok(ExtensionRegistry {
            extensions,
            functions,
        })
    }
}

//! # phasegate-core
//!
//! Core traits and types for the phasegate action-dispatch pipeline.
//!
//! This crate has minimal dependencies and is designed to be imported by
//! extension authors and persistence adapters that don't need the registry,
//! dispatchers or factory from `phasegate-std`.
//!
//! # Vocabulary
//!
//! - [`OperationKind`]: the CRUD-family action being performed
//! - [`Phase`]: the lifecycle point where extensions run
//! - [`ExtensionPointKind`]: the capability interface an extension implements
//! - [`Stage`]: how far a call got
//!
//! # Extension Points
//!
//! Every extension implements exactly one single-method trait from
//! [`extension`], keyed by its record type and, where relevant, a value type.
//! Authors never depend on the dispatchers: the registry in `phasegate-std`
//! matches registrations to operations at assembly time.
//!
//! # Persistence
//!
//! [`PersistencePort`] is the storage surface; [`InsertFunction`],
//! [`SelectFunction`] and [`MutationFunction`] are the per-operation core
//! calls that dispatchers make against it.
//!
//! # Error Types
//!
//! - [`PhasegateError`] - Top-level error type
//! - [`ActionError`] - Failure outcome of one call
//! - [`BuildError`] - Assembly failures

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

mod action;
mod actor;
mod error;
pub mod extension;
mod function;
mod port;
mod record;
mod selector;

// Re-exports
pub use action::{ExtensionPointKind, OperationKind, ParseKindError, Phase, Stage};
pub use actor::Actor;
pub use error::{
    ActionError, BoxError, BuildError, PersistenceError, PhasegateError, ValidationError,
};
pub use extension::{
    AfterReturningConsumer, AfterThrowingConsumer, CallSite, Consumer, Filter, Outcome,
    QueryConsumer, ResultQueryConsumer, ResultTransform, TerminalConsumer, Validator,
    ValueConsumer,
};
pub use function::{InsertFunction, MutationFunction, SelectFunction, Selection};
pub use port::{PersistencePort, Query};
pub use record::{
    AuditStatus, AuditValue, Capabilities, Patch, Record, RecordDescriptor, Yn,
};
pub use selector::{Change, Selector};

//! # phasegate - Extensible Action Dispatch for CRUD Operations
//!
//! `phasegate` runs every create, read, update and delete call of a record
//! type through a fixed sequence of lifecycle phases. Extensions attach to a
//! phase of an operation for a record type; the dispatchers never know which
//! extensions exist.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use phasegate::prelude::*;
//! use std::sync::Arc;
//!
//! #[derive(Debug, Clone, Record)]
//! struct Order {
//!     #[record(id)]
//!     id: u64,
//!     #[record(status)]
//!     status: OrderStatus,
//! }
//!
//! let registry = ExtensionRegistry::builder()
//!     .register(Registration::validator::<Order, OrderStatus, _>(
//!         OperationKind::UpdateStatus,
//!         NoReopen,
//!     ))
//!     .build()?;
//!
//! let orders = DispatcherFactory::new(registry)
//!     .build::<Order, _>(Arc::new(MemoryStore::<Order, OrderQuery>::new()))?;
//! orders.update_status(Selector::Id(7), OrderStatus::Shipped, &Actor::new("alice"))?;
//! ```
//!
//! ## Crates
//!
//! - `phasegate-core`: vocabulary, extension traits, persistence port
//! - `phasegate-std`: registry, composites, dispatchers, factory, hooks
//! - `phasegate-macros`: `#[derive(Record)]` (feature `macros`)

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

pub use phasegate_core::{
    // Errors
    ActionError,
    // Extension points
    AfterReturningConsumer,
    AfterThrowingConsumer,
    // Records
    AuditStatus,
    AuditValue,
    BoxError,
    BuildError,
    CallSite,
    Capabilities,
    Change,
    Consumer,
    // Vocabulary
    ExtensionPointKind,
    Filter,
    // Core functions
    InsertFunction,
    MutationFunction,
    OperationKind,
    Outcome,
    ParseKindError,
    Patch,
    PersistenceError,
    // Persistence
    PersistencePort,
    Phase,
    PhasegateError,
    Query,
    QueryConsumer,
    Record,
    RecordDescriptor,
    ResultQueryConsumer,
    ResultTransform,
    SelectFunction,
    Selection,
    Selector,
    Stage,
    TerminalConsumer,
    ValidationError,
    Validator,
    ValueConsumer,
    Yn,
    // Callers
    Actor,
};

pub use phasegate_std::{
    Actions, AuditLevel, AuditLogConfig, Composite, DispatcherFactory, ExtensionRegistry,
    FactoryConfig, MatchKey, MemoryStore, PortSelector, RecordQuery, Registration,
    RegistryBuilder, SecondaryErrors,
};

#[cfg(feature = "macros")]
pub use phasegate_macros::Record;

/// Dispatchers and their resolved phases.
pub mod dispatch {
    #![allow(clippy::wildcard_imports)]
    pub use phasegate_std::dispatch::*;
}

/// Port-backed core functions.
pub mod function {
    #![allow(clippy::wildcard_imports)]
    pub use phasegate_std::function::*;
}

/// Standard extensions.
pub mod hooks {
    #![allow(clippy::wildcard_imports)]
    pub use phasegate_std::hooks::*;
}

/// Testing utilities.
pub mod testing {
    #![allow(clippy::wildcard_imports)]
    pub use phasegate_std::testing::*;
}

/// Prelude module - common imports for phasegate.
///
/// # Usage
///
/// ```rust,ignore
/// use phasegate::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        ActionError, Actions, Actor, AuditValue, BoxError, Consumer, DispatcherFactory,
        ExtensionRegistry, Filter, MemoryStore, OperationKind, Patch, PersistencePort, Phase,
        Record, Registration, Selector, ValidationError, Validator, ValueConsumer, Yn,
    };
}

//! # phasegate-std
//!
//! Standard implementations for the phasegate action-dispatch pipeline.
//!
//! This crate provides:
//! - **Registry**: [`ExtensionRegistry`], [`RegistryBuilder`], [`Registration`]
//! - **Composites**: [`Composite`], one per phase and extension kind
//! - **Dispatchers**: insert, select and mutation state machines in [`dispatch`]
//! - **Factory**: [`DispatcherFactory`] assembling [`Actions`] per record type
//! - **Standard hooks**: audit logging, order normalization, audit transitions
//! - **Reference storage**: [`MemoryStore`]
//!
//! ```rust,ignore
//! let registry = ExtensionRegistry::builder()
//!     .register(Registration::filter::<Order, _>(OperationKind::Create, NotCancelled))
//!     .build()?;
//! let orders = DispatcherFactory::new(registry).build::<Order, _>(Arc::new(store))?;
//! orders.create(vec![order], &actor)?;
//! ```

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

// Re-export core traits
pub use phasegate_core;

// Modules
mod actions;
pub mod composite;
pub mod config;
pub mod dispatch;
mod factory;
pub mod function;
pub mod hooks;
pub mod memory;
pub mod registry;
pub mod testing;

pub use actions::{Actions, PortSelector};
pub use composite::{Composite, SecondaryErrors};
pub use config::{AuditLevel, AuditLogConfig, FactoryConfig};
pub use factory::DispatcherFactory;
pub use memory::{MemoryStore, RecordQuery};
pub use registry::{ExtensionRegistry, MatchKey, Registration, RegistryBuilder};

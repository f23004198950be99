//! Framework-provided extensions.
//!
//! - [`AcceptAll`]: the create filter used when none is registered
//! - [`AuditLogConsumer`]: the terminal logger appended to every operation
//! - [`AuditTransitionValidator`]: appended to every `UpdateAuditStatus`
//! - [`OrderQueryConsumer`]: opt-in normalization of order clauses

mod audit;
mod logging;
mod order;

pub use audit::AuditTransitionValidator;
pub use logging::AuditLogConsumer;
pub use order::{OrderError, OrderQueryConsumer, Orderable};

use phasegate_core::{Actor, Filter, OperationKind, Record};

/// A filter that keeps every record.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl<R: Record> Filter<R> for AcceptAll {
    fn test(&self, _operation: OperationKind, _record: &R, _actor: &Actor) -> bool {
        true
    }
}

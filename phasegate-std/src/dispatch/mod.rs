//! Dispatchers: one per operation kind, each a fixed sequence of phases
//! around exactly one core function.
//!
//! - [`InsertDispatcher`]: `Create`
//! - [`SelectDispatcher`]: `ListByQuery`, `Export`, `DetailByQuery`,
//!   `DetailById`, `Count`
//! - [`MutationDispatcher`]: `DeleteByQuery`, `DeleteById`, `Update`,
//!   `UpdateYn`, `UpdateStatus`, `UpdateLock`, `UpdateAuditStatus`
//!
//! Every dispatcher settles each call exactly once: on failure the
//! after-throwing consumers see the error, then the after-returning and
//! terminal consumers see the outcome. Their own failures are logged and
//! never change what the caller receives.

mod insert;
mod mutation;
mod select;

pub use insert::InsertDispatcher;
pub use mutation::{MutationDispatcher, MutationPhases};
pub use select::{SelectDispatcher, SelectPhases};

use crate::composite::{Composite, SecondaryErrors};
use crate::config::AuditLogConfig;
use crate::registry::{ExtensionRegistry, MatchKey};
use phasegate_core::{
    ActionError, AfterReturningConsumer, AfterThrowingConsumer, BoxError, CallSite,
    ExtensionPointKind, OperationKind, Outcome, Phase, Record, TerminalConsumer,
};
use std::fmt::Debug;

/// The after-throwing, after-returning and terminal phases of one operation.
pub struct Terminals<R: Record, Q> {
    after_throwing: Composite<dyn AfterThrowingConsumer<R, Q>>,
    after_returning: Composite<dyn AfterReturningConsumer<R, Q>>,
    after: Composite<dyn TerminalConsumer<R, Q>>,
}

impl<R, Q> Terminals<R, Q>
where
    R: Record,
    Q: Debug + Send + Sync + 'static,
{
    /// Resolves the three phases for `operation` from `registry`.
    pub fn resolve(
        registry: &ExtensionRegistry,
        operation: OperationKind,
        audit_log: &AuditLogConfig,
    ) -> Self {
        let key = |phase, kind| MatchKey::of::<R>(operation, phase, kind).with_value::<Q>();
        Self {
            after_throwing: registry.composite(&key(
                Phase::AfterThrowing,
                ExtensionPointKind::AfterThrowingConsumer,
            )),
            after_returning: registry.composite(&key(
                Phase::AfterReturning,
                ExtensionPointKind::AfterReturningConsumer,
            )),
            after: registry.terminals(operation, audit_log),
        }
    }

    /// Runs the three phases for one completed call.
    pub fn settle(&self, call: &CallSite<'_, R, Q>, outcome: Outcome<'_>) {
        if let Outcome::Failure(error) = outcome {
            if let Err(secondary) = self.after_throwing.on_error(call, error) {
                log_secondary(call, Phase::AfterThrowing, secondary);
            }
        }
        if let Err(secondary) = self.after_returning.on_return(call, outcome) {
            log_secondary(call, Phase::AfterReturning, secondary);
        }
        if let Err(secondary) = self.after.after(call, outcome) {
            log_secondary(call, Phase::After, secondary);
        }
    }
}

impl<R: Record, Q> Clone for Terminals<R, Q> {
    fn clone(&self) -> Self {
        Self {
            after_throwing: self.after_throwing.clone(),
            after_returning: self.after_returning.clone(),
            after: self.after.clone(),
        }
    }
}

fn log_secondary<R: Record, Q>(call: &CallSite<'_, R, Q>, phase: Phase, error: BoxError) {
    let errors = match error.downcast::<SecondaryErrors>() {
        Ok(collected) => collected.0,
        Err(error) => vec![error],
    };
    for error in errors {
        tracing::warn!(
            record = call.record(),
            operation = %call.operation,
            %phase,
            %error,
            "observer failed; outcome unchanged"
        );
    }
}

/// The outcome terminal consumers see for a finished call.
fn outcome<'a, T>(
    result: &'a Result<T, ActionError>,
    affected: impl FnOnce(&T) -> u64,
) -> Outcome<'a> {
    match result {
        Ok(value) => Outcome::Success {
            affected: affected(value),
        },
        Err(error) => Outcome::Failure(error),
    }
}

/// Maps an extension failure into the call's error.
fn extension_error(
    operation: OperationKind,
    phase: Phase,
    kind: ExtensionPointKind,
) -> impl FnOnce(BoxError) -> ActionError {
    move |source| ActionError::extension(operation, phase, kind, source)
}

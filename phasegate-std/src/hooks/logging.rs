//! Audit logging of completed calls.

use crate::config::{AuditLevel, AuditLogConfig};
use phasegate_core::{BoxError, CallSite, Outcome, Record, TerminalConsumer};
use std::fmt::Debug;

/// A terminal consumer that logs every completed call.
///
/// The registry appends one to the terminal phase of every operation, after
/// any registered terminal consumers. Successes are logged at the configured
/// level (unless disabled); failures are always logged at `warn`.
#[derive(Debug, Clone, Default)]
pub struct AuditLogConsumer {
    config: AuditLogConfig,
}

impl AuditLogConsumer {
    /// Creates an audit logger with the given settings.
    pub fn new(config: AuditLogConfig) -> Self {
        Self { config }
    }

    /// The logger's settings.
    pub fn config(&self) -> &AuditLogConfig {
        &self.config
    }
}

impl<R, Q> TerminalConsumer<R, Q> for AuditLogConsumer
where
    R: Record,
    Q: Debug + Send + Sync + 'static,
{
    fn after(&self, call: &CallSite<'_, R, Q>, outcome: Outcome<'_>) -> Result<(), BoxError> {
        let selector = call.selector.map(ToString::to_string);
        match outcome {
            Outcome::Failure(error) => {
                tracing::warn!(
                    target: "phasegate::audit",
                    record = call.record(),
                    operation = %call.operation,
                    actor = %call.actor.id,
                    stage = ?call.stage,
                    selector = ?selector,
                    %error,
                    "action failed"
                );
            }
            Outcome::Success { affected } if self.config.enabled => match self.config.level {
                AuditLevel::Info => tracing::info!(
                    target: "phasegate::audit",
                    record = call.record(),
                    operation = %call.operation,
                    actor = %call.actor.id,
                    selector = ?selector,
                    affected,
                    "action completed"
                ),
                AuditLevel::Debug => tracing::debug!(
                    target: "phasegate::audit",
                    record = call.record(),
                    operation = %call.operation,
                    actor = %call.actor.id,
                    selector = ?selector,
                    affected,
                    "action completed"
                ),
                AuditLevel::Trace => tracing::trace!(
                    target: "phasegate::audit",
                    record = call.record(),
                    operation = %call.operation,
                    actor = %call.actor.id,
                    selector = ?selector,
                    affected,
                    "action completed"
                ),
            },
            Outcome::Success { .. } => {}
        }
        Ok(())
    }
}

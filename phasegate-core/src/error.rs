//! Error types for phasegate.
//!
//! This module provides a structured error hierarchy using `thiserror`:
//!
//! - [`PhasegateError`] - Top-level error type
//! - [`ActionError`] - The single failure outcome of a dispatcher call
//! - [`BuildError`] - Assembly-time failures of the registry or factory
//! - [`ValidationError`] - Raised by validators
//! - [`PersistenceError`] - Raised by persistence ports

use crate::action::{ExtensionPointKind, OperationKind, Phase};
use thiserror::Error;

/// A boxed error type for failures raised by extensions.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Top-level error type for all phasegate operations.
#[derive(Error, Debug)]
pub enum PhasegateError {
    /// A dispatcher call failed.
    #[error("action error: {0}")]
    Action(#[from] ActionError),

    /// Assembly failed.
    #[error("build error: {0}")]
    Build(#[from] BuildError),
}

/// The failure outcome of a dispatcher call.
#[derive(Error, Debug)]
pub enum ActionError {
    /// The selector resolved zero subjects.
    #[error("{record}: nothing found for {operation} ({selector})")]
    NotFound {
        /// Record name.
        record: &'static str,
        /// The operation that found nothing.
        operation: OperationKind,
        /// Rendered selector, for diagnostics.
        selector: String,
    },

    /// A validator rejected the call.
    #[error("{operation} rejected: {source}")]
    ValidationFailed {
        /// The rejected operation.
        operation: OperationKind,
        /// The validator's reason.
        #[source]
        source: ValidationError,
    },

    /// The caller supplied something the dispatcher cannot interpret.
    #[error("bad request for {operation}: {reason}")]
    BadRequest {
        /// The operation that was called.
        operation: OperationKind,
        /// What was wrong.
        reason: String,
    },

    /// The persistence port failed.
    #[error("{operation} failed in persistence")]
    Persistence {
        /// The operation that was running.
        operation: OperationKind,
        /// The port's error.
        #[source]
        source: PersistenceError,
    },

    /// An extension raised a failure.
    #[error("{kind} extension failed during {operation}/{phase}")]
    Extension {
        /// The operation that was running.
        operation: OperationKind,
        /// The phase the extension ran in.
        phase: Phase,
        /// The extension's kind.
        kind: ExtensionPointKind,
        /// The extension's error.
        #[source]
        source: BoxError,
    },
}

impl ActionError {
    /// Wraps an extension failure.
    pub fn extension(
        operation: OperationKind,
        phase: Phase,
        kind: ExtensionPointKind,
        source: BoxError,
    ) -> Self {
        ActionError::Extension {
            operation,
            phase,
            kind,
            source,
        }
    }

    /// Builds a bad-request error.
    pub fn bad_request(operation: OperationKind, reason: impl Into<String>) -> Self {
        ActionError::BadRequest {
            operation,
            reason: reason.into(),
        }
    }

    /// The operation this error belongs to.
    pub fn operation(&self) -> OperationKind {
        match self {
            ActionError::NotFound { operation, .. }
            | ActionError::ValidationFailed { operation, .. }
            | ActionError::BadRequest { operation, .. }
            | ActionError::Persistence { operation, .. }
            | ActionError::Extension { operation, .. } => *operation,
        }
    }

    /// Returns `true` for [`ActionError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, ActionError::NotFound { .. })
    }

    /// Returns `true` for [`ActionError::ValidationFailed`].
    pub fn is_validation(&self) -> bool {
        matches!(self, ActionError::ValidationFailed { .. })
    }

    /// Returns `true` for [`ActionError::BadRequest`].
    pub fn is_bad_request(&self) -> bool {
        matches!(self, ActionError::BadRequest { .. })
    }
}

/// A validator's reason for rejecting a call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ValidationError {
    /// Human-readable reason, suitable for the caller.
    pub message: String,
    /// The offending field, if any.
    pub field: Option<String>,
}

impl ValidationError {
    /// Creates a validation error with a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            field: None,
        }
    }

    /// Attaches the offending field.
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }
}

/// Errors raised by a persistence port.
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// A uniqueness or integrity constraint was violated.
    #[error("constraint violated: {0}")]
    Constraint(String),

    /// The backend could not be reached or failed internally.
    #[error("storage backend error: {0}")]
    Backend(String),

    /// A custom backend error.
    #[error(transparent)]
    Custom(BoxError),
}

/// Assembly-time failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// The record type declares no identifier field.
    #[error("record `{record}` declares no identifier field")]
    MissingIdentifier {
        /// Record name.
        record: &'static str,
    },

    /// An extension was registered for a phase its kind does not run in.
    #[error("`{name}`: {kind} extensions cannot run in the {phase} phase")]
    PhaseNotPermitted {
        /// Registration name.
        name: String,
        /// Extension kind.
        kind: ExtensionPointKind,
        /// Requested phase.
        phase: Phase,
    },

    /// An extension was registered where its operation never runs it.
    #[error("`{name}`: {operation} never runs {kind} extensions in the {phase} phase")]
    NeverRun {
        /// Registration name.
        name: String,
        /// Operation kind.
        operation: OperationKind,
        /// Extension kind.
        kind: ExtensionPointKind,
        /// Requested phase.
        phase: Phase,
    },

    /// More than one result transform for the same key.
    #[error("more than one result transform registered for {operation} on `{record}`")]
    DuplicateResultTransform {
        /// Record type name.
        record: &'static str,
        /// Operation kind.
        operation: OperationKind,
    },

    /// More than one core-function override for the same key.
    #[error("more than one core function registered for {operation} on `{record}`")]
    DuplicateFunction {
        /// Record type name.
        record: &'static str,
        /// Operation kind.
        operation: OperationKind,
    },
}

// Convenience conversions
impl From<BoxError> for PersistenceError {
    fn from(err: BoxError) -> Self {
        PersistenceError::Custom(err)
    }
}

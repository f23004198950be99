//! # Extension points
//!
//! The closed taxonomy of capability traits that extension authors implement.
//! Each trait has a single method and is keyed by a record type and, where
//! relevant, a secondary value type (a query, a new status, a result type).
//!
//! | kind | shape | phases |
//! |---|---|---|
//! | [`Filter`] | `(record, actor) -> bool` | pre |
//! | [`Validator`] | `(subjects, value, actor) -> Result` | pre |
//! | [`Consumer`] | `(subjects, actor)` | pre, post |
//! | [`ValueConsumer`] | `(subjects, value, actor)` | pre, post |
//! | [`QueryConsumer`] | `(query, actor)` | pre |
//! | [`ResultQueryConsumer`] | `(subjects, query, actor)` | post |
//! | [`ResultTransform`] | `(result, actor) -> result` | post |
//! | [`AfterThrowingConsumer`] | `(call, error)` | after-throwing |
//! | [`AfterReturningConsumer`] | `(call, outcome)` | after-returning |
//! | [`TerminalConsumer`] | `(call, outcome)` | after |
//!
//! Every extension is synchronous and runs on the caller's thread.

use crate::action::{OperationKind, Stage};
use crate::actor::Actor;
use crate::error::{ActionError, BoxError, ValidationError};
use crate::record::Record;
use crate::selector::Selector;

/// Decides whether a record takes part in a create call.
///
/// Records rejected by any filter are silently dropped from the batch.
pub trait Filter<R: Record>: Send + Sync + 'static {
    /// Returns `true` to keep `record`.
    fn test(&self, operation: OperationKind, record: &R, actor: &Actor) -> bool;
}

/// Accepts or rejects a mutation before anything is written.
pub trait Validator<R: Record, V>: Send + Sync + 'static {
    /// Checks the resolved subjects against the incoming value.
    fn validate(
        &self,
        operation: OperationKind,
        subjects: &[R],
        value: &V,
        actor: &Actor,
    ) -> Result<(), ValidationError>;
}

/// Observes or enriches the subjects of an operation.
///
/// Pre consumers may adjust records before they are written; post consumers
/// of read operations may enrich what the caller receives.
pub trait Consumer<R: Record>: Send + Sync + 'static {
    /// Called with the operation's subjects.
    fn accept(&self, operation: OperationKind, subjects: &mut [R], actor: &Actor)
    -> Result<(), BoxError>;
}

/// Observes the subjects of an update together with its value.
pub trait ValueConsumer<R: Record, V>: Send + Sync + 'static {
    /// Called with the resolved subjects and the incoming value.
    fn accept(
        &self,
        operation: OperationKind,
        subjects: &[R],
        value: &V,
        actor: &Actor,
    ) -> Result<(), BoxError>;
}

/// Rewrites a query in place before it reaches the persistence port.
pub trait QueryConsumer<R: Record, Q>: Send + Sync + 'static {
    /// Called with the caller's query.
    fn accept(&self, operation: OperationKind, query: &mut Q, actor: &Actor)
    -> Result<(), BoxError>;
}

/// Observes the subjects of a query-based operation after persistence.
pub trait ResultQueryConsumer<R: Record, Q>: Send + Sync + 'static {
    /// Called with the subjects and the (already prepared) query.
    fn accept(
        &self,
        operation: OperationKind,
        subjects: &mut [R],
        query: &Q,
        actor: &Actor,
    ) -> Result<(), BoxError>;
}

/// Replaces the raw result of an operation.
///
/// At most one transform applies per operation, record type and result type.
pub trait ResultTransform<R: Record, T>: Send + Sync + 'static {
    /// Maps the raw result to what the caller receives.
    fn transform(&self, operation: OperationKind, result: T, actor: &Actor) -> Result<T, BoxError>;
}

/// Observes a failure before it propagates to the caller.
pub trait AfterThrowingConsumer<R: Record, Q>: Send + Sync + 'static {
    /// Called once with the failure. Errors returned here are logged and discarded.
    fn on_error(&self, call: &CallSite<'_, R, Q>, error: &ActionError) -> Result<(), BoxError>;
}

/// Observes every completed call, successful or not.
pub trait AfterReturningConsumer<R: Record, Q>: Send + Sync + 'static {
    /// Called exactly once per call. Errors returned here are logged and discarded.
    fn on_return(&self, call: &CallSite<'_, R, Q>, outcome: Outcome<'_>) -> Result<(), BoxError>;
}

/// The last step of every call.
pub trait TerminalConsumer<R: Record, Q>: Send + Sync + 'static {
    /// Called exactly once per call, after every other extension.
    fn after(&self, call: &CallSite<'_, R, Q>, outcome: Outcome<'_>) -> Result<(), BoxError>;
}

/// What terminal extensions see of a call.
#[derive(Debug)]
pub struct CallSite<'a, R: Record, Q> {
    /// The operation that ran.
    pub operation: OperationKind,
    /// The subjects resolved so far (possibly partial, possibly empty).
    pub subjects: &'a [R],
    /// The selector, for operations that take one.
    pub selector: Option<&'a Selector<R::Id, Q>>,
    /// The caller.
    pub actor: &'a Actor,
    /// The last stage the call reached.
    pub stage: Stage,
}

impl<R: Record, Q> CallSite<'_, R, Q> {
    /// The record type's name.
    pub fn record(&self) -> &'static str {
        R::DESCRIPTOR.name
    }
}

/// How a call ended.
#[derive(Debug, Clone, Copy)]
pub enum Outcome<'a> {
    /// The call succeeded; `affected` is the row count or the number of records returned.
    Success {
        /// Rows written, or records read.
        affected: u64,
    },
    /// The call failed with the given error.
    Failure(&'a ActionError),
}

impl<'a> Outcome<'a> {
    /// Returns `true` for [`Outcome::Success`].
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }

    /// The failure, if any.
    pub fn error(&self) -> Option<&'a ActionError> {
        match self {
            Outcome::Failure(error) => Some(error),
            Outcome::Success { .. } => None,
        }
    }
}

// Closures implement the single-method kinds directly.

impl<R, F> Filter<R> for F
where
    R: Record,
    F: Fn(OperationKind, &R, &Actor) -> bool + Send + Sync + 'static,
{
    fn test(&self, operation: OperationKind, record: &R, actor: &Actor) -> bool {
        self(operation, record, actor)
    }
}

impl<R, V, F> Validator<R, V> for F
where
    R: Record,
    F: Fn(OperationKind, &[R], &V, &Actor) -> Result<(), ValidationError> + Send + Sync + 'static,
{
    fn validate(
        &self,
        operation: OperationKind,
        subjects: &[R],
        value: &V,
        actor: &Actor,
    ) -> Result<(), ValidationError> {
        self(operation, subjects, value, actor)
    }
}

impl<R, T, F> ResultTransform<R, T> for F
where
    R: Record,
    F: Fn(OperationKind, T, &Actor) -> Result<T, BoxError> + Send + Sync + 'static,
{
    fn transform(&self, operation: OperationKind, result: T, actor: &Actor) -> Result<T, BoxError> {
        self(operation, result, actor)
    }
}

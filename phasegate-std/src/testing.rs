//! Testing utilities for phasegate.
//!
//! This module provides fixtures and observable extensions that make testing
//! pipelines and persistence ports easier.
//!
//! # Features
//!
//! - [`Note`], [`NoteStatus`], [`NoteQuery`]: a fixture record with every capability
//! - [`RecordingConsumer`]: an extension that records every call it receives
//! - [`CountingTerminal`]: counts after-throwing, after-returning and terminal calls
//! - [`FailingValidator`], [`FailingObserver`]: extensions that always fail
//! - [`SpyPort`]: a port wrapper that counts calls and keeps the last write

use crate::hooks::Orderable;
use crate::memory::RecordQuery;
use phasegate_core::{
    ActionError, Actor, AfterReturningConsumer, AfterThrowingConsumer, AuditStatus, AuditValue,
    BoxError, CallSite, Capabilities, Change, Consumer, OperationKind, Outcome, PersistenceError,
    PersistencePort, Record, RecordDescriptor, ResultQueryConsumer, Selector, TerminalConsumer,
    ValidationError, Validator, ValueConsumer, Yn,
};
use std::{
    collections::HashMap,
    fmt::Debug,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

// ============================================================================
// Fixture Record
// ============================================================================

/// The status of a [`Note`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NoteStatus {
    /// Not yet visible.
    #[default]
    Draft,
    /// Visible.
    Published,
    /// Retired.
    Archived,
}

/// A fixture record declaring every capability.
#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    /// Identifier.
    pub id: u64,
    /// Title.
    pub title: String,
    /// Status column.
    pub status: NoteStatus,
    /// Lock flag.
    pub locked: bool,
    /// Yes/no flag.
    pub yn: Yn,
    /// Audit status.
    pub audit: AuditStatus,
    /// Last audit remark.
    pub remark: Option<String>,
}

impl Note {
    /// A draft, unlocked, pending note.
    pub fn new(id: u64, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            status: NoteStatus::Draft,
            locked: false,
            yn: Yn::Yes,
            audit: AuditStatus::Pending,
            remark: None,
        }
    }
}

impl Record for Note {
    type Id = u64;
    type Status = NoteStatus;

    const DESCRIPTOR: RecordDescriptor = RecordDescriptor::new("note")
        .with_id("id")
        .with_fields(&["id", "title", "status", "locked", "yn", "audit", "remark"])
        .with_capabilities(Capabilities::all());

    fn id(&self) -> Option<&u64> {
        Some(&self.id)
    }

    fn set_status(&mut self, status: NoteStatus) {
        self.status = status;
    }

    fn set_locked(&mut self, locked: bool) {
        self.locked = locked;
    }

    fn set_yn(&mut self, yn: Yn) {
        self.yn = yn;
    }

    fn set_audit(&mut self, audit: &AuditValue) {
        self.audit = audit.status;
        self.remark = audit.remark.clone();
    }

    fn audit_status(&self) -> Option<AuditStatus> {
        Some(self.audit)
    }
}

/// A query over [`Note`]s understood by the in-memory store.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NoteQuery {
    /// Keeps notes whose title contains this text.
    pub title_contains: Option<String>,
    /// Keeps notes with this status.
    pub status: Option<NoteStatus>,
    /// Order clauses.
    pub orders: Vec<String>,
    /// Maximum number of notes returned.
    pub limit: Option<usize>,
}

impl NoteQuery {
    /// Keeps notes whose title contains `text`.
    pub fn title_contains(mut self, text: impl Into<String>) -> Self {
        self.title_contains = Some(text.into());
        self
    }

    /// Keeps notes with `status`.
    pub fn status(mut self, status: NoteStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Appends an order clause.
    pub fn order_by(mut self, clause: impl Into<String>) -> Self {
        self.orders.push(clause.into());
        self
    }

    /// Caps the number of notes returned.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

impl RecordQuery<Note> for NoteQuery {
    fn matches(&self, note: &Note) -> bool {
        self.title_contains
            .as_deref()
            .is_none_or(|text| note.title.contains(text))
            && self.status.is_none_or(|status| note.status == status)
    }

    fn limit(&self) -> Option<usize> {
        self.limit
    }
}

impl Orderable for NoteQuery {
    fn orders_mut(&mut self) -> &mut Vec<String> {
        &mut self.orders
    }
}

// ============================================================================
// Recording Consumer
// ============================================================================

/// One call observed by a [`RecordingConsumer`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    /// The recorder's name.
    pub name: String,
    /// The operation being run.
    pub operation: OperationKind,
    /// Identifiers of the subjects, rendered with `Debug`.
    pub ids: Vec<String>,
    /// The value, query or outcome seen alongside the subjects, rendered with `Debug`.
    pub value: Option<String>,
    /// The actor's identifier.
    pub actor: String,
}

/// A shared, ordered log of recorded calls.
pub type CallLog = Arc<Mutex<Vec<RecordedCall>>>;

/// An extension that records every call it receives.
///
/// It implements the subject-observing kinds and the three terminal kinds,
/// so one recorder (or several sharing a log) can trace the exact order of a
/// pipeline.
///
/// # Example
///
/// ```rust,ignore
/// let pre = RecordingConsumer::named("pre");
/// let post = RecordingConsumer::named("post").with_log(pre.shared_log());
///
/// // Register both, dispatch...
///
/// let names: Vec<_> = pre.calls().into_iter().map(|call| call.name).collect();
/// assert_eq!(names, ["pre", "post"]);
/// ```
#[derive(Clone, Default)]
pub struct RecordingConsumer {
    name: String,
    log: CallLog,
}

impl RecordingConsumer {
    /// Create a new recorder with an empty name.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new recorder whose calls carry `name`.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            log: CallLog::default(),
        }
    }

    /// Record into `log` instead of this recorder's own log.
    pub fn with_log(mut self, log: CallLog) -> Self {
        self.log = log;
        self
    }

    /// The log this recorder writes to.
    pub fn shared_log(&self) -> CallLog {
        self.log.clone()
    }

    /// Get a copy of the recorded calls.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.log.lock().unwrap().clone()
    }

    /// Get the number of recorded calls.
    pub fn count(&self) -> usize {
        self.log.lock().unwrap().len()
    }

    /// Clear all recorded calls.
    pub fn clear(&self) {
        self.log.lock().unwrap().clear();
    }

    fn record<R: Record>(
        &self,
        operation: OperationKind,
        subjects: &[R],
        value: Option<String>,
        actor: &Actor,
    ) {
        let ids = subjects
            .iter()
            .filter_map(R::id)
            .map(|id| format!("{id:?}"))
            .collect();
        self.log.lock().unwrap().push(RecordedCall {
            name: self.name.clone(),
            operation,
            ids,
            value,
            actor: actor.id.clone(),
        });
    }
}

impl<R: Record> Consumer<R> for RecordingConsumer {
    fn accept(
        &self,
        operation: OperationKind,
        subjects: &mut [R],
        actor: &Actor,
    ) -> Result<(), BoxError> {
        self.record(operation, subjects, None, actor);
        Ok(())
    }
}

impl<R: Record, V: Debug + 'static> ValueConsumer<R, V> for RecordingConsumer {
    fn accept(
        &self,
        operation: OperationKind,
        subjects: &[R],
        value: &V,
        actor: &Actor,
    ) -> Result<(), BoxError> {
        self.record(operation, subjects, Some(format!("{value:?}")), actor);
        Ok(())
    }
}

impl<R: Record, Q: Debug + 'static> ResultQueryConsumer<R, Q> for RecordingConsumer {
    fn accept(
        &self,
        operation: OperationKind,
        subjects: &mut [R],
        query: &Q,
        actor: &Actor,
    ) -> Result<(), BoxError> {
        self.record(operation, subjects, Some(format!("{query:?}")), actor);
        Ok(())
    }
}

impl<R: Record, Q: 'static> AfterThrowingConsumer<R, Q> for RecordingConsumer {
    fn on_error(&self, call: &CallSite<'_, R, Q>, error: &ActionError) -> Result<(), BoxError> {
        self.record(call.operation, call.subjects, Some(error.to_string()), call.actor);
        Ok(())
    }
}

impl<R: Record, Q: 'static> AfterReturningConsumer<R, Q> for RecordingConsumer {
    fn on_return(&self, call: &CallSite<'_, R, Q>, outcome: Outcome<'_>) -> Result<(), BoxError> {
        self.record(call.operation, call.subjects, Some(format!("{outcome:?}")), call.actor);
        Ok(())
    }
}

impl<R: Record, Q: 'static> TerminalConsumer<R, Q> for RecordingConsumer {
    fn after(&self, call: &CallSite<'_, R, Q>, outcome: Outcome<'_>) -> Result<(), BoxError> {
        self.record(call.operation, call.subjects, Some(format!("{outcome:?}")), call.actor);
        Ok(())
    }
}

// ============================================================================
// Counting Terminal
// ============================================================================

/// Counts after-throwing, after-returning and terminal invocations.
///
/// # Example
///
/// ```rust,ignore
/// let counter = CountingTerminal::new();
///
/// // Register clones for AfterReturning and After, dispatch...
///
/// assert_eq!(counter.count(), 2);
/// ```
#[derive(Clone, Default)]
pub struct CountingTerminal {
    count: Arc<AtomicUsize>,
}

impl CountingTerminal {
    /// Create a new counter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the current count.
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    /// Reset the counter.
    pub fn reset(&self) {
        self.count.store(0, Ordering::SeqCst);
    }

    fn bump(&self) -> Result<(), BoxError> {
        self.count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

impl<R: Record, Q: 'static> AfterThrowingConsumer<R, Q> for CountingTerminal {
    fn on_error(&self, _call: &CallSite<'_, R, Q>, _error: &ActionError) -> Result<(), BoxError> {
        self.bump()
    }
}

impl<R: Record, Q: 'static> AfterReturningConsumer<R, Q> for CountingTerminal {
    fn on_return(&self, _call: &CallSite<'_, R, Q>, _outcome: Outcome<'_>) -> Result<(), BoxError> {
        self.bump()
    }
}

impl<R: Record, Q: 'static> TerminalConsumer<R, Q> for CountingTerminal {
    fn after(&self, _call: &CallSite<'_, R, Q>, _outcome: Outcome<'_>) -> Result<(), BoxError> {
        self.bump()
    }
}

// ============================================================================
// Failing Extensions
// ============================================================================

/// A validator that rejects every call with a fixed message.
#[derive(Debug, Clone)]
pub struct FailingValidator {
    message: String,
}

impl FailingValidator {
    /// Create a validator failing with `message`.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl<R: Record, V: 'static> Validator<R, V> for FailingValidator {
    fn validate(
        &self,
        _operation: OperationKind,
        _subjects: &[R],
        _value: &V,
        _actor: &Actor,
    ) -> Result<(), ValidationError> {
        Err(ValidationError::new(self.message.clone()))
    }
}

/// An observer whose every invocation fails.
#[derive(Debug, Clone, Default)]
pub struct FailingObserver;

impl<R: Record, Q: 'static> AfterThrowingConsumer<R, Q> for FailingObserver {
    fn on_error(&self, _call: &CallSite<'_, R, Q>, _error: &ActionError) -> Result<(), BoxError> {
        Err("observer failed".into())
    }
}

impl<R: Record, Q: 'static> AfterReturningConsumer<R, Q> for FailingObserver {
    fn on_return(&self, _call: &CallSite<'_, R, Q>, _outcome: Outcome<'_>) -> Result<(), BoxError> {
        Err("observer failed".into())
    }
}

impl<R: Record, Q: 'static> TerminalConsumer<R, Q> for FailingObserver {
    fn after(&self, _call: &CallSite<'_, R, Q>, _outcome: Outcome<'_>) -> Result<(), BoxError> {
        Err("observer failed".into())
    }
}

// ============================================================================
// Spy Port
// ============================================================================

/// A persistence port wrapper that counts calls and keeps the last write.
///
/// # Example
///
/// ```rust,ignore
/// let port = Arc::new(SpyPort::new(MemoryStore::<Note, NoteQuery>::new()));
/// let actions = factory.build(port.clone())?;
///
/// actions.create(vec![note], &actor)?;
/// assert_eq!(port.calls("insert"), 1);
/// assert_eq!(port.last_insert().unwrap().len(), 1);
/// ```
pub struct SpyPort<R: Record, P> {
    inner: P,
    calls: Mutex<HashMap<&'static str, usize>>,
    last_insert: Mutex<Option<Vec<R>>>,
    last_change: Mutex<Option<Change<R>>>,
}

impl<R: Record, P> SpyPort<R, P> {
    /// Wrap `inner`.
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            calls: Mutex::new(HashMap::new()),
            last_insert: Mutex::new(None),
            last_change: Mutex::new(None),
        }
    }

    /// The wrapped port.
    pub fn inner(&self) -> &P {
        &self.inner
    }

    /// How many times `method` was called.
    pub fn calls(&self, method: &str) -> usize {
        self.calls.lock().unwrap().get(method).copied().unwrap_or(0)
    }

    /// Total calls to `insert`, `update` and `delete`.
    pub fn writes(&self) -> usize {
        self.calls("insert") + self.calls("update") + self.calls("delete")
    }

    /// The batch passed to the last `insert`.
    pub fn last_insert(&self) -> Option<Vec<R>> {
        self.last_insert.lock().unwrap().clone()
    }

    /// The change passed to the last `update`.
    pub fn last_change(&self) -> Option<Change<R>> {
        self.last_change.lock().unwrap().clone()
    }

    fn hit(&self, method: &'static str) {
        *self.calls.lock().unwrap().entry(method).or_default() += 1;
    }
}

impl<R: Record, P: PersistencePort<R>> PersistencePort<R> for SpyPort<R, P> {
    type Query = P::Query;

    fn select_by_query(
        &self,
        query: &Self::Query,
        actor: Option<&Actor>,
    ) -> Result<Vec<R>, PersistenceError> {
        self.hit("select_by_query");
        self.inner.select_by_query(query, actor)
    }

    fn select_by_id(
        &self,
        id: &R::Id,
        actor: Option<&Actor>,
    ) -> Result<Option<R>, PersistenceError> {
        self.hit("select_by_id");
        self.inner.select_by_id(id, actor)
    }

    fn count(&self, query: &Self::Query) -> Result<u64, PersistenceError> {
        self.hit("count");
        self.inner.count(query)
    }

    fn insert(&self, records: &[R], ignore: bool) -> Result<u64, PersistenceError> {
        self.hit("insert");
        *self.last_insert.lock().unwrap() = Some(records.to_vec());
        self.inner.insert(records, ignore)
    }

    fn update(
        &self,
        change: &Change<R>,
        selector: &Selector<R::Id, Self::Query>,
    ) -> Result<u64, PersistenceError> {
        self.hit("update");
        *self.last_change.lock().unwrap() = Some(change.clone());
        self.inner.update(change, selector)
    }

    fn delete(&self, selector: &Selector<R::Id, Self::Query>) -> Result<u64, PersistenceError> {
        self.hit("delete");
        self.inner.delete(selector)
    }
}

//! Operation kinds, lifecycle phases and extension-point kinds.
//!
//! These three enums form the closed vocabulary of the pipeline. They are
//! defined once and never extended at runtime: every registration and every
//! dispatcher is keyed by values drawn from them.

use crate::selector::Selector;
use std::fmt;
use std::str::FromStr;

/// The canonical CRUD-family actions a dispatcher can perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "kebab-case")
)]
pub enum OperationKind {
    /// Insert a batch of records.
    Create,
    /// Read every record matching a query.
    ListByQuery,
    /// Read the single record matching a query.
    DetailByQuery,
    /// Read a single record by identifier.
    DetailById,
    /// Count the records matching a query.
    Count,
    /// Delete every record matching a query.
    DeleteByQuery,
    /// Delete one or more records by identifier.
    DeleteById,
    /// Overwrite records with a new value.
    Update,
    /// Toggle the yes/no (soft-delete) flag.
    UpdateYn,
    /// Move records to a new status.
    UpdateStatus,
    /// Lock or unlock records.
    UpdateLock,
    /// Record an audit decision.
    UpdateAuditStatus,
    /// Read every record matching a query for export.
    Export,
}

impl OperationKind {
    /// Every operation kind, in declaration order.
    pub const ALL: [OperationKind; 13] = [
        OperationKind::Create,
        OperationKind::ListByQuery,
        OperationKind::DetailByQuery,
        OperationKind::DetailById,
        OperationKind::Count,
        OperationKind::DeleteByQuery,
        OperationKind::DeleteById,
        OperationKind::Update,
        OperationKind::UpdateYn,
        OperationKind::UpdateStatus,
        OperationKind::UpdateLock,
        OperationKind::UpdateAuditStatus,
        OperationKind::Export,
    ];

    /// The kebab-case name used in logs and configuration.
    pub const fn name(self) -> &'static str {
        match self {
            OperationKind::Create => "create",
            OperationKind::ListByQuery => "list-by-query",
            OperationKind::DetailByQuery => "detail-by-query",
            OperationKind::DetailById => "detail-by-id",
            OperationKind::Count => "count",
            OperationKind::DeleteByQuery => "delete-by-query",
            OperationKind::DeleteById => "delete-by-id",
            OperationKind::Update => "update",
            OperationKind::UpdateYn => "update-yn",
            OperationKind::UpdateStatus => "update-status",
            OperationKind::UpdateLock => "update-lock",
            OperationKind::UpdateAuditStatus => "update-audit-status",
            OperationKind::Export => "export",
        }
    }

    /// Returns `true` for kinds that only read from the persistence port.
    pub const fn is_read_only(self) -> bool {
        matches!(
            self,
            OperationKind::ListByQuery
                | OperationKind::DetailByQuery
                | OperationKind::DetailById
                | OperationKind::Count
                | OperationKind::Export
        )
    }

    /// Returns `true` for kinds that resolve subjects before writing.
    pub const fn is_mutation(self) -> bool {
        !self.is_read_only() && !matches!(self, OperationKind::Create)
    }

    /// Whether this kind can interpret the given selector shape.
    ///
    /// An empty identifier list is never accepted.
    pub fn accepts<Id, Q>(self, selector: &Selector<Id, Q>) -> bool {
        match selector {
            Selector::Query(_) => self.takes_query(),
            Selector::Id(_) => matches!(
                self,
                OperationKind::DetailById
                    | OperationKind::DeleteById
                    | OperationKind::Update
                    | OperationKind::UpdateYn
                    | OperationKind::UpdateStatus
                    | OperationKind::UpdateLock
                    | OperationKind::UpdateAuditStatus
            ),
            Selector::Ids(ids) => {
                !ids.is_empty()
                    && matches!(
                        self,
                        OperationKind::DeleteById
                            | OperationKind::Update
                            | OperationKind::UpdateYn
                            | OperationKind::UpdateStatus
                            | OperationKind::UpdateLock
                            | OperationKind::UpdateAuditStatus
                    )
            }
        }
    }

    /// Whether a call of this kind ever runs `kind` extensions in `phase`.
    ///
    /// Terminal kinds run for every operation. Query-bound kinds need an
    /// operation that accepts query selectors.
    pub fn runs(self, phase: Phase, kind: ExtensionPointKind) -> bool {
        use ExtensionPointKind as K;
        if !kind.permits(phase) {
            return false;
        }
        match kind {
            K::AfterThrowingConsumer | K::AfterReturningConsumer | K::TerminalConsumer => true,
            K::ResultTransform => true,
            K::Filter => self == OperationKind::Create,
            K::Consumer => phase == Phase::Post || !self.is_read_only(),
            K::Validator | K::ValueConsumer => self.is_mutation(),
            K::QueryConsumer | K::ResultQueryConsumer => self.takes_query(),
        }
    }

    const fn takes_query(self) -> bool {
        matches!(
            self,
            OperationKind::ListByQuery
                | OperationKind::Export
                | OperationKind::DetailByQuery
                | OperationKind::Count
                | OperationKind::DeleteByQuery
                | OperationKind::Update
        )
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when parsing an unknown operation or phase name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {what}: {value}")]
pub struct ParseKindError {
    what: &'static str,
    value: String,
}

impl FromStr for OperationKind {
    type Err = ParseKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OperationKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| ParseKindError {
                what: "operation kind",
                value: s.to_owned(),
            })
    }
}

/// A named point in an operation's lifecycle where extensions run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "kebab-case")
)]
pub enum Phase {
    /// Before the persistence call.
    Pre,
    /// After a successful persistence call.
    Post,
    /// After any failure, before it is re-raised.
    AfterThrowing,
    /// After every call, observing success or failure.
    AfterReturning,
    /// The terminal catch-all; always carries the framework audit logger.
    After,
}

impl Phase {
    /// Every phase, in lifecycle order.
    pub const ALL: [Phase; 5] = [
        Phase::Pre,
        Phase::Post,
        Phase::AfterThrowing,
        Phase::AfterReturning,
        Phase::After,
    ];

    /// The kebab-case name used in logs and configuration.
    pub const fn name(self) -> &'static str {
        match self {
            Phase::Pre => "pre",
            Phase::Post => "post",
            Phase::AfterThrowing => "after-throwing",
            Phase::AfterReturning => "after-returning",
            Phase::After => "after",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Phase {
    type Err = ParseKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Phase::ALL
            .into_iter()
            .find(|phase| phase.name() == s)
            .ok_or_else(|| ParseKindError {
                what: "phase",
                value: s.to_owned(),
            })
    }
}

/// The capability interface an extension implements.
///
/// Each kind fixes an input/output shape (see [`crate::extension`]) and the
/// set of phases it may be registered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ExtensionPointKind {
    /// `(record, actor) -> bool`
    Filter,
    /// `(subjects, value, actor) -> fails-or-not`
    Validator,
    /// `(subjects, actor)`
    Consumer,
    /// `(subjects, value, actor)`
    ValueConsumer,
    /// `(query, actor)`, mutates the query in place.
    QueryConsumer,
    /// `(subjects, query, actor)`
    ResultQueryConsumer,
    /// `(result, actor) -> result`
    ResultTransform,
    /// Observes a failure before it propagates.
    AfterThrowingConsumer,
    /// Observes every outcome.
    AfterReturningConsumer,
    /// Observes every outcome as the very last step.
    TerminalConsumer,
}

impl ExtensionPointKind {
    /// The phases this kind may be registered for.
    pub const fn permitted_phases(self) -> &'static [Phase] {
        match self {
            ExtensionPointKind::Filter
            | ExtensionPointKind::Validator
            | ExtensionPointKind::QueryConsumer => &[Phase::Pre],
            ExtensionPointKind::Consumer | ExtensionPointKind::ValueConsumer => {
                &[Phase::Pre, Phase::Post]
            }
            ExtensionPointKind::ResultQueryConsumer | ExtensionPointKind::ResultTransform => {
                &[Phase::Post]
            }
            ExtensionPointKind::AfterThrowingConsumer => &[Phase::AfterThrowing],
            ExtensionPointKind::AfterReturningConsumer => &[Phase::AfterReturning],
            ExtensionPointKind::TerminalConsumer => &[Phase::After],
        }
    }

    /// Whether this kind may run in `phase`.
    pub fn permits(self, phase: Phase) -> bool {
        self.permitted_phases().contains(&phase)
    }
}

impl fmt::Display for ExtensionPointKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// The last state a dispatcher call reached.
///
/// Reported to terminal extensions so they can tell how far a failed call got.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    /// Nothing has run yet.
    Start,
    /// Pre query consumers have run.
    QueryPrepared,
    /// Subjects were resolved from the selector (or filtered, for inserts).
    SubjectsLoaded,
    /// Validators accepted the call.
    Validated,
    /// Pre consumers have run.
    PreHooked,
    /// The core persistence function returned.
    Persisted,
    /// Post consumers have run.
    PostHooked,
    /// The final result is available.
    ResultReady,
}

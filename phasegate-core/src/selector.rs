//! Selectors and changes: what an operation targets and what it writes.

use crate::record::{AuditValue, Record, Yn};
use std::fmt;

/// Identifies the subjects an operation acts upon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector<Id, Q> {
    /// A single identifier.
    Id(Id),
    /// Several identifiers.
    Ids(Vec<Id>),
    /// An opaque query understood by the persistence port.
    Query(Q),
}

impl<Id, Q> Selector<Id, Q> {
    /// Returns the query if this selector is query-based.
    pub fn query(&self) -> Option<&Q> {
        match self {
            Selector::Query(query) => Some(query),
            _ => None,
        }
    }

    /// Mutable access to the query, used by pre query consumers.
    pub fn query_mut(&mut self) -> Option<&mut Q> {
        match self {
            Selector::Query(query) => Some(query),
            _ => None,
        }
    }

    /// Returns `true` for [`Selector::Id`] and [`Selector::Ids`].
    pub fn is_by_id(&self) -> bool {
        !matches!(self, Selector::Query(_))
    }
}

impl<Id: fmt::Debug, Q: fmt::Debug> fmt::Display for Selector<Id, Q> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Id(id) => write!(f, "id={id:?}"),
            Selector::Ids(ids) => write!(f, "ids={ids:?}"),
            Selector::Query(query) => write!(f, "query={query:?}"),
        }
    }
}

/// A write handed to [`PersistencePort::update`](crate::PersistencePort::update).
#[derive(Debug, Clone, PartialEq)]
pub enum Change<R: Record> {
    /// Overwrite with `value`; when `selective`, absent fields are left untouched.
    Record {
        /// The new record contents.
        value: R,
        /// Whether only present fields are written.
        selective: bool,
    },
    /// Set the status column.
    Status(R::Status),
    /// Set the lock flag.
    Locked(bool),
    /// Set the yes/no flag.
    Yn(Yn),
    /// Set the audit status and remark.
    Audit(AuditValue),
}

impl<R: Record> Change<R> {
    /// Applies this change to an in-memory record.
    ///
    /// A record-level change keeps the target's identity only if `value`
    /// carries the same identifier; callers of by-id updates are expected to
    /// pass a value with the matching id.
    pub fn apply_to(&self, target: &mut R) {
        match self {
            Change::Record { value, .. } => *target = value.clone(),
            Change::Status(status) => target.set_status(status.clone()),
            Change::Locked(locked) => target.set_locked(*locked),
            Change::Yn(yn) => target.set_yn(*yn),
            Change::Audit(audit) => target.set_audit(audit),
        }
    }
}

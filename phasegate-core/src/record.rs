//! The record model.
//!
//! A [`Record`] is any type the pipeline can create, read, update or delete.
//! It self-describes through a constant [`RecordDescriptor`]: its name, the
//! field that identifies it, its field names and the optional capabilities
//! (status, lock, yes/no, audit) that unlock the specialized update kinds.
//!
//! Most records implement the trait through `#[derive(Record)]` (the `macros`
//! feature of the `phasegate` crate).

use bitflags::bitflags;
use std::fmt::Debug;
use std::hash::Hash;

bitflags! {
    /// Optional capabilities a record type may declare.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct Capabilities: u8 {
        /// Carries a status column; enables `UpdateStatus`.
        const STATUS = 1;
        /// Carries a lock flag; enables `UpdateLock`.
        const LOCK = 1 << 1;
        /// Carries a yes/no flag; enables `UpdateYn`.
        const YN = 1 << 2;
        /// Carries an audit status; enables `UpdateAuditStatus`.
        const AUDIT = 1 << 3;
    }
}

/// Static metadata describing a record type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordDescriptor {
    /// The resource name, used in logs and errors.
    pub name: &'static str,
    /// The identifier field, if the record declares one.
    pub id_field: Option<&'static str>,
    /// Every field name, in declaration order.
    pub fields: &'static [&'static str],
    /// Declared optional capabilities.
    pub capabilities: Capabilities,
}

impl RecordDescriptor {
    /// Creates a descriptor without an identifier, fields or capabilities.
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            id_field: None,
            fields: &[],
            capabilities: Capabilities::empty(),
        }
    }

    /// Sets the identifier field.
    pub const fn with_id(mut self, field: &'static str) -> Self {
        self.id_field = Some(field);
        self
    }

    /// Sets the field names.
    pub const fn with_fields(mut self, fields: &'static [&'static str]) -> Self {
        self.fields = fields;
        self
    }

    /// Sets the capabilities.
    pub const fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Whether `field` is one of the record's fields.
    pub fn has_field(&self, field: &str) -> bool {
        self.fields.contains(&field)
    }
}

/// A type the pipeline can persist.
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a `Record`",
    label = "missing `Record` implementation",
    note = "Derive it with `#[derive(Record)]` or implement `Record` by hand."
)]
pub trait Record: Clone + Debug + Send + Sync + 'static {
    /// The identifier type.
    type Id: Clone + Debug + Eq + Hash + Send + Sync + 'static;

    /// The status type; `()` for records without the `STATUS` capability.
    type Status: Clone + Debug + PartialEq + Send + Sync + 'static;

    /// Static metadata for this record type.
    const DESCRIPTOR: RecordDescriptor;

    /// The record's identifier, if it has one.
    fn id(&self) -> Option<&Self::Id>;

    /// Sets the status column.
    fn set_status(&mut self, _status: Self::Status) {}

    /// Sets the lock flag.
    fn set_locked(&mut self, _locked: bool) {}

    /// Sets the yes/no flag.
    fn set_yn(&mut self, _yn: Yn) {}

    /// Records an audit decision.
    fn set_audit(&mut self, _audit: &AuditValue) {}

    /// The current audit status, for records with the `AUDIT` capability.
    fn audit_status(&self) -> Option<AuditStatus> {
        None
    }
}

/// A yes/no flag, used for soft deletion and enable/disable toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Yn {
    /// Enabled / present.
    #[default]
    Yes,
    /// Disabled / soft-deleted.
    No,
}

/// The state of an audit workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AuditStatus {
    /// Awaiting a decision.
    #[default]
    Pending,
    /// Accepted.
    Approved,
    /// Refused.
    Rejected,
}

/// The value of an `UpdateAuditStatus` call.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AuditValue {
    /// The decided status.
    pub status: AuditStatus,
    /// An optional explanation.
    pub remark: Option<String>,
}

impl AuditValue {
    /// An approval without remark.
    pub fn approve() -> Self {
        Self {
            status: AuditStatus::Approved,
            remark: None,
        }
    }

    /// A rejection with an explanation.
    pub fn reject(remark: impl Into<String>) -> Self {
        Self {
            status: AuditStatus::Rejected,
            remark: Some(remark.into()),
        }
    }
}

/// The value of an `Update` call.
#[derive(Debug, Clone, PartialEq)]
pub struct Patch<R> {
    /// The new record contents.
    pub record: R,
    /// When `true`, only present fields are written.
    pub selective: bool,
}

impl<R> Patch<R> {
    /// A full overwrite.
    pub fn full(record: R) -> Self {
        Self {
            record,
            selective: false,
        }
    }

    /// A selective overwrite.
    pub fn selective(record: R) -> Self {
        Self {
            record,
            selective: true,
        }
    }
}

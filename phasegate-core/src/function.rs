//! Core persistence functions.
//!
//! Each dispatcher is bound to exactly one core function: the call that
//! actually touches storage. Defaults backed by a [`PersistencePort`] live in
//! `phasegate-std`; a registration may override them per operation kind.
//!
//! [`PersistencePort`]: crate::PersistencePort

use crate::actor::Actor;
use crate::error::ActionError;
use crate::record::Record;
use crate::selector::Selector;

/// Inserts a batch of records, returning the number written.
pub trait InsertFunction<R: Record>: Send + Sync + 'static {
    /// Writes `records`; with `ignore`, duplicates are skipped instead of failing.
    fn insert(&self, records: &[R], ignore: bool, actor: &Actor) -> Result<u64, ActionError>;
}

/// Reads from storage for a read-only operation.
pub trait SelectFunction<R: Record, Q, T>: Send + Sync + 'static {
    /// Resolves `selector` into the operation's raw result.
    fn select(&self, selector: &Selector<R::Id, Q>, actor: &Actor) -> Result<T, ActionError>;
}

/// Writes to storage for an update- or delete-like operation.
pub trait MutationFunction<R: Record, Q, V>: Send + Sync + 'static {
    /// Applies `value` to the records selected by `selector`.
    ///
    /// `subjects` are the records resolved before validation, for functions
    /// that need their current state.
    fn mutate(
        &self,
        subjects: &[R],
        selector: &Selector<R::Id, Q>,
        value: &V,
        actor: &Actor,
    ) -> Result<u64, ActionError>;
}

/// The raw result of a read-only operation.
///
/// Lets the select dispatcher hand the records inside a result to consumers,
/// and report how much was read.
pub trait Selection<R>: Send + 'static {
    /// The records carried by this result.
    fn records(&self) -> &[R];

    /// Mutable access to the records carried by this result.
    fn records_mut(&mut self) -> &mut [R];

    /// The number reported to terminal extensions.
    fn affected(&self) -> u64 {
        self.records().len() as u64
    }

    /// Whether the result carries nothing.
    fn is_empty(&self) -> bool {
        self.affected() == 0
    }
}

impl<R: Send + 'static> Selection<R> for Vec<R> {
    fn records(&self) -> &[R] {
        self
    }

    fn records_mut(&mut self) -> &mut [R] {
        self
    }
}

impl<R: Send + 'static> Selection<R> for Option<R> {
    fn records(&self) -> &[R] {
        self.as_slice()
    }

    fn records_mut(&mut self) -> &mut [R] {
        self.as_mut_slice()
    }
}

impl<R: Send + 'static> Selection<R> for u64 {
    fn records(&self) -> &[R] {
        Default::default()
    }

    fn records_mut(&mut self) -> &mut [R] {
        Default::default()
    }

    fn affected(&self) -> u64 {
        *self
    }
}

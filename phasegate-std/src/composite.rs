//! Composites: many extensions of one kind behind that kind's own trait.
//!
//! A dispatcher holds exactly one [`Composite`] per phase and kind, so it never
//! iterates extensions itself. Each kind has its own combination rule:
//!
//! - filters are AND-ed
//! - validators and consumers run in order and stop at the first failure
//! - after-throwing, after-returning and terminal consumers all run, and
//!   their failures are collected into one [`SecondaryErrors`]
//!
//! An empty composite is a no-op (a filter composite with no members accepts
//! everything).

use phasegate_core::{
    ActionError, Actor, AfterReturningConsumer, AfterThrowingConsumer, BoxError, CallSite,
    Consumer, Filter, OperationKind, Outcome, QueryConsumer, Record, ResultQueryConsumer,
    TerminalConsumer, ValidationError, Validator, ValueConsumer,
};
use std::sync::Arc;
use thiserror::Error;

/// An ordered group of extensions of the same kind.
pub struct Composite<X: ?Sized> {
    members: Vec<Arc<X>>,
}

impl<X: ?Sized> Composite<X> {
    /// Creates a composite running `members` in the given order.
    pub fn new(members: Vec<Arc<X>>) -> Self {
        Self { members }
    }

    /// A composite with no members.
    pub fn empty() -> Self {
        Self {
            members: Vec::new(),
        }
    }

    /// Appends a member, run after the existing ones.
    pub fn push(&mut self, member: Arc<X>) {
        self.members.push(member);
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the composite has no members.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl<X: ?Sized> Clone for Composite<X> {
    fn clone(&self) -> Self {
        Self {
            members: self.members.clone(),
        }
    }
}

impl<X: ?Sized> Default for Composite<X> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<X: ?Sized> std::fmt::Debug for Composite<X> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Composite")
            .field("members", &self.members.len())
            .finish()
    }
}

/// Failures raised by observers that ran to completion anyway.
///
/// These never replace a call's outcome; dispatchers log them and move on.
#[derive(Error, Debug)]
#[error("{} observer(s) failed", .0.len())]
pub struct SecondaryErrors(pub Vec<BoxError>);

fn collect(errors: Vec<BoxError>) -> Result<(), BoxError> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(Box::new(SecondaryErrors(errors)))
    }
}

impl<R: Record> Filter<R> for Composite<dyn Filter<R>> {
    fn test(&self, operation: OperationKind, record: &R, actor: &Actor) -> bool {
        self.members
            .iter()
            .all(|filter| filter.test(operation, record, actor))
    }
}

impl<R: Record, V: 'static> Validator<R, V> for Composite<dyn Validator<R, V>> {
    fn validate(
        &self,
        operation: OperationKind,
        subjects: &[R],
        value: &V,
        actor: &Actor,
    ) -> Result<(), ValidationError> {
        for validator in &self.members {
            validator.validate(operation, subjects, value, actor)?;
        }
        Ok(())
    }
}

impl<R: Record> Consumer<R> for Composite<dyn Consumer<R>> {
    fn accept(
        &self,
        operation: OperationKind,
        subjects: &mut [R],
        actor: &Actor,
    ) -> Result<(), BoxError> {
        for consumer in &self.members {
            consumer.accept(operation, subjects, actor)?;
        }
        Ok(())
    }
}

impl<R: Record, V: 'static> ValueConsumer<R, V> for Composite<dyn ValueConsumer<R, V>> {
    fn accept(
        &self,
        operation: OperationKind,
        subjects: &[R],
        value: &V,
        actor: &Actor,
    ) -> Result<(), BoxError> {
        for consumer in &self.members {
            consumer.accept(operation, subjects, value, actor)?;
        }
        Ok(())
    }
}

impl<R: Record, Q: 'static> QueryConsumer<R, Q> for Composite<dyn QueryConsumer<R, Q>> {
    fn accept(
        &self,
        operation: OperationKind,
        query: &mut Q,
        actor: &Actor,
    ) -> Result<(), BoxError> {
        for consumer in &self.members {
            consumer.accept(operation, query, actor)?;
        }
        Ok(())
    }
}

impl<R: Record, Q: 'static> ResultQueryConsumer<R, Q> for Composite<dyn ResultQueryConsumer<R, Q>> {
    fn accept(
        &self,
        operation: OperationKind,
        subjects: &mut [R],
        query: &Q,
        actor: &Actor,
    ) -> Result<(), BoxError> {
        for consumer in &self.members {
            consumer.accept(operation, subjects, query, actor)?;
        }
        Ok(())
    }
}

impl<R: Record, Q: 'static> AfterThrowingConsumer<R, Q>
    for Composite<dyn AfterThrowingConsumer<R, Q>>
{
    fn on_error(&self, call: &CallSite<'_, R, Q>, error: &ActionError) -> Result<(), BoxError> {
        let errors = self
            .members
            .iter()
            .filter_map(|consumer| consumer.on_error(call, error).err())
            .collect();
        collect(errors)
    }
}

impl<R: Record, Q: 'static> AfterReturningConsumer<R, Q>
    for Composite<dyn AfterReturningConsumer<R, Q>>
{
    fn on_return(&self, call: &CallSite<'_, R, Q>, outcome: Outcome<'_>) -> Result<(), BoxError> {
        let errors = self
            .members
            .iter()
            .filter_map(|consumer| consumer.on_return(call, outcome).err())
            .collect();
        collect(errors)
    }
}

impl<R: Record, Q: 'static> TerminalConsumer<R, Q> for Composite<dyn TerminalConsumer<R, Q>> {
    fn after(&self, call: &CallSite<'_, R, Q>, outcome: Outcome<'_>) -> Result<(), BoxError> {
        let errors = self
            .members
            .iter()
            .filter_map(|consumer| consumer.after(call, outcome).err())
            .collect();
        collect(errors)
    }
}

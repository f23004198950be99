//! The read dispatcher.

use super::{Terminals, extension_error, outcome};
use crate::composite::Composite;
use crate::config::AuditLogConfig;
use crate::registry::{ExtensionRegistry, MatchKey};
use phasegate_core::{
    ActionError, Actor, CallSite, Consumer, ExtensionPointKind, OperationKind, Phase,
    QueryConsumer, Record, ResultQueryConsumer, ResultTransform, SelectFunction, Selection,
    Selector, Stage,
};
use std::fmt::Debug;
use std::sync::Arc;

/// The extension phases of one read operation.
pub struct SelectPhases<R: Record, Q, T> {
    query: Composite<dyn QueryConsumer<R, Q>>,
    post: Composite<dyn Consumer<R>>,
    post_query: Composite<dyn ResultQueryConsumer<R, Q>>,
    transform: Option<Arc<dyn ResultTransform<R, T>>>,
    terminals: Terminals<R, Q>,
}

impl<R, Q, T> SelectPhases<R, Q, T>
where
    R: Record,
    Q: Debug + Send + Sync + 'static,
    T: 'static,
{
    /// Resolves every phase of `operation` from `registry`.
    pub fn resolve(
        registry: &ExtensionRegistry,
        operation: OperationKind,
        audit_log: &AuditLogConfig,
    ) -> Self {
        Self {
            query: registry.composite(
                &MatchKey::of::<R>(operation, Phase::Pre, ExtensionPointKind::QueryConsumer)
                    .with_value::<Q>(),
            ),
            post: registry.composite(&MatchKey::of::<R>(
                operation,
                Phase::Post,
                ExtensionPointKind::Consumer,
            )),
            post_query: registry.composite(
                &MatchKey::of::<R>(operation, Phase::Post, ExtensionPointKind::ResultQueryConsumer)
                    .with_value::<Q>(),
            ),
            transform: registry.result_transform(operation),
            terminals: Terminals::resolve(registry, operation, audit_log),
        }
    }
}

/// Runs a read: pre query consumers, read, post consumers, transform.
///
/// Empty results are returned as they are, without running post consumers or
/// the transform, except for detail reads, which fail with
/// [`ActionError::NotFound`]. A detail read the transform empties fails the
/// same way, before the terminals see the outcome.
pub struct SelectDispatcher<R: Record, Q, T> {
    operation: OperationKind,
    phases: SelectPhases<R, Q, T>,
    function: Arc<dyn SelectFunction<R, Q, T>>,
    require_subject: bool,
}

impl<R, Q, T> SelectDispatcher<R, Q, T>
where
    R: Record,
    Q: Debug + Send + Sync + 'static,
    T: Selection<R>,
{
    /// Binds `phases` to `function` for `operation`.
    pub fn new(
        operation: OperationKind,
        phases: SelectPhases<R, Q, T>,
        function: Arc<dyn SelectFunction<R, Q, T>>,
    ) -> Self {
        Self {
            operation,
            phases,
            function,
            require_subject: matches!(
                operation,
                OperationKind::DetailByQuery | OperationKind::DetailById
            ),
        }
    }

    /// The operation this dispatcher runs.
    pub fn operation(&self) -> OperationKind {
        self.operation
    }

    /// Reads what `selector` designates on behalf of `actor`.
    pub fn dispatch(
        &self,
        mut selector: Selector<R::Id, Q>,
        actor: &Actor,
    ) -> Result<T, ActionError> {
        let span = tracing::debug_span!(
            "action",
            operation = %self.operation,
            record = R::DESCRIPTOR.name
        );
        let _enter = span.enter();

        let mut stage = Stage::Start;
        let mut loaded = Vec::new();
        let result = self.run(&mut selector, actor, &mut loaded, &mut stage);

        let subjects: &[R] = match &result {
            Ok(selection) => selection.records(),
            Err(_) => &loaded,
        };
        let call = CallSite {
            operation: self.operation,
            subjects,
            selector: Some(&selector),
            actor,
            stage,
        };
        self.phases
            .terminals
            .settle(&call, outcome(&result, |selection| selection.affected()));
        result
    }

    /// On failure after the read, `loaded` holds the records read so far.
    fn run(
        &self,
        selector: &mut Selector<R::Id, Q>,
        actor: &Actor,
        loaded: &mut Vec<R>,
        stage: &mut Stage,
    ) -> Result<T, ActionError> {
        let operation = self.operation;
        if !operation.accepts(selector) {
            return Err(ActionError::bad_request(
                operation,
                format!("cannot select by {selector}"),
            ));
        }

        if let Some(query) = selector.query_mut() {
            self.phases.query.accept(operation, query, actor).map_err(extension_error(
                operation,
                Phase::Pre,
                ExtensionPointKind::QueryConsumer,
            ))?;
        }
        *stage = Stage::QueryPrepared;
        tracing::trace!(?stage, %selector);

        let mut result = self.function.select(selector, actor)?;
        *stage = Stage::SubjectsLoaded;
        tracing::trace!(?stage, found = result.affected());

        if result.is_empty() {
            if self.require_subject {
                return Err(self.not_found(selector));
            }
            *stage = Stage::ResultReady;
            return Ok(result);
        }

        if let Err(err) = self.post(&mut result, selector, actor) {
            loaded.extend_from_slice(result.records());
            return Err(err);
        }
        *stage = Stage::PostHooked;

        let result = match &self.phases.transform {
            Some(transform) => {
                loaded.extend_from_slice(result.records());
                transform.transform(operation, result, actor).map_err(extension_error(
                    operation,
                    Phase::Post,
                    ExtensionPointKind::ResultTransform,
                ))?
            }
            None => result,
        };
        if self.require_subject && result.is_empty() {
            return Err(self.not_found(selector));
        }
        *stage = Stage::ResultReady;
        Ok(result)
    }

    fn post(
        &self,
        result: &mut T,
        selector: &Selector<R::Id, Q>,
        actor: &Actor,
    ) -> Result<(), ActionError> {
        let operation = self.operation;
        self.phases
            .post
            .accept(operation, result.records_mut(), actor)
            .map_err(extension_error(operation, Phase::Post, ExtensionPointKind::Consumer))?;
        if let Some(query) = selector.query() {
            self.phases
                .post_query
                .accept(operation, result.records_mut(), query, actor)
                .map_err(extension_error(
                    operation,
                    Phase::Post,
                    ExtensionPointKind::ResultQueryConsumer,
                ))?;
        }
        Ok(())
    }

    fn not_found(&self, selector: &Selector<R::Id, Q>) -> ActionError {
        ActionError::NotFound {
            record: R::DESCRIPTOR.name,
            operation: self.operation,
            selector: selector.to_string(),
        }
    }
}

impl<R: Record, Q, T> Debug for SelectDispatcher<R, Q, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SelectDispatcher")
            .field("operation", &self.operation)
            .field("record", &R::DESCRIPTOR.name)
            .field("require_subject", &self.require_subject)
            .finish_non_exhaustive()
    }
}

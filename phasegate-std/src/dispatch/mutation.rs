//! The mutation state machine shared by every update and delete kind.

use super::{Terminals, extension_error, outcome};
use crate::composite::Composite;
use crate::config::AuditLogConfig;
use crate::registry::{ExtensionRegistry, MatchKey};
use phasegate_core::{
    ActionError, Actor, CallSite, Consumer, ExtensionPointKind, MutationFunction, OperationKind,
    Phase, QueryConsumer, Record, ResultQueryConsumer, ResultTransform, SelectFunction, Selector,
    Stage, Validator, ValueConsumer,
};
use std::fmt::Debug;
use std::sync::Arc;

/// The extension phases of one mutation kind.
///
/// `V` is the value the caller supplies: a new status, a lock flag, a patch,
/// or `()` for deletes.
pub struct MutationPhases<R: Record, Q, V> {
    query: Composite<dyn QueryConsumer<R, Q>>,
    validators: Composite<dyn Validator<R, V>>,
    pre: Composite<dyn Consumer<R>>,
    pre_value: Composite<dyn ValueConsumer<R, V>>,
    post_value: Composite<dyn ValueConsumer<R, V>>,
    post: Composite<dyn Consumer<R>>,
    post_query: Composite<dyn ResultQueryConsumer<R, Q>>,
    transform: Option<Arc<dyn ResultTransform<R, u64>>>,
    terminals: Terminals<R, Q>,
}

impl<R, Q, V> MutationPhases<R, Q, V>
where
    R: Record,
    Q: Debug + Send + Sync + 'static,
    V: 'static,
{
    /// Resolves every phase of `operation` from `registry`.
    pub fn resolve(
        registry: &ExtensionRegistry,
        operation: OperationKind,
        audit_log: &AuditLogConfig,
    ) -> Self {
        let key = |phase, kind| MatchKey::of::<R>(operation, phase, kind);
        Self {
            query: registry
                .composite(&key(Phase::Pre, ExtensionPointKind::QueryConsumer).with_value::<Q>()),
            validators: registry
                .composite(&key(Phase::Pre, ExtensionPointKind::Validator).with_value::<V>()),
            pre: registry.composite(&key(Phase::Pre, ExtensionPointKind::Consumer)),
            pre_value: registry
                .composite(&key(Phase::Pre, ExtensionPointKind::ValueConsumer).with_value::<V>()),
            post_value: registry
                .composite(&key(Phase::Post, ExtensionPointKind::ValueConsumer).with_value::<V>()),
            post: registry.composite(&key(Phase::Post, ExtensionPointKind::Consumer)),
            post_query: registry.composite(
                &key(Phase::Post, ExtensionPointKind::ResultQueryConsumer).with_value::<Q>(),
            ),
            transform: registry.result_transform(operation),
            terminals: Terminals::resolve(registry, operation, audit_log),
        }
    }

    /// Appends a validator after the registered ones.
    pub fn with_validator(mut self, validator: Arc<dyn Validator<R, V>>) -> Self {
        self.validators.push(validator);
        self
    }
}

/// Runs an update- or delete-like operation.
///
/// The sequence is fixed:
///
/// 1. pre query consumers (query selectors only)
/// 2. resolve the subjects; none is [`ActionError::NotFound`]
/// 3. validators
/// 4. pre consumers, then pre value consumers
/// 5. the core function
/// 6. post value consumers, post consumers, then post result-query consumers
///    (query selectors only)
/// 7. the result transform, if any
///
/// A failure at any step skips the rest and reaches the after-throwing
/// consumers; the after-returning and terminal consumers run exactly once
/// either way.
pub struct MutationDispatcher<R: Record, Q, V> {
    operation: OperationKind,
    phases: MutationPhases<R, Q, V>,
    subjects: Arc<dyn SelectFunction<R, Q, Vec<R>>>,
    function: Arc<dyn MutationFunction<R, Q, V>>,
}

impl<R, Q, V> MutationDispatcher<R, Q, V>
where
    R: Record,
    Q: Debug + Send + Sync + 'static,
    V: 'static,
{
    /// Binds `phases` to a subject loader and a core function for `operation`.
    pub fn new(
        operation: OperationKind,
        phases: MutationPhases<R, Q, V>,
        subjects: Arc<dyn SelectFunction<R, Q, Vec<R>>>,
        function: Arc<dyn MutationFunction<R, Q, V>>,
    ) -> Self {
        Self {
            operation,
            phases,
            subjects,
            function,
        }
    }

    /// The operation this dispatcher runs.
    pub fn operation(&self) -> OperationKind {
        self.operation
    }

    /// Applies `value` to what `selector` designates, on behalf of `actor`.
    pub fn dispatch(
        &self,
        mut selector: Selector<R::Id, Q>,
        value: V,
        actor: &Actor,
    ) -> Result<u64, ActionError> {
        let span = tracing::debug_span!(
            "action",
            operation = %self.operation,
            record = R::DESCRIPTOR.name
        );
        let _enter = span.enter();

        let mut stage = Stage::Start;
        let mut subjects = Vec::new();
        let result = self.run(&mut selector, &value, &mut subjects, actor, &mut stage);

        let call = CallSite {
            operation: self.operation,
            subjects: &subjects,
            selector: Some(&selector),
            actor,
            stage,
        };
        self.phases
            .terminals
            .settle(&call, outcome(&result, |affected| *affected));
        result
    }

    fn run(
        &self,
        selector: &mut Selector<R::Id, Q>,
        value: &V,
        subjects: &mut Vec<R>,
        actor: &Actor,
        stage: &mut Stage,
    ) -> Result<u64, ActionError> {
        let operation = self.operation;
        let phases = &self.phases;
        if !operation.accepts(selector) {
            return Err(ActionError::bad_request(
                operation,
                format!("cannot apply to {selector}"),
            ));
        }

        if let Some(query) = selector.query_mut() {
            phases.query.accept(operation, query, actor).map_err(extension_error(
                operation,
                Phase::Pre,
                ExtensionPointKind::QueryConsumer,
            ))?;
        }
        *stage = Stage::QueryPrepared;
        tracing::trace!(?stage, %selector);

        *subjects = self.subjects.select(selector, actor)?;
        if subjects.is_empty() {
            return Err(ActionError::NotFound {
                record: R::DESCRIPTOR.name,
                operation,
                selector: selector.to_string(),
            });
        }
        *stage = Stage::SubjectsLoaded;
        tracing::trace!(?stage, subjects = subjects.len());

        phases
            .validators
            .validate(operation, subjects, value, actor)
            .map_err(|source| ActionError::ValidationFailed { operation, source })?;
        *stage = Stage::Validated;

        phases
            .pre
            .accept(operation, subjects, actor)
            .map_err(extension_error(operation, Phase::Pre, ExtensionPointKind::Consumer))?;
        phases
            .pre_value
            .accept(operation, subjects, value, actor)
            .map_err(extension_error(operation, Phase::Pre, ExtensionPointKind::ValueConsumer))?;
        *stage = Stage::PreHooked;

        let affected = self.function.mutate(subjects, selector, value, actor)?;
        *stage = Stage::Persisted;
        tracing::trace!(?stage, affected);

        phases
            .post_value
            .accept(operation, subjects, value, actor)
            .map_err(extension_error(operation, Phase::Post, ExtensionPointKind::ValueConsumer))?;
        phases
            .post
            .accept(operation, subjects, actor)
            .map_err(extension_error(operation, Phase::Post, ExtensionPointKind::Consumer))?;
        if let Some(query) = selector.query() {
            phases
                .post_query
                .accept(operation, subjects, query, actor)
                .map_err(extension_error(
                    operation,
                    Phase::Post,
                    ExtensionPointKind::ResultQueryConsumer,
                ))?;
        }
        *stage = Stage::PostHooked;

        let result = match &phases.transform {
            Some(transform) => transform.transform(operation, affected, actor).map_err(
                extension_error(operation, Phase::Post, ExtensionPointKind::ResultTransform),
            )?,
            None => affected,
        };
        *stage = Stage::ResultReady;
        Ok(result)
    }
}

impl<R: Record, Q, V> Debug for MutationDispatcher<R, Q, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MutationDispatcher")
            .field("operation", &self.operation)
            .field("record", &R::DESCRIPTOR.name)
            .field("validators", &self.phases.validators.len())
            .finish_non_exhaustive()
    }
}

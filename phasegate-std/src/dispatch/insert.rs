//! The create dispatcher.

use super::{Terminals, extension_error, outcome};
use crate::composite::Composite;
use crate::config::FactoryConfig;
use crate::registry::{ExtensionRegistry, MatchKey};
use phasegate_core::{
    ActionError, Actor, CallSite, Consumer, ExtensionPointKind, Filter, InsertFunction,
    OperationKind, Phase, Record, ResultTransform, Stage,
};
use std::fmt::Debug;
use std::sync::Arc;

const OPERATION: OperationKind = OperationKind::Create;

/// Runs `Create`: filter, pre consumers, insert, post consumers, transform.
///
/// Records rejected by the filter are dropped silently. When every record is
/// dropped the port is never called and the result is `0`.
pub struct InsertDispatcher<R: Record, Q> {
    filter: Composite<dyn Filter<R>>,
    pre: Composite<dyn Consumer<R>>,
    post: Composite<dyn Consumer<R>>,
    transform: Option<Arc<dyn ResultTransform<R, u64>>>,
    terminals: Terminals<R, Q>,
    function: Arc<dyn InsertFunction<R>>,
    ignore: bool,
}

impl<R, Q> InsertDispatcher<R, Q>
where
    R: Record,
    Q: Debug + Send + Sync + 'static,
{
    /// Resolves every phase of `Create` from `registry` around `function`.
    pub fn resolve(
        registry: &ExtensionRegistry,
        function: Arc<dyn InsertFunction<R>>,
        config: &FactoryConfig,
    ) -> Self {
        let consumers = |phase| MatchKey::of::<R>(OPERATION, phase, ExtensionPointKind::Consumer);
        Self {
            filter: registry.filters(OPERATION),
            pre: registry.composite(&consumers(Phase::Pre)),
            post: registry.composite(&consumers(Phase::Post)),
            transform: registry.result_transform(OPERATION),
            terminals: Terminals::resolve(registry, OPERATION, &config.audit_log),
            function,
            ignore: config.insert_ignore,
        }
    }

    /// Creates `records` on behalf of `actor`, returning the number written.
    pub fn dispatch(&self, records: Vec<R>, actor: &Actor) -> Result<u64, ActionError> {
        let span = tracing::debug_span!(
            "action",
            operation = %OPERATION,
            record = R::DESCRIPTOR.name
        );
        let _enter = span.enter();

        let mut stage = Stage::Start;
        let offered = records.len();
        let mut subjects: Vec<R> = records
            .into_iter()
            .filter(|record| self.filter.test(OPERATION, record, actor))
            .collect();
        tracing::trace!(offered, kept = subjects.len(), "filtered");

        let result = self.run(&mut subjects, actor, &mut stage);

        let call = CallSite {
            operation: OPERATION,
            subjects: &subjects,
            selector: None,
            actor,
            stage,
        };
        self.terminals.settle(&call, outcome(&result, |affected| *affected));
        result
    }

    fn run(
        &self,
        subjects: &mut [R],
        actor: &Actor,
        stage: &mut Stage,
    ) -> Result<u64, ActionError> {
        *stage = Stage::SubjectsLoaded;
        if subjects.is_empty() {
            tracing::debug!("every record was filtered out; nothing to insert");
            *stage = Stage::ResultReady;
            return Ok(0);
        }

        self.pre
            .accept(OPERATION, subjects, actor)
            .map_err(extension_error(OPERATION, Phase::Pre, ExtensionPointKind::Consumer))?;
        *stage = Stage::PreHooked;
        tracing::trace!(?stage);

        let affected = self.function.insert(subjects, self.ignore, actor)?;
        *stage = Stage::Persisted;
        tracing::trace!(?stage, affected);

        self.post
            .accept(OPERATION, subjects, actor)
            .map_err(extension_error(OPERATION, Phase::Post, ExtensionPointKind::Consumer))?;
        *stage = Stage::PostHooked;

        let result = match &self.transform {
            Some(transform) => transform.transform(OPERATION, affected, actor).map_err(
                extension_error(OPERATION, Phase::Post, ExtensionPointKind::ResultTransform),
            )?,
            None => affected,
        };
        *stage = Stage::ResultReady;
        Ok(result)
    }
}

impl<R: Record, Q> Debug for InsertDispatcher<R, Q> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InsertDispatcher")
            .field("record", &R::DESCRIPTOR.name)
            .field("filters", &self.filter.len())
            .field("pre", &self.pre.len())
            .field("post", &self.post.len())
            .field("transform", &self.transform.is_some())
            .field("ignore", &self.ignore)
            .finish()
    }
}

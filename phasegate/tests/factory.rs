mod common;

use common::{NotePort, Tag, TagQuery, actor, build, seeded};
use phasegate::testing::{Note, NoteQuery};
use phasegate::{
    ActionError, Actions, Actor, AuditLevel, AuditLogConfig, DispatcherFactory, ExtensionRegistry,
    FactoryConfig, MemoryStore, MutationFunction, OperationKind, Registration, SelectFunction,
    Selector,
};
use std::sync::Arc;

type TagStore = MemoryStore<Tag, TagQuery>;

fn tags() -> Actions<Tag, TagStore> {
    let store = MemoryStore::with_records([Tag {
        id: 1,
        label: "rust".into(),
    }]);
    DispatcherFactory::default()
        .build::<Tag, _>(Arc::new(store))
        .unwrap()
}

#[test]
fn test_capabilities_gate_update_kinds() {
    let notes = build(Vec::new(), seeded());
    assert_eq!(notes.operations(), OperationKind::ALL);

    let tags = tags();
    assert!(!tags.supports(OperationKind::UpdateStatus));
    assert!(!tags.supports(OperationKind::UpdateAuditStatus));
    assert!(tags.supports(OperationKind::Update));
    assert_eq!(tags.operations().len(), OperationKind::ALL.len() - 4);

    let err = tags.update_lock(Selector::Id(1), true, &actor()).unwrap_err();
    match err {
        ActionError::BadRequest { operation, reason } => {
            assert_eq!(operation, OperationKind::UpdateLock);
            assert!(reason.contains("tag"), "{reason}");
        }
        other => panic!("expected BadRequest, got {other:?}"),
    }
    let err = tags
        .update_status(Selector::Id(1), (), &actor())
        .unwrap_err();
    assert!(err.is_bad_request());
}

struct Pinned;

impl SelectFunction<Note, NoteQuery, Vec<Note>> for Pinned {
    fn select(
        &self,
        _selector: &Selector<u64, NoteQuery>,
        _actor: &Actor,
    ) -> Result<Vec<Note>, ActionError> {
        Ok(vec![Note::new(100, "pinned")])
    }
}

struct SoftDelete(Arc<NotePort>);

impl MutationFunction<Note, NoteQuery, ()> for SoftDelete {
    fn mutate(
        &self,
        subjects: &[Note],
        selector: &Selector<u64, NoteQuery>,
        _value: &(),
        _actor: &Actor,
    ) -> Result<u64, ActionError> {
        use phasegate::{Change, PersistencePort, Yn};
        self.0
            .update(&Change::Yn(Yn::No), selector)
            .map_err(|source| ActionError::Persistence {
                operation: OperationKind::DeleteById,
                source,
            })?;
        Ok(subjects.len() as u64)
    }
}

#[test]
fn test_core_function_overrides() {
    let port = seeded();
    let actions = build(
        vec![
            Registration::select_function::<Note, NoteQuery, Vec<Note>, _>(
                OperationKind::ListByQuery,
                Pinned,
            ),
            Registration::mutation_function::<Note, NoteQuery, (), _>(
                OperationKind::DeleteById,
                SoftDelete(port.clone()),
            ),
        ],
        port.clone(),
    );

    let listed = actions.list(NoteQuery::default(), &actor()).unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, 100);

    let exported = actions.export(NoteQuery::default(), &actor()).unwrap();
    assert_eq!(exported.len(), 3);

    assert_eq!(actions.delete_by_id(2, &actor()).unwrap(), 1);
    assert_eq!(port.calls("delete"), 0);
    let notes = port.inner().snapshot().unwrap();
    assert_eq!(notes.len(), 3);
    assert_eq!(notes[1].yn, phasegate::Yn::No);
}

#[test]
fn test_audit_log_can_be_disabled() {
    let config = FactoryConfig::new()
        .audit_log(AuditLogConfig::default().enabled(false).level(AuditLevel::Trace));
    let factory = DispatcherFactory::new(ExtensionRegistry::empty()).with_config(config);
    assert!(!factory.config().audit_log.enabled);

    let actions = factory.build::<Note, _>(seeded()).unwrap();
    assert_eq!(actions.count(NoteQuery::default(), &actor()).unwrap(), 3);
}

#[test]
fn test_actions_are_shareable() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Actions<Note, NotePort>>();
    assert_send_sync::<DispatcherFactory>();

    let actions = Arc::new(build(Vec::new(), seeded()));
    let handles: Vec<_> = (10..14)
        .map(|id| {
            let actions = actions.clone();
            std::thread::spawn(move || {
                actions
                    .create(vec![Note::new(id, format!("note {id}"))], &actor())
                    .unwrap()
            })
        })
        .collect();
    let created: u64 = handles.into_iter().map(|h| h.join().unwrap()).sum();
    assert_eq!(created, 4);
    assert_eq!(actions.port().inner().len().unwrap(), 7);
}

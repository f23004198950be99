mod common;

use common::{AnyLine, LogLine, Tag, TagQuery, actor, build, seeded};
use phasegate::testing::{Note, NoteQuery, RecordingConsumer};
use phasegate::{
    Actor, BoxError, BuildError, DispatcherFactory, ExtensionPointKind, ExtensionRegistry,
    MatchKey, MemoryStore, OperationKind, Phase, Registration,
};
use std::sync::Arc;

fn registrations(log: &phasegate::testing::CallLog) -> Vec<Registration> {
    ["low", "first-default", "high", "second-default"]
        .into_iter()
        .zip([-5, 0, 20, 0])
        .map(|(name, priority)| {
            Registration::consumer::<Note, _>(
                OperationKind::DeleteById,
                Phase::Pre,
                RecordingConsumer::named(name).with_log(log.clone()),
            )
            .named(name)
            .priority(priority)
        })
        .collect()
}

#[test]
fn test_order_is_stable_across_builds() {
    let key =
        MatchKey::of::<Note>(OperationKind::DeleteById, Phase::Pre, ExtensionPointKind::Consumer);
    let log = phasegate::testing::CallLog::default();

    let first = ExtensionRegistry::builder()
        .register_all(registrations(&log))
        .build()
        .unwrap();
    let second = ExtensionRegistry::builder()
        .register_all(registrations(&log))
        .build()
        .unwrap();

    let expected = ["high", "first-default", "second-default", "low"];
    assert_eq!(first.names(&key), expected);
    assert_eq!(second.names(&key), expected);
}

#[test]
fn test_run_order_follows_priority() {
    let log = phasegate::testing::CallLog::default();
    let actions = build(registrations(&log), seeded());

    actions.delete_by_id(1, &actor()).unwrap();

    let names: Vec<_> = log.lock().unwrap().iter().map(|c| c.name.clone()).collect();
    assert_eq!(names, ["high", "first-default", "second-default", "low"]);
}

#[test]
fn test_extensions_only_reach_their_record_type() {
    let notes = RecordingConsumer::named("notes");
    let registry = ExtensionRegistry::builder()
        .register(Registration::consumer::<Note, _>(
            OperationKind::Create,
            Phase::Post,
            notes.clone(),
        ))
        .build()
        .unwrap();
    let factory = DispatcherFactory::new(registry);

    let tags = factory
        .build::<Tag, _>(Arc::new(MemoryStore::<Tag, TagQuery>::new()))
        .unwrap();
    tags.create(
        vec![Tag {
            id: 1,
            label: "rust".into(),
        }],
        &actor(),
    )
    .unwrap();
    assert_eq!(notes.count(), 0);

    let notes_actions = factory.build::<Note, _>(seeded()).unwrap();
    notes_actions
        .create(vec![Note::new(9, "nine")], &actor())
        .unwrap();
    assert_eq!(notes.count(), 1);
}

#[test]
fn test_build_failures() {
    let err = DispatcherFactory::new(ExtensionRegistry::empty())
        .build::<LogLine, _>(Arc::new(MemoryStore::<LogLine, AnyLine>::new()))
        .unwrap_err();
    assert_eq!(err, BuildError::MissingIdentifier { record: "log_line" });

    let same = |_: OperationKind, n: u64, _: &Actor| -> Result<u64, BoxError> { Ok(n) };
    let err = ExtensionRegistry::builder()
        .register(Registration::result_transform::<Note, u64, _>(
            OperationKind::Count,
            same,
        ))
        .register(Registration::result_transform::<Note, u64, _>(
            OperationKind::Count,
            same,
        ))
        .build()
        .unwrap_err();
    assert!(matches!(err, BuildError::DuplicateResultTransform { .. }));

    let err = ExtensionRegistry::builder()
        .register(
            Registration::result_query_consumer::<Note, NoteQuery, _>(
                OperationKind::ListByQuery,
                RecordingConsumer::new(),
            )
            .in_phase(Phase::Pre),
        )
        .build()
        .unwrap_err();
    assert!(matches!(
        err,
        BuildError::PhaseNotPermitted {
            kind: ExtensionPointKind::ResultQueryConsumer,
            phase: Phase::Pre,
            ..
        }
    ));

    let err = ExtensionRegistry::builder()
        .register(Registration::filter::<Note, _>(
            OperationKind::DeleteById,
            |_: OperationKind, _: &Note, _: &Actor| false,
        ))
        .build()
        .unwrap_err();
    assert!(matches!(
        err,
        BuildError::NeverRun {
            operation: OperationKind::DeleteById,
            kind: ExtensionPointKind::Filter,
            ..
        }
    ));

    let err = ExtensionRegistry::builder()
        .register(
            Registration::consumer::<Note, _>(
                OperationKind::ListByQuery,
                Phase::Pre,
                RecordingConsumer::new(),
            )
            .named("pre-list"),
        )
        .build()
        .unwrap_err();
    assert_eq!(
        err,
        BuildError::NeverRun {
            name: "pre-list".into(),
            operation: OperationKind::ListByQuery,
            kind: ExtensionPointKind::Consumer,
            phase: Phase::Pre,
        }
    );

    let err = ExtensionRegistry::builder()
        .register(Registration::validator::<Note, (), _>(
            OperationKind::Create,
            phasegate::testing::FailingValidator::new("never"),
        ))
        .build()
        .unwrap_err();
    assert!(matches!(err, BuildError::NeverRun { kind: ExtensionPointKind::Validator, .. }));
}

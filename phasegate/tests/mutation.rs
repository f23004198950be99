mod common;

use common::{actor, build, seeded, stored};
use phasegate::testing::{
    CountingTerminal, FailingObserver, FailingValidator, Note, NoteQuery, NoteStatus,
    RecordingConsumer,
};
use phasegate::{
    ActionError, Actor, AuditStatus, AuditValue, BoxError, Change, ExtensionPointKind,
    OperationKind, Patch, Phase, Registration, Selector, ValueConsumer, Yn,
};

// ============================================================================
// Happy Paths
// ============================================================================

#[test]
fn test_update_status_by_id() {
    let port = seeded();
    let pre = RecordingConsumer::named("pre");
    let post = RecordingConsumer::named("post").with_log(pre.shared_log());
    let actions = build(
        vec![
            Registration::value_consumer::<Note, NoteStatus, _>(
                OperationKind::UpdateStatus,
                Phase::Pre,
                pre.clone(),
            ),
            Registration::value_consumer::<Note, NoteStatus, _>(
                OperationKind::UpdateStatus,
                Phase::Post,
                post,
            ),
        ],
        port.clone(),
    );

    let updated = actions
        .update_status(Selector::Id(2), NoteStatus::Published, &actor())
        .unwrap();

    assert_eq!(updated, 1);
    let calls = pre.calls();
    let names: Vec<_> = calls.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["pre", "post"]);
    for call in &calls {
        assert_eq!(call.ids, ["2"]);
        assert_eq!(call.value.as_deref(), Some("Published"));
        assert_eq!(call.actor, "alice");
    }
    assert_eq!(port.last_change(), Some(Change::Status(NoteStatus::Published)));
    assert_eq!(stored(&port)[1].status, NoteStatus::Published);
}

#[test]
fn test_update_by_query_and_delete_by_ids() {
    let port = seeded();
    let actions = build(Vec::new(), port.clone());

    let mut renamed = Note::new(3, "gamma prime");
    renamed.locked = true;
    let updated = actions
        .update(
            Selector::Query(NoteQuery::default().title_contains("gam")),
            Patch::full(renamed),
            &actor(),
        )
        .unwrap();
    assert_eq!(updated, 1);
    assert_eq!(stored(&port)[2].title, "gamma prime");

    let deleted = actions.delete_by_ids(vec![1, 3], &actor()).unwrap();
    assert_eq!(deleted, 2);
    assert_eq!(stored(&port).len(), 1);
}

#[test]
fn test_lock_and_yn() {
    let port = seeded();
    let actions = build(Vec::new(), port.clone());

    actions
        .update_lock(Selector::Ids(vec![1, 2]), true, &actor())
        .unwrap();
    actions
        .update_yn(Selector::Id(3), Yn::No, &actor())
        .unwrap();

    let notes = stored(&port);
    assert!(notes[0].locked && notes[1].locked && !notes[2].locked);
    assert_eq!(notes[2].yn, Yn::No);
}

// ============================================================================
// Zero Subjects
// ============================================================================

#[test]
fn test_delete_by_query_with_no_subjects() {
    let port = seeded();
    let thrown = CountingTerminal::new();
    let returned = CountingTerminal::new();
    let actions = build(
        vec![
            Registration::after_throwing::<Note, NoteQuery, _>(
                OperationKind::DeleteByQuery,
                thrown.clone(),
            ),
            Registration::after_returning::<Note, NoteQuery, _>(
                OperationKind::DeleteByQuery,
                returned.clone(),
            ),
        ],
        port.clone(),
    );

    let err = actions
        .delete(NoteQuery::default().title_contains("zeta"), &actor())
        .unwrap_err();

    assert!(err.is_not_found());
    assert_eq!(thrown.count(), 1);
    assert_eq!(returned.count(), 1);
    assert_eq!(port.calls("delete"), 0);
}

#[test]
fn test_unknown_id_never_reaches_the_write() {
    let port = seeded();
    let actions = build(Vec::new(), port.clone());

    let err = actions
        .update_lock(Selector::Id(42), true, &actor())
        .unwrap_err();

    match err {
        ActionError::NotFound {
            record,
            operation,
            selector,
        } => {
            assert_eq!(record, "note");
            assert_eq!(operation, OperationKind::UpdateLock);
            assert_eq!(selector, "id=42");
        }
        other => panic!("expected NotFound, got {other:?}"),
    }
    assert_eq!(port.writes(), 0);
}

// ============================================================================
// Validation and Observers
// ============================================================================

#[test]
fn test_failing_validator_blocks_the_write() {
    let port = seeded();
    let pre = RecordingConsumer::named("pre");
    let actions = build(
        vec![
            Registration::validator::<Note, (), _>(
                OperationKind::DeleteById,
                FailingValidator::new("protected"),
            ),
            Registration::consumer::<Note, _>(OperationKind::DeleteById, Phase::Pre, pre.clone()),
        ],
        port.clone(),
    );

    let err = actions.delete_by_id(1, &actor()).unwrap_err();

    match err {
        ActionError::ValidationFailed { operation, source } => {
            assert_eq!(operation, OperationKind::DeleteById);
            assert_eq!(source.message, "protected");
        }
        other => panic!("expected ValidationFailed, got {other:?}"),
    }
    assert_eq!(pre.count(), 0);
    assert_eq!(port.writes(), 0);
    assert_eq!(stored(&port).len(), 3);
}

#[test]
fn test_observers_run_once_either_way() {
    let counter = CountingTerminal::new();
    let actions = build(
        vec![
            Registration::after_returning::<Note, NoteQuery, _>(
                OperationKind::DeleteById,
                counter.clone(),
            ),
            Registration::terminal::<Note, NoteQuery, _>(
                OperationKind::DeleteById,
                counter.clone(),
            ),
        ],
        seeded(),
    );

    actions.delete_by_id(1, &actor()).unwrap();
    assert_eq!(counter.count(), 2);

    counter.reset();
    actions.delete_by_id(1, &actor()).unwrap_err();
    assert_eq!(counter.count(), 2);
}

#[test]
fn test_secondary_failures_keep_the_primary_error() {
    let thrown = RecordingConsumer::named("thrown");
    let terminal = CountingTerminal::new();
    let actions = build(
        vec![
            Registration::after_throwing::<Note, NoteQuery, _>(
                OperationKind::UpdateYn,
                FailingObserver,
            )
            .priority(10),
            Registration::after_throwing::<Note, NoteQuery, _>(
                OperationKind::UpdateYn,
                thrown.clone(),
            ),
            Registration::terminal::<Note, NoteQuery, _>(OperationKind::UpdateYn, FailingObserver),
            Registration::terminal::<Note, NoteQuery, _>(
                OperationKind::UpdateYn,
                terminal.clone(),
            ),
        ],
        seeded(),
    );

    let err = actions
        .update_yn(Selector::Id(99), Yn::No, &actor())
        .unwrap_err();

    assert!(err.is_not_found());
    assert_eq!(thrown.count(), 1);
    assert_eq!(terminal.count(), 1);
}

struct RejectAfterWrite;

impl ValueConsumer<Note, bool> for RejectAfterWrite {
    fn accept(&self, _: OperationKind, _: &[Note], _: &bool, _: &Actor) -> Result<(), BoxError> {
        Err("audit sink unavailable".into())
    }
}

#[test]
fn test_post_failure_surfaces_after_the_write() {
    let port = seeded();
    let actions = build(
        vec![Registration::value_consumer::<Note, bool, _>(
            OperationKind::UpdateLock,
            Phase::Post,
            RejectAfterWrite,
        )],
        port.clone(),
    );

    let err = actions
        .update_lock(Selector::Id(1), true, &actor())
        .unwrap_err();

    assert!(matches!(
        err,
        ActionError::Extension {
            phase: Phase::Post,
            kind: ExtensionPointKind::ValueConsumer,
            ..
        }
    ));
    assert!(stored(&port)[0].locked);
}

// ============================================================================
// Selector Shapes
// ============================================================================

#[test]
fn test_unaccepted_selectors_are_bad_requests() {
    let port = seeded();
    let actions = build(Vec::new(), port.clone());

    let err = actions
        .update_status(
            Selector::Query(NoteQuery::default()),
            NoteStatus::Archived,
            &actor(),
        )
        .unwrap_err();
    assert!(err.is_bad_request());

    let err = actions.delete_by_ids(Vec::new(), &actor()).unwrap_err();
    assert!(err.is_bad_request());

    assert_eq!(port.calls("select_by_query"), 0);
    assert_eq!(port.calls("select_by_id"), 0);
    assert_eq!(port.writes(), 0);
}

// ============================================================================
// Audit Transitions
// ============================================================================

#[test]
fn test_audit_decisions_only_apply_to_pending_subjects() {
    let port = seeded();
    let actions = build(Vec::new(), port.clone());

    let updated = actions
        .update_audit_status(Selector::Id(1), AuditValue::reject("typo"), &actor())
        .unwrap();
    assert_eq!(updated, 1);
    let note = &stored(&port)[0];
    assert_eq!(note.audit, AuditStatus::Rejected);
    assert_eq!(note.remark.as_deref(), Some("typo"));

    let err = actions
        .update_audit_status(Selector::Ids(vec![1, 2]), AuditValue::approve(), &actor())
        .unwrap_err();
    assert!(err.is_validation());

    let pending = AuditValue {
        status: AuditStatus::Pending,
        remark: None,
    };
    let err = actions
        .update_audit_status(Selector::Id(2), pending, &actor())
        .unwrap_err();
    assert!(err.is_validation());
    assert_eq!(port.calls("update"), 1);
}

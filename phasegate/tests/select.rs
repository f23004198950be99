mod common;

use common::{actor, build, empty, seeded};
use phasegate::hooks::OrderQueryConsumer;
use phasegate::testing::{CountingTerminal, Note, NoteQuery, NoteStatus, RecordingConsumer};
use phasegate::{ActionError, Actor, BoxError, Consumer, OperationKind, Phase, Registration};

fn doubled(_: OperationKind, notes: Vec<Note>, _: &Actor) -> Result<Vec<Note>, BoxError> {
    Ok(notes.iter().chain(notes.iter()).cloned().collect())
}

#[test]
fn test_transform_output_is_returned() {
    let actions = build(
        vec![Registration::result_transform::<Note, Vec<Note>, _>(
            OperationKind::ListByQuery,
            doubled,
        )],
        seeded(),
    );

    let notes = actions
        .list(NoteQuery::default().title_contains("a"), &actor())
        .unwrap();

    let titles: Vec<_> = notes.iter().map(|n| n.title.as_str()).collect();
    assert_eq!(titles, ["alpha", "beta", "gamma", "alpha", "beta", "gamma"]);
}

#[test]
fn test_empty_list_skips_post_hooks() {
    let post = RecordingConsumer::named("post");
    let terminal = CountingTerminal::new();
    let actions = build(
        vec![
            Registration::consumer::<Note, _>(
                OperationKind::ListByQuery,
                Phase::Post,
                post.clone(),
            ),
            Registration::result_transform::<Note, Vec<Note>, _>(
                OperationKind::ListByQuery,
                doubled,
            ),
            Registration::terminal::<Note, NoteQuery, _>(
                OperationKind::ListByQuery,
                terminal.clone(),
            ),
        ],
        seeded(),
    );

    let notes = actions
        .list(NoteQuery::default().title_contains("zeta"), &actor())
        .unwrap();

    assert!(notes.is_empty());
    assert_eq!(post.count(), 0);
    assert_eq!(terminal.count(), 1);
}

#[test]
fn test_post_consumers_see_query() {
    let seen = RecordingConsumer::named("seen");
    let actions = build(
        vec![Registration::result_query_consumer::<Note, NoteQuery, _>(
            OperationKind::Export,
            seen.clone(),
        )],
        seeded(),
    );

    let query = NoteQuery::default().status(NoteStatus::Draft).with_limit(2);
    let notes = actions.export(query.clone(), &actor()).unwrap();

    assert_eq!(notes.len(), 2);
    let calls = seen.calls();
    assert_eq!(calls[0].ids, ["1", "2"]);
    assert_eq!(calls[0].value.as_deref(), Some(format!("{query:?}").as_str()));
}

#[test]
fn test_order_clauses_are_normalized_before_the_read() {
    let seen = RecordingConsumer::named("seen");
    let actions = build(
        vec![
            Registration::query_consumer::<Note, NoteQuery, _>(
                OperationKind::ListByQuery,
                OrderQueryConsumer,
            ),
            Registration::result_query_consumer::<Note, NoteQuery, _>(
                OperationKind::ListByQuery,
                seen.clone(),
            ),
        ],
        seeded(),
    );

    actions
        .list(NoteQuery::default().order_by("title desc"), &actor())
        .unwrap();
    let value = seen.calls()[0].value.clone().unwrap();
    assert!(value.contains("\"title DESC\""), "{value}");

    let err = actions
        .list(NoteQuery::default().order_by("colour asc"), &actor())
        .unwrap_err();
    assert_eq!(err.operation(), OperationKind::ListByQuery);
    assert!(matches!(
        err,
        ActionError::Extension {
            phase: Phase::Pre,
            ..
        }
    ));
}

#[test]
fn test_detail_not_found() {
    let port = empty();
    let thrown = RecordingConsumer::named("thrown");
    let actions = build(
        vec![Registration::after_throwing::<Note, NoteQuery, _>(
            OperationKind::DetailById,
            thrown.clone(),
        )],
        port,
    );

    let err = actions.detail_by_id(9, &actor()).unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(thrown.count(), 1);

    let err = actions
        .detail(NoteQuery::default().title_contains("x"), &actor())
        .unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn test_detail_and_count() {
    let port = seeded();
    let actions = build(Vec::new(), port.clone());

    assert_eq!(actions.detail_by_id(2, &actor()).unwrap().title, "beta");
    assert_eq!(
        actions
            .detail(NoteQuery::default().title_contains("mm"), &actor())
            .unwrap()
            .id,
        3
    );
    assert_eq!(
        actions
            .count(NoteQuery::default().title_contains("a"), &actor())
            .unwrap(),
        3
    );
    assert_eq!(port.calls("count"), 1);
    assert_eq!(port.writes(), 0);
}

struct RejectAll;

impl Consumer<Note> for RejectAll {
    fn accept(&self, _: OperationKind, _: &mut [Note], _: &Actor) -> Result<(), BoxError> {
        Err("read rejected".into())
    }
}

#[test]
fn test_failed_post_phase_reports_the_read_records() {
    let thrown = RecordingConsumer::named("thrown");
    let returned = RecordingConsumer::named("returned").with_log(thrown.shared_log());
    let actions = build(
        vec![
            Registration::consumer::<Note, _>(OperationKind::ListByQuery, Phase::Post, RejectAll),
            Registration::after_throwing::<Note, NoteQuery, _>(
                OperationKind::ListByQuery,
                thrown.clone(),
            ),
            Registration::after_returning::<Note, NoteQuery, _>(
                OperationKind::ListByQuery,
                returned,
            ),
        ],
        seeded(),
    );

    let err = actions.list(NoteQuery::default(), &actor()).unwrap_err();

    assert!(matches!(err, ActionError::Extension { phase: Phase::Post, .. }));
    let calls = thrown.calls();
    assert_eq!(calls.len(), 2);
    for call in calls {
        assert_eq!(call.ids, ["1", "2", "3"], "{}", call.name);
    }
}

#[test]
fn test_failed_transform_reports_the_read_records() {
    let thrown = RecordingConsumer::named("thrown");
    let fail = |_: OperationKind, _: Vec<Note>, _: &Actor| -> Result<Vec<Note>, BoxError> {
        Err("transform failed".into())
    };
    let actions = build(
        vec![
            Registration::result_transform::<Note, Vec<Note>, _>(OperationKind::Export, fail),
            Registration::after_throwing::<Note, NoteQuery, _>(
                OperationKind::Export,
                thrown.clone(),
            ),
        ],
        seeded(),
    );

    actions.export(NoteQuery::default(), &actor()).unwrap_err();

    assert_eq!(thrown.calls()[0].ids, ["1", "2", "3"]);
}

#[test]
fn test_detail_emptied_by_transform_is_not_found() {
    let hide = |_: OperationKind, _: Option<Note>, _: &Actor| -> Result<Option<Note>, BoxError> {
        Ok(None)
    };
    let terminal = RecordingConsumer::named("terminal");
    let actions = build(
        vec![
            Registration::result_transform::<Note, Option<Note>, _>(
                OperationKind::DetailById,
                hide,
            ),
            Registration::terminal::<Note, NoteQuery, _>(
                OperationKind::DetailById,
                terminal.clone(),
            ),
        ],
        seeded(),
    );

    let err = actions.detail_by_id(2, &actor()).unwrap_err();

    assert!(err.is_not_found());
    let calls = terminal.calls();
    assert_eq!(calls.len(), 1);
    let outcome = calls[0].value.clone().unwrap();
    assert!(outcome.starts_with("Failure"), "{outcome}");
    assert_eq!(calls[0].ids, ["2"]);
}

mod common;

use common::{actor, build, empty};
use phasegate::testing::{Note, RecordingConsumer};
use phasegate::{
    Actor, ExtensionPointKind, ExtensionRegistry, MatchKey, OperationKind, Phase, Registration,
};
use proptest::prelude::*;

fn divisor_filter(divisor: u64) -> Registration {
    Registration::filter::<Note, _>(
        OperationKind::Create,
        move |_: OperationKind, note: &Note, _: &Actor| note.id % divisor != 0,
    )
}

proptest! {
    #[test]
    fn prop_record_is_inserted_iff_every_filter_accepts(
        divisors in prop::collection::vec(2u64..7, 0..4),
        count in 0u64..40,
    ) {
        let port = empty();
        let actions = build(divisors.iter().copied().map(divisor_filter).collect(), port.clone());
        let notes: Vec<Note> = (1..=count).map(|id| Note::new(id, format!("n{id}"))).collect();

        let created = actions.create(notes, &actor()).unwrap();

        let expected: Vec<u64> = (1..=count)
            .filter(|id| divisors.iter().all(|d| id % d != 0))
            .collect();
        prop_assert_eq!(created, expected.len() as u64);
        let ids: Vec<u64> = port.inner().snapshot().unwrap().iter().map(|n| n.id).collect();
        prop_assert_eq!(ids, expected);
    }

    #[test]
    fn prop_composite_order_is_deterministic(priorities in prop::collection::vec(-3i32..3, 1..8)) {
        let make = || {
            ExtensionRegistry::builder()
                .register_all(priorities.iter().enumerate().map(|(i, &priority)| {
                    Registration::consumer::<Note, _>(
                        OperationKind::Update,
                        Phase::Post,
                        RecordingConsumer::named(i.to_string()),
                    )
                    .named(i.to_string())
                    .priority(priority)
                }))
                .build()
                .unwrap()
        };
        let key =
            MatchKey::of::<Note>(OperationKind::Update, Phase::Post, ExtensionPointKind::Consumer);

        let first: Vec<String> = make().names(&key).into_iter().map(String::from).collect();
        let second: Vec<String> = make().names(&key).into_iter().map(String::from).collect();
        prop_assert_eq!(&first, &second);

        let mut expected: Vec<(usize, i32)> = priorities.iter().copied().enumerate().collect();
        expected.sort_by_key(|&(_, priority)| std::cmp::Reverse(priority));
        let expected: Vec<String> = expected.into_iter().map(|(i, _)| i.to_string()).collect();
        prop_assert_eq!(first, expected);
    }
}

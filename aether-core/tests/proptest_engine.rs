//! Property-Based Tests for Aether Core
//!
//! Uses `proptest` to check the invariants the orchestrator relies on:
//! deterministic scheduling, fixed round-robin assignment, the bounded
//! history window, and a total, decaying mood machine.

use std::sync::Arc;

use proptest::prelude::*;

use aether_core::mood::{self, Mood};
use aether_core::registry::NpcRegistry;
use aether_core::scheduler::{partition_by_player, schedule};
use aether_core::state::ConversationStore;
use aether_core::types::{NpcPersonality, PlayerId, RawMessage};

// ---------------------------------------------------------------------------
// Strategy helpers
// ---------------------------------------------------------------------------

fn arb_mood() -> impl Strategy<Value = Mood> {
    prop::sample::select(Mood::ALL.to_vec())
}

fn roster(n: usize) -> Vec<NpcPersonality> {
    (0..n)
        .map(|i| NpcPersonality::new(format!("npc{i}"), format!("Npc {i}"), "Villager", ""))
        .collect()
}

fn timestamp(minute: u32) -> String {
    format!("2024-05-01T{:02}:{:02}:00", minute / 60, minute % 60)
}

/// (player, minute) pairs where every minute is distinct.
fn arb_distinct_batch() -> impl Strategy<Value = Vec<(u8, u32)>> {
    prop::collection::btree_set(0u32..1440, 1..40).prop_flat_map(|minutes| {
        let minutes: Vec<u32> = minutes.into_iter().collect();
        let len = minutes.len();
        (Just(minutes), prop::collection::vec(0u8..6, len))
            .prop_map(|(m, p)| p.into_iter().zip(m).collect::<Vec<_>>())
    })
}

// ---------------------------------------------------------------------------
// Property: distinct timestamps are re-sorted regardless of input order
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn distinct_timestamps_sort_identically_under_permutation(
        (batch, shuffled) in arb_distinct_batch()
            .prop_flat_map(|b| (Just(b.clone()), Just(b).prop_shuffle()))
    ) {
        let to_raw = |items: &[(u8, u32)]| -> Vec<RawMessage> {
            items
                .iter()
                .map(|(p, m)| RawMessage::new(u64::from(*p), format!("m{m}"), timestamp(*m)))
                .collect()
        };
        let a: Vec<String> = schedule(to_raw(&batch)).messages.into_iter().map(|m| m.text).collect();
        let b: Vec<String> = schedule(to_raw(&shuffled)).messages.into_iter().map(|m| m.text).collect();
        prop_assert_eq!(a, b);
    }
}

// ---------------------------------------------------------------------------
// Property: output is ordered by (timestamp, input position)
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn schedule_is_stable_on_ties(minutes in prop::collection::vec(0u32..5, 0..60)) {
        let raw: Vec<RawMessage> = minutes
            .iter()
            .enumerate()
            .map(|(i, m)| RawMessage::new(format!("p{}", i % 4), format!("#{i}"), timestamp(*m)))
            .collect();
        let scheduled = schedule(raw);
        prop_assert_eq!(scheduled.messages.len(), minutes.len());
        for pair in scheduled.messages.windows(2) {
            prop_assert!(
                (pair[0].timestamp, pair[0].sequence) < (pair[1].timestamp, pair[1].sequence)
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Property: partitions preserve intra-player order and lose nothing
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn partitions_cover_schedule(batch in arb_distinct_batch()) {
        let raw: Vec<RawMessage> = batch
            .iter()
            .map(|(p, m)| RawMessage::new(u64::from(*p), format!("m{m}"), timestamp(*m)))
            .collect();
        let scheduled = schedule(raw);
        let partitions = partition_by_player(&scheduled.messages);
        let total: usize = partitions.iter().map(|(_, msgs)| msgs.len()).sum();
        prop_assert_eq!(total, scheduled.messages.len());
        for (player, msgs) in &partitions {
            prop_assert!(msgs.iter().all(|m| &m.player_id == player));
            prop_assert!(msgs.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
        }
    }
}

// ---------------------------------------------------------------------------
// Property: round-robin assignment cycles through the roster
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn round_robin_cycles(npcs in 1usize..7, players in 1usize..40) {
        let registry = Arc::new(NpcRegistry::from_personalities(roster(npcs)).expect("valid roster"));
        let store = ConversationStore::new(Arc::clone(&registry));
        for i in 0..players {
            let state = store.get_or_create(&PlayerId::new(format!("p{i}")));
            prop_assert_eq!(state.assigned_npc_id.as_str(), format!("npc{}", i % npcs));
        }
        // Revisiting never reassigns.
        for i in 0..players {
            let state = store.get_or_create(&PlayerId::new(format!("p{i}")));
            prop_assert_eq!(state.assigned_npc_id.as_str(), format!("npc{}", i % npcs));
        }
    }
}

// ---------------------------------------------------------------------------
// Property: history never exceeds the window
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn history_window_is_bounded(appends in 0usize..50) {
        let registry = Arc::new(NpcRegistry::from_personalities(roster(3)).expect("valid roster"));
        let store = ConversationStore::new(registry);
        let player = PlayerId::from("p");
        store.get_or_create(&player);
        for i in 0..appends {
            store.append_exchange(&player, format!("q{i}"), format!("a{i}")).expect("known");
            let state = store.get(&player).expect("known");
            prop_assert!(state.history().len() <= 3);
            prop_assert_eq!(state.history().len(), (i + 1).min(3));
            prop_assert_eq!(&state.history().back().expect("non-empty").player, &format!("q{i}"));
        }
    }
}

// ---------------------------------------------------------------------------
// Property: mood transition is total and decays without triggers
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn transition_is_total(current in arb_mood(), text in any::<String>()) {
        let next = mood::transition(current, &text);
        prop_assert!(Mood::ALL.contains(&next));
    }

    #[test]
    fn untriggered_messages_converge_to_neutral(
        start in arb_mood(),
        first in "[xyz ]{0,24}",
        second in "[xyz ]{0,24}",
    ) {
        let after_one = mood::transition(start, &first);
        let after_two = mood::transition(after_one, &second);
        prop_assert_eq!(after_two, Mood::Neutral);
    }

    #[test]
    fn transition_is_deterministic(current in arb_mood(), text in ".{0,64}") {
        prop_assert_eq!(mood::transition(current, &text), mood::transition(current, &text));
    }
}

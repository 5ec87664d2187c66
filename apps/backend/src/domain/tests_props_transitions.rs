//! Property tests for the match lifecycle graph (pure domain, no DB).
//!
//! Random sequences of attempted transitions, with the graph invariants
//! asserted after every accepted step.

use proptest::prelude::*;

use crate::domain::transitions::{can_transition, derive_match_events, is_terminal, MatchLifecycleView};
use crate::entities::matches::MatchStatus;

const ALL_STATUSES: [MatchStatus; 7] = [
    MatchStatus::Sent,
    MatchStatus::Ready,
    MatchStatus::Lobby,
    MatchStatus::InProgress,
    MatchStatus::Completed,
    MatchStatus::Cancelled,
    MatchStatus::Expired,
];

fn arb_status() -> impl Strategy<Value = MatchStatus> {
    (0..ALL_STATUSES.len()).prop_map(|i| ALL_STATUSES[i])
}

/// Rank of a status along the forward path; terminal statuses have none.
fn forward_rank(status: MatchStatus) -> Option<u8> {
    match status {
        MatchStatus::Sent => Some(0),
        MatchStatus::Ready => Some(1),
        MatchStatus::Lobby => Some(2),
        MatchStatus::InProgress => Some(3),
        _ => None,
    }
}

proptest! {
    /// Walk a random attempted-transition sequence from Sent. Accepted steps
    /// must keep the forward path monotonic, never resurrect a terminal
    /// match, and only ever land on graph successors.
    #[test]
    fn prop_random_walk_respects_graph(targets in proptest::collection::vec(arb_status(), 1..40)) {
        let mut current = MatchStatus::Sent;
        for target in targets {
            let accepted = can_transition(current, target);

            if is_terminal(current) {
                prop_assert!(!accepted, "terminal {current:?} accepted -> {target:?}");
                continue;
            }

            if accepted {
                if let (Some(from_rank), Some(to_rank)) = (forward_rank(current), forward_rank(target)) {
                    prop_assert_eq!(
                        to_rank,
                        from_rank + 1,
                        "forward edges advance exactly one step"
                    );
                }
                if target == MatchStatus::Expired {
                    prop_assert!(
                        matches!(current, MatchStatus::Sent | MatchStatus::Ready | MatchStatus::Lobby),
                        "expiry only from Sent/Ready/Lobby, was {:?}", current
                    );
                }
                if target == MatchStatus::Completed {
                    prop_assert_eq!(current, MatchStatus::InProgress);
                }
                current = target;
            }
        }
    }

    /// Self-transitions are never edges: a re-delivered status can always be
    /// discarded without consulting the graph.
    #[test]
    fn prop_no_self_edges(status in arb_status()) {
        prop_assert!(!can_transition(status, status));
    }

    /// Deriving events from an unchanged view yields nothing, regardless of
    /// the view's contents (duplicate push deliveries are side-effect free).
    #[test]
    fn prop_duplicate_delivery_derives_no_events(
        status in arb_status(),
        current in proptest::option::of(1i64..100),
        turn in 0i16..500,
    ) {
        let view = MatchLifecycleView {
            status,
            current_player_id: current,
            turn_index_in_leg: turn,
        };
        prop_assert!(derive_match_events(&view, &view).is_empty());
    }
}

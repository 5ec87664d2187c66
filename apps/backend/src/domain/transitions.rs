//! Match lifecycle graph and edge-triggered event derivation.
//!
//! The status graph is the single source of truth for which transitions the
//! transition functions may perform; the event derivation is what the client
//! layer uses to turn "latest row" deltas into UI-facing actions.

use time::OffsetDateTime;

use crate::entities::matches::MatchStatus;

/// Non-terminal statuses, in rendezvous order.
pub const NON_TERMINAL: [MatchStatus; 4] = [
    MatchStatus::Sent,
    MatchStatus::Ready,
    MatchStatus::Lobby,
    MatchStatus::InProgress,
];

/// Once terminal, a match never changes status again.
pub fn is_terminal(status: MatchStatus) -> bool {
    matches!(
        status,
        MatchStatus::Completed | MatchStatus::Cancelled | MatchStatus::Expired
    )
}

/// Whether `from -> to` is an edge of the lifecycle graph.
///
/// Forward edges: Sent->Ready (accept), Ready->Lobby (first join),
/// Lobby->InProgress (second join), InProgress->Completed (win).
/// Terminal sinks: Cancelled from any non-terminal status; Expired from
/// Sent (challenge window) or Ready/Lobby (join window).
pub fn can_transition(from: MatchStatus, to: MatchStatus) -> bool {
    if is_terminal(from) {
        return false;
    }
    match (from, to) {
        (MatchStatus::Sent, MatchStatus::Ready) => true,
        (MatchStatus::Ready, MatchStatus::Lobby) => true,
        (MatchStatus::Lobby, MatchStatus::InProgress) => true,
        (MatchStatus::InProgress, MatchStatus::Completed) => true,
        (_, MatchStatus::Cancelled) => true,
        (MatchStatus::Sent, MatchStatus::Expired) => true,
        (MatchStatus::Ready, MatchStatus::Expired) => true,
        (MatchStatus::Lobby, MatchStatus::Expired) => true,
        _ => false,
    }
}

/// Whether a match in `status` has outlived its relevant deadline.
///
/// challenge_expires_at is meaningful only in Sent; join_window_expires_at
/// only in Ready/Lobby. Terminal and InProgress matches never expire.
pub fn is_past_expiry(
    status: MatchStatus,
    challenge_expires_at: OffsetDateTime,
    join_window_expires_at: Option<OffsetDateTime>,
    now: OffsetDateTime,
) -> bool {
    match status {
        MatchStatus::Sent => now >= challenge_expires_at,
        MatchStatus::Ready | MatchStatus::Lobby => {
            join_window_expires_at.is_some_and(|deadline| now >= deadline)
        }
        _ => false,
    }
}

/// Minimal view of a match row, sufficient for deriving lifecycle events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchLifecycleView {
    pub status: MatchStatus,
    pub current_player_id: Option<i64>,
    pub turn_index_in_leg: i16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchEvent {
    /// Edge-triggered: Sent -> Ready
    ChallengeAccepted,
    /// Edge-triggered: Ready -> Lobby
    OpponentJoined,
    /// Edge-triggered: reached InProgress; gameplay may begin
    MatchStarted { current_player_id: i64 },
    /// Edge-triggered: the turn moved to a specific player
    TurnBecame { player_id: i64 },
    /// Edge-triggered: reached Completed
    MatchCompleted,
    /// Edge-triggered: reached Cancelled
    MatchCancelled,
    /// Edge-triggered: reached Expired
    MatchExpired,
}

/// Derive lifecycle events from before/after views of the same match.
///
/// A consumer applying "whatever the latest row says" calls this once per
/// accepted update; identical before/after views produce no events, which is
/// what makes duplicate push deliveries harmless.
pub fn derive_match_events(
    before: &MatchLifecycleView,
    after: &MatchLifecycleView,
) -> Vec<MatchEvent> {
    let mut events = Vec::new();

    if before.status == MatchStatus::Sent && after.status == MatchStatus::Ready {
        events.push(MatchEvent::ChallengeAccepted);
    }

    if before.status == MatchStatus::Ready && after.status == MatchStatus::Lobby {
        events.push(MatchEvent::OpponentJoined);
    }

    if before.status != MatchStatus::InProgress && after.status == MatchStatus::InProgress {
        if let Some(current) = after.current_player_id {
            events.push(MatchEvent::MatchStarted {
                current_player_id: current,
            });
        }
    }

    // Turn change within gameplay (not the initial assignment)
    if before.status == MatchStatus::InProgress && after.status == MatchStatus::InProgress {
        if let Some(player_id) = after.current_player_id {
            if before.current_player_id != Some(player_id) {
                events.push(MatchEvent::TurnBecame { player_id });
            }
        }
    }

    if before.status != MatchStatus::Completed && after.status == MatchStatus::Completed {
        events.push(MatchEvent::MatchCompleted);
    }

    if before.status != MatchStatus::Cancelled && after.status == MatchStatus::Cancelled {
        events.push(MatchEvent::MatchCancelled);
    }

    if before.status != MatchStatus::Expired && after.status == MatchStatus::Expired {
        events.push(MatchEvent::MatchExpired);
    }

    events
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(status: MatchStatus, current: Option<i64>, turn: i16) -> MatchLifecycleView {
        MatchLifecycleView {
            status,
            current_player_id: current,
            turn_index_in_leg: turn,
        }
    }

    #[test]
    fn forward_edges_allowed() {
        assert!(can_transition(MatchStatus::Sent, MatchStatus::Ready));
        assert!(can_transition(MatchStatus::Ready, MatchStatus::Lobby));
        assert!(can_transition(MatchStatus::Lobby, MatchStatus::InProgress));
        assert!(can_transition(MatchStatus::InProgress, MatchStatus::Completed));
    }

    #[test]
    fn cancel_reachable_from_every_non_terminal_status() {
        for status in NON_TERMINAL {
            assert!(
                can_transition(status, MatchStatus::Cancelled),
                "cancel must be valid from {status:?}"
            );
        }
    }

    #[test]
    fn in_progress_cannot_expire() {
        assert!(!can_transition(MatchStatus::InProgress, MatchStatus::Expired));
    }

    #[test]
    fn terminal_statuses_are_sinks() {
        for from in [
            MatchStatus::Completed,
            MatchStatus::Cancelled,
            MatchStatus::Expired,
        ] {
            for to in [
                MatchStatus::Sent,
                MatchStatus::Ready,
                MatchStatus::Lobby,
                MatchStatus::InProgress,
                MatchStatus::Completed,
                MatchStatus::Cancelled,
                MatchStatus::Expired,
            ] {
                assert!(!can_transition(from, to), "{from:?} -> {to:?} must be rejected");
            }
        }
    }

    #[test]
    fn skipping_lobby_is_rejected() {
        assert!(!can_transition(MatchStatus::Ready, MatchStatus::InProgress));
        assert!(!can_transition(MatchStatus::Sent, MatchStatus::Lobby));
    }

    #[test]
    fn derive_match_started() {
        let before = view(MatchStatus::Lobby, None, 0);
        let after = view(MatchStatus::InProgress, Some(7), 0);
        let events = derive_match_events(&before, &after);
        assert!(events.contains(&MatchEvent::MatchStarted {
            current_player_id: 7
        }));
    }

    #[test]
    fn derive_turn_change() {
        let before = view(MatchStatus::InProgress, Some(7), 3);
        let after = view(MatchStatus::InProgress, Some(9), 4);
        let events = derive_match_events(&before, &after);
        assert_eq!(events, vec![MatchEvent::TurnBecame { player_id: 9 }]);
    }

    #[test]
    fn identical_views_derive_nothing() {
        let v = view(MatchStatus::InProgress, Some(7), 3);
        assert!(derive_match_events(&v, &v).is_empty());
    }

    #[test]
    fn derive_cancelled_from_lobby() {
        let before = view(MatchStatus::Lobby, None, 0);
        let after = view(MatchStatus::Cancelled, None, 0);
        let events = derive_match_events(&before, &after);
        assert_eq!(events, vec![MatchEvent::MatchCancelled]);
    }

    #[test]
    fn expiry_deadlines_by_status() {
        let now = OffsetDateTime::from_unix_timestamp(1_000_000).unwrap();
        let past = now - time::Duration::minutes(1);
        let future = now + time::Duration::minutes(1);

        assert!(is_past_expiry(MatchStatus::Sent, past, None, now));
        assert!(!is_past_expiry(MatchStatus::Sent, future, Some(past), now));
        assert!(is_past_expiry(MatchStatus::Ready, future, Some(past), now));
        assert!(is_past_expiry(MatchStatus::Lobby, future, Some(past), now));
        assert!(!is_past_expiry(MatchStatus::InProgress, past, Some(past), now));
        assert!(!is_past_expiry(MatchStatus::Completed, past, Some(past), now));
    }
}

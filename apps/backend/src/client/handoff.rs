//! Turn handoff and reveal sequencing on top of the change feed.
//!
//! A `MatchSession` is one device's view of one live match. It applies
//! inbound rows idempotently and monotonically, emits ordered UI actions
//! (reveal before score update before turn change), and never mutates local
//! state optimistically - the submitting device waits for the authoritative
//! echo exactly like the opponent does.

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::domain::transitions::{derive_match_events, MatchEvent};
use crate::domain::visit::VisitPayload;
use crate::entities::matches::MatchStatus;
use crate::error::AppError;
use crate::errors::ErrorCode;
use crate::repos::matches::Match;

use super::api::MatchApi;
use super::nav_guard::NavigationGuard;

/// Ordered instructions for the UI layer, emitted by `apply`.
#[derive(Debug, Clone, PartialEq)]
pub enum UiAction {
    /// Show the opponent's (or own) just-applied visit before anything else.
    Reveal(VisitPayload),
    /// Persist the new scores on screen.
    ScoreUpdate {
        challenger_score: i16,
        receiver_score: i16,
    },
    /// Re-derived turn indicator.
    TurnChanged { my_turn: bool },
    /// Gameplay may begin (Lobby -> InProgress observed).
    GameplayStarting,
    /// The match reached a terminal status; leave the gameplay screen.
    MatchOver(MatchStatus),
}

/// Why `submit_visit` did not apply the caller's darts.
#[derive(Debug, PartialEq)]
pub enum SubmitOutcome {
    /// Accepted; the echo arrives via the feed like any other row.
    Accepted,
    /// Rejected as out of turn - a benign timing race. The session resynced
    /// silently; nothing to surface to the user.
    Resynced,
}

pub struct MatchSession {
    user_id: i64,
    current: Match,
    /// Set while a lobby -> gameplay entry is scheduled; cancelled by any
    /// inbound terminal row.
    entry_token: Option<CancellationToken>,
}

impl MatchSession {
    pub fn new(user_id: i64, initial: Match) -> Self {
        Self {
            user_id,
            current: initial,
            entry_token: None,
        }
    }

    pub fn current(&self) -> &Match {
        &self.current
    }

    pub fn my_turn(&self) -> bool {
        self.current.current_player_id == Some(self.user_id)
    }

    /// Apply one inbound row. Idempotent and monotonic: a duplicate or older
    /// row (by updated_at, tie-broken by turn index) emits nothing and never
    /// regresses local state.
    pub fn apply(&mut self, incoming: Match) -> Vec<UiAction> {
        if incoming.id != self.current.id {
            debug!(
                expected = self.current.id,
                got = incoming.id,
                "ignoring row for a different match"
            );
            return Vec::new();
        }
        if incoming.updated_at < self.current.updated_at
            || incoming.turn_index_in_leg < self.current.turn_index_in_leg
        {
            return Vec::new();
        }

        self.transition_to(incoming)
    }

    /// Unconditional overwrite with a freshly-fetched authoritative row -
    /// the reconnect backstop. Monotonicity checks do not apply: the server
    /// row wins over whatever the client thinks it knows.
    pub async fn resync(&mut self, api: &dyn MatchApi) -> Result<Vec<UiAction>, AppError> {
        let fresh = api.fetch_match(self.current.id).await?;
        Ok(self.transition_to(fresh))
    }

    fn transition_to(&mut self, incoming: Match) -> Vec<UiAction> {
        let mut actions = Vec::new();

        // Reveal strictly ordered before score update before turn change.
        if let Some(visit) = incoming.last_visit.as_ref() {
            let known = self.current.last_visit.as_ref().map(|v| v.thrown_at_ms);
            if known.map_or(true, |t| visit.thrown_at_ms > t) {
                actions.push(UiAction::Reveal(visit.clone()));
            }
        }

        if incoming.challenger_score != self.current.challenger_score
            || incoming.receiver_score != self.current.receiver_score
        {
            actions.push(UiAction::ScoreUpdate {
                challenger_score: incoming.challenger_score,
                receiver_score: incoming.receiver_score,
            });
        }

        // Lifecycle edges come from the shared event derivation, so a
        // duplicate delivery (identical views) emits nothing here either.
        let events = derive_match_events(
            &self.current.lifecycle_view(),
            &incoming.lifecycle_view(),
        );
        for event in events {
            match event {
                MatchEvent::MatchStarted { current_player_id } => {
                    actions.push(UiAction::GameplayStarting);
                    actions.push(UiAction::TurnChanged {
                        my_turn: current_player_id == self.user_id,
                    });
                }
                MatchEvent::TurnBecame { player_id } => {
                    actions.push(UiAction::TurnChanged {
                        my_turn: player_id == self.user_id,
                    });
                }
                MatchEvent::MatchCompleted
                | MatchEvent::MatchCancelled
                | MatchEvent::MatchExpired => {
                    actions.push(UiAction::MatchOver(incoming.status));
                    // An in-flight scheduled gameplay entry must never fire now.
                    if let Some(token) = self.entry_token.take() {
                        token.cancel();
                    }
                }
                MatchEvent::ChallengeAccepted | MatchEvent::OpponentJoined => {}
            }
        }

        self.current = incoming;
        actions
    }

    /// Submit this device's visit. No local mutation happens here; the state
    /// change arrives through `apply` when the echo comes back. An
    /// `OUT_OF_TURN` rejection is corrected silently by re-fetching.
    pub async fn submit_visit(
        &mut self,
        api: &dyn MatchApi,
        darts: &[u8],
    ) -> Result<SubmitOutcome, AppError> {
        match api.save_visit(self.current.id, darts).await {
            Ok(_) => Ok(SubmitOutcome::Accepted),
            Err(err) if err.code() == ErrorCode::OutOfTurn => {
                self.resync(api).await?;
                Ok(SubmitOutcome::Resynced)
            }
            Err(err) => Err(err),
        }
    }

    /// Arm a cancellable lobby -> gameplay entry and return its handle. The
    /// caller spawns `ScheduledEntry::fire_after`; any terminal row applied
    /// in the meantime cancels it.
    pub fn schedule_gameplay_entry(&mut self) -> ScheduledEntry {
        let token = CancellationToken::new();
        self.entry_token = Some(token.clone());
        ScheduledEntry {
            match_id: self.current.id,
            token,
        }
    }
}

/// How a scheduled gameplay entry resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryOutcome {
    /// Navigation fired; this call owns the gameplay screen transition.
    Entered,
    /// Cancelled, superseded, or already navigated; land back on the list.
    Aborted,
}

/// A deferred screen transition keyed to one match.
pub struct ScheduledEntry {
    match_id: i64,
    token: CancellationToken,
}

impl ScheduledEntry {
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Wait out `delay`, then attempt the transition. Cancellation is
    /// honored at the moment the side effect is about to run, not only when
    /// it was scheduled; the navigation guard is consulted last so a
    /// cancelled entry never consumes it.
    pub async fn fire_after(
        &self,
        delay: std::time::Duration,
        guard: &NavigationGuard,
    ) -> EntryOutcome {
        tokio::select! {
            _ = self.token.cancelled() => return EntryOutcome::Aborted,
            _ = tokio::time::sleep(delay) => {}
        }

        if self.token.is_cancelled() {
            return EntryOutcome::Aborted;
        }
        if guard.try_begin_navigation(self.match_id) {
            EntryOutcome::Entered
        } else {
            EntryOutcome::Aborted
        }
    }
}

//! DTOs for the matches_sea adapter.

use time::OffsetDateTime;

use crate::entities::matches::{GameType, MatchStatus};

/// DTO for inserting a new challenge row.
#[derive(Debug, Clone)]
pub struct ChallengeCreate {
    pub challenger_id: i64,
    pub receiver_id: i64,
    pub game_type: GameType,
    pub match_format: String,
    pub challenge_expires_at: OffsetDateTime,
}

/// Guarded status transition: applied only to the row whose current status
/// equals `expected_status`. A missed guard affects zero rows; the caller
/// reloads and maps the reason.
#[derive(Debug, Clone)]
pub struct StatusTransition {
    pub id: i64,
    pub expected_status: MatchStatus,
    pub new_status: MatchStatus,
    pub join_window_expires_at: Option<OffsetDateTime>,
    /// Three-state: None = no change, Some(Some(id)) = set, Some(None) = clear.
    pub current_player_id: Option<Option<i64>>,
    pub started_at: Option<OffsetDateTime>,
    pub ended_at: Option<OffsetDateTime>,
}

impl StatusTransition {
    pub fn new(id: i64, expected_status: MatchStatus, new_status: MatchStatus) -> Self {
        Self {
            id,
            expected_status,
            new_status,
            join_window_expires_at: None,
            current_player_id: None,
            started_at: None,
            ended_at: None,
        }
    }

    pub fn with_join_window(mut self, deadline: OffsetDateTime) -> Self {
        self.join_window_expires_at = Some(deadline);
        self
    }

    pub fn with_current_player(mut self, player_id: i64) -> Self {
        self.current_player_id = Some(Some(player_id));
        self
    }

    pub fn clear_current_player(mut self) -> Self {
        self.current_player_id = Some(None);
        self
    }

    pub fn with_started_at(mut self, at: OffsetDateTime) -> Self {
        self.started_at = Some(at);
        self
    }

    pub fn with_ended_at(mut self, at: OffsetDateTime) -> Self {
        self.ended_at = Some(at);
        self
    }
}

/// The saveVisit write: one conditional UPDATE whose WHERE clause pins both
/// the InProgress status and the submitting player being current. This filter
/// is the sole anti-race boundary for turn integrity.
#[derive(Debug, Clone)]
pub struct VisitWrite {
    pub id: i64,
    /// Must still be the current player for the update to match.
    pub acting_player_id: i64,
    pub challenger_score: i16,
    pub receiver_score: i16,
    /// None ends the match (current_player_id goes null on Completed).
    pub next_player_id: Option<i64>,
    pub turn_index_in_leg: i16,
    pub last_visit: serde_json::Value,
    pub new_status: MatchStatus,
    pub ended_at: Option<OffsetDateTime>,
}

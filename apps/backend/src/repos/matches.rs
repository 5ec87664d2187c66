//! Match repository functions for the domain layer.

use sea_orm::ConnectionTrait;
use serde::{Deserialize, Serialize};

use crate::adapters::matches_sea as matches_adapter;
pub use crate::adapters::matches_sea::dto::{ChallengeCreate, StatusTransition, VisitWrite};
use crate::domain::transitions::MatchLifecycleView;
use crate::domain::visit::VisitPayload;
use crate::entities::matches;
use crate::entities::matches::{GameType, MatchStatus};
use crate::errors::domain::{DomainError, NotFoundKind};

/// Match domain model.
///
/// Converted from the database model (matches::Model) when loaded through
/// repos functions. Serializes for the change feed and the read endpoints,
/// so clients see the same shape the server reasons about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub id: i64,
    pub challenger_id: i64,
    pub receiver_id: i64,
    pub status: MatchStatus,
    pub game_type: GameType,
    pub match_format: String,
    #[serde(with = "time::serde::rfc3339")]
    pub challenge_expires_at: time::OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub join_window_expires_at: Option<time::OffsetDateTime>,
    pub current_player_id: Option<i64>,
    pub challenger_score: i16,
    pub receiver_score: i16,
    pub turn_index_in_leg: i16,
    pub last_visit: Option<VisitPayload>,
    pub cancelled_by: Option<i64>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: time::OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: time::OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub started_at: Option<time::OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub ended_at: Option<time::OffsetDateTime>,
}

impl Match {
    /// Returns true when `user_id` is one of the two participants.
    pub fn is_participant(&self, user_id: i64) -> bool {
        self.challenger_id == user_id || self.receiver_id == user_id
    }

    /// The other participant's id, or None when `user_id` is not in the match.
    pub fn opponent_of(&self, user_id: i64) -> Option<i64> {
        if user_id == self.challenger_id {
            Some(self.receiver_id)
        } else if user_id == self.receiver_id {
            Some(self.challenger_id)
        } else {
            None
        }
    }

    /// Remaining score for one participant.
    pub fn score_of(&self, user_id: i64) -> Option<i16> {
        if user_id == self.challenger_id {
            Some(self.challenger_score)
        } else if user_id == self.receiver_id {
            Some(self.receiver_score)
        } else {
            None
        }
    }

    /// Projection used by event derivation and the turn handoff machinery.
    pub fn lifecycle_view(&self) -> MatchLifecycleView {
        MatchLifecycleView {
            status: self.status,
            current_player_id: self.current_player_id,
            turn_index_in_leg: self.turn_index_in_leg,
        }
    }
}

impl From<matches::Model> for Match {
    fn from(m: matches::Model) -> Self {
        // A malformed last_visit blob is treated as absent rather than
        // failing every read of the row.
        let last_visit = m
            .last_visit
            .and_then(|v| serde_json::from_value::<VisitPayload>(v).ok());
        Self {
            id: m.id,
            challenger_id: m.challenger_id,
            receiver_id: m.receiver_id,
            status: m.status,
            game_type: m.game_type,
            match_format: m.match_format,
            challenge_expires_at: m.challenge_expires_at,
            join_window_expires_at: m.join_window_expires_at,
            current_player_id: m.current_player_id,
            challenger_score: m.challenger_score,
            receiver_score: m.receiver_score,
            turn_index_in_leg: m.turn_index_in_leg,
            last_visit,
            cancelled_by: m.cancelled_by,
            created_at: m.created_at,
            updated_at: m.updated_at,
            started_at: m.started_at,
            ended_at: m.ended_at,
        }
    }
}

pub async fn find_by_id<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    match_id: i64,
) -> Result<Option<Match>, DomainError> {
    let m = matches_adapter::find_by_id(conn, match_id).await?;
    Ok(m.map(Match::from))
}

/// Find match by ID or return a NotFound domain error.
pub async fn require_match<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    match_id: i64,
) -> Result<Match, DomainError> {
    let m = matches_adapter::find_by_id(conn, match_id).await?;
    m.map(Match::from).ok_or_else(|| {
        DomainError::not_found(NotFoundKind::Match, format!("Match {match_id} not found"))
    })
}

/// Matches visible to a user: everything non-terminal plus terminal matches
/// updated since `terminal_since`.
pub async fn list_for_user<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    user_id: i64,
    terminal_since: time::OffsetDateTime,
) -> Result<Vec<Match>, DomainError> {
    let rows = matches_adapter::list_for_user(conn, user_id, terminal_since).await?;
    Ok(rows.into_iter().map(Match::from).collect())
}

pub async fn insert_challenge<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    dto: ChallengeCreate,
) -> Result<Match, DomainError> {
    let m = matches_adapter::insert_challenge(conn, dto).await?;
    Ok(Match::from(m))
}

/// Guarded status transition; returns rows affected (0 means the guard or
/// the expected-status precondition did not hold).
pub async fn transition_status<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    dto: StatusTransition,
) -> Result<u64, DomainError> {
    Ok(matches_adapter::transition_status(conn, dto).await?)
}

/// Guarded visit write; 0 rows means the match changed under us (out of
/// turn, already terminal, or a concurrent visit won the race).
pub async fn apply_visit<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    dto: VisitWrite,
) -> Result<u64, DomainError> {
    Ok(matches_adapter::apply_visit(conn, dto).await?)
}

/// Cancel from any non-terminal status; 0 rows on an already-terminal match
/// is still success for the caller (idempotent cancel).
pub async fn cancel_non_terminal<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    match_id: i64,
    cancelled_by: i64,
) -> Result<u64, DomainError> {
    Ok(matches_adapter::cancel_non_terminal(conn, match_id, cancelled_by).await?)
}

pub async fn find_expiry_candidates<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    now: time::OffsetDateTime,
) -> Result<Vec<Match>, DomainError> {
    let rows = matches_adapter::find_expiry_candidates(conn, now).await?;
    Ok(rows.into_iter().map(Match::from).collect())
}

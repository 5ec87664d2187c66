//! Visit submission - the gameplay write path.

use sea_orm::DatabaseTransaction;
use time::OffsetDateTime;
use tracing::info;

use crate::domain::scoring::ScoreEngine;
use crate::domain::visit::{validate_darts, DartError, VisitPayload, MAX_DARTS_PER_VISIT};
use crate::entities::matches::MatchStatus;
use crate::error::AppError;
use crate::errors::domain::{ConflictKind, DomainError};
use crate::errors::ErrorCode;
use crate::repos::matches::VisitWrite;
use crate::repos::{locks, matches};

/// Apply one visit for the current player.
///
/// The turn/status preconditions are checked twice: once on the loaded row
/// for a precise error message, and again inside the UPDATE's WHERE clause
/// (`status = InProgress AND current_player_id = caller`), which is the only
/// check that actually holds under concurrency. A duplicate or late
/// submission after the turn flipped matches zero rows and mutates nothing.
pub async fn save_visit(
    txn: &DatabaseTransaction,
    engine: &dyn ScoreEngine,
    match_id: i64,
    user_id: i64,
    darts: &[u8],
) -> Result<matches::Match, AppError> {
    validate_darts(darts).map_err(|e| match e {
        DartError::BadCount(n) => AppError::validation(
            ErrorCode::InvalidDartCount,
            format!("A visit must contain 1 to {MAX_DARTS_PER_VISIT} darts, got {n}"),
        ),
        DartError::Unachievable(v) => AppError::validation(
            ErrorCode::InvalidDartValue,
            format!("{v} is not an achievable single-dart score"),
        ),
    })?;

    let m = matches::require_match(txn, match_id).await?;

    if !m.is_participant(user_id) {
        return Err(DomainError::unauthorized("Not a participant of this match").into());
    }
    if m.status != MatchStatus::InProgress {
        return Err(DomainError::invalid_state(format!(
            "Cannot score a visit in {:?}",
            m.status
        ))
        .into());
    }
    if m.current_player_id != Some(user_id) {
        return Err(
            DomainError::conflict(ConflictKind::OutOfTurn, "It is not your turn").into(),
        );
    }

    // is_participant above guarantees both lookups succeed.
    let score_before = m
        .score_of(user_id)
        .ok_or_else(|| DomainError::invalid_state("Participant has no score"))?;
    let opponent_id = m
        .opponent_of(user_id)
        .ok_or_else(|| DomainError::invalid_state("Participant has no opponent"))?;

    let outcome = engine.score_visit(m.game_type, score_before, darts);

    let now = OffsetDateTime::now_utc();
    let payload = VisitPayload {
        player_id: user_id,
        darts: darts.to_vec(),
        score_before,
        score_after: outcome.score_after,
        thrown_at_ms: (now.unix_timestamp_nanos() / 1_000_000) as i64,
    };
    let payload_json = serde_json::to_value(&payload)
        .map_err(|err| AppError::internal(format!("Failed to serialize visit: {err}")))?;

    let (challenger_score, receiver_score) = if user_id == m.challenger_id {
        (outcome.score_after, m.receiver_score)
    } else {
        (m.challenger_score, outcome.score_after)
    };

    let write = if outcome.win {
        VisitWrite {
            id: match_id,
            acting_player_id: user_id,
            challenger_score,
            receiver_score,
            next_player_id: None,
            turn_index_in_leg: m.turn_index_in_leg + 1,
            last_visit: payload_json,
            new_status: MatchStatus::Completed,
            ended_at: Some(now),
        }
    } else {
        VisitWrite {
            id: match_id,
            acting_player_id: user_id,
            challenger_score,
            receiver_score,
            next_player_id: Some(opponent_id),
            turn_index_in_leg: m.turn_index_in_leg + 1,
            last_visit: payload_json,
            new_status: MatchStatus::InProgress,
            ended_at: None,
        }
    };

    let rows = matches::apply_visit(txn, write).await?;
    if rows == 0 {
        // The row changed between the load and the guarded write: the turn
        // flipped, or the match ended. The client resyncs silently.
        return Err(DomainError::conflict(
            ConflictKind::OutOfTurn,
            "Turn already advanced",
        )
        .into());
    }

    if outcome.win {
        locks::delete_by_match(txn, match_id).await?;
    }

    let updated = matches::require_match(txn, match_id).await?;
    info!(
        match_id,
        user_id,
        bust = outcome.bust,
        win = outcome.win,
        turn_index = updated.turn_index_in_leg,
        "visit saved"
    );
    Ok(updated)
}

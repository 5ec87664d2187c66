//! Challenge creation and acceptance.

use sea_orm::DatabaseTransaction;
use time::{Duration, OffsetDateTime};
use tracing::info;

use crate::entities::match_locks::LockStatus;
use crate::entities::matches::{GameType, MatchStatus};
use crate::error::AppError;
use crate::errors::domain::{ConflictKind, DomainError, ExpiredKind};
use crate::errors::ErrorCode;
use crate::repos::matches::{ChallengeCreate, StatusTransition};
use crate::repos::{locks, matches, users};
use crate::services::match_flow::expiry::release_stale_locks;

/// Sent challenges live this long before the sweep expires them.
pub const CHALLENGE_TTL: Duration = Duration::hours(24);

/// Accepted matches give both participants this long to join.
pub const JOIN_WINDOW: Duration = Duration::minutes(5);

/// Create a new challenge in Sent.
///
/// Runs the defensive lock cleanup for the challenger first, then refuses if
/// a live lock survives it. The receiver must exist; the caller may not
/// challenge themselves.
pub async fn create_challenge(
    txn: &DatabaseTransaction,
    challenger_id: i64,
    receiver_id: i64,
    game_type: GameType,
    match_format: &str,
) -> Result<matches::Match, AppError> {
    if challenger_id == receiver_id {
        return Err(AppError::validation(
            ErrorCode::SelfChallenge,
            "Cannot challenge yourself",
        ));
    }

    release_stale_locks(txn, challenger_id).await?;

    if let Some(lock) = locks::find_by_user(txn, challenger_id).await? {
        return Err(DomainError::conflict(
            ConflictKind::LockHeld,
            format!("Already in a live match (match {})", lock.match_id),
        )
        .into());
    }

    // NotFound surfaces to the caller; a challenge to an absent user is a
    // client bug, not a silent no-op.
    users::require_user(txn, receiver_id).await?;

    let now = OffsetDateTime::now_utc();
    let created = matches::insert_challenge(
        txn,
        ChallengeCreate {
            challenger_id,
            receiver_id,
            game_type,
            match_format: match_format.to_owned(),
            challenge_expires_at: now + CHALLENGE_TTL,
        },
    )
    .await?;

    info!(
        match_id = created.id,
        challenger_id, receiver_id, "challenge created"
    );
    Ok(created)
}

/// Accept a Sent challenge: Sent -> Ready plus one lock per participant.
///
/// The status write and the two lock inserts share the enclosing transaction,
/// so a failed lock insert rolls the status change back and the row never
/// claims a side effect that did not happen.
pub async fn accept_challenge(
    txn: &DatabaseTransaction,
    match_id: i64,
    user_id: i64,
) -> Result<matches::Match, AppError> {
    release_stale_locks(txn, user_id).await?;

    let m = matches::require_match(txn, match_id).await?;

    if !m.is_participant(user_id) {
        return Err(DomainError::unauthorized("Not a participant of this match").into());
    }
    if user_id != m.receiver_id {
        return Err(AppError::forbidden(
            ErrorCode::WrongParticipant,
            "Only the challenged player can accept",
        ));
    }
    if m.status != MatchStatus::Sent {
        return Err(DomainError::invalid_state(format!(
            "Cannot accept a match in {:?}",
            m.status
        ))
        .into());
    }

    let now = OffsetDateTime::now_utc();
    if now >= m.challenge_expires_at {
        return Err(
            DomainError::expired(ExpiredKind::Challenge, "Challenge has expired").into(),
        );
    }

    if let Some(lock) = locks::find_by_user(txn, user_id).await? {
        return Err(DomainError::conflict(
            ConflictKind::LockHeld,
            format!("Already in a live match (match {})", lock.match_id),
        )
        .into());
    }

    // The challenger may have entered another match since sending. Self-heal
    // their stale locks too, then treat a surviving one as a conflict rather
    // than letting the unique index abort the insert below.
    release_stale_locks(txn, m.challenger_id).await?;
    if locks::find_by_user(txn, m.challenger_id).await?.is_some() {
        return Err(DomainError::conflict(
            ConflictKind::OpponentLockHeld,
            "Challenger is already in a live match",
        )
        .into());
    }

    let rows = matches::transition_status(
        txn,
        StatusTransition::new(match_id, MatchStatus::Sent, MatchStatus::Ready)
            .with_join_window(now + JOIN_WINDOW),
    )
    .await?;
    if rows == 0 {
        // Lost a race with a cancel or the sweep.
        return Err(DomainError::invalid_state("Match is no longer acceptable").into());
    }

    locks::insert_lock(txn, m.challenger_id, match_id, LockStatus::Accepted).await?;
    locks::insert_lock(txn, m.receiver_id, match_id, LockStatus::Accepted).await?;

    let updated = matches::require_match(txn, match_id).await?;
    info!(match_id, user_id, "challenge accepted");
    Ok(updated)
}

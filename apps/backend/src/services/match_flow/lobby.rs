//! Join rendezvous and cancellation.

use sea_orm::{ConnectionTrait, DatabaseTransaction};
use time::OffsetDateTime;
use tracing::{info, warn};

use crate::entities::match_locks::LockStatus;
use crate::entities::matches::MatchStatus;
use crate::error::AppError;
use crate::errors::domain::{ConflictKind, DomainError, ExpiredKind};
use crate::repos::matches::StatusTransition;
use crate::repos::{locks, matches};

/// Join a Ready or Lobby match.
///
/// The new status is derived from the match row's own status field alone:
/// Ready -> Lobby on the first join, Lobby -> InProgress on the second. The
/// caller's lock row records that they joined, but it never drives the
/// match's own progression.
pub async fn join_match(
    txn: &DatabaseTransaction,
    match_id: i64,
    user_id: i64,
) -> Result<matches::Match, AppError> {
    // Guarded write in a short retry loop: two devices joining at the same
    // moment both read Ready, one write lands, the other re-derives from the
    // fresh row and becomes the second join.
    for _ in 0..2 {
        let m = matches::require_match(txn, match_id).await?;

        if !m.is_participant(user_id) {
            return Err(DomainError::unauthorized("Not a participant of this match").into());
        }
        if !matches!(m.status, MatchStatus::Ready | MatchStatus::Lobby) {
            return Err(DomainError::invalid_state(format!(
                "Cannot join a match in {:?}",
                m.status
            ))
            .into());
        }

        let now = OffsetDateTime::now_utc();
        if m.join_window_expires_at.is_some_and(|deadline| now >= deadline) {
            return Err(
                DomainError::expired(ExpiredKind::JoinWindow, "Join window has elapsed").into(),
            );
        }

        let lock = locks::find_by_user_and_match(txn, user_id, match_id).await?;
        if lock.as_ref().is_some_and(|l| l.has_joined()) {
            return Err(DomainError::invalid_state("Already joined this match").into());
        }

        let transition = match m.status {
            MatchStatus::Ready => {
                StatusTransition::new(match_id, MatchStatus::Ready, MatchStatus::Lobby)
            }
            MatchStatus::Lobby => {
                // Second join starts gameplay; the challenger always throws first.
                StatusTransition::new(match_id, MatchStatus::Lobby, MatchStatus::InProgress)
                    .with_current_player(m.challenger_id)
                    .with_started_at(now)
            }
            _ => unreachable!("status checked above"),
        };
        let entering_gameplay = m.status == MatchStatus::Lobby;

        let rows = matches::transition_status(txn, transition).await?;
        if rows == 0 {
            // Guard missed: some other write landed between the read above
            // and this write. Re-derive from the fresh row.
            continue;
        }

        locks::set_lock_status(txn, user_id, match_id, LockStatus::Joined).await?;
        if entering_gameplay {
            locks::set_lock_status_for_match(txn, match_id, LockStatus::InProgress).await?;
        }

        let updated = matches::require_match(txn, match_id).await?;
        info!(match_id, user_id, status = ?updated.status, "participant joined");
        return Ok(updated);
    }

    Err(DomainError::conflict(
        ConflictKind::Other("join".into()),
        "Match changed while joining; try again",
    )
    .into())
}

/// Cancel from any non-terminal status.
///
/// Idempotent: the underlying UPDATE only matches non-terminal rows, and zero
/// rows affected on an already-terminal match is success. Lock deletion is
/// best-effort; the defensive cleanup in the lock-consuming operations picks
/// up anything missed here.
pub async fn cancel_match(
    txn: &DatabaseTransaction,
    match_id: i64,
    user_id: i64,
) -> Result<matches::Match, AppError> {
    let m = matches::require_match(txn, match_id).await?;

    if !m.is_participant(user_id) {
        return Err(DomainError::unauthorized("Not a participant of this match").into());
    }

    let rows = matches::cancel_non_terminal(txn, match_id, user_id).await?;
    if rows > 0 {
        info!(match_id, user_id, "match cancelled");
    }

    if let Err(err) = locks::delete_by_match(txn, match_id).await {
        warn!(match_id, %err, "lock cleanup after cancel failed");
    }

    matches::require_match(txn, match_id).await.map_err(Into::into)
}

/// Authoritative "have I joined" answer for the client's Lobby check.
///
/// Reads the caller's lock row, never infers from anything the client has
/// cached.
pub async fn has_joined<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    match_id: i64,
    user_id: i64,
) -> Result<bool, AppError> {
    let m = matches::require_match(conn, match_id).await?;
    if !m.is_participant(user_id) {
        return Err(DomainError::unauthorized("Not a participant of this match").into());
    }
    let lock = locks::find_by_user_and_match(conn, user_id, match_id).await?;
    Ok(lock.is_some_and(|l| l.has_joined()))
}

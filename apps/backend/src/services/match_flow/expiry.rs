//! Deadline sweep and defensive lock cleanup.

use sea_orm::{ConnectionTrait, DatabaseTransaction};
use time::OffsetDateTime;
use tracing::{info, warn};

use crate::domain::transitions::{is_past_expiry, is_terminal};
use crate::entities::matches::MatchStatus;
use crate::error::AppError;
use crate::repos::matches::StatusTransition;
use crate::repos::{locks, matches};

/// Move every match past its deadline to Expired and clear its locks.
///
/// Sent matches expire via challenge_expires_at, Ready/Lobby matches via
/// join_window_expires_at. Each transition is status-guarded, so a row that
/// moved (accepted, cancelled) between the candidate query and the write is
/// skipped. Returns the expired rows for post-commit feed publication.
pub async fn expire_matches(
    txn: &DatabaseTransaction,
    now: OffsetDateTime,
) -> Result<Vec<matches::Match>, AppError> {
    let candidates = matches::find_expiry_candidates(txn, now).await?;
    let mut expired = Vec::new();

    for candidate in candidates {
        let rows = matches::transition_status(
            txn,
            StatusTransition::new(candidate.id, candidate.status, MatchStatus::Expired)
                .clear_current_player()
                .with_ended_at(now),
        )
        .await?;
        if rows == 0 {
            continue;
        }

        if let Err(err) = locks::delete_by_match(txn, candidate.id).await {
            warn!(match_id = candidate.id, %err, "lock cleanup after expiry failed");
        }

        expired.push(matches::require_match(txn, candidate.id).await?);
    }

    if !expired.is_empty() {
        info!(count = expired.len(), "matches expired by sweep");
    }
    Ok(expired)
}

/// Defensive self-healing cleanup, run at the top of every lock-requiring
/// operation: drop the user's lock when its match is already terminal, past
/// its own deadline, or gone. Lock deletion elsewhere is best-effort and can
/// be missed.
pub async fn release_stale_locks<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    user_id: i64,
) -> Result<(), AppError> {
    let Some(lock) = locks::find_by_user(conn, user_id).await? else {
        return Ok(());
    };

    let stale = match matches::find_by_id(conn, lock.match_id).await? {
        None => true,
        Some(m) => {
            is_terminal(m.status)
                || is_past_expiry(
                    m.status,
                    m.challenge_expires_at,
                    m.join_window_expires_at,
                    OffsetDateTime::now_utc(),
                )
        }
    };

    if stale {
        locks::delete_by_id(conn, lock.id).await?;
        info!(user_id, match_id = lock.match_id, "released stale lock");
    }
    Ok(())
}

//! Match lock repository functions for the domain layer.
//!
//! A live lock row is what makes a user "busy": at most one row per user
//! (enforced by a unique index), created when a challenge is accepted and
//! deleted on any terminal transition.

use sea_orm::ConnectionTrait;

use crate::adapters::match_locks_sea as locks_adapter;
use crate::entities::match_locks;
use crate::entities::match_locks::LockStatus;
use crate::errors::domain::DomainError;

/// Match lock domain model.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchLock {
    pub id: i64,
    pub user_id: i64,
    pub match_id: i64,
    pub status: LockStatus,
    pub created_at: time::OffsetDateTime,
    pub updated_at: time::OffsetDateTime,
}

impl MatchLock {
    /// Whether this lock proves its holder has entered the match
    /// (joined the lobby or is mid-game), as opposed to merely accepted.
    pub fn has_joined(&self) -> bool {
        matches!(self.status, LockStatus::Joined | LockStatus::InProgress)
    }
}

impl From<match_locks::Model> for MatchLock {
    fn from(m: match_locks::Model) -> Self {
        Self {
            id: m.id,
            user_id: m.user_id,
            match_id: m.match_id,
            status: m.status,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

/// The user's live lock, if any.
pub async fn find_by_user<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    user_id: i64,
) -> Result<Option<MatchLock>, DomainError> {
    let lock = locks_adapter::find_by_user(conn, user_id).await?;
    Ok(lock.map(MatchLock::from))
}

pub async fn find_by_user_and_match<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    user_id: i64,
    match_id: i64,
) -> Result<Option<MatchLock>, DomainError> {
    let lock = locks_adapter::find_by_user_and_match(conn, user_id, match_id).await?;
    Ok(lock.map(MatchLock::from))
}

pub async fn insert_lock<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    user_id: i64,
    match_id: i64,
    status: LockStatus,
) -> Result<MatchLock, DomainError> {
    let lock = locks_adapter::insert_lock(conn, user_id, match_id, status).await?;
    Ok(MatchLock::from(lock))
}

pub async fn set_lock_status<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    user_id: i64,
    match_id: i64,
    status: LockStatus,
) -> Result<u64, DomainError> {
    Ok(locks_adapter::set_lock_status(conn, user_id, match_id, status).await?)
}

pub async fn set_lock_status_for_match<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    match_id: i64,
    status: LockStatus,
) -> Result<u64, DomainError> {
    Ok(locks_adapter::set_lock_status_for_match(conn, match_id, status).await?)
}

pub async fn delete_by_match<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    match_id: i64,
) -> Result<u64, DomainError> {
    Ok(locks_adapter::delete_by_match(conn, match_id).await?)
}

pub async fn delete_by_id<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    lock_id: i64,
) -> Result<u64, DomainError> {
    Ok(locks_adapter::delete_by_id(conn, lock_id).await?)
}

/// Diagnostic listing, used by the lock-invariant assertions in tests.
pub async fn list_all<C: ConnectionTrait + Send + Sync>(
    conn: &C,
) -> Result<Vec<MatchLock>, DomainError> {
    let rows = locks_adapter::list_all(conn).await?;
    Ok(rows.into_iter().map(MatchLock::from).collect())
}

//! SeaORM adapter for the match_locks table - generic over ConnectionTrait.
//!
//! Lock rows are only ever written from inside the transition functions;
//! clients never touch them directly.

use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, NotSet, QueryFilter, Set,
};

use crate::entities::match_locks;
use crate::entities::match_locks::LockStatus;

pub async fn find_by_user<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    user_id: i64,
) -> Result<Option<match_locks::Model>, sea_orm::DbErr> {
    match_locks::Entity::find()
        .filter(match_locks::Column::UserId.eq(user_id))
        .one(conn)
        .await
}

pub async fn find_by_user_and_match<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    user_id: i64,
    match_id: i64,
) -> Result<Option<match_locks::Model>, sea_orm::DbErr> {
    match_locks::Entity::find()
        .filter(match_locks::Column::UserId.eq(user_id))
        .filter(match_locks::Column::MatchId.eq(match_id))
        .one(conn)
        .await
}

/// Insert a lock row for one participant. The unique index on user_id makes
/// a second live lock a hard DB error, which the enclosing transaction turns
/// into a rollback of the whole transition.
pub async fn insert_lock<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    user_id: i64,
    match_id: i64,
    status: LockStatus,
) -> Result<match_locks::Model, sea_orm::DbErr> {
    let now = time::OffsetDateTime::now_utc();
    let active = match_locks::ActiveModel {
        id: NotSet,
        user_id: Set(user_id),
        match_id: Set(match_id),
        status: Set(status),
        created_at: Set(now),
        updated_at: Set(now),
    };
    active.insert(conn).await
}

/// Move one participant's lock forward (Accepted -> Joined -> InProgress).
pub async fn set_lock_status<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    user_id: i64,
    match_id: i64,
    status: LockStatus,
) -> Result<u64, sea_orm::DbErr> {
    let now = time::OffsetDateTime::now_utc();
    let result = match_locks::Entity::update_many()
        .col_expr(match_locks::Column::Status, Expr::val(status).into())
        .col_expr(match_locks::Column::UpdatedAt, Expr::val(now).into())
        .filter(match_locks::Column::UserId.eq(user_id))
        .filter(match_locks::Column::MatchId.eq(match_id))
        .exec(conn)
        .await?;
    Ok(result.rows_affected)
}

/// Mark both participants' locks for a match.
pub async fn set_lock_status_for_match<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    match_id: i64,
    status: LockStatus,
) -> Result<u64, sea_orm::DbErr> {
    let now = time::OffsetDateTime::now_utc();
    let result = match_locks::Entity::update_many()
        .col_expr(match_locks::Column::Status, Expr::val(status).into())
        .col_expr(match_locks::Column::UpdatedAt, Expr::val(now).into())
        .filter(match_locks::Column::MatchId.eq(match_id))
        .exec(conn)
        .await?;
    Ok(result.rows_affected)
}

/// Delete every lock for a match (terminal transitions).
pub async fn delete_by_match<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    match_id: i64,
) -> Result<u64, sea_orm::DbErr> {
    let result = match_locks::Entity::delete_many()
        .filter(match_locks::Column::MatchId.eq(match_id))
        .exec(conn)
        .await?;
    Ok(result.rows_affected)
}

/// Delete one user's lock row by its id (defensive self-healing cleanup).
pub async fn delete_by_id<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    lock_id: i64,
) -> Result<u64, sea_orm::DbErr> {
    let result = match_locks::Entity::delete_many()
        .filter(match_locks::Column::Id.eq(lock_id))
        .exec(conn)
        .await?;
    Ok(result.rows_affected)
}

/// All lock rows, test/diagnostic helper for the ≤1-per-user invariant.
pub async fn list_all<C: ConnectionTrait + Send + Sync>(
    conn: &C,
) -> Result<Vec<match_locks::Model>, sea_orm::DbErr> {
    match_locks::Entity::find().all(conn).await
}

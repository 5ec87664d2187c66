//! SeaORM adapter for the matches table - generic over ConnectionTrait.

use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, NotSet, QueryFilter,
    QueryOrder, Set,
};

use crate::domain::transitions::NON_TERMINAL;
use crate::entities::matches;
use crate::entities::matches::MatchStatus;

pub mod dto;

pub use dto::{ChallengeCreate, StatusTransition, VisitWrite};

// Adapter functions return DbErr; the repos layer maps to DomainError.

pub async fn find_by_id<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    match_id: i64,
) -> Result<Option<matches::Model>, sea_orm::DbErr> {
    matches::Entity::find_by_id(match_id).one(conn).await
}

/// All rows where the user is challenger or receiver: every non-terminal row,
/// plus terminal rows updated since `terminal_since` (the client drops those
/// into no bucket, but needs to observe the terminal status at least once).
pub async fn list_for_user<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    user_id: i64,
    terminal_since: time::OffsetDateTime,
) -> Result<Vec<matches::Model>, sea_orm::DbErr> {
    matches::Entity::find()
        .filter(
            Condition::any()
                .add(matches::Column::ChallengerId.eq(user_id))
                .add(matches::Column::ReceiverId.eq(user_id)),
        )
        .filter(
            Condition::any()
                .add(matches::Column::Status.is_in(NON_TERMINAL))
                .add(matches::Column::UpdatedAt.gte(terminal_since)),
        )
        .order_by_desc(matches::Column::UpdatedAt)
        .all(conn)
        .await
}

pub async fn insert_challenge<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    dto: ChallengeCreate,
) -> Result<matches::Model, sea_orm::DbErr> {
    let now = time::OffsetDateTime::now_utc();
    let starting_score = dto.game_type.starting_score();
    let active = matches::ActiveModel {
        id: NotSet,
        status: Set(MatchStatus::Sent),
        challenger_id: Set(dto.challenger_id),
        receiver_id: Set(dto.receiver_id),
        game_type: Set(dto.game_type),
        match_format: Set(dto.match_format),
        challenge_expires_at: Set(dto.challenge_expires_at),
        join_window_expires_at: NotSet,
        current_player_id: NotSet,
        challenger_score: Set(starting_score),
        receiver_score: Set(starting_score),
        turn_index_in_leg: Set(0),
        last_visit: NotSet,
        cancelled_by: NotSet,
        created_at: Set(now),
        updated_at: Set(now),
        started_at: NotSet,
        ended_at: NotSet,
    };
    active.insert(conn).await
}

/// Apply a status-guarded transition. Returns the number of rows affected;
/// zero means the guard missed (row gone, or status moved concurrently) and
/// the caller decides what that means.
pub async fn transition_status<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    dto: StatusTransition,
) -> Result<u64, sea_orm::DbErr> {
    let now = time::OffsetDateTime::now_utc();

    let mut update = matches::Entity::update_many()
        .col_expr(matches::Column::Status, Expr::val(dto.new_status).into())
        .col_expr(matches::Column::UpdatedAt, Expr::val(now).into());

    if let Some(deadline) = dto.join_window_expires_at {
        update = update.col_expr(
            matches::Column::JoinWindowExpiresAt,
            Expr::val(Some(deadline)).into(),
        );
    }
    if let Some(current) = dto.current_player_id {
        update = update.col_expr(matches::Column::CurrentPlayerId, Expr::val(current).into());
    }
    if let Some(at) = dto.started_at {
        update = update.col_expr(matches::Column::StartedAt, Expr::val(Some(at)).into());
    }
    if let Some(at) = dto.ended_at {
        update = update.col_expr(matches::Column::EndedAt, Expr::val(Some(at)).into());
    }

    let result = update
        .filter(matches::Column::Id.eq(dto.id))
        .filter(matches::Column::Status.eq(dto.expected_status))
        .exec(conn)
        .await?;

    Ok(result.rows_affected)
}

/// The saveVisit write. The WHERE clause includes `current_player_id = acting
/// player` in addition to the InProgress guard, so a duplicate or late
/// submission after the turn flipped affects zero rows.
pub async fn apply_visit<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    dto: VisitWrite,
) -> Result<u64, sea_orm::DbErr> {
    let now = time::OffsetDateTime::now_utc();

    let mut update = matches::Entity::update_many()
        .col_expr(matches::Column::Status, Expr::val(dto.new_status).into())
        .col_expr(
            matches::Column::ChallengerScore,
            Expr::val(dto.challenger_score).into(),
        )
        .col_expr(
            matches::Column::ReceiverScore,
            Expr::val(dto.receiver_score).into(),
        )
        .col_expr(
            matches::Column::CurrentPlayerId,
            Expr::val(dto.next_player_id).into(),
        )
        .col_expr(
            matches::Column::TurnIndexInLeg,
            Expr::val(dto.turn_index_in_leg).into(),
        )
        .col_expr(
            matches::Column::LastVisit,
            Expr::val(Some(dto.last_visit)).into(),
        )
        .col_expr(matches::Column::UpdatedAt, Expr::val(now).into());

    if let Some(at) = dto.ended_at {
        update = update.col_expr(matches::Column::EndedAt, Expr::val(Some(at)).into());
    }

    let result = update
        .filter(matches::Column::Id.eq(dto.id))
        .filter(matches::Column::Status.eq(MatchStatus::InProgress))
        .filter(matches::Column::CurrentPlayerId.eq(dto.acting_player_id))
        .exec(conn)
        .await?;

    Ok(result.rows_affected)
}

/// Idempotent cancel: the WHERE clause only matches non-terminal rows, so a
/// second cancel (or a cancel racing a completion) affects zero rows.
pub async fn cancel_non_terminal<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    match_id: i64,
    cancelled_by: i64,
) -> Result<u64, sea_orm::DbErr> {
    let now = time::OffsetDateTime::now_utc();

    let result = matches::Entity::update_many()
        .col_expr(
            matches::Column::Status,
            Expr::val(MatchStatus::Cancelled).into(),
        )
        .col_expr(
            matches::Column::CancelledBy,
            Expr::val(Some(cancelled_by)).into(),
        )
        .col_expr(
            matches::Column::CurrentPlayerId,
            Expr::val(None::<i64>).into(),
        )
        .col_expr(matches::Column::EndedAt, Expr::val(Some(now)).into())
        .col_expr(matches::Column::UpdatedAt, Expr::val(now).into())
        .filter(matches::Column::Id.eq(match_id))
        .filter(matches::Column::Status.is_in(NON_TERMINAL))
        .exec(conn)
        .await?;

    Ok(result.rows_affected)
}

/// Rows the expiry sweep should move to Expired: Sent past the challenge
/// deadline, or Ready/Lobby past the join window.
pub async fn find_expiry_candidates<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    now: time::OffsetDateTime,
) -> Result<Vec<matches::Model>, sea_orm::DbErr> {
    matches::Entity::find()
        .filter(
            Condition::any()
                .add(
                    Condition::all()
                        .add(matches::Column::Status.eq(MatchStatus::Sent))
                        .add(matches::Column::ChallengeExpiresAt.lte(now)),
                )
                .add(
                    Condition::all()
                        .add(
                            matches::Column::Status
                                .is_in([MatchStatus::Ready, MatchStatus::Lobby]),
                        )
                        .add(matches::Column::JoinWindowExpiresAt.lte(now)),
                ),
        )
        .all(conn)
        .await
}

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Match lifecycle status.
///
/// Stored as a plain string (not a native DB enum) so the same entity works
/// against Postgres in production and SQLite in tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum MatchStatus {
    #[sea_orm(string_value = "SENT")]
    Sent,
    #[sea_orm(string_value = "READY")]
    Ready,
    #[sea_orm(string_value = "LOBBY")]
    Lobby,
    #[sea_orm(string_value = "IN_PROGRESS")]
    InProgress,
    #[sea_orm(string_value = "COMPLETED")]
    Completed,
    #[sea_orm(string_value = "CANCELLED")]
    Cancelled,
    #[sea_orm(string_value = "EXPIRED")]
    Expired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum GameType {
    #[sea_orm(string_value = "X01_501")]
    X01_501,
    #[sea_orm(string_value = "X01_301")]
    X01_301,
}

impl GameType {
    /// Starting score both players count down from.
    pub fn starting_score(&self) -> i16 {
        match self {
            GameType::X01_501 => 501,
            GameType::X01_301 => 301,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "matches")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub status: MatchStatus,
    #[sea_orm(column_name = "challenger_id")]
    pub challenger_id: i64,
    #[sea_orm(column_name = "receiver_id")]
    pub receiver_id: i64,
    #[sea_orm(column_name = "game_type")]
    pub game_type: GameType,
    #[sea_orm(column_name = "match_format")]
    pub match_format: String,
    #[sea_orm(column_name = "challenge_expires_at")]
    pub challenge_expires_at: OffsetDateTime,
    #[sea_orm(column_name = "join_window_expires_at")]
    pub join_window_expires_at: Option<OffsetDateTime>,
    #[sea_orm(column_name = "current_player_id")]
    pub current_player_id: Option<i64>,
    #[sea_orm(column_name = "challenger_score", column_type = "SmallInteger")]
    pub challenger_score: i16,
    #[sea_orm(column_name = "receiver_score", column_type = "SmallInteger")]
    pub receiver_score: i16,
    #[sea_orm(column_name = "turn_index_in_leg", column_type = "SmallInteger")]
    pub turn_index_in_leg: i16,
    #[sea_orm(column_name = "last_visit", column_type = "Json")]
    pub last_visit: Option<Json>,
    #[sea_orm(column_name = "cancelled_by")]
    pub cancelled_by: Option<i64>,
    #[sea_orm(column_name = "created_at")]
    pub created_at: OffsetDateTime,
    #[sea_orm(column_name = "updated_at")]
    pub updated_at: OffsetDateTime,
    #[sea_orm(column_name = "started_at")]
    pub started_at: Option<OffsetDateTime>,
    #[sea_orm(column_name = "ended_at")]
    pub ended_at: Option<OffsetDateTime>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::ChallengerId",
        to = "super::users::Column::Id"
    )]
    Challenger,
    #[sea_orm(has_many = "super::match_locks::Entity")]
    MatchLocks,
}

impl Related<super::match_locks::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MatchLocks.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

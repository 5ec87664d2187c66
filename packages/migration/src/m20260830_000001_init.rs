use sea_orm::Statement;
use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_query::{ColumnDef, ForeignKeyAction, Index, Table};

#[derive(DeriveMigrationName)]
pub struct Migration;

// ----- Iden enums for tables & columns -----
#[derive(Iden)]
enum Users {
    Table,
    Id,
    Sub,
    Username,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Matches {
    Table,
    Id,
    Status,
    ChallengerId,
    ReceiverId,
    GameType,
    MatchFormat,
    ChallengeExpiresAt,
    JoinWindowExpiresAt,
    CurrentPlayerId,
    ChallengerScore,
    ReceiverScore,
    TurnIndexInLeg,
    LastVisit,
    CancelledBy,
    CreatedAt,
    UpdatedAt,
    StartedAt,
    EndedAt,
}

#[derive(Iden)]
enum MatchLocks {
    Table,
    Id,
    UserId,
    MatchId,
    Status,
    CreatedAt,
    UpdatedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // users
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Id)
                            .big_integer()
                            .not_null()
                            .primary_key()
                            .auto_increment(),
                    )
                    .col(ColumnDef::new(Users::Sub).string().not_null())
                    .col(ColumnDef::new(Users::Username).string().not_null())
                    .col(
                        ColumnDef::new(Users::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Users::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_users_sub_unique")
                    .table(Users::Table)
                    .col(Users::Sub)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // matches
        //
        // Status is stored as a string enum rather than a native Postgres enum
        // so the same migration runs on SQLite in tests.
        manager
            .create_table(
                Table::create()
                    .table(Matches::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Matches::Id)
                            .big_integer()
                            .not_null()
                            .primary_key()
                            .auto_increment(),
                    )
                    .col(
                        ColumnDef::new(Matches::Status)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Matches::ChallengerId).big_integer().not_null())
                    .col(ColumnDef::new(Matches::ReceiverId).big_integer().not_null())
                    .col(ColumnDef::new(Matches::GameType).string_len(16).not_null())
                    .col(ColumnDef::new(Matches::MatchFormat).string().not_null())
                    .col(
                        ColumnDef::new(Matches::ChallengeExpiresAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Matches::JoinWindowExpiresAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(Matches::CurrentPlayerId).big_integer().null())
                    .col(
                        ColumnDef::new(Matches::ChallengerScore)
                            .small_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Matches::ReceiverScore)
                            .small_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Matches::TurnIndexInLeg)
                            .small_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Matches::LastVisit).json().null())
                    .col(ColumnDef::new(Matches::CancelledBy).big_integer().null())
                    .col(
                        ColumnDef::new(Matches::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Matches::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Matches::StartedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Matches::EndedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_matches_challenger_id")
                            .from(Matches::Table, Matches::ChallengerId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_matches_receiver_id")
                            .from(Matches::Table, Matches::ReceiverId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_matches_challenger_status")
                    .table(Matches::Table)
                    .col(Matches::ChallengerId)
                    .col(Matches::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_matches_receiver_status")
                    .table(Matches::Table)
                    .col(Matches::ReceiverId)
                    .col(Matches::Status)
                    .to_owned(),
            )
            .await?;

        // match_locks
        manager
            .create_table(
                Table::create()
                    .table(MatchLocks::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MatchLocks::Id)
                            .big_integer()
                            .not_null()
                            .primary_key()
                            .auto_increment(),
                    )
                    .col(ColumnDef::new(MatchLocks::UserId).big_integer().not_null())
                    .col(ColumnDef::new(MatchLocks::MatchId).big_integer().not_null())
                    .col(
                        ColumnDef::new(MatchLocks::Status)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MatchLocks::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MatchLocks::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_match_locks_user_id")
                            .from(MatchLocks::Table, MatchLocks::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_match_locks_match_id")
                            .from(MatchLocks::Table, MatchLocks::MatchId)
                            .to(Matches::Table, Matches::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // The one-live-match-per-user invariant is enforced at the schema
        // level: a user can hold at most one lock row.
        manager
            .create_index(
                Index::create()
                    .name("ux_match_locks_user_id")
                    .table(MatchLocks::Table)
                    .col(MatchLocks::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_match_locks_match_id")
                    .table(MatchLocks::Table)
                    .col(MatchLocks::MatchId)
                    .to_owned(),
            )
            .await?;

        // Logical replication must carry full row contents, not just the
        // primary key, or consumers filtering on challenger/receiver columns
        // silently miss events. Postgres only; SQLite test databases have no
        // replication.
        if manager.get_database_backend() == sea_orm::DatabaseBackend::Postgres {
            manager
                .get_connection()
                .execute(Statement::from_string(
                    sea_orm::DatabaseBackend::Postgres,
                    "ALTER TABLE matches REPLICA IDENTITY FULL".to_string(),
                ))
                .await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(MatchLocks::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Matches::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).if_exists().to_owned())
            .await?;
        Ok(())
    }
}

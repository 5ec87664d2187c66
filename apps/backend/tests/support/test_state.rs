use backend::error::AppError;
use backend::infra::state::build_state;
use backend::state::app_state::AppState;
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database};

/// Build an AppState over a fresh in-memory SQLite database with the full
/// migration set applied.
///
/// The pool is pinned to a single connection: every connection to
/// `sqlite::memory:` gets its own database, so a wider pool would scatter
/// the schema across invisible copies.
pub async fn test_state() -> Result<AppState, AppError> {
    let mut opts = ConnectOptions::new("sqlite::memory:".to_owned());
    opts.max_connections(1).min_connections(1);

    let db = Database::connect(opts)
        .await
        .map_err(|e| AppError::db(format!("test db connect failed: {e}")))?;
    Migrator::up(&db, None)
        .await
        .map_err(|e| AppError::db(format!("test db migration failed: {e}")))?;

    build_state().with_connection(db).build().await
}

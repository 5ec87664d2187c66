use migration::{Migrator, MigratorTrait};
use sea_orm::{Database, DatabaseConnection};

use crate::config::db::db_url;
use crate::error::AppError;

/// Connect to the configured database. Does not run migrations.
pub async fn connect_db() -> Result<DatabaseConnection, AppError> {
    let database_url = db_url()?;
    let conn = Database::connect(&database_url).await?;
    Ok(conn)
}

/// Connect and bring the schema up to date - the single entrypoint for
/// main and the state builder.
pub async fn bootstrap_db() -> Result<DatabaseConnection, AppError> {
    let conn = connect_db().await?;
    Migrator::up(&conn, None)
        .await
        .map_err(|err| AppError::config(format!("Migration failed: {err}")))?;
    Ok(conn)
}

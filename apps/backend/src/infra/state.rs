use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::domain::scoring::ScoreEngine;
use crate::error::AppError;
use crate::infra::db::bootstrap_db;
use crate::services::notify::Notifier;
use crate::state::app_state::AppState;
use crate::state::security_config::SecurityConfig;

/// Builder for creating AppState instances (used in both tests and main).
pub struct StateBuilder {
    security_config: SecurityConfig,
    db: Option<DatabaseConnection>,
    engine: Option<Arc<dyn ScoreEngine>>,
    notifier: Option<Arc<dyn Notifier>>,
}

impl StateBuilder {
    pub fn new() -> Self {
        Self {
            security_config: SecurityConfig::default(),
            db: None,
            engine: None,
            notifier: None,
        }
    }

    /// Use an already-connected (and migrated) database - the test path.
    pub fn with_connection(mut self, db: DatabaseConnection) -> Self {
        self.db = Some(db);
        self
    }

    pub fn with_security(mut self, security_config: SecurityConfig) -> Self {
        self.security_config = security_config;
        self
    }

    pub fn with_engine(mut self, engine: Arc<dyn ScoreEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub async fn build(self) -> Result<AppState, AppError> {
        let conn = match self.db {
            Some(conn) => conn,
            // single entrypoint: connect + migrate
            None => bootstrap_db().await?,
        };
        let mut state = AppState::new(conn, self.security_config);
        if let Some(engine) = self.engine {
            state = state.with_engine(engine);
        }
        if let Some(notifier) = self.notifier {
            state = state.with_notifier(notifier);
        }
        Ok(state)
    }
}

impl Default for StateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub fn build_state() -> StateBuilder {
    StateBuilder::new()
}

use std::sync::Arc;

use sea_orm::DatabaseConnection;

use super::security_config::SecurityConfig;
use crate::domain::scoring::{ScoreEngine, X01Engine};
use crate::feed::ChangeFeed;
use crate::services::notify::{LogNotifier, Notifier};

/// Application state containing shared resources.
#[derive(Clone)]
pub struct AppState {
    /// Database connection
    pub db: DatabaseConnection,
    /// Security configuration including JWT settings
    pub security: SecurityConfig,
    /// Per-user match change fan-out
    pub feed: Arc<ChangeFeed>,
    /// Scoring rule engine collaborator
    pub engine: Arc<dyn ScoreEngine>,
    /// Best-effort push dispatcher collaborator
    pub notifier: Arc<dyn Notifier>,
}

impl AppState {
    pub fn new(db: DatabaseConnection, security: SecurityConfig) -> Self {
        Self {
            db,
            security,
            feed: ChangeFeed::new(),
            engine: Arc::new(X01Engine),
            notifier: Arc::new(LogNotifier),
        }
    }

    pub fn with_engine(mut self, engine: Arc<dyn ScoreEngine>) -> Self {
        self.engine = engine;
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }
}

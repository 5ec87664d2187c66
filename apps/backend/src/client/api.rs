//! Client-facing RPC surface.
//!
//! `MatchApi` is the seam the headless client layer is written against.
//! `LocalApi` binds it in-process to an `AppState` - the same transition
//! functions, transactions and feed publication the HTTP handlers use -
//! which is how the integration tests drive full two-device scenarios.

use async_trait::async_trait;
use time::{Duration, OffsetDateTime};
use tokio::sync::broadcast;

use crate::db::txn::with_txn;
use crate::entities::matches::GameType;
use crate::error::AppError;
use crate::feed::MatchChange;
use crate::repos::matches::{self, Match};
use crate::services::match_flow;
use crate::state::app_state::AppState;

const TERMINAL_VISIBILITY: Duration = Duration::hours(24);

#[async_trait]
pub trait MatchApi: Send + Sync {
    async fn create_challenge(
        &self,
        receiver_id: i64,
        game_type: GameType,
        match_format: &str,
    ) -> Result<Match, AppError>;

    async fn accept_challenge(&self, match_id: i64) -> Result<Match, AppError>;

    async fn join_match(&self, match_id: i64) -> Result<Match, AppError>;

    async fn cancel_match(&self, match_id: i64) -> Result<Match, AppError>;

    async fn save_visit(&self, match_id: i64, darts: &[u8]) -> Result<Match, AppError>;

    async fn fetch_match(&self, match_id: i64) -> Result<Match, AppError>;

    async fn list_matches(&self) -> Result<Vec<Match>, AppError>;

    /// Authoritative "have I already joined" query for Lobby classification.
    async fn has_joined(&self, match_id: i64) -> Result<bool, AppError>;

    /// Change feed subscription for this user's matches.
    fn subscribe(&self) -> broadcast::Receiver<MatchChange>;
}

/// In-process binding of `MatchApi` for one signed-in user.
#[derive(Clone)]
pub struct LocalApi {
    state: AppState,
    user_id: i64,
}

impl LocalApi {
    pub fn new(state: AppState, user_id: i64) -> Self {
        Self { state, user_id }
    }

    pub fn user_id(&self) -> i64 {
        self.user_id
    }
}

#[async_trait]
impl MatchApi for LocalApi {
    async fn create_challenge(
        &self,
        receiver_id: i64,
        game_type: GameType,
        match_format: &str,
    ) -> Result<Match, AppError> {
        let challenger_id = self.user_id;
        let format = match_format.to_owned();
        let created = with_txn(&self.state.db, |txn| {
            Box::pin(async move {
                match_flow::create_challenge(txn, challenger_id, receiver_id, game_type, &format)
                    .await
            })
        })
        .await?;

        self.state.feed.publish(&created);
        self.state
            .notifier
            .challenge_received(created.receiver_id, &created)
            .await;
        Ok(created)
    }

    async fn accept_challenge(&self, match_id: i64) -> Result<Match, AppError> {
        let user_id = self.user_id;
        let updated = with_txn(&self.state.db, |txn| {
            Box::pin(async move { match_flow::accept_challenge(txn, match_id, user_id).await })
        })
        .await?;

        self.state.feed.publish(&updated);
        self.state
            .notifier
            .opponent_ready(updated.challenger_id, &updated)
            .await;
        Ok(updated)
    }

    async fn join_match(&self, match_id: i64) -> Result<Match, AppError> {
        let user_id = self.user_id;
        let updated = with_txn(&self.state.db, |txn| {
            Box::pin(async move { match_flow::join_match(txn, match_id, user_id).await })
        })
        .await?;

        self.state.feed.publish(&updated);
        Ok(updated)
    }

    async fn cancel_match(&self, match_id: i64) -> Result<Match, AppError> {
        let user_id = self.user_id;
        let updated = with_txn(&self.state.db, |txn| {
            Box::pin(async move { match_flow::cancel_match(txn, match_id, user_id).await })
        })
        .await?;

        self.state.feed.publish(&updated);
        Ok(updated)
    }

    async fn save_visit(&self, match_id: i64, darts: &[u8]) -> Result<Match, AppError> {
        let user_id = self.user_id;
        let darts = darts.to_vec();
        let engine = self.state.engine.clone();
        let updated = with_txn(&self.state.db, |txn| {
            Box::pin(async move {
                match_flow::save_visit(txn, engine.as_ref(), match_id, user_id, &darts).await
            })
        })
        .await?;

        self.state.feed.publish(&updated);
        Ok(updated)
    }

    async fn fetch_match(&self, match_id: i64) -> Result<Match, AppError> {
        Ok(matches::require_match(&self.state.db, match_id).await?)
    }

    async fn list_matches(&self) -> Result<Vec<Match>, AppError> {
        let since = OffsetDateTime::now_utc() - TERMINAL_VISIBILITY;
        Ok(matches::list_for_user(&self.state.db, self.user_id, since).await?)
    }

    async fn has_joined(&self, match_id: i64) -> Result<bool, AppError> {
        match_flow::has_joined(&self.state.db, match_id, self.user_id).await
    }

    fn subscribe(&self) -> broadcast::Receiver<MatchChange> {
        self.state.feed.subscribe(self.user_id)
    }
}

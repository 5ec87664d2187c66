use backend::client::api::{LocalApi, MatchApi};
use backend::entities::matches::{self, GameType};
use backend::error::AppError;
use backend::repos::matches::Match;
use backend::repos::users::{self, User};
use backend::state::app_state::AppState;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use time::OffsetDateTime;

pub async fn seed_user(state: &AppState, sub: &str, username: &str) -> Result<User, AppError> {
    Ok(users::insert_user(&state.db, sub, username).await?)
}

/// Two fixture users plus an in-process api handle for each.
pub struct TwoPlayers {
    pub alice: User,
    pub bob: User,
    pub api_a: LocalApi,
    pub api_b: LocalApi,
}

pub async fn two_players(state: &AppState) -> Result<TwoPlayers, AppError> {
    let alice = seed_user(state, "test|alice", "alice").await?;
    let bob = seed_user(state, "test|bob", "bob").await?;
    let api_a = LocalApi::new(state.clone(), alice.id);
    let api_b = LocalApi::new(state.clone(), bob.id);
    Ok(TwoPlayers {
        alice,
        bob,
        api_a,
        api_b,
    })
}

/// Challenge sent by alice and accepted by bob (Ready, both locks held).
pub async fn accepted_match(players: &TwoPlayers, game_type: GameType) -> Result<Match, AppError> {
    let sent = players
        .api_a
        .create_challenge(players.bob.id, game_type, "BEST_OF_1")
        .await?;
    players.api_b.accept_challenge(sent.id).await
}

/// Full handshake through both joins: gameplay underway, challenger to throw.
pub async fn started_match(players: &TwoPlayers, game_type: GameType) -> Result<Match, AppError> {
    let ready = accepted_match(players, game_type).await?;
    players.api_a.join_match(ready.id).await?;
    players.api_b.join_match(ready.id).await
}

/// Rewrite the challenge deadline directly, simulating the passage of time.
pub async fn set_challenge_deadline(
    state: &AppState,
    match_id: i64,
    when: OffsetDateTime,
) -> Result<(), AppError> {
    let model = matches::Entity::find_by_id(match_id)
        .one(&state.db)
        .await
        .map_err(|e| AppError::db(e.to_string()))?
        .ok_or_else(|| AppError::db(format!("fixture match {match_id} missing")))?;
    let mut active: matches::ActiveModel = model.into();
    active.challenge_expires_at = Set(when);
    active
        .update(&state.db)
        .await
        .map_err(|e| AppError::db(e.to_string()))?;
    Ok(())
}

/// Rewrite the join window deadline directly, simulating the passage of time.
pub async fn set_join_deadline(
    state: &AppState,
    match_id: i64,
    when: OffsetDateTime,
) -> Result<(), AppError> {
    let model = matches::Entity::find_by_id(match_id)
        .one(&state.db)
        .await
        .map_err(|e| AppError::db(e.to_string()))?
        .ok_or_else(|| AppError::db(format!("fixture match {match_id} missing")))?;
    let mut active: matches::ActiveModel = model.into();
    active.join_window_expires_at = Set(Some(when));
    active
        .update(&state.db)
        .await
        .map_err(|e| AppError::db(e.to_string()))?;
    Ok(())
}

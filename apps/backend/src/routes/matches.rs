//! Match transition and read endpoints - one route per transition.

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use time::{Duration, OffsetDateTime};

use crate::db::txn::with_txn;
use crate::entities::matches::GameType;
use crate::error::AppError;
use crate::extractors::current_user::CurrentUser;
use crate::extractors::match_id::MatchId;
use crate::repos::matches;
use crate::services::match_flow;
use crate::state::app_state::AppState;

/// Terminal rows older than this stop appearing in listings.
const TERMINAL_VISIBILITY: Duration = Duration::hours(24);

#[derive(Debug, Deserialize)]
struct CreateChallengeRequest {
    receiver_id: i64,
    game_type: GameType,
    match_format: String,
}

#[derive(Debug, Deserialize)]
struct SaveVisitRequest {
    darts: Vec<u8>,
}

/// POST /api/matches
async fn create_challenge(
    current_user: CurrentUser,
    body: web::Json<CreateChallengeRequest>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let req = body.into_inner();
    let challenger_id = current_user.id;

    let created = with_txn(&app_state.db, |txn| {
        Box::pin(async move {
            match_flow::create_challenge(
                txn,
                challenger_id,
                req.receiver_id,
                req.game_type,
                &req.match_format,
            )
            .await
        })
    })
    .await?;

    app_state.feed.publish(&created);
    app_state
        .notifier
        .challenge_received(created.receiver_id, &created)
        .await;

    Ok(HttpResponse::Created().json(created))
}

/// POST /api/matches/{match_id}/accept
async fn accept_challenge(
    current_user: CurrentUser,
    match_id: MatchId,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let user_id = current_user.id;
    let id = match_id.0;

    let updated = with_txn(&app_state.db, |txn| {
        Box::pin(async move { match_flow::accept_challenge(txn, id, user_id).await })
    })
    .await?;

    app_state.feed.publish(&updated);
    app_state
        .notifier
        .opponent_ready(updated.challenger_id, &updated)
        .await;

    Ok(HttpResponse::Ok().json(updated))
}

/// POST /api/matches/{match_id}/join
async fn join_match(
    current_user: CurrentUser,
    match_id: MatchId,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let user_id = current_user.id;
    let id = match_id.0;

    let updated = with_txn(&app_state.db, |txn| {
        Box::pin(async move { match_flow::join_match(txn, id, user_id).await })
    })
    .await?;

    app_state.feed.publish(&updated);
    Ok(HttpResponse::Ok().json(updated))
}

/// POST /api/matches/{match_id}/cancel
async fn cancel_match(
    current_user: CurrentUser,
    match_id: MatchId,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let user_id = current_user.id;
    let id = match_id.0;

    let updated = with_txn(&app_state.db, |txn| {
        Box::pin(async move { match_flow::cancel_match(txn, id, user_id).await })
    })
    .await?;

    app_state.feed.publish(&updated);
    Ok(HttpResponse::Ok().json(updated))
}

/// POST /api/matches/{match_id}/visits
async fn save_visit(
    current_user: CurrentUser,
    match_id: MatchId,
    body: web::Json<SaveVisitRequest>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let user_id = current_user.id;
    let id = match_id.0;
    let darts = body.into_inner().darts;
    let engine = app_state.engine.clone();

    let updated = with_txn(&app_state.db, |txn| {
        Box::pin(async move { match_flow::save_visit(txn, engine.as_ref(), id, user_id, &darts).await })
    })
    .await?;

    app_state.feed.publish(&updated);
    Ok(HttpResponse::Ok().json(updated))
}

/// GET /api/matches
///
/// Every row where the caller is a participant: all non-terminal rows, plus
/// recently finished ones so a briefly-offline client still observes the
/// terminal status at least once.
async fn list_matches(
    current_user: CurrentUser,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let since = OffsetDateTime::now_utc() - TERMINAL_VISIBILITY;
    let rows = matches::list_for_user(&app_state.db, current_user.id, since).await?;
    Ok(HttpResponse::Ok().json(rows))
}

/// GET /api/matches/{match_id}
async fn get_match(
    current_user: CurrentUser,
    match_id: MatchId,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let m = matches::require_match(&app_state.db, match_id.0).await?;
    if !m.is_participant(current_user.id) {
        return Err(crate::errors::domain::DomainError::unauthorized(
            "Not a participant of this match",
        )
        .into());
    }
    Ok(HttpResponse::Ok().json(m))
}

#[derive(serde::Serialize)]
struct JoinedResponse {
    joined: bool,
}

/// GET /api/matches/{match_id}/joined
///
/// The authoritative "have I already joined" answer for the client's Lobby
/// classification.
async fn get_joined(
    current_user: CurrentUser,
    match_id: MatchId,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let joined = match_flow::has_joined(&app_state.db, match_id.0, current_user.id).await?;
    Ok(HttpResponse::Ok().json(JoinedResponse { joined }))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("")
            .route(web::post().to(create_challenge))
            .route(web::get().to(list_matches)),
    );
    cfg.service(web::resource("/{match_id}").route(web::get().to(get_match)));
    cfg.service(web::resource("/{match_id}/accept").route(web::post().to(accept_challenge)));
    cfg.service(web::resource("/{match_id}/join").route(web::post().to(join_match)));
    cfg.service(web::resource("/{match_id}/cancel").route(web::post().to(cancel_match)));
    cfg.service(web::resource("/{match_id}/visits").route(web::post().to(save_visit)));
    cfg.service(web::resource("/{match_id}/joined").route(web::get().to(get_joined)));
}

use actix_web::dev::Payload;
use actix_web::{web, FromRequest, HttpRequest};
use serde::{Deserialize, Serialize};

use crate::auth::jwt::verify_access_token;
use crate::error::AppError;
use crate::repos::users;
use crate::state::app_state::AppState;

/// Authenticated caller, resolved from the Bearer token's `sub` claim to the
/// stored user row. Handlers take this by value; every role decision after
/// this point is re-derived from the match row, never from the token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CurrentUser {
    pub id: i64,
    pub sub: String,
    pub username: String,
}

fn bearer_token(req: &HttpRequest) -> Result<String, AppError> {
    let header = req
        .headers()
        .get(actix_web::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(AppError::unauthorized_missing_bearer)?;

    header
        .strip_prefix("Bearer ")
        .map(str::to_owned)
        .ok_or_else(AppError::unauthorized_missing_bearer)
}

impl FromRequest for CurrentUser {
    type Error = AppError;
    type Future = std::pin::Pin<Box<dyn std::future::Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let req = req.clone();

        Box::pin(async move {
            let state = req
                .app_data::<web::Data<AppState>>()
                .ok_or_else(|| AppError::internal("AppState not available"))?;

            let token = bearer_token(&req)?;
            let claims = verify_access_token(&token, &state.security)?;

            let user = users::find_by_sub(&state.db, &claims.sub)
                .await
                .map_err(AppError::from)?
                .ok_or_else(AppError::unauthorized)?;

            Ok(CurrentUser {
                id: user.id,
                sub: user.sub,
                username: user.username,
            })
        })
    }
}

use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpRequest};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::errors::ErrorCode;

/// Match ID extracted from the route path parameter.
///
/// Parse-and-shape validation only; existence and participation checks
/// belong to the transition functions, which load the row anyway.
#[derive(Debug, Serialize, Deserialize, Clone, Copy)]
pub struct MatchId(pub i64);

impl FromRequest for MatchId {
    type Error = AppError;
    type Future = std::future::Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let result = (|| {
            let raw = req.match_info().get("match_id").ok_or_else(|| {
                AppError::bad_request(ErrorCode::InvalidMatchId, "Missing match_id parameter")
            })?;

            let match_id = raw.parse::<i64>().map_err(|_| {
                AppError::bad_request(ErrorCode::InvalidMatchId, format!("Invalid match id: {raw}"))
            })?;

            if match_id <= 0 {
                return Err(AppError::bad_request(
                    ErrorCode::InvalidMatchId,
                    format!("Match id must be positive, got: {match_id}"),
                ));
            }

            Ok(MatchId(match_id))
        })();

        std::future::ready(result)
    }
}

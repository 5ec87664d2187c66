//! Error codes for the Oche backend API.
//!
//! Add new codes here; never pass ad-hoc strings as error codes.
//! All error codes are SCREAMING_SNAKE_CASE and map 1:1 to the strings
//! that appear in HTTP responses.

use core::fmt;

/// Centralized error codes for the Oche backend API.
///
/// Each variant maps to a canonical SCREAMING_SNAKE_CASE string that appears
/// in HTTP responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Authentication & Authorization
    /// Authentication required
    Unauthorized,
    /// Missing or malformed Bearer token
    UnauthorizedMissingBearer,
    /// Access denied
    Forbidden,
    /// Caller is neither challenger nor receiver of the match
    NotAParticipant,
    /// Operation restricted to the other participant (e.g. accepting own challenge)
    WrongParticipant,

    // Request Validation
    /// Invalid match ID provided
    InvalidMatchId,
    /// Visit must contain 1 to 3 darts
    InvalidDartCount,
    /// A dart value is not an achievable single-throw score
    InvalidDartValue,
    /// Challenging yourself is not a match
    SelfChallenge,
    /// General validation error
    ValidationError,
    /// General bad request error
    BadRequest,

    // Invalid state / expiry
    /// Operation is not valid for the match's current status
    InvalidState,
    /// Challenge expired before it was accepted
    ChallengeExpired,
    /// Join window elapsed before both participants joined
    JoinWindowExpired,

    // Resource Not Found
    /// Match not found
    MatchNotFound,
    /// User not found
    UserNotFound,
    /// General not found error
    NotFound,

    // Business Logic Conflicts
    /// Caller already holds a live match lock
    AlreadyHasActiveMatch,
    /// The receiver already holds a live match lock
    OpponentHasActiveMatch,
    /// Visit submitted by a player whose turn it is not
    OutOfTurn,
    /// Generic conflict (fallback for unmatched conflicts)
    Conflict,

    // System Errors
    /// Database error
    DbError,
    /// Database unavailable
    DbUnavailable,
    /// Internal server error
    Internal,
    /// Configuration error
    ConfigError,
}

impl ErrorCode {
    /// Returns the canonical SCREAMING_SNAKE_CASE string for this error code.
    ///
    /// This is the exact string that appears in HTTP responses.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Unauthorized => "UNAUTHORIZED",
            Self::UnauthorizedMissingBearer => "UNAUTHORIZED_MISSING_BEARER",
            Self::Forbidden => "FORBIDDEN",
            Self::NotAParticipant => "NOT_A_PARTICIPANT",
            Self::WrongParticipant => "WRONG_PARTICIPANT",

            Self::InvalidMatchId => "INVALID_MATCH_ID",
            Self::InvalidDartCount => "INVALID_DART_COUNT",
            Self::InvalidDartValue => "INVALID_DART_VALUE",
            Self::SelfChallenge => "SELF_CHALLENGE",
            Self::ValidationError => "VALIDATION_ERROR",
            Self::BadRequest => "BAD_REQUEST",

            Self::InvalidState => "INVALID_STATE",
            Self::ChallengeExpired => "CHALLENGE_EXPIRED",
            Self::JoinWindowExpired => "JOIN_WINDOW_EXPIRED",

            Self::MatchNotFound => "MATCH_NOT_FOUND",
            Self::UserNotFound => "USER_NOT_FOUND",
            Self::NotFound => "NOT_FOUND",

            Self::AlreadyHasActiveMatch => "ALREADY_HAS_ACTIVE_MATCH",
            Self::OpponentHasActiveMatch => "OPPONENT_HAS_ACTIVE_MATCH",
            Self::OutOfTurn => "OUT_OF_TURN",
            Self::Conflict => "CONFLICT",

            Self::DbError => "DB_ERROR",
            Self::DbUnavailable => "DB_UNAVAILABLE",
            Self::Internal => "INTERNAL",
            Self::ConfigError => "CONFIG_ERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_strings() {
        assert_eq!(ErrorCode::Unauthorized.as_str(), "UNAUTHORIZED");
        assert_eq!(ErrorCode::NotAParticipant.as_str(), "NOT_A_PARTICIPANT");
        assert_eq!(ErrorCode::InvalidState.as_str(), "INVALID_STATE");
        assert_eq!(ErrorCode::ChallengeExpired.as_str(), "CHALLENGE_EXPIRED");
        assert_eq!(
            ErrorCode::AlreadyHasActiveMatch.as_str(),
            "ALREADY_HAS_ACTIVE_MATCH"
        );
        assert_eq!(ErrorCode::OutOfTurn.as_str(), "OUT_OF_TURN");
        assert_eq!(ErrorCode::MatchNotFound.as_str(), "MATCH_NOT_FOUND");
        assert_eq!(ErrorCode::DbUnavailable.as_str(), "DB_UNAVAILABLE");
    }

    #[test]
    fn test_display_trait() {
        assert_eq!(format!("{}", ErrorCode::OutOfTurn), "OUT_OF_TURN");
        assert_eq!(
            format!("{}", ErrorCode::JoinWindowExpired),
            "JOIN_WINDOW_EXPIRED"
        );
    }
}

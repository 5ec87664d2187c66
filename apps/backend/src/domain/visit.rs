//! Visit payload: one turn's dart throws submitted as a single scoring unit.

use serde::{Deserialize, Serialize};

pub const MAX_DARTS_PER_VISIT: usize = 3;

/// The most recent turn, embedded in the match row so every feed event is
/// fully self-describing. Durable per-turn history is a collaborator's
/// concern, not ours.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitPayload {
    pub player_id: i64,
    /// Ordered scored values, one per dart (1..=3 darts).
    pub darts: Vec<u8>,
    pub score_before: i16,
    pub score_after: i16,
    /// Unix millis; clients compare this to decide whether a reveal is due.
    pub thrown_at_ms: i64,
}

/// Whether a single dart can score `value` (singles, doubles, trebles,
/// outer/inner bull, or a miss).
pub fn is_achievable_dart(value: u8) -> bool {
    match value {
        0..=20 => true,
        25 | 50 => true,
        v if v <= 40 && v % 2 == 0 => true,
        v if v <= 60 && v % 3 == 0 => true,
        _ => false,
    }
}

/// Ways a submitted visit can be malformed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DartError {
    /// Outside the 1..=3 dart range.
    BadCount(usize),
    /// A value no single dart can score.
    Unachievable(u8),
}

/// Validate a submitted visit: 1..=3 darts, every value achievable.
pub fn validate_darts(darts: &[u8]) -> Result<(), DartError> {
    if darts.is_empty() || darts.len() > MAX_DARTS_PER_VISIT {
        return Err(DartError::BadCount(darts.len()));
    }
    for &dart in darts {
        if !is_achievable_dart(dart) {
            return Err(DartError::Unachievable(dart));
        }
    }
    Ok(())
}

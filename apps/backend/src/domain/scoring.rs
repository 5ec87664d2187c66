//! Scoring rule engine seam.
//!
//! The transition functions are generic over the per-game rules: they hand the
//! engine a score and the visit's darts and get back the new score plus
//! win/bust flags. Everything else about a game variant lives behind this
//! trait.

use crate::entities::matches::GameType;

/// Result of applying one visit to a player's score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisitOutcome {
    /// Score the player is left on (unchanged on a bust).
    pub score_after: i16,
    /// The visit met the win condition; the match is over.
    pub win: bool,
    /// The visit overshot; it scores nothing and the turn passes.
    pub bust: bool,
}

/// Per-game scoring rules, opaque beyond this contract.
pub trait ScoreEngine: Send + Sync {
    fn score_visit(&self, game_type: GameType, score_before: i16, darts: &[u8]) -> VisitOutcome;
}

/// Countdown games (501/301): subtract the visit total, win at exactly zero.
///
/// Darts arrive as already-scored values with no segment information, so
/// double-out cannot be modelled; a visit that would leave less than zero
/// busts and restores the starting score of the turn.
#[derive(Debug, Clone, Copy, Default)]
pub struct X01Engine;

impl ScoreEngine for X01Engine {
    fn score_visit(&self, _game_type: GameType, score_before: i16, darts: &[u8]) -> VisitOutcome {
        let total: i16 = darts.iter().map(|&d| d as i16).sum();
        let remaining = score_before - total;

        if remaining == 0 {
            return VisitOutcome {
                score_after: 0,
                win: true,
                bust: false,
            };
        }
        if remaining < 0 {
            return VisitOutcome {
                score_after: score_before,
                win: false,
                bust: true,
            };
        }
        VisitOutcome {
            score_after: remaining,
            win: false,
            bust: false,
        }
    }
}

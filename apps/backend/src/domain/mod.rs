//! Domain layer: pure match logic, no DB or HTTP.

pub mod scoring;
pub mod transitions;
pub mod visit;

#[cfg(test)]
mod tests_props_transitions;

// Re-exports for ergonomics
pub use scoring::{ScoreEngine, VisitOutcome, X01Engine};
pub use transitions::{can_transition, is_terminal, MatchEvent, MatchLifecycleView};
pub use visit::VisitPayload;

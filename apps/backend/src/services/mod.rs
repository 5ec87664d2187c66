//! Service layer - orchestration between domain logic and persistence.

pub mod match_flow;
pub mod notify;

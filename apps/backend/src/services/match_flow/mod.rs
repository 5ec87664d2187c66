//! Transition functions - the server-authoritative match state machine.
//!
//! Every function takes a `&DatabaseTransaction`; callers own the
//! transaction (via `db::txn::with_txn`) and publish the returned row to the
//! change feed only after commit.

pub mod challenge;
pub mod expiry;
pub mod lobby;
pub mod visits;

pub use challenge::{accept_challenge, create_challenge, CHALLENGE_TTL, JOIN_WINDOW};
pub use expiry::{expire_matches, release_stale_locks};
pub use lobby::{cancel_match, has_joined, join_match};
pub use visits::save_visit;

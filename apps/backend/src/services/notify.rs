//! Best-effort notification seam.
//!
//! Push delivery is a collaborator concern; this trait is the hook the
//! transition endpoints call after commit. Implementations must swallow
//! their own failures - a dropped notification never fails a transition.

use async_trait::async_trait;
use tracing::info;

use crate::repos::matches::Match;

#[async_trait]
pub trait Notifier: Send + Sync {
    /// A new challenge landed in the receiver's pending list.
    async fn challenge_received(&self, receiver_id: i64, m: &Match);

    /// The opponent accepted; the join window is ticking.
    async fn opponent_ready(&self, challenger_id: i64, m: &Match);
}

/// Default implementation: structured log lines only.
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn challenge_received(&self, receiver_id: i64, m: &Match) {
        info!(match_id = m.id, receiver_id, "notify: challenge received");
    }

    async fn opponent_ready(&self, challenger_id: i64, m: &Match) {
        info!(match_id = m.id, challenger_id, "notify: opponent ready");
    }
}

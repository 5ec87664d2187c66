//! Per-user match change feed.
//!
//! Every committed transition publishes the full post-transition match row to
//! both participants. Delivery is droppable at-least-once: consumers that lag
//! past the channel capacity miss intermediate rows but always converge on
//! the latest one, which is all the reconciliation model requires.

use std::sync::Arc;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;

use crate::repos::matches::Match;

/// Buffered changes per subscriber before a lagging receiver starts dropping.
const FEED_CAPACITY: usize = 64;

/// One committed match transition, as seen by a participant.
///
/// Carries the whole row rather than a delta: consumers apply "latest wins"
/// and re-derive events locally, so a dropped or duplicated change is safe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchChange {
    pub match_id: i64,
    #[serde(rename = "match")]
    pub row: Match,
}

/// In-process fan-out registry, one broadcast channel per user with at least
/// one live subscriber.
#[derive(Default)]
pub struct ChangeFeed {
    channels: DashMap<i64, broadcast::Sender<MatchChange>>,
}

impl ChangeFeed {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            channels: DashMap::new(),
        })
    }

    /// Subscribe to changes for one user's matches.
    pub fn subscribe(&self, user_id: i64) -> broadcast::Receiver<MatchChange> {
        self.channels
            .entry(user_id)
            .or_insert_with(|| broadcast::channel(FEED_CAPACITY).0)
            .subscribe()
    }

    /// Publish a committed transition to both participants.
    pub fn publish(&self, row: &Match) {
        let change = MatchChange {
            match_id: row.id,
            row: row.clone(),
        };
        for user_id in [row.challenger_id, row.receiver_id] {
            self.publish_to(user_id, change.clone());
        }
    }

    fn publish_to(&self, user_id: i64, change: MatchChange) {
        if let Some(sender) = self.channels.get(&user_id) {
            // Err here means no live receiver, which is fine: the user will
            // catch up from a full reload on reconnect.
            let delivered = sender.send(change).unwrap_or(0);
            debug!(user_id, delivered, "published match change");
        }
        // Drop empty channels lazily: a sender with no receivers is removed
        // the next time we try to publish to it.
        if let Some(entry) = self.channels.get(&user_id) {
            if entry.receiver_count() == 0 {
                drop(entry);
                self.channels
                    .remove_if(&user_id, |_, tx| tx.receiver_count() == 0);
            }
        }
    }

    /// Number of users with at least one registered channel (test helper).
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::matches::{GameType, MatchStatus};

    fn sample_match(id: i64, challenger: i64, receiver: i64) -> Match {
        let now = time::OffsetDateTime::now_utc();
        Match {
            id,
            challenger_id: challenger,
            receiver_id: receiver,
            status: MatchStatus::Sent,
            game_type: GameType::X01_501,
            match_format: "single_leg".into(),
            challenge_expires_at: now + time::Duration::hours(24),
            join_window_expires_at: None,
            current_player_id: None,
            challenger_score: 501,
            receiver_score: 501,
            turn_index_in_leg: 0,
            last_visit: None,
            cancelled_by: None,
            created_at: now,
            updated_at: now,
            started_at: None,
            ended_at: None,
        }
    }

    #[tokio::test]
    async fn both_participants_receive_published_change() {
        let feed = ChangeFeed::new();
        let mut rx_a = feed.subscribe(1);
        let mut rx_b = feed.subscribe(2);

        feed.publish(&sample_match(10, 1, 2));

        let got_a = rx_a.recv().await.unwrap();
        let got_b = rx_b.recv().await.unwrap();
        assert_eq!(got_a.match_id, 10);
        assert_eq!(got_b.match_id, 10);
    }

    #[tokio::test]
    async fn publish_without_subscriber_is_a_no_op() {
        let feed = ChangeFeed::new();
        feed.publish(&sample_match(10, 1, 2));
        assert_eq!(feed.channel_count(), 0);
    }

    #[tokio::test]
    async fn lagging_receiver_still_sees_latest_change() {
        let feed = ChangeFeed::new();
        let mut rx = feed.subscribe(1);

        for i in 0..(FEED_CAPACITY as i64 + 8) {
            let mut m = sample_match(100 + i, 1, 2);
            m.turn_index_in_leg = i as i16;
            feed.publish(&m);
        }

        // First recv reports the lag; draining afterwards reaches the most
        // recent change.
        let mut latest = None;
        loop {
            match rx.try_recv() {
                Ok(change) => latest = Some(change),
                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
                Err(_) => break,
            }
        }
        let latest = latest.expect("expected at least one change after lag");
        assert_eq!(latest.match_id, 100 + FEED_CAPACITY as i64 + 7);
    }
}

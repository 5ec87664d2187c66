//! Bucket classification - the client's view of "what am I involved in".
//!
//! Four disjoint buckets per signed-in user. Classification is a pure
//! function of the latest known row plus, for Lobby rows, the authoritative
//! joined answer; a match id never lands in two buckets because every row
//! maps to exactly one.

use std::collections::HashSet;

use crate::entities::matches::MatchStatus;
use crate::error::AppError;
use crate::repos::matches::Match;

use super::api::MatchApi;

/// Where one match row belongs in the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    /// Sent, and I am the receiver
    PendingChallenge,
    /// Sent, and I am the challenger
    SentChallenge,
    /// Ready, or Lobby I have not joined yet
    ReadyMatch,
    /// Lobby I have joined, or InProgress
    Active,
}

/// Classify one row for `user_id`. Terminal rows map to no bucket - they
/// simply disappear from active lists.
///
/// `joined` is the authoritative Lobby answer and is only consulted for
/// Lobby rows; passing a stale value for other statuses cannot misclassify.
pub fn classify(user_id: i64, m: &Match, joined: bool) -> Option<Bucket> {
    match m.status {
        MatchStatus::Sent => {
            if m.receiver_id == user_id {
                Some(Bucket::PendingChallenge)
            } else {
                Some(Bucket::SentChallenge)
            }
        }
        MatchStatus::Ready => Some(Bucket::ReadyMatch),
        MatchStatus::Lobby => {
            if joined {
                Some(Bucket::Active)
            } else {
                Some(Bucket::ReadyMatch)
            }
        }
        MatchStatus::InProgress => Some(Bucket::Active),
        MatchStatus::Completed | MatchStatus::Cancelled | MatchStatus::Expired => None,
    }
}

/// The reconciled view after one reload.
#[derive(Debug, Clone, Default)]
pub struct Buckets {
    pub pending_challenges: Vec<Match>,
    pub sent_challenges: Vec<Match>,
    pub ready_matches: Vec<Match>,
    pub active_match: Option<Match>,
}

impl Buckets {
    /// Every match id across all buckets - used by the disjointness tests.
    pub fn all_ids(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = self
            .pending_challenges
            .iter()
            .chain(&self.sent_challenges)
            .chain(&self.ready_matches)
            .map(|m| m.id)
            .collect();
        if let Some(active) = &self.active_match {
            ids.push(active.id);
        }
        ids
    }

    fn insert(&mut self, bucket: Bucket, m: Match) {
        match bucket {
            Bucket::PendingChallenge => self.pending_challenges.push(m),
            Bucket::SentChallenge => self.sent_challenges.push(m),
            Bucket::ReadyMatch => self.ready_matches.push(m),
            Bucket::Active => {
                // At most one active match can exist (the lock invariant),
                // but trust nothing: keep the freshest row if two appear.
                match &self.active_match {
                    Some(existing) if existing.updated_at >= m.updated_at => {}
                    _ => self.active_match = Some(m),
                }
            }
        }
    }
}

/// Full reload: fetch the listing and classify every row.
///
/// The Lobby joined check is awaited here, inside the reload, so the caller
/// can rely on `active_match` the moment this returns. Returning before that
/// check completes is exactly the bug that makes navigation after a join fail
/// intermittently.
pub async fn reload(api: &dyn MatchApi, user_id: i64) -> Result<Buckets, AppError> {
    let rows = api.list_matches().await?;
    let mut buckets = Buckets::default();
    let mut seen: HashSet<i64> = HashSet::new();

    for m in rows {
        if !seen.insert(m.id) {
            continue;
        }

        let joined = if m.status == MatchStatus::Lobby {
            api.has_joined(m.id).await?
        } else {
            false
        };

        if let Some(bucket) = classify(user_id, &m, joined) {
            buckets.insert(bucket, m);
        }
    }

    // A row that became active supersedes any stale membership the listing
    // may still imply: drop the active id from the challenge/ready lists.
    if let Some(active_id) = buckets.active_match.as_ref().map(|m| m.id) {
        buckets.pending_challenges.retain(|m| m.id != active_id);
        buckets.sent_challenges.retain(|m| m.id != active_id);
        buckets.ready_matches.retain(|m| m.id != active_id);
    }

    Ok(buckets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::matches::GameType;

    fn row(id: i64, status: MatchStatus, challenger: i64, receiver: i64) -> Match {
        let now = time::OffsetDateTime::now_utc();
        Match {
            id,
            challenger_id: challenger,
            receiver_id: receiver,
            status,
            game_type: GameType::X01_501,
            match_format: "single_leg".into(),
            challenge_expires_at: now + time::Duration::hours(24),
            join_window_expires_at: None,
            current_player_id: if status == MatchStatus::InProgress {
                Some(challenger)
            } else {
                None
            },
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

    #[test]
    fn sent_classifies_by_role() {
        let m = row(1, MatchStatus::Sent, 10, 20);
        assert_eq!(classify(20, &m, false), Some(Bucket::PendingChallenge));
        assert_eq!(classify(10, &m, false), Some(Bucket::SentChallenge));
    }

    #[test]
    fn ready_is_ready_for_both() {
        let m = row(1, MatchStatus::Ready, 10, 20);
        assert_eq!(classify(10, &m, false), Some(Bucket::ReadyMatch));
        assert_eq!(classify(20, &m, false), Some(Bucket::ReadyMatch));
    }

    #[test]
    fn lobby_splits_on_joined_answer() {
        let m = row(1, MatchStatus::Lobby, 10, 20);
        assert_eq!(classify(10, &m, true), Some(Bucket::Active));
        assert_eq!(classify(10, &m, false), Some(Bucket::ReadyMatch));
    }

    #[test]
    fn in_progress_is_active() {
        let m = row(1, MatchStatus::InProgress, 10, 20);
        assert_eq!(classify(20, &m, false), Some(Bucket::Active));
    }

    #[test]
    fn terminal_rows_disappear() {
        for status in [
            MatchStatus::Completed,
            MatchStatus::Cancelled,
            MatchStatus::Expired,
        ] {
            let m = row(1, status, 10, 20);
            assert_eq!(classify(10, &m, false), None);
        }
    }

    #[test]
    fn freshest_active_row_wins() {
        let mut buckets = Buckets::default();
        let older = row(1, MatchStatus::InProgress, 10, 20);
        let mut newer = row(2, MatchStatus::InProgress, 10, 30);
        newer.updated_at = older.updated_at + time::Duration::seconds(5);

        buckets.insert(Bucket::Active, older);
        buckets.insert(Bucket::Active, newer);
        assert_eq!(buckets.active_match.as_ref().map(|m| m.id), Some(2));
    }
}

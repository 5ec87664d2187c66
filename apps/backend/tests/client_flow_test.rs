mod common;
mod support;

use backend::client::api::MatchApi;
use backend::client::handoff::{EntryOutcome, MatchSession, SubmitOutcome, UiAction};
use backend::client::nav_guard::{NavigationGuard, StatusTracker};
use backend::client::reconcile;
use backend::entities::matches::{GameType, MatchStatus};
use backend::error::AppError;
use std::collections::HashSet;
use std::time::Duration;
use support::{factory, test_state};

/// The four buckets stay disjoint and correct through the whole handshake.
#[tokio::test]
async fn test_buckets_track_lifecycle() -> Result<(), AppError> {
    let state = test_state::test_state().await?;
    let players = factory::two_players(&state).await?;

    let sent = players
        .api_a
        .create_challenge(players.bob.id, GameType::X01_501, "BEST_OF_1")
        .await?;

    let mine = reconcile::reload(&players.api_a, players.alice.id).await?;
    assert_eq!(mine.sent_challenges.len(), 1);
    assert!(mine.pending_challenges.is_empty());
    assert!(mine.active_match.is_none());

    let theirs = reconcile::reload(&players.api_b, players.bob.id).await?;
    assert_eq!(theirs.pending_challenges.len(), 1);
    assert!(theirs.sent_challenges.is_empty());

    players.api_b.accept_challenge(sent.id).await?;
    let theirs = reconcile::reload(&players.api_b, players.bob.id).await?;
    assert_eq!(theirs.ready_matches.len(), 1);
    assert!(theirs.pending_challenges.is_empty());

    // Alice joins: Lobby is active for her, still just ready for bob.
    players.api_a.join_match(sent.id).await?;
    let mine = reconcile::reload(&players.api_a, players.alice.id).await?;
    assert!(mine.ready_matches.is_empty());
    assert_eq!(mine.active_match.as_ref().map(|m| m.id), Some(sent.id));

    let theirs = reconcile::reload(&players.api_b, players.bob.id).await?;
    assert_eq!(theirs.ready_matches.len(), 1);
    assert!(theirs.active_match.is_none());

    players.api_b.join_match(sent.id).await?;
    for (api, user) in [
        (&players.api_a, players.alice.id),
        (&players.api_b, players.bob.id),
    ] {
        let buckets = reconcile::reload(api, user).await?;
        assert_eq!(buckets.active_match.as_ref().map(|m| m.id), Some(sent.id));
        let ids = buckets.all_ids();
        let unique: HashSet<i64> = ids.iter().copied().collect();
        assert_eq!(ids.len(), unique.len(), "buckets must stay disjoint");
        assert_eq!(ids.len(), 1);
    }

    // Cancellation drops the match out of every bucket.
    players.api_a.cancel_match(sent.id).await?;
    let mine = reconcile::reload(&players.api_a, players.alice.id).await?;
    assert!(mine.all_ids().is_empty(), "terminal rows leave every bucket");

    Ok(())
}

/// Every server-side transition reaches a subscribed opponent in order.
#[tokio::test]
async fn test_feed_delivers_transitions_in_order() -> Result<(), AppError> {
    let state = test_state::test_state().await?;
    let players = factory::two_players(&state).await?;
    let mut rx_b = players.api_b.subscribe();

    let sent = players
        .api_a
        .create_challenge(players.bob.id, GameType::X01_501, "BEST_OF_1")
        .await?;
    players.api_b.accept_challenge(sent.id).await?;
    players.api_a.join_match(sent.id).await?;
    players.api_b.join_match(sent.id).await?;
    players.api_a.save_visit(sent.id, &[20, 20, 20]).await?;

    let mut seen = Vec::new();
    for _ in 0..5 {
        let change = rx_b
            .recv()
            .await
            .map_err(|e| AppError::internal(format!("feed closed: {e}")))?;
        assert_eq!(change.match_id, sent.id);
        seen.push(change.row.status);
    }
    assert_eq!(
        seen,
        vec![
            MatchStatus::Sent,
            MatchStatus::Ready,
            MatchStatus::Lobby,
            MatchStatus::InProgress,
            MatchStatus::InProgress,
        ]
    );

    Ok(())
}

/// The device waiting in the lobby has already armed its delayed gameplay
/// entry when the opponent cancels; the cancellation must win.
#[tokio::test]
async fn test_lobby_cancel_aborts_scheduled_entry() -> Result<(), AppError> {
    let state = test_state::test_state().await?;
    let players = factory::two_players(&state).await?;
    let mut rx_a = players.api_a.subscribe();

    let ready = factory::accepted_match(&players, GameType::X01_501).await?;
    let lobby = players.api_a.join_match(ready.id).await?;
    assert_eq!(lobby.status, MatchStatus::Lobby);

    // Drain alice's own echoes up to the lobby row.
    for _ in 0..3 {
        rx_a.recv()
            .await
            .map_err(|e| AppError::internal(format!("feed closed: {e}")))?;
    }

    let mut session = MatchSession::new(players.alice.id, lobby);
    let entry = session.schedule_gameplay_entry();

    players.api_b.cancel_match(ready.id).await?;
    let change = rx_a
        .recv()
        .await
        .map_err(|e| AppError::internal(format!("feed closed: {e}")))?;
    let actions = session.apply(change.row);
    assert!(
        actions.contains(&UiAction::MatchOver(MatchStatus::Cancelled)),
        "cancellation surfaces as MatchOver, got {actions:?}"
    );

    let guard = NavigationGuard::new();
    let outcome = entry.fire_after(Duration::from_millis(5), &guard).await;
    assert_eq!(outcome, EntryOutcome::Aborted);
    assert!(
        !guard.is_navigated(ready.id),
        "an aborted entry must not consume the navigation guard"
    );

    Ok(())
}

/// A session that missed events while disconnected catches up from one
/// authoritative fetch: reveal, scores and turn arrive in display order.
#[tokio::test]
async fn test_reconnect_resync_catches_up() -> Result<(), AppError> {
    let state = test_state::test_state().await?;
    let players = factory::two_players(&state).await?;
    let live = factory::started_match(&players, GameType::X01_501).await?;

    let mut session = MatchSession::new(players.bob.id, live.clone());
    assert!(!session.my_turn());

    // Bob is "offline" while alice throws.
    players.api_a.save_visit(live.id, &[20, 20, 20]).await?;

    let actions = session.resync(&players.api_b).await?;
    assert!(
        matches!(actions.first(), Some(UiAction::Reveal(v)) if v.score_after == 441),
        "reveal comes first, got {actions:?}"
    );
    assert!(actions.contains(&UiAction::ScoreUpdate {
        challenger_score: 441,
        receiver_score: 501,
    }));
    assert!(actions.contains(&UiAction::TurnChanged { my_turn: true }));
    assert_eq!(session.current().challenger_score, 441);
    assert!(session.my_turn());

    Ok(())
}

/// An out-of-turn submission resolves silently into a resync.
#[tokio::test]
async fn test_out_of_turn_submission_resyncs_silently() -> Result<(), AppError> {
    let state = test_state::test_state().await?;
    let players = factory::two_players(&state).await?;
    let live = factory::started_match(&players, GameType::X01_501).await?;

    // Bob's device believes it is his turn; the server disagrees.
    let mut stale = live.clone();
    stale.current_player_id = Some(players.bob.id);
    let mut session = MatchSession::new(players.bob.id, stale);
    assert!(session.my_turn());

    let outcome = session.submit_visit(&players.api_b, &[20, 20, 20]).await?;
    assert_eq!(outcome, SubmitOutcome::Resynced);
    assert!(!session.my_turn(), "resync corrected the turn view");

    let row = players.api_a.fetch_match(live.id).await?;
    assert_eq!(row.challenger_score, 501);
    assert_eq!(row.receiver_score, 501, "nothing was scored");

    Ok(())
}

/// Push delivery may repeat a status event; the tracker drops the repeat
/// before the session or the navigation guard ever sees it, while fresh
/// statuses keep flowing.
#[tokio::test]
async fn test_repeated_status_push_is_filtered() -> Result<(), AppError> {
    let state = test_state::test_state().await?;
    let players = factory::two_players(&state).await?;
    let mut rx_b = players.api_b.subscribe();

    let sent = players
        .api_a
        .create_challenge(players.bob.id, GameType::X01_501, "BEST_OF_1")
        .await?;
    players.api_b.accept_challenge(sent.id).await?;

    let tracker = StatusTracker::new();
    let mut last = None;
    for _ in 0..2 {
        let change = rx_b
            .recv()
            .await
            .map_err(|e| AppError::internal(format!("feed closed: {e}")))?;
        assert!(
            tracker.observe(change.match_id, change.row.status),
            "first delivery of each status must pass the filter"
        );
        last = Some(change);
    }

    // A push retry redelivers the Ready row: dropped before any side effect.
    let retry = last.ok_or_else(|| AppError::internal("no change received".to_string()))?;
    assert_eq!(retry.row.status, MatchStatus::Ready);
    assert!(!tracker.observe(retry.match_id, retry.row.status));

    // The next genuine transition still gets through.
    players.api_a.join_match(sent.id).await?;
    let lobby = rx_b
        .recv()
        .await
        .map_err(|e| AppError::internal(format!("feed closed: {e}")))?;
    assert!(tracker.observe(lobby.match_id, lobby.row.status));

    Ok(())
}

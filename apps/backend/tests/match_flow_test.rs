mod common;
mod support;

use backend::client::api::MatchApi;
use backend::entities::match_locks::LockStatus;
use backend::entities::matches::{GameType, MatchStatus};
use backend::error::AppError;
use backend::repos::locks;
use std::collections::HashSet;
use support::{factory, test_state};

/// The full handshake and the first two visits of a 501 match:
/// challenge -> accept -> first join (Lobby) -> second join (InProgress,
/// challenger to throw) -> challenger visit -> receiver visit.
#[tokio::test]
async fn test_full_match_flow_through_two_visits() -> Result<(), AppError> {
    let state = test_state::test_state().await?;
    let players = factory::two_players(&state).await?;

    // Challenge
    let sent = players
        .api_a
        .create_challenge(players.bob.id, GameType::X01_501, "BEST_OF_1")
        .await?;
    assert_eq!(sent.status, MatchStatus::Sent);
    assert_eq!(sent.challenger_id, players.alice.id);
    assert_eq!(sent.receiver_id, players.bob.id);
    assert_eq!(sent.challenger_score, 501);
    assert_eq!(sent.receiver_score, 501);
    assert_eq!(sent.current_player_id, None);
    assert!(sent.join_window_expires_at.is_none());
    assert!(
        sent.challenge_expires_at > sent.created_at,
        "challenge deadline should be in the future"
    );
    assert!(
        locks::list_all(&state.db).await?.is_empty(),
        "no locks before acceptance"
    );

    // Accept
    let ready = players.api_b.accept_challenge(sent.id).await?;
    assert_eq!(ready.status, MatchStatus::Ready);
    assert!(
        ready.join_window_expires_at.is_some(),
        "accepting opens the join window"
    );
    assert_eq!(ready.current_player_id, None);

    let held = locks::list_all(&state.db).await?;
    assert_eq!(held.len(), 2, "acceptance locks both participants");
    assert!(held.iter().all(|l| l.match_id == sent.id));
    assert!(held.iter().all(|l| l.status == LockStatus::Accepted));
    assert!(held.iter().any(|l| l.user_id == players.alice.id));
    assert!(held.iter().any(|l| l.user_id == players.bob.id));

    // First join - lobby
    let lobby = players.api_a.join_match(sent.id).await?;
    assert_eq!(lobby.status, MatchStatus::Lobby);
    assert_eq!(lobby.current_player_id, None);
    assert!(players.api_a.has_joined(sent.id).await?);
    assert!(!players.api_b.has_joined(sent.id).await?);

    // Second join - gameplay starts, challenger throws first
    let live = players.api_b.join_match(sent.id).await?;
    assert_eq!(live.status, MatchStatus::InProgress);
    assert_eq!(live.current_player_id, Some(players.alice.id));
    assert!(live.started_at.is_some());
    assert_eq!(live.turn_index_in_leg, 0);

    let held = locks::list_all(&state.db).await?;
    assert_eq!(held.len(), 2);
    assert!(
        held.iter().all(|l| l.status == LockStatus::InProgress),
        "gameplay start upgrades both locks"
    );

    // Challenger's visit
    let after_a = players.api_a.save_visit(sent.id, &[20, 20, 20]).await?;
    assert_eq!(after_a.challenger_score, 441);
    assert_eq!(after_a.receiver_score, 501);
    assert_eq!(after_a.current_player_id, Some(players.bob.id));
    assert_eq!(after_a.turn_index_in_leg, 1);
    let visit = after_a
        .last_visit
        .as_ref()
        .ok_or_else(|| AppError::internal("visit payload missing"))?;
    assert_eq!(visit.player_id, players.alice.id);
    assert_eq!(visit.darts, vec![20, 20, 20]);
    assert_eq!(visit.score_before, 501);
    assert_eq!(visit.score_after, 441);

    // Receiver's visit
    let after_b = players.api_b.save_visit(sent.id, &[19, 19, 19]).await?;
    assert_eq!(after_b.challenger_score, 441);
    assert_eq!(after_b.receiver_score, 444);
    assert_eq!(after_b.current_player_id, Some(players.alice.id));
    assert_eq!(after_b.turn_index_in_leg, 2);

    Ok(())
}

/// Listing reflects every lifecycle step for both participants.
#[tokio::test]
async fn test_listing_visible_to_both_participants() -> Result<(), AppError> {
    let state = test_state::test_state().await?;
    let players = factory::two_players(&state).await?;

    let sent = players
        .api_a
        .create_challenge(players.bob.id, GameType::X01_301, "BEST_OF_1")
        .await?;

    let mine = players.api_a.list_matches().await?;
    let theirs = players.api_b.list_matches().await?;
    assert_eq!(mine.len(), 1);
    assert_eq!(theirs.len(), 1);
    assert_eq!(mine[0].id, sent.id);
    assert_eq!(theirs[0].id, sent.id);

    // A third user sees nothing.
    let carol = factory::seed_user(&state, "test|carol", "carol").await?;
    let api_c = backend::client::api::LocalApi::new(state.clone(), carol.id);
    assert!(api_c.list_matches().await?.is_empty());

    Ok(())
}

/// Near-simultaneous joins from both devices resolve cleanly: one lands in
/// Lobby, the other starts gameplay, and the match ends up InProgress with
/// the challenger to throw.
#[tokio::test]
async fn test_simultaneous_joins_resolve() -> Result<(), AppError> {
    let state = test_state::test_state().await?;
    let players = factory::two_players(&state).await?;
    let ready = factory::accepted_match(&players, GameType::X01_501).await?;

    let join_a = players.api_a.join_match(ready.id);
    let join_b = players.api_b.join_match(ready.id);
    let (a, b) = tokio::join!(join_a, join_b);
    let a = a?;
    let b = b?;

    let statuses: HashSet<MatchStatus> = [a.status, b.status].into_iter().collect();
    assert!(statuses.contains(&MatchStatus::InProgress));

    let row = players.api_a.fetch_match(ready.id).await?;
    assert_eq!(row.status, MatchStatus::InProgress);
    assert_eq!(row.current_player_id, Some(players.alice.id));
    assert!(players.api_a.has_joined(ready.id).await?);
    assert!(players.api_b.has_joined(ready.id).await?);

    Ok(())
}

/// The joined probe is answerable by participants only.
#[tokio::test]
async fn test_joined_probe_requires_participation() -> Result<(), AppError> {
    let state = test_state::test_state().await?;
    let players = factory::two_players(&state).await?;
    let m = factory::accepted_match(&players, GameType::X01_501).await?;

    let carol = factory::seed_user(&state, "test|carol", "carol").await?;
    let api_c = backend::client::api::LocalApi::new(state.clone(), carol.id);
    common::assert_err_code(
        api_c.has_joined(m.id).await,
        backend::errors::ErrorCode::NotAParticipant,
    );
    Ok(())
}

/// A seeded profile reads back with the same sub and username it was
/// inserted with.
#[tokio::test]
async fn test_seeded_user_roundtrips_profile_fields() -> Result<(), AppError> {
    let state = test_state::test_state().await?;
    let dana = factory::seed_user(&state, "test|dana", "dana").await?;

    let loaded = backend::repos::users::require_user(&state.db, dana.id).await?;
    assert_eq!(loaded.sub, "test|dana");
    assert_eq!(loaded.username, "dana");
    Ok(())
}

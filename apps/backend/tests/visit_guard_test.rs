mod common;
mod support;

use backend::client::api::{LocalApi, MatchApi};
use backend::entities::matches::GameType;
use backend::error::AppError;
use backend::errors::ErrorCode;
use support::{factory, test_state};

/// A visit from the player whose turn it is not leaves the row untouched.
#[tokio::test]
async fn test_out_of_turn_visit_is_rejected() -> Result<(), AppError> {
    let state = test_state::test_state().await?;
    let players = factory::two_players(&state).await?;
    let live = factory::started_match(&players, GameType::X01_501).await?;

    // It is alice's turn; bob throws anyway.
    common::assert_err_code(
        players.api_b.save_visit(live.id, &[20, 20, 20]).await,
        ErrorCode::OutOfTurn,
    );

    let row = players.api_a.fetch_match(live.id).await?;
    assert_eq!(row.challenger_score, 501);
    assert_eq!(row.receiver_score, 501);
    assert_eq!(row.turn_index_in_leg, 0);
    assert_eq!(row.current_player_id, Some(players.alice.id));

    Ok(())
}

/// Two near-simultaneous submissions of the same visit: exactly one lands,
/// the echo advances the turn exactly once.
#[tokio::test]
async fn test_duplicate_visit_race_applies_once() -> Result<(), AppError> {
    let state = test_state::test_state().await?;
    let players = factory::two_players(&state).await?;
    let live = factory::started_match(&players, GameType::X01_501).await?;

    let first = players.api_a.save_visit(live.id, &[20, 20, 20]);
    let second = players.api_a.save_visit(live.id, &[20, 20, 20]);
    let (r1, r2) = tokio::join!(first, second);

    let successes = [&r1, &r2].iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1, "exactly one of the duplicates may land");
    for r in [r1, r2] {
        if let Err(err) = r {
            assert_eq!(err.code(), ErrorCode::OutOfTurn, "loser resolves as out of turn");
        }
    }

    let row = players.api_a.fetch_match(live.id).await?;
    assert_eq!(row.challenger_score, 441, "the visit was applied once");
    assert_eq!(row.turn_index_in_leg, 1);
    assert_eq!(row.current_player_id, Some(players.bob.id));

    Ok(())
}

/// Dart payload validation: count and per-dart achievability.
#[tokio::test]
async fn test_visit_payload_validation() -> Result<(), AppError> {
    let state = test_state::test_state().await?;
    let players = factory::two_players(&state).await?;
    let live = factory::started_match(&players, GameType::X01_501).await?;

    common::assert_err_code(
        players.api_a.save_visit(live.id, &[]).await,
        ErrorCode::InvalidDartCount,
    );
    common::assert_err_code(
        players.api_a.save_visit(live.id, &[20, 20, 20, 20]).await,
        ErrorCode::InvalidDartCount,
    );
    // 59 cannot be scored with a single dart.
    common::assert_err_code(
        players.api_a.save_visit(live.id, &[59]).await,
        ErrorCode::InvalidDartValue,
    );

    // The row is untouched by any of the rejections.
    let row = players.api_a.fetch_match(live.id).await?;
    assert_eq!(row.turn_index_in_leg, 0);
    assert_eq!(row.challenger_score, 501);

    Ok(())
}

/// Only participants may submit visits.
#[tokio::test]
async fn test_visit_from_outsider_is_rejected() -> Result<(), AppError> {
    let state = test_state::test_state().await?;
    let players = factory::two_players(&state).await?;
    let live = factory::started_match(&players, GameType::X01_501).await?;

    let carol = factory::seed_user(&state, "test|carol", "carol").await?;
    let api_c = LocalApi::new(state.clone(), carol.id);
    common::assert_err_code(
        api_c.save_visit(live.id, &[20]).await,
        ErrorCode::NotAParticipant,
    );
    Ok(())
}

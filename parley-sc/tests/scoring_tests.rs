//! Bias/completeness scoring tests

mod helpers;

use helpers::*;
use parley_sc::services::scoring;

#[tokio::test]
async fn deviant_rating_draws_capped_penalty_against_the_rater() {
    let (state, _dir) = test_state().await;
    let session = five_way_session(&state, 2).await;
    submit_five_way(&state, &session).await;

    // dave's received scores are [2, 2, 2, 8]: median 2
    let median: f64 = sqlx::query_scalar(
        "SELECT DISTINCT median_score FROM score_entries WHERE session_id = ? AND student_id = 'dave'",
    )
    .bind(&session)
    .fetch_one(&state.db)
    .await
    .unwrap();
    assert_eq!(median, 2.0);

    // alice gave the 8: deviation 6, penalty capped at 3, charged to alice
    let (deviation, penalty, biased): (f64, f64, bool) = sqlx::query_as(
        "SELECT deviation, penalty_points, is_biased FROM score_entries
         WHERE session_id = ? AND student_id = 'dave' AND responder_id = 'alice'",
    )
    .bind(&session)
    .fetch_one(&state.db)
    .await
    .unwrap();
    assert_eq!(deviation, 6.0);
    assert_eq!(penalty, 3.0);
    assert!(biased);

    // bob gave a consensus 2: zero deviation, no penalty
    let (deviation, penalty): (f64, f64) = sqlx::query_as(
        "SELECT deviation, penalty_points FROM score_entries
         WHERE session_id = ? AND student_id = 'dave' AND responder_id = 'bob'",
    )
    .bind(&session)
    .fetch_one(&state.db)
    .await
    .unwrap();
    assert_eq!(deviation, 0.0);
    assert_eq!(penalty, 0.0);
}

#[tokio::test]
async fn every_entry_is_marked_processed() {
    let (state, _dir) = test_state().await;
    let session = five_way_session(&state, 2).await;
    submit_five_way(&state, &session).await;

    let unprocessed: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM score_entries WHERE session_id = ? AND (penalty_calculated = 0 OR deviation IS NULL)",
    )
    .bind(&session)
    .fetch_one(&state.db)
    .await
    .unwrap();
    assert_eq!(unprocessed, 0);

    assert_eq!(session_status(&state.db, &session).await, "completed");
}

#[tokio::test]
async fn scoring_waits_for_every_completion_mark() {
    let (state, _dir) = test_state().await;
    let session = five_way_session(&state, 2).await;

    // Four of five have submitted
    for (responder, submission) in five_way_matrix().into_iter().take(4) {
        parley_sc::services::ranking::submit_rankings(
            &state.db,
            &state.event_bus,
            &session,
            responder,
            &submission,
        )
        .await
        .unwrap();
    }

    let ran = scoring::finalize_session(&state.db, &state.event_bus, &session)
        .await
        .unwrap();
    assert!(!ran, "scoring must not run before all marks are present");
    assert_eq!(session_status(&state.db, &session).await, "active");
}

#[tokio::test]
async fn finalize_is_idempotent_under_repeat_invocation() {
    let (state, _dir) = test_state().await;
    let session = five_way_session(&state, 2).await;
    submit_five_way(&state, &session).await;

    // Already finalized by the last submission
    let promotions_before: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM promotions WHERE session_id = ?")
            .bind(&session)
            .fetch_one(&state.db)
            .await
            .unwrap();
    assert_eq!(promotions_before, 3);

    let alice_level_before = student_level(&state.db, "alice").await;

    let ran = scoring::finalize_session(&state.db, &state.event_bus, &session)
        .await
        .unwrap();
    assert!(!ran, "second invocation must be a no-op");

    let promotions_after: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM promotions WHERE session_id = ?")
            .bind(&session)
            .fetch_one(&state.db)
            .await
            .unwrap();
    assert_eq!(promotions_after, 3);
    assert_eq!(student_level(&state.db, "alice").await, alice_level_before);
}

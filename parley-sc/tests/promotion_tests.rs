//! Promotion engine and session retirement tests

mod helpers;

use chrono::Utc;
use helpers::*;
use parley_sc::services::results;

#[tokio::test]
async fn top_three_rise_exactly_one_level() {
    let (state, _dir) = test_state().await;
    let session = five_way_session(&state, 2).await;
    submit_five_way(&state, &session).await;

    // Final scores: alice 29, bob 22, carol 18, dave 14, erin 12
    assert_eq!(student_level(&state.db, "alice").await, 3);
    assert_eq!(student_level(&state.db, "bob").await, 3);
    assert_eq!(student_level(&state.db, "carol").await, 3);
    assert_eq!(student_level(&state.db, "dave").await, 2);
    assert_eq!(student_level(&state.db, "erin").await, 2);

    let rows: Vec<(String, i64, i64, i64)> = sqlx::query_as(
        "SELECT student_id, old_level, new_level, rank FROM promotions WHERE session_id = ? ORDER BY rank",
    )
    .bind(&session)
    .fetch_all(&state.db)
    .await
    .unwrap();

    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0], ("alice".to_string(), 2, 3, 1));
    assert_eq!(rows[1], ("bob".to_string(), 2, 3, 2));
    assert_eq!(rows[2], ("carol".to_string(), 2, 3, 3));
}

#[tokio::test]
async fn retirement_completes_session_and_clears_side_state() {
    let (state, _dir) = test_state().await;
    let session = five_way_session(&state, 2).await;

    // A lingering booking pointer and a lobby ready mark
    sqlx::query("UPDATE students SET current_booking = ? WHERE id = 'alice'")
        .bind(&session)
        .execute(&state.db)
        .await
        .unwrap();
    sqlx::query("INSERT INTO ready_marks (session_id, student_id, is_ready, updated_at) VALUES (?, 'alice', 1, ?)")
        .bind(&session)
        .bind(Utc::now())
        .execute(&state.db)
        .await
        .unwrap();

    submit_five_way(&state, &session).await;

    assert_eq!(session_status(&state.db, &session).await, "completed");

    let pointer: Option<String> =
        sqlx::query_scalar("SELECT current_booking FROM students WHERE id = 'alice'")
            .fetch_one(&state.db)
            .await
            .unwrap();
    assert!(pointer.is_none());

    let ready_rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM ready_marks WHERE session_id = ?")
        .bind(&session)
        .fetch_one(&state.db)
        .await
        .unwrap();
    assert_eq!(ready_rows, 0);
}

#[tokio::test]
async fn max_level_winner_is_skipped_not_substituted() {
    let (state, _dir) = test_state().await;
    let session = five_way_session(&state, 4).await;

    // alice was promoted elsewhere before this session's scoring ran
    sqlx::query("UPDATE students SET level = 5 WHERE id = 'alice'")
        .execute(&state.db)
        .await
        .unwrap();

    submit_five_way(&state, &session).await;

    // alice tops the ranking but is already at the cap
    assert_eq!(student_level(&state.db, "alice").await, 5);
    assert_eq!(student_level(&state.db, "bob").await, 5);
    assert_eq!(student_level(&state.db, "carol").await, 5);
    // dave placed fourth: the vacated slot is not passed down
    assert_eq!(student_level(&state.db, "dave").await, 4);
    assert_eq!(student_level(&state.db, "erin").await, 4);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM promotions WHERE session_id = ?")
        .bind(&session)
        .fetch_one(&state.db)
        .await
        .unwrap();
    assert_eq!(count, 2);
}

#[tokio::test]
async fn nobody_is_promoted_past_the_cap() {
    let (state, _dir) = test_state().await;
    let session = five_way_session(&state, 5).await;
    submit_five_way(&state, &session).await;

    for name in FIVE {
        assert_eq!(student_level(&state.db, name).await, 5);
    }

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM promotions WHERE session_id = ?")
        .bind(&session)
        .fetch_one(&state.db)
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn results_rank_by_canonical_final_score() {
    let (state, _dir) = test_state().await;
    let session = five_way_session(&state, 2).await;
    submit_five_way(&state, &session).await;

    let rows = results::session_results(&state.db, &state.event_bus, &session, "alice")
        .await
        .unwrap();

    let order: Vec<&str> = rows.iter().map(|r| r.student_id.as_str()).collect();
    assert_eq!(order, ["alice", "bob", "carol", "dave", "erin"]);

    assert_eq!(rows[0].total_score, 32.0);
    assert_eq!(rows[0].bias_penalty, 3.0);
    assert_eq!(rows[0].final_score, 29.0);
    assert_eq!(rows[4].final_score, 12.0);
}

#[tokio::test]
async fn progression_reports_promotion_and_rank() {
    let (state, _dir) = test_state().await;
    let session = five_way_session(&state, 2).await;
    submit_five_way(&state, &session).await;

    let alice = results::progression_status(&state.db, &state.event_bus, &session, "alice")
        .await
        .unwrap();
    assert!(alice.promoted);
    assert_eq!(alice.old_level, 2);
    assert_eq!(alice.new_level, 3);
    assert_eq!(alice.rank, 1);
    assert!(alice.all_completed);

    let erin = results::progression_status(&state.db, &state.event_bus, &session, "erin")
        .await
        .unwrap();
    assert!(!erin.promoted);
    assert_eq!(erin.old_level, 2);
    assert_eq!(erin.new_level, 2);
    assert_eq!(erin.rank, 5);
}

#[tokio::test]
async fn non_participant_cannot_read_results() {
    let (state, _dir) = test_state().await;
    let session = five_way_session(&state, 2).await;
    seed_student(&state.db, "mallory", "Mallory", 2).await;

    let result =
        results::session_results(&state.db, &state.event_bus, &session, "mallory").await;
    assert!(matches!(result, Err(parley_common::Error::Forbidden(_))));
}

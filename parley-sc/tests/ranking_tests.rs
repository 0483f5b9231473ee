//! Ranking collection tests

mod helpers;

use helpers::*;
use parley_common::Error;
use parley_sc::services::{admission, ranking, tokens};

/// Four participants joined via one token; two active questions at level 1
async fn four_participant_session(state: &parley_sc::AppState) -> String {
    seed_venue(&state.db, "v1", "North Hall", 10, 1).await;
    seed_question(&state.db, "q1", 1, 1.0, 1).await;
    seed_question(&state.db, "q2", 1, 1.0, 2).await;

    let token = tokens::issue_token(&state.db, "v1", 8, 60).await.unwrap();

    let mut session_id = String::new();
    for name in ["alice", "bob", "carol", "dave"] {
        seed_student(&state.db, name, name, 1).await;
        session_id = admission::join_by_token(
            &state.db,
            &state.event_bus,
            &state.config,
            name,
            &token.token_data,
        )
        .await
        .unwrap();
    }
    session_id
}

#[tokio::test]
async fn complete_submission_records_weighted_scores() {
    let (state, _dir) = test_state().await;
    let session = four_participant_session(&state).await;

    let outcome = ranking::submit_rankings(
        &state.db,
        &state.event_bus,
        &session,
        "alice",
        &responses(&[(1, &[(1, "bob"), (2, "carol"), (3, "dave")])]),
    )
    .await
    .unwrap();

    assert!(!outcome.completed, "one of two questions is not completion");
    assert_eq!(outcome.questions_answered, 1);
    assert_eq!(outcome.total_questions, 2);
    assert_eq!(outcome.incomplete_penalty, 0.0);

    // Rank 1 earns 4 points at weight 1.0
    let bob_score: f64 = sqlx::query_scalar(
        "SELECT weighted_score FROM score_entries WHERE session_id = ? AND student_id = 'bob' AND responder_id = 'alice'",
    )
    .bind(&session)
    .fetch_one(&state.db)
    .await
    .unwrap();
    assert_eq!(bob_score, 4.0);

    let dave_score: f64 = sqlx::query_scalar(
        "SELECT weighted_score FROM score_entries WHERE session_id = ? AND student_id = 'dave' AND responder_id = 'alice'",
    )
    .bind(&session)
    .fetch_one(&state.db)
    .await
    .unwrap();
    assert_eq!(dave_score, 2.0);
}

#[tokio::test]
async fn short_submission_incurs_one_penalty_unit() {
    let (state, _dir) = test_state().await;
    let session = four_participant_session(&state).await;

    // Four participants -> three expected ranks; only two submitted
    let outcome = ranking::submit_rankings(
        &state.db,
        &state.event_bus,
        &session,
        "alice",
        &responses(&[(1, &[(1, "bob"), (2, "carol")])]),
    )
    .await
    .unwrap();

    assert_eq!(outcome.incomplete_penalty, 1.0);
    assert_eq!(outcome.incomplete_questions, 1);

    let penalty: f64 = sqlx::query_scalar(
        "SELECT SUM(penalty_points) FROM score_entries WHERE session_id = ? AND responder_id = 'alice' AND question_id = 'q1'",
    )
    .bind(&session)
    .fetch_one(&state.db)
    .await
    .unwrap();
    // One unit spread across both of the question's entries
    assert_eq!(penalty, 2.0);
}

#[tokio::test]
async fn gapped_rank_set_is_deficient_even_at_full_length() {
    let (state, _dir) = test_state().await;
    seed_venue(&state.db, "v1", "North Hall", 10, 1).await;
    seed_question(&state.db, "q1", 1, 1.0, 1).await;

    let token = tokens::issue_token(&state.db, "v1", 8, 60).await.unwrap();
    let mut session = String::new();
    for name in ["alice", "bob", "carol"] {
        seed_student(&state.db, name, name, 1).await;
        session = admission::join_by_token(
            &state.db,
            &state.event_bus,
            &state.config,
            name,
            &token.token_data,
        )
        .await
        .unwrap();
    }

    // Three participants -> two expected ranks; {2, 3} has the right length
    // but misses rank 1
    let outcome = ranking::submit_rankings(
        &state.db,
        &state.event_bus,
        &session,
        "alice",
        &responses(&[(1, &[(2, "bob"), (3, "carol")])]),
    )
    .await
    .unwrap();

    assert!(outcome.incomplete_penalty >= 1.0);
}

#[tokio::test]
async fn resubmission_supersedes_previous_rankings() {
    let (state, _dir) = test_state().await;
    let session = four_participant_session(&state).await;

    ranking::submit_rankings(
        &state.db,
        &state.event_bus,
        &session,
        "alice",
        &responses(&[(1, &[(1, "bob"), (2, "carol"), (3, "dave")])]),
    )
    .await
    .unwrap();

    ranking::submit_rankings(
        &state.db,
        &state.event_bus,
        &session,
        "alice",
        &responses(&[(1, &[(1, "dave"), (2, "carol"), (3, "bob")])]),
    )
    .await
    .unwrap();

    // Still exactly three entries for the question; the latest ranking wins
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM score_entries WHERE session_id = ? AND responder_id = 'alice' AND question_id = 'q1'",
    )
    .bind(&session)
    .fetch_one(&state.db)
    .await
    .unwrap();
    assert_eq!(count, 3);

    let dave_rank: i64 = sqlx::query_scalar(
        "SELECT rank FROM score_entries WHERE session_id = ? AND student_id = 'dave' AND responder_id = 'alice'",
    )
    .bind(&session)
    .fetch_one(&state.db)
    .await
    .unwrap();
    assert_eq!(dave_rank, 1);
}

#[tokio::test]
async fn completion_is_all_or_nothing() {
    let (state, _dir) = test_state().await;
    let session = four_participant_session(&state).await;

    let outcome = ranking::submit_rankings(
        &state.db,
        &state.event_bus,
        &session,
        "alice",
        &responses(&[(1, &[(1, "bob"), (2, "carol"), (3, "dave")])]),
    )
    .await
    .unwrap();
    assert!(!outcome.completed);

    let marked: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM completions WHERE session_id = ? AND student_id = 'alice')",
    )
    .bind(&session)
    .fetch_one(&state.db)
    .await
    .unwrap();
    assert!(!marked, "answering a subset never partially marks completion");

    let outcome = ranking::submit_rankings(
        &state.db,
        &state.event_bus,
        &session,
        "alice",
        &responses(&[(2, &[(1, "carol"), (2, "bob"), (3, "dave")])]),
    )
    .await
    .unwrap();
    assert!(outcome.completed);

    let marked: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM completions WHERE session_id = ? AND student_id = 'alice')",
    )
    .bind(&session)
    .fetch_one(&state.db)
    .await
    .unwrap();
    assert!(marked);
}

#[tokio::test]
async fn non_participant_cannot_submit() {
    let (state, _dir) = test_state().await;
    let session = four_participant_session(&state).await;
    seed_student(&state.db, "mallory", "Mallory", 1).await;

    let result = ranking::submit_rankings(
        &state.db,
        &state.event_bus,
        &session,
        "mallory",
        &responses(&[(1, &[(1, "bob"), (2, "carol"), (3, "dave")])]),
    )
    .await;

    assert!(matches!(result, Err(Error::Forbidden(_))));
}

//! Shared test fixtures
//!
//! Each test gets its own database file in a temp directory so concurrent
//! writers exercise the real pool.

#![allow(dead_code)]

use parley_common::config::ServiceConfig;
use parley_common::events::EventBus;
use parley_sc::AppState;
use sqlx::SqlitePool;
use std::collections::BTreeMap;
use tempfile::TempDir;

pub async fn test_state() -> (AppState, TempDir) {
    let dir = TempDir::new().unwrap();
    let pool = parley_common::db::init_database(&dir.path().join("parley.db"))
        .await
        .expect("database init");

    let state = AppState::new(pool, EventBus::new(64), ServiceConfig::default());
    (state, dir)
}

pub async fn seed_venue(pool: &SqlitePool, id: &str, name: &str, capacity: i64, level: i64) {
    sqlx::query("INSERT INTO venues (id, name, capacity, level, is_active) VALUES (?, ?, ?, ?, 1)")
        .bind(id)
        .bind(name)
        .bind(capacity)
        .bind(level)
        .execute(pool)
        .await
        .unwrap();
}

pub async fn seed_student(pool: &SqlitePool, id: &str, name: &str, level: i64) {
    sqlx::query("INSERT INTO students (id, full_name, level, is_active) VALUES (?, ?, ?, 1)")
        .bind(id)
        .bind(name)
        .bind(level)
        .execute(pool)
        .await
        .unwrap();
}

pub async fn seed_question(pool: &SqlitePool, id: &str, level: i64, weight: f64, order: i64) {
    sqlx::query(
        "INSERT INTO questions (id, level, prompt, weight, display_order, is_active) VALUES (?, ?, ?, ?, ?, 1)",
    )
    .bind(id)
    .bind(level)
    .bind(format!("Question {}", order))
    .bind(weight)
    .bind(order)
    .execute(pool)
    .await
    .unwrap();
}

pub async fn student_level(pool: &SqlitePool, id: &str) -> i64 {
    sqlx::query_scalar("SELECT level FROM students WHERE id = ?")
        .bind(id)
        .fetch_one(pool)
        .await
        .unwrap()
}

pub async fn token_usage(pool: &SqlitePool, token_id: &str) -> i64 {
    sqlx::query_scalar("SELECT current_usage FROM access_tokens WHERE id = ?")
        .bind(token_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

pub async fn session_status(pool: &SqlitePool, session_id: &str) -> String {
    sqlx::query_scalar("SELECT status FROM sessions WHERE id = ?")
        .bind(session_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

pub async fn force_session_status(pool: &SqlitePool, session_id: &str, status: &str) {
    sqlx::query("UPDATE sessions SET status = ? WHERE id = ?")
        .bind(status)
        .bind(session_id)
        .execute(pool)
        .await
        .unwrap();
}

/// The five-way scoring fixture: one level-matched venue, one question at
/// weight 2.0, five students admitted through a single token.
///
/// With the submission matrix below, dave receives scores [2, 2, 2, 8]
/// (median 2), so alice's rank-1 rating of dave deviates by 6 and draws the
/// capped bias penalty of 3. Final scores come out alice 29, bob 22,
/// carol 18, dave 14, erin 12.
pub const FIVE: [&str; 5] = ["alice", "bob", "carol", "dave", "erin"];

pub async fn five_way_session(state: &AppState, level: i64) -> String {
    use parley_sc::services::{admission, tokens};

    seed_venue(&state.db, "v1", "North Hall", 10, level).await;
    seed_question(&state.db, "q1", level, 2.0, 1).await;

    let token = tokens::issue_token(&state.db, "v1", 8, 60).await.unwrap();

    let mut session_id = String::new();
    for name in FIVE {
        seed_student(&state.db, name, name, level).await;
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

/// Submission matrix for the five-way fixture: everyone agrees on the order
/// alice > bob > carol > erin > dave, except alice who puts dave first
pub fn five_way_matrix() -> Vec<(&'static str, BTreeMap<i64, BTreeMap<i64, String>>)> {
    vec![
        (
            "alice",
            responses(&[(1, &[(1, "dave"), (2, "bob"), (3, "carol"), (4, "erin")])]),
        ),
        (
            "bob",
            responses(&[(1, &[(1, "alice"), (2, "carol"), (3, "erin"), (4, "dave")])]),
        ),
        (
            "carol",
            responses(&[(1, &[(1, "alice"), (2, "bob"), (3, "erin"), (4, "dave")])]),
        ),
        (
            "erin",
            responses(&[(1, &[(1, "alice"), (2, "bob"), (3, "carol"), (4, "dave")])]),
        ),
        (
            "dave",
            responses(&[(1, &[(1, "alice"), (2, "bob"), (3, "carol"), (4, "erin")])]),
        ),
    ]
}

/// Run every five-way submission; the last one triggers scoring
pub async fn submit_five_way(state: &AppState, session_id: &str) {
    use parley_sc::services::ranking;

    for (responder, submission) in five_way_matrix() {
        ranking::submit_rankings(
            &state.db,
            &state.event_bus,
            session_id,
            responder,
            &submission,
        )
        .await
        .unwrap();
    }
}

/// Build one question's rank map: rank position -> ranked student id
pub fn ranks(pairs: &[(i64, &str)]) -> BTreeMap<i64, String> {
    pairs
        .iter()
        .map(|(rank, student)| (*rank, student.to_string()))
        .collect()
}

/// Build a whole submission: question number -> rank map
pub fn responses(
    per_question: &[(i64, &[(i64, &str)])],
) -> BTreeMap<i64, BTreeMap<i64, String>> {
    per_question
        .iter()
        .map(|(qnum, pairs)| (*qnum, ranks(pairs)))
        .collect()
}

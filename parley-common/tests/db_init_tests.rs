//! Database initialization tests

use parley_common::db::{init_database, init_memory_database};
use tempfile::TempDir;

#[tokio::test]
async fn creates_database_file_and_schema() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("parley.db");

    let pool = init_database(&db_path).await.expect("init should succeed");
    assert!(db_path.exists());

    // Every core table exists
    for table in [
        "venues",
        "students",
        "access_tokens",
        "sessions",
        "participants",
        "questions",
        "rank_points",
        "score_entries",
        "completions",
        "promotions",
        "ready_marks",
    ] {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?",
        )
        .bind(table)
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(count, 1, "missing table {}", table);
    }
}

#[tokio::test]
async fn init_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("parley.db");

    let pool = init_database(&db_path).await.unwrap();
    drop(pool);

    // Second init over the same file must not fail or duplicate seed rows
    let pool = init_database(&db_path).await.unwrap();
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM rank_points WHERE level = 1")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 4);
}

#[tokio::test]
async fn seeds_default_rank_points() {
    let pool = init_memory_database().await.unwrap();

    // Rank 1 earns the most points at every level
    let points: f64 =
        sqlx::query_scalar("SELECT points FROM rank_points WHERE level = 3 AND rank = 1")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(points, 4.0);

    let points: f64 =
        sqlx::query_scalar("SELECT points FROM rank_points WHERE level = 3 AND rank = 4")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(points, 1.0);
}

#[tokio::test]
async fn foreign_keys_are_enforced() {
    let pool = init_memory_database().await.unwrap();

    let result = sqlx::query(
        "INSERT INTO sessions (id, venue_id, status, start_time, end_time, level, created_at)
         VALUES ('s1', 'missing-venue', 'pending', ?, ?, 1, ?)",
    )
    .bind(chrono::Utc::now())
    .bind(chrono::Utc::now())
    .bind(chrono::Utc::now())
    .execute(&pool)
    .await;

    assert!(result.is_err(), "insert with dangling venue_id should fail");
}

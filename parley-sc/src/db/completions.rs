//! Completion mark queries
//!
//! Presence of a row is the sole signal that a responder has answered every
//! active question of the session's level.

use chrono::{DateTime, Utc};
use parley_common::Result;
use sqlx::SqliteConnection;

pub async fn upsert(
    conn: &mut SqliteConnection,
    session_id: &str,
    student_id: &str,
    now: DateTime<Utc>,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO completions (session_id, student_id, completed_at)
        VALUES (?, ?, ?)
        ON CONFLICT (session_id, student_id) DO UPDATE SET completed_at = excluded.completed_at
        "#,
    )
    .bind(session_id)
    .bind(student_id)
    .bind(now)
    .execute(conn)
    .await?;

    Ok(())
}

pub async fn count(conn: &mut SqliteConnection, session_id: &str) -> Result<i64> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(DISTINCT student_id) FROM completions WHERE session_id = ?")
            .bind(session_id)
            .fetch_one(conn)
            .await?;

    Ok(count)
}

pub async fn exists(
    conn: &mut SqliteConnection,
    session_id: &str,
    student_id: &str,
) -> Result<bool> {
    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM completions WHERE session_id = ? AND student_id = ?)",
    )
    .bind(session_id)
    .bind(student_id)
    .fetch_one(conn)
    .await?;

    Ok(exists)
}

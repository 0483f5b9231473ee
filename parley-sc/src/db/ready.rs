//! Lobby ready-mark queries

use chrono::{DateTime, Utc};
use parley_common::Result;
use sqlx::SqliteConnection;

pub async fn upsert(
    conn: &mut SqliteConnection,
    session_id: &str,
    student_id: &str,
    is_ready: bool,
    now: DateTime<Utc>,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO ready_marks (session_id, student_id, is_ready, updated_at)
        VALUES (?, ?, ?, ?)
        ON CONFLICT (session_id, student_id) DO UPDATE SET
            is_ready = excluded.is_ready,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(session_id)
    .bind(student_id)
    .bind(is_ready)
    .bind(now)
    .execute(conn)
    .await?;

    Ok(())
}

/// (ready, total) non-dummy participant counts for the session
pub async fn counts(conn: &mut SqliteConnection, session_id: &str) -> Result<(i64, i64)> {
    let total: i64 = sqlx::query_scalar(
        "SELECT COUNT(DISTINCT student_id) FROM participants WHERE session_id = ? AND is_dummy = 0",
    )
    .bind(session_id)
    .fetch_one(&mut *conn)
    .await?;

    let ready: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(DISTINCT rm.student_id)
        FROM ready_marks rm
        JOIN participants p ON rm.session_id = p.session_id AND rm.student_id = p.student_id
        WHERE rm.session_id = ? AND rm.is_ready = 1 AND p.is_dummy = 0
        "#,
    )
    .bind(session_id)
    .fetch_one(conn)
    .await?;

    Ok((ready, total))
}

/// Drop every ready mark for a retired session
pub async fn purge(conn: &mut SqliteConnection, session_id: &str) -> Result<u64> {
    let result = sqlx::query("DELETE FROM ready_marks WHERE session_id = ?")
        .bind(session_id)
        .execute(conn)
        .await?;

    Ok(result.rows_affected())
}

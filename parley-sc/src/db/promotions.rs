//! Promotion record queries

use chrono::{DateTime, Utc};
use parley_common::db::Promotion;
use parley_common::Result;
use sqlx::SqliteConnection;

/// At most one promotion per (student, session); a recompute upserts
pub async fn upsert(conn: &mut SqliteConnection, promotion: &Promotion) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO promotions
            (id, student_id, session_id, old_level, new_level, rank, promoted_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT (student_id, session_id) DO UPDATE SET
            new_level = excluded.new_level,
            rank = excluded.rank,
            promoted_at = excluded.promoted_at
        "#,
    )
    .bind(&promotion.id)
    .bind(&promotion.student_id)
    .bind(&promotion.session_id)
    .bind(promotion.old_level)
    .bind(promotion.new_level)
    .bind(promotion.rank)
    .bind(promotion.promoted_at)
    .execute(conn)
    .await?;

    Ok(())
}

pub async fn find(
    conn: &mut SqliteConnection,
    student_id: &str,
    session_id: &str,
) -> Result<Option<Promotion>> {
    let promotion = sqlx::query_as::<_, Promotion>(
        r#"
        SELECT id, student_id, session_id, old_level, new_level, rank, promoted_at
        FROM promotions
        WHERE student_id = ? AND session_id = ?
        "#,
    )
    .bind(student_id)
    .bind(session_id)
    .fetch_optional(conn)
    .await?;

    Ok(promotion)
}

pub async fn count_for_session(conn: &mut SqliteConnection, session_id: &str) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM promotions WHERE session_id = ?")
        .bind(session_id)
        .fetch_one(conn)
        .await?;

    Ok(count)
}

pub fn new_row(
    student_id: &str,
    session_id: &str,
    old_level: i64,
    new_level: i64,
    rank: i64,
    now: DateTime<Utc>,
) -> Promotion {
    Promotion {
        id: uuid::Uuid::new_v4().to_string(),
        student_id: student_id.to_string(),
        session_id: session_id.to_string(),
        old_level,
        new_level,
        rank,
        promoted_at: now,
    }
}

//! Survey question queries
//!
//! Question administration is out of scope; rows are seeded by operators.

use parley_common::db::Question;
use parley_common::Result;
use sqlx::SqliteConnection;

/// Active questions for a level, in display order
pub async fn active_for_level(conn: &mut SqliteConnection, level: i64) -> Result<Vec<Question>> {
    let questions = sqlx::query_as::<_, Question>(
        r#"
        SELECT id, level, prompt, weight, display_order, is_active
        FROM questions
        WHERE level = ? AND is_active = 1
        ORDER BY display_order
        "#,
    )
    .bind(level)
    .fetch_all(conn)
    .await?;

    Ok(questions)
}

pub async fn count_active_for_level(conn: &mut SqliteConnection, level: i64) -> Result<i64> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM questions WHERE level = ? AND is_active = 1")
            .bind(level)
            .fetch_one(conn)
            .await?;

    Ok(count)
}

/// Configured base points for a rank at a level, if present
pub async fn rank_points(
    conn: &mut SqliteConnection,
    level: i64,
    rank: i64,
) -> Result<Option<f64>> {
    let points: Option<f64> =
        sqlx::query_scalar("SELECT points FROM rank_points WHERE level = ? AND rank = ?")
            .bind(level)
            .bind(rank)
            .fetch_optional(conn)
            .await?;

    Ok(points)
}

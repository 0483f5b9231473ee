//! Venue queries

use chrono::{DateTime, Utc};
use parley_common::db::Venue;
use parley_common::Result;
use sqlx::SqliteConnection;

pub async fn find(conn: &mut SqliteConnection, venue_id: &str) -> Result<Option<Venue>> {
    let venue = sqlx::query_as::<_, Venue>(
        "SELECT id, name, capacity, level, is_active FROM venues WHERE id = ?",
    )
    .bind(venue_id)
    .fetch_optional(conn)
    .await?;

    Ok(venue)
}

pub async fn list_active_by_level(conn: &mut SqliteConnection, level: i64) -> Result<Vec<Venue>> {
    let venues = sqlx::query_as::<_, Venue>(
        r#"
        SELECT id, name, capacity, level, is_active
        FROM venues
        WHERE level = ? AND is_active = 1
        ORDER BY name
        "#,
    )
    .bind(level)
    .fetch_all(conn)
    .await?;

    Ok(venues)
}

/// Participants currently occupying the venue across its open, non-expired
/// sessions
pub async fn occupancy(
    conn: &mut SqliteConnection,
    venue_id: &str,
    now: DateTime<Utc>,
) -> Result<i64> {
    let count: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*)
        FROM participants p
        JOIN sessions s ON p.session_id = s.id
        WHERE s.venue_id = ?
          AND s.status IN ('pending', 'active', 'lobby')
          AND s.end_time > ?
        "#,
    )
    .bind(venue_id)
    .bind(now)
    .fetch_one(conn)
    .await?;

    Ok(count)
}

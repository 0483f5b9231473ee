//! Session queries

use chrono::{DateTime, Utc};
use parley_common::db::Session;
use parley_common::Result;
use sqlx::SqliteConnection;

const COLUMNS: &str =
    "id, venue_id, group_id, status, start_time, end_time, topic, level, created_at";

pub async fn find(conn: &mut SqliteConnection, session_id: &str) -> Result<Option<Session>> {
    let session = sqlx::query_as::<_, Session>(&format!(
        "SELECT {} FROM sessions WHERE id = ?",
        COLUMNS
    ))
    .bind(session_id)
    .fetch_optional(conn)
    .await?;

    Ok(session)
}

/// Newest open session tied to a token group at a venue
pub async fn open_for_group(
    conn: &mut SqliteConnection,
    venue_id: &str,
    group_id: &str,
) -> Result<Option<Session>> {
    let session = sqlx::query_as::<_, Session>(&format!(
        r#"
        SELECT {}
        FROM sessions
        WHERE venue_id = ? AND group_id = ? AND status IN ('pending', 'active')
        ORDER BY created_at DESC
        LIMIT 1
        "#,
        COLUMNS
    ))
    .bind(venue_id)
    .bind(group_id)
    .fetch_optional(conn)
    .await?;

    Ok(session)
}

/// Newest open, non-expired session for a venue (booking reuse)
pub async fn open_for_venue(
    conn: &mut SqliteConnection,
    venue_id: &str,
    now: DateTime<Utc>,
) -> Result<Option<Session>> {
    let session = sqlx::query_as::<_, Session>(&format!(
        r#"
        SELECT {}
        FROM sessions
        WHERE venue_id = ?
          AND status IN ('pending', 'active', 'lobby')
          AND end_time > ?
        ORDER BY created_at DESC
        LIMIT 1
        "#,
        COLUMNS
    ))
    .bind(venue_id)
    .bind(now)
    .fetch_optional(conn)
    .await?;

    Ok(session)
}

/// Newest open session regardless of expiry (availability views)
pub async fn latest_open_for_venue(
    conn: &mut SqliteConnection,
    venue_id: &str,
) -> Result<Option<Session>> {
    let session = sqlx::query_as::<_, Session>(&format!(
        r#"
        SELECT {}
        FROM sessions
        WHERE venue_id = ? AND status IN ('pending', 'active', 'lobby')
        ORDER BY created_at DESC
        LIMIT 1
        "#,
        COLUMNS
    ))
    .bind(venue_id)
    .fetch_optional(conn)
    .await?;

    Ok(session)
}

pub async fn insert(conn: &mut SqliteConnection, session: &Session) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO sessions
            (id, venue_id, group_id, status, start_time, end_time, topic, level, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&session.id)
    .bind(&session.venue_id)
    .bind(&session.group_id)
    .bind(&session.status)
    .bind(session.start_time)
    .bind(session.end_time)
    .bind(&session.topic)
    .bind(session.level)
    .bind(session.created_at)
    .execute(conn)
    .await?;

    Ok(())
}

/// Transition pending -> active on first admission
pub async fn activate_if_pending(conn: &mut SqliteConnection, session_id: &str) -> Result<u64> {
    let result = sqlx::query("UPDATE sessions SET status = 'active' WHERE id = ? AND status = 'pending'")
        .bind(session_id)
        .execute(conn)
        .await?;

    Ok(result.rows_affected())
}

/// Retire the session. No-op when already completed (terminal state).
pub async fn complete(
    conn: &mut SqliteConnection,
    session_id: &str,
    now: DateTime<Utc>,
) -> Result<u64> {
    let result = sqlx::query(
        "UPDATE sessions SET status = 'completed', end_time = ? WHERE id = ? AND status != 'completed'",
    )
    .bind(now)
    .bind(session_id)
    .execute(conn)
    .await?;

    Ok(result.rows_affected())
}

/// Status update from the timer collaborator; completed stays terminal
pub async fn set_status(
    conn: &mut SqliteConnection,
    session_id: &str,
    status: &str,
) -> Result<u64> {
    let result = sqlx::query("UPDATE sessions SET status = ? WHERE id = ? AND status != 'completed'")
        .bind(status)
        .bind(session_id)
        .execute(conn)
        .await?;

    Ok(result.rows_affected())
}

//! Session participant queries

use chrono::{DateTime, Utc};
use parley_common::Result;
use sqlx::SqliteConnection;

pub async fn is_participant(
    conn: &mut SqliteConnection,
    session_id: &str,
    student_id: &str,
) -> Result<bool> {
    let exists: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM participants
            WHERE session_id = ? AND student_id = ? AND is_dummy = 0
        )
        "#,
    )
    .bind(session_id)
    .bind(student_id)
    .fetch_one(conn)
    .await?;

    Ok(exists)
}

/// Idempotent admission: the UNIQUE(session_id, student_id) constraint makes
/// a re-join a no-op
pub async fn insert_or_ignore(
    conn: &mut SqliteConnection,
    id: &str,
    session_id: &str,
    student_id: &str,
) -> Result<u64> {
    let result = sqlx::query(
        "INSERT OR IGNORE INTO participants (id, session_id, student_id, is_dummy) VALUES (?, ?, ?, 0)",
    )
    .bind(id)
    .bind(session_id)
    .bind(student_id)
    .execute(conn)
    .await?;

    Ok(result.rows_affected())
}

/// Booking admission guarded by venue capacity.
///
/// The occupancy check and the insert are one conditional statement; zero
/// rows affected means the venue is full. Callers must check the count, not
/// pre-read the occupancy.
pub async fn insert_if_venue_capacity(
    conn: &mut SqliteConnection,
    id: &str,
    session_id: &str,
    student_id: &str,
    venue_id: &str,
    now: DateTime<Utc>,
) -> Result<u64> {
    let result = sqlx::query(
        r#"
        INSERT INTO participants (id, session_id, student_id, is_dummy)
        SELECT ?, ?, ?, 0
        WHERE (
            SELECT COUNT(*)
            FROM participants p
            JOIN sessions s ON p.session_id = s.id
            WHERE s.venue_id = ?
              AND s.status IN ('pending', 'active', 'lobby')
              AND s.end_time > ?
        ) < (SELECT capacity FROM venues WHERE id = ?)
        "#,
    )
    .bind(id)
    .bind(session_id)
    .bind(student_id)
    .bind(venue_id)
    .bind(now)
    .bind(venue_id)
    .execute(conn)
    .await?;

    Ok(result.rows_affected())
}

pub async fn count_real(conn: &mut SqliteConnection, session_id: &str) -> Result<i64> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(DISTINCT student_id) FROM participants WHERE session_id = ? AND is_dummy = 0",
    )
    .bind(session_id)
    .fetch_one(conn)
    .await?;

    Ok(count)
}

pub async fn student_ids(conn: &mut SqliteConnection, session_id: &str) -> Result<Vec<String>> {
    let ids: Vec<String> = sqlx::query_scalar(
        "SELECT DISTINCT student_id FROM participants WHERE session_id = ? AND is_dummy = 0",
    )
    .bind(session_id)
    .fetch_all(conn)
    .await?;

    Ok(ids)
}

/// Non-dummy participants with display names
pub async fn roster(
    conn: &mut SqliteConnection,
    session_id: &str,
) -> Result<Vec<(String, String)>> {
    let rows: Vec<(String, String)> = sqlx::query_as(
        r#"
        SELECT su.id, su.full_name
        FROM participants p
        JOIN students su ON p.student_id = su.id
        WHERE p.session_id = ? AND p.is_dummy = 0 AND su.is_active = 1
        ORDER BY su.full_name
        "#,
    )
    .bind(session_id)
    .fetch_all(conn)
    .await?;

    Ok(rows)
}

/// Remove a booking that has not started (pending/lobby only); an admitted
/// participant of an active session cannot silently vanish
pub async fn delete_unstarted(
    conn: &mut SqliteConnection,
    student_id: &str,
    venue_id: &str,
) -> Result<u64> {
    let result = sqlx::query(
        r#"
        DELETE FROM participants
        WHERE student_id = ?
          AND session_id IN (
              SELECT id FROM sessions
              WHERE venue_id = ? AND status IN ('pending', 'lobby')
          )
        "#,
    )
    .bind(student_id)
    .bind(venue_id)
    .execute(conn)
    .await?;

    Ok(result.rows_affected())
}

/// Whether the student is admitted to an active session at the venue
pub async fn has_active_participation(
    conn: &mut SqliteConnection,
    student_id: &str,
    venue_id: &str,
) -> Result<bool> {
    let exists: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM participants p
            JOIN sessions s ON p.session_id = s.id
            WHERE p.student_id = ? AND s.venue_id = ? AND s.status = 'active'
        )
        "#,
    )
    .bind(student_id)
    .bind(venue_id)
    .fetch_one(conn)
    .await?;

    Ok(exists)
}

/// Active non-expired bookings held by the student at a given level
pub async fn active_booking_count(
    conn: &mut SqliteConnection,
    student_id: &str,
    level: i64,
    now: DateTime<Utc>,
) -> Result<i64> {
    let count: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*)
        FROM participants p
        JOIN sessions s ON p.session_id = s.id
        JOIN venues v ON s.venue_id = v.id
        WHERE p.student_id = ?
          AND s.status IN ('pending', 'active', 'lobby')
          AND s.end_time > ?
          AND v.level = ?
        "#,
    )
    .bind(student_id)
    .bind(now)
    .bind(level)
    .fetch_one(conn)
    .await?;

    Ok(count)
}

/// The student's open bookings with venue names, newest first
pub async fn bookings_view(
    conn: &mut SqliteConnection,
    student_id: &str,
) -> Result<Vec<(String, String, String, DateTime<Utc>, DateTime<Utc>)>> {
    let rows = sqlx::query_as(
        r#"
        SELECT s.id, v.name, s.status, s.start_time, s.end_time
        FROM participants p
        JOIN sessions s ON p.session_id = s.id
        JOIN venues v ON s.venue_id = v.id
        WHERE p.student_id = ? AND s.status IN ('pending', 'active', 'lobby')
        ORDER BY s.start_time DESC
        "#,
    )
    .bind(student_id)
    .fetch_all(conn)
    .await?;

    Ok(rows)
}

/// Whether the student holds a booking at the venue (any open status)
pub async fn is_booked_at_venue(
    conn: &mut SqliteConnection,
    student_id: &str,
    venue_id: &str,
) -> Result<bool> {
    let exists: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM participants p
            JOIN sessions s ON p.session_id = s.id
            WHERE p.student_id = ? AND s.venue_id = ? AND s.status IN ('pending', 'active', 'lobby')
        )
        "#,
    )
    .bind(student_id)
    .bind(venue_id)
    .fetch_one(conn)
    .await?;

    Ok(exists)
}

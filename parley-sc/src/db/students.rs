//! Student queries

use parley_common::db::Student;
use parley_common::Result;
use sqlx::SqliteConnection;

pub async fn find(conn: &mut SqliteConnection, student_id: &str) -> Result<Option<Student>> {
    let student = sqlx::query_as::<_, Student>(
        "SELECT id, full_name, level, current_booking, is_active FROM students WHERE id = ?",
    )
    .bind(student_id)
    .fetch_optional(conn)
    .await?;

    Ok(student)
}

pub async fn set_booking(
    conn: &mut SqliteConnection,
    student_id: &str,
    session_id: &str,
) -> Result<()> {
    sqlx::query("UPDATE students SET current_booking = ? WHERE id = ?")
        .bind(session_id)
        .bind(student_id)
        .execute(conn)
        .await?;

    Ok(())
}

/// Clear the current-booking pointer only if it still points at the given
/// session
pub async fn clear_booking_if_matches(
    conn: &mut SqliteConnection,
    student_id: &str,
    session_id: &str,
) -> Result<u64> {
    let result =
        sqlx::query("UPDATE students SET current_booking = NULL WHERE id = ? AND current_booking = ?")
            .bind(student_id)
            .bind(session_id)
            .execute(conn)
            .await?;

    Ok(result.rows_affected())
}

/// Clear the pointer when it references any session of the given venue
pub async fn clear_booking_for_venue(
    conn: &mut SqliteConnection,
    student_id: &str,
    venue_id: &str,
) -> Result<u64> {
    let result = sqlx::query(
        r#"
        UPDATE students
        SET current_booking = NULL
        WHERE id = ?
          AND current_booking IN (SELECT id FROM sessions WHERE venue_id = ?)
        "#,
    )
    .bind(student_id)
    .bind(venue_id)
    .execute(conn)
    .await?;

    Ok(result.rows_affected())
}

/// Raise a student's level, guarded below the maximum.
///
/// The level read and the write are one conditional statement; the caller
/// checks the returned flag instead of pre-reading the level.
pub async fn promote_below_max(
    conn: &mut SqliteConnection,
    student_id: &str,
    new_level: i64,
    max_level: i64,
) -> Result<bool> {
    let result = sqlx::query("UPDATE students SET level = ? WHERE id = ? AND level < ?")
        .bind(new_level)
        .bind(student_id)
        .bind(max_level)
        .execute(conn)
        .await?;

    Ok(result.rows_affected() > 0)
}

//! Score entry queries
//!
//! One row per (session, question, rated student, responder). The rated
//! student accumulates `weighted_score`; the responder accumulates
//! `penalty_points`. The two roles are aggregated separately and only
//! reconciled at final ranking time.

use parley_common::Result;
use sqlx::SqliteConnection;

/// Supersede semantics: a resubmission fully replaces the responder's prior
/// entries for the question
pub async fn delete_for_question(
    conn: &mut SqliteConnection,
    session_id: &str,
    responder_id: &str,
    question_id: &str,
) -> Result<u64> {
    let result = sqlx::query(
        "DELETE FROM score_entries WHERE session_id = ? AND responder_id = ? AND question_id = ?",
    )
    .bind(session_id)
    .bind(responder_id)
    .bind(question_id)
    .execute(conn)
    .await?;

    Ok(result.rows_affected())
}

#[allow(clippy::too_many_arguments)]
pub async fn insert_entry(
    conn: &mut SqliteConnection,
    id: &str,
    session_id: &str,
    question_id: &str,
    student_id: &str,
    responder_id: &str,
    rank: i64,
    weighted_score: f64,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO score_entries
            (id, session_id, question_id, student_id, responder_id, rank, score, weighted_score)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(id)
    .bind(session_id)
    .bind(question_id)
    .bind(student_id)
    .bind(responder_id)
    .bind(rank)
    .bind(weighted_score)
    .bind(weighted_score)
    .execute(conn)
    .await?;

    Ok(())
}

/// Flat completeness penalty charged to the responder on every entry of the
/// question
pub async fn add_question_penalty(
    conn: &mut SqliteConnection,
    session_id: &str,
    responder_id: &str,
    question_id: &str,
    points: f64,
) -> Result<u64> {
    let result = sqlx::query(
        r#"
        UPDATE score_entries
        SET penalty_points = penalty_points + ?
        WHERE session_id = ? AND responder_id = ? AND question_id = ?
        "#,
    )
    .bind(points)
    .bind(session_id)
    .bind(responder_id)
    .bind(question_id)
    .execute(conn)
    .await?;

    Ok(result.rows_affected())
}

pub async fn distinct_answered(
    conn: &mut SqliteConnection,
    session_id: &str,
    responder_id: &str,
) -> Result<i64> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(DISTINCT question_id) FROM score_entries WHERE session_id = ? AND responder_id = ?",
    )
    .bind(session_id)
    .bind(responder_id)
    .fetch_one(conn)
    .await?;

    Ok(count)
}

pub async fn mark_responder_completed(
    conn: &mut SqliteConnection,
    session_id: &str,
    responder_id: &str,
) -> Result<u64> {
    let result = sqlx::query(
        "UPDATE score_entries SET is_completed = 1 WHERE session_id = ? AND responder_id = ?",
    )
    .bind(session_id)
    .bind(responder_id)
    .execute(conn)
    .await?;

    Ok(result.rows_affected())
}

/// Idempotency guard for the scorer: any row already processed means the
/// whole session was finalized
pub async fn any_penalty_calculated(
    conn: &mut SqliteConnection,
    session_id: &str,
) -> Result<bool> {
    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM score_entries WHERE session_id = ? AND penalty_calculated = 1)",
    )
    .bind(session_id)
    .fetch_one(conn)
    .await?;

    Ok(exists)
}

pub async fn distinct_completed_questions(
    conn: &mut SqliteConnection,
    session_id: &str,
) -> Result<Vec<String>> {
    let ids: Vec<String> = sqlx::query_scalar(
        "SELECT DISTINCT question_id FROM score_entries WHERE session_id = ? AND is_completed = 1",
    )
    .bind(session_id)
    .fetch_all(conn)
    .await?;

    Ok(ids)
}

/// Non-self scores received per student on a question, completed entries only
pub async fn completed_peer_scores(
    conn: &mut SqliteConnection,
    session_id: &str,
    question_id: &str,
) -> Result<Vec<(String, f64)>> {
    let rows: Vec<(String, f64)> = sqlx::query_as(
        r#"
        SELECT student_id, score
        FROM score_entries
        WHERE session_id = ? AND question_id = ?
          AND responder_id != student_id
          AND is_completed = 1 AND score > 0
        ORDER BY student_id, score
        "#,
    )
    .bind(session_id)
    .bind(question_id)
    .fetch_all(conn)
    .await?;

    Ok(rows)
}

pub async fn set_median(
    conn: &mut SqliteConnection,
    session_id: &str,
    question_id: &str,
    student_id: &str,
    median: f64,
) -> Result<u64> {
    let result = sqlx::query(
        r#"
        UPDATE score_entries
        SET median_score = ?
        WHERE session_id = ? AND question_id = ? AND student_id = ? AND is_completed = 1
        "#,
    )
    .bind(median)
    .bind(session_id)
    .bind(question_id)
    .bind(student_id)
    .execute(conn)
    .await?;

    Ok(result.rows_affected())
}

pub async fn set_average(
    conn: &mut SqliteConnection,
    session_id: &str,
    question_id: &str,
    student_id: &str,
    average: f64,
) -> Result<u64> {
    let result = sqlx::query(
        r#"
        UPDATE score_entries
        SET average_score = ?
        WHERE session_id = ? AND question_id = ? AND student_id = ? AND is_completed = 1
        "#,
    )
    .bind(average)
    .bind(session_id)
    .bind(question_id)
    .bind(student_id)
    .execute(conn)
    .await?;

    Ok(result.rows_affected())
}

/// Entries eligible for the deviation pass: (entry id, score, median)
pub async fn rows_for_deviation(
    conn: &mut SqliteConnection,
    session_id: &str,
) -> Result<Vec<(String, f64, f64)>> {
    let rows: Vec<(String, f64, f64)> = sqlx::query_as(
        r#"
        SELECT id, score, median_score
        FROM score_entries
        WHERE session_id = ? AND is_completed = 1
          AND responder_id != student_id
          AND median_score > 0
        "#,
    )
    .bind(session_id)
    .fetch_all(conn)
    .await?;

    Ok(rows)
}

/// Deviation at or above the bias threshold: charge the responder
pub async fn apply_bias_penalty(
    conn: &mut SqliteConnection,
    entry_id: &str,
    penalty: f64,
    deviation: f64,
) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE score_entries
        SET penalty_points = penalty_points + ?,
            deviation = ?,
            is_biased = 1,
            penalty_calculated = 1
        WHERE id = ?
        "#,
    )
    .bind(penalty)
    .bind(deviation)
    .bind(entry_id)
    .execute(conn)
    .await?;

    Ok(())
}

/// Below the threshold: record the deviation, no penalty
pub async fn mark_penalty_calculated(
    conn: &mut SqliteConnection,
    entry_id: &str,
    deviation: f64,
) -> Result<()> {
    sqlx::query("UPDATE score_entries SET penalty_calculated = 1, deviation = ? WHERE id = ?")
        .bind(deviation)
        .bind(entry_id)
        .execute(conn)
        .await?;

    Ok(())
}

/// Entries the deviation pass never visited (self-ranks, zero medians) still
/// get a zero deviation and the processed flag
pub async fn zero_remaining_deviations(
    conn: &mut SqliteConnection,
    session_id: &str,
) -> Result<u64> {
    let result = sqlx::query(
        "UPDATE score_entries SET deviation = 0, penalty_calculated = 1 WHERE session_id = ? AND deviation IS NULL",
    )
    .bind(session_id)
    .execute(conn)
    .await?;

    Ok(result.rows_affected())
}

/// Weighted score received per rated student
pub async fn received_totals(
    conn: &mut SqliteConnection,
    session_id: &str,
) -> Result<Vec<(String, f64)>> {
    let rows: Vec<(String, f64)> = sqlx::query_as(
        r#"
        SELECT student_id, SUM(weighted_score)
        FROM score_entries
        WHERE session_id = ?
        GROUP BY student_id
        "#,
    )
    .bind(session_id)
    .fetch_all(conn)
    .await?;

    Ok(rows)
}

/// Rank-1 placements received per rated student
pub async fn first_place_counts(
    conn: &mut SqliteConnection,
    session_id: &str,
) -> Result<Vec<(String, i64)>> {
    let rows: Vec<(String, i64)> = sqlx::query_as(
        r#"
        SELECT student_id, COUNT(*)
        FROM score_entries
        WHERE session_id = ? AND rank = 1
        GROUP BY student_id
        "#,
    )
    .bind(session_id)
    .fetch_all(conn)
    .await?;

    Ok(rows)
}

/// Penalties charged per responder, split into bias (deviation at/over the
/// threshold) and completeness buckets, with flagged-question counts
pub async fn charged_breakdown(
    conn: &mut SqliteConnection,
    session_id: &str,
) -> Result<Vec<(String, f64, f64, i64, i64)>> {
    let rows: Vec<(String, f64, f64, i64, i64)> = sqlx::query_as(
        r#"
        SELECT
            responder_id,
            COALESCE(SUM(CASE WHEN deviation >= 2.0 THEN penalty_points ELSE 0.0 END), 0.0),
            COALESCE(SUM(CASE WHEN (deviation < 2.0 OR deviation IS NULL) AND penalty_points > 0
                              THEN penalty_points ELSE 0.0 END), 0.0),
            COUNT(DISTINCT CASE WHEN deviation >= 2.0 AND is_biased = 1 THEN question_id END),
            COUNT(DISTINCT CASE WHEN (deviation < 2.0 OR deviation IS NULL) AND penalty_points > 0
                                THEN question_id END)
        FROM score_entries
        WHERE session_id = ?
        GROUP BY responder_id
        "#,
    )
    .bind(session_id)
    .fetch_all(conn)
    .await?;

    Ok(rows)
}

//! Result views: ranked scores, completion state, level progression
//!
//! The reads double as the finalize trigger: the first fetch after the last
//! completion mark lands runs scoring and promotion. A scoring failure
//! degrades to pending scores; the fetch itself never fails for it.

use parley_common::events::EventBus;
use parley_common::{Error, Result};
use sqlx::SqlitePool;
use tracing::warn;

use crate::db;
use crate::models::{CompletionStatus, ProgressionStatus, ResultRow};
use crate::services::{promotion, scoring};

/// Ranked results for a session, participant-only
pub async fn session_results(
    pool: &SqlitePool,
    bus: &EventBus,
    session_id: &str,
    viewer_id: &str,
) -> Result<Vec<ResultRow>> {
    {
        let mut conn = pool.acquire().await?;

        if db::sessions::find(&mut conn, session_id).await?.is_none() {
            return Err(Error::NotFound("Session not found".to_string()));
        }

        if !db::participants::is_participant(&mut conn, session_id, viewer_id).await? {
            return Err(Error::Forbidden(
                "Not authorized to view these results".to_string(),
            ));
        }
    }

    // Opportunistic finalize; a failure leaves the scores pending
    if let Err(e) = scoring::finalize_session(pool, bus, session_id).await {
        warn!(session_id = %session_id, error = %e, "Scoring failed; returning pending scores");
    }

    let mut conn = pool.acquire().await?;
    let roster = db::participants::roster(&mut conn, session_id).await?;
    let names: std::collections::HashMap<String, String> = roster.into_iter().collect();

    let ranked = promotion::session_tallies(&mut conn, session_id).await?;

    Ok(ranked
        .into_iter()
        .map(|(student_id, tally)| ResultRow {
            name: names.get(&student_id).cloned().unwrap_or_default(),
            total_score: round2(tally.received),
            bias_penalty: round2(tally.bias_penalty),
            incomplete_penalty: round2(tally.incomplete_penalty),
            penalty_points: round2(tally.charged),
            final_score: round2(tally.final_score()),
            first_places: tally.first_places,
            biased_questions: tally.biased_questions,
            incomplete_questions: tally.incomplete_questions,
            student_id,
        })
        .collect())
}

/// How many participants have completed the survey
pub async fn completion_status(pool: &SqlitePool, session_id: &str) -> Result<CompletionStatus> {
    let mut conn = pool.acquire().await?;

    if db::sessions::find(&mut conn, session_id).await?.is_none() {
        return Err(Error::NotFound("Session not found".to_string()));
    }

    let total = db::participants::count_real(&mut conn, session_id).await?;
    let completed = db::completions::count(&mut conn, session_id).await?;

    Ok(CompletionStatus {
        all_completed: total > 0 && completed >= total,
        completed,
        total,
    })
}

/// Whether the student was promoted out of this session
pub async fn progression_status(
    pool: &SqlitePool,
    bus: &EventBus,
    session_id: &str,
    student_id: &str,
) -> Result<ProgressionStatus> {
    let completion = completion_status(pool, session_id).await?;

    if completion.all_completed {
        if let Err(e) = scoring::finalize_session(pool, bus, session_id).await {
            warn!(session_id = %session_id, error = %e, "Scoring failed; progression reads pending state");
        }
    }

    let mut conn = pool.acquire().await?;

    let student = db::students::find(&mut conn, student_id)
        .await?
        .ok_or_else(|| Error::NotFound("Student not found".to_string()))?;

    if let Some(promotion) = db::promotions::find(&mut conn, student_id, session_id).await? {
        return Ok(ProgressionStatus {
            promoted: true,
            old_level: promotion.old_level,
            new_level: promotion.new_level,
            rank: promotion.rank,
            session_id: session_id.to_string(),
            student_id: student_id.to_string(),
            all_completed: completion.all_completed,
            completed: completion.completed,
            total: completion.total,
        });
    }

    // Not promoted: report the rank they placed at, when known
    let rank = if completion.all_completed {
        promotion::session_tallies(&mut conn, session_id)
            .await?
            .iter()
            .position(|(id, _)| id == student_id)
            .map(|i| (i + 1) as i64)
            .unwrap_or(0)
    } else {
        0
    };

    Ok(ProgressionStatus {
        promoted: false,
        old_level: student.level,
        new_level: student.level,
        rank,
        session_id: session_id.to_string(),
        student_id: student_id.to_string(),
        all_completed: completion.all_completed,
        completed: completion.completed,
        total: completion.total,
    })
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

//! Peer-ranking collection
//!
//! Records each participant's per-question ranking of peers. A resubmission
//! for a question fully supersedes the previous one. Incomplete or gapped
//! rank sets charge the responder a flat completeness penalty; completion is
//! all-or-nothing across the level's active questions.

use chrono::Utc;
use parley_common::db::SessionStatus;
use parley_common::events::{EventBus, SessionEvent};
use parley_common::{Error, Result};
use sqlx::SqlitePool;
use std::collections::BTreeMap;
use tracing::{info, warn};
use uuid::Uuid;

use crate::db;
use crate::models::RankingOutcome;
use crate::services::scoring;

/// Base points for a rank position when no configured row exists.
///
/// Monotonically decreasing: rank 1 yields the most points.
pub fn fallback_points(rank: i64) -> f64 {
    (5 - rank) as f64
}

/// Record a responder's rankings, replacing any prior submission per
/// question, and recompute the responder's completion mark.
pub async fn submit_rankings(
    pool: &SqlitePool,
    bus: &EventBus,
    session_id: &str,
    responder_id: &str,
    responses: &BTreeMap<i64, BTreeMap<i64, String>>,
) -> Result<RankingOutcome> {
    let now = Utc::now();
    let mut tx = pool.begin().await?;

    let session = db::sessions::find(&mut tx, session_id)
        .await?
        .ok_or_else(|| Error::NotFound("Session not found".to_string()))?;

    if session.status() == SessionStatus::Completed {
        return Err(Error::Conflict(
            "Session is completed; rankings can no longer change".to_string(),
        ));
    }

    if !db::participants::is_participant(&mut tx, session_id, responder_id).await? {
        return Err(Error::Forbidden(
            "Not a participant of this session".to_string(),
        ));
    }

    // Question number is 1-based display order
    let questions = db::questions::active_for_level(&mut tx, session.level).await?;
    let total_questions = questions.len() as i64;
    let by_number: BTreeMap<i64, _> = questions
        .iter()
        .enumerate()
        .map(|(i, q)| ((i + 1) as i64, q))
        .collect();

    let participant_count = db::participants::count_real(&mut tx, session_id).await?;
    let expected_ranks = (participant_count - 1).max(1);

    // question id -> missing-rank units
    let mut deficiencies: BTreeMap<String, i64> = BTreeMap::new();

    for (question_number, rankings) in responses {
        let question = match by_number.get(question_number) {
            Some(q) => *q,
            None => {
                warn!(
                    session_id = %session_id,
                    question_number,
                    "No active question at this position; skipping"
                );
                continue;
            }
        };

        db::scores::delete_for_question(&mut tx, session_id, responder_id, &question.id).await?;

        let actual_ranks = rankings.len() as i64;
        let mut units = (expected_ranks - actual_ranks).max(0);

        // A gapped rank set (e.g. {2,3} with rank 1 missing) is deficient
        // even at full length
        let has_all_ranks = (1..=expected_ranks).all(|r| rankings.contains_key(&r));
        if !has_all_ranks && units == 0 {
            units = 1;
        }
        if units > 0 {
            deficiencies.insert(question.id.clone(), units);
        }

        for (&rank, ranked_student_id) in rankings {
            let base = db::questions::rank_points(&mut tx, session.level, rank)
                .await?
                .unwrap_or_else(|| fallback_points(rank));
            let weighted = base * question.weight;

            db::scores::insert_entry(
                &mut tx,
                &Uuid::new_v4().to_string(),
                session_id,
                &question.id,
                ranked_student_id,
                responder_id,
                rank,
                weighted,
            )
            .await?;
        }
    }

    // Flat penalty of one point per missing unit, charged to the responder
    let mut incomplete_penalty = 0.0;
    for (question_id, units) in &deficiencies {
        let points = *units as f64;
        incomplete_penalty += points;
        db::scores::add_question_penalty(&mut tx, session_id, responder_id, question_id, points)
            .await?;
    }

    // Completion is all-or-nothing: a subset never partially marks it
    let answered = db::scores::distinct_answered(&mut tx, session_id, responder_id).await?;
    let completed = total_questions > 0 && answered >= total_questions;
    if completed {
        db::completions::upsert(&mut tx, session_id, responder_id, now).await?;
        db::scores::mark_responder_completed(&mut tx, session_id, responder_id).await?;
    }

    tx.commit().await?;

    info!(
        session_id = %session_id,
        responder_id = %responder_id,
        answered,
        total_questions,
        incomplete_penalty,
        "Rankings recorded"
    );

    if completed {
        bus.emit(SessionEvent::SurveyCompleted {
            session_id: Uuid::parse_str(session_id).unwrap_or(Uuid::nil()),
            student_id: Uuid::parse_str(responder_id).unwrap_or(Uuid::nil()),
            timestamp: now,
        });

        // The last completion triggers scoring; failures degrade to
        // "scores pending" rather than failing the submission
        if let Err(e) = scoring::finalize_session(pool, bus, session_id).await {
            warn!(session_id = %session_id, error = %e, "Deferred scoring failed");
        }
    }

    Ok(RankingOutcome {
        status: "success".to_string(),
        completed,
        questions_answered: answered,
        total_questions,
        incomplete_penalty,
        incomplete_questions: deficiencies.len() as i64,
    })
}

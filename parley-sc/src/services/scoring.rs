//! Bias and completeness scoring
//!
//! Runs once per session, the first time every participant's completion mark
//! is present. The median of each student's received scores anchors the bias
//! check: the median resists the outlier and collusive extremes that a mean
//! would follow. Raters far from consensus are penalized, capped so a single
//! rating bounds its own damage.

use chrono::Utc;
use parley_common::events::{EventBus, SessionEvent, SessionPhase};
use parley_common::Result;
use sqlx::SqlitePool;
use std::collections::BTreeMap;
use tracing::info;
use uuid::Uuid;

use crate::db;
use crate::services::promotion;

/// Deviation at or above this flags the rating as biased
pub const BIAS_DEVIATION_THRESHOLD: f64 = 2.0;

/// Cap on the penalty any single rating can incur
pub const MAX_BIAS_PENALTY: f64 = 3.0;

/// Median of a non-empty score list
pub fn median(scores: &mut Vec<f64>) -> f64 {
    scores.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let n = scores.len();
    if n % 2 == 0 {
        (scores[n / 2 - 1] + scores[n / 2]) / 2.0
    } else {
        scores[n / 2]
    }
}

/// Score the session and run promotions, exactly once.
///
/// Returns `false` without touching anything when the session is not yet
/// fully completed or was already finalized. The idempotency guard and the
/// work share one transaction, so concurrent "all complete" observers cannot
/// both finalize.
pub async fn finalize_session(pool: &SqlitePool, bus: &EventBus, session_id: &str) -> Result<bool> {
    let now = Utc::now();
    let mut tx = pool.begin().await?;

    if db::scores::any_penalty_calculated(&mut tx, session_id).await? {
        return Ok(false);
    }

    let total = db::participants::count_real(&mut tx, session_id).await?;
    let completed = db::completions::count(&mut tx, session_id).await?;
    if total == 0 || completed < total {
        return Ok(false);
    }

    // Median and mean snapshots per (question, rated student)
    let question_ids = db::scores::distinct_completed_questions(&mut tx, session_id).await?;
    for question_id in &question_ids {
        let rows = db::scores::completed_peer_scores(&mut tx, session_id, question_id).await?;

        let mut by_student: BTreeMap<String, Vec<f64>> = BTreeMap::new();
        for (student_id, score) in rows {
            by_student.entry(student_id).or_default().push(score);
        }

        for (student_id, mut scores) in by_student {
            if scores.is_empty() {
                continue;
            }
            let mean = scores.iter().sum::<f64>() / scores.len() as f64;
            let med = median(&mut scores);

            db::scores::set_median(&mut tx, session_id, question_id, &student_id, med).await?;
            db::scores::set_average(&mut tx, session_id, question_id, &student_id, mean).await?;
        }
    }

    // Deviation pass: penalize the responder, not the rated student
    let mut processed = 0usize;
    let mut penalized = 0usize;
    for (entry_id, score, median_score) in
        db::scores::rows_for_deviation(&mut tx, session_id).await?
    {
        let deviation = (score - median_score).abs();
        processed += 1;

        if deviation >= BIAS_DEVIATION_THRESHOLD {
            let penalty = deviation.min(MAX_BIAS_PENALTY);
            db::scores::apply_bias_penalty(&mut tx, &entry_id, penalty, deviation).await?;
            penalized += 1;
        } else {
            db::scores::mark_penalty_calculated(&mut tx, &entry_id, deviation).await?;
        }
    }

    db::scores::zero_remaining_deviations(&mut tx, session_id).await?;

    let promotions = promotion::run_promotions(&mut tx, session_id, now).await?;

    tx.commit().await?;

    info!(
        session_id = %session_id,
        ratings = processed,
        penalties = penalized,
        promotions = promotions.len(),
        "Session scored and retired"
    );

    let sid = Uuid::parse_str(session_id).unwrap_or(Uuid::nil());
    bus.emit(SessionEvent::PhaseChanged {
        session_id: sid,
        phase: SessionPhase::Results,
        timestamp: now,
    });
    bus.emit(SessionEvent::SessionRetired {
        session_id: sid,
        timestamp: now,
    });

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn median_of_odd_list_is_middle_value() {
        let mut scores = vec![3.0, 1.0, 2.0];
        assert_eq!(median(&mut scores), 2.0);
    }

    #[test]
    fn median_of_even_list_averages_middle_pair() {
        let mut scores = vec![4.0, 1.0, 3.0, 2.0];
        assert_eq!(median(&mut scores), 2.5);
    }

    #[test]
    fn median_resists_outlier() {
        // One collusive 8 among honest 2s moves the median nowhere
        let mut scores = vec![2.0, 2.0, 2.0, 8.0];
        assert_eq!(median(&mut scores), 2.0);
    }

    #[test]
    fn outlier_penalty_is_capped() {
        let deviation: f64 = (8.0f64 - 2.0).abs();
        assert_eq!(deviation, 6.0);
        assert!(deviation >= BIAS_DEVIATION_THRESHOLD);
        assert_eq!(deviation.min(MAX_BIAS_PENALTY), 3.0);
    }
}

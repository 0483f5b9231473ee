//! Level promotion and session retirement
//!
//! Runs inside the scorer's transaction immediately after penalties settle.
//! The top three ranked participants rise exactly one level; anyone already
//! at the maximum is skipped, not substituted. Retirement marks the session
//! completed, clears still-pointing booking references, and purges lobby
//! ready marks.

use chrono::{DateTime, Utc};
use parley_common::db::Promotion;
use parley_common::Result;
use sqlx::SqliteConnection;
use std::collections::BTreeMap;
use tracing::info;

use crate::db;
use crate::models::ParticipantTally;

/// Highest attainable proficiency level
pub const MAX_LEVEL: i64 = 5;

/// Number of top-ranked participants eligible for promotion
pub const PROMOTION_SLOTS: usize = 3;

/// Per-participant tallies for the session, ranked by the canonical final
/// score (received minus charged), ties broken by rank-1 placements received.
pub async fn session_tallies(
    conn: &mut SqliteConnection,
    session_id: &str,
) -> Result<Vec<(String, ParticipantTally)>> {
    let mut tallies: BTreeMap<String, ParticipantTally> = BTreeMap::new();
    for student_id in db::participants::student_ids(&mut *conn, session_id).await? {
        tallies.insert(student_id, ParticipantTally::default());
    }

    for (student_id, received) in db::scores::received_totals(&mut *conn, session_id).await? {
        if let Some(tally) = tallies.get_mut(&student_id) {
            tally.received = received;
        }
    }

    for (student_id, firsts) in db::scores::first_place_counts(&mut *conn, session_id).await? {
        if let Some(tally) = tallies.get_mut(&student_id) {
            tally.first_places = firsts;
        }
    }

    for (responder_id, bias, incomplete, biased_questions, incomplete_questions) in
        db::scores::charged_breakdown(&mut *conn, session_id).await?
    {
        if let Some(tally) = tallies.get_mut(&responder_id) {
            tally.bias_penalty = bias;
            tally.incomplete_penalty = incomplete;
            tally.charged = bias + incomplete;
            tally.biased_questions = biased_questions;
            tally.incomplete_questions = incomplete_questions;
        }
    }

    let mut ranked: Vec<(String, ParticipantTally)> = tallies.into_iter().collect();
    ranked.sort_by(|a, b| {
        b.1.final_score()
            .partial_cmp(&a.1.final_score())
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(b.1.first_places.cmp(&a.1.first_places))
    });

    Ok(ranked)
}

/// Promote the session's top performers and retire the session.
///
/// Must run inside the scorer's transaction. The level read and write are a
/// single conditional update, so the decision is always based on the level
/// at the time this scoring runs.
pub async fn run_promotions(
    conn: &mut SqliteConnection,
    session_id: &str,
    now: DateTime<Utc>,
) -> Result<Vec<Promotion>> {
    let ranked = session_tallies(&mut *conn, session_id).await?;

    let mut promotions = Vec::new();
    for (i, (student_id, _)) in ranked.iter().take(PROMOTION_SLOTS).enumerate() {
        let student = match db::students::find(&mut *conn, student_id).await? {
            Some(s) => s,
            None => continue,
        };

        // Already at the cap: skip, never substitute a lower rank
        if student.level >= MAX_LEVEL {
            continue;
        }

        let new_level = (student.level + 1).min(MAX_LEVEL);
        if db::students::promote_below_max(&mut *conn, student_id, new_level, MAX_LEVEL).await? {
            let promotion = db::promotions::new_row(
                student_id,
                session_id,
                student.level,
                new_level,
                (i + 1) as i64,
                now,
            );
            db::promotions::upsert(&mut *conn, &promotion).await?;

            info!(
                student_id = %student_id,
                old_level = student.level,
                new_level,
                rank = i + 1,
                "Student promoted"
            );
            promotions.push(promotion);
        }
    }

    // Retirement: completed status, cleared booking pointers, purged lobby
    // marks. All no-ops if re-entered on a completed session.
    db::sessions::complete(&mut *conn, session_id, now).await?;

    for student_id in db::participants::student_ids(&mut *conn, session_id).await? {
        db::students::clear_booking_if_matches(&mut *conn, &student_id, session_id).await?;
    }

    db::ready::purge(&mut *conn, session_id).await?;

    Ok(promotions)
}

//! Per-participant score accumulators

use serde::Serialize;

/// The two scoring roles a participant plays, kept as distinct named
/// aggregates and reconciled only at final ranking time:
///
/// - `received` accumulates the weighted scores the participant earned as
///   the *rated student*;
/// - `charged` accumulates the bias and completeness penalties levied
///   against the participant as the *responder* (rater).
///
/// Conflating the two produces sign-confusion bugs, so nothing else in the
/// crate sums scores and penalties into one field.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ParticipantTally {
    /// Weighted score received as rated student
    pub received: f64,
    /// Penalty points charged as responder
    pub charged: f64,
    /// Bias portion of `charged` (deviation-based)
    pub bias_penalty: f64,
    /// Completeness portion of `charged` (missing-rank units)
    pub incomplete_penalty: f64,
    /// Count of rank-1 placements received
    pub first_places: i64,
    /// Questions on which this responder was flagged biased
    pub biased_questions: i64,
    /// Questions on which this responder submitted incomplete rankings
    pub incomplete_questions: i64,
}

impl ParticipantTally {
    /// Canonical final score: received as rated student minus charged as
    /// responder. Used identically by results, promotion, and progression.
    pub fn final_score(&self) -> f64 {
        self.received - self.charged
    }
}

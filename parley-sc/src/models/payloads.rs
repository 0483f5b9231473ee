//! API request/response types

use chrono::{DateTime, Utc};
use parley_common::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Payload embedded in an access token's opaque string.
///
/// Produced by the token-generation collaborator; the core validates only
/// the expiry and the venue match, never the token's construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPayload {
    pub venue_id: String,
    pub expiry: DateTime<Utc>,
    /// Random discriminator so payloads for the same venue never collide
    #[serde(default)]
    pub nonce: String,
}

impl TokenPayload {
    pub fn parse(token_data: &str) -> Result<Self> {
        serde_json::from_str(token_data)
            .map_err(|e| Error::InvalidInput(format!("Malformed access token: {}", e)))
    }
}

/// POST /sessions/join request
#[derive(Debug, Deserialize)]
pub struct JoinRequest {
    pub token_data: String,
}

/// POST /sessions/join response
#[derive(Debug, Serialize)]
pub struct JoinResponse {
    pub status: String,
    pub session_id: String,
}

/// POST /bookings request
#[derive(Debug, Deserialize)]
pub struct BookingRequest {
    pub venue_id: String,
}

/// POST /bookings response
#[derive(Debug, Serialize)]
pub struct BookingResponse {
    pub status: String,
    pub session_id: String,
    pub venue_id: String,
    pub booked_seats: i64,
    pub remaining_seats: i64,
}

/// POST /bookings/cancel request
#[derive(Debug, Deserialize)]
pub struct CancelRequest {
    pub venue_id: String,
}

/// Per-responder ranking submission: question number -> (rank -> student id)
///
/// Question numbers are 1-based display order; ranks are 1-based with rank 1
/// being the best placement.
#[derive(Debug, Deserialize)]
pub struct RankingSubmission {
    pub session_id: String,
    pub responses: BTreeMap<i64, BTreeMap<i64, String>>,
}

/// POST /rankings response
#[derive(Debug, Serialize)]
pub struct RankingOutcome {
    pub status: String,
    pub completed: bool,
    pub questions_answered: i64,
    pub total_questions: i64,
    pub incomplete_penalty: f64,
    pub incomplete_questions: i64,
}

/// One row of GET /sessions/results
#[derive(Debug, Serialize)]
pub struct ResultRow {
    pub student_id: String,
    pub name: String,
    pub total_score: f64,
    pub bias_penalty: f64,
    pub incomplete_penalty: f64,
    pub penalty_points: f64,
    pub final_score: f64,
    pub first_places: i64,
    pub biased_questions: i64,
    pub incomplete_questions: i64,
}

/// GET /sessions/completion response
#[derive(Debug, Serialize)]
pub struct CompletionStatus {
    pub all_completed: bool,
    pub completed: i64,
    pub total: i64,
}

/// GET /students/progression response
#[derive(Debug, Serialize)]
pub struct ProgressionStatus {
    pub promoted: bool,
    pub old_level: i64,
    pub new_level: i64,
    pub rank: i64,
    pub session_id: String,
    pub student_id: String,
    pub all_completed: bool,
    pub completed: i64,
    pub total: i64,
}

/// One venue row of GET /venues/available
#[derive(Debug, Serialize)]
pub struct VenueAvailability {
    pub id: String,
    pub venue_name: String,
    pub capacity: i64,
    pub booked: i64,
    pub remaining: i64,
    pub level: i64,
    pub has_active_session: bool,
    pub end_time: Option<DateTime<Utc>>,
}

/// One row of GET /bookings
#[derive(Debug, Serialize)]
pub struct BookingView {
    pub session_id: String,
    pub venue_name: String,
    pub status: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

/// GET /sessions/details response
#[derive(Debug, Serialize)]
pub struct SessionDetails {
    pub id: String,
    pub venue: String,
    pub topic: Option<String>,
    pub status: String,
    pub level: i64,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

/// One co-participant row of GET /sessions/participants
#[derive(Debug, Serialize)]
pub struct ParticipantView {
    pub id: String,
    pub name: String,
}

/// POST /sessions/ready request
#[derive(Debug, Deserialize)]
pub struct ReadyRequest {
    pub session_id: String,
    pub is_ready: bool,
}

/// GET /sessions/ready response
#[derive(Debug, Serialize)]
pub struct ReadyStatus {
    pub all_ready: bool,
    pub ready_count: i64,
    pub total_participants: i64,
}

/// POST /tokens request
#[derive(Debug, Deserialize)]
pub struct IssueTokenRequest {
    pub venue_id: String,
    pub max_capacity: i64,
}

/// Token view returned by issue/active lookups
#[derive(Debug, Serialize)]
pub struct TokenView {
    pub id: String,
    pub venue_id: String,
    pub token_data: String,
    pub group_id: String,
    pub max_capacity: i64,
    pub current_usage: i64,
    pub remaining: i64,
    pub expires_at: DateTime<Utc>,
}

impl From<parley_common::db::AccessToken> for TokenView {
    fn from(t: parley_common::db::AccessToken) -> Self {
        Self {
            remaining: t.max_capacity - t.current_usage,
            id: t.id,
            venue_id: t.venue_id,
            token_data: t.token_data,
            group_id: t.group_id,
            max_capacity: t.max_capacity,
            current_usage: t.current_usage,
            expires_at: t.expires_at,
        }
    }
}

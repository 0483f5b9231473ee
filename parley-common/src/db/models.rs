//! Database models
//!
//! Entity ids are UUID v4 stored as TEXT; timestamps are `DateTime<Utc>`
//! stored as RFC3339 TEXT.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Session lifecycle status
///
/// Terminal state is `Completed`; no further writes except audit reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Pending,
    Lobby,
    Active,
    Completed,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Pending => "pending",
            SessionStatus::Lobby => "lobby",
            SessionStatus::Active => "active",
            SessionStatus::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(SessionStatus::Pending),
            "lobby" => Some(SessionStatus::Lobby),
            "active" => Some(SessionStatus::Active),
            "completed" => Some(SessionStatus::Completed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Venue {
    pub id: String,
    pub name: String,
    pub capacity: i64,
    pub level: i64,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Student {
    pub id: String,
    pub full_name: String,
    pub level: i64,
    /// Session id of the student's current booking, if any
    pub current_booking: Option<String>,
    pub is_active: bool,
}

/// Capacity-bounded admission credential (one QR group)
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AccessToken {
    pub id: String,
    pub venue_id: String,
    /// Opaque scanned string; the payload embeds `{venue_id, expiry}`
    pub token_data: String,
    pub group_id: String,
    pub max_capacity: i64,
    pub current_usage: i64,
    pub expires_at: DateTime<Utc>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Session {
    pub id: String,
    pub venue_id: String,
    /// Token group that admitted this session; NULL for booking-created ones
    pub group_id: Option<String>,
    pub status: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub topic: Option<String>,
    pub level: i64,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn status(&self) -> SessionStatus {
        SessionStatus::parse(&self.status).unwrap_or(SessionStatus::Pending)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Participant {
    pub id: String,
    pub session_id: String,
    pub student_id: String,
    pub is_dummy: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Question {
    pub id: String,
    pub level: i64,
    pub prompt: String,
    pub weight: f64,
    pub display_order: i64,
    pub is_active: bool,
}

/// One responder→student ranking outcome for one question
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ScoreEntry {
    pub id: String,
    pub session_id: String,
    pub question_id: String,
    /// The rated student (receives `weighted_score`)
    pub student_id: String,
    /// The rater (charged `penalty_points`)
    pub responder_id: String,
    pub rank: i64,
    pub score: f64,
    pub weighted_score: f64,
    pub penalty_points: f64,
    pub deviation: Option<f64>,
    pub median_score: f64,
    pub average_score: f64,
    pub is_biased: bool,
    pub is_completed: bool,
    pub penalty_calculated: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Promotion {
    pub id: String,
    pub student_id: String,
    pub session_id: String,
    pub old_level: i64,
    pub new_level: i64,
    pub rank: i64,
    pub promoted_at: DateTime<Utc>,
}

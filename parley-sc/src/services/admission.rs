//! Token-based admission: capacity ledger and session matching
//!
//! A scanned access token admits a student into the session instance of its
//! token group, consuming one capacity slot. The slot consumption, session
//! find-or-create, participant upsert, and status transition commit or roll
//! back as one unit.

use chrono::{Duration, Utc};
use parley_common::config::ServiceConfig;
use parley_common::db::{Session, SessionStatus};
use parley_common::events::{EventBus, SessionEvent, SessionPhase};
use parley_common::{Error, Result};
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use crate::db;
use crate::models::TokenPayload;

/// Admit a student via a scanned access token, returning the session id.
///
/// Re-joining with a token the student already consumed is a no-op that
/// returns the same session id without consuming another slot.
pub async fn join_by_token(
    pool: &SqlitePool,
    bus: &EventBus,
    config: &ServiceConfig,
    student_id: &str,
    token_data: &str,
) -> Result<String> {
    let payload = TokenPayload::parse(token_data)?;
    let now = Utc::now();

    if payload.expiry <= now {
        return Err(Error::Expired("Access token has expired".to_string()));
    }

    let mut tx = pool.begin().await?;

    let token = db::tokens::find_by_data(&mut tx, token_data)
        .await?
        .ok_or_else(|| Error::NotFound("Access token not recognized".to_string()))?;

    // The payload's venue claim must match the stored token row
    if token.venue_id != payload.venue_id {
        return Err(Error::NotFound(
            "Access token does not match this venue".to_string(),
        ));
    }

    let venue = db::venues::find(&mut tx, &token.venue_id)
        .await?
        .ok_or_else(|| Error::NotFound("Venue not found".to_string()))?;

    let student = db::students::find(&mut tx, student_id)
        .await?
        .ok_or_else(|| Error::NotFound("Student not found".to_string()))?;

    if student.level != venue.level {
        return Err(Error::Forbidden(format!(
            "You can only join sessions for your current level (Level {})",
            student.level
        )));
    }

    // Idempotent re-join: an existing participant of the group's open
    // session gets the same session id and consumes nothing
    if let Some(session) = db::sessions::open_for_group(&mut tx, &venue.id, &token.group_id).await? {
        if db::participants::is_participant(&mut tx, &session.id, student_id).await? {
            tx.commit().await?;
            return Ok(session.id);
        }
    }

    // Capacity check and increment are one conditional statement; on failure
    // the unchanged row tells us which limit was hit
    if !db::tokens::try_consume(&mut tx, &token.id, now).await? {
        let current = db::tokens::find(&mut tx, &token.id)
            .await?
            .ok_or_else(|| Error::NotFound("Access token not recognized".to_string()))?;
        if !current.is_active || current.expires_at <= now {
            return Err(Error::Expired(
                "Access token is no longer active".to_string(),
            ));
        }
        if current.current_usage >= current.max_capacity {
            return Err(Error::Conflict(
                "This access token has reached its capacity limit".to_string(),
            ));
        }
        return Err(Error::Internal(
            "Capacity slot could not be consumed".to_string(),
        ));
    }

    let session = match db::sessions::open_for_group(&mut tx, &venue.id, &token.group_id).await? {
        Some(session) => session,
        None => {
            let session = Session {
                id: Uuid::new_v4().to_string(),
                venue_id: venue.id.clone(),
                group_id: Some(token.group_id.clone()),
                status: SessionStatus::Active.as_str().to_string(),
                start_time: now,
                end_time: now + Duration::minutes(config.token_session_minutes),
                topic: None,
                level: venue.level,
                created_at: now,
            };
            db::sessions::insert(&mut tx, &session).await?;
            info!(
                session_id = %session.id,
                venue_id = %venue.id,
                group_id = %token.group_id,
                "Created session for token group"
            );
            session
        }
    };

    db::participants::insert_or_ignore(&mut tx, &Uuid::new_v4().to_string(), &session.id, student_id)
        .await?;
    db::sessions::activate_if_pending(&mut tx, &session.id).await?;

    tx.commit().await?;

    info!(session_id = %session.id, student_id = %student_id, "Student joined session");

    bus.emit(SessionEvent::ParticipantJoined {
        session_id: parse_uuid(&session.id),
        student_id: parse_uuid(student_id),
        timestamp: now,
    });
    bus.emit(SessionEvent::PhaseChanged {
        session_id: parse_uuid(&session.id),
        phase: SessionPhase::Prep,
        timestamp: now,
    });

    Ok(session.id)
}

/// Deactivate tokens past expiry. Pure maintenance: idempotent, no business
/// effect beyond preventing future consumption.
pub async fn sweep_expired_tokens(pool: &SqlitePool) -> Result<u64> {
    let mut conn = pool.acquire().await?;
    db::tokens::deactivate_expired(&mut conn, Utc::now()).await
}

fn parse_uuid(id: &str) -> Uuid {
    Uuid::parse_str(id).unwrap_or(Uuid::nil())
}

//! Session detail and status API handlers

use axum::{
    extract::{Query, State},
    middleware,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::Utc;
use parley_common::db::SessionStatus;
use parley_common::events::{SessionEvent, SessionPhase};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::api::identity::{require_admin, require_student, StudentIdentity};
use crate::db;
use crate::error::{ApiError, ApiResult};
use crate::models::{ParticipantView, SessionDetails};
use crate::AppState;

pub fn session_routes() -> Router<AppState> {
    let student = Router::new()
        .route("/sessions/details", get(session_details))
        .route("/sessions/participants", get(session_participants))
        .layer(middleware::from_fn(require_student));

    // Status transitions come from the timer collaborator, an admin surface
    let admin = Router::new()
        .route("/sessions/status", post(update_status))
        .layer(middleware::from_fn(require_admin));

    student.merge(admin)
}

#[derive(Debug, Deserialize)]
struct SessionQuery {
    session_id: String,
}

/// GET /sessions/details?session_id=
async fn session_details(
    State(state): State<AppState>,
    Extension(StudentIdentity(student_id)): Extension<StudentIdentity>,
    Query(query): Query<SessionQuery>,
) -> ApiResult<Json<SessionDetails>> {
    let mut conn = state.db.acquire().await.map_err(internal)?;

    if !db::participants::is_participant(&mut conn, &query.session_id, &student_id).await? {
        return Err(ApiError::Forbidden(
            "Not authorized to view this session".to_string(),
        ));
    }

    let session = db::sessions::find(&mut conn, &query.session_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Session not found".to_string()))?;

    let venue = db::venues::find(&mut conn, &session.venue_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Venue not found".to_string()))?;

    Ok(Json(SessionDetails {
        id: session.id,
        venue: venue.name,
        topic: session.topic,
        status: session.status,
        level: session.level,
        start_time: session.start_time,
        end_time: session.end_time,
    }))
}

/// GET /sessions/participants?session_id=
///
/// The viewer's co-participants, self excluded.
async fn session_participants(
    State(state): State<AppState>,
    Extension(StudentIdentity(student_id)): Extension<StudentIdentity>,
    Query(query): Query<SessionQuery>,
) -> ApiResult<Json<serde_json::Value>> {
    let mut conn = state.db.acquire().await.map_err(internal)?;

    if !db::participants::is_participant(&mut conn, &query.session_id, &student_id).await? {
        return Err(ApiError::Forbidden(
            "Not authorized to view this session".to_string(),
        ));
    }

    let roster = db::participants::roster(&mut conn, &query.session_id).await?;
    let participants: Vec<ParticipantView> = roster
        .into_iter()
        .filter(|(id, _)| id != &student_id)
        .map(|(id, name)| ParticipantView { id, name })
        .collect();

    Ok(Json(json!({ "data": participants })))
}

#[derive(Debug, Deserialize)]
struct StatusRequest {
    session_id: String,
    status: String,
}

/// POST /sessions/status
///
/// Completed is terminal; attempts to move a completed session are no-ops.
async fn update_status(
    State(state): State<AppState>,
    Json(request): Json<StatusRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let status = SessionStatus::parse(&request.status)
        .ok_or_else(|| ApiError::BadRequest(format!("Invalid status: {}", request.status)))?;

    let mut conn = state.db.acquire().await.map_err(internal)?;

    if db::sessions::find(&mut conn, &request.session_id).await?.is_none() {
        return Err(ApiError::NotFound("Session not found".to_string()));
    }

    let changed =
        db::sessions::set_status(&mut conn, &request.session_id, status.as_str()).await?;

    if changed > 0 {
        let phase = match status {
            SessionStatus::Lobby => Some(SessionPhase::Lobby),
            SessionStatus::Active => Some(SessionPhase::Discussion),
            SessionStatus::Completed => Some(SessionPhase::Results),
            SessionStatus::Pending => None,
        };
        if let Some(phase) = phase {
            state.event_bus.emit(SessionEvent::PhaseChanged {
                session_id: Uuid::parse_str(&request.session_id).unwrap_or(Uuid::nil()),
                phase,
                timestamp: Utc::now(),
            });
        }
    }

    Ok(Json(json!({ "status": "updated", "changed": changed > 0 })))
}

fn internal(e: sqlx::Error) -> ApiError {
    ApiError::Internal(format!("Database error: {}", e))
}

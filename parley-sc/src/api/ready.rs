//! Lobby readiness API handlers

use axum::{
    extract::{Query, State},
    middleware,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use crate::api::identity::{require_student, StudentIdentity};
use crate::db;
use crate::error::{ApiError, ApiResult};
use crate::models::{ReadyRequest, ReadyStatus};
use crate::AppState;

pub fn ready_routes() -> Router<AppState> {
    Router::new()
        .route("/sessions/ready", post(update_ready).get(check_all_ready))
        .layer(middleware::from_fn(require_student))
}

/// POST /sessions/ready
async fn update_ready(
    State(state): State<AppState>,
    Extension(StudentIdentity(student_id)): Extension<StudentIdentity>,
    Json(request): Json<ReadyRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let mut conn = state.db.acquire().await.map_err(internal)?;

    if !db::participants::is_participant(&mut conn, &request.session_id, &student_id).await? {
        return Err(ApiError::Forbidden(
            "Not authorized for this session".to_string(),
        ));
    }

    db::ready::upsert(
        &mut conn,
        &request.session_id,
        &student_id,
        request.is_ready,
        Utc::now(),
    )
    .await?;

    Ok(Json(json!({ "status": "updated" })))
}

#[derive(Debug, Deserialize)]
struct ReadyQuery {
    session_id: String,
}

/// GET /sessions/ready?session_id=
async fn check_all_ready(
    State(state): State<AppState>,
    Query(query): Query<ReadyQuery>,
) -> ApiResult<Json<ReadyStatus>> {
    let mut conn = state.db.acquire().await.map_err(internal)?;
    let (ready, total) = db::ready::counts(&mut conn, &query.session_id).await?;

    Ok(Json(ReadyStatus {
        all_ready: total > 0 && ready >= total,
        ready_count: ready,
        total_participants: total,
    }))
}

fn internal(e: sqlx::Error) -> ApiError {
    ApiError::Internal(format!("Database error: {}", e))
}

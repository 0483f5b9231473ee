//! Results, completion, and progression API handlers

use axum::{
    extract::{Query, State},
    middleware,
    routing::get,
    Extension, Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use crate::api::identity::{require_student, StudentIdentity};
use crate::error::ApiResult;
use crate::models::{CompletionStatus, ProgressionStatus};
use crate::services::results;
use crate::AppState;

pub fn results_routes() -> Router<AppState> {
    Router::new()
        .route("/sessions/results", get(session_results))
        .route("/sessions/completion", get(completion_status))
        .route("/students/progression", get(progression_status))
        .layer(middleware::from_fn(require_student))
}

#[derive(Debug, Deserialize)]
struct SessionQuery {
    session_id: String,
}

/// GET /sessions/results?session_id=
///
/// Ranked final scores. Triggers scoring opportunistically once every
/// participant has completed; degrades to pending scores on failure.
async fn session_results(
    State(state): State<AppState>,
    Extension(StudentIdentity(student_id)): Extension<StudentIdentity>,
    Query(query): Query<SessionQuery>,
) -> ApiResult<Json<serde_json::Value>> {
    let rows =
        results::session_results(&state.db, &state.event_bus, &query.session_id, &student_id)
            .await?;

    Ok(Json(json!({
        "session_id": query.session_id,
        "results": rows,
    })))
}

/// GET /sessions/completion?session_id=
async fn completion_status(
    State(state): State<AppState>,
    Query(query): Query<SessionQuery>,
) -> ApiResult<Json<CompletionStatus>> {
    let status = results::completion_status(&state.db, &query.session_id).await?;
    Ok(Json(status))
}

/// GET /students/progression?session_id=
async fn progression_status(
    State(state): State<AppState>,
    Extension(StudentIdentity(student_id)): Extension<StudentIdentity>,
    Query(query): Query<SessionQuery>,
) -> ApiResult<Json<ProgressionStatus>> {
    let status = results::progression_status(
        &state.db,
        &state.event_bus,
        &query.session_id,
        &student_id,
    )
    .await?;

    Ok(Json(status))
}

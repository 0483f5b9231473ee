//! Token-join API handler

use axum::{
    extract::State,
    middleware,
    routing::post,
    Extension, Json, Router,
};

use crate::api::identity::{require_student, StudentIdentity};
use crate::error::{ApiError, ApiResult};
use crate::models::{JoinRequest, JoinResponse};
use crate::services::admission;
use crate::AppState;

pub fn join_routes() -> Router<AppState> {
    Router::new()
        .route("/sessions/join", post(join_session))
        .layer(middleware::from_fn(require_student))
}

/// POST /sessions/join
///
/// Scan an access token and enter its session. Succeeds idempotently for a
/// student who already joined with the same token.
async fn join_session(
    State(state): State<AppState>,
    Extension(StudentIdentity(student_id)): Extension<StudentIdentity>,
    Json(request): Json<JoinRequest>,
) -> ApiResult<Json<JoinResponse>> {
    if request.token_data.is_empty() {
        return Err(ApiError::BadRequest("Token data is required".to_string()));
    }

    let session_id = admission::join_by_token(
        &state.db,
        &state.event_bus,
        &state.config,
        &student_id,
        &request.token_data,
    )
    .await?;

    Ok(Json(JoinResponse {
        status: "joined".to_string(),
        session_id,
    }))
}

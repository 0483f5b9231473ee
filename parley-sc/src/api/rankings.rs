//! Ranking submission API handler

use axum::{
    extract::State,
    middleware,
    routing::post,
    Extension, Json, Router,
};

use crate::api::identity::{require_student, StudentIdentity};
use crate::error::ApiResult;
use crate::models::{RankingOutcome, RankingSubmission};
use crate::services::ranking;
use crate::AppState;

pub fn ranking_routes() -> Router<AppState> {
    Router::new()
        .route("/rankings", post(submit_rankings))
        .layer(middleware::from_fn(require_student))
}

/// POST /rankings
///
/// Submit per-question peer rankings. A resubmission for a question fully
/// replaces the earlier one.
async fn submit_rankings(
    State(state): State<AppState>,
    Extension(StudentIdentity(student_id)): Extension<StudentIdentity>,
    Json(request): Json<RankingSubmission>,
) -> ApiResult<Json<RankingOutcome>> {
    let outcome = ranking::submit_rankings(
        &state.db,
        &state.event_bus,
        &request.session_id,
        &student_id,
        &request.responses,
    )
    .await?;

    Ok(Json(outcome))
}

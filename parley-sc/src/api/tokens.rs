//! Access-token issuance API handlers

use axum::{
    extract::{Query, State},
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use crate::api::identity::require_admin;
use crate::error::{ApiError, ApiResult};
use crate::models::{IssueTokenRequest, TokenView};
use crate::services::tokens;
use crate::AppState;

pub fn token_routes() -> Router<AppState> {
    Router::new()
        .route("/tokens", post(issue_token))
        .route("/tokens/active", get(active_token))
        .layer(middleware::from_fn(require_admin))
}

/// POST /tokens
///
/// Issue a fresh capacity-bounded token for a venue, retiring its previous
/// ones.
async fn issue_token(
    State(state): State<AppState>,
    Json(request): Json<IssueTokenRequest>,
) -> ApiResult<Json<TokenView>> {
    let token = tokens::issue_token(
        &state.db,
        &request.venue_id,
        request.max_capacity,
        state.config.token_validity_minutes,
    )
    .await?;

    Ok(Json(token.into()))
}

#[derive(Debug, Deserialize)]
struct ActiveTokenQuery {
    venue_id: String,
}

/// GET /tokens/active?venue_id=
async fn active_token(
    State(state): State<AppState>,
    Query(query): Query<ActiveTokenQuery>,
) -> ApiResult<Json<TokenView>> {
    let token = tokens::active_token(&state.db, &query.venue_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("No active token for this venue".to_string()))?;

    Ok(Json(token.into()))
}

//! Venue booking API handlers

use axum::{
    extract::{Query, State},
    middleware,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use crate::api::identity::{require_student, StudentIdentity};
use crate::error::ApiResult;
use crate::models::{BookingRequest, BookingResponse, BookingView, CancelRequest, VenueAvailability};
use crate::services::booking;
use crate::AppState;

pub fn booking_routes() -> Router<AppState> {
    Router::new()
        .route("/bookings", post(book_venue).get(list_bookings))
        .route("/bookings/cancel", post(cancel_booking))
        .route("/bookings/check", get(check_booking))
        .route("/venues/available", get(available_venues))
        .layer(middleware::from_fn(require_student))
}

/// POST /bookings
async fn book_venue(
    State(state): State<AppState>,
    Extension(StudentIdentity(student_id)): Extension<StudentIdentity>,
    Json(request): Json<BookingRequest>,
) -> ApiResult<Json<BookingResponse>> {
    let outcome = booking::book_venue(
        &state.db,
        &state.event_bus,
        &state.config,
        &student_id,
        &request.venue_id,
    )
    .await?;

    Ok(Json(BookingResponse {
        status: "booked".to_string(),
        session_id: outcome.session_id,
        venue_id: request.venue_id,
        booked_seats: outcome.booked_seats,
        remaining_seats: outcome.remaining_seats,
    }))
}

/// GET /bookings
async fn list_bookings(
    State(state): State<AppState>,
    Extension(StudentIdentity(student_id)): Extension<StudentIdentity>,
) -> ApiResult<Json<Vec<BookingView>>> {
    let bookings = booking::list_bookings(&state.db, &student_id).await?;
    Ok(Json(bookings))
}

/// POST /bookings/cancel
async fn cancel_booking(
    State(state): State<AppState>,
    Extension(StudentIdentity(student_id)): Extension<StudentIdentity>,
    Json(request): Json<CancelRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    booking::cancel_booking(&state.db, &student_id, &request.venue_id).await?;
    Ok(Json(json!({ "status": "cancelled" })))
}

#[derive(Debug, Deserialize)]
struct CheckBookingQuery {
    venue_id: String,
}

/// GET /bookings/check?venue_id=
async fn check_booking(
    State(state): State<AppState>,
    Extension(StudentIdentity(student_id)): Extension<StudentIdentity>,
    Query(query): Query<CheckBookingQuery>,
) -> ApiResult<Json<serde_json::Value>> {
    let is_booked = booking::check_booking(&state.db, &student_id, &query.venue_id).await?;
    Ok(Json(json!({ "is_booked": is_booked })))
}

#[derive(Debug, Deserialize)]
struct AvailableQuery {
    level: i64,
}

/// GET /venues/available?level=
async fn available_venues(
    State(state): State<AppState>,
    Query(query): Query<AvailableQuery>,
) -> ApiResult<Json<Vec<VenueAvailability>>> {
    let venues = booking::list_available_venues(&state.db, query.level).await?;
    Ok(Json(venues))
}

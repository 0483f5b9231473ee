//! parley-sc library interface
//!
//! Exposes the coordination core for integration testing.

pub mod api;
pub mod db;
pub mod error;
pub mod models;
pub mod services;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use parley_common::config::ServiceConfig;
use parley_common::events::EventBus;
use sqlx::SqlitePool;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Event bus for the notification sink (side channel, injected into the
    /// core; never consulted for correctness)
    pub event_bus: EventBus,
    /// Service configuration (durations, sweep interval)
    pub config: ServiceConfig,
    /// Service startup timestamp for uptime reporting
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(db: SqlitePool, event_bus: EventBus, config: ServiceConfig) -> Self {
        Self {
            db,
            event_bus,
            config,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;

    Router::new()
        .merge(api::join_routes())
        .merge(api::booking_routes())
        .merge(api::ranking_routes())
        .merge(api::results_routes())
        .merge(api::ready_routes())
        .merge(api::session_routes())
        .merge(api::token_routes())
        .route("/events", get(api::event_stream))
        .merge(api::health_routes())
        .with_state(state)
}

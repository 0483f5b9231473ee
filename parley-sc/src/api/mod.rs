//! HTTP API handlers for parley-sc

pub mod bookings;
pub mod health;
pub mod identity;
pub mod join;
pub mod rankings;
pub mod ready;
pub mod results;
pub mod sessions;
pub mod sse;
pub mod tokens;

pub use bookings::booking_routes;
pub use health::health_routes;
pub use identity::{require_admin, require_student, AdminIdentity, StudentIdentity};
pub use join::join_routes;
pub use rankings::ranking_routes;
pub use ready::ready_routes;
pub use results::results_routes;
pub use sessions::session_routes;
pub use sse::event_stream;
pub use tokens::token_routes;

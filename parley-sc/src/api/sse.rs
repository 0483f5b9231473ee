//! Server-Sent Events stream for session phase notifications

use axum::{
    extract::{Query, State},
    response::sse::{Event, Sse},
};
use futures::stream::Stream;
use serde::Deserialize;
use std::convert::Infallible;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct EventStreamQuery {
    /// Restrict the stream to one session's events
    pub session_id: Option<Uuid>,
}

/// GET /events - SSE stream of session lifecycle events
///
/// Fire-and-forget notification sink; clients that fall behind drop events.
pub async fn event_stream(
    State(state): State<AppState>,
    Query(query): Query<EventStreamQuery>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    info!(session_id = ?query.session_id, "New SSE client connected");

    let mut rx = state.event_bus.subscribe();
    let filter = query.session_id;

    let stream = async_stream::stream! {
        loop {
            tokio::select! {
                _ = tokio::time::sleep(Duration::from_secs(15)) => {
                    debug!("SSE: sending heartbeat");
                    yield Ok(Event::default().comment("heartbeat"));
                }

                Ok(event) = rx.recv() => {
                    if let Some(wanted) = filter {
                        if event.session_id() != wanted {
                            continue;
                        }
                    }

                    match serde_json::to_string(&event) {
                        Ok(event_json) => {
                            yield Ok(Event::default().data(event_json));
                        }
                        Err(e) => {
                            warn!("SSE: failed to serialize event: {}", e);
                        }
                    }
                }
            }
        }
    };

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("heartbeat"),
    )
}

//! Event types for the Parley notification channel
//!
//! Provides the shared `SessionEvent` definitions and the `EventBus` used to
//! fan phase changes out to connected clients. The bus is a side channel: it
//! is injected into the coordination core and has no bearing on admission or
//! scoring correctness. Events are broadcast fire-and-forget and can be
//! serialized for SSE transmission.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Session lifecycle phases visible to clients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Lobby,
    Prep,
    Discussion,
    Survey,
    Results,
}

/// Parley event types
///
/// Shared across services; broadcast via EventBus.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SessionEvent {
    /// A session instance was created (by booking or token join)
    SessionCreated {
        session_id: Uuid,
        venue_id: Uuid,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A student was admitted to a session
    ParticipantJoined {
        session_id: Uuid,
        student_id: Uuid,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// The session moved to a new phase
    PhaseChanged {
        session_id: Uuid,
        phase: SessionPhase,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A responder finished ranking every question
    SurveyCompleted {
        session_id: Uuid,
        student_id: Uuid,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Scoring finalized and the session retired
    SessionRetired {
        session_id: Uuid,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl SessionEvent {
    /// Session this event belongs to
    pub fn session_id(&self) -> Uuid {
        match self {
            SessionEvent::SessionCreated { session_id, .. }
            | SessionEvent::ParticipantJoined { session_id, .. }
            | SessionEvent::PhaseChanged { session_id, .. }
            | SessionEvent::SurveyCompleted { session_id, .. }
            | SessionEvent::SessionRetired { session_id, .. } => *session_id,
        }
    }
}

/// Broadcast bus for session events
///
/// Thin wrapper over `tokio::sync::broadcast`. Slow subscribers drop old
/// events rather than applying backpressure to emitters.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<SessionEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with the given channel capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers, returning the subscriber count.
    ///
    /// Zero subscribers is not an error: emitters never depend on a listener
    /// being present.
    pub fn emit(&self, event: SessionEvent) -> usize {
        match self.tx.send(event) {
            Ok(n) => n,
            Err(_) => {
                tracing::trace!("event emitted with no subscribers");
                0
            }
        }
    }

    /// Configured buffer capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn emit_reaches_subscriber() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        let id = Uuid::new_v4();
        let n = bus.emit(SessionEvent::SessionRetired {
            session_id: id,
            timestamp: chrono::Utc::now(),
        });
        assert_eq!(n, 1);

        let event = rx.recv().await.unwrap();
        assert_eq!(event.session_id(), id);
    }

    #[test]
    fn emit_without_subscribers_is_ok() {
        let bus = EventBus::new(16);
        let n = bus.emit(SessionEvent::PhaseChanged {
            session_id: Uuid::new_v4(),
            phase: SessionPhase::Survey,
            timestamp: chrono::Utc::now(),
        });
        assert_eq!(n, 0);
    }
}

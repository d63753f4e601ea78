//! Domain event system: decoupled observation of the routing pipeline.
//!
//! Events are published as a turn moves through the supervisor and the
//! actors. The gateway subscribes to keep the turn counters it reports on
//! `/health`; the orchestrator never knows who is listening.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

/// All domain events in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DomainEvent {
    /// The supervisor picked the next step
    RouteDecided {
        session: String,
        decision: String,
        /// Which rung of the fallback ladder produced it
        source: String,
        timestamp: DateTime<Utc>,
    },

    /// An actor produced its reply
    ActorInvoked {
        session: String,
        actor: String,
        reply_chars: usize,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },

    /// A backend call failed and was recovered locally
    BackendFailed {
        context: String,
        error_message: String,
        timestamp: DateTime<Utc>,
    },

    /// The state machine reached the terminal exit
    TurnCompleted {
        session: String,
        decisions: usize,
        answered: bool,
        timestamp: DateTime<Utc>,
    },
}

/// A broadcast-based event bus for domain events.
///
/// Uses `tokio::sync::broadcast` for multi-consumer pub/sub.
pub struct EventBus {
    sender: broadcast::Sender<Arc<DomainEvent>>,
}

impl EventBus {
    /// Create a new event bus with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all subscribers.
    pub fn publish(&self, event: DomainEvent) {
        // No subscribers is fine
        let _ = self.sender.send(Arc::new(event));
    }

    /// Subscribe to receive events.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<DomainEvent>> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

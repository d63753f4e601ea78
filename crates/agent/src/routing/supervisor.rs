//! The supervisor: asks the backend who should act next.
//!
//! One backend call per decision, then the pure ladder in
//! [`signal`](super::signal). Never returns an error: a failed call is
//! logged, published, and treated as no signal.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use serde_json::json;
use switchyard_core::event::{DomainEvent, EventBus};
use switchyard_core::message::{ConversationState, Turn};
use switchyard_core::provider::ResponseSchema;
use switchyard_core::route::RouteDecision;
use tracing::{debug, info, warn};

use super::roster::Roster;
use super::signal::{DecisionSource, RouteSignal, loop_guard_applies, parse_reply, resolve};
use crate::backend::{CallOptions, ChatBackend};

/// Routing calls want a single short, stable answer.
const ROUTING_TEMPERATURE: f32 = 0.0;

pub struct Supervisor {
    backend: Arc<ChatBackend>,
    roster: Arc<Roster>,
    prompt: String,
    structured_output: bool,
    event_bus: Arc<EventBus>,
}

impl Supervisor {
    pub fn new(backend: Arc<ChatBackend>, roster: Arc<Roster>, prompt: impl Into<String>, event_bus: Arc<EventBus>) -> Self {
        Self {
            backend,
            roster,
            prompt: prompt.into(),
            structured_output: false,
            event_bus,
        }
    }

    /// Ask the backend for a JSON-schema constrained reply.
    pub fn with_structured_output(mut self, enabled: bool) -> Self {
        self.structured_output = enabled;
        self
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    /// The routing conversation: supervisor prompt, the roster with each
    /// actor's description, the turns so far, and the closing instruction
    /// listing every legal answer.
    pub fn routing_turns(&self, state: &ConversationState) -> Vec<Turn> {
        let options = self.roster.options().join(", ");
        let mut turns = Vec::with_capacity(state.len() + 3);
        turns.push(Turn::system(self.prompt.as_str()));
        turns.push(Turn::system(self.roster_listing()));
        turns.extend(state.turns().iter().cloned());
        turns.push(Turn::system(format!(
            "Given the conversation above, who should act next? \
             Reply with ONLY one word from this list: [{options}]. \
             No explanation, no other text."
        )));
        turns
    }

    fn roster_listing(&self) -> String {
        let mut listing = String::from("Available actors:");
        for entry in self.roster.entries() {
            listing.push_str("\n- ");
            listing.push_str(&entry.name);
            if !entry.description.is_empty() {
                listing.push_str(": ");
                listing.push_str(&entry.description);
            }
        }
        listing
    }

    fn route_schema(&self) -> ResponseSchema {
        ResponseSchema {
            name: "route".into(),
            schema: json!({
                "type": "object",
                "properties": {
                    "next": { "type": "string", "enum": self.roster.options() }
                },
                "required": ["next"],
                "additionalProperties": false
            }),
        }
    }

    /// Pick the next step for `state`.
    pub async fn decide(&self, state: &ConversationState) -> (RouteDecision, DecisionSource) {
        let session = state.session().to_string();

        // The guard overrides whatever the backend would say.
        let signal = if loop_guard_applies(state) {
            RouteSignal::NoMatch
        } else {
            self.ask_backend(state).await
        };

        let (decision, source) = resolve(signal, state, &self.roster);
        info!(session = %session, next = %decision, source = %source, "Route decided");

        self.event_bus.publish(DomainEvent::RouteDecided {
            session,
            decision: decision.to_string(),
            source: source.to_string(),
            timestamp: Utc::now(),
        });

        (decision, source)
    }

    async fn ask_backend(&self, state: &ConversationState) -> RouteSignal {
        let turns = self.routing_turns(state);
        let options = CallOptions {
            temperature: Some(ROUTING_TEMPERATURE),
            schema: self.structured_output.then(|| self.route_schema()),
        };

        let started = Instant::now();
        match self.backend.complete_with(&turns, options).await {
            Ok(reply) => {
                let signal = parse_reply(&reply, &self.roster);
                debug!(
                    reply = %reply.chars().take(200).collect::<String>(),
                    signal = ?signal,
                    duration_ms = started.elapsed().as_millis() as u64,
                    "Supervisor reply"
                );
                signal
            }
            Err(e) => {
                warn!(error = %e, "Supervisor backend call failed, falling back to keywords");
                self.event_bus.publish(DomainEvent::BackendFailed {
                    context: "supervisor".into(),
                    error_message: e.to_string(),
                    timestamp: Utc::now(),
                });
                RouteSignal::NoMatch
            }
        }
    }
}

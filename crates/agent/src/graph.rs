//! The orchestration state machine.
//!
//! # Architecture
//!
//! ```text
//!   user turn
//!       │
//!       ▼
//! ┌────────────┐  actor   ┌─────────────┐
//! │  Decision  │ ───────► │ Actor(name) │
//! │(supervisor)│ ◄─────── │             │
//! └─────┬──────┘  always  └─────────────┘
//!       │ FINISH
//!       ▼
//!    Terminal
//! ```
//!
//! Entry is always the decision node. Every actor edge leads back to it.
//! The loop guard ends a turn after at most two actor replies; a hard
//! decision ceiling covers misconfigured routers.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use switchyard_config::AppConfig;
use switchyard_core::actor::Actor;
use switchyard_core::error::{Error, RosterError};
use switchyard_core::event::{DomainEvent, EventBus};
use switchyard_core::message::{ConversationState, Role};
use switchyard_core::provider::Provider;
use switchyard_core::route::RouteDecision;
use tracing::{debug, warn};

use crate::actors::PromptedActor;
use crate::backend::ChatBackend;
use crate::routing::{Roster, Supervisor};

/// Trace label for the decision node.
pub const SUPERVISOR_NODE: &str = "supervisor";

/// Default ceiling on decisions per external turn.
pub const DEFAULT_MAX_DECISIONS: usize = 8;

/// A position in the graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Decision,
    Actor(String),
}

impl Node {
    pub fn label(&self) -> &str {
        match self {
            Self::Decision => SUPERVISOR_NODE,
            Self::Actor(name) => name,
        }
    }
}

/// What one run through the graph did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TurnReport {
    /// Node labels in visit order
    pub trace: Vec<String>,
    pub decisions: usize,
    /// Turns appended by actors
    pub appended: usize,
    /// The decision ceiling stopped the run
    pub exhausted: bool,
}

pub struct Orchestrator {
    supervisor: Supervisor,
    actors: HashMap<String, Arc<dyn Actor>>,
    max_decisions: usize,
    event_bus: Arc<EventBus>,
}

impl Orchestrator {
    /// Wire a supervisor to its actors. Every roster name needs exactly one
    /// actor, and every actor must be on the roster.
    pub fn new(supervisor: Supervisor, actors: Vec<Arc<dyn Actor>>, event_bus: Arc<EventBus>) -> Result<Self, Error> {
        let roster = supervisor.roster();
        let mut by_name: HashMap<String, Arc<dyn Actor>> = HashMap::with_capacity(actors.len());

        for actor in actors {
            let name = actor.name().to_string();
            if !roster.contains(&name) {
                return Err(RosterError::UnknownActor(name).into());
            }
            if by_name.insert(name.clone(), actor).is_some() {
                return Err(RosterError::DuplicateActor(name).into());
            }
        }
        if let Some(missing) = roster.names().find(|n| !by_name.contains_key(*n)) {
            return Err(RosterError::UnknownActor(missing.to_string()).into());
        }

        Ok(Self {
            supervisor,
            actors: by_name,
            max_decisions: DEFAULT_MAX_DECISIONS,
            event_bus,
        })
    }

    /// Build the configured roster of prompted actors over one backend.
    pub fn from_config(config: &AppConfig, provider: Arc<dyn Provider>, event_bus: Arc<EventBus>) -> Result<Self, Error> {
        let roster = Arc::new(Roster::from_config(&config.actors)?);
        let backend = Arc::new(ChatBackend::from_config(provider, config));

        let supervisor = Supervisor::new(
            backend.clone(),
            roster,
            config.supervisor.prompt.as_str(),
            event_bus.clone(),
        )
        .with_structured_output(config.backend.structured_output);

        let actors: Vec<Arc<dyn Actor>> = config
            .actors
            .iter()
            .map(|a| Arc::new(PromptedActor::from_config(a, backend.clone())) as Arc<dyn Actor>)
            .collect();

        Ok(Self::new(supervisor, actors, event_bus)?.with_max_decisions(config.supervisor.max_decisions))
    }

    pub fn with_max_decisions(mut self, max: usize) -> Self {
        self.max_decisions = max.max(1);
        self
    }

    pub fn roster(&self) -> &Roster {
        self.supervisor.roster()
    }

    pub fn actor(&self, name: &str) -> Option<&Arc<dyn Actor>> {
        self.actors.get(name)
    }

    pub fn event_bus(&self) -> &Arc<EventBus> {
        &self.event_bus
    }

    /// Run the graph from the decision node until the terminal.
    ///
    /// Appends one assistant turn per actor visit and leaves `next` at the
    /// terminal. Earlier turns are never touched.
    pub async fn run(&self, state: &mut ConversationState) -> TurnReport {
        let mut report = TurnReport::default();
        let mut node = Node::Decision;

        loop {
            report.trace.push(node.label().to_string());

            match node {
                Node::Decision => {
                    report.decisions += 1;
                    let (decision, _) = self.supervisor.decide(state).await;
                    state.set_next(decision.clone());

                    match decision {
                        RouteDecision::Finish => break,
                        RouteDecision::Actor(_) if report.decisions >= self.max_decisions => {
                            warn!(
                                session = %state.session(),
                                max = self.max_decisions,
                                "Decision ceiling reached, ending turn"
                            );
                            state.set_next(RouteDecision::Finish);
                            report.exhausted = true;
                            break;
                        }
                        RouteDecision::Actor(name) => node = Node::Actor(name),
                    }
                }
                Node::Actor(ref name) => {
                    let Some(actor) = self.actors.get(name) else {
                        // Unreachable: construction checks the roster against the actor map.
                        warn!(actor = %name, "No actor registered for roster name");
                        state.set_next(RouteDecision::Finish);
                        break;
                    };

                    let started = Instant::now();
                    let mut turn = actor.respond(state).await;
                    turn.role = Role::Assistant;
                    turn.actor = Some(name.clone());

                    let reply_chars = turn.content.chars().count();
                    let duration_ms = started.elapsed().as_millis() as u64;
                    debug!(actor = %name, reply_chars, duration_ms, "Actor replied");

                    state.push(turn);
                    report.appended += 1;

                    self.event_bus.publish(DomainEvent::ActorInvoked {
                        session: state.session().to_string(),
                        actor: name.clone(),
                        reply_chars,
                        duration_ms,
                        timestamp: Utc::now(),
                    });

                    node = Node::Decision;
                }
            }
        }

        report
    }
}

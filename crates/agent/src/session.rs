//! Session store: one conversation per session id.
//!
//! Sessions run independently; turns within a session are serialized by a
//! per-session async mutex. A session's version is its turn count, so a
//! caller holding an old outcome can tell whether anything was appended
//! since.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use switchyard_core::error::Error;
use switchyard_core::event::DomainEvent;
use switchyard_core::message::{ConversationState, Role, SessionId, Turn};
use tokio::sync::{Mutex, RwLock};
use tracing::info;

use crate::graph::Orchestrator;

/// Reply shown when no actor produced a usable answer.
pub const NO_RESPONSE: &str = "No response from agents.";

/// The result of one external turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnOutcome {
    pub session: SessionId,
    /// The final answer, if an actor produced one this turn
    pub reply: Option<String>,
    /// Node labels in visit order
    pub trace: Vec<String>,
    /// Turns appended by this turn, the user question included
    pub appended: usize,
    /// Session version after the turn
    pub version: usize,
}

impl TurnOutcome {
    pub fn answered(&self) -> bool {
        self.reply.is_some()
    }

    pub fn reply_or_default(&self) -> &str {
        self.reply.as_deref().unwrap_or(NO_RESPONSE)
    }
}

/// The last assistant turn whose content is non-empty and is not just the
/// question echoed back (compared case-insensitively).
pub fn final_answer(turns: &[Turn], question: &str) -> Option<String> {
    let question = question.trim().to_lowercase();
    turns
        .iter()
        .rev()
        .filter(|t| t.role == Role::Assistant)
        .map(|t| t.content.trim())
        .find(|content| !content.is_empty() && content.to_lowercase() != question)
        .map(str::to_string)
}

pub struct SessionStore {
    orchestrator: Arc<Orchestrator>,
    sessions: RwLock<HashMap<SessionId, Arc<Mutex<ConversationState>>>>,
}

impl SessionStore {
    pub fn new(orchestrator: Arc<Orchestrator>) -> Self {
        Self {
            orchestrator,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    /// Like [`turn`](Self::turn), taking a raw session key.
    pub async fn ask(&self, session: &str, question: &str) -> Result<TurnOutcome, Error> {
        let session = SessionId::parse(session)?;
        self.turn(&session, question).await
    }

    /// Append the question to the session and run the graph to the terminal.
    pub async fn turn(&self, session: &SessionId, question: &str) -> Result<TurnOutcome, Error> {
        let entry = self.entry(session).await;
        let mut state = entry.lock().await;

        state.push(Turn::user(question));
        let start = state.len();
        info!(session = %session, turns = start, "Turn started");

        let report = self.orchestrator.run(&mut state).await;
        let reply = final_answer(&state.turns()[start..], question);

        self.orchestrator.event_bus().publish(DomainEvent::TurnCompleted {
            session: session.to_string(),
            decisions: report.decisions,
            answered: reply.is_some(),
            timestamp: Utc::now(),
        });
        info!(
            session = %session,
            decisions = report.decisions,
            trace = ?report.trace,
            answered = reply.is_some(),
            "Turn completed"
        );

        Ok(TurnOutcome {
            session: session.clone(),
            reply,
            trace: report.trace,
            appended: report.appended + 1,
            version: state.version(),
        })
    }

    async fn entry(&self, session: &SessionId) -> Arc<Mutex<ConversationState>> {
        if let Some(entry) = self.sessions.read().await.get(session) {
            return entry.clone();
        }
        self.sessions
            .write()
            .await
            .entry(session.clone())
            .or_insert_with(|| Arc::new(Mutex::new(ConversationState::new(session.clone()))))
            .clone()
    }

    /// A copy of the session's conversation, waiting for any running turn.
    pub async fn snapshot(&self, session: &SessionId) -> Option<ConversationState> {
        let entry = self.sessions.read().await.get(session).cloned()?;
        let state = entry.lock().await;
        Some(state.clone())
    }

    pub async fn version(&self, session: &SessionId) -> Option<usize> {
        self.snapshot(session).await.map(|s| s.version())
    }

    /// Drop a session. Retention is the caller's decision.
    pub async fn remove(&self, session: &SessionId) -> bool {
        self.sessions.write().await.remove(session).is_some()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

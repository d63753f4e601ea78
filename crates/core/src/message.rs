//! Turn and conversation domain types.
//!
//! These are the core value objects that flow through the router:
//! user asks a question → a Turn is appended to the session's
//! `ConversationState` → the supervisor picks an actor → the actor's reply is
//! appended as another Turn.
//!
//! `WireMessage` is the restricted two-role shape the generative backend
//! accepts. It is derived from a conversation on every call and never stored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::SessionError;
use crate::route::RouteDecision;

/// Opaque identifier scoping one conversation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    /// Accept any non-empty string as a session key.
    pub fn parse(s: impl Into<String>) -> Result<Self, SessionError> {
        let s = s.into();
        if s.trim().is_empty() {
            return Err(SessionError::EmptyId);
        }
        Ok(Self(s))
    }

    /// Generate a fresh random session key.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The role of a turn's author in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The end user
    User,
    /// A responder (or the supervisor speaking as assistant)
    Assistant,
    /// Instructions for the backend
    System,
}

/// One role-tagged message in a conversation's append-only log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    /// Unique turn ID
    pub id: String,

    /// Who authored this turn
    pub role: Role,

    /// The text content
    pub content: String,

    /// Which actor produced this turn (assistant turns only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor: Option<String>,

    /// Timestamp
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    fn with_role(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            actor: None,
            timestamp: Utc::now(),
        }
    }

    /// Create a new user turn.
    pub fn user(content: impl Into<String>) -> Self {
        Self::with_role(Role::User, content)
    }

    /// Create a new assistant turn.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::with_role(Role::Assistant, content)
    }

    /// Create a new system turn.
    pub fn system(content: impl Into<String>) -> Self {
        Self::with_role(Role::System, content)
    }

    /// Tag an assistant turn with the actor that produced it.
    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = Some(actor.into());
        self
    }
}

/// A session's conversation: an append-only log of turns plus the pending
/// routing decision.
///
/// Prior turns are never edited. The only mutations are `push` and
/// `set_next`, so any prefix observed between steps is a valid state to
/// resume from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationState {
    session: SessionId,
    turns: Vec<Turn>,
    next: RouteDecision,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ConversationState {
    /// Create an empty conversation for a session.
    pub fn new(session: SessionId) -> Self {
        let now = Utc::now();
        Self {
            session,
            turns: Vec::new(),
            next: RouteDecision::Finish,
            created_at: now,
            updated_at: now,
        }
    }

    /// Build a conversation from existing turns (tests, replay).
    pub fn from_turns(session: SessionId, turns: Vec<Turn>) -> Self {
        let mut state = Self::new(session);
        for turn in turns {
            state.push(turn);
        }
        state
    }

    pub fn session(&self) -> &SessionId {
        &self.session
    }

    /// Append a turn.
    pub fn push(&mut self, turn: Turn) {
        self.updated_at = Utc::now();
        self.turns.push(turn);
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Version stamp: the number of turns appended so far.
    pub fn version(&self) -> usize {
        self.turns.len()
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    /// The most recent user turn, if any.
    pub fn last_user(&self) -> Option<&Turn> {
        self.turns.iter().rev().find(|t| t.role == Role::User)
    }

    pub fn next(&self) -> &RouteDecision {
        &self.next
    }

    pub fn set_next(&mut self, next: RouteDecision) {
        self.updated_at = Utc::now();
        self.next = next;
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

/// Roles the backend wire protocol accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WireRole {
    User,
    Assistant,
}

/// One entry of the backend-protocol-shaped message sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireMessage {
    pub role: WireRole,
    pub content: String,
}

impl WireMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: WireRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: WireRole::Assistant,
            content: content.into(),
        }
    }
}

//! Routing decision type.

use serde::{Deserialize, Serialize};

/// The reserved option that ends the current external turn.
pub const TERMINAL: &str = "FINISH";

/// The supervisor's choice of what happens next.
///
/// Serialized as a bare string: the actor name, or `"FINISH"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum RouteDecision {
    /// Invoke the named roster actor.
    Actor(String),
    /// End the turn.
    Finish,
}

impl RouteDecision {
    pub fn actor(name: impl Into<String>) -> Self {
        Self::Actor(name.into())
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finish)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Actor(name) => name,
            Self::Finish => TERMINAL,
        }
    }
}

impl std::fmt::Display for RouteDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<RouteDecision> for String {
    fn from(decision: RouteDecision) -> Self {
        decision.as_str().to_string()
    }
}

impl From<String> for RouteDecision {
    fn from(s: String) -> Self {
        if s.eq_ignore_ascii_case(TERMINAL) {
            Self::Finish
        } else {
            Self::Actor(s)
        }
    }
}

//! Route signals and the pure fallback ladder.
//!
//! The supervisor's reply is first classified into a [`RouteSignal`], then
//! [`resolve`] applies the loop guard and the keyword fallback against the
//! conversation state. Neither step touches the network, so the whole
//! ladder is testable with plain values.

use serde_json::Value;
use switchyard_core::message::{ConversationState, Role};
use switchyard_core::route::RouteDecision;

use super::roster::Roster;

/// What the backend reply said, before any override.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteSignal {
    /// A JSON object with a legal `next` value
    Structured(RouteDecision),
    /// A roster name (or "finish") found in free text
    Text(RouteDecision),
    /// Nothing usable, or the backend failed
    NoMatch,
}

/// Which rung of the ladder produced the final decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionSource {
    Structured,
    Text,
    Keyword,
    LoopGuard,
    NoMatch,
}

impl DecisionSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Structured => "structured",
            Self::Text => "text",
            Self::Keyword => "keyword",
            Self::LoopGuard => "loop_guard",
            Self::NoMatch => "no_match",
        }
    }
}

impl std::fmt::Display for DecisionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a supervisor reply.
pub fn parse_reply(reply: &str, roster: &Roster) -> RouteSignal {
    if let Some(decision) = structured_next(reply, roster) {
        return RouteSignal::Structured(decision);
    }
    match roster.scan_text(reply) {
        Some(decision) => RouteSignal::Text(decision),
        None => RouteSignal::NoMatch,
    }
}

/// Pull a legal `next` out of a JSON reply: bare, fenced, or embedded in prose.
fn structured_next(reply: &str, roster: &Roster) -> Option<RouteDecision> {
    let trimmed = reply.trim();
    let unfenced = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.trim_end().strip_suffix("```"))
        .map(str::trim);

    let candidates = [Some(trimmed), unfenced, embedded_object(trimmed)];
    candidates.into_iter().flatten().find_map(|candidate| {
        let value: Value = serde_json::from_str(candidate).ok()?;
        let next = value.get("next")?.as_str()?;
        roster.resolve(next)
    })
}

fn embedded_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| &text[start..=end])
}

/// Whether the loop guard forces the terminal: the last turn came from an
/// assistant and the conversation holds more than two turns.
pub fn loop_guard_applies(state: &ConversationState) -> bool {
    state.len() > 2 && state.last().is_some_and(|t| t.role == Role::Assistant)
}

/// Turn a signal into the final decision.
///
/// 1. Loop guard: forced terminal.
/// 2. Actor signal: taken as is.
/// 3. Terminal or no signal: the latest user turn is matched against the
///    keyword table; no match means terminal.
///
/// Total: the result is always a roster member or the terminal.
pub fn resolve(signal: RouteSignal, state: &ConversationState, roster: &Roster) -> (RouteDecision, DecisionSource) {
    if loop_guard_applies(state) {
        return (RouteDecision::Finish, DecisionSource::LoopGuard);
    }

    let (decision, source) = match signal {
        RouteSignal::Structured(d) => (d, DecisionSource::Structured),
        RouteSignal::Text(d) => (d, DecisionSource::Text),
        RouteSignal::NoMatch => (RouteDecision::Finish, DecisionSource::NoMatch),
    };

    if let RouteDecision::Actor(name) = &decision {
        if roster.contains(name) {
            return (decision, source);
        }
    }

    let inferred = state
        .last_user()
        .and_then(|turn| roster.match_keywords(&turn.content));
    match inferred {
        Some(actor) => (RouteDecision::actor(actor), DecisionSource::Keyword),
        None => (RouteDecision::Finish, source),
    }
}

//! Actor trait: a named responder the supervisor can route to.

use async_trait::async_trait;

use crate::message::{ConversationState, Turn};

/// A stateless responder.
///
/// An actor sees the whole conversation and answers with one assistant
/// turn. Actors never fail from the router's point of view: a responder
/// whose backend is down puts the error text in its reply instead.
#[async_trait]
pub trait Actor: Send + Sync {
    /// Roster name (e.g., "economy_agent"). Must be unique and not `FINISH`.
    fn name(&self) -> &str;

    /// One-line description listed on `/actors`. The routing prompt takes
    /// descriptions from the roster instead.
    fn description(&self) -> &str {
        ""
    }

    /// Produce the reply turn for the current conversation.
    async fn respond(&self, state: &ConversationState) -> Turn;
}

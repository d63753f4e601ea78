//! The Switchyard routing core.
//!
//! A conversation moves through a fixed graph:
//!
//! 1. **Receive** a user question for a session
//! 2. **Decide**: the supervisor asks the backend who should act next,
//!    falling back to text scanning and keyword rules
//! 3. **Act**: the chosen actor answers with the full conversation in view
//! 4. **Return** to step 2 until the supervisor picks `FINISH`
//!
//! Every backend call is normalized to the strict user/assistant protocol
//! and trimmed to the context window first (see [`context`]).

pub mod actors;
pub mod backend;
pub mod context;
pub mod graph;
pub mod routing;
pub mod session;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use actors::{FnActor, PromptedActor};
pub use backend::{CallOptions, ChatBackend};
pub use context::{ContextWindow, Fitted};
pub use graph::{Node, Orchestrator, SUPERVISOR_NODE, TurnReport};
pub use routing::{DecisionSource, Roster, RouteSignal, Supervisor};
pub use session::{NO_RESPONSE, SessionStore, TurnOutcome, final_answer};

//! Route decisions: who acts next.
//!
//! ```text
//! backend reply ──► parse_reply ──► RouteSignal
//!                                      │
//!              ConversationState ──► resolve ──► (RouteDecision, DecisionSource)
//!                                      │
//!                        loop guard, keyword table (Roster)
//! ```

pub mod roster;
pub mod signal;
pub mod supervisor;

pub use roster::{KeywordRule, Roster, RosterEntry};
pub use signal::{DecisionSource, RouteSignal, loop_guard_applies, parse_reply, resolve};
pub use supervisor::Supervisor;

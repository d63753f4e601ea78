//! Context shaping for backend calls.
//!
//! Every call to the generative backend goes through the same two steps:
//!
//! | Step | Module | Guarantees |
//! |------|--------|------------|
//! | 1. Normalize | [`normalize`] | No system entries, strict alternation, user first |
//! | 2. Fit | [`budget`] | Input cost within the window's budget, head kept with priority |
//!
//! Token costs come from the character heuristic in [`token`].

pub mod budget;
pub mod normalize;
pub mod token;

pub use budget::{ContextWindow, Fitted, trim_to_budget};
pub use normalize::{CONTINUE_PLACEHOLDER, SYSTEM_PREFIX, collapse, is_well_formed, normalize};
pub use token::{estimate_sequence_tokens, estimate_tokens};

//! # Switchyard Core
//!
//! Domain types, traits, and error definitions for the Switchyard
//! conversational router. This crate has **zero framework dependencies**:
//! it defines the domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every collaborator at the edge of the router (the generative backend,
//! the responders) is defined as a trait here. Implementations live in their
//! respective crates. This enables:
//! - Swapping backends via configuration
//! - Easy testing with scripted/stub implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod actor;
pub mod error;
pub mod event;
pub mod message;
pub mod provider;
pub mod route;

// Re-export key types at crate root for ergonomics
pub use actor::Actor;
pub use error::{Error, ProviderError, Result, RosterError, SessionError};
pub use event::{DomainEvent, EventBus};
pub use message::{ConversationState, Role, SessionId, Turn, WireMessage, WireRole};
pub use provider::{Provider, ProviderRequest, ProviderResponse, Usage};
pub use route::{RouteDecision, TERMINAL};

//! Error types for the Switchyard domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all Switchyard operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Backend errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Roster errors ---
    #[error("Roster error: {0}")]
    Roster(#[from] RosterError),

    // --- Session errors ---
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// The message normalizer was handed zero turns.
    #[error("Cannot build a backend request from an empty conversation")]
    EmptyConversation,
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError {
        status_code: u16,
        message: String,
    },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Backend returned no choices")]
    EmptyResponse,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RosterError {
    #[error("Roster has no actors")]
    Empty,

    #[error("Actor name must not be empty")]
    EmptyName,

    #[error("Duplicate actor name: {0}")]
    DuplicateActor(String),

    #[error("Actor name '{0}' collides with the terminal token")]
    ReservedName(String),

    #[error("Unknown actor: {0}")]
    UnknownActor(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("Session identifier must not be empty")]
    EmptyId,
}

//! Subcommand implementations.

pub mod actors;
pub mod ask;
pub mod chat;
pub mod init;
pub mod route;
pub mod serve;

use std::sync::Arc;

use switchyard_agent::{Orchestrator, SessionStore};
use switchyard_config::AppConfig;
use switchyard_core::event::EventBus;

pub(crate) fn load_config() -> Result<AppConfig, Box<dyn std::error::Error>> {
    Ok(AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?)
}

/// Build the full routing stack over the configured backend.
pub(crate) fn build_store(config: &AppConfig) -> Result<SessionStore, Box<dyn std::error::Error>> {
    let provider = switchyard_providers::build_from_config(config)?;
    let orchestrator = Orchestrator::from_config(config, provider, Arc::new(EventBus::default()))?;
    Ok(SessionStore::new(Arc::new(orchestrator)))
}

//! Generative backend implementations for Switchyard.
//!
//! All providers implement the `switchyard_core::Provider` trait.
//! `build_from_config` constructs the configured backend.

pub mod openai_compat;

use std::sync::Arc;
use std::time::Duration;

use switchyard_config::AppConfig;
use switchyard_core::{Provider, ProviderError};

pub use openai_compat::OpenAiCompatProvider;

/// Build the configured backend.
pub fn build_from_config(config: &AppConfig) -> Result<Arc<dyn Provider>, ProviderError> {
    let backend = &config.backend;
    let provider = OpenAiCompatProvider::new(
        &backend.name,
        &backend.base_url,
        backend.api_key.clone(),
        Duration::from_secs(backend.timeout_secs),
    )?;
    tracing::debug!(provider = %backend.name, url = %backend.base_url, "Backend configured");
    Ok(Arc::new(provider))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_from_default_config() {
        let config = AppConfig::default();
        let provider = build_from_config(&config).unwrap();
        assert_eq!(provider.name(), "vllm");
    }
}

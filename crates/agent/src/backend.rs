//! Chat backend: the single path by which conversation state reaches the LLM.
//!
//! Wraps a [`Provider`] with the model settings and context window, and
//! runs every call through normalization and budget fitting first.

use std::sync::Arc;

use switchyard_config::AppConfig;
use switchyard_core::error::Error;
use switchyard_core::message::Turn;
use switchyard_core::provider::{Provider, ProviderRequest, ResponseSchema};
use tracing::debug;

use crate::context::budget::{ContextWindow, Fitted};
use crate::context::normalize::normalize;

/// Characters of each entry shown in the debug log.
const PREVIEW_CHARS: usize = 200;

/// Per-call overrides.
#[derive(Debug, Clone, Default)]
pub struct CallOptions {
    pub temperature: Option<f32>,
    pub schema: Option<ResponseSchema>,
}

pub struct ChatBackend {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    window: ContextWindow,
}

impl ChatBackend {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>, temperature: f32, window: ContextWindow) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature,
            window,
        }
    }

    pub fn from_config(provider: Arc<dyn Provider>, config: &AppConfig) -> Self {
        Self::new(
            provider,
            &config.backend.model,
            config.backend.temperature,
            ContextWindow::from_config(&config.context),
        )
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn window(&self) -> &ContextWindow {
        &self.window
    }

    /// Normalize and fit `turns` without calling the backend.
    pub fn prepare(&self, turns: &[Turn]) -> Result<Fitted, Error> {
        let wire = normalize(turns)?;
        Ok(self.window.fit(wire))
    }

    /// Send `turns` with the default settings and return the reply text.
    pub async fn complete(&self, turns: &[Turn]) -> Result<String, Error> {
        self.complete_with(turns, CallOptions::default()).await
    }

    pub async fn complete_with(&self, turns: &[Turn], options: CallOptions) -> Result<String, Error> {
        let fitted = self.prepare(turns)?;

        debug!(
            provider = self.provider.name(),
            model = %self.model,
            entries = fitted.messages.len(),
            input_tokens = fitted.input_tokens,
            max_tokens = fitted.max_output_tokens,
            trimmed = fitted.trimmed,
            "Sending conversation to backend"
        );
        for (i, m) in fitted.messages.iter().enumerate() {
            let preview: String = m.content.chars().take(PREVIEW_CHARS).collect();
            debug!(index = i, role = ?m.role, chars = m.content.chars().count(), preview = %preview, "Backend input");
        }

        let request = ProviderRequest {
            model: self.model.clone(),
            messages: fitted.messages,
            temperature: options.temperature.unwrap_or(self.temperature),
            max_tokens: Some(u32::try_from(fitted.max_output_tokens).unwrap_or(u32::MAX)),
            response_schema: options.schema,
        };

        let response = self.provider.complete(request).await?;
        Ok(response.content)
    }
}

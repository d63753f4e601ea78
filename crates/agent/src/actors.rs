//! Actor implementations.
//!
//! - [`PromptedActor`]: a system prompt in front of the conversation, answered
//!   by the chat backend
//! - [`FnActor`]: wraps a plain closure, for static responders and tests

use std::sync::Arc;

use async_trait::async_trait;
use switchyard_config::ActorConfig;
use switchyard_core::actor::Actor;
use switchyard_core::message::{ConversationState, Turn};
use tracing::warn;

use crate::backend::ChatBackend;

/// A specialist backed by the generative backend.
pub struct PromptedActor {
    name: String,
    description: String,
    prompt: String,
    backend: Arc<ChatBackend>,
}

impl PromptedActor {
    pub fn new(name: impl Into<String>, prompt: impl Into<String>, backend: Arc<ChatBackend>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            prompt: prompt.into(),
            backend,
        }
    }

    pub fn from_config(config: &ActorConfig, backend: Arc<ChatBackend>) -> Self {
        Self {
            name: config.name.clone(),
            description: config.description.clone(),
            prompt: config.prompt.clone(),
            backend,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

#[async_trait]
impl Actor for PromptedActor {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    async fn respond(&self, state: &ConversationState) -> Turn {
        let mut turns = Vec::with_capacity(state.len() + 1);
        if !self.prompt.trim().is_empty() {
            turns.push(Turn::system(self.prompt.as_str()));
        }
        turns.extend(state.turns().iter().cloned());

        let content = match self.backend.complete(&turns).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(actor = %self.name, error = %e, "Actor backend call failed");
                format!("Error: {e}")
            }
        };
        Turn::assistant(content).with_actor(self.name.as_str())
    }
}

type ReplyFn = dyn Fn(&ConversationState) -> String + Send + Sync;

/// An actor whose reply is computed by a closure.
pub struct FnActor {
    name: String,
    description: String,
    reply: Box<ReplyFn>,
}

impl FnActor {
    pub fn new<F>(name: impl Into<String>, reply: F) -> Self
    where
        F: Fn(&ConversationState) -> String + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            description: String::new(),
            reply: Box::new(reply),
        }
    }

    /// Always answers with the same text.
    pub fn fixed(name: impl Into<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        Self::new(name, move |_| text.clone())
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

#[async_trait]
impl Actor for FnActor {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    async fn respond(&self, state: &ConversationState) -> Turn {
        Turn::assistant((self.reply)(state)).with_actor(self.name.as_str())
    }
}

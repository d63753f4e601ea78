//! Shared test helpers for routing and orchestration tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use switchyard_core::error::ProviderError;
use switchyard_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};

/// A mock provider that returns a sequence of scripted replies.
///
/// Each call to `complete` pops the next reply and records the request.
/// Panics if more calls are made than replies provided, unless the
/// provider was built with [`ScriptedProvider::failing`], which fails every call.
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<Result<String, ProviderError>>>,
    sticky_error: Option<ProviderError>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    pub fn new(replies: Vec<Result<String, ProviderError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            sticky_error: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Successful text replies, in order.
    pub fn replies(texts: &[&str]) -> Self {
        Self::new(texts.iter().map(|t| Ok((*t).to_string())).collect())
    }

    /// A backend that is down: every call returns `error`.
    pub fn failing(error: ProviderError) -> Self {
        Self {
            sticky_error: Some(error),
            ..Self::new(Vec::new())
        }
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let model = request.model.clone();
        let call = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(request);
            requests.len()
        };

        if let Some(err) = &self.sticky_error {
            return Err(err.clone());
        }

        let next = self.replies.lock().unwrap().pop_front();
        match next {
            Some(Ok(text)) => Ok(ProviderResponse {
                content: text,
                usage: Some(Usage {
                    prompt_tokens: 10,
                    completion_tokens: 5,
                    total_tokens: 15,
                }),
                model,
            }),
            Some(Err(err)) => Err(err),
            None => panic!("ScriptedProvider: no more replies (call #{call})"),
        }
    }
}

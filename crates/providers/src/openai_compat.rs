//! OpenAI-compatible provider implementation.
//!
//! Works with: vLLM, Ollama, llama.cpp server, OpenAI, OpenRouter, and any
//! endpoint exposing `/v1/chat/completions`.
//!
//! Requests are sent exactly as the caller shaped them. Many self-hosted
//! chat templates reject a `system` role or two consecutive turns from the
//! same side, so the wire type only admits `user`/`assistant`.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use switchyard_core::error::ProviderError;
use switchyard_core::message::WireMessage;
use switchyard_core::provider::*;
use tracing::{debug, warn};

/// Used when a 429 carries no usable `Retry-After`.
const DEFAULT_RETRY_AFTER_SECS: u64 = 5;

/// An OpenAI-compatible LLM provider.
pub struct OpenAiCompatProvider {
    name: String,
    base_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl OpenAiCompatProvider {
    /// Create a new OpenAI-compatible provider with a bounded request timeout.
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::NotConfigured(format!("HTTP client: {e}")))?;

        Ok(Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.is_empty()),
            client,
        })
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => builder.header("Authorization", format!("Bearer {key}")),
            None => builder,
        }
    }

    /// Build the JSON body for `/chat/completions`.
    fn request_body(request: &ProviderRequest) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": request.model,
            "messages": request.messages.iter().map(ApiMessage::from).collect::<Vec<_>>(),
            "temperature": request.temperature,
            "stream": false,
        });

        if let Some(max_tokens) = request.max_tokens {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }

        if let Some(schema) = &request.response_schema {
            body["response_format"] = serde_json::json!({
                "type": "json_schema",
                "json_schema": { "name": schema.name, "schema": schema.schema },
            });
        }

        body
    }
}

/// Delta-seconds form only; HTTP-date values fall back to the default.
fn retry_after_secs(headers: &reqwest::header::HeaderMap) -> u64 {
    headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(DEFAULT_RETRY_AFTER_SECS)
}

fn transport_error(e: reqwest::Error) -> ProviderError {
    if e.is_timeout() {
        ProviderError::Timeout(e.to_string())
    } else {
        ProviderError::Network(e.to_string())
    }
}

#[async_trait]
impl switchyard_core::Provider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<ProviderResponse, ProviderError> {
        if request.messages.is_empty() {
            return Err(ProviderError::InvalidRequest("no messages".into()));
        }

        let url = format!("{}/chat/completions", self.base_url);
        let body = Self::request_body(&request);

        debug!(provider = %self.name, model = %request.model, "Sending completion request");

        let response = self
            .authorize(self.client.post(&url))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status().as_u16();

        if status == 429 {
            let retry_after_secs = retry_after_secs(response.headers());
            warn!(retry_after_secs, "Provider rate limited the request");
            return Err(ProviderError::RateLimited { retry_after_secs });
        }

        if status == 401 || status == 403 {
            return Err(ProviderError::AuthenticationFailed(
                "Invalid API key or insufficient permissions".into(),
            ));
        }

        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Provider returned error");
            return Err(ProviderError::ApiError {
                status_code: status,
                message: error_body,
            });
        }

        let api_response: ApiResponse =
            response.json().await.map_err(|e| ProviderError::ApiError {
                status_code: 200,
                message: format!("Failed to parse response: {e}"),
            })?;

        let choice = api_response
            .choices
            .into_iter()
            .next()
            .ok_or(ProviderError::EmptyResponse)?;

        let usage = api_response.usage.map(|u| Usage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });

        Ok(ProviderResponse {
            content: choice.message.content.or(choice.message.text).unwrap_or_default(),
            usage,
            model: api_response.model.unwrap_or(request.model),
        })
    }

    async fn health_check(&self) -> std::result::Result<bool, ProviderError> {
        let url = format!("{}/models", self.base_url);
        let response = self
            .authorize(self.client.get(&url))
            .send()
            .await
            .map_err(transport_error)?;

        Ok(response.status().is_success())
    }
}

// --- OpenAI API types (internal) ---

#[derive(Debug, Serialize)]
struct ApiMessage<'a> {
    role: &'static str,
    content: &'a str,
}

impl<'a> From<&'a WireMessage> for ApiMessage<'a> {
    fn from(m: &'a WireMessage) -> Self {
        Self {
            role: match m.role {
                switchyard_core::WireRole::User => "user",
                switchyard_core::WireRole::Assistant => "assistant",
            },
            content: &m.content,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<ApiChoice>,
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ApiReplyMessage {
    #[serde(default)]
    content: Option<String>,
    // Some servers put completions under `text`
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use switchyard_core::Provider;

    /// Serve `router` on an ephemeral port and return its `/v1` base URL.
    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}/v1")
    }

    fn request(messages: Vec<WireMessage>) -> ProviderRequest {
        ProviderRequest {
            model: "gemma".into(),
            messages,
            temperature: 0.7,
            max_tokens: Some(512),
            response_schema: None,
        }
    }

    #[test]
    fn new_trims_trailing_slash_and_blank_key() {
        let provider =
            OpenAiCompatProvider::new("ollama", "http://box:11434/v1/", Some(String::new()), Duration::from_secs(5))
                .unwrap();
        assert_eq!(provider.name(), "ollama");
        assert_eq!(provider.base_url, "http://box:11434/v1");
        assert!(provider.api_key.is_none());
    }

    #[test]
    fn body_carries_only_two_roles() {
        let req = request(vec![WireMessage::user("q"), WireMessage::assistant("a")]);
        let body = OpenAiCompatProvider::request_body(&req);
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][1]["role"], "assistant");
        assert_eq!(body["max_tokens"], 512);
        assert_eq!(body["stream"], false);
        assert!(body.get("response_format").is_none());
    }

    #[test]
    fn body_includes_response_format_when_schema_set() {
        let mut req = request(vec![WireMessage::user("route")]);
        req.response_schema = Some(ResponseSchema {
            name: "route".into(),
            schema: serde_json::json!({"type": "object"}),
        });
        let body = OpenAiCompatProvider::request_body(&req);
        assert_eq!(body["response_format"]["type"], "json_schema");
        assert_eq!(body["response_format"]["json_schema"]["name"], "route");
    }

    #[test]
    fn parse_reply_with_text_field() {
        let data = r#"{"choices":[{"message":{"text":"food_agent"}}]}"#;
        let parsed: ApiResponse = serde_json::from_str(data).unwrap();
        assert!(parsed.model.is_none());
        assert_eq!(parsed.choices[0].message.text.as_deref(), Some("food_agent"));
    }

    #[tokio::test]
    async fn complete_against_local_server() {
        let router = Router::new().route(
            "/v1/chat/completions",
            post(|Json(body): Json<serde_json::Value>| async move {
                let last = body["messages"].as_array().unwrap().last().unwrap()["content"]
                    .as_str()
                    .unwrap()
                    .to_string();
                Json(serde_json::json!({
                    "model": "gemma-served",
                    "choices": [{"message": {"role": "assistant", "content": format!("echo: {last}")}}],
                    "usage": {"prompt_tokens": 3, "completion_tokens": 2, "total_tokens": 5}
                }))
            }),
        );
        let provider = OpenAiCompatProvider::new("test", serve(router).await, None, Duration::from_secs(5)).unwrap();

        let resp = provider.complete(request(vec![WireMessage::user("hello")])).await.unwrap();
        assert_eq!(resp.content, "echo: hello");
        assert_eq!(resp.model, "gemma-served");
        assert_eq!(resp.usage.unwrap().total_tokens, 5);
    }

    #[tokio::test]
    async fn empty_choices_is_error() {
        let router = Router::new().route(
            "/v1/chat/completions",
            post(|| async { Json(serde_json::json!({"choices": []})) }),
        );
        let provider = OpenAiCompatProvider::new("test", serve(router).await, None, Duration::from_secs(5)).unwrap();
        let err = provider.complete(request(vec![WireMessage::user("q")])).await.unwrap_err();
        assert!(matches!(err, ProviderError::EmptyResponse));
    }

    #[tokio::test]
    async fn server_error_maps_to_api_error() {
        let router = Router::new().route(
            "/v1/chat/completions",
            post(|| async { (StatusCode::BAD_REQUEST, "roles must alternate") }),
        );
        let provider = OpenAiCompatProvider::new("test", serve(router).await, None, Duration::from_secs(5)).unwrap();
        let err = provider.complete(request(vec![WireMessage::user("q")])).await.unwrap_err();
        match err {
            ProviderError::ApiError { status_code, message } => {
                assert_eq!(status_code, 400);
                assert!(message.contains("alternate"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn rate_limit_and_auth_statuses() {
        let router = Router::new()
            .route("/a/v1/chat/completions", post(|| async { StatusCode::TOO_MANY_REQUESTS }))
            .route("/b/v1/chat/completions", post(|| async { StatusCode::UNAUTHORIZED }));
        let base = serve(router).await;
        let root = base.trim_end_matches("/v1");

        let limited = OpenAiCompatProvider::new("a", format!("{root}/a/v1"), None, Duration::from_secs(5)).unwrap();
        assert!(matches!(
            limited.complete(request(vec![WireMessage::user("q")])).await,
            Err(ProviderError::RateLimited { retry_after_secs: DEFAULT_RETRY_AFTER_SECS })
        ));

        let denied = OpenAiCompatProvider::new("b", format!("{root}/b/v1"), Some("sk".into()), Duration::from_secs(5)).unwrap();
        assert!(matches!(
            denied.complete(request(vec![WireMessage::user("q")])).await,
            Err(ProviderError::AuthenticationFailed(_))
        ));
    }

    #[test]
    fn retry_after_parsing() {
        let mut headers = reqwest::header::HeaderMap::new();
        assert_eq!(retry_after_secs(&headers), DEFAULT_RETRY_AFTER_SECS);

        headers.insert(reqwest::header::RETRY_AFTER, " 42 ".parse().unwrap());
        assert_eq!(retry_after_secs(&headers), 42);

        headers.insert(
            reqwest::header::RETRY_AFTER,
            "Wed, 21 Oct 2026 07:28:00 GMT".parse().unwrap(),
        );
        assert_eq!(retry_after_secs(&headers), DEFAULT_RETRY_AFTER_SECS);
    }

    #[tokio::test]
    async fn rate_limit_honours_retry_after_header() {
        let router = Router::new().route(
            "/v1/chat/completions",
            post(|| async { (StatusCode::TOO_MANY_REQUESTS, [("retry-after", "30")], "slow down") }),
        );
        let provider = OpenAiCompatProvider::new("test", serve(router).await, None, Duration::from_secs(5)).unwrap();
        let err = provider.complete(request(vec![WireMessage::user("q")])).await.unwrap_err();
        assert!(matches!(err, ProviderError::RateLimited { retry_after_secs: 30 }));
    }

    #[tokio::test]
    async fn slow_backend_times_out() {
        let router = Router::new().route(
            "/v1/chat/completions",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                StatusCode::OK
            }),
        );
        let provider =
            OpenAiCompatProvider::new("slow", serve(router).await, None, Duration::from_millis(100)).unwrap();
        let err = provider.complete(request(vec![WireMessage::user("q")])).await.unwrap_err();
        assert!(matches!(err, ProviderError::Timeout(_)));
    }

    #[tokio::test]
    async fn unreachable_backend_is_network_error() {
        let provider =
            OpenAiCompatProvider::new("down", "http://127.0.0.1:9/v1", None, Duration::from_secs(2)).unwrap();
        let err = provider.complete(request(vec![WireMessage::user("q")])).await.unwrap_err();
        assert!(matches!(err, ProviderError::Network(_) | ProviderError::Timeout(_)));
    }

    #[tokio::test]
    async fn health_check_hits_models_endpoint() {
        let router = Router::new().route("/v1/models", get(|| async { Json(serde_json::json!({"data": []})) }));
        let provider = OpenAiCompatProvider::new("test", serve(router).await, None, Duration::from_secs(5)).unwrap();
        assert!(provider.health_check().await.unwrap());
    }

    #[tokio::test]
    async fn empty_request_rejected_before_sending() {
        let provider =
            OpenAiCompatProvider::new("vllm", "http://127.0.0.1:9/v1", None, Duration::from_secs(2)).unwrap();
        let err = provider.complete(request(vec![])).await.unwrap_err();
        assert!(matches!(err, ProviderError::InvalidRequest(_)));
    }
}

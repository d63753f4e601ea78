//! HTTP gateway for Switchyard.
//!
//! Exposes the router over REST:
//!
//! | Method | Path | Purpose |
//! |--------|------|---------|
//! | GET | `/health` | Liveness, version, backend reachability, turn counters |
//! | POST | `/chat` | Run one turn for a thread |
//! | GET | `/actors` | The configured roster |
//!
//! Built on Axum.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use axum::extract::DefaultBodyLimit;
use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use switchyard_agent::{Orchestrator, SessionStore};
use switchyard_config::AppConfig;
use switchyard_core::error::Error;
use switchyard_core::event::{DomainEvent, EventBus};
use switchyard_core::provider::Provider;

/// Shared application state for the gateway.
pub struct GatewayState {
    pub store: Arc<SessionStore>,
    /// Probed by `/health`
    pub provider: Arc<dyn Provider>,
    pub stats: Arc<TurnStats>,
}

impl GatewayState {
    pub fn new(store: Arc<SessionStore>, provider: Arc<dyn Provider>) -> Self {
        Self {
            store,
            provider,
            stats: Arc::new(TurnStats::default()),
        }
    }
}

/// Counters fed from the event bus.
#[derive(Debug, Default)]
pub struct TurnStats {
    completed: AtomicU64,
    unanswered: AtomicU64,
    backend_failures: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub turns_completed: u64,
    pub turns_unanswered: u64,
    pub backend_failures: u64,
}

impl TurnStats {
    pub fn record(&self, event: &DomainEvent) {
        match event {
            DomainEvent::TurnCompleted { answered, .. } => {
                self.completed.fetch_add(1, Ordering::Relaxed);
                if !answered {
                    self.unanswered.fetch_add(1, Ordering::Relaxed);
                }
            }
            DomainEvent::BackendFailed { .. } => {
                self.backend_failures.fetch_add(1, Ordering::Relaxed);
            }
            DomainEvent::RouteDecided { .. } | DomainEvent::ActorInvoked { .. } => {}
        }
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            turns_completed: self.completed.load(Ordering::Relaxed),
            turns_unanswered: self.unanswered.load(Ordering::Relaxed),
            backend_failures: self.backend_failures.load(Ordering::Relaxed),
        }
    }
}

/// Subscribe to `bus` and feed `stats` until the bus is dropped.
pub fn spawn_event_listener(bus: &EventBus, stats: Arc<TurnStats>) -> JoinHandle<()> {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    if let DomainEvent::TurnCompleted {
                        session,
                        answered: false,
                        ..
                    } = event.as_ref()
                    {
                        debug!(session = %session, "Turn ended without an answer");
                    }
                    stats.record(&event);
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Event listener lagged, counters undercount");
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}

type SharedState = Arc<GatewayState>;

/// Build the Axum router with all gateway routes.
pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/chat", post(chat_handler))
        .route("/actors", get(actors_handler))
        .layer(DefaultBodyLimit::max(1024 * 1024)) // 1 MB body limit
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the gateway HTTP server.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    let provider = switchyard_providers::build_from_config(&config)?;
    let event_bus = Arc::new(EventBus::default());
    let orchestrator = Orchestrator::from_config(&config, provider.clone(), event_bus.clone())?;
    let state = Arc::new(GatewayState::new(
        Arc::new(SessionStore::new(Arc::new(orchestrator))),
        provider,
    ));
    spawn_event_listener(&event_bus, state.stats.clone());

    let app = build_router(state);

    info!(addr = %addr, actors = config.actors.len(), "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// --- Handlers ---

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// "reachable" or "unreachable"
    pub backend: String,
    pub stats: StatsSnapshot,
}

async fn health_handler(State(state): State<SharedState>) -> Json<HealthResponse> {
    let reachable = match state.provider.health_check().await {
        Ok(up) => up,
        Err(e) => {
            debug!(error = %e, "Backend health check failed");
            false
        }
    };

    Json(HealthResponse {
        status: "ok".into(),
        version: env!("CARGO_PKG_VERSION").into(),
        backend: if reachable { "reachable" } else { "unreachable" }.into(),
        stats: state.stats.snapshot(),
    })
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default = "default_thread_id")]
    pub thread_id: String,
}

fn default_thread_id() -> String {
    "default".into()
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    pub trace: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(ErrorResponse { error: message.into() }))
}

async fn chat_handler(
    State(state): State<SharedState>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    if payload.message.trim().is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "message must not be empty"));
    }
    info!(thread = %payload.thread_id, chars = payload.message.len(), "Received question");

    let outcome = state
        .store
        .ask(&payload.thread_id, &payload.message)
        .await
        .map_err(|e| {
            if matches!(e, Error::Session(_)) {
                return api_error(StatusCode::BAD_REQUEST, e.to_string());
            }
            error!(error = %e, "Chat turn failed");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })?;

    Ok(Json(ChatResponse {
        response: outcome.reply_or_default().to_string(),
        trace: outcome.trace,
    }))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ActorInfo {
    pub name: String,
    pub description: String,
    pub keywords: Vec<String>,
}

async fn actors_handler(State(state): State<SharedState>) -> Json<Vec<ActorInfo>> {
    let roster = state.store.orchestrator().roster();
    let actors = roster
        .entries()
        .iter()
        .map(|entry| ActorInfo {
            name: entry.name.clone(),
            description: state
                .store
                .orchestrator()
                .actor(&entry.name)
                .map(|a| a.description())
                .filter(|d| !d.is_empty())
                .unwrap_or(entry.description.as_str())
                .to_string(),
            keywords: roster
                .rules()
                .iter()
                .filter(|r| r.actor == entry.name)
                .map(|r| r.keyword.clone())
                .collect(),
        })
        .collect();
    Json(actors)
}

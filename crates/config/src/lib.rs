//! Configuration loading, validation, and management for Switchyard.
//!
//! Loads configuration from `~/.switchyard/config.toml` with environment
//! variable overrides. Validates all settings at startup; the resulting
//! roster is immutable for the life of the process.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use switchyard_core::TERMINAL;

/// The root configuration structure.
///
/// Maps directly to `~/.switchyard/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Generative backend connection
    #[serde(default)]
    pub backend: BackendConfig,

    /// Context window and output allowance
    #[serde(default)]
    pub context: ContextConfig,

    /// Routing supervisor settings
    #[serde(default)]
    pub supervisor: SupervisorConfig,

    /// Gateway configuration
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Ordered actor roster; order is also keyword-rule priority
    #[serde(default = "default_actors")]
    pub actors: Vec<ActorConfig>,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Provider label used in logs
    #[serde(default = "default_backend_name")]
    pub name: String,

    /// Base URL of an OpenAI-compatible API (without `/chat/completions`)
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Bounded wait for one backend call
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Send `response_format` with a JSON schema on routing calls
    #[serde(default)]
    pub structured_output: bool,
}

fn default_backend_name() -> String {
    "vllm".into()
}
fn default_base_url() -> String {
    "http://localhost:8000/v1".into()
}
fn default_model() -> String {
    "google/gemma-3-12b-it".into()
}
fn default_timeout_secs() -> u64 {
    120
}
fn default_temperature() -> f32 {
    0.7
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendConfig")
            .field("name", &self.name)
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &redact(&self.api_key))
            .field("timeout_secs", &self.timeout_secs)
            .field("temperature", &self.temperature)
            .field("structured_output", &self.structured_output)
            .finish()
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            name: default_backend_name(),
            base_url: default_base_url(),
            model: default_model(),
            api_key: None,
            timeout_secs: default_timeout_secs(),
            temperature: default_temperature(),
            structured_output: false,
        }
    }
}

/// Token accounting for one backend call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextConfig {
    /// Model context window in tokens
    #[serde(default = "default_window_tokens")]
    pub window_tokens: u32,

    /// Tokens held back from the input budget for the reply
    #[serde(default = "default_reserved_output")]
    pub reserved_output_tokens: u32,

    /// Character ceiling for the merged system+first-user entry when trimming
    #[serde(default = "default_head_char_cap")]
    pub head_char_cap: usize,

    /// Upper bound on `max_tokens` sent to the backend
    #[serde(default = "default_output_cap")]
    pub output_cap: u32,

    /// Floor on `max_tokens` sent to the backend
    #[serde(default = "default_min_output")]
    pub min_output: u32,

    #[serde(default = "default_safety_margin")]
    pub safety_margin: u32,
}

fn default_window_tokens() -> u32 {
    8192
}
fn default_reserved_output() -> u32 {
    1024
}
fn default_head_char_cap() -> usize {
    24_000
}
fn default_output_cap() -> u32 {
    1024
}
fn default_min_output() -> u32 {
    256
}
fn default_safety_margin() -> u32 {
    50
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            window_tokens: default_window_tokens(),
            reserved_output_tokens: default_reserved_output(),
            head_char_cap: default_head_char_cap(),
            output_cap: default_output_cap(),
            min_output: default_min_output(),
            safety_margin: default_safety_margin(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupervisorConfig {
    /// System prompt placed ahead of the conversation on routing calls
    #[serde(default = "default_supervisor_prompt")]
    pub prompt: String,

    /// Hard ceiling on decisions per external turn
    #[serde(default = "default_max_decisions")]
    pub max_decisions: usize,
}

fn default_supervisor_prompt() -> String {
    "You are the supervisor of a supply-chain risk intelligence team. \
     Read the user's question and pick the single specialist best suited to answer it. \
     When a specialist has already answered, or no specialist fits, choose FINISH."
        .into()
}
fn default_max_decisions() -> usize {
    8
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            prompt: default_supervisor_prompt(),
            max_decisions: default_max_decisions(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,
}

fn default_port() -> u16 {
    8000
}
fn default_host() -> String {
    "127.0.0.1".into()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

/// One roster entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorConfig {
    /// Unique roster name
    pub name: String,

    #[serde(default)]
    pub description: String,

    /// System prompt for the prompted responder
    #[serde(default)]
    pub prompt: String,

    /// Ordered fallback keywords, most specific first
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl ActorConfig {
    fn new(name: &str, description: &str, keywords: &[&str]) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            prompt: format!(
                "You are the {name}. {description} \
                 Answer the user's question concisely and state which facts you are unsure of."
            ),
            keywords: keywords.iter().map(|k| (*k).to_string()).collect(),
        }
    }
}

fn default_actors() -> Vec<ActorConfig> {
    vec![
        // "food production" before generic "production"
        ActorConfig::new(
            "food_agent",
            "Covers food production, crop yields, agricultural trade and food prices.",
            &[
                "food production", "food trade", "food price", "food security", "compare food",
                "crop", "crops", "agriculture", "harvest", "faostat", "food supply",
                "wheat", "rice production", "maize", "soybean", "sugar cane", "staple crop",
                "food", "agricultural",
            ],
        ),
        // before generic "news"
        ActorConfig::new(
            "economic_news_agent",
            "Covers real-time economic and political news.",
            &[
                "economic news", "real-time", "realtime", "live update", "current event",
                "google search", "latest news", "today's news", "breaking",
            ],
        ),
        ActorConfig::new(
            "economy_agent",
            "Covers GDP, trade, inflation, exchange rates and commodity prices.",
            &[
                "gdp", "trade", "inflation", "commodity", "exchange rate", "current account",
                "economy", "economic", "ppp", "import", "export", "trade balance",
            ],
        ),
        ActorConfig::new(
            "weather_disaster_agent",
            "Covers weather, climate anomalies and natural disasters.",
            &[
                "weather", "climate", "disaster", "flood", "drought", "earthquake", "storm",
                "temperature", "precipitation", "era5", "em-dat", "natural disaster",
            ],
        ),
        ActorConfig::new(
            "disease_agent",
            "Covers disease outbreaks, epidemics and vaccination.",
            &[
                "disease", "outbreak", "pandemic", "epidemic", "vaccination", "covid",
                "virus", "infection", "health crisis",
            ],
        ),
        // after disease so "health" phrases don't steal outbreak queries
        ActorConfig::new(
            "health_agent",
            "Covers health expenditure and health-system capacity.",
            &[
                "health expenditure", "healthcare", "hospital", "health system",
                "health capacity", "medical",
            ],
        ),
        ActorConfig::new(
            "political_agent",
            "Covers political stability, protests, sanctions and governance.",
            &[
                "political", "protest", "sanctions", "stability", "tension", "diplomatic",
                "governance", "conflict ratio", "instability index",
            ],
        ),
        ActorConfig::new(
            "news_stats_agent",
            "Covers conflict and media event statistics.",
            &[
                "conflict", "war", "gdelt", "media", "event data", "news stats",
                "conflict event", "sanctions event", "protest event",
            ],
        ),
    ]
}

impl AppConfig {
    /// Load configuration from the default path (~/.switchyard/config.toml).
    ///
    /// Environment overrides (highest priority):
    /// - `SWITCHYARD_BACKEND_URL`
    /// - `SWITCHYARD_MODEL`
    /// - `SWITCHYARD_API_KEY`, then `OPENAI_API_KEY`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(url) = var("SWITCHYARD_BACKEND_URL").filter(|v| !v.trim().is_empty()) {
            self.backend.base_url = url.trim().trim_end_matches('/').to_string();
        }
        if let Some(model) = var("SWITCHYARD_MODEL").filter(|v| !v.trim().is_empty()) {
            self.backend.model = model.trim().to_string();
        }
        if self.backend.api_key.is_none() {
            self.backend.api_key = var("SWITCHYARD_API_KEY").or_else(|| var("OPENAI_API_KEY"));
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".switchyard")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.backend.temperature) {
            return Err(ConfigError::ValidationError(
                "backend.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.backend.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "backend.timeout_secs must be > 0".into(),
            ));
        }

        if self.context.reserved_output_tokens >= self.context.window_tokens {
            return Err(ConfigError::ValidationError(
                "context.reserved_output_tokens must be smaller than context.window_tokens".into(),
            ));
        }

        if self.context.min_output > self.context.output_cap {
            return Err(ConfigError::ValidationError(
                "context.min_output must not exceed context.output_cap".into(),
            ));
        }

        if self.supervisor.max_decisions == 0 {
            return Err(ConfigError::ValidationError(
                "supervisor.max_decisions must be > 0".into(),
            ));
        }

        if self.actors.is_empty() {
            return Err(ConfigError::ValidationError("at least one actor is required".into()));
        }

        let mut seen = HashSet::new();
        for actor in &self.actors {
            let name = actor.name.trim();
            if name.is_empty() {
                return Err(ConfigError::ValidationError("actor name must not be empty".into()));
            }
            if name.eq_ignore_ascii_case(TERMINAL) {
                return Err(ConfigError::ValidationError(format!(
                    "actor name '{name}' is reserved"
                )));
            }
            // Names resolve case-insensitively, so "Food_agent" clashes with "food_agent".
            if !seen.insert(name.to_lowercase()) {
                return Err(ConfigError::ValidationError(format!(
                    "duplicate actor name '{name}'"
                )));
            }
        }

        Ok(())
    }

    /// Generate a default config TOML string (for the `init` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend: BackendConfig::default(),
            context: ContextConfig::default(),
            supervisor: SupervisorConfig::default(),
            gateway: GatewayConfig::default(),
            actors: default_actors(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.actors.len(), 8);
        assert_eq!(config.context.window_tokens, 8192);
        assert_eq!(config.backend.timeout_secs, 120);
    }

    #[test]
    fn default_roster_orders_food_before_economy() {
        let config = AppConfig::default();
        let names: Vec<&str> = config.actors.iter().map(|a| a.name.as_str()).collect();
        let food = names.iter().position(|n| *n == "food_agent").unwrap();
        let economy = names.iter().position(|n| *n == "economy_agent").unwrap();
        let disease = names.iter().position(|n| *n == "disease_agent").unwrap();
        let health = names.iter().position(|n| *n == "health_agent").unwrap();
        assert!(food < economy);
        assert!(disease < health);
        assert_eq!(config.actors[0].keywords[0], "food production");
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.backend.model, config.backend.model);
        assert_eq!(parsed.actors.len(), config.actors.len());
    }

    #[test]
    fn invalid_temperature_rejected() {
        let mut config = AppConfig::default();
        config.backend.temperature = 5.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn reserved_actor_name_rejected() {
        let mut config = AppConfig::default();
        config.actors[0].name = "finish".into();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("reserved"));
    }

    #[test]
    fn duplicate_actor_name_rejected() {
        let mut config = AppConfig::default();
        config.actors[1].name = config.actors[0].name.clone();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn duplicate_actor_name_differing_in_case_rejected() {
        let mut config = AppConfig::default();
        config.actors[1].name = "Food_Agent".into();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
        assert!(err.to_string().contains("duplicate actor name 'Food_Agent'"));
    }

    #[test]
    fn reserved_output_must_fit_window() {
        let mut config = AppConfig::default();
        config.context.reserved_output_tokens = config.context.window_tokens;
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let config = AppConfig::load_from(Path::new("/nonexistent/config.toml")).unwrap();
        assert_eq!(config.backend.name, "vllm");
    }

    #[test]
    fn load_custom_roster_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[backend]
base_url = "http://gpu-box:9000/v1"
model = "qwen"

[[actors]]
name = "weather"
keywords = ["storm", "rain"]

[[actors]]
name = "markets"
description = "Prices"
"#
        )
        .unwrap();

        let config = AppConfig::load_from(file.path()).unwrap();
        assert_eq!(config.backend.base_url, "http://gpu-box:9000/v1");
        assert_eq!(config.backend.timeout_secs, 120);
        assert_eq!(config.actors.len(), 2);
        assert_eq!(config.actors[0].keywords, vec!["storm", "rain"]);
        assert!(config.actors[1].keywords.is_empty());
    }

    #[test]
    fn malformed_file_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[backend\nmodel = ").unwrap();
        let err = AppConfig::load_from(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn env_overrides_apply() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("SWITCHYARD_BACKEND_URL", "http://10.0.0.5:8000/v1/"),
            ("SWITCHYARD_MODEL", " llama "),
            ("OPENAI_API_KEY", "sk-test"),
        ]);
        let mut config = AppConfig::default();
        config.apply_env(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(config.backend.base_url, "http://10.0.0.5:8000/v1");
        assert_eq!(config.backend.model, "llama");
        assert_eq!(config.backend.api_key.as_deref(), Some("sk-test"));
    }

    #[test]
    fn api_key_redacted_in_debug() {
        let mut config = AppConfig::default();
        config.backend.api_key = Some("sk-secret".into());
        let dbg = format!("{config:?}");
        assert!(!dbg.contains("sk-secret"));
        assert!(dbg.contains("[REDACTED]"));
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("gemma"));
        assert!(toml_str.contains("food_agent"));
    }
}

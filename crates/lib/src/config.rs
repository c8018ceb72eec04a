//! Configuration types and loading.
//!
//! Config is loaded from a JSON file (e.g. `~/.line-relay/config.json`). Secrets may also come
//! from the environment; they are resolved once into [`Credentials`] at startup and passed into
//! the clients explicitly.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level application config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Webhook gateway settings.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Chat platform settings (LINE).
    #[serde(default)]
    pub channels: ChannelsConfig,

    /// Completion service settings (Gemini).
    #[serde(default)]
    pub agents: AgentsConfig,
}

/// Gateway bind, port, and dispatch settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayConfig {
    /// HTTP port (default 15152).
    #[serde(default = "default_gateway_port")]
    pub port: u16,

    /// Bind address (default "127.0.0.1").
    #[serde(default = "default_gateway_bind")]
    pub bind: String,

    /// "async" acks first and processes on the worker; "inline" processes before answering.
    #[serde(default)]
    pub dispatch: DispatchMode,

    /// Capacity of the invocation queue between the ack path and the worker.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

/// How the webhook receiver hands work to the processing stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DispatchMode {
    /// Submit a fire-and-forget invocation and answer `{"statusCode":200}` immediately.
    #[default]
    Async,

    /// Run extraction, composition and delivery, then answer `{}`.
    Inline,
}

impl DispatchMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DispatchMode::Async => "async",
            DispatchMode::Inline => "inline",
        }
    }
}

fn default_gateway_port() -> u16 {
    15152
}

fn default_gateway_bind() -> String {
    "127.0.0.1".to_string()
}

fn default_queue_capacity() -> usize {
    64
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_gateway_port(),
            bind: default_gateway_bind(),
            dispatch: DispatchMode::default(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

/// Per-channel config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelsConfig {
    #[serde(default)]
    pub line: LineChannelConfig,
}

/// Which reply target the pipeline reads from an event and which endpoint it posts to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryMode {
    /// Read `source.userId` and use the push endpoint. Works outside the reply-token window.
    #[default]
    Push,

    /// Read `replyToken` and use the reply endpoint.
    Reply,
}

impl DeliveryMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryMode::Push => "push",
            DeliveryMode::Reply => "reply",
        }
    }
}

/// LINE Messaging API config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineChannelConfig {
    /// Channel access token. Overridden by LINE_ACCESS_TOKEN env when set.
    pub access_token: Option<String>,
    #[serde(default)]
    pub delivery: DeliveryMode,
    /// Messaging API base URL (default https://api.line.me). Mostly for tests.
    pub api_base: Option<String>,
}

/// Completion service config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentsConfig {
    #[serde(default)]
    pub gemini: GeminiConfig,
}

/// What the composer sends when the completion call fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AiFailurePolicy {
    /// Send a fixed apology string.
    #[default]
    Fallback,
    /// Send `Error: <cause>` to the user as-is. This is what the relay did before the policy
    /// existed; choose it to keep that behavior.
    Forward,
    /// Send nothing.
    Suppress,
}

/// Gemini settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiConfig {
    /// API key. Overridden by GEMINI_API_KEY (then GOOGLE_API_KEY) env when set.
    pub api_key: Option<String>,
    /// Model id (default "gemini-2.5-flash").
    pub model: Option<String>,
    /// API base URL (default https://generativelanguage.googleapis.com).
    pub base_url: Option<String>,
    #[serde(default)]
    pub on_failure: AiFailurePolicy,
}

/// Secrets resolved once at startup. Clients receive these values; nothing reads env later.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub line_access_token: Option<String>,
    pub gemini_api_key: Option<String>,
}

impl Credentials {
    /// Env overrides config for each secret.
    pub fn resolve(config: &Config) -> Self {
        Self {
            line_access_token: resolve_line_token(config),
            gemini_api_key: resolve_gemini_api_key(config),
        }
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().and_then(|s| {
        let t = s.trim();
        if t.is_empty() {
            None
        } else {
            Some(t.to_string())
        }
    })
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Resolve the LINE channel access token: env LINE_ACCESS_TOKEN overrides config.
pub fn resolve_line_token(config: &Config) -> Option<String> {
    non_empty_env("LINE_ACCESS_TOKEN")
        .or_else(|| non_empty(config.channels.line.access_token.as_ref()))
}

/// Resolve the Gemini API key: env GEMINI_API_KEY, then GOOGLE_API_KEY, then config.
pub fn resolve_gemini_api_key(config: &Config) -> Option<String> {
    non_empty_env("GEMINI_API_KEY")
        .or_else(|| non_empty_env("GOOGLE_API_KEY"))
        .or_else(|| non_empty(config.agents.gemini.api_key.as_ref()))
}

/// Resolve config path from env or default.
pub fn default_config_path() -> PathBuf {
    std::env::var("LINE_RELAY_CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .map(|h| h.join(".line-relay").join("config.json"))
                .unwrap_or_else(|| PathBuf::from("config.json"))
        })
}

/// Load config from the given path, or the default path. Missing file => default config.
/// Returns the config and the path that was used.
pub fn load_config(path: Option<PathBuf>) -> Result<(Config, PathBuf)> {
    let path = path.unwrap_or_else(default_config_path);
    let config = if !path.exists() {
        log::debug!("config file not found, using defaults: {}", path.display());
        Config::default()
    } else {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        serde_json::from_str(&s)
            .with_context(|| format!("parsing config from {}", path.display()))?
    };
    Ok((config, path))
}

/// Write a default config file (pretty JSON) if none exists. Returns true when a file was written.
pub fn write_default_config(path: &std::path::Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    if let Some(dir) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating config directory {}", dir.display()))?;
    }
    let text = serde_json::to_string_pretty(&Config::default())
        .context("serializing default config")?;
    std::fs::write(path, text)
        .with_context(|| format!("writing default config to {}", path.display()))?;
    log::info!("created default config at {}", path.display());
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_gateway_settings() {
        let g = GatewayConfig::default();
        assert_eq!(g.port, 15152);
        assert_eq!(g.bind, "127.0.0.1");
        assert_eq!(g.dispatch, DispatchMode::Async);
        assert_eq!(g.queue_capacity, 64);
    }

    #[test]
    fn empty_object_parses_to_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config.channels.line.delivery, DeliveryMode::Push);
        assert_eq!(config.agents.gemini.on_failure, AiFailurePolicy::Fallback);
        assert!(config.channels.line.access_token.is_none());
    }

    #[test]
    fn camel_case_fields_and_lowercase_enums() {
        let config: Config = serde_json::from_str(
            r#"{
                "gateway": { "dispatch": "inline", "queueCapacity": 8 },
                "channels": { "line": { "accessToken": "tok", "delivery": "reply", "apiBase": "http://x" } },
                "agents": { "gemini": { "model": "gemini-2.0-flash", "onFailure": "suppress" } }
            }"#,
        )
        .unwrap();
        assert_eq!(config.gateway.dispatch, DispatchMode::Inline);
        assert_eq!(config.gateway.queue_capacity, 8);
        assert_eq!(config.gateway.port, 15152);
        assert_eq!(config.channels.line.access_token.as_deref(), Some("tok"));
        assert_eq!(config.channels.line.delivery, DeliveryMode::Reply);
        assert_eq!(config.channels.line.api_base.as_deref(), Some("http://x"));
        assert_eq!(config.agents.gemini.model.as_deref(), Some("gemini-2.0-flash"));
        assert_eq!(config.agents.gemini.on_failure, AiFailurePolicy::Suppress);
    }

    #[test]
    fn forward_policy_is_opt_in() {
        let config: Config =
            serde_json::from_str(r#"{"agents":{"gemini":{"onFailure":"forward"}}}"#).unwrap();
        assert_eq!(config.agents.gemini.on_failure, AiFailurePolicy::Forward);
        assert_ne!(AiFailurePolicy::default(), AiFailurePolicy::Forward);
    }

    #[test]
    fn blank_config_secret_is_ignored() {
        assert_eq!(non_empty(Some(&"   ".to_string())), None);
        assert_eq!(non_empty(Some(&" tok ".to_string())), Some("tok".to_string()));
    }

    #[test]
    fn missing_config_file_yields_defaults() {
        let path = std::env::temp_dir().join(format!("line-relay-missing-{}.json", uuid::Uuid::new_v4()));
        let (config, used) = load_config(Some(path.clone())).unwrap();
        assert_eq!(used, path);
        assert_eq!(config.gateway.port, 15152);
    }

    #[test]
    fn write_default_config_then_load() {
        let dir = std::env::temp_dir().join(format!("line-relay-config-{}", uuid::Uuid::new_v4()));
        let path = dir.join("config.json");
        assert!(write_default_config(&path).unwrap());
        assert!(!write_default_config(&path).unwrap());
        let (config, _) = load_config(Some(path)).unwrap();
        assert_eq!(config.gateway.dispatch, DispatchMode::Async);
        let _ = std::fs::remove_dir_all(dir);
    }
}

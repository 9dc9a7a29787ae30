//! Configuration types and loading.
//!
//! Config is loaded from a JSON file (e.g. `~/.parley/config.json`) and environment.
//! Every field has a default, so an empty object (or a missing file) is a valid config.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level application config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// LLM backend endpoints.
    #[serde(default)]
    pub backends: BackendsConfig,

    /// Which provider serves each pipeline capability.
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

/// Server bind and port.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    /// Port for HTTP (default 8000).
    #[serde(default = "default_server_port")]
    pub port: u16,

    /// Bind address (default "127.0.0.1").
    #[serde(default = "default_server_bind")]
    pub bind: String,
}

fn default_server_port() -> u16 {
    8000
}

fn default_server_bind() -> String {
    "127.0.0.1".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_server_port(),
            bind: default_server_bind(),
        }
    }
}

/// True if the bind address is loopback (127.0.0.1, ::1, etc.).
pub fn is_loopback_bind(bind: &str) -> bool {
    let b = bind.trim();
    b == "127.0.0.1" || b == "::1" || b == "localhost"
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendsConfig {
    #[serde(default)]
    pub ollama: BackendEndpoint,
    #[serde(default)]
    pub lm_studio: BackendEndpoint,
}

/// One LLM server endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendEndpoint {
    /// Base URL. Falls back to the backend's default (and is overridden by env, see `resolve_*_base_url`).
    #[serde(default)]
    pub base_url: Option<String>,

    /// Per-request timeout in seconds (default 60). 0 disables the timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    60
}

impl Default for BackendEndpoint {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl BackendEndpoint {
    pub fn timeout(&self) -> Option<std::time::Duration> {
        (self.timeout_secs > 0).then(|| std::time::Duration::from_secs(self.timeout_secs))
    }
}

/// Where a capability is served from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderBackend {
    /// In-process heuristic (detection and sentiment only).
    #[default]
    Builtin,
    Ollama,
    #[serde(alias = "lm_studio", alias = "lmStudio")]
    Lmstudio,
}

impl ProviderBackend {
    pub fn as_str(self) -> &'static str {
        match self {
            ProviderBackend::Builtin => "builtin",
            ProviderBackend::Ollama => "ollama",
            ProviderBackend::Lmstudio => "lmstudio",
        }
    }
}

/// Backend and model for one capability.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    #[serde(default)]
    pub backend: ProviderBackend,
    /// Model name as the backend lists it (e.g. "llama3.2:latest"). Ignored for builtin.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl ProviderConfig {
    fn llm(model: &str) -> Self {
        Self {
            backend: ProviderBackend::Ollama,
            model: Some(model.to_string()),
        }
    }
}

pub const DEFAULT_MODEL: &str = "llama3.2:latest";

fn default_translator() -> ProviderConfig {
    ProviderConfig::llm(DEFAULT_MODEL)
}

fn default_generator() -> ProviderConfig {
    ProviderConfig::llm(DEFAULT_MODEL)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineConfig {
    #[serde(default)]
    pub detector: ProviderConfig,
    #[serde(default)]
    pub sentiment: ProviderConfig,
    #[serde(default = "default_translator")]
    pub translator: ProviderConfig,
    #[serde(default = "default_generator")]
    pub generator: ProviderConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            detector: ProviderConfig::default(),
            sentiment: ProviderConfig::default(),
            translator: default_translator(),
            generator: default_generator(),
            generation: GenerationConfig::default(),
        }
    }
}

/// Bounds and prompt for response generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    /// Token budget passed to the backend (default 100).
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Hard cap on response length in characters, applied after generation.
    #[serde(default)]
    pub max_chars: Option<usize>,
    /// Prefix the reply with the prompt, like a plain text-completion model would.
    #[serde(default)]
    pub echo_prompt: bool,
    /// Replaces the default system prompt when set.
    #[serde(default)]
    pub system_prompt: Option<String>,
}

fn default_max_tokens() -> u32 {
    100
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_tokens: default_max_tokens(),
            max_chars: None,
            echo_prompt: false,
            system_prompt: None,
        }
    }
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key).ok().and_then(|s| {
        let t = s.trim();
        if t.is_empty() {
            None
        } else {
            Some(t.to_string())
        }
    })
}

/// Resolve the Ollama base URL: env PARLEY_OLLAMA_URL overrides config.
pub fn resolve_ollama_base_url(config: &Config) -> String {
    env_non_empty("PARLEY_OLLAMA_URL")
        .or_else(|| {
            config
                .backends
                .ollama
                .base_url
                .as_ref()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        })
        .unwrap_or_else(|| crate::llm::OLLAMA_DEFAULT_BASE_URL.to_string())
}

/// Resolve the LM Studio base URL: env PARLEY_LMSTUDIO_URL overrides config.
pub fn resolve_lm_studio_base_url(config: &Config) -> String {
    env_non_empty("PARLEY_LMSTUDIO_URL")
        .or_else(|| {
            config
                .backends
                .lm_studio
                .base_url
                .as_ref()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        })
        .unwrap_or_else(|| crate::llm::LM_STUDIO_DEFAULT_BASE_URL.to_string())
}

/// Resolve config path from env or default.
pub fn default_config_path() -> PathBuf {
    std::env::var("PARLEY_CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .map(|h| h.join(".parley").join("config.json"))
                .unwrap_or_else(|| PathBuf::from("config.json"))
        })
}

/// Load config from the given path, else the default path (or PARLEY_CONFIG_PATH). Missing file => default config.
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_server_port_and_bind() {
        let s = ServerConfig::default();
        assert_eq!(s.port, 8000);
        assert_eq!(s.bind, "127.0.0.1");
    }

    #[test]
    fn empty_object_matches_default() {
        let c: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(c.server.port, 8000);
        assert_eq!(c.pipeline.detector.backend, ProviderBackend::Builtin);
        assert_eq!(c.pipeline.sentiment.backend, ProviderBackend::Builtin);
        assert_eq!(c.pipeline.translator.backend, ProviderBackend::Ollama);
        assert_eq!(c.pipeline.generator.model.as_deref(), Some(DEFAULT_MODEL));
        assert_eq!(c.pipeline.generation.max_tokens, 100);
        assert!(!c.pipeline.generation.echo_prompt);
        assert_eq!(c.backends.ollama.timeout_secs, 60);
    }

    #[test]
    fn backend_names_parse() {
        let c: Config = serde_json::from_str(
            r#"{"pipeline":{"generator":{"backend":"lmStudio","model":"gpt-oss-20b"},"generation":{"maxChars":280}}}"#,
        )
        .unwrap();
        assert_eq!(c.pipeline.generator.backend, ProviderBackend::Lmstudio);
        assert_eq!(c.pipeline.generation.max_chars, Some(280));
        // Unset sections keep their own defaults.
        assert_eq!(c.pipeline.translator.backend, ProviderBackend::Ollama);
    }

    #[test]
    fn zero_timeout_disables() {
        let e = BackendEndpoint {
            base_url: None,
            timeout_secs: 0,
        };
        assert!(e.timeout().is_none());
    }

    #[test]
    fn missing_file_yields_defaults() {
        let path = std::env::temp_dir().join(format!("parley-missing-{}.json", uuid::Uuid::new_v4()));
        let (config, used) = load_config(Some(path.clone())).unwrap();
        assert_eq!(used, path);
        assert_eq!(config.server.port, 8000);
    }

    #[test]
    fn loopback_binds() {
        assert!(is_loopback_bind("127.0.0.1"));
        assert!(is_loopback_bind(" localhost "));
        assert!(!is_loopback_bind("0.0.0.0"));
    }
}

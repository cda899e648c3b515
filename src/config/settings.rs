//! Configuration settings for the contrarx service.

use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub source: SourceConfig,
    pub reasoning: ReasoningConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::ReadFile)?;
        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from default locations or use defaults.
    pub fn load() -> Result<Self> {
        let config_paths = [
            PathBuf::from("config.toml"),
            PathBuf::from("contrarx.toml"),
            dirs::config_dir()
                .map(|p| p.join("contrarx/config.toml"))
                .unwrap_or_default(),
            dirs::home_dir()
                .map(|p| p.join(".contrarx/config.toml"))
                .unwrap_or_default(),
        ];

        for path in &config_paths {
            if path.exists() {
                tracing::info!("Loading config from: {}", path.display());
                return Self::from_file(path);
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Config::default())
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<()> {
        if self.source.base_url.is_empty() {
            return Err(ConfigError::MissingField("source.base_url".to_string()).into());
        }

        if self.reasoning.max_tokens == 0 {
            return Err(ConfigError::Invalid("reasoning.max_tokens must be > 0".to_string()).into());
        }
        if !(0.0..=2.0).contains(&self.reasoning.temperature) {
            return Err(ConfigError::Invalid(
                "reasoning.temperature must be between 0.0 and 2.0".to_string(),
            )
            .into());
        }
        if let Some(url) = &self.reasoning.base_url {
            if url.is_empty() {
                return Err(ConfigError::Invalid(
                    "reasoning.base_url must not be empty when set".to_string(),
                )
                .into());
            }
        }

        Ok(())
    }

    /// Expand the database path.
    pub fn db_path(&self) -> PathBuf {
        let expanded = shellexpand::tilde(&self.store.db_path);
        PathBuf::from(expanded.as_ref())
    }
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// HTTP port to listen on.
    pub http_port: u16,
    /// Enable permissive CORS on the REST API.
    pub enable_cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_port: 3001,
            enable_cors: true,
        }
    }
}

/// Persistent store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Path to the SQLite database file.
    pub db_path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: "~/.contrarx/contrarx.db".to_string(),
        }
    }
}

/// External drug source (openFDA drug label API) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Base URL of the drug label endpoint.
    pub base_url: String,
    /// API key (loaded from OPENFDA_API_KEY if not set). Optional; the
    /// public endpoint works unauthenticated at a lower rate limit.
    pub api_key: Option<String>,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.fda.gov/drug/label.json".to_string(),
            api_key: None,
            timeout_secs: 30,
        }
    }
}

/// Reasoning backend enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReasoningBackend {
    OpenAi,
    DeepSeek,
    Gemini,
}

impl ReasoningBackend {
    /// Environment variable consulted when `api_key` is unset.
    pub fn api_key_env(&self) -> &'static str {
        match self {
            ReasoningBackend::OpenAi => "OPENAI_API_KEY",
            ReasoningBackend::DeepSeek => "DEEPSEEK_API_KEY",
            ReasoningBackend::Gemini => "GEMINI_API_KEY",
        }
    }

    fn default_base_url(&self) -> &'static str {
        match self {
            ReasoningBackend::OpenAi => "https://api.openai.com/v1",
            ReasoningBackend::DeepSeek => "https://api.deepseek.com/v1",
            ReasoningBackend::Gemini => "https://generativelanguage.googleapis.com/v1beta",
        }
    }

    fn default_model(&self) -> &'static str {
        match self {
            ReasoningBackend::OpenAi => "gpt-4",
            ReasoningBackend::DeepSeek => "deepseek-chat",
            ReasoningBackend::Gemini => "gemini-1.5-flash",
        }
    }
}

/// Reasoning service configuration.
///
/// The backend is selected once at startup and injected into the
/// interaction engine; it is never re-read per call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReasoningConfig {
    /// Backend: "openai", "deepseek", or "gemini".
    pub backend: ReasoningBackend,
    /// Base URL override. Defaults to the backend's public endpoint.
    pub base_url: Option<String>,
    /// Model override. Defaults per backend.
    pub model: Option<String>,
    /// API key (loaded from the backend's env var if not set).
    pub api_key: Option<String>,
    /// Completion token cap per request.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ReasoningConfig {
    fn default() -> Self {
        Self {
            backend: ReasoningBackend::DeepSeek,
            base_url: None,
            model: None,
            api_key: None,
            max_tokens: 500,
            temperature: 0.7,
            timeout_secs: 60,
        }
    }
}

impl ReasoningConfig {
    /// Effective base URL after applying the backend default.
    pub fn base_url(&self) -> String {
        self.base_url
            .clone()
            .unwrap_or_else(|| self.backend.default_base_url().to_string())
    }

    /// Effective model after applying the backend default.
    pub fn model(&self) -> String {
        self.model
            .clone()
            .unwrap_or_else(|| self.backend.default_model().to_string())
    }

    /// Resolve the API key from config or environment.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var(self.backend.api_key_env()).ok())
    }
}

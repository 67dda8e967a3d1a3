//! Configuration loading, validation, and management for docqa.
//!
//! Loads configuration from `~/.docqa/config.toml` with environment
//! variable overrides. The resulting [`AppConfig`] is built once at startup
//! and passed by reference into the components that need it; nothing mutates
//! it afterwards.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Placeholder values shipped in sample `.env` files; treated as unset.
const PLACEHOLDER_API_KEY: &str = "your-gemini-api-key-here";
const PLACEHOLDER_BEARER_TOKEN: &str = "your-bearer-token-here";

/// The root configuration structure.
///
/// Maps directly to `~/.docqa/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key for the model service (can be overridden per-provider)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Default model provider
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Default model
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Default temperature
    #[serde(default = "default_temperature")]
    pub default_temperature: f32,

    /// Default max tokens per answer
    #[serde(default = "default_max_tokens")]
    pub default_max_tokens: u32,

    /// HTTP gateway configuration
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Document acquisition and extraction settings
    #[serde(default)]
    pub documents: DocumentsConfig,

    /// Question-answering loop settings
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Provider-specific configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

fn default_provider() -> String {
    "gemini".into()
}
fn default_model() -> String {
    "gemini-2.5-flash-lite".into()
}
fn default_temperature() -> f32 {
    0.2
}
fn default_max_tokens() -> u32 {
    1024
}

fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("default_provider", &self.default_provider)
            .field("default_model", &self.default_model)
            .field("default_temperature", &self.default_temperature)
            .field("default_max_tokens", &self.default_max_tokens)
            .field("gateway", &self.gateway)
            .field("documents", &self.documents)
            .field("pipeline", &self.pipeline)
            .field("providers", &self.providers)
            .finish()
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("default_model", &self.default_model)
            .finish()
    }
}

impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("bearer_token", &redact(&self.bearer_token))
            .field("cors_origins", &self.cors_origins)
            .field("max_body_bytes", &self.max_body_bytes)
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Shared secret every `/hackrx/*` request must present as a bearer token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bearer_token: Option<String>,

    /// Allowed CORS origins. `["*"]` allows any origin.
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Maximum accepted request body (uploads included).
    #[serde(default = "default_max_document_bytes")]
    pub max_body_bytes: usize,
}

fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    8000
}
fn default_cors_origins() -> Vec<String> {
    vec!["*".into()]
}
fn default_max_document_bytes() -> usize {
    50 * 1024 * 1024
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            bearer_token: None,
            cors_origins: default_cors_origins(),
            max_body_bytes: default_max_document_bytes(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentsConfig {
    /// Timeout for fetching a remote document.
    #[serde(default = "default_download_timeout")]
    pub download_timeout_secs: u64,

    /// Downloads larger than this are rejected.
    #[serde(default = "default_max_document_bytes")]
    pub max_document_bytes: usize,

    /// Characters of extracted text placed in each prompt.
    #[serde(default = "default_text_budget")]
    pub text_budget_chars: usize,

    /// Directory for temporary artifacts (system temp dir when unset).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temp_dir: Option<PathBuf>,
}

fn default_download_timeout() -> u64 {
    30
}
fn default_text_budget() -> usize {
    8000
}

impl Default for DocumentsConfig {
    fn default() -> Self {
        Self {
            download_timeout_secs: default_download_timeout(),
            max_document_bytes: default_max_document_bytes(),
            text_budget_chars: default_text_budget(),
            temp_dir: None,
        }
    }
}

/// What happens to the batch when one question's model call fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureMode {
    /// Abort the whole request; answers computed so far are discarded.
    #[default]
    FailFast,
    /// Record the failure on that question and keep going.
    PerQuestion,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub failure_mode: FailureMode,

    /// Upper bound on a single model call.
    #[serde(default = "default_model_timeout")]
    pub model_timeout_secs: u64,

    /// Model calls in flight across all requests.
    #[serde(default = "default_max_concurrent_model_calls")]
    pub max_concurrent_model_calls: usize,
}

fn default_model_timeout() -> u64 {
    300
}
fn default_max_concurrent_model_calls() -> usize {
    8
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            failure_mode: FailureMode::default(),
            model_timeout_secs: default_model_timeout(),
            max_concurrent_model_calls: default_max_concurrent_model_calls(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
}

impl AppConfig {
    /// Load configuration from the default path (~/.docqa/config.toml).
    ///
    /// Environment overrides:
    /// - `DOCQA_API_KEY`, then `GEMINI_API_KEY`, then `OPENAI_API_KEY`
    ///   (only when no key is set in the file)
    /// - `DOCQA_PROVIDER`, `LLM_MODEL`
    /// - `BEARER_TOKEN`, `API_HOST`, `API_PORT`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env(|name| std::env::var(name).ok())?;
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

    /// Apply environment overrides through a lookup function.
    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if self.api_key.is_none() {
            self.api_key = var("DOCQA_API_KEY")
                .or_else(|| var("GEMINI_API_KEY"))
                .or_else(|| var("OPENAI_API_KEY"));
        }

        if let Some(provider) = var("DOCQA_PROVIDER") {
            self.default_provider = provider;
        }

        if let Some(model) = var("LLM_MODEL") {
            self.default_model = model;
        }

        if let Some(token) = var("BEARER_TOKEN") {
            self.gateway.bearer_token = Some(token);
        }

        if let Some(host) = var("API_HOST") {
            self.gateway.host = host;
        }

        if let Some(port) = var("API_PORT") {
            self.gateway.port = port.parse().map_err(|_| {
                ConfigError::ValidationError(format!("API_PORT must be a port number, got '{port}'"))
            })?;
        }

        Ok(())
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".docqa")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.default_temperature < 0.0 || self.default_temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "default_temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.documents.text_budget_chars == 0 {
            return Err(ConfigError::ValidationError(
                "documents.text_budget_chars must be > 0".into(),
            ));
        }

        if self.documents.download_timeout_secs == 0 || self.pipeline.model_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "timeouts must be at least one second".into(),
            ));
        }

        if self.pipeline.max_concurrent_model_calls == 0 {
            return Err(ConfigError::ValidationError(
                "pipeline.max_concurrent_model_calls must be > 0".into(),
            ));
        }

        Ok(())
    }

    /// Validate that everything needed to serve requests is present.
    ///
    /// The server refuses to start without a model API key and a bearer token.
    pub fn validate_for_serving(&self) -> Result<(), ConfigError> {
        self.validate()?;

        if !self.has_api_key() {
            return Err(ConfigError::ValidationError(
                "an API key must be set (GEMINI_API_KEY or api_key in config.toml)".into(),
            ));
        }

        match self.gateway.bearer_token.as_deref() {
            Some(token) if !token.is_empty() && token != PLACEHOLDER_BEARER_TOKEN => Ok(()),
            _ => Err(ConfigError::ValidationError(
                "BEARER_TOKEN must be set (or gateway.bearer_token in config.toml)".into(),
            )),
        }
    }

    /// Check if an API key is available for the default provider.
    pub fn has_api_key(&self) -> bool {
        let provider_key = self
            .providers
            .get(&self.default_provider)
            .and_then(|p| p.api_key.as_deref());
        provider_key
            .or(self.api_key.as_deref())
            .is_some_and(|k| !k.is_empty() && k != PLACEHOLDER_API_KEY)
    }

    /// Generate a default config TOML string (for `onboard` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_provider: default_provider(),
            default_model: default_model(),
            default_temperature: default_temperature(),
            default_max_tokens: default_max_tokens(),
            gateway: GatewayConfig::default(),
            documents: DocumentsConfig::default(),
            pipeline: PipelineConfig::default(),
            providers: HashMap::new(),
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
    use std::io::Write;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert_eq!(config.default_provider, "gemini");
        assert_eq!(config.gateway.port, 8000);
        assert_eq!(config.documents.text_budget_chars, 8000);
        assert_eq!(config.documents.download_timeout_secs, 30);
        assert_eq!(config.pipeline.failure_mode, FailureMode::FailFast);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.default_provider, config.default_provider);
        assert_eq!(parsed.gateway.port, config.gateway.port);
        assert_eq!(parsed.pipeline.failure_mode, config.pipeline.failure_mode);
    }

    #[test]
    fn invalid_temperature_rejected() {
        let config = AppConfig {
            default_temperature: 5.0,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_budget_rejected() {
        let mut config = AppConfig::default();
        config.documents.text_budget_chars = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let config = AppConfig::load_from(Path::new("/nonexistent/config.toml")).unwrap();
        assert_eq!(config.default_provider, "gemini");
    }

    #[test]
    fn partial_file_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
default_model = "gemini-pro"

[pipeline]
failure_mode = "per_question"

[documents]
text_budget_chars = 4000
"#
        )
        .unwrap();

        let config = AppConfig::load_from(file.path()).unwrap();
        assert_eq!(config.default_model, "gemini-pro");
        assert_eq!(config.pipeline.failure_mode, FailureMode::PerQuestion);
        assert_eq!(config.pipeline.model_timeout_secs, 300);
        assert_eq!(config.documents.text_budget_chars, 4000);
        assert_eq!(config.documents.download_timeout_secs, 30);
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "default_model = [unclosed").unwrap();
        let err = AppConfig::load_from(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = AppConfig::default();
        config
            .apply_env(env_from(&[
                ("GEMINI_API_KEY", "g-key"),
                ("OPENAI_API_KEY", "o-key"),
                ("LLM_MODEL", "gemini-2.5-pro"),
                ("BEARER_TOKEN", "secret"),
                ("API_PORT", "9000"),
            ]))
            .unwrap();
        assert_eq!(config.api_key.as_deref(), Some("g-key"));
        assert_eq!(config.default_model, "gemini-2.5-pro");
        assert_eq!(config.gateway.bearer_token.as_deref(), Some("secret"));
        assert_eq!(config.gateway.port, 9000);
    }

    #[test]
    fn file_api_key_wins_over_env() {
        let mut config = AppConfig {
            api_key: Some("from-file".into()),
            ..AppConfig::default()
        };
        config
            .apply_env(env_from(&[("DOCQA_API_KEY", "from-env")]))
            .unwrap();
        assert_eq!(config.api_key.as_deref(), Some("from-file"));
    }

    #[test]
    fn bad_port_env_rejected() {
        let mut config = AppConfig::default();
        let err = config
            .apply_env(env_from(&[("API_PORT", "eighty")]))
            .unwrap_err();
        assert!(err.to_string().contains("API_PORT"));
    }

    #[test]
    fn serving_requires_key_and_token() {
        let mut config = AppConfig::default();
        assert!(config.validate_for_serving().is_err());

        config.api_key = Some("real-key".into());
        assert!(config.validate_for_serving().is_err());

        config.gateway.bearer_token = Some(PLACEHOLDER_BEARER_TOKEN.into());
        assert!(config.validate_for_serving().is_err());

        config.gateway.bearer_token = Some("s3cret".into());
        assert!(config.validate_for_serving().is_ok());
    }

    #[test]
    fn placeholder_api_key_is_not_a_key() {
        let config = AppConfig {
            api_key: Some(PLACEHOLDER_API_KEY.into()),
            ..AppConfig::default()
        };
        assert!(!config.has_api_key());
    }

    #[test]
    fn debug_redacts_secrets() {
        let mut config = AppConfig {
            api_key: Some("sk-very-secret".into()),
            ..AppConfig::default()
        };
        config.gateway.bearer_token = Some("token-very-secret".into());
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("very-secret"));
        assert!(rendered.contains("[REDACTED]"));
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("gemini"));
        assert!(toml_str.contains("8000"));
        assert!(toml_str.contains("fail_fast"));
    }
}

//! Configuration management for tierroute
//!
//! Configuration is layered: built-in defaults, then an optional TOML file,
//! then environment variable overrides. The result is validated once at
//! startup and shared read-only as `Arc<Config>`.

use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub models: ModelsConfig,
    #[serde(default)]
    pub routing: RoutingConfig,
    #[serde(default)]
    pub ollama: OllamaConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Upstream LLM API configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpstreamConfig {
    /// Base URL without the `/v1/...` path (e.g. `https://api.anthropic.com`)
    #[serde(default = "default_upstream_url")]
    pub base_url: String,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_upstream_url(),
            connect_timeout_seconds: default_connect_timeout(),
        }
    }
}

fn default_upstream_url() -> String {
    "https://api.anthropic.com".to_string()
}

fn default_connect_timeout() -> u64 {
    10
}

/// Model name for each routing tier
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ModelsConfig {
    #[serde(default = "default_simple_model")]
    pub simple: String,
    #[serde(default = "default_medium_model")]
    pub medium: String,
    #[serde(default = "default_complex_model")]
    pub complex: String,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            simple: default_simple_model(),
            medium: default_medium_model(),
            complex: default_complex_model(),
        }
    }
}

impl ModelsConfig {
    /// Whether `model` names the top (most expensive) tier
    ///
    /// Matches the configured complex model exactly, or any model in the
    /// `opus` family so that clients pinned to an older top-tier snapshot
    /// still count.
    pub fn is_top_tier(&self, model: &str) -> bool {
        model == self.complex || model.to_ascii_lowercase().contains("opus")
    }
}

fn default_simple_model() -> String {
    "claude-3-5-haiku-20241022".to_string()
}

fn default_medium_model() -> String {
    "claude-sonnet-4-20250514".to_string()
}

fn default_complex_model() -> String {
    "claude-opus-4-20250514".to_string()
}

/// Routing configuration
///
/// Thresholds partition [0,1] into three half-open intervals:
/// `[0, simple)`, `[simple, complex)`, `[complex, 1]`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RoutingConfig {
    #[serde(default = "default_simple_threshold")]
    pub simple_threshold: f64,
    #[serde(default = "default_complex_threshold")]
    pub complex_threshold: f64,
    /// Skip scoring and send every request to this model
    #[serde(default)]
    pub force_model: Option<String>,
    /// Forward requests with the client's model untouched
    #[serde(default)]
    pub disabled: bool,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            simple_threshold: default_simple_threshold(),
            complex_threshold: default_complex_threshold(),
            force_model: None,
            disabled: false,
        }
    }
}

fn default_simple_threshold() -> f64 {
    0.35
}

fn default_complex_threshold() -> f64 {
    0.65
}

/// External complexity scorer (Ollama) configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OllamaConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_ollama_url")]
    pub base_url: String,
    #[serde(default = "default_ollama_model")]
    pub model: String,
    #[serde(default = "default_ollama_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: default_ollama_url(),
            model: default_ollama_model(),
            timeout_ms: default_ollama_timeout_ms(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_ollama_model() -> String {
    "qwen2.5:1.5b".to_string()
}

fn default_ollama_timeout_ms() -> u64 {
    5000
}

/// Observability configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Log full prompt text for every classified request
    #[serde(default)]
    pub verbose: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            verbose: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        let path_display = path.as_ref().display().to_string();

        let content =
            std::fs::read_to_string(path.as_ref()).map_err(|source| AppError::ConfigFileRead {
                path: path_display.clone(),
                source,
            })?;

        let config: Self = toml::from_str(&content).map_err(|source| {
            AppError::ConfigParseFailed {
                path: path_display.clone(),
                source,
            }
        })?;

        config
            .validate()
            .map_err(|e| AppError::ConfigValidationFailed {
                path: path_display,
                reason: e.to_string(),
            })?;

        Ok(config)
    }

    /// Load the full configuration stack used by the server
    ///
    /// Defaults, then the TOML file at `path` (if given), then process
    /// environment overrides. Validation runs last so an override can fix
    /// an otherwise invalid file.
    pub fn load(path: Option<&Path>) -> AppResult<Self> {
        let mut config = match path {
            Some(p) => {
                let path_display = p.display().to_string();
                let content =
                    std::fs::read_to_string(p).map_err(|source| AppError::ConfigFileRead {
                        path: path_display.clone(),
                        source,
                    })?;
                toml::from_str(&content).map_err(|source| AppError::ConfigParseFailed {
                    path: path_display,
                    source,
                })?
            }
            None => Self::default(),
        };

        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;

        tracing::debug!(
            config_file = ?path,
            simple_model = %config.models.simple,
            medium_model = %config.models.medium,
            complex_model = %config.models.complex,
            simple_threshold = config.routing.simple_threshold,
            complex_threshold = config.routing.complex_threshold,
            "Configuration loaded"
        );

        Ok(config)
    }

    /// Apply environment-style overrides from `lookup`
    ///
    /// `lookup` returns the raw value for a key, or `None` when unset. Taking
    /// a closure keeps this testable without touching the process environment.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> AppResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("HOST") {
            self.server.host = v;
        }
        if let Some(v) = lookup("PORT") {
            self.server.port = parse_env("PORT", &v)?;
        }
        if let Some(v) = lookup("UPSTREAM_URL") {
            self.upstream.base_url = v;
        }
        if let Some(v) = lookup("SIMPLE_MODEL") {
            self.models.simple = v;
        }
        if let Some(v) = lookup("MEDIUM_MODEL") {
            self.models.medium = v;
        }
        if let Some(v) = lookup("COMPLEX_MODEL") {
            self.models.complex = v;
        }
        if let Some(v) = lookup("SIMPLE_THRESHOLD") {
            self.routing.simple_threshold = parse_env("SIMPLE_THRESHOLD", &v)?;
        }
        if let Some(v) = lookup("COMPLEX_THRESHOLD") {
            self.routing.complex_threshold = parse_env("COMPLEX_THRESHOLD", &v)?;
        }
        if let Some(v) = lookup("FORCE_MODEL") {
            let trimmed = v.trim();
            self.routing.force_model = if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            };
        }
        if let Some(v) = lookup("DISABLED") {
            self.routing.disabled = parse_env_bool("DISABLED", &v)?;
        }
        if let Some(v) = lookup("VERBOSE") {
            self.observability.verbose = parse_env_bool("VERBOSE", &v)?;
        }
        if let Some(v) = lookup("LOG_LEVEL") {
            self.observability.log_level = v;
        }
        if let Some(v) = lookup("OLLAMA_ENABLED") {
            self.ollama.enabled = parse_env_bool("OLLAMA_ENABLED", &v)?;
        }
        if let Some(v) = lookup("OLLAMA_URL") {
            self.ollama.base_url = v;
        }
        if let Some(v) = lookup("OLLAMA_MODEL") {
            self.ollama.model = v;
        }
        if let Some(v) = lookup("OLLAMA_TIMEOUT_MS") {
            self.ollama.timeout_ms = parse_env("OLLAMA_TIMEOUT_MS", &v)?;
        }
        Ok(())
    }

    /// Validate configuration after parsing
    ///
    /// Called by `from_file()`, `load()` and `from_str()`; call it explicitly
    /// when building a Config by hand (e.g. in tests).
    pub fn validate(&self) -> AppResult<()> {
        for (tier_name, model) in [
            ("simple", &self.models.simple),
            ("medium", &self.models.medium),
            ("complex", &self.models.complex),
        ] {
            if model.trim().is_empty() {
                return Err(AppError::Config(format!(
                    "models.{} must name a model, got an empty string",
                    tier_name
                )));
            }
        }

        let simple = self.routing.simple_threshold;
        let complex = self.routing.complex_threshold;
        for (name, value) in [("simple_threshold", simple), ("complex_threshold", complex)] {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(AppError::Config(format!(
                    "routing.{} must be a finite number between 0.0 and 1.0, got {}",
                    name, value
                )));
            }
        }
        if simple >= complex {
            return Err(AppError::Config(format!(
                "routing.simple_threshold ({}) must be lower than routing.complex_threshold ({})",
                simple, complex
            )));
        }

        if let Some(forced) = &self.routing.force_model
            && forced.trim().is_empty()
        {
            return Err(AppError::Config(
                "routing.force_model must not be empty when set".to_string(),
            ));
        }

        for (name, url) in [
            ("upstream.base_url", &self.upstream.base_url),
            ("ollama.base_url", &self.ollama.base_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(AppError::Config(format!(
                    "{} '{}' must start with 'http://' or 'https://'",
                    name, url
                )));
            }
        }

        if self.upstream.connect_timeout_seconds == 0 {
            return Err(AppError::Config(
                "upstream.connect_timeout_seconds must be greater than 0".to_string(),
            ));
        }

        if self.ollama.enabled {
            if self.ollama.model.trim().is_empty() {
                return Err(AppError::Config(
                    "ollama.model must name a model when ollama.enabled = true".to_string(),
                ));
            }
            if self.ollama.timeout_ms == 0 || self.ollama.timeout_ms > 60_000 {
                return Err(AppError::Config(format!(
                    "ollama.timeout_ms must be between 1 and 60000, got {}",
                    self.ollama.timeout_ms
                )));
            }
        }

        Ok(())
    }
}

impl FromStr for Config {
    type Err = AppError;

    fn from_str(toml_str: &str) -> Result<Self, Self::Err> {
        let config: Config =
            toml::from_str(toml_str).map_err(|source| AppError::ConfigParseFailed {
                path: "<string>".to_string(),
                source,
            })?;

        config.validate()?;
        Ok(config)
    }
}

fn parse_env<T>(key: &str, value: &str) -> AppResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|e| AppError::ConfigEnvInvalid {
            key: key.to_string(),
            value: value.to_string(),
            reason: e.to_string(),
        })
}

fn parse_env_bool(key: &str, value: &str) -> AppResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(AppError::ConfigEnvInvalid {
            key: key.to_string(),
            value: value.to_string(),
            reason: "expected one of 1/true/yes/on or 0/false/no/off".to_string(),
        }),
    }
}

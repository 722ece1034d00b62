//! Configuration loading and validation for Incant.
//!
//! Loads configuration from `~/.incant/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use incant_core::protocol::ProtocolKind;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.incant/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Gemini API key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Model name passed to the backend
    #[serde(default = "default_model")]
    pub model: String,

    /// Override for the backend base URL (proxies, tests)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    /// Tool-call protocol: `structured` or `textual`
    #[serde(default)]
    pub protocol: ProtocolKind,

    /// Tools the agent may advertise, in catalog order
    #[serde(default = "default_tools")]
    pub tools: Vec<String>,

    /// Safety limit on backend calls per request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_iterations: Option<u32>,

    /// Optional system prompt sent with every request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,

    /// Conversation memory
    #[serde(default)]
    pub memory: MemoryConfig,
}

fn default_model() -> String {
    "gemini-1.5-flash".into()
}

fn default_tools() -> Vec<String> {
    vec!["get_weather".into(), "search_web".into()]
}

fn default_true() -> bool {
    true
}

/// Redact a secret for Debug output.
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
            .field("model", &self.model)
            .field("api_url", &self.api_url)
            .field("protocol", &self.protocol)
            .field("tools", &self.tools)
            .field("max_iterations", &self.max_iterations)
            .field("system_prompt", &self.system_prompt)
            .field("memory", &self.memory)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Keep conversation history across turns of a session
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.incant/config.toml).
    ///
    /// Environment variables take priority over the file:
    /// - `INCANT_API_KEY`, then `GEMINI_API_KEY`
    /// - `INCANT_MODEL`
    /// - `INCANT_PROTOCOL`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env(|key| std::env::var(key).ok())?;
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

    /// Apply environment overrides, reading variables through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup("INCANT_API_KEY").or_else(|| lookup("GEMINI_API_KEY")) {
            self.api_key = Some(key);
        }

        if let Some(model) = lookup("INCANT_MODEL") {
            self.model = model;
        }

        if let Some(protocol) = lookup("INCANT_PROTOCOL") {
            self.protocol = protocol
                .parse()
                .map_err(|e: String| ConfigError::ValidationError(format!("INCANT_PROTOCOL: {e}")))?;
        }

        self.validate()
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".incant")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model.trim().is_empty() {
            return Err(ConfigError::ValidationError("model must not be empty".into()));
        }

        if self.max_iterations == Some(0) {
            return Err(ConfigError::ValidationError(
                "max_iterations must be greater than 0".into(),
            ));
        }

        if let Some(url) = &self.api_url
            && !(url.starts_with("http://") || url.starts_with("https://"))
        {
            return Err(ConfigError::ValidationError(format!(
                "api_url must start with http:// or https:// (got '{url}')"
            )));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }

    /// Generate a starter config TOML string.
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            api_url: None,
            protocol: ProtocolKind::default(),
            tools: default_tools(),
            max_iterations: None,
            system_prompt: None,
            memory: MemoryConfig::default(),
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

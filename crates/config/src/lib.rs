//! Configuration loading, validation, and management for RustedMind.
//!
//! Loads configuration from `~/.rustedmind/config.toml` with environment
//! variable overrides. Validates all settings at startup. The resolved
//! [`AppConfig`] is handed to the agent once; nothing downstream reads the
//! process environment.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.rustedmind/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key for the model provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Provider kind: openai, openrouter, ollama or custom
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Base URL override (required for `custom`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    /// Model name
    #[serde(default = "default_model")]
    pub model: String,

    /// Fixed sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Optional cap on completion tokens
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Orchestration loop settings
    #[serde(default)]
    pub agent: AgentConfig,

    /// Activity report settings
    #[serde(default)]
    pub report: ReportConfig,

    /// Built-in tool limits
    #[serde(default)]
    pub tools: ToolsConfig,
}

fn default_provider() -> String {
    "openai".into()
}
fn default_model() -> String {
    "gpt-4o".into()
}
fn default_temperature() -> f32 {
    0.1
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
            .field("provider", &self.provider)
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("agent", &self.agent)
            .field("report", &self.report)
            .field("tools", &self.tools)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Maximum model calls per run
    #[serde(default = "default_max_turns")]
    pub max_turns: u32,

    /// Replaces the built-in planning instructions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt_override: Option<String>,

    /// Maximum directory entries in the environment snapshot
    #[serde(default = "default_snapshot_limit")]
    pub snapshot_limit: usize,
}

fn default_max_turns() -> u32 {
    10
}
fn default_snapshot_limit() -> usize {
    20
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_turns: default_max_turns(),
            system_prompt_override: None,
            snapshot_limit: default_snapshot_limit(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_report_path")]
    pub path: PathBuf,
}

fn default_true() -> bool {
    true
}
fn default_report_path() -> PathBuf {
    PathBuf::from("query_report.md")
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: default_report_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Wall-clock ceiling for a shell command
    #[serde(default = "default_shell_timeout")]
    pub shell_timeout_secs: u64,

    /// Shell and page output above this size is truncated
    #[serde(default = "default_max_output_bytes")]
    pub max_output_bytes: usize,

    /// Files larger than this are refused by `fs_read`
    #[serde(default = "default_fs_read_max_bytes")]
    pub fs_read_max_bytes: u64,

    /// Timeout for web search and page fetches
    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,

    /// Number of web search results returned
    #[serde(default = "default_search_results")]
    pub search_results: usize,
}

fn default_shell_timeout() -> u64 {
    15
}
fn default_max_output_bytes() -> usize {
    24_000
}
fn default_fs_read_max_bytes() -> u64 {
    128_000
}
fn default_http_timeout() -> u64 {
    15
}
fn default_search_results() -> usize {
    5
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            shell_timeout_secs: default_shell_timeout(),
            max_output_bytes: default_max_output_bytes(),
            fs_read_max_bytes: default_fs_read_max_bytes(),
            http_timeout_secs: default_http_timeout(),
            search_results: default_search_results(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.rustedmind/config.toml).
    ///
    /// Environment variables take priority over the file:
    /// - `RUSTEDMIND_API_KEY`, then `OPENAI_API_KEY`
    /// - `RUSTEDMIND_PROVIDER`
    /// - `RUSTEDMIND_MODEL`, then `OPENAI_MODEL`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        Self::load_with_env(&config_path)
    }

    /// Load from an explicit path, then apply environment overrides.
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load_from(path)?;
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

    /// Apply environment overrides through the given lookup.
    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(key) = var("RUSTEDMIND_API_KEY").or_else(|| var("OPENAI_API_KEY")) {
            self.api_key = Some(key);
        }

        if let Some(provider) = var("RUSTEDMIND_PROVIDER") {
            self.provider = provider;
        }

        if let Some(model) = var("RUSTEDMIND_MODEL").or_else(|| var("OPENAI_MODEL")) {
            self.model = model;
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        home_dir().join(".rustedmind")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::ValidationError(
                "temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.agent.max_turns == 0 {
            return Err(ConfigError::ValidationError(
                "agent.max_turns must be at least 1".into(),
            ));
        }

        if self.provider == "custom" && self.api_url.is_none() {
            return Err(ConfigError::ValidationError(
                "provider 'custom' requires api_url".into(),
            ));
        }

        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            provider: default_provider(),
            api_url: None,
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: None,
            agent: AgentConfig::default(),
            report: ReportConfig::default(),
            tools: ToolsConfig::default(),
        }
    }
}

/// Get the user's home directory.
pub fn home_dir() -> PathBuf {
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

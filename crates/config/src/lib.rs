//! Configuration loading, validation, and management for Dossier.
//!
//! Loads configuration from `~/.dossier/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use dossier_core::RetryPolicy;

/// The root configuration structure.
///
/// Maps directly to `~/.dossier/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Narrative generation service
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Bibliographic reference service
    #[serde(default)]
    pub references: ReferencesConfig,

    /// Retry policy shared by every external call
    #[serde(default)]
    pub retry: RetryConfig,

    /// Concurrency and corpus location
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Document-level settings
    #[serde(default)]
    pub document: DocumentConfig,

    /// Where and how the document is written
    #[serde(default)]
    pub output: OutputConfig,
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

// ── [generation] ──────────────────────────────────────────────────────────

#[derive(Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Base URL of an OpenAI-compatible chat completions API
    #[serde(default = "default_generation_url")]
    pub api_url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Per-attempt timeout for one generation request
    #[serde(default = "default_generation_timeout")]
    pub timeout_secs: u64,

    /// Maximum characters of corpus digest sent with each request
    #[serde(default = "default_corpus_char_limit")]
    pub corpus_char_limit: usize,
}

fn default_generation_url() -> String {
    "https://api.deepseek.com/v1".into()
}
fn default_model() -> String {
    "deepseek-chat".into()
}
fn default_temperature() -> f32 {
    0.4
}
fn default_max_tokens() -> u32 {
    4000
}
fn default_generation_timeout() -> u64 {
    60
}
fn default_corpus_char_limit() -> usize {
    150_000
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            api_url: default_generation_url(),
            api_key: None,
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_generation_timeout(),
            corpus_char_limit: default_corpus_char_limit(),
        }
    }
}

impl std::fmt::Debug for GenerationConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &redact(&self.api_key))
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("timeout_secs", &self.timeout_secs)
            .field("corpus_char_limit", &self.corpus_char_limit)
            .finish()
    }
}

// ── [references] ──────────────────────────────────────────────────────────

#[derive(Clone, Serialize, Deserialize)]
pub struct ReferencesConfig {
    #[serde(default = "default_references_url")]
    pub api_url: String,

    /// OAuth bearer token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    #[serde(default = "default_references_timeout")]
    pub timeout_secs: u64,

    /// When false every citation is left unresolved without a network call
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_references_url() -> String {
    "https://api.mendeley.com".into()
}
fn default_references_timeout() -> u64 {
    10
}
fn default_true() -> bool {
    true
}

impl Default for ReferencesConfig {
    fn default() -> Self {
        Self {
            api_url: default_references_url(),
            token: None,
            timeout_secs: default_references_timeout(),
            enabled: true,
        }
    }
}

impl std::fmt::Debug for ReferencesConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReferencesConfig")
            .field("api_url", &self.api_url)
            .field("token", &redact(&self.token))
            .field("timeout_secs", &self.timeout_secs)
            .field("enabled", &self.enabled)
            .finish()
    }
}

// ── [retry] ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

fn default_max_attempts() -> u32 {
    3
}
fn default_initial_backoff_ms() -> u64 {
    1000
}
fn default_backoff_multiplier() -> f64 {
    2.0
}
fn default_max_backoff_ms() -> u64 {
    30_000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
            backoff_multiplier: default_backoff_multiplier(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

impl RetryConfig {
    /// Build a [`RetryPolicy`] with the given per-attempt timeout.
    pub fn policy(&self, attempt_timeout_secs: u64) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            attempt_timeout: Duration::from_secs(attempt_timeout_secs),
            initial_backoff: Duration::from_millis(self.initial_backoff_ms),
            backoff_multiplier: self.backoff_multiplier,
            max_backoff: Duration::from_millis(self.max_backoff_ms),
        }
    }
}

// ── [pipeline] ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Corpus root containing the category folders
    #[serde(default = "default_corpus_root")]
    pub corpus_root: PathBuf,

    /// Upper bound on papers processed concurrently
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,
}

fn default_corpus_root() -> PathBuf {
    PathBuf::from(".")
}
fn default_max_workers() -> usize {
    5
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            corpus_root: default_corpus_root(),
            max_workers: default_max_workers(),
        }
    }
}

// ── [document] ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentConfig {
    #[serde(default = "default_title")]
    pub title: String,
}

fn default_title() -> String {
    "Economic Models of Internet and Bandwidth Pricing, 1990 to 2010".into()
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
        }
    }
}

// ── [output] ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_path")]
    pub path: PathBuf,

    /// One of `markdown`, `html`, `json`
    #[serde(default = "default_output_format")]
    pub format: String,
}

fn default_output_path() -> PathBuf {
    PathBuf::from("analysis_report.md")
}
fn default_output_format() -> String {
    "markdown".into()
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
            format: default_output_format(),
        }
    }
}

const OUTPUT_FORMATS: [&str; 3] = ["markdown", "html", "json"];

impl AppConfig {
    /// Load configuration from the default path (~/.dossier/config.toml).
    ///
    /// Environment variables override the file:
    /// - `DOSSIER_API_KEY`, then `DEEPSEEK_API_KEY` for generation
    /// - `MENDELEY_TOKEN` for references
    /// - `DOSSIER_MODEL` for the generation model
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        Self::load_with_env(&config_path)
    }

    /// Load from `path` and apply environment overrides.
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load_from(path)?;
        config.apply_env(|name| std::env::var(name).ok());
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

    /// Apply environment overrides through `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup("DOSSIER_API_KEY").or_else(|| lookup("DEEPSEEK_API_KEY")) {
            self.generation.api_key = Some(key);
        }
        if let Some(token) = lookup("MENDELEY_TOKEN") {
            self.references.token = Some(token);
        }
        if let Some(model) = lookup("DOSSIER_MODEL") {
            self.generation.model = model;
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".dossier")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.generation.temperature) {
            return Err(ConfigError::ValidationError(
                "generation.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.generation.corpus_char_limit == 0 {
            return Err(ConfigError::ValidationError(
                "generation.corpus_char_limit must be > 0".into(),
            ));
        }

        if self.pipeline.max_workers == 0 {
            return Err(ConfigError::ValidationError(
                "pipeline.max_workers must be >= 1".into(),
            ));
        }

        if self.retry.max_attempts == 0 {
            return Err(ConfigError::ValidationError(
                "retry.max_attempts must be >= 1".into(),
            ));
        }

        if self.retry.backoff_multiplier < 1.0 {
            return Err(ConfigError::ValidationError(
                "retry.backoff_multiplier must be >= 1.0".into(),
            ));
        }

        if !OUTPUT_FORMATS.contains(&self.output.format.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "output.format must be one of {}",
                OUTPUT_FORMATS.join(", ")
            )));
        }

        Ok(())
    }

    /// Check if a generation API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.generation.api_key.is_some()
    }

    /// Retry policy for generation requests.
    pub fn generation_retry(&self) -> RetryPolicy {
        self.retry.policy(self.generation.timeout_secs)
    }

    /// Retry policy for reference lookups.
    pub fn lookup_retry(&self) -> RetryPolicy {
        self.retry.policy(self.references.timeout_secs)
    }

    /// Generate a default config TOML string (for `onboard` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
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

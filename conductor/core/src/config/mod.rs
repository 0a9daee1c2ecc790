//! TOML Configuration File Support
//!
//! Centralized configuration loading for the Conductor, supporting a TOML
//! configuration file at `~/.config/chat-conductor/conductor.toml`.
//!
//! # Configuration Priority
//!
//! Configuration values are loaded with the following priority (highest first):
//! 1. CLI arguments (via [`ConfigOverrides`])
//! 2. Environment variables (`CHAT_CONDUCTOR_*`)
//! 3. TOML configuration file
//! 4. Default values
//!
//! # XDG Base Directory Compliance
//!
//! The configuration file follows XDG Base Directory specification:
//! - `$XDG_CONFIG_HOME/chat-conductor/conductor.toml`
//!
//! # Example Configuration
//!
//! ```toml
//! [endpoint]
//! base_url = "http://localhost:8000"
//! stream_path = "/chat/stream"
//! chat_path = "/chat"
//! health_path = "/health"
//! connect_timeout_ms = 10000
//! request_timeout_secs = 120
//!
//! [session]
//! user_id = "default_user"
//! fallback_message = "Sorry, something went wrong. Please try again."
//! greeting = "Hello! Tell me about your career goal."
//! update_channel_capacity = 100
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Prefix shared by all environment variables read here
pub const ENV_PREFIX: &str = "CHAT_CONDUCTOR_";

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file at {path}: {source}")]
    ReadError {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("Failed to parse TOML config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

// =============================================================================
// Configuration Source Tracking
// =============================================================================

/// Tracks where a configuration value came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Value from command-line argument
    Cli,
    /// Value from environment variable
    Env,
    /// Value from TOML configuration file
    File,
    /// Default value
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cli => write!(f, "CLI"),
            Self::Env => write!(f, "environment"),
            Self::File => write!(f, "config file"),
            Self::Default => write!(f, "default"),
        }
    }
}

// =============================================================================
// TOML Configuration Structures
// =============================================================================

/// Endpoint section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointToml {
    /// Base URL of the chat service
    pub base_url: Option<String>,

    /// Path of the streaming endpoint
    pub stream_path: Option<String>,

    /// Path of the non-streaming endpoint
    pub chat_path: Option<String>,

    /// Path of the health endpoint
    pub health_path: Option<String>,

    /// Connection timeout in milliseconds
    pub connect_timeout_ms: Option<u64>,

    /// Timeout for non-streamed requests in seconds
    pub request_timeout_secs: Option<u64>,
}

/// Session section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionToml {
    /// User id sent with every message
    pub user_id: Option<String>,

    /// Bot message shown when a reply fails
    pub fallback_message: Option<String>,

    /// Bot message seeded into an empty history (empty string disables it)
    pub greeting: Option<String>,

    /// Capacity of the update channel to the renderer
    pub update_channel_capacity: Option<usize>,
}

/// Top-level TOML configuration structure
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConductorToml {
    /// Endpoint configuration section
    pub endpoint: EndpointToml,

    /// Session configuration section
    pub session: SessionToml,
}

// =============================================================================
// Main Configuration Struct
// =============================================================================

/// Default greeting shown before the first exchange
pub const DEFAULT_GREETING: &str = "Hello! I'm your career development assistant. \
     I can help you with your career goals. Would you share yours with me?";

/// Default fallback shown when a reply fails
pub const DEFAULT_FALLBACK_MESSAGE: &str = "Sorry, something went wrong. Please try again.";

/// Configuration for the Conductor
///
/// Use [`load_config`] to load configuration with proper priority handling.
#[derive(Clone, Debug)]
pub struct ConductorConfig {
    /// Base URL of the chat service
    pub base_url: String,

    /// Path of the streaming endpoint
    pub stream_path: String,

    /// Path of the non-streaming endpoint
    pub chat_path: String,

    /// Path of the health endpoint
    pub health_path: String,

    /// User id sent with every message
    pub user_id: String,

    /// Connection timeout
    pub connect_timeout: Duration,

    /// Timeout for requests that are not streamed
    pub request_timeout: Duration,

    /// Bot message shown when a reply fails
    pub fallback_message: String,

    /// Bot message seeded into the history at startup
    pub greeting: Option<String>,

    /// Capacity of the update channel to the renderer
    pub update_channel_capacity: usize,

    /// Path to the config file that was loaded (if any)
    pub config_file_path: Option<PathBuf>,

    /// Source of configuration values
    source: ConfigSource,
}

impl Default for ConductorConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            stream_path: "/chat/stream".to_string(),
            chat_path: "/chat".to_string(),
            health_path: "/health".to_string(),
            user_id: "default_user".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(120),
            fallback_message: DEFAULT_FALLBACK_MESSAGE.to_string(),
            greeting: Some(DEFAULT_GREETING.to_string()),
            update_channel_capacity: 100,
            config_file_path: None,
            source: ConfigSource::Default,
        }
    }
}

impl ConductorConfig {
    /// Create a new configuration with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the base URL
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set or clear the greeting
    #[must_use]
    pub fn with_greeting(mut self, greeting: Option<String>) -> Self {
        self.greeting = greeting;
        self
    }

    /// Set the fallback message
    #[must_use]
    pub fn with_fallback_message(mut self, message: impl Into<String>) -> Self {
        self.fallback_message = message.into();
        self
    }

    /// Get the primary source of this configuration
    #[must_use]
    pub fn source(&self) -> ConfigSource {
        self.source
    }

    /// Check the configuration for values the Conductor cannot run with
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] for an empty base URL, a
    /// non-HTTP base URL or a zero channel capacity.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "base_url must not be empty".to_string(),
            ));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ConfigError::ValidationError(format!(
                "base_url must start with http:// or https://, got {:?}",
                self.base_url
            )));
        }
        if self.update_channel_capacity == 0 {
            return Err(ConfigError::ValidationError(
                "update_channel_capacity must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Configuration Loading
// =============================================================================

/// Get the default configuration file path
///
/// Returns `$XDG_CONFIG_HOME/chat-conductor/conductor.toml` or
/// `~/.config/chat-conductor/conductor.toml` if `XDG_CONFIG_HOME` is not set.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("chat-conductor").join("conductor.toml"))
}

/// Load configuration from all sources with proper priority
///
/// # Errors
///
/// Returns an error if the config file exists but cannot be parsed, or if
/// the resulting configuration is invalid. A missing config file is not an
/// error (defaults are used).
pub fn load_config() -> Result<ConductorConfig, ConfigError> {
    load_config_from_path(default_config_path())
}

/// Load configuration from a specific path plus the process environment
///
/// # Errors
///
/// Returns an error if the specified config file cannot be read or parsed,
/// or if the resulting configuration is invalid.
pub fn load_config_from_path(path: Option<PathBuf>) -> Result<ConductorConfig, ConfigError> {
    load_config_with_env(path, |key| std::env::var(key).ok())
}

/// Load configuration from a specific path and an explicit environment
///
/// `env` is asked for each `CHAT_CONDUCTOR_*` variable by full name.
///
/// # Errors
///
/// Same as [`load_config_from_path`].
pub fn load_config_with_env(
    path: Option<PathBuf>,
    env: impl Fn(&str) -> Option<String>,
) -> Result<ConductorConfig, ConfigError> {
    let mut config = ConductorConfig::default();

    if let Some(ref config_path) = path {
        if config_path.exists() {
            let toml_content =
                std::fs::read_to_string(config_path).map_err(|e| ConfigError::ReadError {
                    path: config_path.clone(),
                    source: e,
                })?;

            let toml_config: ConductorToml = toml::from_str(&toml_content)?;
            apply_toml_config(&mut config, &toml_config);
            config.config_file_path = Some(config_path.clone());
            config.source = ConfigSource::File;

            tracing::info!(
                path = %config_path.display(),
                "Loaded configuration from file"
            );
        } else {
            tracing::debug!(
                path = %config_path.display(),
                "Config file not found, using defaults"
            );
        }
    }

    apply_env_config(&mut config, env);

    config.validate()?;
    Ok(config)
}

/// Empty greeting text disables the greeting
fn greeting_from(text: &str) -> Option<String> {
    if text.trim().is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

/// Apply TOML configuration values to the config struct
fn apply_toml_config(config: &mut ConductorConfig, toml: &ConductorToml) {
    // Endpoint settings
    if let Some(ref url) = toml.endpoint.base_url {
        config.base_url.clone_from(url);
    }
    if let Some(ref path) = toml.endpoint.stream_path {
        config.stream_path.clone_from(path);
    }
    if let Some(ref path) = toml.endpoint.chat_path {
        config.chat_path.clone_from(path);
    }
    if let Some(ref path) = toml.endpoint.health_path {
        config.health_path.clone_from(path);
    }
    if let Some(ms) = toml.endpoint.connect_timeout_ms {
        config.connect_timeout = Duration::from_millis(ms);
    }
    if let Some(secs) = toml.endpoint.request_timeout_secs {
        config.request_timeout = Duration::from_secs(secs);
    }

    // Session settings
    if let Some(ref user_id) = toml.session.user_id {
        config.user_id.clone_from(user_id);
    }
    if let Some(ref message) = toml.session.fallback_message {
        config.fallback_message.clone_from(message);
    }
    if let Some(ref greeting) = toml.session.greeting {
        config.greeting = greeting_from(greeting);
    }
    if let Some(capacity) = toml.session.update_channel_capacity {
        config.update_channel_capacity = capacity;
    }
}

/// Apply environment variable overrides to the config
fn apply_env_config(config: &mut ConductorConfig, env: impl Fn(&str) -> Option<String>) {
    let var = |name: &str| env(&format!("{ENV_PREFIX}{name}"));

    if let Some(url) = var("BASE_URL") {
        config.base_url = url;
        config.source = ConfigSource::Env;
    }
    if let Some(path) = var("STREAM_PATH") {
        config.stream_path = path;
        config.source = ConfigSource::Env;
    }
    if let Some(path) = var("CHAT_PATH") {
        config.chat_path = path;
        config.source = ConfigSource::Env;
    }
    if let Some(path) = var("HEALTH_PATH") {
        config.health_path = path;
        config.source = ConfigSource::Env;
    }
    if let Some(user_id) = var("USER_ID") {
        config.user_id = user_id;
        config.source = ConfigSource::Env;
    }
    if let Some(timeout) = var("CONNECT_TIMEOUT_MS") {
        if let Ok(ms) = timeout.parse::<u64>() {
            config.connect_timeout = Duration::from_millis(ms);
            config.source = ConfigSource::Env;
        }
    }
    if let Some(timeout) = var("REQUEST_TIMEOUT_SECS") {
        if let Ok(secs) = timeout.parse::<u64>() {
            config.request_timeout = Duration::from_secs(secs);
            config.source = ConfigSource::Env;
        }
    }
    if let Some(message) = var("FALLBACK_MESSAGE") {
        config.fallback_message = message;
        config.source = ConfigSource::Env;
    }
    if let Some(greeting) = var("GREETING") {
        config.greeting = greeting_from(&greeting);
        config.source = ConfigSource::Env;
    }
    if let Some(capacity) = var("CHANNEL_CAPACITY") {
        if let Ok(n) = capacity.parse::<usize>() {
            config.update_channel_capacity = n;
            config.source = ConfigSource::Env;
        }
    }
}

// =============================================================================
// CLI Override Support
// =============================================================================

/// Builder for applying CLI overrides to configuration
///
/// Use this after [`load_config`] to apply command-line argument overrides.
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    /// Base URL override
    pub base_url: Option<String>,

    /// User id override
    pub user_id: Option<String>,

    /// Request timeout override (seconds)
    pub request_timeout_secs: Option<u64>,
}

impl ConfigOverrides {
    /// Create a new empty set of overrides
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set base URL override
    #[must_use]
    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = Some(url);
        self
    }

    /// Set user id override
    #[must_use]
    pub fn with_user_id(mut self, user_id: String) -> Self {
        self.user_id = Some(user_id);
        self
    }

    /// Set request timeout override
    #[must_use]
    pub fn with_request_timeout_secs(mut self, secs: u64) -> Self {
        self.request_timeout_secs = Some(secs);
        self
    }

    /// Apply overrides to a configuration
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] if the overridden
    /// configuration is invalid.
    pub fn apply(&self, config: &mut ConductorConfig) -> Result<(), ConfigError> {
        if self.base_url.is_some() || self.user_id.is_some() || self.request_timeout_secs.is_some()
        {
            config.source = ConfigSource::Cli;
        }

        if let Some(ref url) = self.base_url {
            config.base_url.clone_from(url);
        }

        if let Some(ref user_id) = self.user_id {
            config.user_id.clone_from(user_id);
        }

        if let Some(secs) = self.request_timeout_secs {
            config.request_timeout = Duration::from_secs(secs);
        }

        config.validate()
    }
}

// =============================================================================
// Tests
// =============================================================================

//! Configuration loading and validation
//!
//! Settings live in a TOML file with one section per concern. Every field
//! has a default so a missing file still yields a runnable fallback-only
//! service. LLM API keys are never stored in the file: the `[llm]` section
//! names an environment variable and the key is resolved at provider
//! construction time.

use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::Path;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },

    #[error("Failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Configuration validation failed: {message}")]
    ValidationError { message: String },

    #[error("Environment variable not set: {var}")]
    EnvVarNotSet { var: String },
}

impl ConfigError {
    fn validation<S: Into<String>>(message: S) -> Self {
        ConfigError::ValidationError {
            message: message.into(),
        }
    }
}

/// Top-level application configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    /// Optional LLM tutor backend. When absent the tutor runs in
    /// fallback-only mode and never makes a network call.
    #[serde(default)]
    pub llm: Option<LlmConfig>,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub limits: TraceLimits,
}

/// HTTP listener settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_bind")]
    pub bind: String,
}

/// LLM provider settings for the tutor
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LlmConfig {
    /// Provider name: "anthropic" or "openai"
    pub provider: String,

    /// Model identifier passed through to the provider
    pub model: String,

    /// Name of the environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Override for the provider's API base URL
    #[serde(default)]
    pub base_url: Option<String>,

    #[serde(default)]
    pub temperature: Option<f32>,

    #[serde(default)]
    pub max_tokens: Option<u32>,

    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
}

/// Chat session retention settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionConfig {
    /// Messages kept per session; older entries are dropped first
    #[serde(default = "default_max_messages")]
    pub max_messages: usize,

    /// Sessions kept in memory; least recently used are evicted first
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,

    /// Idle seconds before a session expires. Zero disables expiry.
    #[serde(default = "default_idle_ttl")]
    pub idle_ttl_secs: u64,
}

/// Input and output bounds for trace generation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TraceLimits {
    #[serde(default = "default_max_array_len")]
    pub max_array_len: usize,

    #[serde(default = "default_max_items")]
    pub max_items: usize,

    #[serde(default = "default_max_capacity")]
    pub max_capacity: usize,

    #[serde(default = "default_max_list_len")]
    pub max_list_len: usize,

    #[serde(default = "default_max_list_ops")]
    pub max_list_ops: usize,

    /// Frame budget per trace; generation fails rather than truncates
    #[serde(default = "default_max_trace_steps")]
    pub max_trace_steps: usize,
}

fn default_port() -> u16 {
    8080
}

fn default_bind() -> String {
    "0.0.0.0".to_string()
}

fn default_api_key_env() -> String {
    "ALGOSCOPE_LLM_API_KEY".to_string()
}

fn default_llm_timeout() -> u64 {
    60
}

fn default_max_messages() -> usize {
    20
}

fn default_max_sessions() -> usize {
    1024
}

fn default_idle_ttl() -> u64 {
    1800
}

fn default_max_array_len() -> usize {
    64
}

fn default_max_items() -> usize {
    12
}

fn default_max_capacity() -> usize {
    200
}

fn default_max_list_len() -> usize {
    32
}

fn default_max_list_ops() -> usize {
    32
}

fn default_max_trace_steps() -> usize {
    20_000
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            llm: None,
            session: SessionConfig::default(),
            limits: TraceLimits::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind: default_bind(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_messages: default_max_messages(),
            max_sessions: default_max_sessions(),
            idle_ttl_secs: default_idle_ttl(),
        }
    }
}

impl Default for TraceLimits {
    fn default() -> Self {
        Self {
            max_array_len: default_max_array_len(),
            max_items: default_max_items(),
            max_capacity: default_max_capacity(),
            max_list_len: default_max_list_len(),
            max_list_ops: default_max_list_ops(),
            max_trace_steps: default_max_trace_steps(),
        }
    }
}

impl AppConfig {
    /// Loads and validates configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.display().to_string(),
            });
        }

        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validates field values and cross-field constraints
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::validation("server.port must be non-zero"));
        }
        if self.server.bind.parse::<IpAddr>().is_err() {
            return Err(ConfigError::validation(format!(
                "server.bind is not a valid IP address: {}",
                self.server.bind
            )));
        }

        if let Some(llm) = &self.llm {
            llm.validate()?;
        }

        if self.session.max_messages < 2 {
            return Err(ConfigError::validation(
                "session.max_messages must be at least 2 to hold a question and an answer",
            ));
        }
        if self.session.max_sessions == 0 {
            return Err(ConfigError::validation(
                "session.max_sessions must be non-zero",
            ));
        }

        let limits = [
            ("limits.max_array_len", self.limits.max_array_len),
            ("limits.max_items", self.limits.max_items),
            ("limits.max_capacity", self.limits.max_capacity),
            ("limits.max_list_len", self.limits.max_list_len),
            ("limits.max_list_ops", self.limits.max_list_ops),
            ("limits.max_trace_steps", self.limits.max_trace_steps),
        ];
        for (name, value) in limits {
            if value == 0 {
                return Err(ConfigError::validation(format!("{name} must be non-zero")));
            }
        }

        Ok(())
    }

    /// Binding address for the HTTP listener
    ///
    /// `validate` guarantees the bind string parses, so this only fails on
    /// configs that skipped validation.
    pub fn listen_addr(&self) -> Result<(IpAddr, u16), ConfigError> {
        let ip: IpAddr = self.server.bind.parse().map_err(|_| {
            ConfigError::validation(format!(
                "server.bind is not a valid IP address: {}",
                self.server.bind
            ))
        })?;
        Ok((ip, self.server.port))
    }
}

impl LlmConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        match self.provider.as_str() {
            "anthropic" | "openai" => {}
            other => {
                return Err(ConfigError::validation(format!(
                    "llm.provider must be \"anthropic\" or \"openai\", got \"{other}\""
                )));
            }
        }

        if self.model.trim().is_empty() {
            return Err(ConfigError::validation("llm.model must not be empty"));
        }
        if self.api_key_env.trim().is_empty() {
            return Err(ConfigError::validation("llm.api_key_env must not be empty"));
        }

        if let Some(base_url) = &self.base_url {
            let parsed = Url::parse(base_url).map_err(|e| {
                ConfigError::validation(format!("llm.base_url is not a valid URL: {e}"))
            })?;
            if parsed.scheme() != "http" && parsed.scheme() != "https" {
                return Err(ConfigError::validation(format!(
                    "llm.base_url must use http or https, got {}",
                    parsed.scheme()
                )));
            }
        }

        if let Some(t) = self.temperature {
            if !(0.0..=2.0).contains(&t) {
                return Err(ConfigError::validation(
                    "llm.temperature must be between 0.0 and 2.0",
                ));
            }
        }

        if self.timeout_secs == 0 {
            return Err(ConfigError::validation("llm.timeout_secs must be non-zero"));
        }

        Ok(())
    }

    /// Resolves the API key from the configured environment variable
    pub fn resolve_api_key(&self) -> Result<String, ConfigError> {
        match std::env::var(&self.api_key_env) {
            Ok(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(ConfigError::EnvVarNotSet {
                var: self.api_key_env.clone(),
            }),
        }
    }
}

//! Broker configuration
//!
//! Provides configuration types for the broker and the pad servers it talks
//! to. Configuration is loaded from a TOML file or assembled with the
//! builder; either way it is validated before any adapter is constructed.
//!
//! Configuration errors fail fast: an unrecognized backend kind or a
//! malformed URL is a deployment mistake, not something to paper over at
//! request time.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::BackendKind;

/// Default length of an editing-session window, in seconds (one day).
pub const DEFAULT_SESSION_LENGTH_SECS: u64 = 86_400;

/// Default per-request timeout for remote backend calls, in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Broker-wide settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerConfig {
    /// Seconds an editing-session window stays valid before renewal
    #[serde(default = "default_session_length")]
    pub session_length_secs: u64,
    /// Bound on any single remote backend call
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_session_length() -> u64 {
    DEFAULT_SESSION_LENGTH_SECS
}

fn default_request_timeout() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            session_length_secs: DEFAULT_SESSION_LENGTH_SECS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl BrokerConfig {
    /// Create a new BrokerConfigBuilder
    pub fn builder() -> BrokerConfigBuilder {
        BrokerConfigBuilder::default()
    }

    /// The session window as a [`Duration`]
    pub fn session_length(&self) -> Duration {
        Duration::from_secs(self.session_length_secs)
    }

    /// The per-call timeout as a [`Duration`]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.session_length_secs == 0 {
            return Err(ConfigError::MissingValue("session_length_secs"));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::MissingValue("request_timeout_secs"));
        }
        Ok(())
    }
}

/// Builder for BrokerConfig
#[derive(Debug, Default)]
pub struct BrokerConfigBuilder {
    session_length_secs: Option<u64>,
    request_timeout_secs: Option<u64>,
}

impl BrokerConfigBuilder {
    /// Set the session window length in seconds
    pub fn session_length_secs(mut self, secs: u64) -> Self {
        self.session_length_secs = Some(secs);
        self
    }

    /// Set the per-call timeout in seconds
    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.request_timeout_secs = Some(secs);
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<BrokerConfig, ConfigError> {
        let config = BrokerConfig {
            session_length_secs: self.session_length_secs.unwrap_or(DEFAULT_SESSION_LENGTH_SECS),
            request_timeout_secs: self
                .request_timeout_secs
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        };
        config.validate()?;
        Ok(config)
    }
}

/// A configured pad server, as written in the deployment's TOML file.
///
/// This is the on-disk shape; [`crate::model::PadServer`] is the runtime
/// record built from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Display title
    pub title: String,
    /// Base URL of the remote service
    pub url: String,
    /// API key or login credential (backend-specific format)
    #[serde(default)]
    pub api_key: String,
    /// Which adapter speaks to this server
    pub backend: BackendKind,
    /// Free-form operator notes
    #[serde(default)]
    pub notes: String,
}

impl ServerConfig {
    /// Validate the server entry
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.title.trim().is_empty() {
            return Err(ConfigError::MissingValue("title"));
        }
        if !self.url.starts_with("http://") && !self.url.starts_with("https://") {
            return Err(ConfigError::InvalidUrl(self.url.clone()));
        }
        Ok(())
    }
}

/// Top-level configuration file: a `[broker]` table and `[[server]]` entries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    /// Broker-wide settings
    #[serde(default)]
    pub broker: BrokerConfig,
    /// Configured pad servers
    #[serde(default, rename = "server")]
    pub servers: Vec<ServerConfig>,
}

impl ConfigFile {
    /// Load and validate a configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Io(e.to_string()))?;
        Self::parse(&raw)
    }

    /// Parse and validate configuration from a TOML string
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(raw).map_err(|e| ConfigError::Parse(e.to_string()))?;
        file.broker.validate()?;
        for server in &file.servers {
            server.validate()?;
        }
        Ok(file)
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    #[error("missing value: {0}")]
    MissingValue(&'static str),
    #[error("could not read configuration: {0}")]
    Io(String),
    #[error("could not parse configuration: {0}")]
    Parse(String),
}

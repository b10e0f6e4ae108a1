//! Configuration Management
//!
//! Handles persistent configuration storage for clouding. Values are
//! layered: command line flags over `CLOUDING_*` environment variables over
//! the JSON file over built-in defaults.

use crate::clouding::action::PollConfig;
use crate::clouding::error::Error;
use crate::clouding::http::{ClientConfig, DEFAULT_API_VERSION, DEFAULT_ENDPOINT};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const TOKEN_ENV: &str = "CLOUDING_TOKEN";
pub const ENDPOINT_ENV: &str = "CLOUDING_ENDPOINT";

fn default_poll_interval_ms() -> u64 {
    5_000
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_create_timeout_secs() -> u64 {
    20 * 60
}

/// User configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// API key sent as `X-API-KEY`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Stop polling an action after this many fetches
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_poll_attempts: Option<u32>,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Upper bound for waiting on a server create or delete
    #[serde(default = "default_create_timeout_secs")]
    pub create_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            token: None,
            endpoint: None,
            api_version: None,
            poll_interval_ms: default_poll_interval_ms(),
            max_poll_attempts: None,
            request_timeout_secs: default_request_timeout_secs(),
            create_timeout_secs: default_create_timeout_secs(),
        }
    }
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("clouding").join("config.json"))
    }

    /// Load configuration from disk
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Load from `path`; a missing or unreadable file yields the defaults
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Ignoring malformed config {:?}: {}", path, e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Save configuration to `path`, creating its directory
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        Ok(())
    }

    /// Change one setting by its file key. An empty value clears the
    /// optional settings.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let value = value.trim();
        let text = || (!value.is_empty()).then(|| value.to_string());
        let number = |key: &str| -> Result<u64> {
            value
                .parse()
                .with_context(|| format!("{} expects a number, got {:?}", key, value))
        };

        match key {
            "token" => self.token = text(),
            "endpoint" => self.endpoint = text(),
            "api_version" => self.api_version = text(),
            "poll_interval_ms" => self.poll_interval_ms = number(key)?,
            "max_poll_attempts" => {
                self.max_poll_attempts = match value {
                    "" => None,
                    _ => Some(
                        value
                            .parse()
                            .with_context(|| format!("{} expects a number", key))?,
                    ),
                }
            }
            "request_timeout_secs" => self.request_timeout_secs = number(key)?,
            "create_timeout_secs" => self.create_timeout_secs = number(key)?,
            _ => bail!("unknown config key {:?}", key),
        }
        Ok(())
    }

    /// Copy safe to print: the token is masked
    pub fn redacted(&self) -> Self {
        Self {
            token: self.token.as_ref().map(|_| "********".to_string()),
            ..self.clone()
        }
    }

    /// Apply `CLOUDING_TOKEN` / `CLOUDING_ENDPOINT` from the process environment
    pub fn with_env(self) -> Self {
        self.with_env_from(|key| std::env::var(key).ok())
    }

    pub fn with_env_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(token) = lookup(TOKEN_ENV).filter(|v| !v.is_empty()) {
            self.token = Some(token);
        }
        if let Some(endpoint) = lookup(ENDPOINT_ENV).filter(|v| !v.is_empty()) {
            self.endpoint = Some(endpoint);
        }
        self
    }

    /// Apply command line flags
    pub fn with_overrides(mut self, token: Option<String>, endpoint: Option<String>) -> Self {
        if token.is_some() {
            self.token = token;
        }
        if endpoint.is_some() {
            self.endpoint = endpoint;
        }
        self
    }

    /// Settings for the HTTP transport; an empty token is rejected
    pub fn client_config(&self) -> std::result::Result<ClientConfig, Error> {
        let token = self.token.clone().unwrap_or_default();
        if token.trim().is_empty() {
            return Err(Error::Config(format!(
                "no API token configured, set {} or pass --token",
                TOKEN_ENV
            )));
        }

        Ok(ClientConfig::new(token)
            .with_endpoint(self.endpoint.as_deref().unwrap_or(DEFAULT_ENDPOINT))
            .with_api_version(self.api_version.as_deref().unwrap_or(DEFAULT_API_VERSION))
            .with_request_timeout(Duration::from_secs(self.request_timeout_secs)))
    }

    pub fn poll_config(&self) -> PollConfig {
        PollConfig {
            interval: Duration::from_millis(self.poll_interval_ms),
            max_attempts: self.max_poll_attempts,
        }
    }

    pub fn action_timeout(&self) -> Duration {
        Duration::from_secs(self.create_timeout_secs)
    }
}

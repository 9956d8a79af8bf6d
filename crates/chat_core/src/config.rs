use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::identity::Identity;

/// Relay used when nothing else is configured.
pub const DEFAULT_RELAY_URL: &str = "ws://localhost:8765";

const CONFIG_FILE_PATH: &str = "config.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid TOML config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid relay URL {url}: {reason}")]
    InvalidRelayUrl { url: String, reason: String },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base websocket URL of the relay; the session identity is appended.
    #[serde(default = "default_relay_url")]
    pub relay_url: String,
    /// Drop inbound messages attributed to our own identity.
    ///
    /// Only needed if the relay starts echoing a sender's messages back.
    #[serde(default)]
    pub dedupe_own_echo: bool,
    /// User agent used by shells to pick a layout.
    #[serde(default)]
    pub user_agent: Option<String>,
}

fn default_relay_url() -> String {
    DEFAULT_RELAY_URL.to_string()
}

fn stranger_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(".stranger")
}

fn stranger_config_json_path() -> PathBuf {
    stranger_dir().join("config.json")
}

pub fn parse_bool_env(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "y" | "on"
    )
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            relay_url: default_relay_url(),
            dedupe_own_echo: false,
            user_agent: None,
        }
    }
}

impl ClientConfig {
    /// Load configuration from `~/.stranger/config.json`, falling back to
    /// `./config.toml`, then apply environment overrides.
    pub fn load() -> Self {
        let mut config = Self::load_from(&stranger_config_json_path(), Path::new(CONFIG_FILE_PATH));
        config.apply_env(|key| std::env::var(key).ok());
        config
    }

    /// Load from explicit file locations without consulting the environment.
    ///
    /// The JSON file wins when both exist. Unreadable or malformed files are
    /// logged and skipped.
    pub fn load_from(json_path: &Path, toml_path: &Path) -> Self {
        if json_path.exists() {
            match Self::from_json_file(json_path) {
                Ok(config) => return config,
                Err(e) => log::warn!("Ignoring {}: {}", json_path.display(), e),
            }
        }

        if toml_path.exists() {
            match Self::from_toml_file(toml_path) {
                Ok(config) => return config,
                Err(e) => log::warn!("Ignoring {}: {}", toml_path.display(), e),
            }
        }

        Self::default()
    }

    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Apply `STRANGER_*` overrides using `lookup` to read variables.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(relay_url) = lookup("STRANGER_RELAY_URL") {
            self.relay_url = relay_url;
        }
        if let Some(dedupe) = lookup("STRANGER_DEDUPE_ECHO") {
            self.dedupe_own_echo = parse_bool_env(&dedupe);
        }
        if let Some(user_agent) = lookup("STRANGER_USER_AGENT") {
            self.user_agent = Some(user_agent);
        }
    }

    /// Check that the relay URL is a usable websocket base.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.relay_base().map(|_| ())
    }

    /// Endpoint for a session: the relay URL with the identity appended as
    /// the last path segment.
    pub fn endpoint_for(&self, identity: &Identity) -> Result<Url, ConfigError> {
        let mut url = self.relay_base()?;
        url.path_segments_mut()
            .map_err(|_| self.invalid_url("URL cannot carry a path"))?
            .pop_if_empty()
            .push(identity.as_str());
        Ok(url)
    }

    fn relay_base(&self) -> Result<Url, ConfigError> {
        let url = Url::parse(&self.relay_url).map_err(|e| self.invalid_url(e))?;
        if !matches!(url.scheme(), "ws" | "wss") {
            return Err(self.invalid_url(format!("unsupported scheme {}", url.scheme())));
        }
        if url.cannot_be_a_base() {
            return Err(self.invalid_url("URL cannot carry a path"));
        }
        Ok(url)
    }

    fn invalid_url(&self, reason: impl ToString) -> ConfigError {
        ConfigError::InvalidRelayUrl {
            url: self.relay_url.clone(),
            reason: reason.to_string(),
        }
    }
}

//! CLI configuration file support
//!
//! Loads configuration from ~/.config/nexus/config.toml

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use nexus_stream::SessionConfig;
use serde::{Deserialize, Serialize};

use crate::cli::Cli;

/// CLI configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CliConfig {
    /// Default settings
    #[serde(default)]
    pub default: DefaultConfig,
    /// Endpoint credentials
    #[serde(default)]
    pub auth: AuthConfig,
    /// Extra request headers
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Stream behaviour
    #[serde(default)]
    pub stream: StreamConfig,
}

/// Default configuration values
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DefaultConfig {
    /// Agent stream endpoint
    pub endpoint: Option<String>,
    /// Default agent ID
    pub agent_id: Option<String>,
    /// Conversation to attach messages to
    pub conversation_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AuthConfig {
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StreamConfig {
    pub connect_timeout_secs: Option<u64>,
    /// 0 disables the idle timeout
    pub read_timeout_secs: Option<u64>,
    pub stop_on_agent_error: Option<bool>,
}

impl CliConfig {
    /// Load configuration from the `--config` path or the default location
    pub fn load(path: Option<&Path>) -> Self {
        match path {
            Some(path) => Self::load_from_path(Some(path.to_path_buf())),
            None => Self::load_from_path(Self::default_path()),
        }
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: Option<PathBuf>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };

        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(&path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Ignoring invalid config file");
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }

    /// Get the default configuration file path
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("nexus").join("config.toml"))
    }

    /// Merge file values with command line overrides. Flags win.
    pub fn session_config(&self, cli: &Cli, conversation: Option<String>) -> SessionConfig {
        let mut config = SessionConfig::default();

        if let Some(endpoint) = cli.endpoint.clone().or_else(|| self.default.endpoint.clone()) {
            config.endpoint = endpoint;
        }
        if let Some(agent_id) = cli.agent.clone().or_else(|| self.default.agent_id.clone()) {
            config.agent_id = agent_id;
        }
        config.conversation_id = conversation.or_else(|| self.default.conversation_id.clone());
        config.api_key = cli.api_key.clone().or_else(|| self.auth.api_key.clone());
        config.headers = self.headers.clone();

        if let Some(secs) = self.stream.connect_timeout_secs {
            config.connect_timeout_secs = secs;
        }
        if let Some(secs) = self.stream.read_timeout_secs {
            config.read_timeout_secs = (secs > 0).then_some(secs);
        }
        if let Some(stop) = self.stream.stop_on_agent_error {
            config.stop_on_agent_error = stop;
        }

        config.session_id = Some(uuid::Uuid::new_v4().to_string());
        config
    }

    /// Copy suitable for printing
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if copy.auth.api_key.is_some() {
            copy.auth.api_key = Some("********".to_string());
        }
        copy
    }
}

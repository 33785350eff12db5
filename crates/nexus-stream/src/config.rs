//! Session configuration

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StreamError};

pub const DEFAULT_ENDPOINT: &str = "http://localhost:3000/api/agents/stream";
pub const DEFAULT_AGENT_ID: &str = "nexus";
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_READ_TIMEOUT_SECS: u64 = 120;

/// Everything one conversation needs to reach its agent
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SessionConfig {
    /// Agent stream endpoint (HTTP POST)
    pub endpoint: String,
    pub agent_id: String,
    pub session_id: Option<String>,
    pub conversation_id: Option<String>,
    /// Sent as `Authorization: Bearer <key>`
    pub api_key: Option<String>,
    /// Extra request headers
    pub headers: BTreeMap<String, String>,
    pub connect_timeout_secs: u64,
    /// Maximum idle time between reads. `None` waits forever.
    pub read_timeout_secs: Option<u64>,
    /// End the read loop on the first `error` chunk instead of continuing
    pub stop_on_agent_error: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            agent_id: DEFAULT_AGENT_ID.to_string(),
            session_id: None,
            conversation_id: None,
            api_key: None,
            headers: BTreeMap::new(),
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            read_timeout_secs: Some(DEFAULT_READ_TIMEOUT_SECS),
            stop_on_agent_error: false,
        }
    }
}

impl SessionConfig {
    pub fn new(endpoint: impl Into<String>, agent_id: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            agent_id: agent_id.into(),
            ..Self::default()
        }
    }

    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_conversation_id(mut self, conversation_id: impl Into<String>) -> Self {
        self.conversation_id = Some(conversation_id.into());
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_read_timeout(mut self, secs: Option<u64>) -> Self {
        self.read_timeout_secs = secs;
        self
    }

    pub fn with_stop_on_agent_error(mut self, stop: bool) -> Self {
        self.stop_on_agent_error = stop;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.agent_id.trim().is_empty() {
            return Err(StreamError::InvalidConfig("agent_id must not be empty".to_string()));
        }
        let url = reqwest::Url::parse(&self.endpoint).map_err(|e| {
            StreamError::InvalidConfig(format!("endpoint '{}': {}", self.endpoint, e))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(StreamError::InvalidConfig(format!(
                "endpoint must be http or https, got '{}'",
                url.scheme()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = SessionConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.agent_id, DEFAULT_AGENT_ID);
        assert!(!config.stop_on_agent_error);
    }

    #[test]
    fn test_rejects_bad_endpoint_and_agent() {
        let bad_url = SessionConfig::new("not a url", "a");
        assert!(matches!(bad_url.validate(), Err(StreamError::InvalidConfig(_))));

        let bad_scheme = SessionConfig::new("ftp://example.com/stream", "a");
        assert!(bad_scheme.validate().is_err());

        let no_agent = SessionConfig::new(DEFAULT_ENDPOINT, "  ");
        assert!(no_agent.validate().is_err());
    }

    #[test]
    fn test_builders() {
        let config = SessionConfig::default()
            .with_conversation_id("conv-9")
            .with_read_timeout(None)
            .with_header("x-trace", "1");
        assert_eq!(config.conversation_id.as_deref(), Some("conv-9"));
        assert_eq!(config.read_timeout_secs, None);
        assert_eq!(config.headers["x-trace"], "1");

        let config = config.with_read_timeout(Some(5));
        assert_eq!(config.read_timeout_secs, Some(5));
    }

    #[test]
    fn test_partial_deserialization_fills_defaults() {
        let config: SessionConfig =
            serde_json::from_str(r#"{"agent_id": "research", "stop_on_agent_error": true}"#)
                .unwrap();
        assert_eq!(config.agent_id, "research");
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert!(config.stop_on_agent_error);
    }
}

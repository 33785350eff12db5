//! Stream transport
//!
//! Issues the agent request and hands back the raw response body as a
//! stream of byte reads.

use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Response, StatusCode};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::config::SessionConfig;
use crate::error::{Result, StreamError};
use crate::http_client::build_http_client;

/// Raw body reads in arrival order
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

/// Truncate error bodies to avoid leaking large or sensitive responses.
const MAX_ERROR_BODY: usize = 512;

/// Request body posted to the agent endpoint
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AgentRequest {
    pub agent_id: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
}

impl AgentRequest {
    pub fn from_config(config: &SessionConfig, message: impl Into<String>) -> Self {
        Self {
            agent_id: config.agent_id.clone(),
            message: message.into(),
            session_id: config.session_id.clone(),
            conversation_id: config.conversation_id.clone(),
        }
    }
}

#[async_trait]
pub trait StreamTransport: Send + Sync {
    /// Send one request and return its body stream.
    async fn open(&self, request: &AgentRequest) -> Result<ByteStream>;
}

/// reqwest-backed transport posting JSON to the agent endpoint
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    endpoint: String,
    headers: HeaderMap,
}

impl HttpTransport {
    pub fn new(config: &SessionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            client: build_http_client(config)?,
            endpoint: config.endpoint.clone(),
            headers: build_headers(config)?,
        })
    }
}

#[async_trait]
impl StreamTransport for HttpTransport {
    async fn open(&self, request: &AgentRequest) -> Result<ByteStream> {
        debug!(endpoint = %self.endpoint, agent_id = %request.agent_id, "Opening agent stream");

        let response = self
            .client
            .post(&self.endpoint)
            .headers(self.headers.clone())
            .header("Accept", "text/event-stream")
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(response_to_error(response).await);
        }

        if response.status() == StatusCode::NO_CONTENT || response.content_length() == Some(0) {
            return Err(StreamError::Protocol("Response body is null".to_string()));
        }

        let stream = response
            .bytes_stream()
            .map(|read| read.map_err(|e| StreamError::Transport(e.to_string())));
        Ok(Box::pin(stream))
    }
}

fn build_headers(config: &SessionConfig) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    for (name, value) in &config.headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| StreamError::InvalidConfig(format!("header name '{}': {}", name, e)))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| StreamError::InvalidConfig(format!("header '{}' value: {}", name, e)))?;
        headers.insert(name, value);
    }
    if let Some(key) = &config.api_key {
        let mut value = HeaderValue::from_str(&format!("Bearer {}", key))
            .map_err(|e| StreamError::InvalidConfig(format!("api key: {}", e)))?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
    }
    Ok(headers)
}

pub fn parse_retry_after(response: &Response) -> Option<u64> {
    response
        .headers()
        .get("retry-after")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
}

pub async fn response_to_error(response: Response) -> StreamError {
    let status = response.status().as_u16();
    let retry_after = parse_retry_after(&response);
    let body = response.text().await.unwrap_or_default();
    status_error(status, &body, retry_after)
}

/// Build a request error from a status and raw body. The server message is
/// taken from `error` (string or `{message}`) or `message`; a body that is not
/// JSON yields `HTTP <status>`.
pub fn status_error(status: u16, body: &str, retry_after_secs: Option<u64>) -> StreamError {
    let server_message = serde_json::from_str::<Value>(body).ok().and_then(|json| {
        let error = json.get("error");
        error
            .and_then(Value::as_str)
            .or_else(|| error.and_then(|e| e.get("message")).and_then(Value::as_str))
            .or_else(|| json.get("message").and_then(Value::as_str))
            .map(str::to_string)
    });

    let message = match server_message {
        Some(message) if !message.is_empty() => truncate_body(message),
        _ => format!("HTTP {}", status),
    };

    StreamError::Request {
        status,
        message,
        retry_after_secs,
    }
}

fn truncate_body(mut message: String) -> String {
    if message.len() <= MAX_ERROR_BODY {
        return message;
    }
    let mut cut = MAX_ERROR_BODY;
    while !message.is_char_boundary(cut) {
        cut -= 1;
    }
    message.truncate(cut);
    message.push_str("... [truncated]");
    message
}

//! Wire chunk model

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Chunk discriminator (`type` on the wire)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChunkKind {
    Thinking,
    Content,
    ToolCall,
    Metadata,
    Error,
    /// Any type this client does not understand
    #[serde(other)]
    Unknown,
}

/// A unit of server-sent data: `{"type": ..., "data": ...}`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    #[serde(rename = "type")]
    pub kind: ChunkKind,
    #[serde(default)]
    pub data: Value,
}

impl Chunk {
    pub fn new(kind: ChunkKind, data: Value) -> Self {
        Self { kind, data }
    }

    pub fn thinking(text: impl Into<String>) -> Self {
        Self::new(ChunkKind::Thinking, Value::String(text.into()))
    }

    pub fn content(text: impl Into<String>) -> Self {
        Self::new(ChunkKind::Content, Value::String(text.into()))
    }

    pub fn tool_call(name: impl Into<String>, input: Value, result: Value) -> Self {
        Self::new(
            ChunkKind::ToolCall,
            json!({ "name": name.into(), "input": input, "result": result }),
        )
    }

    pub fn metadata(data: Value) -> Self {
        Self::new(ChunkKind::Metadata, data)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(ChunkKind::Error, json!({ "message": message.into() }))
    }

    /// Encode as one SSE frame (`data: <json>\n\n`).
    pub fn to_frame(&self) -> String {
        // Serializing a Value-backed struct cannot fail.
        let json = serde_json::to_string(self).unwrap_or_default();
        format!("data: {}\n\n", json)
    }
}

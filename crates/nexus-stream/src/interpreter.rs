//! Chunk interpreter
//!
//! Applies one decoded [`Chunk`] to the in-progress assistant message. The
//! store calls this inside a single watch update, so subscribers only see
//! the message before or after a chunk, never halfway.

use serde_json::Value;
use tracing::{debug, info};

use crate::chunk::{Chunk, ChunkKind};
use crate::message::{Message, ToolCallRecord};

/// Fallback text for error chunks without a usable `message`
pub const UNKNOWN_AGENT_ERROR: &str = "Unknown agent error";

/// Result of applying one chunk
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interpretation {
    /// The message changed
    Updated,
    /// Metadata reported `status: "complete"`. Only a signal; the stream still ends at EOF.
    Completed,
    /// The agent sent an error chunk. The message is left untouched.
    AgentError(String),
    /// Wrong payload shape or unknown chunk type
    Ignored,
}

impl Interpretation {
    pub fn is_update(&self) -> bool {
        matches!(self, Interpretation::Updated | Interpretation::Completed)
    }
}

pub fn interpret(message: &mut Message, chunk: &Chunk) -> Interpretation {
    match chunk.kind {
        ChunkKind::Thinking => match chunk.data.as_str() {
            Some(text) => {
                message.thinking.get_or_insert_with(String::new).push_str(text);
                Interpretation::Updated
            }
            None => ignored(chunk),
        },
        ChunkKind::Content => match chunk.data.as_str() {
            Some(text) => {
                message.content.push_str(text);
                Interpretation::Updated
            }
            None => ignored(chunk),
        },
        ChunkKind::ToolCall => {
            let Some(name) = chunk.data.get("name").and_then(Value::as_str) else {
                return ignored(chunk);
            };
            let record = ToolCallRecord {
                name: name.to_string(),
                input: chunk.data.get("input").cloned().unwrap_or(Value::Null),
                result: chunk.data.get("result").cloned().unwrap_or(Value::Null),
            };
            message.tool_calls.get_or_insert_with(Vec::new).push(record);
            Interpretation::Updated
        }
        ChunkKind::Metadata => {
            let Some(fields) = chunk.data.as_object() else {
                return ignored(chunk);
            };
            for (key, value) in fields {
                message.metadata.insert(key.clone(), value.clone());
            }
            if message.status() == Some("complete") {
                info!(message_id = %message.id, "Agent reported completion");
                Interpretation::Completed
            } else {
                Interpretation::Updated
            }
        }
        ChunkKind::Error => {
            let text = chunk
                .data
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or(UNKNOWN_AGENT_ERROR);
            Interpretation::AgentError(text.to_string())
        }
        ChunkKind::Unknown => ignored(chunk),
    }
}

fn ignored(chunk: &Chunk) -> Interpretation {
    debug!(kind = ?chunk.kind, "Ignoring chunk with unexpected payload");
    Interpretation::Ignored
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn apply_all(chunks: &[Chunk]) -> Message {
        let mut message = Message::assistant_placeholder();
        for chunk in chunks {
            interpret(&mut message, chunk);
        }
        message
    }

    #[test]
    fn test_content_concatenates_in_order() {
        let parts = ["The ", "quick ", "", "brown ", "fox"];
        let chunks: Vec<Chunk> = parts.iter().map(|p| Chunk::content(*p)).collect();
        assert_eq!(apply_all(&chunks).content, parts.concat());
    }

    #[test]
    fn test_thinking_initialised_and_appended() {
        let message = apply_all(&[Chunk::thinking("let me "), Chunk::thinking("see")]);
        assert_eq!(message.thinking.as_deref(), Some("let me see"));
        assert!(message.content.is_empty());
    }

    #[test]
    fn test_non_string_text_payload_is_ignored() {
        let mut message = Message::assistant_placeholder();
        let before = message.clone();
        let chunk = Chunk::new(ChunkKind::Content, json!({"text": "nope"}));
        assert_eq!(interpret(&mut message, &chunk), Interpretation::Ignored);
        assert_eq!(message, before);
    }

    #[test]
    fn test_tool_calls_require_name() {
        let message = apply_all(&[
            Chunk::tool_call("search", json!({"q": "rust"}), json!(["a"])),
            Chunk::metadata(json!({"noise": true})),
            Chunk::new(ChunkKind::ToolCall, json!({"input": {}})),
            Chunk::new(ChunkKind::ToolCall, json!({"name": "fetch"})),
        ]);
        let calls = message.tool_calls.unwrap();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].name, "search");
        assert_eq!(calls[0].input, json!({"q": "rust"}));
        assert_eq!(calls[1].name, "fetch");
        assert_eq!(calls[1].input, Value::Null);
        assert_eq!(calls[1].result, Value::Null);
    }

    #[test]
    fn test_metadata_shallow_merge_later_wins() {
        let message = apply_all(&[
            Chunk::metadata(json!({"model": "a", "tokens": 1, "nested": {"x": 1}})),
            Chunk::metadata(json!({"tokens": 2, "nested": {"y": 2}})),
            Chunk::metadata(json!("not an object")),
        ]);
        assert_eq!(message.metadata["model"], "a");
        assert_eq!(message.metadata["tokens"], 2);
        assert_eq!(message.metadata["nested"], json!({"y": 2}));
    }

    #[test]
    fn test_status_complete_is_signal_only() {
        let mut message = Message::assistant_placeholder();
        let result = interpret(&mut message, &Chunk::metadata(json!({"status": "complete"})));
        assert_eq!(result, Interpretation::Completed);
        assert!(result.is_update());
        assert_eq!(message.status(), Some("complete"));

        assert_eq!(interpret(&mut message, &Chunk::content("more")), Interpretation::Updated);
        assert_eq!(message.content, "more");
    }

    #[test]
    fn test_error_message_and_fallback() {
        let mut message = Message::assistant_placeholder();
        assert_eq!(
            interpret(&mut message, &Chunk::error("quota exceeded")),
            Interpretation::AgentError("quota exceeded".to_string())
        );
        assert_eq!(
            interpret(&mut message, &Chunk::new(ChunkKind::Error, json!({"code": 7}))),
            Interpretation::AgentError(UNKNOWN_AGENT_ERROR.to_string())
        );
        assert!(message.content.is_empty());
    }

    #[test]
    fn test_long_reply_keeps_one_buffer() {
        let mut message = Message::assistant_placeholder();
        message.content.reserve(10_000);
        let buffer = message.content.as_ptr();
        for _ in 0..1_000 {
            interpret(&mut message, &Chunk::content("0123456789"));
        }
        assert_eq!(message.content.len(), 10_000);
        assert_eq!(message.content.as_ptr(), buffer);
    }
}

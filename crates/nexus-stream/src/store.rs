//! Conversation state store
//!
//! Single owner of the message list. Every mutation happens inside one
//! `watch` update, so readers only ever observe whole snapshots and the
//! idle to streaming transition is a single check-and-set.

use std::fmt::Write as _;

use serde::Serialize;
use tokio::sync::watch;

use crate::chunk::Chunk;
use crate::error::StreamError;
use crate::interpreter::{Interpretation, interpret};
use crate::message::{Message, Role};

/// Whether a stream is currently open for this conversation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamStatus {
    #[default]
    Idle,
    Streaming,
}

/// Error state exposed to the UI
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversationError {
    pub message: String,
    pub status: Option<u16>,
    pub retryable: bool,
}

impl From<&StreamError> for ConversationError {
    fn from(err: &StreamError) -> Self {
        Self {
            message: err.to_string(),
            status: err.status(),
            retryable: err.is_retryable(),
        }
    }
}

impl std::fmt::Display for ConversationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

/// Immutable view of the conversation published on every change
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConversationSnapshot {
    pub messages: Vec<Message>,
    pub status: StreamStatus,
    pub error: Option<ConversationError>,
    pub current_chunk: Option<Chunk>,
}

impl ConversationSnapshot {
    pub fn is_streaming(&self) -> bool {
        self.status == StreamStatus::Streaming
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Render the transcript as Markdown.
    pub fn export_markdown(&self) -> String {
        let mut out = String::from("# Conversation\n");
        for message in &self.messages {
            let who = match message.role {
                Role::User => "User",
                Role::Assistant => "Assistant",
            };
            let _ = write!(
                out,
                "\n## {} ({})\n\n",
                who,
                message.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
            );
            if let Some(thinking) = message.thinking.as_deref().filter(|t| !t.is_empty()) {
                for line in thinking.lines() {
                    let _ = writeln!(out, "> {}", line);
                }
                out.push('\n');
            }
            if !message.content.is_empty() {
                out.push_str(&message.content);
                out.push('\n');
            }
            for call in message.tool_calls.iter().flatten() {
                let _ = writeln!(out, "\n- tool `{}` input: `{}`", call.name, call.input);
                if !call.result.is_null() {
                    let _ = writeln!(out, "  result: `{}`", call.result);
                }
            }
        }
        out
    }
}

#[derive(Debug)]
pub struct ConversationStore {
    tx: watch::Sender<ConversationSnapshot>,
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversationStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(ConversationSnapshot::default());
        Self { tx }
    }

    pub fn subscribe(&self) -> watch::Receiver<ConversationSnapshot> {
        self.tx.subscribe()
    }

    pub fn snapshot(&self) -> ConversationSnapshot {
        self.tx.borrow().clone()
    }

    pub fn messages(&self) -> Vec<Message> {
        self.tx.borrow().messages.clone()
    }

    pub fn len(&self) -> usize {
        self.tx.borrow().messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_streaming(&self) -> bool {
        self.tx.borrow().is_streaming()
    }

    pub fn error(&self) -> Option<ConversationError> {
        self.tx.borrow().error.clone()
    }

    pub fn current_chunk(&self) -> Option<Chunk> {
        self.tx.borrow().current_chunk.clone()
    }

    pub fn last_message(&self) -> Option<Message> {
        self.tx.borrow().messages.last().cloned()
    }

    pub fn append(&self, message: Message) {
        self.tx.send_modify(|state| state.messages.push(message));
    }

    /// Replace the final message. Returns false when the list is empty.
    pub fn replace_last(&self, message: Message) -> bool {
        self.tx.send_if_modified(|state| match state.messages.last_mut() {
            Some(last) => {
                *last = message;
                true
            }
            None => false,
        })
    }

    /// Empty the conversation and clear error state. A no-op on an empty store.
    pub fn clear(&self) {
        self.tx.send_if_modified(|state| {
            let changed = !state.messages.is_empty()
                || state.error.is_some()
                || state.current_chunk.is_some();
            state.messages.clear();
            state.error = None;
            state.current_chunk = None;
            changed
        });
    }

    /// Move from idle to streaming. Returns false if a stream is already open.
    pub fn begin_streaming(&self) -> bool {
        self.tx.send_if_modified(|state| {
            if state.status == StreamStatus::Streaming {
                return false;
            }
            state.status = StreamStatus::Streaming;
            true
        })
    }

    pub fn finish_streaming(&self) {
        self.tx.send_if_modified(|state| {
            let changed = state.status != StreamStatus::Idle;
            state.status = StreamStatus::Idle;
            changed
        });
    }

    pub fn set_error(&self, error: Option<ConversationError>) {
        self.tx.send_if_modified(|state| {
            if state.error == error {
                return false;
            }
            state.error = error;
            true
        });
    }

    /// Apply a chunk to the in-progress assistant message in one watch update.
    ///
    /// The chunk becomes `current_chunk` regardless of its effect. If the last
    /// message is not an assistant turn (e.g. the conversation was cleared
    /// mid-stream) the chunk is ignored.
    pub fn apply_chunk(&self, chunk: Chunk) -> Interpretation {
        let mut outcome = Interpretation::Ignored;
        self.tx.send_modify(|state| {
            if let Some(last) = state.messages.last_mut().filter(|m| m.is_assistant()) {
                outcome = interpret(last, &chunk);
            }
            state.current_chunk = Some(chunk);
        });
        outcome
    }

    /// Remove the last user message and everything after it, returning its text.
    pub fn take_last_exchange(&self) -> Option<String> {
        let mut text = None;
        self.tx.send_if_modified(|state| {
            let Some(idx) = state.messages.iter().rposition(Message::is_user) else {
                return false;
            };
            text = Some(state.messages[idx].content.clone());
            state.messages.truncate(idx);
            true
        });
        text
    }
}

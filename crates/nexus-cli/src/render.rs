use std::io::{self, Write};

use colored::Colorize;
use nexus_stream::{Chunk, ChunkKind, ConversationObserver, Message, StreamError};
use serde_json::Value;
use tokio::sync::Mutex;

use crate::cli::OutputFormat;

/// Prints chunks to stdout as they arrive
pub struct TerminalObserver {
    format: OutputFormat,
    show_thinking: bool,
    output: Mutex<io::Stdout>,
}

impl TerminalObserver {
    pub fn new(format: OutputFormat, show_thinking: bool) -> Self {
        Self {
            format,
            show_thinking,
            output: Mutex::new(io::stdout()),
        }
    }

    async fn write(&self, text: &str) {
        let mut output = self.output.lock().await;
        let _ = write!(output, "{}", text);
        let _ = output.flush();
    }
}

/// Text rendering of one chunk, or `None` when nothing should be printed.
pub fn render_chunk(chunk: &Chunk, show_thinking: bool) -> Option<String> {
    match chunk.kind {
        ChunkKind::Content => chunk.data.as_str().map(str::to_string),
        ChunkKind::Thinking if show_thinking => {
            chunk.data.as_str().map(|t| t.dimmed().italic().to_string())
        }
        ChunkKind::ToolCall => {
            let name = chunk.data.get("name").and_then(Value::as_str)?;
            Some(format!("\n{} {}\n", "tool".cyan().bold(), name.cyan()))
        }
        _ => None,
    }
}

#[async_trait::async_trait]
impl ConversationObserver for TerminalObserver {
    async fn on_chunk(&self, chunk: &Chunk) {
        if self.format.is_json() {
            match serde_json::to_string(chunk) {
                Ok(json) => self.write(&format!("{}\n", json)).await,
                Err(err) => tracing::warn!("Failed to serialize chunk: {}", err),
            }
            return;
        }
        if let Some(text) = render_chunk(chunk, self.show_thinking) {
            self.write(&text).await;
        }
    }

    async fn on_error(&self, error: &StreamError) {
        if self.format.is_json() {
            let line = serde_json::json!({ "type": "error", "data": { "message": error.to_string() } });
            self.write(&format!("{}\n", line)).await;
            return;
        }
        // Fatal errors come back as the send outcome and are printed by the command.
        if matches!(error, StreamError::Agent(_)) {
            eprintln!("\n{} {}", "Agent error:".red().bold(), error);
        }
    }

    async fn on_complete(&self, _message: &Message) {
        if !self.format.is_json() {
            self.write("\n").await;
        }
    }
}

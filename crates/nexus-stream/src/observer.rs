use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::chunk::Chunk;
use crate::error::StreamError;
use crate::message::Message;
use crate::store::ConversationError;

/// Caller hooks for a conversation. Every method defaults to a no-op.
#[async_trait]
pub trait ConversationObserver: Send + Sync {
    /// Every decoded chunk, before it is applied
    async fn on_chunk(&self, _chunk: &Chunk) {}
    async fn on_error(&self, _error: &StreamError) {}
    /// The stream reached EOF; `message` is the final assistant turn
    async fn on_complete(&self, _message: &Message) {}
    /// A user message was appended. Hook for external persistence.
    async fn on_message_sent(&self, _message: &Message) {}
    /// A finished assistant message. Hook for external persistence.
    async fn on_message_received(&self, _message: &Message) {}
}

pub struct NullObserver;

#[async_trait]
impl ConversationObserver for NullObserver {}

/// Observer callbacks as values, for consumers that prefer a channel
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Chunk(Chunk),
    Error(ConversationError),
    Complete(Message),
    MessageSent(Message),
    MessageReceived(Message),
}

pub struct ChannelObserver {
    tx: mpsc::UnboundedSender<SessionEvent>,
}

impl ChannelObserver {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl ConversationObserver for ChannelObserver {
    async fn on_chunk(&self, chunk: &Chunk) {
        let _ = self.tx.send(SessionEvent::Chunk(chunk.clone()));
    }

    async fn on_error(&self, error: &StreamError) {
        let _ = self.tx.send(SessionEvent::Error(error.into()));
    }

    async fn on_complete(&self, message: &Message) {
        let _ = self.tx.send(SessionEvent::Complete(message.clone()));
    }

    async fn on_message_sent(&self, message: &Message) {
        let _ = self.tx.send(SessionEvent::MessageSent(message.clone()));
    }

    async fn on_message_received(&self, message: &Message) {
        let _ = self.tx.send(SessionEvent::MessageReceived(message.clone()));
    }
}

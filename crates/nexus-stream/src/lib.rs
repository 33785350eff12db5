//! Nexus Stream - streaming agent chat client
//!
//! This crate provides:
//! - HTTP transport posting chat messages to an agent endpoint
//! - Incremental SSE frame decoder for the `data: <json>` chunk protocol
//! - Chunk interpreter building the in-progress assistant message
//! - Conversation store publishing immutable snapshots to UIs
//! - Agent session with send, retry, clear and cancellation

pub mod chunk;
pub mod config;
pub mod decoder;
pub mod error;
mod http_client;
pub mod interpreter;
pub mod message;
pub mod mock;
pub mod observer;
pub mod session;
pub mod store;
pub mod transport;

// Re-export commonly used types
pub use chunk::{Chunk, ChunkKind};
pub use config::SessionConfig;
pub use decoder::FrameDecoder;
pub use error::{Result, StreamError};
pub use interpreter::{Interpretation, interpret};
pub use message::{Message, Role, ToolCallRecord};
pub use mock::{MockResponse, MockTransport};
pub use observer::{ChannelObserver, ConversationObserver, NullObserver, SessionEvent};
pub use session::{AgentSession, RejectReason, SendHandle, SendOutcome};
pub use store::{ConversationError, ConversationSnapshot, ConversationStore, StreamStatus};
pub use transport::{AgentRequest, ByteStream, HttpTransport, StreamTransport};
pub use tokio_util::sync::CancellationToken;

//! Agent session
//!
//! One conversation against one agent endpoint. Wires the transport, frame
//! decoder and store together and exposes the operations a UI calls:
//! send, retry, clear, and reactive snapshots of the transcript.

use std::sync::Arc;

use futures::StreamExt;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::chunk::Chunk;
use crate::config::SessionConfig;
use crate::decoder::FrameDecoder;
use crate::error::{Result, StreamError};
use crate::interpreter::Interpretation;
use crate::message::Message;
use crate::observer::{ConversationObserver, NullObserver};
use crate::store::{ConversationError, ConversationSnapshot, ConversationStore};
use crate::transport::{AgentRequest, HttpTransport, StreamTransport};

/// Why a send was refused before anything was sent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    EmptyMessage,
    AlreadyStreaming,
    NothingToRetry,
}

/// How one send ended
#[derive(Debug, Clone, PartialEq)]
pub enum SendOutcome {
    /// Stream reached EOF
    Completed,
    /// Caller cancelled; the partial assistant message is kept
    Cancelled,
    Rejected(RejectReason),
    /// Request or stream failed; the error is also in the session's error state
    Failed(ConversationError),
}

impl SendOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, SendOutcome::Completed)
    }
}

/// A send running on the tokio runtime
#[derive(Debug)]
pub struct SendHandle {
    cancel: CancellationToken,
    task: JoinHandle<SendOutcome>,
}

impl SendHandle {
    /// Stop consuming the stream. The connection is dropped at the next read.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    pub async fn join(self) -> SendOutcome {
        match self.task.await {
            Ok(outcome) => outcome,
            Err(e) => SendOutcome::Failed(ConversationError {
                message: format!("send task failed: {}", e),
                status: None,
                retryable: false,
            }),
        }
    }
}

enum StreamEnd {
    Eof,
    Cancelled,
}

struct SessionInner {
    config: SessionConfig,
    transport: Arc<dyn StreamTransport>,
    observer: Arc<dyn ConversationObserver>,
    store: ConversationStore,
}

/// Resets the streaming flag on every exit path, including task abort.
struct StreamingGuard<'a>(&'a ConversationStore);

impl Drop for StreamingGuard<'_> {
    fn drop(&mut self) {
        self.0.finish_streaming();
    }
}

#[derive(Clone)]
pub struct AgentSession {
    inner: Arc<SessionInner>,
}

impl AgentSession {
    pub fn new(config: SessionConfig, transport: Arc<dyn StreamTransport>) -> Self {
        Self::with_observer(config, transport, Arc::new(NullObserver))
    }

    pub fn with_observer(
        config: SessionConfig,
        transport: Arc<dyn StreamTransport>,
        observer: Arc<dyn ConversationObserver>,
    ) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                config,
                transport,
                observer,
                store: ConversationStore::new(),
            }),
        }
    }

    /// Session backed by the HTTP transport described by `config`.
    pub fn http(config: SessionConfig, observer: Arc<dyn ConversationObserver>) -> Result<Self> {
        let transport = HttpTransport::new(&config)?;
        Ok(Self::with_observer(config, Arc::new(transport), observer))
    }

    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    pub fn store(&self) -> &ConversationStore {
        &self.inner.store
    }

    pub fn subscribe(&self) -> watch::Receiver<ConversationSnapshot> {
        self.inner.store.subscribe()
    }

    pub fn snapshot(&self) -> ConversationSnapshot {
        self.inner.store.snapshot()
    }

    pub fn messages(&self) -> Vec<Message> {
        self.inner.store.messages()
    }

    pub fn is_streaming(&self) -> bool {
        self.inner.store.is_streaming()
    }

    pub fn error(&self) -> Option<ConversationError> {
        self.inner.store.error()
    }

    pub fn current_chunk(&self) -> Option<Chunk> {
        self.inner.store.current_chunk()
    }

    /// Start sending `text` in the background.
    pub fn send_message(&self, text: impl Into<String>) -> SendHandle {
        let text = text.into();
        self.spawn(move |session, cancel| async move { session.send(&text, cancel).await })
    }

    /// Resend the last user message in the background.
    pub fn retry(&self) -> SendHandle {
        self.spawn(|session, cancel| async move { session.retry_with(cancel).await })
    }

    pub fn clear_messages(&self) {
        self.inner.store.clear();
    }

    /// Send `text` and drive its stream to the end on the current task.
    ///
    /// Never fails: errors land in the session's error state, go to the
    /// observer and are returned as [`SendOutcome::Failed`].
    pub async fn send(&self, text: &str, cancel: CancellationToken) -> SendOutcome {
        if text.trim().is_empty() {
            warn!("Ignoring empty message");
            return SendOutcome::Rejected(RejectReason::EmptyMessage);
        }
        let Some(streaming) = self.begin_streaming() else {
            warn!("A stream is already open, ignoring message");
            return SendOutcome::Rejected(RejectReason::AlreadyStreaming);
        };
        self.run_exchange(streaming, text, cancel).await
    }

    /// Drop the last user/assistant exchange and send the same text again.
    ///
    /// The streaming flag is taken before the transcript is touched, so a
    /// rejected retry never removes anything.
    pub async fn retry_with(&self, cancel: CancellationToken) -> SendOutcome {
        let Some(streaming) = self.begin_streaming() else {
            warn!("A stream is already open, ignoring retry");
            return SendOutcome::Rejected(RejectReason::AlreadyStreaming);
        };
        let Some(text) = self.inner.store.take_last_exchange() else {
            return SendOutcome::Rejected(RejectReason::NothingToRetry);
        };
        info!(len = text.len(), "Retrying last message");
        self.run_exchange(streaming, &text, cancel).await
    }

    fn begin_streaming(&self) -> Option<StreamingGuard<'_>> {
        let store = &self.inner.store;
        store.begin_streaming().then(|| StreamingGuard(store))
    }

    /// Body of a send. The caller already owns the streaming flag.
    async fn run_exchange(
        &self,
        _streaming: StreamingGuard<'_>,
        text: &str,
        cancel: CancellationToken,
    ) -> SendOutcome {
        let store = &self.inner.store;
        store.set_error(None);
        let user_message = Message::user(text);
        store.append(user_message.clone());
        self.inner.observer.on_message_sent(&user_message).await;
        store.append(Message::assistant_placeholder());

        match self.stream_reply(text, &cancel).await {
            Ok(StreamEnd::Eof) => {
                match store.last_message().filter(Message::is_assistant) {
                    Some(reply) => {
                        debug!(
                            message_id = %reply.id,
                            content_len = reply.content.len(),
                            tool_calls = reply.tool_call_count(),
                            "Stream complete"
                        );
                        self.inner.observer.on_complete(&reply).await;
                        self.inner.observer.on_message_received(&reply).await;
                    }
                    None => debug!("Stream complete after conversation was cleared"),
                }
                SendOutcome::Completed
            }
            Ok(StreamEnd::Cancelled) => {
                info!("Stream cancelled by caller");
                SendOutcome::Cancelled
            }
            Err(e) => SendOutcome::Failed(self.report_error(e).await),
        }
    }

    fn spawn<F, Fut>(&self, run: F) -> SendHandle
    where
        F: FnOnce(AgentSession, CancellationToken) -> Fut,
        Fut: Future<Output = SendOutcome> + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let task = tokio::spawn(run(self.clone(), cancel.clone()));
        SendHandle { cancel, task }
    }

    async fn stream_reply(&self, text: &str, cancel: &CancellationToken) -> Result<StreamEnd> {
        let request = AgentRequest::from_config(&self.inner.config, text);

        let mut body = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(StreamEnd::Cancelled),
            opened = self.inner.transport.open(&request) => opened?,
        };

        let mut decoder = FrameDecoder::new();
        loop {
            let read = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Ok(StreamEnd::Cancelled),
                read = body.next() => read,
            };
            let Some(read) = read else {
                break;
            };

            for chunk in decoder.push(&read?) {
                if cancel.is_cancelled() {
                    return Ok(StreamEnd::Cancelled);
                }
                self.apply_chunk(chunk).await?;
            }
        }

        decoder.finish();
        Ok(StreamEnd::Eof)
    }

    async fn apply_chunk(&self, chunk: Chunk) -> Result<()> {
        debug!(kind = ?chunk.kind, "Received chunk");
        self.inner.observer.on_chunk(&chunk).await;

        if let Interpretation::AgentError(message) = self.inner.store.apply_chunk(chunk) {
            let err = StreamError::Agent(message);
            if self.inner.config.stop_on_agent_error {
                return Err(err);
            }
            self.report_error(err).await;
        }
        Ok(())
    }

    async fn report_error(&self, err: StreamError) -> ConversationError {
        warn!(error = %err, "Agent stream error");
        let state = ConversationError::from(&err);
        self.inner.store.set_error(Some(state.clone()));
        self.inner.observer.on_error(&err).await;
        state
    }
}

impl std::fmt::Debug for AgentSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentSession")
            .field("endpoint", &self.inner.config.endpoint)
            .field("agent_id", &self.inner.config.agent_id)
            .field("messages", &self.inner.store.len())
            .field("streaming", &self.inner.store.is_streaming())
            .finish()
    }
}

//! Deterministic scripted transport for tests and offline demos.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::Mutex;
use tokio::time::{Duration, sleep};

use crate::chunk::Chunk;
use crate::error::{Result, StreamError};
use crate::transport::{AgentRequest, ByteStream, StreamTransport, status_error};

/// Scripted reply for one request
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Successful stream; each element arrives as one read
    Stream { reads: Vec<Bytes>, delay_ms: u64 },
    /// Non-success status with a raw body
    Status { status: u16, body: String },
    /// Success status without a body
    NullBody,
    /// Delivers `reads`, then fails the next read
    Broken { reads: Vec<Bytes>, error: String },
    /// Delivers `reads`, then never produces another read or EOF
    Hang { reads: Vec<Bytes> },
    /// The request itself never completes
    Unresponsive,
}

impl MockResponse {
    /// One read per chunk frame
    pub fn chunks(chunks: &[Chunk]) -> Self {
        Self::Stream {
            reads: chunks.iter().map(|c| Bytes::from(c.to_frame())).collect(),
            delay_ms: 0,
        }
    }

    /// Raw reads, passed through as-is
    pub fn reads<I, B>(reads: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: Into<Bytes>,
    {
        Self::Stream {
            reads: reads.into_iter().map(Into::into).collect(),
            delay_ms: 0,
        }
    }

    pub fn status(status: u16, body: impl Into<String>) -> Self {
        Self::Status {
            status,
            body: body.into(),
        }
    }

    pub fn with_delay(self, delay: u64) -> Self {
        match self {
            Self::Stream { reads, .. } => Self::Stream {
                reads,
                delay_ms: delay,
            },
            other => other,
        }
    }
}

/// A mock transport that replays scripted responses in order and records
/// every request it receives.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    script: Arc<Mutex<VecDeque<MockResponse>>>,
    requests: Arc<Mutex<Vec<AgentRequest>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_responses(responses: Vec<MockResponse>) -> Self {
        Self {
            script: Arc::new(Mutex::new(VecDeque::from(responses))),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub async fn push_response(&self, response: MockResponse) {
        self.script.lock().await.push_back(response);
    }

    pub async fn requests(&self) -> Vec<AgentRequest> {
        self.requests.lock().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.requests.lock().await.len()
    }
}

#[async_trait]
impl StreamTransport for MockTransport {
    async fn open(&self, request: &AgentRequest) -> Result<ByteStream> {
        self.requests.lock().await.push(request.clone());
        let response = self.script.lock().await.pop_front().ok_or_else(|| {
            StreamError::Transport("mock transport script exhausted".to_string())
        })?;

        match response {
            MockResponse::Stream { reads, delay_ms } => Ok(Box::pin(async_stream::stream! {
                for read in reads {
                    if delay_ms > 0 {
                        sleep(Duration::from_millis(delay_ms)).await;
                    }
                    yield Ok::<Bytes, StreamError>(read);
                }
            })),
            MockResponse::Status { status, body } => Err(status_error(status, &body, None)),
            MockResponse::NullBody => {
                Err(StreamError::Protocol("Response body is null".to_string()))
            }
            MockResponse::Broken { reads, error } => Ok(Box::pin(async_stream::stream! {
                for read in reads {
                    yield Ok::<Bytes, StreamError>(read);
                }
                yield Err(StreamError::Transport(error));
            })),
            MockResponse::Hang { reads } => Ok(Box::pin(async_stream::stream! {
                for read in reads {
                    yield Ok::<Bytes, StreamError>(read);
                }
                futures::future::pending::<()>().await;
            })),
            MockResponse::Unresponsive => futures::future::pending().await,
        }
    }
}

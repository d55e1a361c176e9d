//! HTTP adapter for the streaming chat endpoint.
//!
//! Sends the composed chat request and normalizes the `text/event-stream`
//! response body into a stream of typed [`StreamEvent`]s. Transport
//! failures before the stream opens surface as errors; failures mid-stream
//! degrade to a final [`StreamEvent::Error`] so the consumer's reducer can
//! fold them into the conversation like any backend-reported error.

use std::pin::Pin;

use async_stream::stream;
use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use serde::Serialize;

use crate::config::MuralConfig;
use crate::error::{MuralError, Result};

use super::event::{decode_payload, StreamEvent};
use super::message::{Message, Role};
use super::sse::DataLineDecoder;

/// One `{role, content}` pair of the request history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    pub role: Role,
    pub content: String,
}

/// Body of a chat request.
///
/// `message` carries the new user text; `messages` carries prior history
/// only, since the backend appends the new text itself.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub message: String,
    pub messages: Vec<HistoryEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

impl ChatRequest {
    /// Create a request for the given user text.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            messages: Vec::new(),
            session_id: None,
        }
    }

    /// Attach prior conversation history.
    pub fn with_history(mut self, history: &[Message]) -> Self {
        self.messages = history
            .iter()
            .map(|m| HistoryEntry {
                role: m.role,
                content: m.full_content(),
            })
            .collect();
        self
    }

    /// Attach a session identifier.
    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }
}

/// A pinned, boxed stream of chat events.
pub type EventStream = Pin<Box<dyn Stream<Item = StreamEvent> + Send>>;

/// Client for the streaming chat endpoint.
#[derive(Debug, Clone)]
pub struct ChatBackend {
    client: reqwest::Client,
    url: String,
}

impl ChatBackend {
    /// Create a backend client from configuration.
    pub fn new(config: &MuralConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: config.chat_url(),
        }
    }

    /// Create a backend client with an explicit endpoint URL (tests).
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }

    /// Send a chat request, returning the typed event stream.
    ///
    /// Fails only when the request cannot be sent or the endpoint answers
    /// with a non-success status; once the stream is open, all failures
    /// are delivered in-band as [`StreamEvent::Error`].
    pub async fn send(&self, request: &ChatRequest) -> Result<EventStream> {
        let response = self
            .client
            .post(&self.url)
            .json(request)
            .send()
            .await
            .map_err(|e| MuralError::RequestError(format!("chat request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = body.chars().take(200).collect::<String>();
            return Err(MuralError::RequestError(format!(
                "chat endpoint returned HTTP {}: {detail}",
                status.as_u16()
            )));
        }

        Ok(Box::pin(event_stream(response.bytes_stream())))
    }
}

/// Convert a response byte stream into typed events.
///
/// Framing per the endpoint contract: `data: <json>` lines, a partial
/// trailing line buffered across chunks, `[DONE]` and malformed lines
/// skipped. A read error ends the stream after one in-band error event.
pub fn event_stream<S, E>(byte_stream: S) -> impl Stream<Item = StreamEvent> + Send
where
    S: Stream<Item = std::result::Result<Bytes, E>> + Send + 'static,
    E: std::fmt::Display + Send,
{
    stream! {
        let mut decoder = DataLineDecoder::new();
        futures_util::pin_mut!(byte_stream);

        while let Some(chunk) = byte_stream.next().await {
            match chunk {
                Ok(bytes) => {
                    for payload in decoder.push(&bytes) {
                        if let Some(event) = decode_payload(&payload) {
                            yield event;
                        }
                    }
                }
                Err(e) => {
                    yield StreamEvent::Error {
                        error: format!("stream read failed: {e}"),
                    };
                    return;
                }
            }
        }

        if let Some(payload) = decoder.finish() {
            if let Some(event) = decode_payload(&payload) {
                yield event;
            }
        }
    }
}

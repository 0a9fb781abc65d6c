//! Transport adapter for streaming chat completions.
//!
//! Two modes open the same endpoint:
//! - [`TransportMode::Delegated`] hands framing to `reqwest-eventsource` and
//!   decodes each event into the typed [`crate::api::ChatCompletionChunk`].
//! - [`TransportMode::Direct`] posts the request itself (adding
//!   `mcp_servers`), splits the body into SSE lines and yields untyped JSON.
//!
//! Either way the caller gets a [`ChunkStream`]: lazy, single pass, and
//! owning the connection until it is exhausted or dropped. Once exhausted it
//! keeps yielding `None`.

use async_trait::async_trait;
use futures_util::stream::{self, BoxStream, Stream};
use futures_util::StreamExt;
use reqwest_eventsource::retry::Never;
use reqwest_eventsource::{Error as EventSourceError, Event, EventSource};
use serde_json::Value;
use std::collections::VecDeque;
use std::fmt;
use std::pin::Pin;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::api::{ChatRequest, ToolServer};
use crate::core::chunk::{decode_library_chunk, RawChunk};
use crate::core::constants::DONE_SENTINEL;
use crate::core::message::ChatMessage;
use crate::core::sse::{classify_line, SseLine, SseLineBuffer};
use crate::utils::auth::add_auth_headers;
use crate::utils::url::construct_api_url;

pub type ChunkStream = BoxStream<'static, Result<RawChunk, TransportError>>;

/// Failures opening or reading the upstream stream.
#[derive(Debug)]
pub enum TransportError {
    /// Network failure, including connect and read timeouts.
    Request(reqwest::Error),
    /// The upstream answered with a non-success status before streaming.
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    /// The event-source client failed for a reason other than HTTP.
    EventSource(String),
    /// An accepted completion never became ready.
    PollTimeout { request_id: String, attempts: u32 },
}

impl TransportError {
    pub fn is_timeout(&self) -> bool {
        match self {
            TransportError::Request(err) => err.is_timeout(),
            TransportError::PollTimeout { .. } => true,
            _ => false,
        }
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Request(err) if err.is_timeout() => {
                write!(f, "Request timed out: {err}")
            }
            TransportError::Request(err) => write!(f, "Request failed: {err}"),
            TransportError::Status { status, body } => {
                write!(f, "HTTP {status}\n{}", format_api_error(body))
            }
            TransportError::EventSource(message) => write!(f, "Stream failed: {message}"),
            TransportError::PollTimeout {
                request_id,
                attempts,
            } => write!(
                f,
                "Completion {request_id} was not ready after {attempts} status checks"
            ),
        }
    }
}

impl std::error::Error for TransportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TransportError::Request(err) => Some(err),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        TransportError::Request(err)
    }
}

fn extract_error_summary(value: &Value) -> Option<String> {
    let summary = value
        .pointer("/error/message")
        .and_then(|v| v.as_str())
        .map(str::to_owned)
        .or_else(|| {
            value
                .get("error")
                .and_then(|v| v.as_str().map(str::to_owned))
        })
        .or_else(|| {
            value
                .get("detail")
                .and_then(|v| v.as_str().map(str::to_owned))
        })
        .or_else(|| {
            value
                .get("message")
                .and_then(|v| v.as_str().map(str::to_owned))
        });

    summary.map(|text| text.split_whitespace().collect::<Vec<_>>().join(" "))
}

/// Render an upstream error body for display: JSON is pretty-printed with a
/// one-line summary when one can be found, HTML/XML and plain text are
/// fenced verbatim.
pub fn format_api_error(error_text: &str) -> String {
    let trimmed = error_text.trim();

    if trimmed.is_empty() {
        return "API Error:\n```\n<empty>\n```".to_string();
    }

    if let Ok(json_value) = serde_json::from_str::<Value>(trimmed) {
        if let Ok(pretty_json) = serde_json::to_string_pretty(&json_value) {
            return match extract_error_summary(&json_value) {
                Some(summary) if !summary.is_empty() => {
                    format!("API Error: {}\n```json\n{}\n```", summary, pretty_json)
                }
                _ => format!("API Error:\n```json\n{}\n```", pretty_json),
            };
        }
    }

    if trimmed.starts_with('<') && trimmed.ends_with('>') {
        format!("API Error:\n```xml\n{}\n```", trimmed)
    } else {
        format!("API Error:\n```\n{}\n```", trimmed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportMode {
    Delegated,
    /// Used when tool-augmentation servers are attached to the request.
    Direct(Vec<ToolServer>),
}

impl TransportMode {
    pub fn name(&self) -> &'static str {
        match self {
            TransportMode::Delegated => "delegated",
            TransportMode::Direct(_) => "direct",
        }
    }
}

#[derive(Debug, Clone)]
pub struct StreamRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub mode: TransportMode,
}

impl StreamRequest {
    pub fn into_chat_request(self, stream: bool) -> ChatRequest {
        let mcp_servers = match self.mode {
            TransportMode::Delegated => None,
            TransportMode::Direct(servers) => Some(servers),
        };
        ChatRequest {
            model: self.model,
            messages: self.messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            stream,
            mcp_servers,
        }
    }
}

/// Anything that can open a chunk stream for a request.
#[async_trait]
pub trait ChunkSource: Send + Sync {
    async fn open_stream(&self, request: StreamRequest) -> Result<ChunkStream, TransportError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub connect: Duration,
    pub read: Duration,
}

#[derive(Clone)]
pub struct ChatClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl ChatClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeouts: Timeouts,
    ) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .connect_timeout(timeouts.connect)
            .read_timeout(timeouts.read)
            .build()?;
        Ok(Self::with_http_client(http, base_url, api_key))
    }

    pub fn with_http_client(
        http: reqwest::Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub(crate) fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        add_auth_headers(request, &self.api_key)
    }

    /// Open a streaming completion. Resolves only once the upstream has
    /// accepted the request, so HTTP status failures surface here rather
    /// than from the stream.
    pub async fn generate(&self, request: StreamRequest) -> Result<ChunkStream, TransportError> {
        let chat_url = construct_api_url(&self.base_url, "chat/completions");
        let mode = request.mode.name();
        info!(
            model = %request.model,
            mode,
            message_count = request.messages.len(),
            "Opening chat stream"
        );

        match request.mode {
            TransportMode::Delegated => {
                self.open_delegated(&chat_url, request.into_chat_request(true))
                    .await
            }
            TransportMode::Direct(_) => {
                self.open_direct(&chat_url, request.into_chat_request(true))
                    .await
            }
        }
    }

    async fn open_delegated(
        &self,
        chat_url: &str,
        body: ChatRequest,
    ) -> Result<ChunkStream, TransportError> {
        let builder = self.authorized(self.http.post(chat_url)).json(&body);
        let mut source = EventSource::new(builder)
            .map_err(|err| TransportError::EventSource(err.to_string()))?;
        source.set_retry_policy(Box::new(Never));

        let mut stashed = None;
        match source.next().await {
            Some(Ok(Event::Open)) => debug!("Event stream opened"),
            Some(Ok(Event::Message(message))) => stashed = Some(message.data),
            Some(Err(err)) => {
                source.close();
                return Err(transport_error_from_event_source(err).await);
            }
            None => {
                return Err(TransportError::EventSource(
                    "stream closed before it opened".to_string(),
                ))
            }
        }

        Ok(event_source_chunk_stream(source, stashed))
    }

    async fn open_direct(
        &self,
        chat_url: &str,
        body: ChatRequest,
    ) -> Result<ChunkStream, TransportError> {
        let response = self
            .authorized(self.http.post(chat_url))
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<no body>".to_string());
            warn!(%status, "Chat stream rejected");
            return Err(TransportError::Status { status, body });
        }

        debug!(%status, "Direct stream opened");
        Ok(sse_chunk_stream(response.bytes_stream()))
    }
}

#[async_trait]
impl ChunkSource for ChatClient {
    async fn open_stream(&self, request: StreamRequest) -> Result<ChunkStream, TransportError> {
        self.generate(request).await
    }
}

async fn transport_error_from_event_source(err: EventSourceError) -> TransportError {
    match err {
        EventSourceError::Transport(err) => TransportError::Request(err),
        EventSourceError::InvalidStatusCode(status, response) => {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<no body>".to_string());
            warn!(%status, "Chat stream rejected");
            TransportError::Status { status, body }
        }
        other => TransportError::EventSource(other.to_string()),
    }
}

struct EventSourceState {
    source: EventSource,
    stashed: Option<String>,
}

fn event_source_chunk_stream(source: EventSource, stashed: Option<String>) -> ChunkStream {
    let state = EventSourceState { source, stashed };

    stream::unfold(Some(state), |state| async move {
        let mut state = state?;
        loop {
            let data = match state.stashed.take() {
                Some(data) => data,
                None => match state.source.next().await {
                    Some(Ok(Event::Open)) => continue,
                    Some(Ok(Event::Message(message))) => message.data,
                    Some(Err(EventSourceError::StreamEnded)) | None => {
                        state.source.close();
                        return None;
                    }
                    Some(Err(err)) => {
                        state.source.close();
                        let err = transport_error_from_event_source(err).await;
                        return Some((Err(err), None));
                    }
                },
            };

            if data.trim() == DONE_SENTINEL {
                state.source.close();
                return None;
            }

            match decode_library_chunk(&data) {
                Ok(chunk) => return Some((Ok(RawChunk::Library(chunk)), Some(state))),
                Err(err) => warn!(error = %err, "Dropping undecodable stream event"),
            }
        }
    })
    .fuse()
    .boxed()
}

struct SseState<S> {
    body: Pin<Box<S>>,
    lines: SseLineBuffer,
    pending: VecDeque<String>,
    finished: bool,
}

/// Frame a response body as SSE and yield each JSON payload as
/// [`RawChunk::Raw`]. Payloads that are not JSON are skipped; `[DONE]` ends
/// the stream; a body error is yielded once and ends the stream.
pub fn sse_chunk_stream<S, B, E>(body: S) -> ChunkStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send,
    E: Into<TransportError> + Send,
{
    let state = SseState {
        body: Box::pin(body),
        lines: SseLineBuffer::default(),
        pending: VecDeque::new(),
        finished: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            while let Some(line) = state.pending.pop_front() {
                match classify_line(&line) {
                    SseLine::Done => return None,
                    SseLine::Ignored => {}
                    SseLine::Data(payload) => match serde_json::from_str::<Value>(payload) {
                        Ok(value) => return Some((Ok(RawChunk::Raw(value)), state)),
                        Err(err) => debug!(error = %err, "Skipping malformed SSE payload"),
                    },
                }
            }

            if state.finished {
                return None;
            }

            match state.body.next().await {
                Some(Ok(bytes)) => {
                    let lines = state.lines.push(bytes.as_ref());
                    state.pending.extend(lines);
                }
                Some(Err(err)) => {
                    state.finished = true;
                    state.pending.clear();
                    return Some((Err(err.into()), state));
                }
                None => {
                    state.finished = true;
                    if state.lines.has_remaining() {
                        debug!("Body ended mid-line; flushing the partial SSE line");
                    }
                    let lines = state.lines.finish();
                    state.pending.extend(lines);
                }
            }
        }
    })
    .fuse()
    .boxed()
}

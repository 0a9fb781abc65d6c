//! Streaming response aggregation.
//!
//! [`aggregate`] drains a [`ChunkStream`] into one answer: text deltas are
//! appended and rendered as they arrive, usage and citations are kept
//! according to a [`MetadataMerge`] policy, and the cancellation token is
//! checked at every chunk boundary. Once the stream ends (or is cancelled)
//! the renderer is called one last time with [`RenderState::Final`] and the
//! reference links are resolved.

use futures_util::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::api::{Citation, Usage};
use crate::core::chat_stream::TransportError;
use crate::core::chunk::{normalize, RawChunk};
use crate::core::constants::STREAMING_CURSOR;
use crate::core::references::extract_references;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderState {
    /// More text may follow.
    Streaming,
    /// The answer is complete (or was cancelled); draw it clean.
    Final,
}

impl RenderState {
    /// Append the progress cursor while streaming.
    pub fn decorate<'a>(&self, text: &'a str) -> Cow<'a, str> {
        match self {
            RenderState::Streaming => Cow::Owned(format!("{text}{STREAMING_CURSOR}")),
            RenderState::Final => Cow::Borrowed(text),
        }
    }
}

/// Receives the accumulated answer as it grows.
pub trait ResponseRenderer {
    fn render(&mut self, text: &str, state: RenderState);

    /// The stream failed part way; no `Final` render will follow.
    fn abort(&mut self) {}
}

impl<F> ResponseRenderer for F
where
    F: FnMut(&str, RenderState),
{
    fn render(&mut self, text: &str, state: RenderState) {
        self(text, state)
    }
}

/// How per-chunk metadata is folded into the running result.
///
/// Upstream APIs resend the cumulative citation list, so the default replaces
/// what was seen before.
pub trait MetadataMerge {
    fn merge_citations(&self, current: &mut Vec<Citation>, incoming: Vec<Citation>) {
        *current = incoming;
    }

    fn merge_usage(&self, current: &mut Option<Usage>, incoming: Usage) {
        *current = Some(incoming);
    }
}

/// Last non-empty citation list and last usage record win.
#[derive(Debug, Clone, Copy, Default)]
pub struct LastWriteWins;

impl MetadataMerge for LastWriteWins {}

/// Keep every citation seen, appending only URLs not already present.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccumulateCitations;

impl MetadataMerge for AccumulateCitations {
    fn merge_citations(&self, current: &mut Vec<Citation>, incoming: Vec<Citation>) {
        for citation in incoming {
            if !current.iter().any(|existing| existing.url == citation.url) {
                current.push(citation);
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseMetadata {
    pub usage: Option<Usage>,
    pub citations: Vec<Citation>,
    pub references: Vec<BTreeSet<String>>,
}

impl ResponseMetadata {
    /// Finalize metadata for an answer. References come from the citations
    /// when there are any, otherwise from links found in `text`.
    pub fn finalize(usage: Option<Usage>, citations: Vec<Citation>, text: &str) -> Self {
        let references = if citations.is_empty() {
            extract_references(text)
        } else {
            vec![citations
                .iter()
                .filter(|citation| !citation.url.is_empty())
                .map(|citation| citation.url.clone())
                .collect()]
        };

        Self {
            usage,
            citations,
            references,
        }
    }

    /// Every reference URL in display order.
    pub fn reference_urls(&self) -> Vec<&str> {
        self.references
            .iter()
            .flat_map(|set| set.iter().map(String::as_str))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatedResponse {
    pub text: String,
    pub metadata: ResponseMetadata,
    /// The stream was stopped by the cancellation token.
    pub cancelled: bool,
}

impl AggregatedResponse {
    pub fn into_parts(self) -> (String, ResponseMetadata) {
        (self.text, self.metadata)
    }
}

#[derive(Debug, Clone, Default)]
pub struct StreamAggregator<M = LastWriteWins> {
    merge: M,
}

impl StreamAggregator<LastWriteWins> {
    pub fn new() -> Self {
        Self {
            merge: LastWriteWins,
        }
    }
}

impl<M: MetadataMerge> StreamAggregator<M> {
    pub fn with_merge(merge: M) -> Self {
        Self { merge }
    }

    /// Consume `stream` until it ends, fails, or `cancel` fires.
    ///
    /// Malformed chunks are skipped. A transport error aborts the renderer and
    /// is returned as is. The stream is single pass; it is dropped
    /// (closing its connection) before this returns.
    pub async fn aggregate<S, R>(
        &self,
        stream: S,
        renderer: &mut R,
        cancel: &CancellationToken,
    ) -> Result<AggregatedResponse, TransportError>
    where
        S: Stream<Item = Result<RawChunk, TransportError>>,
        R: ResponseRenderer + ?Sized,
    {
        let mut stream = std::pin::pin!(stream);
        let mut full_text = String::new();
        let mut citations: Vec<Citation> = Vec::new();
        let mut usage: Option<Usage> = None;
        let mut cancelled = false;
        let mut chunk_count = 0usize;

        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                next = stream.next() => Some(next),
            };

            let Some(next) = next else {
                cancelled = true;
                break;
            };
            let Some(item) = next else {
                break;
            };
            if cancel.is_cancelled() {
                cancelled = true;
                break;
            }

            let item = match item {
                Ok(item) => item,
                Err(err) => {
                    renderer.abort();
                    return Err(err);
                }
            };

            chunk_count += 1;
            let chunk = match normalize(item) {
                Ok(chunk) => chunk,
                Err(err) => {
                    debug!(error = %err, chunk = chunk_count, "Skipping malformed chunk");
                    continue;
                }
            };

            if let Some(delta) = chunk.delta_text {
                full_text.push_str(&delta);
                renderer.render(&full_text, RenderState::Streaming);
            }
            if let Some(incoming) = chunk.citations {
                self.merge.merge_citations(&mut citations, incoming);
            }
            if let Some(incoming) = chunk.usage {
                self.merge.merge_usage(&mut usage, incoming);
            }
        }
        drop(stream);

        renderer.render(&full_text, RenderState::Final);

        info!(
            chunks = chunk_count,
            text_len = full_text.len(),
            citations = citations.len(),
            cancelled,
            "Stream aggregated"
        );

        let metadata = ResponseMetadata::finalize(usage, citations, &full_text);
        Ok(AggregatedResponse {
            text: full_text,
            metadata,
            cancelled,
        })
    }
}

/// Aggregate with the default last-write-wins metadata policy.
pub async fn aggregate<S, R>(
    stream: S,
    renderer: &mut R,
    cancel: &CancellationToken,
) -> Result<AggregatedResponse, TransportError>
where
    S: Stream<Item = Result<RawChunk, TransportError>>,
    R: ResponseRenderer + ?Sized,
{
    StreamAggregator::new()
        .aggregate(stream, renderer, cancel)
        .await
}

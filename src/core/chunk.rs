//! Normalization of streaming chunks.
//!
//! The transport decides the chunk shape once, when it reads the wire, and
//! tags it as [`RawChunk::Library`] (typed, from the event-source client) or
//! [`RawChunk::Raw`] (an untyped JSON map from direct SSE parsing). Both are
//! reduced to the same [`StreamChunk`] here.

use serde_json::Value;
use std::fmt;

use crate::api::{citations_from_value, usage_from_value, ChatCompletionChunk, Citation, Usage};

#[derive(Debug, Clone)]
pub enum RawChunk {
    Library(ChatCompletionChunk),
    Raw(Value),
}

/// The parts of a chunk the aggregator cares about.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamChunk {
    pub delta_text: Option<String>,
    pub usage: Option<Usage>,
    pub citations: Option<Vec<Citation>>,
}

impl StreamChunk {
    pub fn text(delta: impl Into<String>) -> Self {
        Self {
            delta_text: Some(delta.into()),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.delta_text.is_none() && self.usage.is_none() && self.citations.is_none()
    }
}

/// A single chunk that could not be understood. Never fatal to the stream.
#[derive(Debug)]
pub enum ChunkParseError {
    /// The payload was not valid JSON for the expected shape.
    Decode(serde_json::Error),
    /// The payload was JSON but not an object.
    NotAnObject(&'static str),
}

impl fmt::Display for ChunkParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChunkParseError::Decode(err) => write!(f, "Failed to decode chunk: {err}"),
            ChunkParseError::NotAnObject(kind) => {
                write!(f, "Expected a JSON object chunk, got {kind}")
            }
        }
    }
}

impl std::error::Error for ChunkParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ChunkParseError::Decode(err) => Some(err),
            ChunkParseError::NotAnObject(_) => None,
        }
    }
}

/// Decode an event payload into the typed chunk shape.
pub fn decode_library_chunk(payload: &str) -> Result<ChatCompletionChunk, ChunkParseError> {
    serde_json::from_str(payload).map_err(ChunkParseError::Decode)
}

pub fn normalize(raw: RawChunk) -> Result<StreamChunk, ChunkParseError> {
    match raw {
        RawChunk::Library(chunk) => Ok(normalize_library(chunk)),
        RawChunk::Raw(value) => normalize_raw(&value),
    }
}

fn normalize_library(chunk: ChatCompletionChunk) -> StreamChunk {
    let delta_text = chunk
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.delta.content)
        .filter(|content| !content.is_empty());

    StreamChunk {
        delta_text,
        usage: chunk.usage,
        citations: chunk.search_results.filter(|results| !results.is_empty()),
    }
}

fn normalize_raw(value: &Value) -> Result<StreamChunk, ChunkParseError> {
    if !value.is_object() {
        return Err(ChunkParseError::NotAnObject(json_kind(value)));
    }

    let delta_text = value
        .pointer("/choices/0/delta/content")
        .and_then(Value::as_str)
        .filter(|content| !content.is_empty())
        .map(str::to_owned);

    let usage = value.get("usage").and_then(usage_from_value);

    let citations = value
        .get("search_results")
        .and_then(citations_from_value)
        .filter(|results| !results.is_empty());

    Ok(StreamChunk {
        delta_text,
        usage,
        citations,
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::core::message::ChatMessage;

pub mod completions;

/// A tool-augmentation server passed through to the upstream API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolServer {
    pub url: String,
}

impl ToolServer {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

#[derive(Debug, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mcp_servers: Option<Vec<ToolServer>>,
}

/// Treat an explicit `null` the same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Usage block from a chunk, or `None` when it is absent or malformed.
pub(crate) fn usage_from_value(value: &Value) -> Option<Usage> {
    value
        .as_object()
        .and_then(|_| serde_json::from_value(value.clone()).ok())
}

/// Citations from a chunk's `search_results`, skipping malformed entries.
pub(crate) fn citations_from_value(value: &Value) -> Option<Vec<Citation>> {
    value.as_array().map(|results| {
        results
            .iter()
            .filter_map(|entry| serde_json::from_value(entry.clone()).ok())
            .collect()
    })
}

fn lenient_usage<'de, D>(deserializer: D) -> Result<Option<Usage>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?
        .as_ref()
        .and_then(usage_from_value))
}

fn lenient_citations<'de, D>(deserializer: D) -> Result<Option<Vec<Citation>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?
        .as_ref()
        .and_then(citations_from_value))
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    #[serde(default, deserialize_with = "null_as_default")]
    pub prompt_tokens: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub completion_tokens: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_tokens: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub citation_tokens: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_search_queries: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning_tokens: Option<u64>,
}

impl Usage {
    pub fn new(prompt_tokens: u64, completion_tokens: u64, total_tokens: u64) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens,
            ..Default::default()
        }
    }
}

/// A structured source reference returned alongside generated text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl Citation {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            text: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChunkDelta {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChunkChoice {
    #[serde(default, deserialize_with = "null_as_default")]
    pub index: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub delta: ChunkDelta,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Typed streaming chunk as decoded by the event-source client.
///
/// Metadata is decoded leniently: a malformed `usage` or citation entry is
/// dropped rather than failing the whole chunk and its text.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatCompletionChunk {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub choices: Vec<ChunkChoice>,
    #[serde(default, deserialize_with = "lenient_usage")]
    pub usage: Option<Usage>,
    #[serde(default, deserialize_with = "lenient_citations")]
    pub search_results: Option<Vec<Citation>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_omits_mcp_servers_when_absent() {
        let request = ChatRequest {
            model: "sonar".to_string(),
            messages: vec![ChatMessage::user("hi")],
            temperature: 0.5,
            max_tokens: 100,
            stream: true,
            mcp_servers: None,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert!(value.get("mcp_servers").is_none());
        assert_eq!(value["stream"], serde_json::json!(true));
        assert_eq!(value["max_tokens"], serde_json::json!(100));
    }

    #[test]
    fn request_lists_tool_server_urls() {
        let request = ChatRequest {
            model: "sonar".to_string(),
            messages: Vec::new(),
            temperature: 0.0,
            max_tokens: 1,
            stream: true,
            mcp_servers: Some(vec![ToolServer::new("http://tools.local")]),
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value["mcp_servers"],
            serde_json::json!([{"url": "http://tools.local"}])
        );
    }

    #[test]
    fn chunk_tolerates_missing_fields() {
        let chunk: ChatCompletionChunk = serde_json::from_str("{}").unwrap();
        assert!(chunk.choices.is_empty());
        assert!(chunk.usage.is_none());
        assert!(chunk.search_results.is_none());

        let chunk: ChatCompletionChunk = serde_json::from_str(
            r#"{"choices":[{"delta":{"content":"Hi"}}],"usage":{"prompt_tokens":5,"completion_tokens":2,"total_tokens":7,"citation_tokens":11}}"#,
        )
        .unwrap();
        assert_eq!(chunk.choices[0].delta.content.as_deref(), Some("Hi"));
        let usage = chunk.usage.unwrap();
        assert_eq!(usage.total_tokens, 7);
        assert_eq!(usage.citation_tokens, Some(11));
    }

    #[test]
    fn chunk_treats_null_fields_as_missing() {
        let chunk: ChatCompletionChunk = serde_json::from_str(
            r#"{"choices":[{"index":null,"delta":null}],"usage":{"prompt_tokens":null,"completion_tokens":3,"total_tokens":null},"search_results":[{"title":null,"url":"https://a.example"}]}"#,
        )
        .unwrap();
        assert!(chunk.choices[0].delta.content.is_none());
        assert_eq!(chunk.usage, Some(Usage::new(0, 3, 0)));
        assert_eq!(
            chunk.search_results,
            Some(vec![Citation::new("", "https://a.example")])
        );
    }

    #[test]
    fn malformed_chunk_metadata_keeps_the_text() {
        let chunk: ChatCompletionChunk = serde_json::from_str(
            r#"{"choices":[{"delta":{"content":"kept"}}],"usage":{"total_tokens":"lots"},"search_results":[42,{"url":"https://b.example"}]}"#,
        )
        .unwrap();
        assert_eq!(chunk.choices[0].delta.content.as_deref(), Some("kept"));
        assert!(chunk.usage.is_none());
        assert_eq!(
            chunk.search_results,
            Some(vec![Citation::new("", "https://b.example")])
        );

        let chunk: ChatCompletionChunk =
            serde_json::from_str(r#"{"usage":[1,2,3],"search_results":"none"}"#).unwrap();
        assert!(chunk.usage.is_none());
        assert!(chunk.search_results.is_none());
    }
}

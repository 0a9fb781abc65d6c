//! Non-streaming chat completions.
//!
//! The upstream may answer a completion request with `202 Accepted` and an
//! id instead of the finished body; the result is then polled from
//! `chat/completions/{id}`.

use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::core::chat_stream::{ChatClient, StreamRequest, TransportError};
use crate::core::constants::{COMPLETION_POLL_INTERVAL, DEFAULT_COMPLETION_POLL_LIMIT};
use crate::utils::url::construct_api_url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub interval: Duration,
    /// Status checks made before giving up.
    pub limit: u32,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: COMPLETION_POLL_INTERVAL,
            limit: DEFAULT_COMPLETION_POLL_LIMIT,
        }
    }
}

/// Text of the first choice in a completion body.
pub fn completion_text(body: &Value) -> Option<&str> {
    body.pointer("/choices/0/message/content")
        .and_then(Value::as_str)
}

fn accepted_request_id(body: &Value) -> Option<String> {
    ["id", "request_id"]
        .iter()
        .find_map(|key| body.get(*key).and_then(Value::as_str))
        .map(str::to_owned)
}

async fn read_json(response: reqwest::Response) -> Result<Value, TransportError> {
    let status = response.status();
    let text = response.text().await?;
    serde_json::from_str(&text).map_err(|_| TransportError::Status { status, body: text })
}

impl ChatClient {
    pub async fn complete(&self, request: StreamRequest) -> Result<Value, TransportError> {
        self.complete_with(request, PollSettings::default()).await
    }

    /// Request a completion with `stream: false` and return the JSON body.
    pub async fn complete_with(
        &self,
        request: StreamRequest,
        poll: PollSettings,
    ) -> Result<Value, TransportError> {
        let chat_url = construct_api_url(self.base_url(), "chat/completions");
        info!(model = %request.model, mode = request.mode.name(), "Requesting completion");

        let response = self
            .authorized(self.http().post(&chat_url))
            .json(&request.into_chat_request(false))
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::ACCEPTED {
            let body = read_json(response).await?;
            let request_id = accepted_request_id(&body).ok_or_else(|| TransportError::Status {
                status,
                body: body.to_string(),
            })?;
            return self.poll_completion(&request_id, poll).await;
        }
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<no body>".to_string());
            warn!(%status, "Completion rejected");
            return Err(TransportError::Status { status, body });
        }

        read_json(response).await
    }

    async fn poll_completion(
        &self,
        request_id: &str,
        poll: PollSettings,
    ) -> Result<Value, TransportError> {
        let poll_url =
            construct_api_url(self.base_url(), &format!("chat/completions/{request_id}"));
        debug!(request_id, "Completion accepted, polling for result");

        for attempt in 1..=poll.limit {
            tokio::time::sleep(poll.interval).await;

            let response = self.authorized(self.http().get(&poll_url)).send().await?;
            let status = response.status();
            if status == StatusCode::ACCEPTED {
                debug!(request_id, attempt, "Completion still pending");
                continue;
            }
            if !status.is_success() {
                let body = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "<no body>".to_string());
                warn!(%status, request_id, "Completion poll failed");
                return Err(TransportError::Status { status, body });
            }
            return read_json(response).await;
        }

        Err(TransportError::PollTimeout {
            request_id: request_id.to_string(),
            attempts: poll.limit,
        })
    }
}

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use tracing::debug;

use crate::core::constants::{PROBE_TIMEOUT, TOOL_CALL_TIMEOUT};
use crate::utils::url::construct_api_url;

/// Result of talking to a tool server. Distinguishes "nobody answered" from
/// "answered with a problem".
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeOutcome<T> {
    Available(T),
    /// Connection refused, DNS failure, or timeout.
    Unreachable(String),
    /// The server answered with an error status or an unreadable body.
    Failed {
        status: StatusCode,
        message: String,
    },
}

impl<T> ProbeOutcome<T> {
    pub fn is_available(&self) -> bool {
        matches!(self, ProbeOutcome::Available(_))
    }

    pub fn available(self) -> Option<T> {
        match self {
            ProbeOutcome::Available(value) => Some(value),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ProbeOutcome<U> {
        match self {
            ProbeOutcome::Available(value) => ProbeOutcome::Available(f(value)),
            ProbeOutcome::Unreachable(reason) => ProbeOutcome::Unreachable(reason),
            ProbeOutcome::Failed { status, message } => ProbeOutcome::Failed { status, message },
        }
    }
}

impl<T> fmt::Display for ProbeOutcome<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeOutcome::Available(_) => write!(f, "available"),
            ProbeOutcome::Unreachable(reason) => write!(f, "unreachable ({reason})"),
            ProbeOutcome::Failed { status, message } if message.is_empty() => {
                write!(f, "failed (HTTP {status})")
            }
            ProbeOutcome::Failed { status, message } => {
                write!(f, "failed (HTTP {status}): {message}")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ToolListing {
    Bare(Vec<ToolDescriptor>),
    Wrapped { tools: Vec<ToolDescriptor> },
}

#[derive(Clone)]
pub struct ToolServerProbe {
    http: reqwest::Client,
    probe_timeout: Duration,
    call_timeout: Duration,
}

impl Default for ToolServerProbe {
    fn default() -> Self {
        Self::with_http_client(reqwest::Client::new())
    }
}

impl ToolServerProbe {
    pub fn with_http_client(http: reqwest::Client) -> Self {
        Self {
            http,
            probe_timeout: PROBE_TIMEOUT,
            call_timeout: TOOL_CALL_TIMEOUT,
        }
    }

    pub fn with_timeouts(mut self, probe: Duration, call: Duration) -> Self {
        self.probe_timeout = probe;
        self.call_timeout = call;
        self
    }

    /// `GET {url}/health`; any 2xx counts as healthy.
    pub async fn health(&self, url: &str) -> ProbeOutcome<()> {
        let request = self
            .http
            .get(construct_api_url(url, "health"))
            .timeout(self.probe_timeout);
        match request.send().await {
            Ok(response) if response.status().is_success() => ProbeOutcome::Available(()),
            Ok(response) => failed(response).await,
            Err(err) => unreachable(url, err),
        }
    }

    /// `GET {url}/info`
    pub async fn info(&self, url: &str) -> ProbeOutcome<Value> {
        self.get_json(url, "info").await
    }

    /// `GET {url}/tools`, accepting a bare array or `{"tools": [...]}`.
    pub async fn tools(&self, url: &str) -> ProbeOutcome<Vec<ToolDescriptor>> {
        self.get_json::<ToolListing>(url, "tools")
            .await
            .map(|listing| match listing {
                ToolListing::Bare(tools) | ToolListing::Wrapped { tools } => tools,
            })
    }

    /// `POST {url}/tools/{name}` with `params` as the JSON body.
    pub async fn call_tool(&self, url: &str, name: &str, params: &Value) -> ProbeOutcome<Value> {
        let request = self
            .http
            .post(construct_api_url(url, &format!("tools/{name}")))
            .timeout(self.call_timeout)
            .json(params);
        match request.send().await {
            Ok(response) => decode(response).await,
            Err(err) => unreachable(url, err),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, endpoint: &str) -> ProbeOutcome<T> {
        let request = self
            .http
            .get(construct_api_url(url, endpoint))
            .timeout(self.probe_timeout);
        match request.send().await {
            Ok(response) => decode(response).await,
            Err(err) => unreachable(url, err),
        }
    }
}

fn unreachable<T>(url: &str, err: reqwest::Error) -> ProbeOutcome<T> {
    debug!(url, error = %err, "Tool server unreachable");
    let reason = if err.is_timeout() {
        "timed out".to_string()
    } else if err.is_connect() {
        "connection failed".to_string()
    } else {
        err.to_string()
    };
    ProbeOutcome::Unreachable(reason)
}

async fn failed<T>(response: reqwest::Response) -> ProbeOutcome<T> {
    let status = response.status();
    let message = response.text().await.unwrap_or_default().trim().to_string();
    debug!(%status, "Tool server returned an error");
    ProbeOutcome::Failed { status, message }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> ProbeOutcome<T> {
    if !response.status().is_success() {
        return failed(response).await;
    }
    let status = response.status();
    let body = match response.bytes().await {
        Ok(body) => body,
        Err(err) => {
            return ProbeOutcome::Failed {
                status,
                message: format!("failed to read body: {err}"),
            }
        }
    };
    match serde_json::from_slice(&body) {
        Ok(value) => ProbeOutcome::Available(value),
        Err(err) => ProbeOutcome::Failed {
            status,
            message: format!("invalid JSON body: {err}"),
        },
    }
}

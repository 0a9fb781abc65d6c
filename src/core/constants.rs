//! Shared constants used across the application

use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.perplexity.ai";

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "PERPLEXITY_API_KEY";
/// Environment variable overriding the configured base URL.
pub const BASE_URL_ENV: &str = "SONARCHAT_BASE_URL";
/// Environment variable with the tracing filter directive.
pub const LOG_ENV: &str = "SONARCHAT_LOG";

/// Models offered by the upstream API, most capable first.
pub const KNOWN_MODELS: &[&str] = &[
    "sonar-deep-research",
    "sonar-reasoning-pro",
    "sonar-reasoning",
    "sonar-pro",
    "sonar",
];
pub const DEFAULT_MODEL: &str = "sonar";
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 1000;
pub const DEFAULT_SYSTEM_MESSAGE: &str = "You are a helpful AI assistant.";

/// Payload that terminates a server-sent event stream.
pub const DONE_SENTINEL: &str = "[DONE]";

/// Drawn after the partial answer while a response is still streaming.
pub const STREAMING_CURSOR: char = '▌';

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(60);

pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);
pub const TOOL_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Delay between status checks for an accepted (HTTP 202) completion.
pub const COMPLETION_POLL_INTERVAL: Duration = Duration::from_secs(1);
pub const DEFAULT_COMPLETION_POLL_LIMIT: u32 = 300;

/// Attachment text beyond this many characters is cut before sending.
pub const ATTACHMENT_TEXT_LIMIT: usize = 10_000;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::api::ToolServer;
use crate::core::chat_stream::Timeouts;
use crate::core::constants::{
    API_KEY_ENV, BASE_URL_ENV, DEFAULT_BASE_URL, DEFAULT_CONNECT_TIMEOUT, DEFAULT_MAX_TOKENS,
    DEFAULT_MODEL, DEFAULT_READ_TIMEOUT, DEFAULT_SYSTEM_MESSAGE, DEFAULT_TEMPERATURE,
};
use crate::core::session::GenerationSettings;
use crate::utils::url::normalize_base_url;

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct Config {
    /// API root, e.g. `https://api.perplexity.ai`
    pub base_url: Option<String>,
    /// Prefer the environment for secrets; this is a fallback.
    pub api_key: Option<String>,
    pub default_model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub system_message: Option<String>,
    /// Tool-augmentation servers passed through in direct mode.
    #[serde(default)]
    pub tool_servers: Vec<String>,
    /// Start sessions with tool servers enabled.
    pub use_tool_servers: Option<bool>,
    pub connect_timeout_secs: Option<u64>,
    pub read_timeout_secs: Option<u64>,
}

pub fn path_display<P: AsRef<Path>>(path: P) -> String {
    let path = path.as_ref();

    #[cfg(unix)]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let home_path = PathBuf::from(home);
            if let Ok(relative) = path.strip_prefix(&home_path) {
                return format!("~/{}", relative.display());
            }
        }
    }

    path.display().to_string()
}

impl Config {
    /// Fold environment overrides into the file values. `lookup` is usually
    /// `std::env::var`, swapped out in tests.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(API_KEY_ENV).filter(|value| !value.trim().is_empty()) {
            self.api_key = Some(key.trim().to_string());
        }
        if let Some(url) = lookup(BASE_URL_ENV).filter(|value| !value.trim().is_empty()) {
            self.base_url = Some(url);
        }
    }

    pub fn base_url(&self) -> String {
        normalize_base_url(self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL))
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }

    pub fn generation_settings(&self) -> GenerationSettings {
        GenerationSettings {
            model: self
                .default_model
                .clone()
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            temperature: self.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            max_tokens: self.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            system_message: self
                .system_message
                .clone()
                .unwrap_or_else(|| DEFAULT_SYSTEM_MESSAGE.to_string()),
        }
    }

    pub fn timeouts(&self) -> Timeouts {
        Timeouts {
            connect: self
                .connect_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_CONNECT_TIMEOUT),
            read: self
                .read_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_READ_TIMEOUT),
        }
    }

    pub fn tool_servers(&self) -> Vec<ToolServer> {
        self.tool_servers
            .iter()
            .map(|url| ToolServer::new(url.as_str()))
            .collect()
    }

    /// Returns false if the URL was already present.
    pub fn add_tool_server(&mut self, url: &str) -> bool {
        let url = url.trim();
        if self.tool_servers.iter().any(|existing| existing == url) {
            return false;
        }
        self.tool_servers.push(url.to_string());
        true
    }

    pub fn remove_tool_server(&mut self, url: &str) -> bool {
        let url = url.trim();
        let before = self.tool_servers.len();
        self.tool_servers.retain(|existing| existing != url);
        before != self.tool_servers.len()
    }
}

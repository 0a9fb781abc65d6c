//! Conversation state and the request/response turn.

use std::error::Error as StdError;
use std::fmt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::api::ToolServer;
use crate::core::aggregator::{aggregate, ResponseMetadata, ResponseRenderer};
use crate::core::attachments::{user_content, Attachment};
use crate::core::chat_stream::{ChunkSource, StreamRequest, TransportError, TransportMode};
use crate::core::constants::{
    DEFAULT_MAX_TOKENS, DEFAULT_MODEL, DEFAULT_SYSTEM_MESSAGE, DEFAULT_TEMPERATURE,
};
use crate::core::conversation::ConversationRecord;
use crate::core::message::{AppMessage, AppMessageKind, ChatMessage, Role};

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationSettings {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub system_message: String,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            system_message: DEFAULT_SYSTEM_MESSAGE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SettingsError {
    Temperature(f32),
    MaxTokens,
    EmptyModel,
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::Temperature(value) => {
                write!(f, "Temperature must be between 0.0 and 1.0 (got {value})")
            }
            SettingsError::MaxTokens => write!(f, "Max tokens must be greater than zero"),
            SettingsError::EmptyModel => write!(f, "Model must not be empty"),
        }
    }
}

impl StdError for SettingsError {}

pub fn validate_temperature(value: f32) -> Result<f32, SettingsError> {
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(SettingsError::Temperature(value))
    }
}

pub fn validate_max_tokens(value: u32) -> Result<u32, SettingsError> {
    if value > 0 {
        Ok(value)
    } else {
        Err(SettingsError::MaxTokens)
    }
}

impl GenerationSettings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.model.trim().is_empty() {
            return Err(SettingsError::EmptyModel);
        }
        validate_temperature(self.temperature)?;
        validate_max_tokens(self.max_tokens)?;
        Ok(())
    }
}

/// What came back from one turn.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub text: String,
    pub metadata: ResponseMetadata,
    pub cancelled: bool,
    /// Whether the exchange was added to the history.
    pub committed: bool,
}

#[derive(Debug, Default)]
pub struct ChatSession {
    pub settings: GenerationSettings,
    history: Vec<ChatMessage>,
    metadata_history: Vec<ResponseMetadata>,
    pending_attachments: Vec<Attachment>,
    tool_servers: Vec<ToolServer>,
    use_tool_servers: bool,
    app_messages: Vec<AppMessage>,
}

impl ChatSession {
    pub fn new(settings: GenerationSettings) -> Self {
        Self {
            settings,
            ..Default::default()
        }
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    pub fn metadata_history(&self) -> &[ResponseMetadata] {
        &self.metadata_history
    }

    pub fn last_metadata(&self) -> Option<&ResponseMetadata> {
        self.metadata_history.last()
    }

    /// Forget the conversation. Settings and tool servers are kept.
    pub fn clear(&mut self) {
        self.history.clear();
        self.metadata_history.clear();
        self.pending_attachments.clear();
    }

    pub fn attach(&mut self, attachment: Attachment) {
        self.pending_attachments
            .retain(|existing| existing.name != attachment.name);
        self.pending_attachments.push(attachment);
    }

    pub fn pending_attachments(&self) -> &[Attachment] {
        &self.pending_attachments
    }

    pub fn clear_attachments(&mut self) -> usize {
        let count = self.pending_attachments.len();
        self.pending_attachments.clear();
        count
    }

    pub fn tool_servers(&self) -> &[ToolServer] {
        &self.tool_servers
    }

    /// Returns false if the server was already registered.
    pub fn add_tool_server(&mut self, url: &str) -> bool {
        let url = url.trim();
        if self.tool_servers.iter().any(|server| server.url == url) {
            return false;
        }
        self.tool_servers.push(ToolServer::new(url));
        true
    }

    pub fn remove_tool_server(&mut self, url: &str) -> bool {
        let url = url.trim();
        let before = self.tool_servers.len();
        self.tool_servers.retain(|server| server.url != url);
        self.tool_servers.len() != before
    }

    pub fn use_tool_servers(&self) -> bool {
        self.use_tool_servers
    }

    pub fn set_use_tool_servers(&mut self, enabled: bool) {
        self.use_tool_servers = enabled;
    }

    pub fn transport_mode(&self) -> TransportMode {
        if self.use_tool_servers && !self.tool_servers.is_empty() {
            TransportMode::Direct(self.tool_servers.clone())
        } else {
            TransportMode::Delegated
        }
    }

    pub fn add_app_message(&mut self, kind: AppMessageKind, content: impl Into<String>) {
        self.app_messages.push(AppMessage::new(kind, content));
    }

    pub fn take_app_messages(&mut self) -> Vec<AppMessage> {
        std::mem::take(&mut self.app_messages)
    }

    fn build_request(&self, user: ChatMessage) -> StreamRequest {
        let mut messages = Vec::with_capacity(self.history.len() + 2);
        messages.push(ChatMessage::system(self.settings.system_message.as_str()));
        messages.extend(self.history.iter().cloned());
        messages.push(user);

        StreamRequest {
            model: self.settings.model.clone(),
            messages,
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
            mode: self.transport_mode(),
        }
    }

    /// Build a request for `prompt` without touching the history. Pending
    /// attachments are consumed.
    pub fn prepare_request(&mut self, prompt: &str) -> StreamRequest {
        let attachments = std::mem::take(&mut self.pending_attachments);
        self.build_request(ChatMessage::user(user_content(prompt, &attachments)))
    }

    /// Send `prompt` (plus any pending attachments) and stream the answer.
    ///
    /// The exchange is committed to the history only when a non-empty answer
    /// came back; transport failures leave the session untouched apart from
    /// the consumed attachments.
    pub async fn run_turn<S, R>(
        &mut self,
        source: &S,
        prompt: &str,
        renderer: &mut R,
        cancel: &CancellationToken,
    ) -> Result<TurnOutcome, TransportError>
    where
        S: ChunkSource + ?Sized,
        R: ResponseRenderer + ?Sized,
    {
        let attachments = std::mem::take(&mut self.pending_attachments);
        let user = ChatMessage::user(user_content(prompt, &attachments));
        let request = self.build_request(user.clone());
        debug!(
            attachments = attachments.len(),
            mode = request.mode.name(),
            "Starting turn"
        );

        let stream = source.open_stream(request).await.inspect_err(|err| {
            warn!(error = %err, "Failed to open chat stream");
        })?;
        let response = aggregate(stream, renderer, cancel).await.inspect_err(|err| {
            warn!(error = %err, "Chat stream failed");
        })?;

        let committed = !response.text.is_empty();
        if committed {
            self.history.push(user);
            self.history.push(ChatMessage::assistant(response.text.as_str()));
            self.metadata_history.push(response.metadata.clone());
        }
        info!(
            committed,
            cancelled = response.cancelled,
            history = self.history.len(),
            "Turn finished"
        );

        Ok(TurnOutcome {
            text: response.text,
            metadata: response.metadata,
            cancelled: response.cancelled,
            committed,
        })
    }

    pub fn to_record(&self) -> ConversationRecord {
        ConversationRecord::new(
            self.settings.model.clone(),
            self.settings.system_message.clone(),
            self.history.clone(),
        )
    }

    /// Replace the conversation with a loaded one. System entries in the
    /// message list are folded into the system message.
    pub fn load_record(&mut self, record: ConversationRecord) {
        let mut system_message = record.system_message;
        let mut history = Vec::with_capacity(record.messages.len());
        for message in record.messages {
            if message.role == Role::System {
                if system_message.is_empty() {
                    system_message = message.content.display_text();
                }
            } else {
                history.push(message);
            }
        }

        if !record.model.is_empty() {
            self.settings.model = record.model;
        }
        if !system_message.is_empty() {
            self.settings.system_message = system_message;
        }
        self.history = history;
        self.metadata_history.clear();
        self.pending_attachments.clear();
    }
}

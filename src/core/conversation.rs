//! Saving and loading conversations as JSON files.

use chrono::{DateTime, Local, TimeZone};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::error::Error as StdError;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::info;

use crate::core::message::{ChatMessage, MessageContent, Role};

const FILENAME_TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationRecord {
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub system_message: String,
    pub messages: Vec<ChatMessage>,
}

impl ConversationRecord {
    pub fn new(
        model: impl Into<String>,
        system_message: impl Into<String>,
        messages: Vec<ChatMessage>,
    ) -> Self {
        Self {
            timestamp: Local::now().to_rfc3339(),
            model: model.into(),
            system_message: system_message.into(),
            messages,
        }
    }
}

/// Problems with the shape of a conversation document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The document is not a JSON object.
    NotAnObject,
    /// `messages` is absent or not an array.
    MissingMessages,
    /// A message entry is not an object.
    MessageNotAnObject { index: usize },
    /// A message entry lacks `role` or `content`.
    MissingField { index: usize, field: &'static str },
    InvalidRole { index: usize, role: String },
    InvalidContent { index: usize, reason: String },
    /// A top-level metadata field has the wrong type.
    InvalidField { field: &'static str },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::NotAnObject => write!(f, "Conversation file must be a JSON object"),
            ValidationError::MissingMessages => {
                write!(f, "Conversation file has no 'messages' array")
            }
            ValidationError::MessageNotAnObject { index } => {
                write!(f, "Message {index} is not an object")
            }
            ValidationError::MissingField { index, field } => {
                write!(f, "Message {index} is missing '{field}'")
            }
            ValidationError::InvalidRole { index, role } => {
                write!(f, "Message {index} has invalid role '{role}'")
            }
            ValidationError::InvalidContent { index, reason } => {
                write!(f, "Message {index} has invalid content: {reason}")
            }
            ValidationError::InvalidField { field } => {
                write!(f, "Field '{field}' must be a string")
            }
        }
    }
}

impl StdError for ValidationError {}

#[derive(Debug)]
pub enum ConversationError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Json(serde_json::Error),
    Invalid(ValidationError),
    Persist(tempfile::PersistError),
}

impl fmt::Display for ConversationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConversationError::Io { path, source } => {
                write!(f, "Failed to access {}: {}", path.display(), source)
            }
            ConversationError::Json(err) => write!(f, "Invalid conversation JSON: {err}"),
            ConversationError::Invalid(err) => write!(f, "Invalid conversation file: {err}"),
            ConversationError::Persist(err) => write!(f, "Failed to write conversation: {err}"),
        }
    }
}

impl StdError for ConversationError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            ConversationError::Io { source, .. } => Some(source),
            ConversationError::Json(err) => Some(err),
            ConversationError::Invalid(err) => Some(err),
            ConversationError::Persist(err) => Some(err),
        }
    }
}

impl From<ValidationError> for ConversationError {
    fn from(err: ValidationError) -> Self {
        ConversationError::Invalid(err)
    }
}

impl From<serde_json::Error> for ConversationError {
    fn from(err: serde_json::Error) -> Self {
        ConversationError::Json(err)
    }
}

pub fn default_filename<Tz: TimeZone>(now: &DateTime<Tz>) -> String
where
    Tz::Offset: fmt::Display,
{
    format!("conversation_{}.json", now.format(FILENAME_TIMESTAMP_FORMAT))
}

/// Resolve the name a conversation is saved under.
///
/// ```
/// use sonarchat::core::conversation::resolve_filename;
///
/// assert_eq!(resolve_filename("notes"), "notes.json");
/// assert_eq!(resolve_filename("notes.json"), "notes.json");
/// assert!(resolve_filename("  ").starts_with("conversation_"));
/// ```
pub fn resolve_filename(filename: &str) -> String {
    let filename = filename.trim();
    if filename.is_empty() {
        default_filename(&Local::now())
    } else if filename.ends_with(".json") {
        filename.to_string()
    } else {
        format!("{filename}.json")
    }
}

/// Write `record` as pretty JSON, replacing any existing file atomically.
pub fn save_conversation(
    filename: &str,
    record: &ConversationRecord,
) -> Result<PathBuf, ConversationError> {
    let path = PathBuf::from(resolve_filename(filename));
    let parent = path.parent().filter(|dir| !dir.as_os_str().is_empty());
    let io_error = |source| ConversationError::Io {
        path: path.clone(),
        source,
    };

    if let Some(dir) = parent {
        fs::create_dir_all(dir).map_err(io_error)?;
    }

    let contents = serde_json::to_string_pretty(record)?;
    let mut temp_file = match parent {
        Some(dir) => NamedTempFile::new_in(dir),
        None => NamedTempFile::new_in("."),
    }
    .map_err(io_error)?;

    temp_file.write_all(contents.as_bytes()).map_err(io_error)?;
    temp_file.as_file_mut().sync_all().map_err(io_error)?;
    temp_file.persist(&path).map_err(ConversationError::Persist)?;

    info!(path = %path.display(), messages = record.messages.len(), "Conversation saved");
    Ok(path)
}

pub fn load_conversation(path: &Path) -> Result<ConversationRecord, ConversationError> {
    let contents = fs::read_to_string(path).map_err(|source| ConversationError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let record = parse_conversation(&contents)?;
    info!(path = %path.display(), messages = record.messages.len(), "Conversation loaded");
    Ok(record)
}

/// Parse and validate a conversation document.
pub fn parse_conversation(contents: &str) -> Result<ConversationRecord, ConversationError> {
    let value: Value = serde_json::from_str(contents)?;
    Ok(validate_conversation(&value)?)
}

fn validate_conversation(value: &Value) -> Result<ConversationRecord, ValidationError> {
    let object = value.as_object().ok_or(ValidationError::NotAnObject)?;
    let entries = object
        .get("messages")
        .and_then(Value::as_array)
        .ok_or(ValidationError::MissingMessages)?;

    let messages = entries
        .iter()
        .enumerate()
        .map(|(index, entry)| validate_message(index, entry))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ConversationRecord {
        timestamp: string_field(object, "timestamp")?,
        model: string_field(object, "model")?,
        system_message: string_field(object, "system_message")?,
        messages,
    })
}

fn string_field(
    object: &serde_json::Map<String, Value>,
    field: &'static str,
) -> Result<String, ValidationError> {
    match object.get(field) {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(value)) => Ok(value.clone()),
        Some(_) => Err(ValidationError::InvalidField { field }),
    }
}

fn validate_message(index: usize, entry: &Value) -> Result<ChatMessage, ValidationError> {
    let object = entry
        .as_object()
        .ok_or(ValidationError::MessageNotAnObject { index })?;
    let role = object
        .get("role")
        .ok_or(ValidationError::MissingField {
            index,
            field: "role",
        })?;
    let content = object
        .get("content")
        .ok_or(ValidationError::MissingField {
            index,
            field: "content",
        })?;

    let role = role
        .as_str()
        .and_then(|role| Role::try_from(role).ok())
        .ok_or_else(|| ValidationError::InvalidRole {
            index,
            role: match role {
                Value::String(role) => role.clone(),
                other => other.to_string(),
            },
        })?;
    let content = MessageContent::deserialize(content).map_err(|err| {
        ValidationError::InvalidContent {
            index,
            reason: err.to_string(),
        }
    })?;

    Ok(ChatMessage::new(role, content))
}

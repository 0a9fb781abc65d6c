//! Files attached to the next user message.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::error::Error as StdError;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::core::constants::ATTACHMENT_TEXT_LIMIT;
use crate::core::message::{ContentPart, MessageContent};

const SUPPORTED_IMAGE_SUBTYPES: &[&str] = &["png", "jpeg", "gif", "webp"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentKind {
    Text,
    Json,
    Image,
}

impl AttachmentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            AttachmentKind::Text => "text",
            AttachmentKind::Json => "json",
            AttachmentKind::Image => "image",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// File name shown to the model.
    pub name: String,
    pub kind: AttachmentKind,
    pub mime: String,
    /// UTF-8 text, compact JSON, or base64 image bytes.
    pub content: String,
    pub summary: String,
}

#[derive(Debug)]
pub enum AttachmentError {
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    InvalidUtf8 {
        name: String,
    },
    InvalidJson {
        name: String,
        source: serde_json::Error,
    },
    UnsupportedImage {
        name: String,
        mime: String,
    },
    Unsupported {
        name: String,
        mime: String,
    },
}

impl fmt::Display for AttachmentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttachmentError::Read { path, source } => {
                write!(f, "Failed to read {}: {}", path.display(), source)
            }
            AttachmentError::InvalidUtf8 { name } => {
                write!(f, "{name} is not valid UTF-8 text")
            }
            AttachmentError::InvalidJson { name, source } => {
                write!(f, "{name} is not valid JSON: {source}")
            }
            AttachmentError::UnsupportedImage { name, mime } => {
                write!(f, "Unsupported image format for {name} ({mime})")
            }
            AttachmentError::Unsupported { name, mime } => {
                write!(f, "Unsupported file type for {name} ({mime})")
            }
        }
    }
}

impl StdError for AttachmentError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            AttachmentError::Read { source, .. } => Some(source),
            AttachmentError::InvalidJson { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Read `path` and turn it into an attachment, choosing the handling from
/// the MIME type guessed from its extension.
pub fn process_file(path: &Path) -> Result<Attachment, AttachmentError> {
    let bytes = fs::read(path).map_err(|source| AttachmentError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let mime = mime_guess::from_path(path).first_or_octet_stream();

    debug!(name = %name, mime = %mime, bytes = bytes.len(), "Processing attachment");
    process_bytes(name, mime.essence_str(), bytes)
}

/// Classify already-loaded file contents.
pub fn process_bytes(
    name: String,
    mime: &str,
    bytes: Vec<u8>,
) -> Result<Attachment, AttachmentError> {
    let (top_level, subtype) = mime.split_once('/').unwrap_or((mime, ""));

    if top_level == "text" {
        let text = String::from_utf8(bytes).map_err(|_| AttachmentError::InvalidUtf8 {
            name: name.clone(),
        })?;
        let summary = format!("text file ({} characters)", text.chars().count());
        return Ok(Attachment {
            name,
            kind: AttachmentKind::Text,
            mime: mime.to_string(),
            content: text,
            summary,
        });
    }

    if top_level == "image" {
        if !SUPPORTED_IMAGE_SUBTYPES.contains(&subtype) {
            return Err(AttachmentError::UnsupportedImage {
                name,
                mime: mime.to_string(),
            });
        }
        let summary = format!("image file ({mime}, {} bytes)", bytes.len());
        return Ok(Attachment {
            name,
            kind: AttachmentKind::Image,
            mime: mime.to_string(),
            content: STANDARD.encode(&bytes),
            summary,
        });
    }

    if mime == "application/json" {
        let value: serde_json::Value =
            serde_json::from_slice(&bytes).map_err(|source| AttachmentError::InvalidJson {
                name: name.clone(),
                source,
            })?;
        let content =
            serde_json::to_string(&value).map_err(|source| AttachmentError::InvalidJson {
                name: name.clone(),
                source,
            })?;
        return Ok(Attachment {
            name,
            kind: AttachmentKind::Json,
            mime: mime.to_string(),
            content,
            summary: "JSON file".to_string(),
        });
    }

    Err(AttachmentError::Unsupported {
        name,
        mime: mime.to_string(),
    })
}

fn truncate_chars(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}

/// Message parts for a set of attachments, in attachment order.
pub fn attachment_parts(attachments: &[Attachment]) -> Vec<ContentPart> {
    attachments
        .iter()
        .map(|attachment| match attachment.kind {
            AttachmentKind::Text | AttachmentKind::Json => ContentPart::text(format!(
                "- {}: {}\n\n```{}\n{}\n```",
                attachment.name,
                attachment.summary,
                attachment.kind.as_str(),
                truncate_chars(&attachment.content, ATTACHMENT_TEXT_LIMIT)
            )),
            AttachmentKind::Image => ContentPart::image_url(format!(
                "data:{};base64,{}",
                attachment.mime, attachment.content
            )),
        })
        .collect()
}

/// Body for a user prompt, folding in any attachments.
pub fn user_content(prompt: &str, attachments: &[Attachment]) -> MessageContent {
    if attachments.is_empty() {
        return MessageContent::Text(prompt.to_string());
    }
    let mut parts = Vec::with_capacity(attachments.len() + 1);
    parts.push(ContentPart::text(prompt));
    parts.extend(attachment_parts(attachments));
    MessageContent::Parts(parts)
}

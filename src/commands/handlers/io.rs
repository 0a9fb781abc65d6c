use std::path::Path;

use super::{error, info, usage_status};
use crate::commands::registry::CommandInvocation;
use crate::commands::CommandResult;
use crate::core::attachments::process_file;
use crate::core::conversation::{load_conversation, save_conversation, ConversationError};
use crate::core::message::AppMessageKind;
use crate::core::session::ChatSession;
use crate::ui::metadata::format_metadata;

const USAGE_LOAD: &str = "Usage: /load <file>";
const USAGE_ATTACH: &str = "Usage: /attach <path>";

pub(crate) fn handle_save(
    session: &mut ChatSession,
    invocation: CommandInvocation<'_>,
) -> CommandResult {
    if session.history().is_empty() {
        return info(session, "Nothing to save yet.");
    }
    match save_conversation(invocation.args, &session.to_record()) {
        Ok(path) => info(session, format!("Conversation saved to {}", path.display())),
        Err(err) => error(session, format!("Save failed: {err}")),
    }
}

pub(crate) fn handle_load(
    session: &mut ChatSession,
    invocation: CommandInvocation<'_>,
) -> CommandResult {
    if invocation.args.is_empty() {
        return usage_status(session, USAGE_LOAD);
    }
    let path = Path::new(invocation.args);
    match load_conversation(path) {
        Ok(record) => {
            let count = record.messages.len();
            session.load_record(record);
            info(
                session,
                format!("Loaded {count} messages from {}", path.display()),
            )
        }
        Err(ConversationError::Invalid(err)) => {
            session.add_app_message(
                AppMessageKind::Warning,
                format!("Conversation not loaded: {err}"),
            );
            CommandResult::Continue
        }
        Err(err) => error(session, format!("Load failed: {err}")),
    }
}

pub(crate) fn handle_clear(
    session: &mut ChatSession,
    _invocation: CommandInvocation<'_>,
) -> CommandResult {
    session.clear();
    info(session, "Conversation cleared.")
}

pub(crate) fn handle_attach(
    session: &mut ChatSession,
    invocation: CommandInvocation<'_>,
) -> CommandResult {
    if invocation.args.is_empty() {
        return usage_status(session, USAGE_ATTACH);
    }
    match process_file(Path::new(invocation.args)) {
        Ok(attachment) => {
            let message = format!(
                "Attached {}: {} (sent with your next message)",
                attachment.name, attachment.summary
            );
            session.attach(attachment);
            info(session, message)
        }
        Err(err) => {
            session.add_app_message(AppMessageKind::Warning, err.to_string());
            CommandResult::Continue
        }
    }
}

pub(crate) fn handle_detach(
    session: &mut ChatSession,
    _invocation: CommandInvocation<'_>,
) -> CommandResult {
    match session.clear_attachments() {
        0 => info(session, "No pending attachments."),
        1 => info(session, "Removed 1 attachment."),
        count => info(session, format!("Removed {count} attachments.")),
    }
}

pub(crate) fn handle_metadata(
    session: &mut ChatSession,
    _invocation: CommandInvocation<'_>,
) -> CommandResult {
    let Some(metadata) = session.last_metadata() else {
        return info(session, "No answer yet.");
    };
    let text = format_metadata(metadata);
    info(session, text)
}

pub(super) mod io;
pub(super) mod mcp;
pub(super) mod settings;

use crate::commands::registry::CommandInvocation;
use crate::commands::CommandResult;
use crate::core::message::AppMessageKind;
use crate::core::session::ChatSession;

pub(super) fn usage_status(session: &mut ChatSession, usage: &'static str) -> CommandResult {
    session.add_app_message(AppMessageKind::Warning, usage);
    CommandResult::Continue
}

pub(super) fn required_arg<'a>(
    session: &mut ChatSession,
    invocation: &CommandInvocation<'a>,
    index: usize,
    usage: &'static str,
) -> Option<&'a str> {
    match invocation.arg(index) {
        Some(value) => Some(value),
        None => {
            session.add_app_message(AppMessageKind::Warning, usage);
            None
        }
    }
}

pub(super) fn info(session: &mut ChatSession, content: impl Into<String>) -> CommandResult {
    session.add_app_message(AppMessageKind::Info, content);
    CommandResult::Continue
}

pub(super) fn error(session: &mut ChatSession, content: impl Into<String>) -> CommandResult {
    session.add_app_message(AppMessageKind::Error, content);
    CommandResult::Continue
}

//! Slash commands typed at the chat prompt.

mod handlers;
mod registry;

pub use registry::{all_commands, matching_commands, CommandInvocation};

use crate::core::message::AppMessageKind;
use crate::core::session::ChatSession;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResult {
    Continue,
    ProcessAsMessage(String),
    Quit,
}

/// Run `input` as a slash command, or hand it back as a chat message.
///
/// Unknown commands are reported rather than sent, so a typo never reaches
/// the model. Feedback is queued as app messages on the session.
pub fn process_input(session: &mut ChatSession, input: &str) -> CommandResult {
    let trimmed = input.trim();

    if !trimmed.starts_with('/') {
        return CommandResult::ProcessAsMessage(input.to_string());
    }

    let mut parts = trimmed[1..].splitn(2, char::is_whitespace);
    let command_name = match parts.next() {
        Some(name) if !name.is_empty() => name,
        _ => return CommandResult::ProcessAsMessage(input.to_string()),
    };
    let args = parts.next().unwrap_or("").trim();

    if let Some(command) = registry::find_command(command_name) {
        let invocation = CommandInvocation {
            input: trimmed,
            args,
        };
        (command.handler)(session, invocation)
    } else {
        let suggestions: Vec<String> = matching_commands(command_name)
            .iter()
            .map(|command| format!("/{}", command.name))
            .collect();
        let hint = if suggestions.is_empty() {
            "Type /help for a list.".to_string()
        } else {
            format!("Did you mean {}?", suggestions.join(", "))
        };
        session.add_app_message(
            AppMessageKind::Warning,
            format!("Unknown command: /{command_name}. {hint}"),
        );
        CommandResult::Continue
    }
}

pub(super) fn handle_help(
    session: &mut ChatSession,
    _invocation: CommandInvocation<'_>,
) -> CommandResult {
    let width = all_commands()
        .iter()
        .map(|command| command.usage.len())
        .max()
        .unwrap_or(0);
    let mut help = String::from("Commands:");
    for command in all_commands() {
        help.push_str(&format!(
            "\n  {:<width$}  {}",
            command.usage,
            command.help,
            width = width
        ));
    }
    help.push_str("\nPress Ctrl-C while an answer streams to stop it.");
    session.add_app_message(AppMessageKind::Info, help);
    CommandResult::Continue
}

pub(super) fn handle_quit(
    _session: &mut ChatSession,
    _invocation: CommandInvocation<'_>,
) -> CommandResult {
    CommandResult::Quit
}

#[cfg(test)]
mod tests;

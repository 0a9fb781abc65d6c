use super::handlers;
use super::CommandResult;
use crate::core::session::ChatSession;

pub type CommandHandler = fn(&mut ChatSession, CommandInvocation<'_>) -> CommandResult;

pub struct Command {
    pub name: &'static str,
    pub usage: &'static str,
    pub help: &'static str,
    pub handler: CommandHandler,
}

#[derive(Clone, Copy)]
pub struct CommandInvocation<'a> {
    pub input: &'a str,
    pub args: &'a str,
}

impl<'a> CommandInvocation<'a> {
    pub fn arg(&self, index: usize) -> Option<&'a str> {
        self.args.split_whitespace().nth(index)
    }
}

pub fn all_commands() -> &'static [Command] {
    COMMANDS
}

pub fn find_command(name: &str) -> Option<&'static Command> {
    all_commands()
        .iter()
        .find(|command| command.name.eq_ignore_ascii_case(name))
}

/// Commands whose name starts with `prefix`, for completion hints.
pub fn matching_commands(prefix: &str) -> Vec<&'static Command> {
    let prefix = prefix.trim_start_matches('/').to_ascii_lowercase();
    all_commands()
        .iter()
        .filter(|command| command.name.starts_with(&prefix))
        .collect()
}

const COMMANDS: &[Command] = &[
    Command {
        name: "help",
        usage: "/help",
        help: "Show available commands.",
        handler: super::handle_help,
    },
    Command {
        name: "save",
        usage: "/save [file]",
        help: "Save the conversation as JSON (timestamped name if omitted).",
        handler: handlers::io::handle_save,
    },
    Command {
        name: "load",
        usage: "/load <file>",
        help: "Replace the conversation with a saved one.",
        handler: handlers::io::handle_load,
    },
    Command {
        name: "clear",
        usage: "/clear",
        help: "Start a new conversation.",
        handler: handlers::io::handle_clear,
    },
    Command {
        name: "attach",
        usage: "/attach <path>",
        help: "Attach a text, JSON or image file to the next message.",
        handler: handlers::io::handle_attach,
    },
    Command {
        name: "detach",
        usage: "/detach",
        help: "Drop pending attachments.",
        handler: handlers::io::handle_detach,
    },
    Command {
        name: "model",
        usage: "/model [id]",
        help: "List models or switch to one.",
        handler: handlers::settings::handle_model,
    },
    Command {
        name: "temperature",
        usage: "/temperature <0.0-1.0>",
        help: "Set the sampling temperature.",
        handler: handlers::settings::handle_temperature,
    },
    Command {
        name: "max-tokens",
        usage: "/max-tokens <n>",
        help: "Set the answer length limit.",
        handler: handlers::settings::handle_max_tokens,
    },
    Command {
        name: "system",
        usage: "/system [text]",
        help: "Show or replace the system message.",
        handler: handlers::settings::handle_system,
    },
    Command {
        name: "mcp",
        usage: "/mcp [on|off|add <url>|remove <url>|list]",
        help: "Manage tool-augmentation servers for this session.",
        handler: handlers::mcp::handle_mcp,
    },
    Command {
        name: "metadata",
        usage: "/metadata",
        help: "Show usage, citations and references for the last answer.",
        handler: handlers::io::handle_metadata,
    },
    Command {
        name: "quit",
        usage: "/quit",
        help: "Leave the chat.",
        handler: super::handle_quit,
    },
];

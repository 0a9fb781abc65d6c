use super::{info, required_arg, usage_status};
use crate::commands::registry::CommandInvocation;
use crate::commands::CommandResult;
use crate::core::message::AppMessageKind;
use crate::core::session::ChatSession;
use crate::utils::url::is_http_url;

const USAGE_MCP: &str = "Usage: /mcp [on|off|add <url>|remove <url>|list]";
const USAGE_MCP_ADD: &str = "Usage: /mcp add <url>";
const USAGE_MCP_REMOVE: &str = "Usage: /mcp remove <url>";

fn describe(session: &ChatSession) -> String {
    let state = if session.use_tool_servers() {
        "on"
    } else {
        "off"
    };
    if session.tool_servers().is_empty() {
        return format!("Tool servers: {state} (none configured)");
    }
    let mut text = format!("Tool servers: {state}");
    for server in session.tool_servers() {
        text.push_str(&format!("\n  {}", server.url));
    }
    text
}

pub(crate) fn handle_mcp(
    session: &mut ChatSession,
    invocation: CommandInvocation<'_>,
) -> CommandResult {
    match invocation.arg(0).map(str::to_ascii_lowercase).as_deref() {
        None | Some("list") => {
            let text = describe(session);
            info(session, text)
        }
        Some("on") => {
            session.set_use_tool_servers(true);
            if session.tool_servers().is_empty() {
                session.add_app_message(
                    AppMessageKind::Warning,
                    "No tool servers configured yet; add one with /mcp add <url>.",
                );
            }
            info(session, "Tool servers enabled.")
        }
        Some("off") => {
            session.set_use_tool_servers(false);
            info(session, "Tool servers disabled.")
        }
        Some("add") => {
            let Some(url) = required_arg(session, &invocation, 1, USAGE_MCP_ADD) else {
                return CommandResult::Continue;
            };
            if !is_http_url(url) {
                session.add_app_message(
                    AppMessageKind::Warning,
                    format!("Not an http(s) URL: {url}"),
                );
                return CommandResult::Continue;
            }
            if session.add_tool_server(url) {
                info(session, format!("Added tool server {url}"))
            } else {
                info(session, format!("{url} is already configured."))
            }
        }
        Some("remove") => {
            let Some(url) = required_arg(session, &invocation, 1, USAGE_MCP_REMOVE) else {
                return CommandResult::Continue;
            };
            if session.remove_tool_server(url) {
                info(session, format!("Removed tool server {url}"))
            } else {
                info(session, format!("{url} is not configured."))
            }
        }
        Some(_) => usage_status(session, USAGE_MCP),
    }
}

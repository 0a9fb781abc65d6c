use super::{info, required_arg, usage_status};
use crate::commands::registry::CommandInvocation;
use crate::commands::CommandResult;
use crate::core::constants::KNOWN_MODELS;
use crate::core::message::AppMessageKind;
use crate::core::session::{validate_max_tokens, validate_temperature, ChatSession};

const USAGE_TEMPERATURE: &str = "Usage: /temperature <0.0-1.0>";
const USAGE_MAX_TOKENS: &str = "Usage: /max-tokens <n>";

pub(crate) fn handle_model(
    session: &mut ChatSession,
    invocation: CommandInvocation<'_>,
) -> CommandResult {
    let Some(model) = invocation.arg(0) else {
        let mut listing = String::from("Models:");
        for known in KNOWN_MODELS {
            let marker = if *known == session.settings.model {
                "*"
            } else {
                " "
            };
            listing.push_str(&format!("\n {marker} {known}"));
        }
        return info(session, listing);
    };

    if !KNOWN_MODELS.contains(&model) {
        session.add_app_message(
            AppMessageKind::Warning,
            format!("'{model}' is not a known model; requests may be rejected."),
        );
    }
    session.settings.model = model.to_string();
    info(session, format!("Model set: {model}"))
}

pub(crate) fn handle_temperature(
    session: &mut ChatSession,
    invocation: CommandInvocation<'_>,
) -> CommandResult {
    let Some(raw) = required_arg(session, &invocation, 0, USAGE_TEMPERATURE) else {
        return CommandResult::Continue;
    };
    let Ok(value) = raw.parse::<f32>() else {
        return usage_status(session, USAGE_TEMPERATURE);
    };
    match validate_temperature(value) {
        Ok(value) => {
            session.settings.temperature = value;
            info(session, format!("Temperature set: {value}"))
        }
        Err(err) => {
            session.add_app_message(AppMessageKind::Warning, err.to_string());
            CommandResult::Continue
        }
    }
}

pub(crate) fn handle_max_tokens(
    session: &mut ChatSession,
    invocation: CommandInvocation<'_>,
) -> CommandResult {
    let Some(raw) = required_arg(session, &invocation, 0, USAGE_MAX_TOKENS) else {
        return CommandResult::Continue;
    };
    let Ok(value) = raw.parse::<u32>() else {
        return usage_status(session, USAGE_MAX_TOKENS);
    };
    match validate_max_tokens(value) {
        Ok(value) => {
            session.settings.max_tokens = value;
            info(session, format!("Max tokens set: {value}"))
        }
        Err(err) => {
            session.add_app_message(AppMessageKind::Warning, err.to_string());
            CommandResult::Continue
        }
    }
}

pub(crate) fn handle_system(
    session: &mut ChatSession,
    invocation: CommandInvocation<'_>,
) -> CommandResult {
    if invocation.args.is_empty() {
        let current = format!("System message: {}", session.settings.system_message);
        return info(session, current);
    }
    session.settings.system_message = invocation.args.to_string();
    info(session, "System message updated.")
}

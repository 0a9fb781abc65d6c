//! Interactive chat entry point.

use std::error::Error;
use tokio::io::BufReader;
use tracing::info;

use crate::cli::{build_client, ChatOptions, GenerationOptions};
use crate::core::config::Config;
use crate::core::conversation::load_conversation;
use crate::core::message::AppMessageKind;
use crate::core::session::{
    validate_max_tokens, validate_temperature, ChatSession, SettingsError,
};
use crate::ui::chat_loop::run_chat_loop;
use crate::utils::url::is_http_url;

/// Start a session from config, with command-line flags layered on top.
pub(crate) fn build_session(
    config: &Config,
    options: &GenerationOptions,
) -> Result<ChatSession, Box<dyn Error>> {
    let mut settings = config.generation_settings();
    if let Some(model) = &options.model {
        settings.model = model.trim().to_string();
    }
    if let Some(temperature) = options.temperature {
        settings.temperature = validate_temperature(temperature)?;
    }
    if let Some(max_tokens) = options.max_tokens {
        settings.max_tokens = validate_max_tokens(max_tokens)?;
    }
    if let Some(system_message) = &options.system_message {
        settings.system_message = system_message.clone();
    }
    if settings.model.is_empty() {
        return Err(SettingsError::EmptyModel.into());
    }

    let mut session = ChatSession::new(settings);
    for server in config.tool_servers() {
        session.add_tool_server(&server.url);
    }
    session.set_use_tool_servers(config.use_tool_servers.unwrap_or(false));

    for url in &options.tool_servers {
        if !is_http_url(url) {
            return Err(
                format!("Tool server URL must start with http:// or https://: {url}").into(),
            );
        }
        session.add_tool_server(url);
    }
    if !options.tool_servers.is_empty() {
        session.set_use_tool_servers(true);
    }

    Ok(session)
}

pub async fn run_chat(options: ChatOptions) -> Result<(), Box<dyn Error>> {
    let config = Config::load()?;
    let client = build_client(&config)?;
    let mut session = build_session(&config, &options.generation)?;

    if let Some(path) = &options.load {
        let record = load_conversation(path)?;
        session.load_record(record);
        session.add_app_message(
            AppMessageKind::Info,
            format!(
                "Loaded {} messages from {}",
                session.history().len(),
                path.display()
            ),
        );
    }

    info!(
        model = %session.settings.model,
        mode = session.transport_mode().name(),
        "Starting chat"
    );
    println!(
        "sonarchat: {} (type /help for commands, /quit to leave)",
        session.settings.model
    );

    let stdin = BufReader::new(tokio::io::stdin());
    run_chat_loop(&mut session, &client, stdin).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::chat_stream::TransportMode;

    #[test]
    fn flags_override_config_values() {
        let config = Config {
            default_model: Some("sonar".to_string()),
            temperature: Some(0.2),
            ..Default::default()
        };
        let options = GenerationOptions {
            model: Some("sonar-pro".to_string()),
            max_tokens: Some(64),
            ..Default::default()
        };

        let session = build_session(&config, &options).unwrap();

        assert_eq!(session.settings.model, "sonar-pro");
        assert_eq!(session.settings.temperature, 0.2);
        assert_eq!(session.settings.max_tokens, 64);
    }

    #[test]
    fn invalid_flags_are_rejected() {
        let config = Config::default();
        let hot = GenerationOptions {
            temperature: Some(1.5),
            ..Default::default()
        };
        assert!(build_session(&config, &hot).is_err());

        let bad_url = GenerationOptions {
            tool_servers: vec!["ftp://tools".to_string()],
            ..Default::default()
        };
        assert!(build_session(&config, &bad_url).is_err());
    }

    #[test]
    fn configured_tool_servers_stay_off_unless_enabled() {
        let config = Config {
            tool_servers: vec!["http://localhost:9000".to_string()],
            ..Default::default()
        };

        let session = build_session(&config, &GenerationOptions::default()).unwrap();
        assert_eq!(session.transport_mode(), TransportMode::Delegated);

        let options = GenerationOptions {
            tool_servers: vec!["http://localhost:9001".to_string()],
            ..Default::default()
        };
        let session = build_session(&config, &options).unwrap();
        assert_eq!(session.tool_servers().len(), 2);
        assert_eq!(session.transport_mode().name(), "direct");
    }
}

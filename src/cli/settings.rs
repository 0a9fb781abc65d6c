//! Settings management for CLI set/unset commands.

use std::fmt;

use crate::core::config::data::path_display;
use crate::core::config::{Config, ConfigError};
use crate::core::session::{validate_max_tokens, validate_temperature};
use crate::utils::url::is_http_url;

pub const SETTING_KEYS: &[&str] = &[
    "default-model",
    "temperature",
    "max-tokens",
    "system-message",
    "base-url",
    "tool-server",
    "use-tool-servers",
];

/// Errors that can occur when setting or unsetting configuration values.
#[derive(Debug)]
pub enum SettingError {
    /// The provided setting key is not recognized.
    UnknownKey(String),
    /// The value could not be parsed or is out of range.
    InvalidValue { key: &'static str, message: String },
    /// The provided value could not be parsed as a boolean.
    InvalidBoolean(String),
    /// Required arguments are missing.
    MissingArgs {
        hint: &'static str,
        example: &'static str,
    },
    /// An error occurred while persisting the configuration.
    ConfigError(String),
}

impl SettingError {
    /// Print the error message to stderr with appropriate formatting.
    pub fn print(&self) {
        match self {
            SettingError::UnknownKey(key) => {
                eprintln!("❌ Unknown config key: {key}");
                eprintln!("   Available keys: {}", SETTING_KEYS.join(", "));
            }
            SettingError::InvalidValue { key, message } => {
                eprintln!("❌ Invalid value for {key}: {message}");
            }
            SettingError::InvalidBoolean(input) => {
                eprintln!("❌ Invalid boolean value: {input}");
                eprintln!("   Use 'on' or 'off' (also accepts true/false, yes/no)");
            }
            SettingError::MissingArgs { hint, example } => {
                eprintln!("⚠️  {hint}");
                eprintln!("Example: {example}");
            }
            SettingError::ConfigError(msg) => {
                eprintln!("❌ Failed to save configuration: {msg}");
            }
        }
    }

    /// Returns the exit code for this error.
    pub fn exit_code(&self) -> i32 {
        1
    }
}

impl fmt::Display for SettingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingError::UnknownKey(key) => write!(f, "Unknown config key: {key}"),
            SettingError::InvalidValue { key, message } => {
                write!(f, "Invalid value for {key}: {message}")
            }
            SettingError::InvalidBoolean(input) => write!(f, "Invalid boolean value: {input}"),
            SettingError::MissingArgs { hint, .. } => write!(f, "{hint}"),
            SettingError::ConfigError(msg) => write!(f, "Config error: {msg}"),
        }
    }
}

impl std::error::Error for SettingError {}

impl From<ConfigError> for SettingError {
    fn from(err: ConfigError) -> Self {
        SettingError::ConfigError(err.to_string())
    }
}

fn parse_bool(input: &str) -> Result<bool, SettingError> {
    match input.trim().to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Ok(true),
        "off" | "false" | "no" | "0" => Ok(false),
        _ => Err(SettingError::InvalidBoolean(input.to_string())),
    }
}

fn single_arg<'a>(
    args: &'a [String],
    hint: &'static str,
    example: &'static str,
) -> Result<&'a str, SettingError> {
    match args.first().map(|arg| arg.trim()) {
        Some(arg) if !arg.is_empty() => Ok(arg),
        _ => Err(SettingError::MissingArgs { hint, example }),
    }
}

/// Apply `sonarchat set <key> <value...>` to `config`.
pub fn apply_set(config: &mut Config, key: &str, args: &[String]) -> Result<String, SettingError> {
    match key {
        "default-model" => {
            let model = single_arg(
                args,
                "Specify a model id",
                "sonarchat set default-model sonar-pro",
            )?;
            config.default_model = Some(model.to_string());
            Ok(format!("✅ Set default-model to: {model}"))
        }
        "temperature" => {
            let raw = single_arg(
                args,
                "Specify a temperature between 0.0 and 1.0",
                "sonarchat set temperature 0.2",
            )?;
            let value = raw
                .parse::<f32>()
                .map_err(|err| SettingError::InvalidValue {
                    key: "temperature",
                    message: err.to_string(),
                })
                .and_then(|value| {
                    validate_temperature(value).map_err(|err| SettingError::InvalidValue {
                        key: "temperature",
                        message: err.to_string(),
                    })
                })?;
            config.temperature = Some(value);
            Ok(format!("✅ Set temperature to: {value}"))
        }
        "max-tokens" => {
            let raw = single_arg(
                args,
                "Specify the maximum tokens per answer",
                "sonarchat set max-tokens 2000",
            )?;
            let value = raw
                .parse::<u32>()
                .map_err(|err| SettingError::InvalidValue {
                    key: "max-tokens",
                    message: err.to_string(),
                })
                .and_then(|value| {
                    validate_max_tokens(value).map_err(|err| SettingError::InvalidValue {
                        key: "max-tokens",
                        message: err.to_string(),
                    })
                })?;
            config.max_tokens = Some(value);
            Ok(format!("✅ Set max-tokens to: {value}"))
        }
        "system-message" => {
            let message = args.join(" ");
            if message.trim().is_empty() {
                return Err(SettingError::MissingArgs {
                    hint: "Specify the system message",
                    example: "sonarchat set system-message You answer in one paragraph.",
                });
            }
            config.system_message = Some(message.trim().to_string());
            Ok("✅ Set system-message".to_string())
        }
        "base-url" => {
            let url = single_arg(
                args,
                "Specify the API base URL",
                "sonarchat set base-url https://api.perplexity.ai",
            )?;
            if !is_http_url(url) {
                return Err(SettingError::InvalidValue {
                    key: "base-url",
                    message: "must start with http:// or https://".to_string(),
                });
            }
            config.base_url = Some(url.to_string());
            Ok(format!("✅ Set base-url to: {url}"))
        }
        "tool-server" => {
            let url = single_arg(
                args,
                "Specify the tool server URL",
                "sonarchat set tool-server http://localhost:9000",
            )?;
            if !is_http_url(url) {
                return Err(SettingError::InvalidValue {
                    key: "tool-server",
                    message: "must start with http:// or https://".to_string(),
                });
            }
            if config.add_tool_server(url) {
                Ok(format!("✅ Added tool server: {url}"))
            } else {
                Ok(format!("Tool server already configured: {url}"))
            }
        }
        "use-tool-servers" => {
            let raw = single_arg(
                args,
                "Specify on or off",
                "sonarchat set use-tool-servers on",
            )?;
            let enabled = parse_bool(raw)?;
            config.use_tool_servers = Some(enabled);
            let state = if enabled { "on" } else { "off" };
            Ok(format!("✅ Set use-tool-servers to: {state}"))
        }
        other => Err(SettingError::UnknownKey(other.to_string())),
    }
}

/// Apply `sonarchat unset <key> [value]` to `config`.
pub fn apply_unset(
    config: &mut Config,
    key: &str,
    value: Option<&str>,
) -> Result<String, SettingError> {
    match key {
        "default-model" => config.default_model = None,
        "temperature" => config.temperature = None,
        "max-tokens" => config.max_tokens = None,
        "system-message" => config.system_message = None,
        "base-url" => config.base_url = None,
        "use-tool-servers" => config.use_tool_servers = None,
        "tool-server" => {
            let Some(url) = value else {
                return Err(SettingError::MissingArgs {
                    hint: "Specify the tool server URL to remove",
                    example: "sonarchat unset tool-server http://localhost:9000",
                });
            };
            return if config.remove_tool_server(url) {
                Ok(format!("✅ Removed tool server: {url}"))
            } else {
                Ok(format!("Tool server not configured: {url}"))
            };
        }
        other => return Err(SettingError::UnknownKey(other.to_string())),
    }
    Ok(format!("✅ Unset {key}"))
}

/// Current values as `key: value` lines, for `sonarchat set` with no key.
pub fn format_settings(config: &Config) -> Vec<String> {
    let settings = config.generation_settings();
    let tool_servers = if config.tool_servers.is_empty() {
        "(none)".to_string()
    } else {
        config.tool_servers.join(", ")
    };
    vec![
        format!("  default-model: {}", settings.model),
        format!("  temperature: {}", settings.temperature),
        format!("  max-tokens: {}", settings.max_tokens),
        format!("  system-message: {}", settings.system_message),
        format!("  base-url: {}", config.base_url()),
        format!("  tool-server: {tool_servers}"),
        format!(
            "  use-tool-servers: {}",
            if config.use_tool_servers.unwrap_or(false) {
                "on"
            } else {
                "off"
            }
        ),
    ]
}

pub fn set_setting(key: Option<&str>, args: &[String]) -> Result<(), SettingError> {
    let Some(key) = key else {
        let config = Config::load()?;
        let path = Config::config_path()?;
        println!("Current configuration ({}):", path_display(&path));
        for line in format_settings(&config) {
            println!("{line}");
        }
        return Ok(());
    };

    let message = Config::mutate(|config| apply_set(config, key, args))?;
    println!("{message}");
    Ok(())
}

pub fn unset_setting(key: &str, value: Option<&str>) -> Result<(), SettingError> {
    let message = Config::mutate(|config| apply_unset(config, key, value))?;
    println!("{message}");
    Ok(())
}

//! Command-line interface parsing and handling
//!
//! This module handles parsing command-line arguments and executing the appropriate commands.

pub mod chat;
pub mod model_list;
pub mod probe;
pub mod say;
pub mod settings;

use std::error::Error;
use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};

use crate::cli::chat::run_chat;
use crate::cli::model_list::list_models;
use crate::cli::probe::run_probe;
use crate::cli::say::run_say;
use crate::cli::settings::{set_setting, unset_setting};
use crate::core::chat_stream::ChatClient;
use crate::core::config::Config;
use crate::core::constants::API_KEY_ENV;
use crate::logging::init_logging;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("VERGEN_GIT_SHA"),
    ", built ",
    env!("VERGEN_BUILD_DATE"),
    ")"
);

#[derive(Parser)]
#[command(name = "sonarchat")]
#[command(version, long_version = LONG_VERSION)]
#[command(about = "A terminal chat client for Perplexity's Sonar models")]
#[command(
    long_about = "sonarchat streams answers from Perplexity's chat completions API, \
collects the sources each answer cites, and keeps the conversation in a simple \
line-based session that can be saved and reloaded.\n\n\
Environment Variables:\n\
  PERPLEXITY_API_KEY   API key (also read from a .env file)\n\
  SONARCHAT_BASE_URL   Custom API base URL (defaults to https://api.perplexity.ai)\n\
  SONARCHAT_LOG        Diagnostic log filter, e.g. 'debug' (logs go to stderr)\n\n\
Controls:\n\
  Enter             Send the message\n\
  Ctrl+C            Stop the answer being streamed; at the prompt, quit\n\
  /help             List slash commands"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[command(flatten)]
    pub chat: ChatOptions,
}

/// Settings shared by the interactive chat and one-shot answers.
#[derive(ClapArgs, Debug, Clone, Default, PartialEq)]
pub struct GenerationOptions {
    /// Model to use (see `sonarchat models`)
    #[arg(short = 'm', long, value_name = "MODEL")]
    pub model: Option<String>,

    /// Sampling temperature between 0.0 and 1.0
    #[arg(short = 't', long, value_name = "TEMP")]
    pub temperature: Option<f32>,

    /// Maximum tokens in an answer
    #[arg(long, value_name = "N")]
    pub max_tokens: Option<u32>,

    /// System message sent before the conversation
    #[arg(short = 's', long = "system", value_name = "TEXT")]
    pub system_message: Option<String>,

    /// Tool-augmentation server URL; repeat for several. Enables direct mode.
    #[arg(long = "tool-server", value_name = "URL")]
    pub tool_servers: Vec<String>,
}

#[derive(ClapArgs, Debug, Clone, Default, PartialEq)]
pub struct ChatOptions {
    #[command(flatten)]
    pub generation: GenerationOptions,

    /// Start from a saved conversation file
    #[arg(long, value_name = "FILE")]
    pub load: Option<PathBuf>,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// Start the chat session (default)
    Chat(ChatOptions),
    /// Answer a single prompt and exit
    Say {
        #[command(flatten)]
        generation: GenerationOptions,
        /// Attach a file to the prompt; repeat for several
        #[arg(long = "attach", value_name = "PATH")]
        attachments: Vec<PathBuf>,
        /// Wait for the complete answer instead of streaming it
        #[arg(long)]
        no_stream: bool,
        /// Prompt text
        #[arg(trailing_var_arg = true, required = true)]
        prompt: Vec<String>,
    },
    /// List known models
    Models,
    /// Check a tool-augmentation server
    Probe {
        /// Server base URL
        url: String,
        /// Also list the tools it offers
        #[arg(long)]
        tools: bool,
    },
    /// Set configuration values
    Set {
        /// Configuration key to set
        key: Option<String>,
        /// Value to set for the key (can be multiple words for system-message)
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        value: Vec<String>,
    },
    /// Unset configuration values
    Unset {
        /// Configuration key to unset
        key: String,
        /// Value to unset for the key (tool-server takes the URL)
        value: Option<String>,
    },
}

/// Build the API client from resolved configuration.
pub(crate) fn build_client(config: &Config) -> Result<ChatClient, Box<dyn Error>> {
    let api_key = config.api_key().ok_or_else(|| {
        format!(
            "No API key configured.\n\n\
Set {API_KEY_ENV} in your environment or a .env file:\n\
  export {API_KEY_ENV}=\"pplx-...\""
        )
    })?;
    Ok(ChatClient::new(config.base_url(), api_key, config.timeouts())?)
}

pub fn main() -> Result<(), Box<dyn Error>> {
    let _ = dotenvy::dotenv();
    init_logging();
    tokio::runtime::Runtime::new()?.block_on(async_main())
}

async fn async_main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    match args.command.unwrap_or(Commands::Chat(args.chat)) {
        Commands::Chat(options) => run_chat(options).await,
        Commands::Say {
            generation,
            attachments,
            no_stream,
            prompt,
        } => run_say(prompt, generation, attachments, no_stream).await,
        Commands::Models => {
            let config = Config::load()?;
            list_models(&config);
            Ok(())
        }
        Commands::Probe { url, tools } => run_probe(&url, tools).await,
        Commands::Set { key, value } => {
            if let Err(err) = set_setting(key.as_deref(), &value) {
                err.print();
                std::process::exit(err.exit_code());
            }
            Ok(())
        }
        Commands::Unset { key, value } => {
            if let Err(err) = unset_setting(&key, value.as_deref()) {
                err.print();
                std::process::exit(err.exit_code());
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests;

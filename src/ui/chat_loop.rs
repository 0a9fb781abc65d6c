//! Line-based chat loop.
//!
//! Reads prompts from the terminal, dispatches slash commands, and streams
//! answers. Ctrl-C while an answer streams stops that answer; Ctrl-C at the
//! prompt leaves the loop.

use std::error::Error;
use std::io::{self, Write};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::commands::{process_input, CommandResult};
use crate::core::aggregator::ResponseRenderer;
use crate::core::chat_stream::ChunkSource;
use crate::core::message::{AppMessage, AppMessageKind};
use crate::core::session::ChatSession;
use crate::ui::metadata::format_references;
use crate::ui::renderer::TerminalRenderer;

const PROMPT: &str = "> ";

pub fn format_app_message(message: &AppMessage) -> String {
    let prefix = match message.kind {
        AppMessageKind::Info => "ℹ️ ",
        AppMessageKind::Warning => "⚠️  ",
        AppMessageKind::Error => "❌ ",
    };
    format!("{prefix}{}", message.content)
}

fn print_app_messages(session: &mut ChatSession) {
    for message in session.take_app_messages() {
        let line = format_app_message(&message);
        match message.kind {
            AppMessageKind::Info => println!("{line}"),
            AppMessageKind::Warning | AppMessageKind::Error => eprintln!("{line}"),
        }
    }
}

fn show_prompt() -> io::Result<()> {
    let mut stdout = io::stdout();
    stdout.write_all(PROMPT.as_bytes())?;
    stdout.flush()
}

/// Send one prompt and print the streamed answer. Failures are reported
/// inline; the loop keeps going.
pub async fn run_chat_turn<S, R>(
    session: &mut ChatSession,
    source: &S,
    prompt: &str,
    renderer: &mut R,
    cancel: &CancellationToken,
) where
    S: ChunkSource + ?Sized,
    R: ResponseRenderer + ?Sized,
{
    match session.run_turn(source, prompt, renderer, cancel).await {
        Ok(outcome) => {
            if outcome.cancelled {
                session.add_app_message(AppMessageKind::Info, "Generation stopped.");
            }
            if !outcome.committed {
                session.add_app_message(
                    AppMessageKind::Warning,
                    "No answer received; the message was not added to the conversation.",
                );
            } else if let Some(references) = format_references(&outcome.metadata) {
                session.add_app_message(AppMessageKind::Info, references);
            }
        }
        Err(err) => {
            let mut message = format!("Error: {err}");
            if err.is_timeout() {
                message.push_str(
                    "\nTry again, or raise read_timeout_secs in the config file for long answers.",
                );
            }
            session.add_app_message(AppMessageKind::Error, message);
        }
    }
}

/// Spawn a task that cancels `cancel` on Ctrl-C. Abort it once the turn is
/// over so a later Ctrl-C reaches the prompt instead.
fn cancel_on_ctrl_c(cancel: CancellationToken) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.cancel();
        }
    })
}

/// Drive the chat loop until `/quit`, end of input, or Ctrl-C at the prompt.
pub async fn run_chat_loop<S, I>(
    session: &mut ChatSession,
    source: &S,
    input: I,
) -> Result<(), Box<dyn Error>>
where
    S: ChunkSource + ?Sized,
    I: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    print_app_messages(session);

    loop {
        show_prompt()?;
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => {
                println!();
                None
            }
        };
        let Some(line) = line else {
            break;
        };

        match process_input(session, &line) {
            CommandResult::Quit => {
                print_app_messages(session);
                break;
            }
            CommandResult::Continue => {}
            CommandResult::ProcessAsMessage(prompt) => {
                if prompt.trim().is_empty() {
                    continue;
                }
                let cancel = CancellationToken::new();
                let watcher = cancel_on_ctrl_c(cancel.clone());
                let mut renderer = TerminalRenderer::stdout();
                run_chat_turn(session, source, prompt.trim(), &mut renderer, &cancel).await;
                watcher.abort();
            }
        }
        print_app_messages(session);
    }

    info!(messages = session.history().len(), "Chat loop finished");
    Ok(())
}

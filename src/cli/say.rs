//! One-shot "say" command

use std::error::Error;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

use crate::api::completions::completion_text;
use crate::cli::chat::build_session;
use crate::cli::{build_client, GenerationOptions};
use crate::core::aggregator::ResponseMetadata;
use crate::core::attachments::process_file;
use crate::core::chunk::{normalize, RawChunk};
use crate::core::config::Config;
use crate::ui::metadata::format_references;
use crate::ui::renderer::TerminalRenderer;

pub async fn run_say(
    prompt: Vec<String>,
    generation: GenerationOptions,
    attachments: Vec<PathBuf>,
    no_stream: bool,
) -> Result<(), Box<dyn Error>> {
    let prompt = prompt.join(" ");
    if prompt.trim().is_empty() {
        eprintln!("Usage: sonarchat say <prompt>");
        std::process::exit(1);
    }

    let config = Config::load()?;
    let client = build_client(&config)?;
    let mut session = build_session(&config, &generation)?;
    for path in &attachments {
        session.attach(process_file(path)?);
    }

    let metadata = if no_stream {
        let request = session.prepare_request(prompt.trim());
        let body = match client.complete(request).await {
            Ok(body) => body,
            Err(err) => {
                eprintln!("❌ Error: {err}");
                std::process::exit(1);
            }
        };
        let text = completion_text(&body).unwrap_or_default();
        println!("{text}");
        let chunk = normalize(RawChunk::Raw(body.clone())).unwrap_or_default();
        ResponseMetadata::finalize(chunk.usage, chunk.citations.unwrap_or_default(), text)
    } else {
        let mut renderer = TerminalRenderer::stdout();
        let cancel = CancellationToken::new();
        let watcher = {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    cancel.cancel();
                }
            })
        };
        let outcome = session
            .run_turn(&client, prompt.trim(), &mut renderer, &cancel)
            .await;
        watcher.abort();
        match outcome {
            Ok(outcome) => outcome.metadata,
            Err(err) => {
                eprintln!("❌ Error: {err}");
                std::process::exit(1);
            }
        }
    };

    if let Some(references) = format_references(&metadata) {
        println!("\n{references}");
    }
    Ok(())
}

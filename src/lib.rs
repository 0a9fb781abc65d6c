//! sonarchat is a terminal chat client for Perplexity-style chat completion
//! APIs that answer with cited sources.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns the conversation session, streaming transport, chunk
//!   normalization, response aggregation, reference extraction, attachments,
//!   configuration, and conversation persistence.
//! - [`ui`] renders streamed answers to the terminal and runs the line-based
//!   chat loop.
//! - [`commands`] implements slash-command parsing and execution used by the
//!   chat loop.
//! - [`mcp`] probes tool-augmentation servers that can be attached to requests.
//! - [`api`] defines request, chunk, usage, and citation payloads, plus
//!   non-streaming completions.
//!
//! Runtime entrypoints live in the binary crate (`src/main.rs`) and route
//! through [`crate::cli::main`], which resolves configuration and dispatches
//! into [`ui::chat_loop`] for interactive sessions.

pub mod api;
pub mod cli;
pub mod commands;
pub mod core;
pub mod logging;
pub mod mcp;
pub mod ui;
pub mod utils;

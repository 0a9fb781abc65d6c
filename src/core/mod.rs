pub mod aggregator;
pub mod attachments;
pub mod chat_stream;
pub mod chunk;
pub mod config;
pub mod constants;
pub mod conversation;
pub mod message;
pub mod references;
pub mod session;
pub mod sse;

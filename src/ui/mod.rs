pub mod chat_loop;
pub mod metadata;
pub mod renderer;

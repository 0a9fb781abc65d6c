//! Tool-augmentation servers.
//!
//! These servers are handed to the upstream API, which calls them itself;
//! locally we only check that they are up and list what they offer.

pub mod probe;

pub use probe::{ProbeOutcome, ToolDescriptor, ToolServerProbe};

//! Reasoning service boundary: client, prompt context and reply parsing

pub mod client;
pub mod context;
pub mod parser;
pub mod reasoner;

pub use client::{ApiFormat, LlmClient};
pub use context::ConversationLine;
pub use reasoner::{OfflineReasoner, Reasoner, ReasonerBackend, ReasoningError, ReplyStream};

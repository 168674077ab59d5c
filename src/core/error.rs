use thiserror::Error;

use crate::core::types::{AgentId, ZoneId};
use crate::llm::reasoner::ReasoningError;

#[derive(Error, Debug)]
pub enum HearthError {
    #[error("Agent not found: {0}")]
    AgentNotFound(AgentId),

    #[error("Zone not found: {0}")]
    ZoneNotFound(ZoneId),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Invalid tile map: {0}")]
    TileMap(String),

    #[error("Reasoning error: {0}")]
    Reasoning(#[from] ReasoningError),

    #[error("Async runtime error: {0}")]
    Runtime(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    TomlError(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, HearthError>;

//! The external reasoning boundary
//!
//! Everything that asks a language model for text goes through `Reasoner`.
//! Callers never see transport details and every call may fail; each
//! simulation operation that uses a reasoner owns its own fallback.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use futures::Stream;
use thiserror::Error;

use crate::llm::client::LlmClient;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReasoningError {
    #[error("transport failure: {0}")]
    Transport(String),

    #[error("service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed reply: {0}")]
    Malformed(String),

    #[error("empty reply")]
    Empty,

    #[error("request timed out")]
    Timeout,

    #[error("reasoning service unavailable")]
    Unavailable,
}

/// Lazy, finite sequence of reply chunks. Not restartable.
pub type ReplyStream = Pin<Box<dyn Stream<Item = Result<String, ReasoningError>> + Send>>;

/// Prompt in; text, JSON-shaped text or a chunk stream out.
///
/// `schema` describes the JSON shape the caller expects. Backends may use it
/// to request structured output; callers still validate the reply.
pub trait Reasoner: Send + Sync {
    fn complete(
        &self,
        system: &str,
        user: &str,
        schema: Option<&serde_json::Value>,
    ) -> impl Future<Output = Result<String, ReasoningError>> + Send;

    fn stream(
        &self,
        system: &str,
        user: &str,
    ) -> impl Future<Output = Result<ReplyStream, ReasoningError>> + Send;
}

/// Run a reasoning call against a deadline. Expiry reads as `Timeout`.
pub async fn with_deadline<T, F>(deadline: Duration, call: F) -> Result<T, ReasoningError>
where
    F: Future<Output = Result<T, ReasoningError>>,
{
    match tokio::time::timeout(deadline, call).await {
        Ok(result) => result,
        Err(_) => Err(ReasoningError::Timeout),
    }
}

/// Reasoner for running without a service. Every call fails, which drives
/// every caller onto its fallback path.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineReasoner;

impl Reasoner for OfflineReasoner {
    async fn complete(
        &self,
        _system: &str,
        _user: &str,
        _schema: Option<&serde_json::Value>,
    ) -> Result<String, ReasoningError> {
        Err(ReasoningError::Unavailable)
    }

    async fn stream(&self, _system: &str, _user: &str) -> Result<ReplyStream, ReasoningError> {
        Err(ReasoningError::Unavailable)
    }
}

/// Concrete reasoner selected at startup.
///
/// Enum dispatch keeps `Simulation` generic over one type without boxing
/// the futures returned by the trait methods.
pub enum ReasonerBackend {
    Llm(LlmClient),
    Offline(OfflineReasoner),
}

impl ReasonerBackend {
    /// HTTP client when `LLM_API_KEY` is set, otherwise offline
    pub fn from_env() -> Self {
        match LlmClient::from_env() {
            Ok(client) => Self::Llm(client),
            Err(e) => {
                tracing::warn!(error = %e, "No reasoning service configured, running offline");
                Self::Offline(OfflineReasoner)
            }
        }
    }

    pub fn is_offline(&self) -> bool {
        matches!(self, Self::Offline(_))
    }

    pub const fn name(&self) -> &str {
        match self {
            Self::Llm(_) => "llm",
            Self::Offline(_) => "offline",
        }
    }
}

impl Reasoner for ReasonerBackend {
    async fn complete(
        &self,
        system: &str,
        user: &str,
        schema: Option<&serde_json::Value>,
    ) -> Result<String, ReasoningError> {
        match self {
            Self::Llm(client) => client.complete(system, user, schema).await,
            Self::Offline(offline) => offline.complete(system, user, schema).await,
        }
    }

    async fn stream(&self, system: &str, user: &str) -> Result<ReplyStream, ReasoningError> {
        match self {
            Self::Llm(client) => client.stream(system, user).await,
            Self::Offline(offline) => offline.stream(system, user).await,
        }
    }
}

/// Reasoner that answers every completion with the same text
#[cfg(test)]
pub(crate) struct Canned(pub &'static str);

#[cfg(test)]
impl Reasoner for Canned {
    async fn complete(
        &self,
        _system: &str,
        _user: &str,
        _schema: Option<&serde_json::Value>,
    ) -> Result<String, ReasoningError> {
        Ok(self.0.to_string())
    }

    async fn stream(&self, _system: &str, _user: &str) -> Result<ReplyStream, ReasoningError> {
        let chunks: Vec<Result<String, ReasoningError>> =
            self.0.split_inclusive(' ').map(|c| Ok(c.to_string())).collect();
        Ok(Box::pin(futures::stream::iter(chunks)))
    }
}

//! Recording memories
//!
//! `record_memory` always asks the reasoner for a score; a failed score is 1.
//! Callers that should not spend a request (observations, reflections,
//! busy agents) go through `record_unscored` and the kind's fixed importance.

use crate::core::config::SimulationConfig;
use crate::core::types::EntityRef;
use crate::entity::agent::Agent;
use crate::entity::memory::{Importance, Memory, MemoryKind};
use crate::llm::parser::{self, ImportanceReply};
use crate::llm::reasoner::{with_deadline, Reasoner, ReasoningError};

const IMPORTANCE_RUBRIC: &str = "You rate how much a memory matters to a villager in a medieval village, on a scale from 1 to 10.\n\
1 means routine and forgettable: walking, eating, sleeping.\n\
5 means a meaningful conversation or event.\n\
10 means life-changing: mortal danger, a betrayal, falling in love, a deep realization.\n\
Answer with JSON only: {\"score\": <integer>}";

/// Ask the reasoner how important `text` is. Never fails: any error is 1.
pub async fn score_importance<R: Reasoner>(
    reasoner: &R,
    text: &str,
    config: &SimulationConfig,
) -> Importance {
    match request_score(reasoner, text, config).await {
        Ok(score) => score,
        Err(e) => {
            tracing::warn!(error = %e, "Importance scoring failed, using minimum");
            Importance::MIN
        }
    }
}

async fn request_score<R: Reasoner>(
    reasoner: &R,
    text: &str,
    config: &SimulationConfig,
) -> Result<Importance, ReasoningError> {
    let schema = parser::importance_schema();
    let user = format!("Memory: \"{}\"", text);
    let reply = with_deadline(
        config.reasoning_timeout(),
        reasoner.complete(IMPORTANCE_RUBRIC, &user, Some(&schema)),
    )
    .await?;
    let parsed: ImportanceReply = parser::parse_reply(&reply)?;
    if !parsed.score.is_finite() {
        return Err(ReasoningError::Malformed(format!("score {}", parsed.score)));
    }
    Ok(Importance::new(parsed.score.round() as i64))
}

/// Importance a memory of `kind` gets without asking anyone
pub fn fixed_importance(kind: MemoryKind, config: &SimulationConfig) -> Importance {
    match kind {
        MemoryKind::Reflection => Importance::new(i64::from(config.reflection_importance)),
        MemoryKind::Observation | MemoryKind::Dialogue => {
            Importance::new(i64::from(config.ambient_importance))
        }
    }
}

/// Append a memory with a known importance and return a copy of it
pub fn record_with_importance(
    agent: &mut Agent,
    text: impl Into<String>,
    kind: MemoryKind,
    day: u32,
    related: Option<EntityRef>,
    importance: Importance,
) -> Memory {
    let memory = Memory::new(text, kind, day, importance).with_related(related);
    tracing::debug!(
        agent = %agent.name,
        kind = ?kind,
        importance = importance.value(),
        "Recorded memory"
    );
    agent.memory.push(memory.clone());
    memory
}

/// Record without any external call, at the kind's fixed importance
pub fn record_unscored(
    agent: &mut Agent,
    text: impl Into<String>,
    kind: MemoryKind,
    day: u32,
    related: Option<EntityRef>,
    config: &SimulationConfig,
) -> Memory {
    record_with_importance(agent, text, kind, day, related, fixed_importance(kind, config))
}

/// Score a memory with the reasoner, then record it
pub async fn record_memory<R: Reasoner>(
    reasoner: &R,
    agent: &mut Agent,
    text: &str,
    kind: MemoryKind,
    day: u32,
    related: Option<EntityRef>,
    config: &SimulationConfig,
) -> Memory {
    let importance = score_importance(reasoner, text, config).await;
    record_with_importance(agent, text, kind, day, related, importance)
}

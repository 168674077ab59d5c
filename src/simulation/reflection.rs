//! End-of-day reflection
//!
//! Condenses a day's raw memories into one or two insights, stored as
//! reflection memories. Best effort: a failed call leaves the raw memories
//! as the only record of the day.

use crate::core::config::SimulationConfig;
use crate::entity::agent::Agent;
use crate::entity::memory::MemoryKind;
use crate::llm::parser::{self, ReflectionReply};
use crate::llm::reasoner::{with_deadline, Reasoner, ReasoningError};
use crate::simulation::memory::record_unscored;

/// Most insights kept from one reflection
pub const MAX_INSIGHTS: usize = 2;

/// Inputs for one reflection, detached from the agent
#[derive(Debug, Clone)]
pub struct ReflectionRequest {
    pub name: String,
    pub day: u32,
    pub memories: Vec<String>,
}

impl ReflectionRequest {
    /// `None` when the agent recorded nothing on `day`
    pub fn from_agent(agent: &Agent, day: u32) -> Option<Self> {
        let memories: Vec<String> = agent
            .memory
            .raw_for_day(day)
            .into_iter()
            .map(|m| m.text.clone())
            .collect();
        (!memories.is_empty()).then(|| Self {
            name: agent.name.clone(),
            day,
            memories,
        })
    }
}

/// Ask the reasoner for the day's insights
pub async fn condense_day<R: Reasoner>(
    reasoner: &R,
    request: &ReflectionRequest,
    config: &SimulationConfig,
) -> Result<Vec<String>, ReasoningError> {
    let system = format!(
        "You are {}, thinking back over your day.\n\
         Read the raw memories below and draw 1 or 2 broader conclusions about your life, \
         the people around you, or what you want.\n\
         Generalize rather than repeat: \"Bob said hi\" becomes \"Bob has been friendly lately.\"\n\
         Answer with JSON only: {{\"insights\": [\"...\"]}}",
        request.name
    );
    let listing: Vec<String> = request.memories.iter().map(|m| format!("- {}", m)).collect();
    let user = format!("What happened on day {}:\n{}", request.day, listing.join("\n"));

    let schema = parser::reflection_schema();
    let reply = with_deadline(
        config.reasoning_timeout(),
        reasoner.complete(&system, &user, Some(&schema)),
    )
    .await?;
    let parsed: ReflectionReply = parser::parse_reply(&reply)?;

    let insights: Vec<String> = parsed
        .insights
        .into_iter()
        .map(|i| i.trim().to_string())
        .filter(|i| !i.is_empty())
        .take(MAX_INSIGHTS)
        .collect();
    if insights.is_empty() {
        return Err(ReasoningError::Empty);
    }
    Ok(insights)
}

/// Store insights as reflection memories and stamp the reflection day
pub fn apply_insights(
    agent: &mut Agent,
    insights: &[String],
    day: u32,
    config: &SimulationConfig,
) -> usize {
    for insight in insights {
        record_unscored(
            agent,
            format!("Reflection: {}", insight),
            MemoryKind::Reflection,
            day,
            None,
            config,
        );
    }
    agent.last_reflection_day = Some(day);
    insights.len()
}

/// Reflect on `day` in place. Returns the number of insights recorded.
pub async fn reflect<R: Reasoner>(
    reasoner: &R,
    agent: &mut Agent,
    day: u32,
    config: &SimulationConfig,
) -> usize {
    let Some(request) = ReflectionRequest::from_agent(agent, day) else {
        return 0;
    };

    match condense_day(reasoner, &request, config).await {
        Ok(insights) => {
            let count = apply_insights(agent, &insights, day, config);
            tracing::info!(agent = %agent.name, day, insights = count, "Reflected on the day");
            count
        }
        Err(e) => {
            tracing::warn!(agent = %agent.name, day, error = %e, "Reflection skipped");
            0
        }
    }
}

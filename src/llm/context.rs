//! Prompt sections describing an agent
//!
//! Planning and dialogue prompts are assembled from the same few blocks:
//! who the agent is, how they feel, who they are talking to and what has
//! been said. Each block is a plain string so callers can arrange them.

use serde::{Deserialize, Serialize};

use crate::entity::agent::Agent;
use crate::entity::needs::{Needs, CRITICAL_THRESHOLD};
use crate::entity::relationships::Relationship;

/// One line of an ongoing conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationLine {
    pub speaker: String,
    pub text: String,
}

impl ConversationLine {
    pub fn new(speaker: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            speaker: speaker.into(),
            text: text.into(),
        }
    }
}

/// "You are Bob, a Farmer. Traits: ... Goal: ..."
pub fn persona(agent: &Agent) -> String {
    format!(
        "You are {}, a {}. Traits: {}. Goal: {}.",
        agent.name,
        agent.role,
        agent.personality.traits_line(),
        agent.personality.goal
    )
}

/// Persona plus background, for dialogue
pub fn persona_with_background(agent: &Agent) -> String {
    format!(
        "You are {}, a {}. Traits: {}. Background: {}",
        agent.name,
        agent.role,
        agent.personality.traits_line(),
        agent.personality.background
    )
}

/// Needs summary for planning, with what a low value calls for
pub fn needs_summary(needs: &Needs) -> String {
    format!(
        "Needs (0-100, low is urgent): Hunger {} (eat when low), Social {} (talk when low), Energy {} (rest when low).",
        needs.hunger.round(),
        needs.social.round(),
        needs.energy.round()
    )
}

/// How the agent feels right now, if anything is pressing.
///
/// Hunger outranks fatigue.
pub fn needs_mood(needs: &Needs) -> Option<&'static str> {
    if needs.hunger < CRITICAL_THRESHOLD {
        Some("You are very hungry.")
    } else if needs.energy < CRITICAL_THRESHOLD {
        Some("You are exhausted.")
    } else {
        None
    }
}

pub fn relationship_section(relationship: &Relationship, target_name: &str) -> String {
    format!(
        "How you feel about {}:\nTrust {}/100, Respect {}/100, Romance {}/100",
        target_name, relationship.trust, relationship.respect, relationship.romance
    )
}

pub fn conversation_section(history: &[ConversationLine]) -> String {
    if history.is_empty() {
        return "The conversation is just starting.".to_string();
    }
    let lines: Vec<String> = history
        .iter()
        .map(|line| format!("{}: \"{}\"", line.speaker, line.text))
        .collect();
    format!("CONVERSATION SO FAR:\n{}", lines.join("\n"))
}

/// Flatten a conversation into a transcript for analysis
pub fn transcript(history: &[ConversationLine]) -> String {
    history
        .iter()
        .map(|line| format!("{}: {}", line.speaker, line.text))
        .collect::<Vec<_>>()
        .join("\n")
}

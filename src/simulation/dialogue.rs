//! Conversation helpers
//!
//! Greetings, streamed replies, ambient chatter between agents and the
//! after-conversation relationship analysis. Every helper has a canned
//! answer for when the reasoner fails or reasoning is switched off.

use futures::stream;

use crate::core::config::SimulationConfig;
use crate::core::types::EntityRef;
use crate::entity::agent::Agent;
use crate::entity::relationships::MAX_DELTA;
use crate::llm::context::{self, ConversationLine};
use crate::llm::parser::{self, AmbientReply, SocialAnalysis};
use crate::llm::reasoner::{with_deadline, Reasoner, ReasoningError, ReplyStream};

pub const FALLBACK_GREETING: &str = "Hello there.";
pub const OFFLINE_GREETING: &str = "Hello!";
pub const FALLBACK_REPLY: &str = "...";
pub const OFFLINE_REPLY: &str = "I don't have much to say.";
pub const FALLBACK_AMBIENT: (&str, &str) = ("Nice day.", "Indeed.");

fn single_chunk(text: &str) -> ReplyStream {
    Box::pin(stream::once(std::future::ready(Ok(text.to_string()))))
}

/// Opening line when someone approaches `agent`
pub async fn greeting<R: Reasoner>(reasoner: &R, agent: &Agent, config: &SimulationConfig) -> String {
    if !config.use_ai {
        return OFFLINE_GREETING.to_string();
    }

    let mut system = format!(
        "{}\n{}\nSomeone approaches you.",
        context::persona(agent),
        agent.retrieve_context()
    );
    if let Some(mood) = context::needs_mood(&agent.needs) {
        system.push(' ');
        system.push_str(mood);
    }
    let user = "Greet them in one short sentence. Reply with the greeting only.";

    match with_deadline(config.reasoning_timeout(), reasoner.complete(&system, user, None)).await {
        Ok(line) if !line.trim().is_empty() => line.trim().to_string(),
        Ok(_) => FALLBACK_GREETING.to_string(),
        Err(e) => {
            tracing::warn!(agent = %agent.name, error = %e, "Greeting failed, using fallback");
            FALLBACK_GREETING.to_string()
        }
    }
}

/// Streamed reply to `player_input`.
///
/// When the stream cannot be opened the reply is a single filler chunk.
pub async fn reply_stream<R: Reasoner>(
    reasoner: &R,
    agent: &Agent,
    player_input: &str,
    history: &[ConversationLine],
    target_name: &str,
    target: &EntityRef,
    config: &SimulationConfig,
) -> ReplyStream {
    if !config.use_ai {
        return single_chunk(OFFLINE_REPLY);
    }

    let relationship = agent.relationships.view(target);
    let mut system = format!(
        "{}\n\n{}\n\n{}\n\n{}",
        context::persona_with_background(agent),
        context::relationship_section(&relationship, target_name),
        agent.retrieve_context(),
        context::conversation_section(history)
    );
    if let Some(mood) = context::needs_mood(&agent.needs) {
        system.push_str("\n\n");
        system.push_str(mood);
    }
    system.push_str(
        "\n\nStay in character. Let your feelings toward them color what you say. \
         Answer in one to three sentences, speech only.",
    );

    match with_deadline(config.reasoning_timeout(), reasoner.stream(&system, player_input)).await {
        Ok(reply) => reply,
        Err(e) => {
            tracing::warn!(agent = %agent.name, error = %e, "Reply stream failed, using filler");
            single_chunk(FALLBACK_REPLY)
        }
    }
}

/// Two one-liners exchanged by agents who pass each other
pub async fn ambient_exchange<R: Reasoner>(
    reasoner: &R,
    first: &Agent,
    second: &Agent,
    config: &SimulationConfig,
) -> (String, String) {
    let fallback = || (FALLBACK_AMBIENT.0.to_string(), FALLBACK_AMBIENT.1.to_string());
    if !config.use_ai {
        return fallback();
    }

    match request_ambient(reasoner, first, second, config).await {
        Ok(reply) => (reply.npc1_line, reply.npc2_line),
        Err(e) => {
            tracing::warn!(
                first = %first.name,
                second = %second.name,
                error = %e,
                "Ambient exchange failed, using fallback"
            );
            fallback()
        }
    }
}

async fn request_ambient<R: Reasoner>(
    reasoner: &R,
    first: &Agent,
    second: &Agent,
    config: &SimulationConfig,
) -> Result<AmbientReply, ReasoningError> {
    let system = format!(
        "Two villagers pass each other.\nFirst: {} ({}).\nSecond: {} ({}).\n\
         Write one short line for each. Answer with JSON only: \
         {{\"npc1_line\": \"...\", \"npc2_line\": \"...\"}}",
        first.label(),
        first.personality.traits_line(),
        second.label(),
        second.personality.traits_line()
    );
    let schema = parser::ambient_schema();
    let reply = with_deadline(
        config.reasoning_timeout(),
        reasoner.complete(&system, "What do they say?", Some(&schema)),
    )
    .await?;
    let parsed: AmbientReply = parser::parse_reply(&reply)?;
    if parsed.npc1_line.trim().is_empty() || parsed.npc2_line.trim().is_empty() {
        return Err(ReasoningError::Empty);
    }
    Ok(parsed)
}

/// Neutral outcome used whenever analysis is unavailable
pub fn neutral_analysis(target_name: &str) -> SocialAnalysis {
    SocialAnalysis {
        trust_change: 0.0,
        respect_change: 0.0,
        summary: format!("Talked to {}", target_name),
    }
}

/// Judge how a finished conversation changed `agent`'s view of the other party
pub async fn analyze_conversation<R: Reasoner>(
    reasoner: &R,
    agent: &Agent,
    target_name: &str,
    history: &[ConversationLine],
    config: &SimulationConfig,
) -> SocialAnalysis {
    if !config.use_ai || history.is_empty() {
        return neutral_analysis(target_name);
    }

    match request_analysis(reasoner, agent, target_name, history, config).await {
        Ok(mut analysis) => {
            let bound = f64::from(MAX_DELTA);
            analysis.trust_change = analysis.trust_change.round().clamp(-bound, bound);
            analysis.respect_change = analysis.respect_change.round().clamp(-bound, bound);
            if analysis.summary.trim().is_empty() {
                analysis.summary = format!("Talked to {}", target_name);
            }
            analysis
        }
        Err(e) => {
            tracing::warn!(agent = %agent.name, error = %e, "Conversation analysis failed, using neutral outcome");
            neutral_analysis(target_name)
        }
    }
}

async fn request_analysis<R: Reasoner>(
    reasoner: &R,
    agent: &Agent,
    target_name: &str,
    history: &[ConversationLine],
    config: &SimulationConfig,
) -> Result<SocialAnalysis, ReasoningError> {
    let system = format!(
        "You are {}. You just finished talking with {}.\n\
         Decide how the conversation changed your trust and respect for them, \
         each from -10 to 10, and summarize it in one sentence from your point of view.\n\
         Answer with JSON only: {{\"trustChange\": 0, \"respectChange\": 0, \"summary\": \"...\"}}",
        agent.label(),
        target_name
    );
    let user = format!("Transcript:\n{}", context::transcript(history));
    let schema = parser::social_schema();
    let reply = with_deadline(
        config.reasoning_timeout(),
        reasoner.complete(&system, &user, Some(&schema)),
    )
    .await?;
    let analysis: SocialAnalysis = parser::parse_reply(&reply)?;
    if !analysis.trust_change.is_finite() || !analysis.respect_change.is_finite() {
        return Err(ReasoningError::Malformed("non-finite relationship change".into()));
    }
    Ok(analysis)
}

/// Apply an analysis to the relationship with `target`; returns the summary
/// to be remembered
pub fn apply_analysis(agent: &mut Agent, target: EntityRef, analysis: &SocialAnalysis, day: u32) -> String {
    agent.relationships.update(
        target,
        analysis.trust_change.round() as i32,
        analysis.respect_change.round() as i32,
        day,
    );
    tracing::debug!(
        agent = %agent.name,
        target = %target,
        trust = analysis.trust_change,
        respect = analysis.respect_change,
        "Relationship updated"
    );
    analysis.summary.clone()
}

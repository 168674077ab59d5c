//! Plan generation
//!
//! Two strategies:
//! - static: a fixed template per role, no external calls, never fails
//! - reasoned: ask the reasoning service for the day's activities, falling
//!   back to a short "Confused..." wait on any failure
//!
//! Both expand each activity into a walk to the (jittered) location followed
//! by a wait for the activity's duration.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::core::calendar::TimePeriod;
use crate::core::config::SimulationConfig;
use crate::core::types::Vec2;
use crate::entity::agent::{Agent, Personality};
use crate::entity::needs::Needs;
use crate::entity::plan::Action;
use crate::llm::context;
use crate::llm::parser::{self, PlanReply};
use crate::llm::reasoner::{with_deadline, Reasoner, ReasoningError};

/// Named places agents can plan around
pub const LOCATIONS: &[(&str, Vec2)] = &[
    ("Bakery", Vec2 { x: 28.0, y: 24.0 }),
    ("Farm", Vec2 { x: 12.0, y: 24.0 }),
    ("Market", Vec2 { x: 32.0, y: 33.0 }),
    ("Castle", Vec2 { x: 38.0, y: 16.0 }),
    ("Home", Vec2 { x: 24.0, y: 26.0 }),
    ("Guard Post", Vec2 { x: 22.0, y: 38.0 }),
    ("Church", Vec2 { x: 11.0, y: 16.0 }),
    ("Mill", Vec2 { x: 6.0, y: 28.0 }),
    ("Forge", Vec2 { x: 36.0, y: 33.0 }),
    ("Tavern", Vec2 { x: 30.0, y: 28.0 }),
];

/// Where unknown location names send an agent
pub const DEFAULT_LOCATION: Vec2 = Vec2 { x: 25.0, y: 25.0 };

/// Description used for the fallback plan
pub const CONFUSED: &str = "Confused...";

/// One entry of a role template: (location, description, duration secs)
pub type Activity = (&'static str, &'static str, f32);

const FARMER_DAY: &[Activity] = &[
    ("Farm", "Working the fields", 60.0),
    ("Home", "Eating lunch", 20.0),
    ("Home", "Resting at home", 30.0),
];

const BAKER_DAY: &[Activity] = &[
    ("Bakery", "Baking bread", 50.0),
    ("Market", "Eating lunch", 20.0),
    ("Market", "Selling at market", 40.0),
];

const GUARD_DAY: &[Activity] = &[
    ("Guard Post", "Patrolling", 60.0),
    ("Castle", "Checking Castle", 40.0),
    ("Market", "Break time", 20.0),
];

const WANDERER_DAY: &[Activity] = &[
    ("Market", "Wandering", 40.0),
    ("Bakery", "Finding food", 20.0),
    ("Home", "Going home", 40.0),
];

/// Template for a role; roles without one get the wanderer's day
pub fn role_template(role: &str) -> &'static [Activity] {
    match role {
        "Farmer" => FARMER_DAY,
        "Baker" => BAKER_DAY,
        "Guard" => GUARD_DAY,
        _ => WANDERER_DAY,
    }
}

/// Coordinates for a location name. Matching ignores case and surrounding
/// whitespace.
pub fn location_of(name: &str) -> Option<Vec2> {
    let name = name.trim();
    LOCATIONS
        .iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(name))
        .map(|(_, pos)| *pos)
}

fn jittered<G: Rng>(base: Vec2, jitter: f32, rng: &mut G) -> Vec2 {
    if !jitter.is_finite() || jitter <= 0.0 {
        return base;
    }
    Vec2::new(
        base.x + rng.gen_range(-jitter..jitter),
        base.y + rng.gen_range(-jitter..jitter),
    )
}

/// Walk to `location`, then spend `duration` there
fn expand<G: Rng>(
    location: Vec2,
    description: &str,
    duration: f32,
    jitter: f32,
    rng: &mut G,
) -> [Action; 2] {
    let duration = if duration.is_finite() && duration > 0.0 { duration } else { 1.0 };
    [
        Action::move_to(jittered(location, jitter, rng), description),
        Action::wait(duration, description),
    ]
}

/// Deterministic-shape plan from the role template
pub fn static_plan<G: Rng>(role: &str, rng: &mut G, config: &SimulationConfig) -> Vec<Action> {
    role_template(role)
        .iter()
        .flat_map(|&(location, description, duration)| {
            let base = location_of(location).unwrap_or(DEFAULT_LOCATION);
            expand(base, description, duration, config.plan_jitter, rng)
        })
        .collect()
}

/// The plan handed out when reasoning fails
pub fn confused_plan(config: &SimulationConfig) -> Vec<Action> {
    vec![Action::wait(config.confused_wait_secs, CONFUSED)]
}

/// Snapshot of what planning needs to know about an agent.
///
/// Owned so it can travel into a spawned task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanRequest {
    pub name: String,
    pub role: String,
    pub personality: Personality,
    pub memory_context: String,
    pub needs: Needs,
    pub period: TimePeriod,
}

impl PlanRequest {
    pub fn from_agent(agent: &Agent, period: TimePeriod) -> Self {
        Self {
            name: agent.name.clone(),
            role: agent.role.clone(),
            personality: agent.personality.clone(),
            memory_context: agent.retrieve_context(),
            needs: agent.needs.clone(),
            period,
        }
    }
}

/// Produce a plan for `request`.
///
/// Day 1, or `use_external == false`, always takes the static template.
/// Otherwise the reasoner is asked and any failure yields `confused_plan`.
pub async fn request_plan<R, G>(
    reasoner: &R,
    request: &PlanRequest,
    day: u32,
    use_external: bool,
    rng: &mut G,
    config: &SimulationConfig,
) -> Vec<Action>
where
    R: Reasoner,
    G: Rng + Send,
{
    if day == 1 || !use_external {
        return static_plan(&request.role, rng, config);
    }

    match reasoned_plan(reasoner, request, day, config).await {
        Ok(reply) => reply
            .actions
            .iter()
            .flat_map(|activity| {
                let base = location_of(&activity.location).unwrap_or(DEFAULT_LOCATION);
                expand(base, &activity.description, activity.duration, config.plan_jitter, rng)
            })
            .collect(),
        Err(e) => {
            tracing::warn!(agent = %request.name, day, error = %e, "Plan generation failed, using fallback");
            confused_plan(config)
        }
    }
}

async fn reasoned_plan<R: Reasoner>(
    reasoner: &R,
    request: &PlanRequest,
    day: u32,
    config: &SimulationConfig,
) -> Result<PlanReply, ReasoningError> {
    let places: Vec<String> = LOCATIONS.iter().map(|(name, _)| format!("\"{}\"", name)).collect();
    let system = format!(
        "You are {}, a {}. Traits: {}. Goal: {}.\n{}\n{}\n\n\
         Decide how to spend today in exactly 2 activities. Look after your needs first: \
         when hunger is low go somewhere to eat (Bakery, Farm or Tavern); when social is low \
         go where people gather (Market or Tavern).\n\
         Places you can go: {}.\n\
         Answer with JSON only.",
        request.name,
        request.role,
        request.personality.traits_line(),
        request.personality.goal,
        request.memory_context,
        context::needs_summary(&request.needs),
        places.join(", ")
    );
    let user = format!(
        "Day {}, {}. What will you do today?\n\
         Format: {{\"actions\": [{{\"description\": \"Buy bread for breakfast\", \"location\": \"Bakery\", \"duration\": 10}}]}}",
        day,
        request.period.label()
    );

    let schema = parser::plan_schema();
    let reply = with_deadline(
        config.reasoning_timeout(),
        reasoner.complete(&system, &user, Some(&schema)),
    )
    .await?;
    let plan: PlanReply = parser::parse_reply(&reply)?;
    if plan.actions.is_empty() {
        return Err(ReasoningError::Empty);
    }
    Ok(plan)
}

//! The agent aggregate
//!
//! An `Agent` exclusively owns its needs, relationships, memories, plan and
//! cached path. Other agents are referenced only by `AgentId`.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::core::config::SimulationConfig;
use crate::core::types::{AgentId, Facing, GridPos, Vec2, ZoneId};
use crate::entity::memory::MemoryLog;
use crate::entity::needs::Needs;
use crate::entity::plan::{Action, Plan};
use crate::entity::relationships::Relationships;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Personality {
    pub traits: Vec<String>,
    pub background: String,
    pub goal: String,
}

impl Personality {
    pub fn new(traits: &[&str], background: &str, goal: &str) -> Self {
        Self {
            traits: traits.iter().map(|t| t.to_string()).collect(),
            background: background.to_string(),
            goal: goal.to_string(),
        }
    }

    pub fn traits_line(&self) -> String {
        self.traits.join(", ")
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExecutionState {
    #[default]
    Idle,
    Moving,
    Waiting,
}

/// Countdown timers that gate re-entering a conversation or a map transition
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Cooldowns {
    pub interaction: f32,
    pub portal: f32,
}

impl Cooldowns {
    pub fn tick(&mut self, dt: f32) {
        self.interaction = (self.interaction - dt).max(0.0);
        self.portal = (self.portal - dt).max(0.0);
    }

    pub fn can_interact(&self) -> bool {
        self.interaction <= 0.0
    }

    pub fn can_use_portal(&self) -> bool {
        self.portal <= 0.0
    }
}

/// How many memories a retrieval pulls from each prong
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievalWindow {
    pub recent: usize,
    pub important: usize,
}

impl Default for RetrievalWindow {
    fn default() -> Self {
        Self { recent: 3, important: 3 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    pub id: AgentId,
    pub name: String,
    /// Profession; selects the static plan template
    pub role: String,
    pub personality: Personality,

    pub zone: ZoneId,
    pub position: Vec2,
    pub facing: Facing,

    pub needs: Needs,
    pub relationships: Relationships,
    pub memory: MemoryLog,
    pub retrieval: RetrievalWindow,

    pub plan: Plan,
    pub state: ExecutionState,
    /// Remaining cells toward the current move target. `None` until the
    /// executor computes one for the current action.
    pub path: Option<VecDeque<GridPos>>,
    pub wait_timer: f32,

    pub cooldowns: Cooldowns,
    pub last_reflection_day: Option<u32>,
}

impl Agent {
    pub fn new(
        name: impl Into<String>,
        role: impl Into<String>,
        personality: Personality,
        zone: ZoneId,
        position: Vec2,
        config: &SimulationConfig,
    ) -> Self {
        Self {
            id: AgentId::new(),
            name: name.into(),
            role: role.into(),
            personality,
            zone,
            position,
            facing: Facing::default(),
            needs: Needs::from_config(config),
            relationships: Relationships::new(),
            memory: MemoryLog::new(),
            retrieval: RetrievalWindow {
                recent: config.retrieval_recent,
                important: config.retrieval_important,
            },
            plan: Plan::default(),
            state: ExecutionState::Idle,
            path: None,
            wait_timer: 0.0,
            cooldowns: Cooldowns::default(),
            last_reflection_day: None,
        }
    }

    /// Memory context for prompt assembly
    pub fn retrieve_context(&self) -> String {
        self.memory
            .context_string(self.retrieval.recent, self.retrieval.important)
    }

    /// Install a new plan. Drops any cached path and wait progress.
    pub fn set_plan(&mut self, actions: Vec<Action>) {
        self.plan.replace(actions);
        self.path = None;
        self.wait_timer = 0.0;
        self.state = ExecutionState::Idle;
    }

    pub fn needs_plan(&self) -> bool {
        self.plan.is_exhausted()
    }

    /// "Name (Role)" for prompts and logs
    pub fn label(&self) -> String {
        format!("{} ({})", self.name, self.role)
    }
}

//! Per-tick action execution
//!
//! Advances one agent by one tick: walk the cached path toward the current
//! move target, or count down the current wait. The result depends only on
//! the arguments; suspension is passed in rather than read from anywhere.

use std::collections::VecDeque;

use crate::core::config::SimulationConfig;
use crate::core::types::{Facing, Vec2};
use crate::entity::agent::{Agent, ExecutionState};
use crate::entity::plan::Action;
use crate::spatial::pathfinding::find_path;
use crate::spatial::tile_map::ZoneMaps;

/// Slack on wait completion so accumulated float error cannot add a tick
pub const WAIT_EPSILON: f32 = 1e-3;

/// What one call to `advance_agent` did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Agent is in a conversation; nothing was touched
    Suspended,
    /// No action left to run
    PlanExhausted,
    /// Current action still running
    InProgress,
    /// Current action finished this tick
    Completed { plan_exhausted: bool },
    /// No path to the move target; the action was dropped
    Unreachable { plan_exhausted: bool },
}

impl StepOutcome {
    /// True when the agent has nothing left to do and wants a new plan
    pub fn wants_plan(&self) -> bool {
        matches!(
            self,
            StepOutcome::PlanExhausted
                | StepOutcome::Completed { plan_exhausted: true }
                | StepOutcome::Unreachable { plan_exhausted: true }
        )
    }
}

enum Step {
    Move(Vec2),
    Wait(f32),
}

/// Advance `agent` by `dt` seconds.
pub fn advance_agent(
    agent: &mut Agent,
    maps: &ZoneMaps,
    dt: f32,
    suspended: bool,
    config: &SimulationConfig,
) -> StepOutcome {
    if suspended {
        return StepOutcome::Suspended;
    }

    agent.cooldowns.tick(dt);

    let step = match agent.plan.current() {
        Some(Action::Move { target, .. }) => Step::Move(*target),
        Some(Action::Wait { duration, .. }) => Step::Wait(*duration),
        None => {
            agent.state = ExecutionState::Idle;
            return StepOutcome::PlanExhausted;
        }
    };

    match step {
        Step::Move(target) => step_move(agent, maps, target, dt, config.move_speed),
        Step::Wait(duration) => step_wait(agent, duration, dt),
    }
}

fn step_move(agent: &mut Agent, maps: &ZoneMaps, target: Vec2, dt: f32, speed: f32) -> StepOutcome {
    agent.state = ExecutionState::Moving;

    if agent.path.is_none() {
        let path = match maps.get(&agent.zone) {
            Some(map) => find_path(map, agent.position, target),
            None => {
                tracing::warn!(agent = %agent.name, zone = %agent.zone, "Agent is in an unknown zone");
                Vec::new()
            }
        };
        if path.is_empty() {
            tracing::debug!(
                agent = %agent.name,
                action = agent.plan.current_description(),
                "Move target unreachable, skipping action"
            );
            complete_action(agent);
            return StepOutcome::Unreachable {
                plan_exhausted: agent.plan.is_exhausted(),
            };
        }
        agent.path = Some(VecDeque::from(path));
    }

    let Some(next) = agent.path.as_ref().and_then(|p| p.front().copied()) else {
        complete_action(agent);
        return StepOutcome::Completed {
            plan_exhausted: agent.plan.is_exhausted(),
        };
    };

    let delta = next.to_vec2() - agent.position;
    let distance = delta.length();
    let step = speed * dt;

    if distance <= step {
        agent.position = next.to_vec2();
        let remaining = agent.path.as_mut().map(|p| {
            p.pop_front();
            p.len()
        });
        if remaining == Some(0) {
            complete_action(agent);
            return StepOutcome::Completed {
                plan_exhausted: agent.plan.is_exhausted(),
            };
        }
    } else {
        agent.position = agent.position + delta.normalize() * step;
        agent.facing = Facing::from_delta(delta.x, delta.y);
    }

    StepOutcome::InProgress
}

fn step_wait(agent: &mut Agent, duration: f32, dt: f32) -> StepOutcome {
    agent.state = ExecutionState::Waiting;
    agent.wait_timer += dt;
    if agent.wait_timer + WAIT_EPSILON >= duration {
        complete_action(agent);
        return StepOutcome::Completed {
            plan_exhausted: agent.plan.is_exhausted(),
        };
    }
    StepOutcome::InProgress
}

fn complete_action(agent: &mut Agent) {
    agent.plan.advance();
    agent.path = None;
    agent.wait_timer = 0.0;
    agent.state = ExecutionState::Idle;
}

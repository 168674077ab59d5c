//! The tick loop with background reasoning
//!
//! A scripted reasoner answers by prompt kind so the whole request/inbox
//! cycle can be driven deterministically from a current-thread runtime.

use hearthwood::core::config::SimulationConfig;
use hearthwood::core::types::ZoneId;
use hearthwood::entity::agent::ExecutionState;
use hearthwood::entity::memory::MemoryKind;
use hearthwood::entity::plan::Action;
use hearthwood::llm::reasoner::{Reasoner, ReasoningError, ReplyStream};
use hearthwood::simulation::inbox::Purpose;
use hearthwood::simulation::tick::Simulation;
use hearthwood::village;

struct Scripted;

impl Reasoner for Scripted {
    async fn complete(
        &self,
        system: &str,
        _user: &str,
        _schema: Option<&serde_json::Value>,
    ) -> Result<String, ReasoningError> {
        let reply = if system.contains("Decide how to spend today") {
            r#"Sure! {"actions": [
                {"description": "Buying bread", "location": "Bakery", "duration": 10},
                {"description": "Drinking with friends", "location": "tavern", "duration": 30}
            ]}"#
        } else if system.contains("thinking back over your day") {
            r#"{"insights": ["Hard work in the fields pays off"]}"#
        } else if system.contains("how much a memory matters") {
            r#"{"score": 6}"#
        } else {
            return Err(ReasoningError::Unavailable);
        };
        Ok(reply.to_string())
    }

    async fn stream(&self, _system: &str, _user: &str) -> Result<ReplyStream, ReasoningError> {
        Err(ReasoningError::Unavailable)
    }
}

fn short_days(seconds_per_day: f32, use_ai: bool) -> SimulationConfig {
    SimulationConfig {
        seconds_per_day,
        use_ai,
        ..SimulationConfig::default()
    }
}

#[tokio::test]
async fn test_day_cycle_with_reasoning() {
    let config = short_days(10.0, true);
    let mut sim = Simulation::new(Scripted, village::village_zones().unwrap(), config.clone()).unwrap();
    let bob = sim.add_agent(village::roster(&config).remove(0)).unwrap();

    // Day 1 is always planned from the role template
    let report = sim.tick(0.5, None);
    assert_eq!(report.static_plans, 1);
    assert_eq!(sim.agent(bob).unwrap().plan.current_description(), "Working the fields");

    sim.observe(bob, "Harvested the north field").unwrap();

    let mut finished = None;
    for _ in 0..19 {
        let report = sim.tick(0.5, None);
        if report.finished_day.is_some() {
            finished = report.finished_day;
            assert_eq!(report.reflections, 1);
        }
    }
    assert_eq!(finished, Some(1));
    assert!(sim.is_in_flight(bob, Purpose::Reflection));

    sim.settle().await;
    let reflection = sim.agent(bob).unwrap().memory.last().unwrap().clone();
    assert_eq!(reflection.text, "Reflection: Hard work in the fields pays off");
    assert_eq!(reflection.kind, MemoryKind::Reflection);
    assert_eq!(reflection.importance.value(), 8);
    assert_eq!(sim.agent(bob).unwrap().last_reflection_day, Some(1));

    // Day 2: an exhausted plan goes to the reasoner, once
    sim.agent_mut(bob).unwrap().set_plan(vec![Action::wait(0.5, "Pausing")]);
    let report = sim.tick(0.5, None);
    assert_eq!(report.day, 2);
    assert_eq!(report.plan_requests, 1);
    assert!(sim.is_in_flight(bob, Purpose::Plan));

    let report = sim.tick(0.5, None);
    assert_eq!(report.plan_requests, 0);

    sim.settle().await;
    assert_eq!(sim.pending(), 0);
    let bob = sim.agent(bob).unwrap();
    assert_eq!(bob.plan.len(), 4);
    assert_eq!(bob.plan.current_description(), "Buying bread");
    assert_eq!(bob.plan.actions()[3].description(), "Drinking with friends");
}

#[tokio::test]
async fn test_plan_arriving_during_dialogue_waits_for_it_to_end() {
    let config = short_days(10.0, true);
    let mut sim = Simulation::new(Scripted, village::village_zones().unwrap(), config.clone()).unwrap();
    let bob = sim.add_agent(village::roster(&config).remove(0)).unwrap();

    // Get to day 2 with nothing in flight
    while sim.calendar().current_day() < 2 {
        sim.tick(0.5, None);
    }
    sim.settle().await;

    sim.agent_mut(bob).unwrap().set_plan(vec![Action::wait(0.1, "Pausing")]);
    let report = sim.tick(0.1, None);
    assert_eq!(report.plan_requests, 1);

    // The player starts talking before the plan comes back
    sim.tick(0.1, Some(bob));
    sim.settle().await;
    let talking = sim.agent(bob).unwrap().clone();
    assert_eq!(talking.plan.len(), 4);
    assert_eq!(talking.plan.cursor(), 0);
    assert_eq!(talking.plan.current_description(), "Buying bread");

    for _ in 0..50 {
        let report = sim.tick(0.1, Some(bob));
        assert_eq!(report.plan_requests, 0);
    }
    let still = sim.agent(bob).unwrap();
    assert_eq!(still.position, talking.position);
    assert_eq!(still.plan.cursor(), 0);
    assert_eq!(still.state, ExecutionState::Idle);

    for _ in 0..10 {
        sim.tick(0.1, None);
    }
    let walking = sim.agent(bob).unwrap();
    assert_eq!(walking.state, ExecutionState::Moving);
    assert_ne!(walking.position, talking.position);
    assert_eq!(walking.plan.cursor(), 0);
}

#[tokio::test]
async fn test_dialogue_memory_is_scored_in_background() {
    let config = short_days(600.0, true);
    let mut sim = Simulation::new(Scripted, village::village_zones().unwrap(), config.clone()).unwrap();
    let alice = sim.add_agent(village::roster(&config).remove(1)).unwrap();

    sim.remember(alice, "The traveler asked for a cake", MemoryKind::Dialogue, None)
        .unwrap();
    assert!(sim.agent(alice).unwrap().memory.is_empty());

    assert_eq!(sim.settle().await, 1);
    let memory = sim.agent(alice).unwrap().memory.last().unwrap();
    assert_eq!(memory.importance.value(), 6);
}

#[tokio::test]
async fn test_offline_village_day() {
    let config = short_days(60.0, false);
    let mut sim = Simulation::new(Scripted, village::village_zones().unwrap(), config.clone()).unwrap();
    for agent in village::roster(&config) {
        sim.add_agent(agent).unwrap();
    }

    let mut finished = Vec::new();
    for _ in 0..700 {
        let report = sim.tick(0.1, None);
        assert_eq!(report.plan_requests, 0);
        assert_eq!(report.reflections, 0);
        finished.extend(report.finished_day);
    }
    assert_eq!(finished, vec![1]);
    assert_eq!(sim.pending(), 0);

    let map = sim.zones().get(&ZoneId::new(village::WORLD_ZONE)).unwrap();
    for agent in sim.agents() {
        assert!(map.is_walkable(agent.position.to_cell()), "{} is inside a wall", agent.name);
        assert!(agent.needs.hunger < 80.0);
        assert!(!agent.needs_plan());
    }
}

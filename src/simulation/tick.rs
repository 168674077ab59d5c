//! Tick system - orchestrates simulation updates
//!
//! Each tick:
//! inbox -> needs decay -> action execution -> plan requests -> calendar
//!
//! Reasoning never blocks a tick. Requests run as tasks on the Tokio runtime
//! and their results come back through the inbox, at most one per purpose
//! per agent at a time.
//!
//! Uses rayon for action execution once the population is large enough.

use std::future::Future;
use std::sync::Arc;

use ahash::{AHashMap, AHashSet};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use tokio::runtime::Handle;

use crate::core::calendar::Calendar;
use crate::core::config::SimulationConfig;
use crate::core::error::{HearthError, Result};
use crate::core::types::{AgentId, EntityRef};
use crate::entity::agent::Agent;
use crate::entity::memory::{Memory, MemoryKind};
use crate::llm::context::ConversationLine;
use crate::llm::reasoner::{Reasoner, ReplyStream};
use crate::simulation::action_execute::{advance_agent, StepOutcome};
use crate::simulation::dialogue::{
    ambient_exchange, analyze_conversation, apply_analysis, greeting, neutral_analysis, reply_stream,
};
use crate::simulation::inbox::{Inbox, InboxMessage, PendingMemory, Purpose};
use crate::simulation::memory::{record_unscored, score_importance};
use crate::simulation::planning::{request_plan, static_plan, PlanRequest};
use crate::simulation::reflection::{apply_insights, condense_day, ReflectionRequest};
use crate::spatial::tile_map::ZoneMaps;

/// How agents refer to the player in prompts
pub const PLAYER_NAME: &str = "Traveler";

/// What happened during one tick
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Day the tick started on
    pub day: u32,
    /// Set when this tick crossed a day boundary
    pub finished_day: Option<u32>,
    /// Inbox results applied
    pub applied: usize,
    pub completed: usize,
    pub unreachable: usize,
    pub static_plans: usize,
    pub plan_requests: usize,
    pub reflections: usize,
}

pub struct Simulation<R: Reasoner + 'static> {
    reasoner: Arc<R>,
    agents: Vec<Agent>,
    index: AHashMap<AgentId, usize>,
    zones: ZoneMaps,
    calendar: Calendar,
    config: SimulationConfig,
    rng: ChaCha8Rng,
    runtime: Handle,
    inbox: Inbox,
    in_flight: AHashMap<AgentId, AHashSet<Purpose>>,
    /// Day to reflect on once the agent's pending score lands
    deferred_reflections: AHashMap<AgentId, u32>,
}

impl<R: Reasoner + 'static> Simulation<R> {
    /// Must be called from inside a Tokio runtime
    pub fn new(reasoner: R, zones: ZoneMaps, config: SimulationConfig) -> Result<Self> {
        config.validate()?;
        let runtime = Handle::try_current().map_err(|e| HearthError::Runtime(e.to_string()))?;
        Ok(Self {
            reasoner: Arc::new(reasoner),
            agents: Vec::new(),
            index: AHashMap::new(),
            zones,
            calendar: Calendar::new(config.seconds_per_day),
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            config,
            runtime,
            inbox: Inbox::new(),
            in_flight: AHashMap::new(),
            deferred_reflections: AHashMap::new(),
        })
    }

    /// Add an agent. Its zone must already be loaded.
    pub fn add_agent(&mut self, agent: Agent) -> Result<AgentId> {
        if self.zones.get(&agent.zone).is_none() {
            return Err(HearthError::ZoneNotFound(agent.zone.clone()));
        }
        let id = agent.id;
        tracing::info!(agent = %agent.label(), zone = %agent.zone, "Agent joined");
        self.index.insert(id, self.agents.len());
        self.agents.push(agent);
        Ok(id)
    }

    pub fn agent(&self, id: AgentId) -> Option<&Agent> {
        self.index.get(&id).map(|&idx| &self.agents[idx])
    }

    pub fn agent_mut(&mut self, id: AgentId) -> Option<&mut Agent> {
        self.index.get(&id).map(|&idx| &mut self.agents[idx])
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn calendar(&self) -> &Calendar {
        &self.calendar
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn zones(&self) -> &ZoneMaps {
        &self.zones
    }

    pub fn is_in_flight(&self, id: AgentId, purpose: Purpose) -> bool {
        self.in_flight
            .get(&id)
            .is_some_and(|purposes| purposes.contains(&purpose))
    }

    /// Background requests not yet applied
    pub fn pending(&self) -> usize {
        self.in_flight.values().map(|purposes| purposes.len()).sum()
    }

    fn index_of(&self, id: AgentId) -> Result<usize> {
        self.index.get(&id).copied().ok_or(HearthError::AgentNotFound(id))
    }

    /// Claim `purpose` for `id`. False when one is already in flight.
    fn mark(&mut self, id: AgentId, purpose: Purpose) -> bool {
        self.in_flight.entry(id).or_default().insert(purpose)
    }

    fn clear(&mut self, id: AgentId, purpose: Purpose) -> bool {
        match self.in_flight.get_mut(&id) {
            Some(purposes) => {
                let removed = purposes.remove(&purpose);
                if purposes.is_empty() {
                    self.in_flight.remove(&id);
                }
                removed
            }
            None => false,
        }
    }

    fn spawn<F>(&self, task: F)
    where
        F: Future<Output = InboxMessage> + Send + 'static,
    {
        let tx = self.inbox.sender();
        self.runtime.spawn(async move {
            let message = task.await;
            if tx.send(message).is_err() {
                tracing::debug!("Simulation gone before result arrived");
            }
        });
    }

    /// Advance the world by `dt` seconds. `talking_to` is suspended for the
    /// whole tick.
    pub fn tick(&mut self, dt: f32, talking_to: Option<AgentId>) -> TickReport {
        let day = self.calendar.current_day();
        let mut report = TickReport {
            day,
            ..TickReport::default()
        };

        // 1. Results from background reasoning
        for message in self.inbox.drain() {
            if self.apply(message) {
                report.applied += 1;
            }
        }

        // 2. Needs
        for agent in &mut self.agents {
            agent.needs.decay(dt, &self.config);
        }

        // 3. Action execution
        let zones = &self.zones;
        let config = &self.config;
        let step = |agent: &mut Agent| {
            let suspended = talking_to == Some(agent.id);
            advance_agent(agent, zones, dt, suspended, config)
        };
        let outcomes: Vec<StepOutcome> = if self.agents.len() > config.parallel_threshold {
            self.agents.par_iter_mut().map(&step).collect()
        } else {
            self.agents.iter_mut().map(&step).collect()
        };
        for outcome in &outcomes {
            match outcome {
                StepOutcome::Completed { .. } => report.completed += 1,
                StepOutcome::Unreachable { .. } => report.unreachable += 1,
                _ => {}
            }
        }

        // 4. Plans for idle agents
        let period = self.calendar.current_time_period();
        let idle: Vec<usize> = self
            .agents
            .iter()
            .enumerate()
            .filter(|(_, agent)| talking_to != Some(agent.id) && agent.needs_plan())
            .map(|(idx, _)| idx)
            .collect();
        for idx in idle {
            let id = self.agents[idx].id;
            if self.is_in_flight(id, Purpose::Plan) {
                continue;
            }
            if day == 1 || !self.config.use_ai {
                let actions = static_plan(&self.agents[idx].role, &mut self.rng, &self.config);
                tracing::debug!(agent = %self.agents[idx].name, actions = actions.len(), "Static plan");
                self.agents[idx].set_plan(actions);
                report.static_plans += 1;
            } else {
                let request = PlanRequest::from_agent(&self.agents[idx], period);
                self.spawn_plan(id, request, day);
                report.plan_requests += 1;
            }
        }

        // 5. Calendar
        if let Some(finished) = self.calendar.advance(dt) {
            tracing::info!(day = finished, "Day ended");
            report.finished_day = Some(finished);
            report.reflections = self.begin_reflections(finished);
        }

        report
    }

    /// Apply results as they arrive until nothing is in flight
    pub async fn settle(&mut self) -> usize {
        let mut applied = 0;
        while self.pending() > 0 {
            match self.inbox.recv().await {
                Some(message) => {
                    if self.apply(message) {
                        applied += 1;
                    }
                }
                None => break,
            }
        }
        applied
    }

    fn spawn_plan(&mut self, id: AgentId, request: PlanRequest, day: u32) {
        if !self.mark(id, Purpose::Plan) {
            return;
        }
        let reasoner = Arc::clone(&self.reasoner);
        let config = self.config.clone();
        let mut rng = ChaCha8Rng::seed_from_u64(self.rng.gen());
        self.spawn(async move {
            let actions = request_plan(reasoner.as_ref(), &request, day, true, &mut rng, &config).await;
            InboxMessage::Plan { agent: id, actions }
        });
    }

    fn begin_reflections(&mut self, day: u32) -> usize {
        if !self.config.use_ai {
            return 0;
        }
        let ids: Vec<AgentId> = self.agents.iter().map(|agent| agent.id).collect();
        let mut spawned = 0;
        for id in ids {
            // A memory of the finished day may still be waiting on its score
            if self.is_in_flight(id, Purpose::MemoryScoring) {
                self.deferred_reflections.insert(id, day);
                continue;
            }
            if self.spawn_reflection(id, day) {
                spawned += 1;
            }
        }
        spawned
    }

    fn spawn_reflection(&mut self, id: AgentId, day: u32) -> bool {
        let Some(&idx) = self.index.get(&id) else {
            return false;
        };
        let Some(request) = ReflectionRequest::from_agent(&self.agents[idx], day) else {
            return false;
        };
        if !self.mark(id, Purpose::Reflection) {
            return false;
        }
        let reasoner = Arc::clone(&self.reasoner);
        let config = self.config.clone();
        self.spawn(async move {
            let insights = condense_day(reasoner.as_ref(), &request, &config).await;
            InboxMessage::Reflected { agent: id, day, insights }
        });
        true
    }

    /// Apply one result. Results nobody is waiting on are dropped.
    fn apply(&mut self, message: InboxMessage) -> bool {
        let id = message.agent();
        let purpose = message.purpose();
        if !self.clear(id, purpose) {
            tracing::debug!(agent = %id, ?purpose, "Dropping unexpected result");
            return false;
        }
        let Some(&idx) = self.index.get(&id) else {
            return false;
        };

        match message {
            InboxMessage::Plan { actions, .. } => {
                let agent = &mut self.agents[idx];
                tracing::debug!(agent = %agent.name, actions = actions.len(), "Plan received");
                agent.set_plan(actions);
            }
            InboxMessage::MemoryScored { memory, importance, .. } => {
                let agent = &mut self.agents[idx];
                tracing::debug!(agent = %agent.name, importance = importance.value(), "Memory scored");
                let scored = Memory::new(memory.text, memory.kind, memory.day, importance).with_related(memory.related);
                agent.memory.insert_at(memory.position, scored);
                if let Some(day) = self.deferred_reflections.remove(&id) {
                    self.spawn_reflection(id, day);
                }
            }
            InboxMessage::Reflected { day, insights, .. } => match insights {
                Ok(insights) => {
                    let count = apply_insights(&mut self.agents[idx], &insights, day, &self.config);
                    tracing::info!(agent = %self.agents[idx].name, day, insights = count, "Reflected on the day");
                }
                Err(e) => {
                    tracing::warn!(agent = %self.agents[idx].name, day, error = %e, "Reflection skipped");
                }
            },
            InboxMessage::ConversationAnalyzed { target, day, analysis, .. } => {
                let summary = apply_analysis(&mut self.agents[idx], target, &analysis, day);
                self.remember_at(idx, summary, MemoryKind::Dialogue, day, Some(target));
            }
        }
        true
    }

    /// Record an observation at ambient importance, no external call
    pub fn observe(&mut self, id: AgentId, text: impl Into<String>) -> Result<Memory> {
        let idx = self.index_of(id)?;
        let day = self.calendar.current_day();
        Ok(record_unscored(
            &mut self.agents[idx],
            text,
            MemoryKind::Observation,
            day,
            None,
            &self.config,
        ))
    }

    /// Record a memory, scoring it in the background when its kind calls for
    /// it. If scoring is already in flight for this agent the memory is
    /// recorded right away at ambient importance.
    ///
    /// A scored memory joins the log when its score arrives, at the position
    /// it had when `remember` was called. Only one score is in flight per
    /// agent, so that position is still exact.
    pub fn remember(
        &mut self,
        id: AgentId,
        text: impl Into<String>,
        kind: MemoryKind,
        related: Option<EntityRef>,
    ) -> Result<()> {
        let idx = self.index_of(id)?;
        let day = self.calendar.current_day();
        self.remember_at(idx, text.into(), kind, day, related);
        Ok(())
    }

    fn remember_at(&mut self, idx: usize, text: String, kind: MemoryKind, day: u32, related: Option<EntityRef>) {
        let id = self.agents[idx].id;
        let scoring = kind.is_scored() && self.config.use_ai && self.mark(id, Purpose::MemoryScoring);
        if !scoring {
            record_unscored(&mut self.agents[idx], text, kind, day, related, &self.config);
            return;
        }

        let position = self.agents[idx].memory.len();
        let reasoner = Arc::clone(&self.reasoner);
        let config = self.config.clone();
        self.spawn(async move {
            let importance = score_importance(reasoner.as_ref(), &text, &config).await;
            InboxMessage::MemoryScored {
                agent: id,
                memory: PendingMemory { position, text, kind, day, related },
                importance,
            }
        });
    }

    /// Greeting from `id`, or `None` while its interaction cooldown runs
    pub async fn begin_dialogue(&self, id: AgentId) -> Result<Option<String>> {
        let agent = &self.agents[self.index_of(id)?];
        if !agent.cooldowns.can_interact() {
            tracing::debug!(agent = %agent.name, "Still on interaction cooldown");
            return Ok(None);
        }
        Ok(Some(greeting(self.reasoner.as_ref(), agent, &self.config).await))
    }

    /// Streamed answer from `id` to the player
    pub async fn reply(&self, id: AgentId, player_input: &str, history: &[ConversationLine]) -> Result<ReplyStream> {
        let agent = &self.agents[self.index_of(id)?];
        Ok(reply_stream(
            self.reasoner.as_ref(),
            agent,
            player_input,
            history,
            PLAYER_NAME,
            &EntityRef::Player,
            &self.config,
        )
        .await)
    }

    /// Close a conversation with the player: arm the cooldown and have the
    /// agent judge how it went
    pub fn end_dialogue(&mut self, id: AgentId, history: Vec<ConversationLine>) -> Result<()> {
        let idx = self.index_of(id)?;
        let day = self.calendar.current_day();
        self.agents[idx].cooldowns.interaction = self.config.interaction_cooldown_secs;
        if history.is_empty() {
            return Ok(());
        }

        if !self.config.use_ai || !self.mark(id, Purpose::RelationshipAnalysis) {
            let summary = apply_analysis(&mut self.agents[idx], EntityRef::Player, &neutral_analysis(PLAYER_NAME), day);
            self.remember_at(idx, summary, MemoryKind::Dialogue, day, Some(EntityRef::Player));
            return Ok(());
        }

        let snapshot = self.agents[idx].clone();
        let reasoner = Arc::clone(&self.reasoner);
        let config = self.config.clone();
        self.spawn(async move {
            let analysis = analyze_conversation(reasoner.as_ref(), &snapshot, PLAYER_NAME, &history, &config).await;
            InboxMessage::ConversationAnalyzed {
                agent: id,
                target: EntityRef::Player,
                day,
                analysis,
            }
        });
        Ok(())
    }

    /// Two agents exchange a line each; both remember it as an observation
    pub async fn ambient_chat(&mut self, first: AgentId, second: AgentId) -> Result<(String, String)> {
        let (a, b) = (self.index_of(first)?, self.index_of(second)?);
        let lines = ambient_exchange(self.reasoner.as_ref(), &self.agents[a], &self.agents[b], &self.config).await;

        let day = self.calendar.current_day();
        let text = format!(
            "{} said \"{}\" and {} said \"{}\"",
            self.agents[a].name, lines.0, self.agents[b].name, lines.1
        );
        record_unscored(&mut self.agents[a], text.clone(), MemoryKind::Observation, day, Some(EntityRef::Agent(second)), &self.config);
        record_unscored(&mut self.agents[b], text, MemoryKind::Observation, day, Some(EntityRef::Agent(first)), &self.config);
        Ok(lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{Vec2, ZoneId};
    use crate::entity::agent::Personality;
    use crate::llm::reasoner::{Canned, OfflineReasoner};
    use crate::spatial::tile_map::TileMap;

    fn zones() -> ZoneMaps {
        let mut zones = ZoneMaps::new();
        zones.insert(ZoneId::new("world"), TileMap::new(50, 50));
        zones
    }

    fn villager(name: &str, role: &str) -> Agent {
        Agent::new(
            name,
            role,
            Personality::default(),
            ZoneId::new("world"),
            Vec2::new(25.0, 25.0),
            &SimulationConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_day_one_plans_statically() {
        let mut sim = Simulation::new(OfflineReasoner, zones(), SimulationConfig::default()).unwrap();
        let bob = sim.add_agent(villager("Bob", "Farmer")).unwrap();

        let report = sim.tick(0.1, None);
        assert_eq!(report.static_plans, 1);
        assert_eq!(report.plan_requests, 0);
        assert_eq!(sim.agent(bob).unwrap().plan.current_description(), "Working the fields");
    }

    #[tokio::test]
    async fn test_unknown_zone_rejected() {
        let mut sim = Simulation::new(OfflineReasoner, zones(), SimulationConfig::default()).unwrap();
        let mut lost = villager("Lost", "Farmer");
        lost.zone = ZoneId::new("nowhere");
        assert!(matches!(sim.add_agent(lost), Err(HearthError::ZoneNotFound(_))));
    }

    #[tokio::test]
    async fn test_talking_agent_is_not_planned() {
        let mut sim = Simulation::new(OfflineReasoner, zones(), SimulationConfig::default()).unwrap();
        let bob = sim.add_agent(villager("Bob", "Farmer")).unwrap();

        let report = sim.tick(0.1, Some(bob));
        assert_eq!(report.static_plans, 0);
        assert!(sim.agent(bob).unwrap().needs_plan());
    }

    #[tokio::test]
    async fn test_scoring_in_flight_records_at_ambient() {
        let mut sim = Simulation::new(Canned(r#"{"score": 9}"#), zones(), SimulationConfig::default()).unwrap();
        let alice = sim.add_agent(villager("Alice", "Baker")).unwrap();

        sim.remember(alice, "The stranger bought all my bread", MemoryKind::Dialogue, Some(EntityRef::Player))
            .unwrap();
        assert!(sim.is_in_flight(alice, Purpose::MemoryScoring));
        sim.remember(alice, "The stranger came back", MemoryKind::Dialogue, Some(EntityRef::Player))
            .unwrap();
        assert_eq!(sim.agent(alice).unwrap().memory.len(), 1);

        sim.settle().await;
        let alice = sim.agent(alice).unwrap();
        let scores: Vec<u8> = alice.memory.iter().map(|m| m.importance.value()).collect();
        assert_eq!(scores, vec![9, 2]);
        assert_eq!(alice.memory.iter().next().unwrap().text, "The stranger bought all my bread");
    }

    #[tokio::test]
    async fn test_reflection_waits_for_pending_score() {
        let reasoner = Canned(r#"{"score": 9, "insights": ["The stranger likes bread"]}"#);
        let config = SimulationConfig {
            seconds_per_day: 10.0,
            ..SimulationConfig::default()
        };
        let mut sim = Simulation::new(reasoner, zones(), config).unwrap();
        let alice = sim.add_agent(villager("Alice", "Baker")).unwrap();
        sim.tick(0.5, None);

        sim.remember(alice, "The stranger bought all my bread", MemoryKind::Dialogue, Some(EntityRef::Player))
            .unwrap();
        let mut reflections = 0;
        let mut finished = None;
        for _ in 0..2 {
            let report = sim.tick(6.0, None);
            reflections += report.reflections;
            finished = finished.or(report.finished_day);
        }
        assert_eq!(finished, Some(1));
        assert_eq!(reflections, 0);
        assert!(!sim.is_in_flight(alice, Purpose::Reflection));

        sim.settle().await;
        let alice = sim.agent(alice).unwrap();
        let texts: Vec<&str> = alice.memory.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["The stranger bought all my bread", "Reflection: The stranger likes bread"]);
        assert_eq!(alice.last_reflection_day, Some(1));
    }

    #[tokio::test]
    async fn test_end_dialogue_applies_analysis() {
        let reasoner = Canned(r#"{"trustChange": 4, "respectChange": 2, "summary": "The traveler was polite", "score": 5}"#);
        let mut sim = Simulation::new(reasoner, zones(), SimulationConfig::default()).unwrap();
        let alice = sim.add_agent(villager("Alice", "Baker")).unwrap();

        let history = vec![ConversationLine::new(PLAYER_NAME, "Good day to you")];
        sim.end_dialogue(alice, history).unwrap();
        assert!(!sim.agent(alice).unwrap().cooldowns.can_interact());
        assert_eq!(sim.begin_dialogue(alice).await.unwrap(), None);

        sim.settle().await;
        let alice = sim.agent(alice).unwrap();
        let record = alice.relationships.get(&EntityRef::Player).unwrap();
        assert_eq!(record.trust, 54);
        assert_eq!(record.respect, 52);
        let memory = alice.memory.last().unwrap();
        assert_eq!(memory.text, "The traveler was polite");
        assert_eq!(memory.importance.value(), 5);
    }

    #[tokio::test]
    async fn test_ambient_chat_remembered_by_both() {
        let mut sim = Simulation::new(OfflineReasoner, zones(), SimulationConfig::default()).unwrap();
        let bob = sim.add_agent(villager("Bob", "Farmer")).unwrap();
        let alice = sim.add_agent(villager("Alice", "Baker")).unwrap();

        let lines = sim.ambient_chat(bob, alice).await.unwrap();
        assert_eq!(lines.0, "Nice day.");
        for id in [bob, alice] {
            let memory = sim.agent(id).unwrap().memory.last().unwrap();
            assert_eq!(memory.text, "Bob said \"Nice day.\" and Alice said \"Indeed.\"");
            assert_eq!(memory.importance.value(), 2);
        }
    }
}

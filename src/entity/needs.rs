//! Needs that drive agent behavior
//!
//! Each need is a satisfaction level in `0..=100`: 100 is fully satisfied,
//! 0 is desperate. Needs fall once per configured interval and rise only
//! through `replenish`.

use serde::{Deserialize, Serialize};

use crate::core::config::SimulationConfig;

pub const NEED_MIN: f32 = 0.0;
pub const NEED_MAX: f32 = 100.0;

/// Below this a need shows up in prompts as urgent
pub const CRITICAL_THRESHOLD: f32 = 30.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Needs {
    pub hunger: f32,
    pub social: f32,
    pub energy: f32,
    /// Seconds accumulated toward the next decay interval
    #[serde(skip)]
    decay_clock: f32,
}

impl Default for Needs {
    fn default() -> Self {
        Self::from_config(&SimulationConfig::default())
    }
}

impl Needs {
    pub fn new(hunger: f32, social: f32, energy: f32) -> Self {
        Self {
            hunger: hunger.clamp(NEED_MIN, NEED_MAX),
            social: social.clamp(NEED_MIN, NEED_MAX),
            energy: energy.clamp(NEED_MIN, NEED_MAX),
            decay_clock: 0.0,
        }
    }

    pub fn from_config(config: &SimulationConfig) -> Self {
        Self::new(
            config.starting_hunger,
            config.starting_social,
            config.starting_energy,
        )
    }

    pub fn get(&self, need: NeedKind) -> f32 {
        match need {
            NeedKind::Hunger => self.hunger,
            NeedKind::Social => self.social,
            NeedKind::Energy => self.energy,
        }
    }

    fn slot(&mut self, need: NeedKind) -> &mut f32 {
        match need {
            NeedKind::Hunger => &mut self.hunger,
            NeedKind::Social => &mut self.social,
            NeedKind::Energy => &mut self.energy,
        }
    }

    /// Advance the decay clock by `dt` seconds.
    ///
    /// Applies one decay step per whole interval elapsed and returns how many
    /// steps were applied.
    pub fn decay(&mut self, dt: f32, config: &SimulationConfig) -> u32 {
        self.decay_clock += dt.max(0.0);
        let mut steps = 0;
        while self.decay_clock >= config.needs_decay_interval_secs {
            self.decay_clock -= config.needs_decay_interval_secs;
            self.adjust(NeedKind::Hunger, -config.hunger_decay);
            self.adjust(NeedKind::Social, -config.social_decay);
            self.adjust(NeedKind::Energy, -config.energy_decay);
            steps += 1;
        }
        steps
    }

    /// Raise a need (eating, talking, resting). Negative amounts are ignored.
    pub fn replenish(&mut self, need: NeedKind, amount: f32) {
        self.adjust(need, amount.max(0.0));
    }

    fn adjust(&mut self, need: NeedKind, delta: f32) {
        let slot = self.slot(need);
        *slot = (*slot + delta).clamp(NEED_MIN, NEED_MAX);
    }

    /// Needs under the critical threshold, most urgent first
    pub fn critical(&self) -> Vec<NeedKind> {
        let mut low: Vec<NeedKind> = NeedKind::ALL
            .into_iter()
            .filter(|need| self.get(*need) < CRITICAL_THRESHOLD)
            .collect();
        low.sort_by(|a, b| self.get(*a).total_cmp(&self.get(*b)));
        low
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NeedKind {
    Hunger,
    Social,
    Energy,
}

impl NeedKind {
    pub const ALL: [NeedKind; 3] = [NeedKind::Hunger, NeedKind::Social, NeedKind::Energy];
}

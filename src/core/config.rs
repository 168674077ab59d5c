//! Simulation configuration with documented constants
//!
//! Every tunable lives here. Values load from TOML; any field missing from
//! the file keeps its default.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::core::error::{HearthError, Result};

/// Largest accepted plan jitter, in tiles
pub const MAX_PLAN_JITTER: f32 = 10.0;

/// Configuration for the simulation systems
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    // === TICK ===
    /// Fixed simulation rate. The binary derives its tick `dt` from this.
    pub tick_rate_hz: f32,

    /// Agent walking speed in tiles per second
    pub move_speed: f32,

    /// Simulated seconds in one day. Crossing a multiple triggers reflection.
    pub seconds_per_day: f32,

    // === PLANNING ===
    /// Whether the reasoned planner may be used after day 1
    pub use_ai: bool,

    /// Half-width of the uniform jitter applied to plan targets (tiles)
    pub plan_jitter: f32,

    /// Duration of the fallback "Confused..." wait
    pub confused_wait_secs: f32,

    // === NEEDS ===
    pub starting_hunger: f32,
    pub starting_social: f32,
    pub starting_energy: f32,

    /// Needs decay once per this many simulated seconds
    pub needs_decay_interval_secs: f32,

    /// Points lost per interval
    pub hunger_decay: f32,
    pub social_decay: f32,
    pub energy_decay: f32,

    // === MEMORY ===
    /// Most-recent memories pulled into a retrieval context
    pub retrieval_recent: usize,

    /// Highest-importance memories pulled in on top of the recent set
    pub retrieval_important: usize,

    /// Importance assigned to memories recorded without an external score
    pub ambient_importance: u8,

    /// Importance assigned to reflection insights
    pub reflection_importance: u8,

    // === INTERACTION ===
    pub interaction_cooldown_secs: f32,
    pub portal_cooldown_secs: f32,

    // === REASONING ===
    /// Deadline for one external call. Expiry counts as a failure.
    pub reasoning_timeout_secs: f32,

    // === RUNTIME ===
    /// Seed for plan jitter
    pub seed: u64,

    /// Minimum agent count before agents are advanced with rayon
    pub parallel_threshold: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: 60.0,
            move_speed: 0.8,
            seconds_per_day: 600.0,

            use_ai: true,
            plan_jitter: 1.5,
            confused_wait_secs: 10.0,

            starting_hunger: 80.0,
            starting_social: 80.0,
            starting_energy: 100.0,
            needs_decay_interval_secs: 10.0,
            hunger_decay: 1.0,
            social_decay: 0.5,
            energy_decay: 0.5,

            retrieval_recent: 3,
            retrieval_important: 3,
            ambient_importance: 2,
            reflection_importance: 8,

            interaction_cooldown_secs: 5.0,
            portal_cooldown_secs: 1.0,

            reasoning_timeout_secs: 15.0,

            seed: 42,
            parallel_threshold: 256,
        }
    }
}

impl SimulationConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: SimulationConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Seconds simulated by one fixed tick
    pub fn tick_dt(&self) -> f32 {
        1.0 / self.tick_rate_hz
    }

    /// Deadline applied to each reasoning call. Too large to represent
    /// means no deadline.
    pub fn reasoning_timeout(&self) -> Duration {
        Duration::try_from_secs_f32(self.reasoning_timeout_secs).unwrap_or(Duration::MAX)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("tick_rate_hz", self.tick_rate_hz),
            ("move_speed", self.move_speed),
            ("seconds_per_day", self.seconds_per_day),
            ("plan_jitter", self.plan_jitter),
            ("confused_wait_secs", self.confused_wait_secs),
            ("starting_hunger", self.starting_hunger),
            ("starting_social", self.starting_social),
            ("starting_energy", self.starting_energy),
            ("needs_decay_interval_secs", self.needs_decay_interval_secs),
            ("hunger_decay", self.hunger_decay),
            ("social_decay", self.social_decay),
            ("energy_decay", self.energy_decay),
            ("interaction_cooldown_secs", self.interaction_cooldown_secs),
            ("portal_cooldown_secs", self.portal_cooldown_secs),
            ("reasoning_timeout_secs", self.reasoning_timeout_secs),
        ] {
            if !value.is_finite() {
                return Err(HearthError::Config(format!("{} must be finite, got {}", name, value)));
            }
        }
        if self.tick_rate_hz <= 0.0 || !self.tick_dt().is_finite() {
            return Err(HearthError::Config("tick_rate_hz must be positive".into()));
        }
        if self.move_speed <= 0.0 {
            return Err(HearthError::Config("move_speed must be positive".into()));
        }
        if self.seconds_per_day <= 0.0 {
            return Err(HearthError::Config("seconds_per_day must be positive".into()));
        }
        if self.needs_decay_interval_secs <= 0.0 {
            return Err(HearthError::Config(
                "needs_decay_interval_secs must be positive".into(),
            ));
        }
        if self.hunger_decay < 0.0 || self.social_decay < 0.0 || self.energy_decay < 0.0 {
            return Err(HearthError::Config("Decay rates must not be negative".into()));
        }
        for (name, value) in [
            ("starting_hunger", self.starting_hunger),
            ("starting_social", self.starting_social),
            ("starting_energy", self.starting_energy),
        ] {
            if !(0.0..=100.0).contains(&value) {
                return Err(HearthError::Config(format!(
                    "{} ({}) must be within 0..=100",
                    name, value
                )));
            }
        }
        for (name, value) in [
            ("ambient_importance", self.ambient_importance),
            ("reflection_importance", self.reflection_importance),
        ] {
            if !(1..=10).contains(&value) {
                return Err(HearthError::Config(format!(
                    "{} ({}) must be within 1..=10",
                    name, value
                )));
            }
        }
        if !(0.0..=MAX_PLAN_JITTER).contains(&self.plan_jitter) {
            return Err(HearthError::Config(format!(
                "plan_jitter ({}) must be within 0..={}",
                self.plan_jitter, MAX_PLAN_JITTER
            )));
        }
        if self.reasoning_timeout_secs <= 0.0 {
            return Err(HearthError::Config(
                "reasoning_timeout_secs must be positive".into(),
            ));
        }
        Ok(())
    }
}

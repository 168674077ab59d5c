//! Relationships an agent holds toward other entities
//!
//! Records are created lazily on first reference and never removed.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::core::types::EntityRef;

pub const RELATIONSHIP_MIN: i32 = 0;
pub const RELATIONSHIP_MAX: i32 = 100;

/// Largest change a single interaction may apply to trust or respect
pub const MAX_DELTA: i32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    pub trust: i32,
    pub respect: i32,
    pub romance: i32,
    pub last_interaction_day: Option<u32>,
}

impl Default for Relationship {
    fn default() -> Self {
        Self {
            trust: 50,
            respect: 50,
            romance: 0,
            last_interaction_day: None,
        }
    }
}

impl Relationship {
    /// Apply an interaction outcome. Deltas are bounded to `±MAX_DELTA`.
    pub fn apply(&mut self, trust_delta: i32, respect_delta: i32, day: u32) {
        self.trust = bounded_add(self.trust, trust_delta);
        self.respect = bounded_add(self.respect, respect_delta);
        self.last_interaction_day = Some(day);
    }
}

fn bounded_add(value: i32, delta: i32) -> i32 {
    let delta = delta.clamp(-MAX_DELTA, MAX_DELTA);
    (value + delta).clamp(RELATIONSHIP_MIN, RELATIONSHIP_MAX)
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Relationships {
    records: AHashMap<EntityRef, Relationship>,
}

impl Relationships {
    pub fn new() -> Self {
        Self::default()
    }

    /// Existing record, without creating one
    pub fn get(&self, target: &EntityRef) -> Option<&Relationship> {
        self.records.get(target)
    }

    /// Record for `target`, created with neutral defaults if absent
    pub fn entry(&mut self, target: EntityRef) -> &mut Relationship {
        self.records.entry(target).or_default()
    }

    /// Current view of `target`; neutral defaults when never met
    pub fn view(&self, target: &EntityRef) -> Relationship {
        self.get(target).copied().unwrap_or_default()
    }

    pub fn update(&mut self, target: EntityRef, trust_delta: i32, respect_delta: i32, day: u32) {
        self.entry(target).apply(trust_delta, respect_delta, day);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

//! Per-agent memory log with importance-weighted retrieval
//!
//! Memories are immutable once recorded and kept in creation order. Retrieval
//! mixes the most recent entries with the most important older ones so a
//! prompt sees both continuity and salience without ranking the whole log.

use serde::{Deserialize, Serialize};

use crate::core::types::EntityRef;

/// Importance score in `1..=10`: 1 is routine, 10 is life-changing
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Importance(u8);

impl Importance {
    pub const MIN: Importance = Importance(1);
    pub const MAX: Importance = Importance(10);

    /// Clamp any integer into range
    pub fn new(score: i64) -> Self {
        Self(score.clamp(1, 10) as u8)
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

impl Default for Importance {
    fn default() -> Self {
        Self::MIN
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemoryKind {
    Observation,
    Dialogue,
    Reflection,
}

impl MemoryKind {
    /// Only dialogue is worth an external importance call. Observations are
    /// too frequent and reflections carry a fixed importance.
    pub fn is_scored(&self) -> bool {
        matches!(self, MemoryKind::Dialogue)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Memory {
    pub text: String,
    /// Simulated day the memory was recorded
    pub day: u32,
    pub importance: Importance,
    pub kind: MemoryKind,
    pub related: Option<EntityRef>,
}

impl Memory {
    pub fn new(text: impl Into<String>, kind: MemoryKind, day: u32, importance: Importance) -> Self {
        Self {
            text: text.into(),
            day,
            importance,
            kind,
            related: None,
        }
    }

    pub fn with_related(mut self, related: Option<EntityRef>) -> Self {
        self.related = related;
        self
    }
}

/// Memory log in creation order. Entries are never edited or removed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryLog {
    entries: Vec<Memory>,
}

impl MemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, memory: Memory) {
        self.entries.push(memory);
    }

    /// Put a memory back where it was created. Used for memories whose
    /// importance arrived after later ones were logged; `position` past the
    /// end appends.
    pub fn insert_at(&mut self, position: usize, memory: Memory) {
        let position = position.min(self.entries.len());
        self.entries.insert(position, memory);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Memory> {
        self.entries.iter()
    }

    pub fn last(&self) -> Option<&Memory> {
        self.entries.last()
    }

    /// Non-reflection memories recorded on `day`, in creation order
    pub fn raw_for_day(&self, day: u32) -> Vec<&Memory> {
        self.entries
            .iter()
            .filter(|m| m.day == day && m.kind != MemoryKind::Reflection)
            .collect()
    }

    /// Select up to `recent + important` memories, in chronological order.
    ///
    /// - `recent` newest by day, later insertion first on ties
    /// - `important` highest importance among the rest, newer first on ties
    pub fn retrieve(&self, recent: usize, important: usize) -> Vec<&Memory> {
        // Newest first: larger day, then larger insertion index
        let mut by_recency: Vec<usize> = (0..self.entries.len()).collect();
        by_recency.sort_by(|&a, &b| {
            self.entries[b]
                .day
                .cmp(&self.entries[a].day)
                .then_with(|| b.cmp(&a))
        });
        let (recent_set, rest) = by_recency.split_at(recent.min(by_recency.len()));

        // `rest` is already newest first, so a stable sort by importance keeps
        // recency as the tie-break
        let mut by_importance = rest.to_vec();
        by_importance.sort_by(|&a, &b| self.entries[b].importance.cmp(&self.entries[a].importance));
        by_importance.truncate(important);

        let mut selected: Vec<usize> = recent_set.iter().copied().chain(by_importance).collect();
        selected.sort_by(|&a, &b| self.entries[a].day.cmp(&self.entries[b].day).then_with(|| a.cmp(&b)));
        selected.into_iter().map(|i| &self.entries[i]).collect()
    }

    /// Retrieval rendered for a prompt
    pub fn context_string(&self, recent: usize, important: usize) -> String {
        if self.entries.is_empty() {
            return "No memories yet.".to_string();
        }
        let lines: Vec<String> = self
            .retrieve(recent, important)
            .into_iter()
            .map(|m| format!("[Day {}] (Imp: {}) {}", m.day, m.importance.value(), m.text))
            .collect();
        format!("MEMORIES:\n{}", lines.join("\n"))
    }
}

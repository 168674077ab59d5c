//! Plans: ordered action queues with a cursor

use serde::{Deserialize, Serialize};

use crate::core::types::Vec2;

/// One plan step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Action {
    Move { target: Vec2, description: String },
    Wait { duration: f32, description: String },
}

impl Action {
    pub fn move_to(target: Vec2, description: impl Into<String>) -> Self {
        Action::Move {
            target,
            description: description.into(),
        }
    }

    pub fn wait(duration: f32, description: impl Into<String>) -> Self {
        Action::Wait {
            duration,
            description: description.into(),
        }
    }

    pub fn description(&self) -> &str {
        match self {
            Action::Move { description, .. } | Action::Wait { description, .. } => description,
        }
    }
}

/// Finite action sequence. The cursor only moves forward and resets to 0
/// when the plan is replaced.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Plan {
    actions: Vec<Action>,
    cursor: usize,
}

impl Plan {
    pub fn new(actions: Vec<Action>) -> Self {
        Self { actions, cursor: 0 }
    }

    pub fn current(&self) -> Option<&Action> {
        self.actions.get(self.cursor)
    }

    /// Step past the current action. Never moves beyond `len()`.
    pub fn advance(&mut self) {
        if self.cursor < self.actions.len() {
            self.cursor += 1;
        }
    }

    /// Empty plans count as exhausted
    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.actions.len()
    }

    /// Swap in a new plan wholesale
    pub fn replace(&mut self, actions: Vec<Action>) {
        self.actions = actions;
        self.cursor = 0;
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    /// Description of the action in progress, for status lines and prompts
    pub fn current_description(&self) -> &str {
        self.current().map(Action::description).unwrap_or("Idle")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_advances_to_len_and_stops() {
        let mut plan = Plan::new(vec![
            Action::wait(1.0, "a"),
            Action::move_to(Vec2::new(1.0, 1.0), "b"),
        ]);
        assert_eq!(plan.current_description(), "a");
        plan.advance();
        assert_eq!(plan.current_description(), "b");
        assert!(!plan.is_exhausted());
        plan.advance();
        assert!(plan.is_exhausted());
        plan.advance();
        assert_eq!(plan.cursor(), 2);
        assert!(plan.current().is_none());
    }

    #[test]
    fn test_replace_resets_cursor() {
        let mut plan = Plan::new(vec![Action::wait(1.0, "a")]);
        plan.advance();
        plan.replace(vec![Action::wait(2.0, "b"), Action::wait(3.0, "c")]);
        assert_eq!(plan.cursor(), 0);
        assert_eq!(plan.len(), 2);
    }

    #[test]
    fn test_empty_plan_is_exhausted() {
        let plan = Plan::default();
        assert!(plan.is_exhausted());
        assert_eq!(plan.current_description(), "Idle");
    }
}

pub mod action_execute;
pub mod dialogue;
pub mod inbox;
pub mod memory;
pub mod planning;
pub mod reflection;
pub mod tick;

pub use action_execute::{advance_agent, StepOutcome};
pub use inbox::{Inbox, InboxMessage, Purpose};
pub use memory::{record_memory, record_unscored, score_importance};
pub use planning::{request_plan, static_plan, PlanRequest};
pub use reflection::reflect;
pub use tick::{Simulation, TickReport};

pub mod agent;
pub mod memory;
pub mod needs;
pub mod plan;
pub mod relationships;

pub use agent::{Agent, Cooldowns, ExecutionState, Personality, RetrievalWindow};
pub use memory::{Importance, Memory, MemoryKind, MemoryLog};
pub use needs::{NeedKind, Needs};
pub use plan::{Action, Plan};
pub use relationships::{Relationship, Relationships};

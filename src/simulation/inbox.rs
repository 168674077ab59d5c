//! Results of background reasoning, delivered back to the tick loop
//!
//! Spawned tasks never touch an agent. They post an `InboxMessage` and the
//! next tick applies it on the simulation side.

use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver, UnboundedSender};

use crate::core::types::{AgentId, EntityRef};
use crate::entity::memory::{Importance, MemoryKind};
use crate::entity::plan::Action;
use crate::llm::parser::SocialAnalysis;
use crate::llm::reasoner::ReasoningError;

/// Kind of background request. At most one of each is in flight per agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Purpose {
    Plan,
    MemoryScoring,
    Reflection,
    RelationshipAnalysis,
}

/// A memory waiting on its importance score
#[derive(Debug, Clone, PartialEq)]
pub struct PendingMemory {
    /// Log length when the memory was made, so it lands in creation order
    pub position: usize,
    pub text: String,
    pub kind: MemoryKind,
    pub day: u32,
    pub related: Option<EntityRef>,
}

#[derive(Debug)]
pub enum InboxMessage {
    Plan {
        agent: AgentId,
        actions: Vec<Action>,
    },
    MemoryScored {
        agent: AgentId,
        memory: PendingMemory,
        importance: Importance,
    },
    Reflected {
        agent: AgentId,
        day: u32,
        insights: Result<Vec<String>, ReasoningError>,
    },
    ConversationAnalyzed {
        agent: AgentId,
        target: EntityRef,
        day: u32,
        analysis: SocialAnalysis,
    },
}

impl InboxMessage {
    pub fn agent(&self) -> AgentId {
        match self {
            InboxMessage::Plan { agent, .. }
            | InboxMessage::MemoryScored { agent, .. }
            | InboxMessage::Reflected { agent, .. }
            | InboxMessage::ConversationAnalyzed { agent, .. } => *agent,
        }
    }

    pub fn purpose(&self) -> Purpose {
        match self {
            InboxMessage::Plan { .. } => Purpose::Plan,
            InboxMessage::MemoryScored { .. } => Purpose::MemoryScoring,
            InboxMessage::Reflected { .. } => Purpose::Reflection,
            InboxMessage::ConversationAnalyzed { .. } => Purpose::RelationshipAnalysis,
        }
    }
}

/// Unbounded channel owned by the simulation; senders go to spawned tasks
pub struct Inbox {
    tx: UnboundedSender<InboxMessage>,
    rx: UnboundedReceiver<InboxMessage>,
}

impl Default for Inbox {
    fn default() -> Self {
        Self::new()
    }
}

impl Inbox {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { tx, rx }
    }

    pub fn sender(&self) -> UnboundedSender<InboxMessage> {
        self.tx.clone()
    }

    /// Everything delivered so far, without waiting
    pub fn drain(&mut self) -> Vec<InboxMessage> {
        let mut messages = Vec::new();
        loop {
            match self.rx.try_recv() {
                Ok(message) => messages.push(message),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        messages
    }

    /// Wait for the next message
    pub async fn recv(&mut self) -> Option<InboxMessage> {
        self.rx.recv().await
    }
}

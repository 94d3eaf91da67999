//! Agent events — progress notifications for front ends.
//!
//! The loop publishes one event per classification so that a front end can
//! render thoughts, tool invocations, errors and answers as they happen
//! without being coupled to the loop itself.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Everything the loop reports while a run is in progress.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentEvent {
    /// A run started with the given user input.
    RunStarted { input: String },

    /// The planning fields of a parsed reply.
    Thought {
        state_analysis: Option<String>,
        progress_evaluation: Option<String>,
        challenges: Option<String>,
        next_steps: Vec<String>,
        reasoning: Option<String>,
    },

    /// The model asked for a tool.
    ToolInvoked { name: String, arg: String },

    /// A tool (or the unknown-tool fallback) produced an observation.
    ToolOutput { name: String, output: String },

    /// The reply was not a JSON object; a correction was queued.
    InvalidJson { raw: String },

    /// The reply carried only planning fields; a nudge was queued.
    PlanOnly,

    /// The reply parsed but matched no known action shape.
    Unrecognized { payload: String },

    /// The model produced its final answer.
    Answer { text: String },

    /// The turn budget ran out before an answer.
    BudgetExhausted { turns: u32 },
}

impl AgentEvent {
    /// Short event name, used in logs.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::RunStarted { .. } => "run_started",
            Self::Thought { .. } => "thought",
            Self::ToolInvoked { .. } => "tool_invoked",
            Self::ToolOutput { .. } => "tool_output",
            Self::InvalidJson { .. } => "invalid_json",
            Self::PlanOnly => "plan_only",
            Self::Unrecognized { .. } => "unrecognized",
            Self::Answer { .. } => "answer",
            Self::BudgetExhausted { .. } => "budget_exhausted",
        }
    }
}

/// A broadcast-based event bus for agent events.
///
/// Uses `tokio::sync::broadcast` for multi-consumer pub/sub.
pub struct EventBus {
    sender: broadcast::Sender<Arc<AgentEvent>>,
}

impl EventBus {
    /// Create a new event bus with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all subscribers.
    pub fn publish(&self, event: AgentEvent) {
        // No subscribers is fine
        let _ = self.sender.send(Arc::new(event));
    }

    /// Subscribe to receive events.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<AgentEvent>> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

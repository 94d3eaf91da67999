//! The planning agent — the heart of RustedMind.
//!
//! The agent follows a **Plan → Act → Observe** cycle:
//!
//! 1. **Build context** (instructions + tool manifest + history + environment snapshot)
//! 2. **Send to LLM** via the configured provider
//! 3. **Interpret** the reply as a tool call, final answer, plan or garbage
//! 4. **If tool call**: execute it, append the observation, loop back to step 1
//! 5. **If answer**: return it to the caller
//!
//! The loop continues until an answer arrives, a reply cannot be acted on,
//! or the turn budget is spent.

pub mod context;
pub mod environment;
pub mod interpreter;
pub mod loop_runner;
pub mod report;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use context::{ContextBuilder, PLANNING_INSTRUCTIONS};
pub use environment::{DirectoryProbe, EnvironmentProbe, EnvironmentSnapshot};
pub use interpreter::{Interpretation, Plan, StructuredResponse, interpret};
pub use loop_runner::{
    AgentSettings, CONTINUE_SENTINEL, MALFORMED_CORRECTION, PLAN_ONLY_NUDGE, ReasoningAgent,
    RunOutcome,
};
pub use report::MarkdownReport;

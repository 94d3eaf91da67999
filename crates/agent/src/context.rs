//! Context assembly — the exact message sequence sent to the model.
//!
//! Every turn's context has the same shape:
//!
//! 1. planning instructions (system)
//! 2. tool manifest (system)
//! 3. the whole conversation history, in append order
//! 4. the environment snapshot (assistant, `[filesystem]`-tagged)
//! 5. the pending user message

use crate::environment::EnvironmentSnapshot;
use rustedmind_core::message::{ConversationHistory, Message};
use rustedmind_core::tool::ToolManifest;

/// Built-in instructions for the planning agent.
pub const PLANNING_INSTRUCTIONS: &str = r#"You are a planning agent that breaks tasks down into small steps and reasons about the current state.
On every turn:
1. Analyze the current state and the conversation so far.
2. Evaluate progress towards the overall goal.
3. Identify challenges or roadblocks.
4. Decide the next concrete action.

Always reply with a single JSON object and nothing else.

While the task is not complete, include the next tool to run in `tool` and its argument in `arg`, alongside your planning fields.

Example (a tool needs to run):
{
    "state_analysis": "I need to read the contents of three files.",
    "progress_evaluation": "10% - just starting, need to read the first file.",
    "challenges": "The files might not exist.",
    "next_steps": ["Read poem1.txt", "Read poem2.txt", "Read poem3.txt", "Combine content", "Count words"],
    "reasoning": "Reading the first file makes progress on the task.",
    "tool": "fs_read",
    "arg": "poem1.txt"
}

When the task is complete and no more tools are needed, put the final answer in `answer`.

Example (the task is complete):
{
    "state_analysis": "All files have been read and the words counted.",
    "progress_evaluation": "100% - the task is complete.",
    "challenges": "None.",
    "next_steps": [],
    "reasoning": "The final word count is known.",
    "answer": "The total word count is 42."
}"#;

/// Assembles the per-turn context.
#[derive(Debug, Clone)]
pub struct ContextBuilder {
    instructions: String,
    manifest: String,
}

impl ContextBuilder {
    /// Create a builder with the built-in instructions.
    pub fn new(manifest: &ToolManifest) -> Self {
        Self {
            instructions: PLANNING_INSTRUCTIONS.to_string(),
            manifest: format!("TOOL MANIFEST:\n{}", manifest.to_json_pretty()),
        }
    }

    /// Replace the planning instructions.
    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = instructions.into();
        self
    }

    pub fn instructions(&self) -> &str {
        &self.instructions
    }

    /// Build the full context for one turn.
    pub fn build(
        &self,
        history: &ConversationHistory,
        snapshot: &EnvironmentSnapshot,
        pending: &str,
    ) -> Vec<Message> {
        let mut context = Vec::with_capacity(history.len() + 4);
        context.push(Message::system(self.instructions.clone()));
        context.push(Message::system(self.manifest.clone()));
        context.extend(history.messages().iter().cloned());
        context.push(snapshot.to_message());
        context.push(Message::user(pending));
        context
    }
}

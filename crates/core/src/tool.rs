//! Tool trait — the abstraction over agent capabilities.
//!
//! Tools are what give the agent the ability to act in the world:
//! execute shell commands, read/write files, search the web, etc.
//! Every tool takes a single text argument and produces a single text
//! observation. Failures never cross the registry boundary: they are turned
//! into error-prefixed observations the model can read and react to.

use crate::error::ToolError;
use async_trait::async_trait;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::time::Instant;
use tracing::{debug, warn};

/// The core Tool trait.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g., "shell", "fs_read").
    fn name(&self) -> &str;

    /// A one-line description of what this tool does (sent to the LLM).
    fn description(&self) -> &str;

    /// Label used in the `[<label> error]` prefix of failed observations.
    fn error_label(&self) -> &str {
        self.name()
    }

    /// Execute the tool with the given argument.
    async fn execute(&self, argument: &str) -> std::result::Result<String, ToolError>;
}

/// Tool name → one-line description, as shown to the model every turn.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ToolManifest(BTreeMap<String, String>);

impl ToolManifest {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Pretty-printed JSON object, sorted by tool name.
    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(&self.0).unwrap_or_else(|_| "{}".into())
    }
}

/// A registry of available tools.
///
/// The agent loop uses this to:
/// 1. Build the tool manifest sent to the LLM
/// 2. Look up and execute tools when the LLM requests them
pub struct ToolRegistry {
    tools: HashMap<String, Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a tool. Replaces any existing tool with the same name.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        let name = tool.name().to_string();
        self.tools.insert(name, tool);
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(|t| t.as_ref())
    }

    /// Snapshot of every registered tool's description.
    pub fn manifest(&self) -> ToolManifest {
        ToolManifest(
            self.tools
                .iter()
                .map(|(name, tool)| (name.clone(), tool.description().to_string()))
                .collect(),
        )
    }

    /// Run the named tool and return its observation.
    ///
    /// Unknown names yield `[error] Unknown tool: <name>`; tool failures
    /// yield `[<label> error] <message>`. This never fails.
    pub async fn dispatch(&self, name: &str, argument: &str) -> String {
        let Some(tool) = self.tools.get(name) else {
            warn!(tool = %name, "Model requested an unknown tool");
            return format!("[error] Unknown tool: {name}");
        };

        let start = Instant::now();
        let result = tool.execute(argument).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(output) => {
                debug!(tool = %name, duration_ms, "Tool completed");
                output
            }
            Err(e) => {
                warn!(tool = %name, duration_ms, error = %e, "Tool failed");
                format!("[{} error] {e}", tool.error_label())
            }
        }
    }

    /// List all registered tool names.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

//! # RustedMind Core
//!
//! Domain types, traits, and error definitions for the RustedMind planning
//! agent. Every collaborator of the orchestration loop is defined here as a
//! trait so that implementations can be swapped or stubbed in tests:
//!
//! - [`Provider`]: the language model
//! - [`Tool`] / [`ToolRegistry`]: the capabilities the model may invoke
//! - [`ActivityLog`]: the append-only audit trail of every turn
//! - [`EventBus`]: progress notifications for front ends

pub mod activity;
pub mod error;
pub mod event;
pub mod message;
pub mod provider;
pub mod token;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use activity::{ActivityLog, NoopActivityLog, TurnEntry};
pub use error::{AgentError, Error, ProviderError, ReportError, Result, ToolError};
pub use event::{AgentEvent, EventBus};
pub use message::{ConversationHistory, Message, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse, Usage};
pub use tool::{Tool, ToolManifest, ToolRegistry};

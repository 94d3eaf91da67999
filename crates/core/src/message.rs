//! Message and conversation history domain types.
//!
//! These are the value objects that flow through the whole loop:
//! the context builder projects them into a model request, the loop appends
//! them to history, and the report writer renders them.

use serde::{Deserialize, Serialize};

/// Literal prefixes that mark a message as environment data or a tool result
/// rather than ordinary conversation. The report renderer keys off these.
pub mod tags {
    /// Prefix of a history record holding a tool's observation.
    pub const TOOL_RESULT: &str = "[tool_result]";
    /// Prefix of the per-turn environment message (directory listing).
    pub const FILESYSTEM: &str = "[filesystem]";
    /// Section inside the environment message holding the last tool output.
    pub const SHELL_OUTPUT: &str = "[shell_output]";
}

/// The role of a message sender in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Fixed instructions and the tool manifest
    System,
    /// The end user, or the loop speaking on the user's behalf
    User,
    /// The model, plus tagged environment and tool-result records
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single message in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Who sent this message
    pub role: Role,

    /// The text content
    pub content: String,
}

impl Message {
    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create a new assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    /// Create a new system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// Create a tagged tool-result record.
    pub fn tool_result(output: &str) -> Self {
        Self::assistant(format!("{}\n{}", tags::TOOL_RESULT, output))
    }

    /// Whether the content starts with the given segment tag.
    pub fn is_tagged(&self, tag: &str) -> bool {
        self.content.starts_with(tag)
    }
}

/// The append-only record of everything that happened across turns.
///
/// Records are never removed, replaced or reordered; the only mutation is
/// [`ConversationHistory::push`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConversationHistory {
    records: Vec<Message>,
}

impl ConversationHistory {
    /// Create an empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record.
    pub fn push(&mut self, message: Message) {
        self.records.push(message);
    }

    /// All records, in append order.
    pub fn messages(&self) -> &[Message] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The most recently appended record.
    pub fn last(&self) -> Option<&Message> {
        self.records.last()
    }
}

//! Response interpretation — classify one raw model reply.
//!
//! A reply is expected to be a single JSON object. Planning fields are
//! carried along for display only; the action is decided by `tool`,
//! `answer` and `state_analysis`, in that order.

use serde::Serialize;
use serde_json::{Map, Value};

/// Planning fields of a reply. Never actioned.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Plan {
    pub state_analysis: Option<String>,
    pub progress_evaluation: Option<String>,
    pub challenges: Option<String>,
    pub next_steps: Vec<String>,
    pub reasoning: Option<String>,
}

impl Plan {
    pub fn is_empty(&self) -> bool {
        self.state_analysis.is_none()
            && self.progress_evaluation.is_none()
            && self.challenges.is_none()
            && self.next_steps.is_empty()
            && self.reasoning.is_none()
    }
}

/// The parsed form of one model reply.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StructuredResponse {
    #[serde(flatten)]
    pub plan: Plan,
    pub tool: Option<String>,
    pub arg: Option<String>,
    pub answer: Option<String>,
}

impl StructuredResponse {
    /// Read the known fields out of a JSON object, ignoring the rest.
    ///
    /// Non-string scalars are kept in their JSON text form so a reply like
    /// `"answer": 42` is not lost. `tool` is the exception: only a string
    /// names a tool.
    pub fn from_object(object: &Map<String, Value>) -> Self {
        Self {
            plan: Plan {
                state_analysis: text_field(object, "state_analysis"),
                progress_evaluation: text_field(object, "progress_evaluation"),
                challenges: text_field(object, "challenges"),
                next_steps: steps_field(object),
                reasoning: text_field(object, "reasoning"),
            },
            tool: string_field(object, "tool"),
            arg: text_field(object, "arg"),
            answer: text_field(object, "answer"),
        }
    }
}

/// What the loop should do with a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interpretation {
    ToolCall { name: String, arg: String, plan: Plan },
    FinalAnswer { text: String, plan: Plan },
    PlanOnly { plan: Plan },
    /// Valid JSON object with none of the actionable fields.
    Unrecognized { payload: String },
    /// Not a JSON object at all.
    Malformed { raw: String },
}

impl Interpretation {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ToolCall { .. } => "tool_call",
            Self::FinalAnswer { .. } => "final_answer",
            Self::PlanOnly { .. } => "plan_only",
            Self::Unrecognized { .. } => "unrecognized",
            Self::Malformed { .. } => "malformed",
        }
    }

    /// Planning fields, if the reply carried any.
    pub fn plan(&self) -> Option<&Plan> {
        match self {
            Self::ToolCall { plan, .. } | Self::FinalAnswer { plan, .. } | Self::PlanOnly { plan } => {
                Some(plan)
            }
            Self::Unrecognized { .. } | Self::Malformed { .. } => None,
        }
    }
}

/// Parse and classify a raw reply. Never fails.
pub fn interpret(raw: &str) -> Interpretation {
    let object = match serde_json::from_str::<Value>(raw.trim()) {
        Ok(Value::Object(object)) => object,
        _ => {
            return Interpretation::Malformed {
                raw: raw.to_string(),
            };
        }
    };

    let response = StructuredResponse::from_object(&object);
    let StructuredResponse {
        plan,
        tool,
        arg,
        answer,
    } = response;

    if let Some(name) = tool.filter(|t| !t.trim().is_empty()) {
        return Interpretation::ToolCall {
            name: name.trim().to_string(),
            arg: arg.unwrap_or_default(),
            plan,
        };
    }

    if let Some(text) = answer.filter(|a| !a.is_empty()) {
        return Interpretation::FinalAnswer { text, plan };
    }

    if object.contains_key("state_analysis") {
        return Interpretation::PlanOnly { plan };
    }

    Interpretation::Unrecognized {
        payload: Value::Object(object).to_string(),
    }
}

fn text_field(object: &Map<String, Value>, key: &str) -> Option<String> {
    match object.get(key)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn string_field(object: &Map<String, Value>, key: &str) -> Option<String> {
    match object.get(key)? {
        Value::String(s) => Some(s.clone()),
        _ => None,
    }
}

fn steps_field(object: &Map<String, Value>) -> Vec<String> {
    match object.get("next_steps") {
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect(),
        Some(Value::String(s)) if !s.is_empty() => vec![s.clone()],
        _ => Vec::new(),
    }
}

//! Shared test doubles for the agent crate.

use crate::environment::EnvironmentProbe;
use async_trait::async_trait;
use rustedmind_core::activity::{ActivityLog, TurnEntry};
use rustedmind_core::error::{ProviderError, ReportError, ToolError};
use rustedmind_core::message::Message;
use rustedmind_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use rustedmind_core::tool::Tool;
use std::sync::{Arc, Mutex};

/// A mock provider that returns a sequence of scripted replies.
///
/// Each call to `complete` returns the next reply in the queue and records
/// the request. Panics if more calls are made than replies provided.
pub struct SequentialMockProvider {
    responses: Vec<String>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl SequentialMockProvider {
    pub fn new<S: Into<String>>(responses: impl IntoIterator<Item = S>) -> Self {
        Self {
            responses: responses.into_iter().map(Into::into).collect(),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// The context submitted on call `n` (0-based).
    pub fn context(&self, n: usize) -> Vec<Message> {
        self.requests.lock().unwrap()[n].messages.clone()
    }
}

#[async_trait]
impl Provider for SequentialMockProvider {
    fn name(&self) -> &str {
        "sequential_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let mut requests = self.requests.lock().unwrap();
        let count = requests.len();
        if count >= self.responses.len() {
            panic!(
                "SequentialMockProvider: no more responses (call #{count}, have {})",
                self.responses.len()
            );
        }
        requests.push(request);
        Ok(make_response(&self.responses[count]))
    }
}

/// A provider whose every call fails.
pub struct FailingProvider;

#[async_trait]
impl Provider for FailingProvider {
    fn name(&self) -> &str {
        "failing"
    }

    async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        Err(ProviderError::Network("connection refused".into()))
    }
}

pub fn make_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        content: text.to_string(),
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: "mock-model".into(),
    }
}

/// One recorded turn, owned.
#[derive(Debug, Clone)]
pub struct RecordedTurn {
    pub turn_index: u64,
    pub context_tokens: usize,
    pub context_diff: Vec<Message>,
    pub raw_answer: String,
}

/// Activity log that keeps everything in shared memory.
#[derive(Clone, Default)]
pub struct RecordingLog {
    pub runs: Arc<Mutex<Vec<String>>>,
    pub turns: Arc<Mutex<Vec<RecordedTurn>>>,
}

impl ActivityLog for RecordingLog {
    fn begin_run(&mut self, user_input: &str) -> Result<(), ReportError> {
        self.runs.lock().unwrap().push(user_input.to_string());
        Ok(())
    }

    fn record(&mut self, entry: &TurnEntry<'_>) -> Result<(), ReportError> {
        self.turns.lock().unwrap().push(RecordedTurn {
            turn_index: entry.turn_index,
            context_tokens: entry.context_tokens,
            context_diff: entry.context_diff.to_vec(),
            raw_answer: entry.raw_answer.to_string(),
        });
        Ok(())
    }
}

/// Activity log that always fails to write.
pub struct BrokenLog;

impl ActivityLog for BrokenLog {
    fn record(&mut self, _entry: &TurnEntry<'_>) -> Result<(), ReportError> {
        Err(ReportError::Io {
            path: "/nowhere/report.md".into(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        })
    }
}

/// Probe returning a fixed listing.
pub struct FixedProbe(pub &'static str);

impl EnvironmentProbe for FixedProbe {
    fn directory_listing(&self) -> String {
        self.0.to_string()
    }
}

/// A tool that only has a name.
pub struct NamedTool(pub &'static str);

#[async_trait]
impl Tool for NamedTool {
    fn name(&self) -> &str {
        self.0
    }
    fn description(&self) -> &str {
        "Test tool"
    }
    async fn execute(&self, argument: &str) -> Result<String, ToolError> {
        Ok(argument.to_string())
    }
}

/// Records every argument it is called with and answers `<name>(<arg>)`.
pub struct RecordingTool {
    pub name: &'static str,
    pub calls: Arc<Mutex<Vec<String>>>,
}

impl RecordingTool {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

#[async_trait]
impl Tool for RecordingTool {
    fn name(&self) -> &str {
        self.name
    }
    fn description(&self) -> &str {
        "Records its calls"
    }
    async fn execute(&self, argument: &str) -> Result<String, ToolError> {
        self.calls.lock().unwrap().push(argument.to_string());
        Ok(format!("{}({argument})", self.name))
    }
}

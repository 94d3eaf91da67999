//! The orchestration loop — one run is a bounded sequence of turns.
//!
//! Each turn builds the context, calls the model once, classifies the reply
//! and acts on it: dispatch a tool, finish with an answer, or queue a
//! correction/nudge and go around again. Everything the loop learns is
//! appended to the conversation history before the next context is built.

use crate::context::ContextBuilder;
use crate::environment::{DirectoryProbe, EnvironmentProbe, EnvironmentSnapshot};
use crate::interpreter::{Interpretation, Plan, interpret};
use rustedmind_config::AppConfig;
use rustedmind_core::activity::{ActivityLog, NoopActivityLog, TurnEntry};
use rustedmind_core::error::{AgentError, Result};
use rustedmind_core::event::{AgentEvent, EventBus};
use rustedmind_core::message::{ConversationHistory, Message};
use rustedmind_core::provider::{Provider, ProviderRequest};
use rustedmind_core::token::estimate_messages_tokens;
use rustedmind_core::tool::ToolRegistry;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Pending user message when there is no new human input.
pub const CONTINUE_SENTINEL: &str = "(continue)";

/// Queued after a reply that is not a JSON object.
pub const MALFORMED_CORRECTION: &str = "Your last response was not valid JSON. Please correct it.";

/// Queued after a reply that only carries planning fields.
pub const PLAN_ONLY_NUDGE: &str =
    "Your plan is noted. Please provide a `tool` to execute next or a final `answer`.";

/// Loop settings, resolved once at startup.
#[derive(Debug, Clone)]
pub struct AgentSettings {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    pub max_turns: u32,
    /// Replaces the built-in planning instructions when set.
    pub instructions: Option<String>,
    pub snapshot_limit: usize,
}

impl AgentSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            max_turns: config.agent.max_turns,
            instructions: config.agent.system_prompt_override.clone(),
            snapshot_limit: config.agent.snapshot_limit,
        }
    }
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

/// How a run ended, when it did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Answered { answer: String, turns: u32 },
    BudgetExhausted { turns: u32 },
}

impl RunOutcome {
    pub fn answer(&self) -> Option<&str> {
        match self {
            Self::Answered { answer, .. } => Some(answer),
            Self::BudgetExhausted { .. } => None,
        }
    }

    pub fn turns(&self) -> u32 {
        match self {
            Self::Answered { turns, .. } | Self::BudgetExhausted { turns } => *turns,
        }
    }
}

/// The planning agent. Owns the conversation history for the whole session.
pub struct ReasoningAgent {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    max_turns: u32,
    tools: Arc<ToolRegistry>,
    context: ContextBuilder,
    probe: Box<dyn EnvironmentProbe>,
    activity: Box<dyn ActivityLog>,
    event_bus: Arc<EventBus>,

    history: ConversationHistory,
    last_tool_output: Option<String>,
    /// Length of the previous turn's context, for the activity diff.
    last_context_len: usize,
    /// Turns taken since the agent was created, across runs.
    turn_index: u64,
}

impl ReasoningAgent {
    /// Create an agent that probes the working directory and keeps no report.
    pub fn new(
        provider: Arc<dyn Provider>,
        tools: Arc<ToolRegistry>,
        settings: AgentSettings,
        event_bus: Arc<EventBus>,
    ) -> Self {
        let mut context = ContextBuilder::new(&tools.manifest());
        if let Some(instructions) = settings.instructions {
            context = context.with_instructions(instructions);
        }

        Self {
            provider,
            model: settings.model,
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
            max_turns: settings.max_turns,
            tools,
            context,
            probe: Box::new(DirectoryProbe::current_dir(settings.snapshot_limit)),
            activity: Box::new(NoopActivityLog),
            event_bus,
            history: ConversationHistory::new(),
            last_tool_output: None,
            last_context_len: 0,
            turn_index: 0,
        }
    }

    /// Replace the environment probe.
    pub fn with_probe(mut self, probe: Box<dyn EnvironmentProbe>) -> Self {
        self.probe = probe;
        self
    }

    /// Attach an activity log that receives every turn.
    pub fn with_activity_log(mut self, activity: Box<dyn ActivityLog>) -> Self {
        self.activity = activity;
        self
    }

    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    pub fn last_tool_output(&self) -> Option<&str> {
        self.last_tool_output.as_deref()
    }

    /// Run turns for `input` until an answer, a fatal reply, or the turn budget.
    ///
    /// Provider failures and unrecognized payloads end the run with an error;
    /// history recorded up to that point is kept. The input joins the history
    /// only once the first model call returns, so a run whose first call fails
    /// leaves no trace in it.
    pub async fn run(&mut self, input: &str) -> Result<RunOutcome> {
        info!(max_turns = self.max_turns, "Run started");
        self.event_bus.publish(AgentEvent::RunStarted {
            input: input.to_string(),
        });
        if let Err(e) = self.activity.begin_run(input) {
            warn!(error = %e, "Failed to write activity report");
        }

        let mut pending = input.to_string();
        let mut turn = 0;

        while turn < self.max_turns {
            turn += 1;
            let raw = self.call_model(&pending).await?;

            if turn == 1 {
                self.history.push(Message::user(input));
            }

            let interpretation = interpret(&raw);
            debug!(turn, kind = interpretation.kind(), "Reply classified");
            if let Some(plan) = interpretation.plan().filter(|p| !p.is_empty()) {
                self.publish_thought(plan);
            }

            match interpretation {
                Interpretation::Malformed { raw } => {
                    warn!(turn, "Reply was not valid JSON, asking for a correction");
                    self.event_bus
                        .publish(AgentEvent::InvalidJson { raw: raw.clone() });
                    self.history.push(Message::assistant(raw));
                    self.history.push(Message::user(MALFORMED_CORRECTION));
                    pending = MALFORMED_CORRECTION.to_string();
                }

                Interpretation::ToolCall { name, arg, .. } => {
                    info!(turn, tool = %name, "Dispatching tool");
                    self.event_bus.publish(AgentEvent::ToolInvoked {
                        name: name.clone(),
                        arg: arg.clone(),
                    });

                    let output = self.tools.dispatch(&name, &arg).await;
                    self.event_bus.publish(AgentEvent::ToolOutput {
                        name,
                        output: output.clone(),
                    });

                    self.history.push(Message::assistant(raw));
                    self.history.push(Message::tool_result(&output));
                    self.last_tool_output = Some(output);
                    pending = CONTINUE_SENTINEL.to_string();
                }

                Interpretation::FinalAnswer { text, .. } => {
                    info!(turn, "Run answered");
                    self.history.push(Message::assistant(raw));
                    self.event_bus
                        .publish(AgentEvent::Answer { text: text.clone() });
                    return Ok(RunOutcome::Answered {
                        answer: text,
                        turns: turn,
                    });
                }

                Interpretation::PlanOnly { .. } => {
                    warn!(turn, "Reply had a plan but no action, nudging");
                    self.event_bus.publish(AgentEvent::PlanOnly);
                    self.history.push(Message::assistant(raw));
                    self.history.push(Message::user(PLAN_ONLY_NUDGE));
                    pending = CONTINUE_SENTINEL.to_string();
                }

                Interpretation::Unrecognized { payload } => {
                    warn!(turn, payload = %payload, "Unrecognized payload, ending run");
                    self.event_bus.publish(AgentEvent::Unrecognized {
                        payload: payload.clone(),
                    });
                    return Err(AgentError::UnrecognizedPayload { payload }.into());
                }
            }
        }

        warn!(turns = turn, "Turn budget exhausted without an answer");
        self.event_bus
            .publish(AgentEvent::BudgetExhausted { turns: turn });
        Ok(RunOutcome::BudgetExhausted { turns: turn })
    }

    /// Build the context, call the model once and record the turn.
    async fn call_model(&mut self, pending: &str) -> Result<String> {
        let snapshot =
            EnvironmentSnapshot::capture(self.probe.as_ref(), self.last_tool_output.as_deref());
        let context = self.context.build(&self.history, &snapshot, pending);
        let context_tokens = estimate_messages_tokens(&context);
        self.turn_index += 1;

        debug!(
            turn_index = self.turn_index,
            messages = context.len(),
            tokens = context_tokens,
            "Calling model"
        );

        let request = ProviderRequest {
            model: self.model.clone(),
            messages: context.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };
        let response = self.provider.complete(request).await?;
        if let Some(usage) = &response.usage {
            debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "Model usage"
            );
        }

        let diff_start = self.last_context_len.min(context.len());
        let entry = TurnEntry {
            turn_index: self.turn_index,
            context_tokens,
            context_diff: &context[diff_start..],
            raw_answer: &response.content,
        };
        if let Err(e) = self.activity.record(&entry) {
            warn!(error = %e, "Failed to write activity report");
        }
        self.last_context_len = context.len();

        Ok(response.content)
    }

    fn publish_thought(&self, plan: &Plan) {
        self.event_bus.publish(AgentEvent::Thought {
            state_analysis: plan.state_analysis.clone(),
            progress_evaluation: plan.progress_evaluation.clone(),
            challenges: plan.challenges.clone(),
            next_steps: plan.next_steps.clone(),
            reasoning: plan.reasoning.clone(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;
    use rustedmind_core::error::Error;
    use rustedmind_core::message::Role;

    const ANSWER_42: &str = r#"{"state_analysis": "done", "answer": "42"}"#;

    fn tool_call(tool: &str, arg: &str) -> String {
        serde_json::json!({
            "state_analysis": "working",
            "next_steps": ["act"],
            "tool": tool,
            "arg": arg,
        })
        .to_string()
    }

    fn settings(max_turns: u32) -> AgentSettings {
        AgentSettings {
            max_turns,
            ..AgentSettings::default()
        }
    }

    fn agent_with(
        provider: Arc<SequentialMockProvider>,
        registry: ToolRegistry,
        max_turns: u32,
    ) -> ReasoningAgent {
        ReasoningAgent::new(
            provider,
            Arc::new(registry),
            settings(max_turns),
            Arc::new(EventBus::default()),
        )
        .with_probe(Box::new(FixedProbe("-rw-r--r--          5 2026-01-01 00:00:00 a.txt")))
    }

    #[tokio::test]
    async fn direct_answer_ends_after_one_call() {
        let provider = Arc::new(SequentialMockProvider::new([ANSWER_42]));
        let mut agent = agent_with(provider.clone(), ToolRegistry::new(), 10);

        let outcome = agent.run("What is 6*7?").await.unwrap();

        assert_eq!(outcome.answer(), Some("42"));
        assert_eq!(outcome.turns(), 1);
        assert_eq!(provider.call_count(), 1);
        assert_eq!(agent.history().messages()[0], Message::user("What is 6*7?"));
        assert_eq!(agent.history().messages()[1].content, ANSWER_42);
    }

    #[tokio::test]
    async fn first_context_layout() {
        let provider = Arc::new(SequentialMockProvider::new([ANSWER_42]));
        let mut agent = agent_with(provider.clone(), ToolRegistry::new(), 10);
        agent.run("hello").await.unwrap();

        let context = provider.context(0);
        assert_eq!(context.len(), 4);
        assert_eq!(context[0].role, Role::System);
        assert!(context[1].content.starts_with("TOOL MANIFEST:"));
        assert_eq!(context[2].role, Role::Assistant);
        assert!(context[2].content.starts_with("[filesystem]\n-rw-r--r--"));
        assert!(!context[2].content.contains("[shell_output]"));
        assert_eq!(context[3], Message::user("hello"));
    }

    #[tokio::test]
    async fn tool_call_invokes_once_and_appends_result() {
        let provider = Arc::new(SequentialMockProvider::new([
            tool_call("fs_read", "poem.txt"),
            ANSWER_42.to_string(),
        ]));
        let tool = RecordingTool::new("fs_read");
        let calls = tool.calls.clone();
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(tool));
        let mut agent = agent_with(provider.clone(), registry, 10);

        let outcome = agent.run("read the poem").await.unwrap();
        assert_eq!(outcome.answer(), Some("42"));
        assert_eq!(*calls.lock().unwrap(), vec!["poem.txt"]);

        let history = agent.history().messages();
        assert_eq!(history[0], Message::user("read the poem"));
        assert_eq!(history[1].content, tool_call("fs_read", "poem.txt"));
        assert_eq!(history[2], Message::tool_result("fs_read(poem.txt)"));

        // Second context: history, then the snapshot carrying the output, then the sentinel.
        let context = provider.context(1);
        assert_eq!(&context[2..5], &history[..3]);
        assert!(context[5].content.ends_with("[shell_output]\nfs_read(poem.txt)"));
        assert_eq!(context[6], Message::user(CONTINUE_SENTINEL));
        assert_eq!(agent.last_tool_output(), Some("fs_read(poem.txt)"));
    }

    #[tokio::test]
    async fn unknown_tool_becomes_observation() {
        let provider = Arc::new(SequentialMockProvider::new([
            tool_call("teleport", "mars"),
            ANSWER_42.to_string(),
        ]));
        let mut agent = agent_with(provider.clone(), ToolRegistry::new(), 10);

        let outcome = agent.run("go").await.unwrap();
        assert_eq!(outcome.turns(), 2);
        assert_eq!(
            agent.history().messages()[2],
            Message::tool_result("[error] Unknown tool: teleport")
        );
    }

    #[tokio::test]
    async fn malformed_reply_is_corrected() {
        let provider = Arc::new(SequentialMockProvider::new(["not json at all", ANSWER_42]));
        let mut agent = agent_with(provider.clone(), ToolRegistry::new(), 10);

        let outcome = agent.run("hi").await.unwrap();
        assert_eq!(outcome.answer(), Some("42"));

        let context = provider.context(1);
        let raw_at = context
            .iter()
            .position(|m| m.content == "not json at all")
            .unwrap();
        assert_eq!(context[raw_at].role, Role::Assistant);
        assert_eq!(context[raw_at + 1], Message::user(MALFORMED_CORRECTION));
        assert_eq!(context.last().unwrap(), &Message::user(MALFORMED_CORRECTION));
    }

    #[tokio::test]
    async fn malformed_replies_share_the_turn_budget() {
        let provider = Arc::new(SequentialMockProvider::new(["oops", "oops", "oops", "oops"]));
        let mut agent = agent_with(provider.clone(), ToolRegistry::new(), 3);

        let outcome = agent.run("hi").await.unwrap();
        assert_eq!(outcome, RunOutcome::BudgetExhausted { turns: 3 });
        assert_eq!(provider.call_count(), 3);
    }

    #[tokio::test]
    async fn plan_only_reply_is_nudged() {
        let provider = Arc::new(SequentialMockProvider::new([
            r#"{"state_analysis": "thinking about it"}"#,
            ANSWER_42,
        ]));
        let mut agent = agent_with(provider.clone(), ToolRegistry::new(), 10);

        agent.run("hi").await.unwrap();
        let history = agent.history().messages();
        assert_eq!(history[2], Message::user(PLAN_ONLY_NUDGE));
        assert_eq!(provider.context(1).last().unwrap().content, CONTINUE_SENTINEL);
    }

    #[tokio::test]
    async fn unrecognized_payload_fails_after_one_turn() {
        let provider = Arc::new(SequentialMockProvider::new([r#"{"foo": 1}"#, ANSWER_42]));
        let mut agent = agent_with(provider.clone(), ToolRegistry::new(), 10);

        let err = agent.run("hi").await.unwrap_err();
        assert!(matches!(
            err,
            Error::Agent(AgentError::UnrecognizedPayload { ref payload }) if payload == r#"{"foo":1}"#
        ));
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn tool_wins_when_answer_also_present() {
        let both = r#"{"tool": "echo", "arg": "x", "answer": "too early"}"#;
        let provider = Arc::new(SequentialMockProvider::new([both, ANSWER_42]));
        let tool = RecordingTool::new("echo");
        let calls = tool.calls.clone();
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(tool));
        let mut agent = agent_with(provider.clone(), registry, 10);

        let outcome = agent.run("hi").await.unwrap();
        assert_eq!(outcome.answer(), Some("42"));
        assert_eq!(calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn non_string_tool_does_not_cost_a_turn() {
        let provider = Arc::new(SequentialMockProvider::new([
            r#"{"tool": false, "answer": "42"}"#,
            ANSWER_42,
        ]));
        let mut agent = agent_with(provider.clone(), ToolRegistry::new(), 10);

        let outcome = agent.run("What is 6*7?").await.unwrap();

        assert_eq!(outcome.answer(), Some("42"));
        assert_eq!(outcome.turns(), 1);
        assert_eq!(provider.call_count(), 1);
        assert!(agent.last_tool_output().is_none());
    }

    #[tokio::test]
    async fn instructions_and_manifest_lead_every_context() {
        let provider = Arc::new(SequentialMockProvider::new([
            tool_call("echo", "1"),
            "garbage".to_string(),
            r#"{"state_analysis": "hm"}"#.to_string(),
            ANSWER_42.to_string(),
        ]));
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(NamedTool("echo")));
        let mut agent = agent_with(provider.clone(), registry, 10);
        agent.run("hi").await.unwrap();

        let first = provider.context(0);
        for n in 0..provider.call_count() {
            let context = provider.context(n);
            assert_eq!(context[0], first[0]);
            assert_eq!(context[1], first[1]);
        }
    }

    #[tokio::test]
    async fn history_only_grows_by_appending() {
        let provider = Arc::new(SequentialMockProvider::new([
            tool_call("echo", "1"),
            "garbage".to_string(),
            ANSWER_42.to_string(),
            ANSWER_42.to_string(),
        ]));
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(NamedTool("echo")));
        let mut agent = agent_with(provider.clone(), registry, 10);

        agent.run("first").await.unwrap();
        agent.run("second").await.unwrap();

        let histories: Vec<Vec<Message>> = (0..provider.call_count())
            .map(|n| {
                let context = provider.context(n);
                context[2..context.len() - 2].to_vec()
            })
            .collect();
        for pair in histories.windows(2) {
            assert!(pair[1].starts_with(&pair[0]));
        }
        assert!(agent.history().messages().starts_with(histories.last().unwrap()));
    }

    #[tokio::test]
    async fn second_run_sees_previous_conversation() {
        let provider = Arc::new(SequentialMockProvider::new([ANSWER_42, ANSWER_42]));
        let mut agent = agent_with(provider.clone(), ToolRegistry::new(), 10);

        agent.run("first question").await.unwrap();
        agent.run("follow up").await.unwrap();

        let context = provider.context(1);
        assert_eq!(context[2], Message::user("first question"));
        assert_eq!(context.last().unwrap(), &Message::user("follow up"));
    }

    #[tokio::test]
    async fn activity_log_gets_every_turn_with_diff() {
        let provider = Arc::new(SequentialMockProvider::new([
            tool_call("echo", "1"),
            ANSWER_42.to_string(),
        ]));
        let log = RecordingLog::default();
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(NamedTool("echo")));
        let mut agent = agent_with(provider.clone(), registry, 10)
            .with_activity_log(Box::new(log.clone()));

        agent.run("hi").await.unwrap();

        assert_eq!(*log.runs.lock().unwrap(), vec!["hi"]);
        let turns = log.turns.lock().unwrap();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].turn_index, 1);
        assert_eq!(turns[0].context_diff, provider.context(0));
        assert_eq!(turns[0].raw_answer, tool_call("echo", "1"));
        assert_eq!(
            turns[0].context_tokens,
            estimate_messages_tokens(&provider.context(0))
        );

        // The second context is three messages longer; only that suffix is new.
        let second = provider.context(1);
        assert_eq!(second.len(), 7);
        assert_eq!(turns[1].turn_index, 2);
        assert_eq!(turns[1].context_diff, second[4..].to_vec());
    }

    #[tokio::test]
    async fn turn_index_continues_across_runs() {
        let provider = Arc::new(SequentialMockProvider::new([ANSWER_42, ANSWER_42]));
        let log = RecordingLog::default();
        let mut agent = agent_with(provider, ToolRegistry::new(), 10)
            .with_activity_log(Box::new(log.clone()));

        agent.run("a").await.unwrap();
        agent.run("b").await.unwrap();

        let indexes: Vec<u64> = log.turns.lock().unwrap().iter().map(|t| t.turn_index).collect();
        assert_eq!(indexes, vec![1, 2]);
    }

    #[tokio::test]
    async fn report_failures_do_not_stop_the_run() {
        let provider = Arc::new(SequentialMockProvider::new([ANSWER_42]));
        let mut agent = agent_with(provider, ToolRegistry::new(), 10)
            .with_activity_log(Box::new(BrokenLog));

        assert_eq!(agent.run("hi").await.unwrap().answer(), Some("42"));
    }

    #[tokio::test]
    async fn provider_failure_propagates() {
        let mut agent = ReasoningAgent::new(
            Arc::new(FailingProvider),
            Arc::new(ToolRegistry::new()),
            settings(10),
            Arc::new(EventBus::default()),
        )
        .with_probe(Box::new(FixedProbe("")));

        let err = agent.run("hi").await.unwrap_err();
        assert!(matches!(err, Error::Provider(_)));
        assert!(agent.history().is_empty());
    }

    #[tokio::test]
    async fn events_follow_the_run() {
        let provider = Arc::new(SequentialMockProvider::new([
            tool_call("echo", "ping"),
            ANSWER_42.to_string(),
        ]));
        let bus = Arc::new(EventBus::default());
        let mut rx = bus.subscribe();
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(NamedTool("echo")));
        let mut agent = ReasoningAgent::new(provider, Arc::new(registry), settings(10), bus)
            .with_probe(Box::new(FixedProbe("")));

        agent.run("hi").await.unwrap();

        let mut kinds = Vec::new();
        while let Ok(event) = rx.try_recv() {
            kinds.push(event.event_type());
        }
        assert_eq!(
            kinds,
            vec![
                "run_started",
                "thought",
                "tool_invoked",
                "tool_output",
                "thought",
                "answer"
            ]
        );
    }

    #[tokio::test]
    async fn request_carries_model_settings() {
        let provider = Arc::new(SequentialMockProvider::new([ANSWER_42]));
        let mut agent = ReasoningAgent::new(
            provider.clone(),
            Arc::new(ToolRegistry::new()),
            AgentSettings {
                instructions: Some("Custom instructions".into()),
                ..settings(10)
            },
            Arc::new(EventBus::default()),
        )
        .with_probe(Box::new(FixedProbe("")));

        agent.run("hi").await.unwrap();
        assert_eq!(provider.context(0)[0].content, "Custom instructions");
    }
}

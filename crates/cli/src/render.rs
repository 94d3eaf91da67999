//! Console rendering of agent events.

use rustedmind_core::event::AgentEvent;

/// Longest tool output echoed to the console.
const MAX_ECHO_CHARS: usize = 2000;

pub fn print_event(event: &AgentEvent) {
    if let Some(text) = format_event(event) {
        println!("{text}");
    }
}

/// The console line(s) for an event, if it has any.
pub fn format_event(event: &AgentEvent) -> Option<String> {
    match event {
        AgentEvent::RunStarted { .. } => None,
        AgentEvent::Thought {
            state_analysis,
            progress_evaluation,
            challenges,
            next_steps,
            reasoning,
        } => {
            let steps = if next_steps.is_empty() {
                "N/A".to_string()
            } else {
                next_steps.join("; ")
            };
            Some(format!(
                "🤔 State Analysis: {}\n📈 Progress: {}\n🧱 Challenges: {}\n🚀 Next Steps: {steps}\n🧠 Reasoning: {}",
                or_na(state_analysis),
                or_na(progress_evaluation),
                or_na(challenges),
                or_na(reasoning),
            ))
        }
        AgentEvent::ToolInvoked { name, arg } => Some(format!("⚙️  Running {name}: '{arg}'")),
        AgentEvent::ToolOutput { output, .. } if output.is_empty() => None,
        AgentEvent::ToolOutput { output, .. } => Some(format!("↪️  {}", clip(output))),
        AgentEvent::InvalidJson { .. } => Some("✗ Invalid JSON, retrying.".into()),
        AgentEvent::PlanOnly => Some(
            "✗ Plan without an action, asking for a tool or an answer.".into(),
        ),
        AgentEvent::Unrecognized { payload } => Some(format!("✗ Unrecognized payload: {payload}")),
        AgentEvent::Answer { text } => Some(format!("✅ Answer: {text}")),
        AgentEvent::BudgetExhausted { turns } => Some(format!(
            "✗ Stopped after {turns} turns without an answer."
        )),
    }
}

fn or_na(field: &Option<String>) -> &str {
    field.as_deref().unwrap_or("N/A")
}

fn clip(output: &str) -> String {
    if output.chars().count() <= MAX_ECHO_CHARS {
        return output.to_string();
    }
    let head: String = output.chars().take(MAX_ECHO_CHARS).collect();
    format!("{head} …")
}

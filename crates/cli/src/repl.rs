//! The read-eval loop.

use crate::render;
use rustedmind_agent::ReasoningAgent;
use rustedmind_core::error::Error;
use rustedmind_core::event::{AgentEvent, EventBus};
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;
use tracing::debug;

type EventReceiver = broadcast::Receiver<Arc<AgentEvent>>;

/// Run `initial` (if any), then keep reading requests until the user leaves.
pub async fn run(
    mut agent: ReasoningAgent,
    event_bus: &EventBus,
    initial: Option<String>,
) -> std::io::Result<()> {
    let mut events = event_bus.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut next = initial;

    println!("Entered conversational mode. Type 'exit' or 'quit' to end.");

    loop {
        let input = match next.take() {
            Some(input) => input,
            None => {
                print!("\n> ");
                std::io::stdout().flush()?;
                tokio::select! {
                    line = lines.next_line() => match line? {
                        Some(line) => line,
                        None => break,
                    },
                    _ = tokio::signal::ctrl_c() => break,
                }
            }
        };

        let input = input.trim();
        if input.is_empty() {
            continue;
        }
        if is_exit(input) {
            break;
        }

        if run_once(&mut agent, &mut events, input).await == Flow::Interrupted {
            break;
        }
    }

    println!("\nExiting agent.");
    Ok(())
}

#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Interrupted,
}

/// Drive one run while printing its events as they arrive.
async fn run_once(agent: &mut ReasoningAgent, events: &mut EventReceiver, input: &str) -> Flow {
    let run = agent.run(input);
    tokio::pin!(run);

    let result = loop {
        tokio::select! {
            result = &mut run => break result,
            event = events.recv() => {
                if let Ok(event) = event {
                    render::print_event(&event);
                }
            }
            _ = tokio::signal::ctrl_c() => return Flow::Interrupted,
        }
    };

    while let Ok(event) = events.try_recv() {
        render::print_event(&event);
    }

    match result {
        Ok(outcome) => debug!(turns = outcome.turns(), "Run finished"),
        // Already shown from its event.
        Err(Error::Agent(_)) => {}
        Err(e) => println!("[Error] {e}"),
    }
    Flow::Continue
}

fn is_exit(input: &str) -> bool {
    input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_words() {
        assert!(is_exit("exit"));
        assert!(is_exit("QUIT"));
        assert!(!is_exit("exit now"));
        assert!(!is_exit("list files"));
    }
}

//! RustedMind CLI — the main entry point.
//!
//! `rustedmind [PROMPT...]` runs the prompt (if any) and then keeps reading
//! requests from stdin until `exit`, `quit`, EOF or Ctrl+C.

use clap::Parser;
use rustedmind_agent::{AgentSettings, MarkdownReport, ReasoningAgent};
use rustedmind_config::AppConfig;
use rustedmind_core::event::EventBus;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

mod render;
mod repl;

#[derive(Parser, Debug)]
#[command(
    name = "rustedmind",
    about = "RustedMind — a planning agent that works through tasks with tools",
    version,
    author
)]
struct Cli {
    /// Initial request; omit to start straight in interactive mode
    prompt: Vec<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Override the model name
    #[arg(long)]
    model: Option<String>,

    /// Override the turn budget per request
    #[arg(long, value_name = "N")]
    max_turns: Option<u32>,

    /// Write the activity report to this file
    #[arg(long, value_name = "PATH")]
    report: Option<PathBuf>,

    /// Do not write an activity report
    #[arg(long, conflicts_with = "report")]
    no_report: bool,

    /// Read configuration from this file instead of ~/.rustedmind/config.toml
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

impl Cli {
    fn initial_prompt(&self) -> Option<String> {
        let prompt = self.prompt.join(" ");
        let prompt = prompt.trim();
        (!prompt.is_empty()).then(|| prompt.to_string())
    }

    /// Flags win over file and environment settings.
    fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(model) = &self.model {
            config.model = model.clone();
        }
        if let Some(max_turns) = self.max_turns {
            config.agent.max_turns = max_turns;
        }
        if let Some(path) = &self.report {
            config.report.enabled = true;
            config.report.path = path.clone();
        }
        if self.no_report {
            config.report.enabled = false;
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    dotenvy::dotenv().ok();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let mut config = match &cli.config {
        Some(path) => AppConfig::load_with_env(path),
        None => AppConfig::load(),
    }
    .map_err(|e| format!("Failed to load config: {e}"))?;
    cli.apply_overrides(&mut config);
    config.validate()?;

    let provider = rustedmind_providers::build_from_config(&config).map_err(|e| {
        format!(
            "{e}\nSet RUSTEDMIND_API_KEY or OPENAI_API_KEY, or add api_key to {}",
            AppConfig::config_dir().join("config.toml").display()
        )
    })?;
    info!(provider = provider.name(), model = %config.model, "Provider ready");

    let tools = Arc::new(rustedmind_tools::default_registry(&config.tools));
    let event_bus = Arc::new(EventBus::default());
    let mut agent = ReasoningAgent::new(
        provider,
        tools,
        AgentSettings::from_config(&config),
        event_bus.clone(),
    );

    if config.report.enabled {
        match MarkdownReport::create(&config.report.path) {
            Ok(report) => agent = agent.with_activity_log(Box::new(report)),
            Err(e) => warn!(error = %e, "Activity report disabled"),
        }
    }

    repl::run(agent, &event_bus, cli.initial_prompt()).await?;
    Ok(())
}

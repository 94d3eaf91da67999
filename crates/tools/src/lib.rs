//! Built-in tool implementations for RustedMind.
//!
//! Tools give the agent the ability to interact with the world:
//! run shell commands, read/write files, search the web and read pages.
//! Every tool takes one text argument and returns one text observation.

pub mod browse;
pub mod fs_read;
pub mod fs_write;
pub mod shell;
pub mod web_search;

use rustedmind_config::ToolsConfig;
use rustedmind_core::tool::ToolRegistry;
use std::path::PathBuf;

/// Characters kept from each end of an oversized output.
const TRUNCATE_KEEP_CHARS: usize = 8000;

const TRUNCATION_MARKER: &str = "\n... (output truncated) ...\n";

/// Create the registry with every built-in tool, limits taken from `config`.
pub fn default_registry(config: &ToolsConfig) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(shell::ShellTool::new(
        config.shell_timeout_secs,
        config.max_output_bytes,
    )));
    registry.register(Box::new(fs_read::FsReadTool::new(config.fs_read_max_bytes)));
    registry.register(Box::new(fs_write::FsWriteTool));
    registry.register(Box::new(web_search::WebSearchTool::new(
        config.http_timeout_secs,
        config.search_results,
    )));
    registry.register(Box::new(browse::BrowseWebPageTool::new(
        config.http_timeout_secs,
        config.max_output_bytes,
    )));
    registry
}

/// Keep the head and tail of `output` when it exceeds `max_bytes`.
pub fn truncate_middle(output: String, max_bytes: usize) -> String {
    if output.len() <= max_bytes {
        return output;
    }

    let chars: Vec<char> = output.chars().collect();
    if chars.len() <= TRUNCATE_KEEP_CHARS * 2 {
        return output;
    }

    let head: String = chars[..TRUNCATE_KEEP_CHARS].iter().collect();
    let tail: String = chars[chars.len() - TRUNCATE_KEEP_CHARS..].iter().collect();
    format!("{head}{TRUNCATION_MARKER}{tail}")
}

/// Resolve a user-supplied path: `~` expands to the home directory,
/// relative paths resolve against the working directory.
pub(crate) fn resolve_path(raw: &str) -> PathBuf {
    let raw = raw.trim();
    let expanded = if raw == "~" {
        rustedmind_config::home_dir()
    } else if let Some(rest) = raw.strip_prefix("~/") {
        rustedmind_config::home_dir().join(rest)
    } else {
        PathBuf::from(raw)
    };

    if expanded.is_absolute() {
        expanded
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(&expanded))
            .unwrap_or(expanded)
    }
}

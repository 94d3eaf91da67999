//! Environment probe — a fresh look at the working directory every turn.

use chrono::{DateTime, Local};
use rustedmind_core::message::{Message, tags};
use std::fs;
use std::path::PathBuf;
use tracing::warn;

/// Produces the directory listing shown to the model.
pub trait EnvironmentProbe: Send {
    fn directory_listing(&self) -> String;
}

/// Lists the first `limit` entries of a directory, sorted by name.
pub struct DirectoryProbe {
    root: PathBuf,
    limit: usize,
}

impl DirectoryProbe {
    pub fn new(root: impl Into<PathBuf>, limit: usize) -> Self {
        Self {
            root: root.into(),
            limit,
        }
    }

    /// Probe the process working directory.
    pub fn current_dir(limit: usize) -> Self {
        Self::new(
            std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            limit,
        )
    }
}

impl EnvironmentProbe for DirectoryProbe {
    fn directory_listing(&self) -> String {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(path = %self.root.display(), error = %e, "Cannot list directory");
                return String::new();
            }
        };

        let mut paths: Vec<PathBuf> = entries.filter_map(|e| e.ok().map(|e| e.path())).collect();
        paths.sort();

        paths
            .iter()
            .take(self.limit)
            .map(|path| {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                listing_line(path, &name)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn listing_line(path: &std::path::Path, name: &str) -> String {
    let Ok(metadata) = fs::metadata(path) else {
        return format!("?-????-?? ? {:>10} ? ? {name}", "?");
    };
    let modified = metadata
        .modified()
        .map(|t| {
            DateTime::<Local>::from(t)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string()
        })
        .unwrap_or_else(|_| "????-??-?? ??:??:??".into());

    if metadata.is_dir() {
        format!("drw-r--r-- {:>10} {modified} {name}/", metadata.len())
    } else {
        format!("-rw-r--r-- {:>10} {modified} {name}", metadata.len())
    }
}

/// Point-in-time view of the environment, rebuilt every turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentSnapshot {
    pub listing: String,
    pub last_output: Option<String>,
}

impl EnvironmentSnapshot {
    pub fn capture(probe: &dyn EnvironmentProbe, last_output: Option<&str>) -> Self {
        Self {
            listing: probe.directory_listing(),
            last_output: last_output.map(str::to_string),
        }
    }

    /// `[filesystem]` block, followed by `[shell_output]` when a tool has run.
    pub fn render(&self) -> String {
        let mut text = format!("{}\n{}", tags::FILESYSTEM, self.listing);
        if let Some(output) = &self.last_output {
            text.push_str(&format!("\n{}\n{output}", tags::SHELL_OUTPUT));
        }
        text
    }

    pub fn to_message(&self) -> Message {
        Message::assistant(self.render())
    }
}

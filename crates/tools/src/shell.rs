//! Shell tool — execute system commands.
//!
//! Runs the argument through the platform shell with a wall-clock timeout.
//! Stderr is appended after stdout so the model sees both.

use async_trait::async_trait;
use rustedmind_core::error::ToolError;
use rustedmind_core::tool::Tool;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

pub struct ShellTool {
    timeout_secs: u64,
    max_output_bytes: usize,
}

impl ShellTool {
    pub fn new(timeout_secs: u64, max_output_bytes: usize) -> Self {
        Self {
            timeout_secs,
            max_output_bytes,
        }
    }

    fn command(command: &str) -> Command {
        let mut cmd = if cfg!(target_os = "windows") {
            let mut cmd = Command::new("cmd");
            cmd.args(["/C", command]);
            cmd
        } else {
            let mut cmd = Command::new("sh");
            cmd.args(["-c", command]);
            cmd
        };
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl Tool for ShellTool {
    fn name(&self) -> &str {
        "shell"
    }

    fn description(&self) -> &str {
        "Run a shell command in the working directory and return its combined stdout/stderr."
    }

    async fn execute(&self, argument: &str) -> Result<String, ToolError> {
        debug!(command = %argument, "Executing shell command");

        let child = Self::command(argument).spawn()?;
        let output = tokio::time::timeout(
            Duration::from_secs(self.timeout_secs),
            child.wait_with_output(),
        )
        .await
        .map_err(|_| ToolError::Timeout {
            timeout_secs: self.timeout_secs,
        })??;

        if !output.status.success() {
            let code = output.status.code().unwrap_or(-1);
            warn!(command = %argument, exit_code = code, "Command exited with failure");
        }

        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));

        Ok(crate::truncate_middle(
            text.trim().to_string(),
            self.max_output_bytes,
        ))
    }
}

//! File write tool — create or overwrite a text file.
//!
//! The argument's first line is the path; everything after it is the content.

use async_trait::async_trait;
use rustedmind_core::error::ToolError;
use rustedmind_core::tool::Tool;
use tracing::debug;

pub struct FsWriteTool;

#[async_trait]
impl Tool for FsWriteTool {
    fn name(&self) -> &str {
        "fs_write"
    }

    fn description(&self) -> &str {
        "Write content to a text file. The first line of the argument must be the file path, and the rest is the content to write."
    }

    fn error_label(&self) -> &str {
        "fs"
    }

    async fn execute(&self, argument: &str) -> Result<String, ToolError> {
        let Some((raw_path, content)) = argument.split_once('\n') else {
            return Err(ToolError::InvalidArguments(
                "Expected path on the first line and content on subsequent lines.".into(),
            ));
        };

        let path = crate::resolve_path(raw_path);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, content).await?;

        debug!(path = %path.display(), bytes = content.len(), "File written");
        Ok(format!("[fs success] File written to {}", path.display()))
    }
}

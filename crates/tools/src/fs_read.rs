//! File read tool — return the text of a small file.

use async_trait::async_trait;
use rustedmind_core::error::ToolError;
use rustedmind_core::tool::Tool;

pub struct FsReadTool {
    max_bytes: u64,
}

impl FsReadTool {
    pub fn new(max_bytes: u64) -> Self {
        Self { max_bytes }
    }
}

#[async_trait]
impl Tool for FsReadTool {
    fn name(&self) -> &str {
        "fs_read"
    }

    fn description(&self) -> &str {
        "Read a small text file. The argument is the file path."
    }

    fn error_label(&self) -> &str {
        "fs"
    }

    async fn execute(&self, argument: &str) -> Result<String, ToolError> {
        let path = crate::resolve_path(argument);

        let metadata = match tokio::fs::metadata(&path).await {
            Ok(m) if m.is_file() => m,
            _ => {
                return Err(ToolError::ExecutionFailed(format!(
                    "File not found: {}",
                    path.display()
                )));
            }
        };

        if metadata.len() > self.max_bytes {
            return Err(ToolError::ExecutionFailed(format!(
                "File too large (>{} KB).",
                self.max_bytes / 1000
            )));
        }

        let bytes = tokio::fs::read(&path).await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

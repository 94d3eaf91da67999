//! Page browsing tool — fetch a URL and return its visible text.

use async_trait::async_trait;
use rustedmind_core::error::ToolError;
use rustedmind_core::tool::Tool;
use scraper::Html;
use std::time::Duration;
use tracing::debug;

/// Elements whose text never reaches the model.
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

pub struct BrowseWebPageTool {
    timeout_secs: u64,
    max_output_bytes: usize,
}

impl BrowseWebPageTool {
    pub fn new(timeout_secs: u64, max_output_bytes: usize) -> Self {
        Self {
            timeout_secs,
            max_output_bytes,
        }
    }
}

#[async_trait]
impl Tool for BrowseWebPageTool {
    fn name(&self) -> &str {
        "browse_web_page"
    }

    fn description(&self) -> &str {
        "Get the text content of a web page. The argument is the URL."
    }

    async fn execute(&self, argument: &str) -> Result<String, ToolError> {
        let url = argument.trim();
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .build()
            .map_err(|e| ToolError::ExecutionFailed(e.to_string()))?;

        debug!(url = %url, "Fetching page");
        let body = client
            .get(url)
            .send()
            .await
            .map_err(|e| ToolError::ExecutionFailed(e.to_string()))?
            .text()
            .await
            .map_err(|e| ToolError::ExecutionFailed(e.to_string()))?;

        Ok(crate::truncate_middle(
            visible_text(&body),
            self.max_output_bytes,
        ))
    }
}

/// Text content of an HTML document with scripts and styles removed and
/// whitespace collapsed.
pub fn visible_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut words: Vec<&str> = Vec::new();

    for node in document.root_element().descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|el| HIDDEN_ELEMENTS.contains(&el.name()))
        });
        if !hidden {
            words.extend(text.split_whitespace());
        }
    }

    words.join(" ")
}

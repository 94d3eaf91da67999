//! Web search tool — query DuckDuckGo's HTML endpoint.
//!
//! Results are returned to the model as a JSON array of
//! `{title, href, body}` objects.

use async_trait::async_trait;
use rustedmind_core::error::ToolError;
use rustedmind_core::tool::Tool;
use scraper::{Html, Selector};
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

const SEARCH_URL: &str = "https://html.duckduckgo.com/html/";
const USER_AGENT: &str = "Mozilla/5.0 (compatible; rustedmind)";

pub struct WebSearchTool {
    timeout_secs: u64,
    max_results: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchResult {
    pub title: String,
    pub href: String,
    pub body: String,
}

impl WebSearchTool {
    pub fn new(timeout_secs: u64, max_results: usize) -> Self {
        Self {
            timeout_secs,
            max_results,
        }
    }

    async fn fetch(&self, query: &str) -> Result<String, ToolError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ToolError::ExecutionFailed(e.to_string()))?;

        let url = format!("{SEARCH_URL}?q={}&kl=us-en", urlencoding::encode(query));
        let response = client
            .get(&url)
            .send()
            .await
            .map_err(|e| ToolError::ExecutionFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ToolError::ExecutionFailed(format!(
                "search returned HTTP {}",
                response.status()
            )));
        }

        response
            .text()
            .await
            .map_err(|e| ToolError::ExecutionFailed(e.to_string()))
    }
}

#[async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &str {
        "web_search"
    }

    fn description(&self) -> &str {
        "Search the web with a query. Returns titles, links and snippets as JSON."
    }

    async fn execute(&self, argument: &str) -> Result<String, ToolError> {
        let query = argument.trim();
        if query.is_empty() {
            return Err(ToolError::InvalidArguments("Expected a search query.".into()));
        }

        debug!(query = %query, "Searching the web");
        let html = self.fetch(query).await?;
        let results = parse_results(&html, self.max_results);
        debug!(count = results.len(), "Search finished");

        serde_json::to_string(&results).map_err(|e| ToolError::ExecutionFailed(e.to_string()))
    }
}

/// Extract up to `max_results` results from a DuckDuckGo HTML result page.
pub fn parse_results(html: &str, max_results: usize) -> Vec<SearchResult> {
    let (Ok(result_sel), Ok(title_sel), Ok(snippet_sel)) = (
        Selector::parse(".result"),
        Selector::parse(".result__title a, a.result__a"),
        Selector::parse(".result__snippet"),
    ) else {
        return Vec::new();
    };

    let document = Html::parse_document(html);
    let mut results = Vec::new();

    for element in document.select(&result_sel) {
        if results.len() >= max_results {
            break;
        }

        let Some(anchor) = element.select(&title_sel).next() else {
            continue;
        };
        let title = collapse_text(anchor.text());
        let href = anchor
            .value()
            .attr("href")
            .map(resolve_redirect)
            .unwrap_or_default();
        let body = element
            .select(&snippet_sel)
            .next()
            .map(|el| collapse_text(el.text()))
            .unwrap_or_default();

        if !title.is_empty() && !href.is_empty() {
            results.push(SearchResult { title, href, body });
        }
    }

    results
}

/// DuckDuckGo wraps result links as `/l/?uddg=<encoded target>`.
fn resolve_redirect(href: &str) -> String {
    href.split(['?', '&'])
        .find_map(|part| part.strip_prefix("uddg="))
        .and_then(|encoded| urlencoding::decode(encoded).ok())
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|| href.to_string())
}

fn collapse_text<'a>(parts: impl Iterator<Item = &'a str>) -> String {
    parts
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

//! Markup activity report — a human-readable trace of every turn.
//!
//! The file is truncated when the report is created and only appended to
//! afterwards. Each turn shows the context messages that are new since the
//! previous turn and the model's answer, as inline-styled HTML blocks that
//! render in any Markdown viewer.

use crate::interpreter::StructuredResponse;
use rustedmind_core::activity::{ActivityLog, TurnEntry};
use rustedmind_core::error::ReportError;
use rustedmind_core::message::{Message, Role, tags};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

const REPORT_HEADER: &str = "# Agent Query Report\n\n";

const SYSTEM_COLOR: &str = "#e1f5fe";
const USER_COLOR: &str = "#e8f5e9";
const ASSISTANT_COLOR: &str = "#f5f5f5";
const TOOL_RESULT_COLOR: &str = "#fffde7";
const FILESYSTEM_COLOR: &str = "#fff8e1";
const ANSWER_COLOR: &str = "#fce4ec";

/// Writes the activity trail to a Markdown file.
pub struct MarkdownReport {
    path: PathBuf,
    /// Directory listing from the last snapshot written, to collapse repeats.
    last_listing: Option<String>,
}

impl MarkdownReport {
    /// Create (or truncate) the report file and write its header.
    pub fn create(path: impl Into<PathBuf>) -> Result<Self, ReportError> {
        let path = path.into();
        std::fs::write(&path, REPORT_HEADER).map_err(|e| io_error(&path, e))?;
        Ok(Self {
            path,
            last_listing: None,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append(&self, text: &str) -> Result<(), ReportError> {
        let mut file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)
            .map_err(|e| io_error(&self.path, e))?;
        file.write_all(text.as_bytes())
            .map_err(|e| io_error(&self.path, e))
    }

    fn render_message(&mut self, message: &Message) -> String {
        match message.role {
            Role::System => block(SYSTEM_COLOR, "SYSTEM", &pre(&message.content)),
            Role::User => block(USER_COLOR, "USER", &pre(&message.content)),
            Role::Assistant => self.render_assistant(&message.content),
        }
    }

    fn render_assistant(&mut self, content: &str) -> String {
        if let Some(output) = content.strip_prefix(tags::TOOL_RESULT) {
            let body = format!("<b>Tool Result:</b>{}", pre(output.trim()));
            return block(TOOL_RESULT_COLOR, "ASSISTANT", &body);
        }

        if let Some(rest) = content.strip_prefix(tags::FILESYSTEM) {
            let (listing, shell_output) = split_snapshot(rest);
            let unchanged = self.last_listing.as_deref() == Some(listing);
            self.last_listing = Some(listing.to_string());

            if unchanged {
                return match shell_output {
                    Some(output) => {
                        let body = format!("<b>Shell Output:</b>{}", pre(output.trim()));
                        block(FILESYSTEM_COLOR, "ASSISTANT", &body)
                    }
                    None => String::new(),
                };
            }
            let body = format!("<b>Filesystem:</b>{}", pre(rest.trim()));
            return block(FILESYSTEM_COLOR, "ASSISTANT", &body);
        }

        let body = summarize_answer(content).unwrap_or_else(|| pre(content));
        block(ASSISTANT_COLOR, "ASSISTANT", &body)
    }
}

impl ActivityLog for MarkdownReport {
    fn begin_run(&mut self, user_input: &str) -> Result<(), ReportError> {
        self.append(&format!(
            "**User Query:** `{}`\n\n",
            escape_html(user_input)
        ))
    }

    fn record(&mut self, entry: &TurnEntry<'_>) -> Result<(), ReportError> {
        let mut out = format!(
            "### Turn {} ({} tokens)\n\n<h4>CONTEXT DIFF</h4>\n",
            entry.turn_index, entry.context_tokens
        );
        for message in entry.context_diff {
            out.push_str(&self.render_message(message));
        }
        out.push_str("\n\n<h4>LLM ANSWER</h4>\n");

        let answer =
            summarize_answer(entry.raw_answer).unwrap_or_else(|| pre(entry.raw_answer));
        out.push_str(&format!(
            r#"<div style="background-color: {ANSWER_COLOR}; padding: 2px; margin: 0; border-radius: 5px; font-family: monospace;">{answer}</div>"#
        ));
        out.push_str("\n\n---\n\n");

        self.append(&out)
    }
}

/// Split the text after `[filesystem]` into the listing and the shell output.
fn split_snapshot(rest: &str) -> (&str, Option<&str>) {
    let marker = format!("\n{}", tags::SHELL_OUTPUT);
    match rest.split_once(marker.as_str()) {
        Some((listing, output)) => (listing.trim(), Some(output)),
        None => (rest.trim(), None),
    }
}

/// Thought/tool/answer line for a reply that parses as a JSON object.
fn summarize_answer(raw: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(raw.trim()).ok()?;
    let response = StructuredResponse::from_object(value.as_object()?);

    let thought = response
        .plan
        .reasoning
        .or(response.plan.state_analysis)
        .unwrap_or_default();
    let mut body = format!("<b>Thought:</b> {}<br/>", escape_html(&thought));
    if let Some(tool) = response.tool.filter(|t| !t.is_empty()) {
        body.push_str(&format!(
            "<b>Tool:</b> {} | <b>Arg:</b> {}",
            escape_html(&tool),
            escape_html(response.arg.as_deref().unwrap_or_default())
        ));
    }
    if let Some(answer) = response.answer.filter(|a| !a.is_empty()) {
        body.push_str(&format!("<b>Answer:</b> {}", escape_html(&answer)));
    }
    Some(body)
}

fn block(color: &str, label: &str, body: &str) -> String {
    format!(
        r#"<div style="background-color: {color}; padding: 2px; margin: 0; border-radius: 5px; font-family: monospace;"><b>{label}</b><br/>{body}</div>"#
    )
}

fn pre(text: &str) -> String {
    format!("<pre>{}</pre>", escape_html(text))
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn io_error(path: &Path, source: std::io::Error) -> ReportError {
    ReportError::Io {
        path: path.display().to_string(),
        source,
    }
}

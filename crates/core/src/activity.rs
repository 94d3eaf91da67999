//! Activity log — the append-only audit trail of every turn.
//!
//! The loop hands each turn's submitted-context diff and the model's raw
//! answer to an [`ActivityLog`]. The log is write-only from the loop's point
//! of view: nothing is ever read back.

use crate::error::ReportError;
use crate::message::Message;

/// Everything recorded about a single turn.
#[derive(Debug, Clone, Copy)]
pub struct TurnEntry<'a> {
    /// Process-wide turn index, starting at 1.
    pub turn_index: u64,
    /// Estimated token count of the full submitted context.
    pub context_tokens: usize,
    /// Context messages that were not part of the previous turn's context.
    pub context_diff: &'a [Message],
    /// The model's reply, verbatim.
    pub raw_answer: &'a str,
}

/// Append-record interface for the activity trail.
pub trait ActivityLog: Send {
    /// Called once when a run starts, before its first turn.
    fn begin_run(&mut self, user_input: &str) -> Result<(), ReportError> {
        let _ = user_input;
        Ok(())
    }

    /// Append one turn.
    fn record(&mut self, entry: &TurnEntry<'_>) -> Result<(), ReportError>;
}

/// An activity log that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopActivityLog;

impl ActivityLog for NoopActivityLog {
    fn record(&mut self, _entry: &TurnEntry<'_>) -> Result<(), ReportError> {
        Ok(())
    }
}

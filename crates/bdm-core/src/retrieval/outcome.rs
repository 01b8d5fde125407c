//! Classified result of one retrieval.

use serde::Serialize;
use std::fmt;

use super::exit_codes::FailureCategory;

/// How a task's retrieval ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum OutcomeKind {
    Success,
    /// The tool ran and reported failure. `code` is `None` when it was killed by a signal.
    ToolError {
        code: Option<i32>,
        category: Option<FailureCategory>,
    },
    /// The per-task deadline passed and the tool was terminated.
    Timeout { after_ms: u64 },
    /// The batch was cancelled while this task was admitted.
    Cancelled,
    /// The tool could not be launched at all.
    TransportError,
    /// The target directory could not be prepared.
    DestinationError,
}

impl OutcomeKind {
    pub fn is_success(&self) -> bool {
        matches!(self, OutcomeKind::Success)
    }
}

impl fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutcomeKind::Success => write!(f, "completed"),
            OutcomeKind::ToolError {
                code: Some(code),
                category: Some(category),
            } => write!(f, "{} (exit code {})", category, code),
            OutcomeKind::ToolError {
                code: Some(code),
                category: None,
            } => write!(f, "retrieval command exited with code {}", code),
            OutcomeKind::ToolError { code: None, .. } => {
                write!(f, "retrieval command terminated by signal")
            }
            OutcomeKind::Timeout { after_ms } => {
                write!(f, "timed out after {}", format_millis(*after_ms))
            }
            OutcomeKind::Cancelled => write!(f, "cancelled by batch interruption"),
            OutcomeKind::TransportError => write!(f, "could not launch retrieval command"),
            OutcomeKind::DestinationError => write!(f, "destination not usable"),
        }
    }
}

/// `3h`, `1h30m`, `45s`, `2m5s`; sub-second values as `250ms`.
fn format_millis(ms: u64) -> String {
    if ms < 1000 {
        return format!("{}ms", ms);
    }
    let secs = ms / 1000;
    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    let mut out = String::new();
    if h > 0 {
        out.push_str(&format!("{}h", h));
    }
    if m > 0 {
        out.push_str(&format!("{}m", m));
    }
    if s > 0 || out.is_empty() {
        out.push_str(&format!("{}s", s));
    }
    out
}

/// Produced once per executed task and consumed once by the aggregator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionOutcome {
    /// Position of the task in its batch.
    pub task: usize,
    pub kind: OutcomeKind,
    /// Raw diagnostic text (tool stderr tail in quiet mode, launch error, ...).
    pub diagnostic: String,
}

impl ExecutionOutcome {
    pub fn new(task: usize, kind: OutcomeKind, diagnostic: impl Into<String>) -> Self {
        Self {
            task,
            kind,
            diagnostic: diagnostic.into(),
        }
    }
}

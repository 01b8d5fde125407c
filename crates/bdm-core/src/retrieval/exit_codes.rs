//! Declarative exit-code table for the wrapped retrieval tool.

use serde::{Deserialize, Serialize};

/// Named failure categories a tool's exit code can map to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailureCategory {
    /// Resource missing or access denied.
    NotFound,
    /// Not enough disk space at the destination.
    InsufficientSpace,
    /// Network timeout or connection refused.
    NetworkTimeout,
}

impl FailureCategory {
    pub fn describe(&self) -> &'static str {
        match self {
            FailureCategory::NotFound => "file not found or access denied",
            FailureCategory::InsufficientSpace => "not enough disk space available",
            FailureCategory::NetworkTimeout => "network timeout or connection refused",
        }
    }
}

impl std::fmt::Display for FailureCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.describe())
    }
}

/// One `code → category` row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExitCodeEntry {
    pub code: i32,
    pub category: FailureCategory,
}

/// Maps known non-zero exit codes to categories. Codes not listed are
/// generic tool failures.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExitCodeTable {
    entries: Vec<ExitCodeEntry>,
}

impl ExitCodeTable {
    pub fn new(entries: Vec<ExitCodeEntry>) -> Self {
        Self { entries }
    }

    /// aria2c exit statuses: 3 resource not found, 9 not enough disk space,
    /// 28 network timeout / refused.
    pub fn aria2c() -> Self {
        Self::new(vec![
            ExitCodeEntry {
                code: 3,
                category: FailureCategory::NotFound,
            },
            ExitCodeEntry {
                code: 9,
                category: FailureCategory::InsufficientSpace,
            },
            ExitCodeEntry {
                code: 28,
                category: FailureCategory::NetworkTimeout,
            },
        ])
    }

    /// Category for `code`; the first matching row wins. Zero never maps.
    pub fn lookup(&self, code: i32) -> Option<FailureCategory> {
        if code == 0 {
            return None;
        }
        self.entries
            .iter()
            .find(|e| e.code == code)
            .map(|e| e.category)
    }

    pub fn entries(&self) -> &[ExitCodeEntry] {
        &self.entries
    }
}

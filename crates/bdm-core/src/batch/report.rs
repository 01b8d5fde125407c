//! Batch report: per-task results in input order plus the process exit status.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

use super::task::{FailureDetail, Task, TaskStatus};

/// Exit status the batch maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BatchExit {
    /// Every task succeeded.
    Success,
    /// At least one task did not succeed and the batch was not interrupted.
    PartialFailure,
    /// The batch was cancelled before every task succeeded.
    Interrupted,
}

impl BatchExit {
    pub fn code(&self) -> i32 {
        match self {
            BatchExit::Success => 0,
            BatchExit::PartialFailure => 1,
            BatchExit::Interrupted => 130,
        }
    }
}

/// Final state of one task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskRecord {
    pub index: usize,
    pub locator: String,
    pub status: TaskStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureDetail>,
}

impl From<&Task> for TaskRecord {
    fn from(task: &Task) -> Self {
        Self {
            index: task.index(),
            locator: task.locator().to_string(),
            status: task.status(),
            path: task.destination(),
            failure: task.failure().cloned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    /// One record per locator, in input order.
    pub records: Vec<TaskRecord>,
    /// Cancellation was triggered and not every task succeeded.
    pub interrupted: bool,
    /// Most tasks that held an admission slot at once.
    pub peak_running: usize,
    pub exit: BatchExit,
}

impl BatchReport {
    pub fn new(records: Vec<TaskRecord>, cancelled: bool, peak_running: usize) -> Self {
        let all_succeeded = records
            .iter()
            .all(|r| r.status == TaskStatus::Succeeded);
        let interrupted = cancelled && !all_succeeded;
        let exit = if interrupted {
            BatchExit::Interrupted
        } else if all_succeeded {
            BatchExit::Success
        } else {
            BatchExit::PartialFailure
        };
        Self {
            records,
            interrupted,
            peak_running,
            exit,
        }
    }

    pub fn total(&self) -> usize {
        self.records.len()
    }

    fn count(&self, status: TaskStatus) -> usize {
        self.records.iter().filter(|r| r.status == status).count()
    }

    pub fn succeeded(&self) -> usize {
        self.count(TaskStatus::Succeeded)
    }

    pub fn failed(&self) -> usize {
        self.count(TaskStatus::Failed)
    }

    pub fn skipped(&self) -> usize {
        self.count(TaskStatus::Skipped)
    }

    /// Records that did not succeed, in input order.
    pub fn unsuccessful(&self) -> impl Iterator<Item = &TaskRecord> {
        self.records
            .iter()
            .filter(|r| r.status != TaskStatus::Succeeded)
    }

    pub fn exit_status(&self) -> BatchExit {
        self.exit
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total = self.total();
        writeln!(
            f,
            "Total: {}  Succeeded: {}  Failed: {}  Skipped: {}",
            total,
            self.succeeded(),
            self.failed(),
            self.skipped()
        )?;
        match self.exit {
            BatchExit::Success => {
                return write!(f, "All {} downloads completed successfully.", total);
            }
            BatchExit::PartialFailure => {
                write!(f, "{}/{} downloads failed.", total - self.succeeded(), total)?;
            }
            BatchExit::Interrupted => {
                f.write_str("Batch interrupted before completion.")?;
            }
        }
        for record in self.unsuccessful() {
            let reason = record
                .failure
                .as_ref()
                .map(|d| d.reason.as_str())
                .unwrap_or("unknown");
            write!(f, "\n  - {} ({})", record.locator, reason)?;
        }
        Ok(())
    }
}

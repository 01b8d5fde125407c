//! Per-task progress events published by workers.

use std::path::PathBuf;

use crate::resolver::FilenameSource;

/// Progress of one task. A task's terminal event (`Succeeded`/`Failed`) is
/// sent before its admission slot is released.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskEvent {
    Started {
        index: usize,
        total: usize,
        locator: String,
    },
    Resolved {
        index: usize,
        path: PathBuf,
        source: FilenameSource,
    },
    Succeeded {
        index: usize,
        path: PathBuf,
    },
    Failed {
        index: usize,
        locator: String,
        reason: String,
    },
    Skipped {
        index: usize,
        locator: String,
        reason: String,
    },
}

impl TaskEvent {
    pub fn index(&self) -> usize {
        match self {
            TaskEvent::Started { index, .. }
            | TaskEvent::Resolved { index, .. }
            | TaskEvent::Succeeded { index, .. }
            | TaskEvent::Failed { index, .. }
            | TaskEvent::Skipped { index, .. } => *index,
        }
    }
}

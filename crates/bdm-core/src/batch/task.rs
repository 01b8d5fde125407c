//! Tasks and the batch that holds them.

use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

use crate::resolver::ResolvedTarget;
use crate::retrieval::{ExecutionOutcome, OutcomeKind};

/// Lifecycle of a task: Pending → Running → {Succeeded, Failed}, or Pending → Skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
    Skipped,
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskStatus::Succeeded | TaskStatus::Failed | TaskStatus::Skipped
        )
    }

    /// Whether moving to `next` keeps the lifecycle monotonic.
    pub fn can_advance_to(&self, next: TaskStatus) -> bool {
        matches!(
            (self, next),
            (TaskStatus::Pending, TaskStatus::Running)
                | (TaskStatus::Pending, TaskStatus::Skipped)
                | (TaskStatus::Running, TaskStatus::Succeeded)
                | (TaskStatus::Running, TaskStatus::Failed)
        )
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid task transition {from:?} -> {to:?}")]
pub struct InvalidTransition {
    pub from: TaskStatus,
    pub to: TaskStatus,
}

/// Why a task did not succeed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureDetail {
    /// Short classified reason, e.g. "file not found or access denied (exit code 3)".
    pub reason: String,
    /// Executor classification; `None` for tasks that never ran.
    pub outcome: Option<OutcomeKind>,
    /// Raw diagnostic text, kept verbatim.
    pub diagnostic: String,
}

impl FailureDetail {
    pub fn from_outcome(outcome: &ExecutionOutcome) -> Self {
        Self {
            reason: outcome.kind.to_string(),
            outcome: Some(outcome.kind.clone()),
            diagnostic: outcome.diagnostic.clone(),
        }
    }

    pub fn not_run(reason: &str) -> Self {
        Self {
            reason: reason.to_string(),
            outcome: None,
            diagnostic: String::new(),
        }
    }
}

/// One locator's retrieval unit. Owned by exactly one worker while running.
#[derive(Debug, Clone)]
pub struct Task {
    index: usize,
    locator: String,
    target: Option<ResolvedTarget>,
    status: TaskStatus,
    failure: Option<FailureDetail>,
}

impl Task {
    pub fn new(index: usize, locator: impl Into<String>) -> Self {
        Self {
            index,
            locator: locator.into(),
            target: None,
            status: TaskStatus::Pending,
            failure: None,
        }
    }

    /// Position in the batch.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn locator(&self) -> &str {
        &self.locator
    }

    pub fn target(&self) -> Option<&ResolvedTarget> {
        self.target.as_ref()
    }

    pub fn set_target(&mut self, target: ResolvedTarget) {
        self.target = Some(target);
    }

    pub fn filename(&self) -> Option<&str> {
        self.target.as_ref().map(|t| t.filename.as_str())
    }

    /// Full output path, once resolved.
    pub fn destination(&self) -> Option<PathBuf> {
        self.target.as_ref().map(ResolvedTarget::path)
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    pub fn failure(&self) -> Option<&FailureDetail> {
        self.failure.as_ref()
    }

    fn advance(&mut self, next: TaskStatus) -> Result<(), InvalidTransition> {
        if !self.status.can_advance_to(next) {
            return Err(InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }

    pub fn start(&mut self) -> Result<(), InvalidTransition> {
        self.advance(TaskStatus::Running)
    }

    pub fn skip(&mut self, reason: &str) -> Result<(), InvalidTransition> {
        self.advance(TaskStatus::Skipped)?;
        self.failure = Some(FailureDetail::not_run(reason));
        Ok(())
    }

    /// Applies the executor's outcome: success → Succeeded, anything else → Failed.
    pub fn finish(&mut self, outcome: &ExecutionOutcome) -> Result<(), InvalidTransition> {
        if outcome.kind.is_success() {
            self.advance(TaskStatus::Succeeded)
        } else {
            self.advance(TaskStatus::Failed)?;
            self.failure = Some(FailureDetail::from_outcome(outcome));
            Ok(())
        }
    }

    /// Marks a running task failed without an executor outcome.
    pub(crate) fn abandon(&mut self, reason: &str) {
        self.status = TaskStatus::Failed;
        self.failure = Some(FailureDetail::not_run(reason));
    }
}

/// Ordered tasks of one orchestration run. Length and order never change;
/// tasks are checked out to workers and checked back in when they finish.
#[derive(Debug)]
pub struct Batch {
    locators: Vec<String>,
    slots: Vec<Option<Task>>,
}

impl Batch {
    pub fn new(locators: Vec<String>) -> Self {
        let slots = locators
            .iter()
            .enumerate()
            .map(|(i, l)| Some(Task::new(i, l.clone())))
            .collect();
        Self { locators, slots }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn locator(&self, index: usize) -> Option<&str> {
        self.locators.get(index).map(String::as_str)
    }

    /// Hands the task at `index` to a worker.
    pub(crate) fn checkout(&mut self, index: usize) -> Option<Task> {
        self.slots.get_mut(index).and_then(Option::take)
    }

    /// Returns a task from its worker to its original position.
    pub(crate) fn checkin(&mut self, task: Task) {
        let index = task.index();
        if let Some(slot) = self.slots.get_mut(index) {
            *slot = Some(task);
        }
    }

    /// Skips every pending task from `from` onwards. Returns the skipped indices.
    pub(crate) fn skip_pending_from(&mut self, from: usize, reason: &str) -> Vec<usize> {
        let mut skipped = Vec::new();
        for slot in self.slots.iter_mut().skip(from) {
            if let Some(task) = slot {
                if task.skip(reason).is_ok() {
                    skipped.push(task.index());
                }
            }
        }
        skipped
    }

    /// Puts a failed placeholder into any slot whose worker never returned its task.
    pub(crate) fn fill_lost(&mut self, reason: &str) -> usize {
        let mut lost = 0;
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.is_none() {
                let mut task = Task::new(index, self.locators[index].clone());
                task.abandon(reason);
                *slot = Some(task);
                lost += 1;
            }
        }
        lost
    }

    /// Tasks currently held by the batch, in input order.
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.slots.iter().flatten()
    }

    pub fn into_tasks(self) -> Vec<Task> {
        self.slots.into_iter().flatten().collect()
    }
}

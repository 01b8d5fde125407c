//! Orchestrator: runs every locator of a batch through resolve and execute,
//! with at most `parallelism` tasks holding an admission slot at once.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinSet;

use crate::cancel::CancellationScope;
use crate::error::{ConfigError, DestinationError};
use crate::limiter::{Admission, AdmissionPool, Permit};
use crate::resolver::{self, HeadProbe, ResolveOptions};
use crate::retrieval::{self, ExecOptions, ExecutionOutcome, OutcomeKind, RetrievalCommand};
use crate::url_model;

use super::events::TaskEvent;
use super::names::ClaimedPaths;
use super::report::{BatchReport, TaskRecord};
use super::task::{Batch, Task};

/// Reason recorded on tasks that never started because the batch was cancelled.
pub const SKIP_REASON: &str = "batch cancelled";

const LOST_REASON: &str = "worker ended without reporting a result";

/// Settings for one orchestration run.
#[derive(Debug, Clone)]
pub struct BatchSettings {
    /// Upper bound on concurrently running tasks. Must be at least 1.
    pub parallelism: usize,
    /// Destination hint; empty means the current directory.
    pub destination: String,
    pub exec: ExecOptions,
    pub probe_timeout: Duration,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            parallelism: 3,
            destination: String::new(),
            exec: ExecOptions::default(),
            probe_timeout: Duration::from_secs(30),
        }
    }
}

pub struct Orchestrator {
    settings: BatchSettings,
    command: Arc<RetrievalCommand>,
    probe: Option<Arc<dyn HeadProbe>>,
}

struct WorkerContext {
    command: Arc<RetrievalCommand>,
    exec: ExecOptions,
    resolve: ResolveOptions,
    hint: String,
    total: usize,
    claimed: ClaimedPaths,
    events: Option<UnboundedSender<TaskEvent>>,
}

impl WorkerContext {
    fn emit(&self, event: TaskEvent) {
        if let Some(tx) = &self.events {
            let _ = tx.send(event);
        }
    }
}

impl Orchestrator {
    pub fn new(settings: BatchSettings, command: RetrievalCommand) -> Self {
        Self {
            settings,
            command: Arc::new(command),
            probe: None,
        }
    }

    /// Enables header probing for filename inference.
    pub fn with_probe(mut self, probe: Arc<dyn HeadProbe>) -> Self {
        self.probe = Some(probe);
        self
    }

    pub fn settings(&self) -> &BatchSettings {
        &self.settings
    }

    /// Runs the batch to completion and reports every task in input order.
    ///
    /// Fails only on configuration errors detected before any task starts.
    /// Once tasks run, every per-task failure lands in the report. After
    /// `scope` triggers no further task is admitted; the remaining ones are
    /// reported as skipped and running ones are stopped by the executor.
    pub async fn run(
        &self,
        locators: Vec<String>,
        scope: &CancellationScope,
        events: Option<UnboundedSender<TaskEvent>>,
    ) -> Result<BatchReport, ConfigError> {
        if locators.is_empty() {
            return Err(ConfigError::NoLocators);
        }
        for locator in &locators {
            url_model::validate_locator(locator).map_err(|reason| ConfigError::InvalidLocator {
                locator: locator.clone(),
                reason,
            })?;
        }
        let pool = AdmissionPool::new(self.settings.parallelism)?;

        // Several locators share one hint, so it can only name a directory.
        let force_directory = locators.len() > 1;
        if force_directory {
            prepare_shared_directory(&self.settings.destination)?;
        }

        let total = locators.len();
        tracing::info!(
            total,
            parallelism = pool.capacity(),
            destination = %self.settings.destination,
            "batch started"
        );

        let ctx = Arc::new(WorkerContext {
            command: Arc::clone(&self.command),
            exec: self.settings.exec.clone(),
            resolve: ResolveOptions {
                probe: self.probe.clone(),
                probe_timeout: self.settings.probe_timeout,
                force_directory,
                scope: Some(scope.clone()),
            },
            hint: self.settings.destination.clone(),
            total,
            claimed: ClaimedPaths::default(),
            events,
        });

        let mut batch = Batch::new(locators);
        let mut workers = JoinSet::new();

        for index in 0..total {
            let permit = match pool.admit(scope).await {
                Admission::Granted(permit) => permit,
                Admission::Cancelled => {
                    let skipped = batch.skip_pending_from(index, SKIP_REASON);
                    tracing::warn!(skipped = skipped.len(), "batch cancelled, skipping remaining tasks");
                    for i in skipped {
                        ctx.emit(TaskEvent::Skipped {
                            index: i,
                            locator: batch.locator(i).unwrap_or_default().to_string(),
                            reason: SKIP_REASON.to_string(),
                        });
                    }
                    break;
                }
            };
            let Some(task) = batch.checkout(index) else {
                continue;
            };
            let ctx = Arc::clone(&ctx);
            let scope = scope.clone();
            workers.spawn(async move { run_task(task, permit, &ctx, &scope).await });
        }

        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok((task, outcome)) => {
                    tracing::debug!(
                        task = task.index(),
                        status = ?task.status(),
                        outcome = %outcome.kind,
                        "task collected"
                    );
                    batch.checkin(task);
                }
                Err(e) => tracing::error!(error = %e, "task worker join"),
            }
        }
        let lost = batch.fill_lost(LOST_REASON);
        if lost > 0 {
            tracing::error!(lost, "tasks lost by their workers");
        }

        let records: Vec<TaskRecord> = batch.tasks().map(TaskRecord::from).collect();
        let report = BatchReport::new(records, scope.is_triggered(), pool.peak());
        tracing::info!(
            succeeded = report.succeeded(),
            failed = report.failed(),
            skipped = report.skipped(),
            interrupted = report.interrupted,
            peak_running = report.peak_running,
            "batch finished"
        );
        Ok(report)
    }
}

fn prepare_shared_directory(hint: &str) -> Result<(), ConfigError> {
    let cwd = std::env::current_dir().map_err(|e| ConfigError::Destination {
        path: PathBuf::from(hint),
        source: DestinationError::CurrentDir(e),
    })?;
    let destination = resolver::interpret_hint(hint, &cwd, true);
    let dir = destination.directory();
    resolver::prepare_directory(dir).map_err(|source| ConfigError::Destination {
        path: dir.to_path_buf(),
        source,
    })
}

/// One worker: resolve, execute, publish the terminal event, then release the slot.
async fn run_task(
    mut task: Task,
    permit: Permit,
    ctx: &WorkerContext,
    scope: &CancellationScope,
) -> (Task, ExecutionOutcome) {
    let index = task.index();
    if let Err(e) = task.start() {
        tracing::error!(task = index, error = %e, "task not startable");
    }
    ctx.emit(TaskEvent::Started {
        index,
        total: ctx.total,
        locator: task.locator().to_string(),
    });

    let outcome = match resolver::resolve(task.locator(), &ctx.hint, &ctx.resolve).await {
        Ok(target) => {
            let target = ctx.claimed.claim(index, target);
            ctx.emit(TaskEvent::Resolved {
                index,
                path: target.path(),
                source: target.source,
            });
            task.set_target(target);
            retrieval::execute(&task, &ctx.command, scope, &ctx.exec).await
        }
        Err(e) => ExecutionOutcome::new(index, OutcomeKind::DestinationError, e.to_string()),
    };

    if let Err(e) = task.finish(&outcome) {
        tracing::error!(task = index, error = %e, "task outcome not applied");
    }
    match &outcome.kind {
        OutcomeKind::Success => {
            tracing::info!(task = index, locator = task.locator(), "task succeeded");
            ctx.emit(TaskEvent::Succeeded {
                index,
                path: task.destination().unwrap_or_default(),
            });
        }
        kind => {
            tracing::warn!(
                task = index,
                locator = task.locator(),
                reason = %kind,
                diagnostic = %outcome.diagnostic,
                "task failed"
            );
            ctx.emit(TaskEvent::Failed {
                index,
                locator: task.locator().to_string(),
                reason: kind.to_string(),
            });
        }
    }
    drop(permit);
    (task, outcome)
}

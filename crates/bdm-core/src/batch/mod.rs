//! Batch orchestration: tasks, their lifecycle, progress events and the final report.

mod events;
mod names;
mod report;
mod run;
mod task;

pub use events::TaskEvent;
pub use report::{BatchExit, BatchReport, TaskRecord};
pub use run::{BatchSettings, Orchestrator, SKIP_REASON};
pub use task::{Batch, FailureDetail, InvalidTransition, Task, TaskStatus};

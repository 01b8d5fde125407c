//! Retrieval executor: runs the external retrieval command for one task
//! under a timeout and the batch cancellation scope, and classifies how it ended.
//!
//! The command itself is opaque: its options are passed through untouched and
//! its exit codes are interpreted only through a declarative [`ExitCodeTable`].

mod command;
mod execute;
mod exit_codes;
mod outcome;
mod terminate;

pub use command::{PassThroughOptions, RetrievalCommand};
pub use execute::{execute, ExecOptions};
pub use exit_codes::{ExitCodeEntry, ExitCodeTable, FailureCategory};
pub use outcome::{ExecutionOutcome, OutcomeKind};

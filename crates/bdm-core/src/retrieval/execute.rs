//! Run one retrieval under a deadline and the batch cancellation scope.

use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::task::JoinHandle;

use crate::batch::Task;
use crate::cancel::CancellationScope;

use super::command::RetrievalCommand;
use super::exit_codes::ExitCodeTable;
use super::outcome::{ExecutionOutcome, OutcomeKind};
use super::terminate::terminate;

/// Bytes of tool stderr kept for diagnostics in quiet mode.
const DIAGNOSTIC_TAIL_BYTES: usize = 4096;

/// How long to wait for the stderr reader once the tool has ended.
const STDERR_DRAIN: Duration = Duration::from_secs(1);

/// Per-execution settings.
#[derive(Debug, Clone)]
pub struct ExecOptions {
    /// Deadline counted from launch.
    pub timeout: Duration,
    /// Time between SIGTERM and SIGKILL when stopping the tool.
    pub kill_grace: Duration,
    /// Suppress the tool's live output; keep only a stderr tail for failures.
    pub quiet: bool,
}

impl Default for ExecOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(3 * 60 * 60),
            kill_grace: Duration::from_secs(5),
            quiet: false,
        }
    }
}

enum Ended {
    Exited(std::io::Result<ExitStatus>),
    Cancelled,
    TimedOut,
}

/// Runs the retrieval command for `task`, which must already carry a resolved target.
///
/// Never returns before the launched process has been reaped. Every way the run
/// can end is folded into the returned outcome.
pub async fn execute(
    task: &Task,
    command: &RetrievalCommand,
    scope: &CancellationScope,
    opts: &ExecOptions,
) -> ExecutionOutcome {
    let index = task.index();
    let Some(target) = task.target() else {
        return ExecutionOutcome::new(
            index,
            OutcomeKind::DestinationError,
            "task has no resolved target",
        );
    };
    if scope.is_triggered() {
        return ExecutionOutcome::new(
            index,
            OutcomeKind::Cancelled,
            "batch cancelled before the retrieval command was launched",
        );
    }

    let mut cmd = command.to_command(target, task.locator());
    cmd.stdin(Stdio::null()).kill_on_drop(true);
    if opts.quiet {
        cmd.stdout(Stdio::null()).stderr(Stdio::piped());
    } else {
        cmd.stdout(Stdio::inherit()).stderr(Stdio::inherit());
    }
    // Own process group: terminal signals reach us, not the tool, and the
    // whole tree can be stopped at once.
    #[cfg(unix)]
    cmd.process_group(0);

    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(e) => {
            return ExecutionOutcome::new(
                index,
                OutcomeKind::TransportError,
                format!("failed to start '{}': {}", command.program(), e),
            );
        }
    };
    tracing::debug!(
        task = index,
        pid = child.id(),
        program = command.program(),
        "retrieval command started"
    );

    let stderr_tail = child
        .stderr
        .take()
        .map(|stderr| tokio::spawn(capture_tail(stderr)));

    let deadline = tokio::time::sleep(opts.timeout);
    tokio::pin!(deadline);

    let ended = tokio::select! {
        biased;
        status = child.wait() => Ended::Exited(status),
        _ = scope.cancelled() => Ended::Cancelled,
        _ = &mut deadline => Ended::TimedOut,
    };

    let (kind, mut diagnostic) = match ended {
        Ended::Exited(Ok(status)) => classify_exit(status, command.exit_codes()),
        Ended::Exited(Err(e)) => (
            OutcomeKind::TransportError,
            format!("waiting for '{}': {}", command.program(), e),
        ),
        Ended::Cancelled => {
            terminate(&mut child, opts.kill_grace).await;
            (
                OutcomeKind::Cancelled,
                "download cancelled as part of batch interruption".to_string(),
            )
        }
        Ended::TimedOut => {
            terminate(&mut child, opts.kill_grace).await;
            let kind = OutcomeKind::Timeout {
                after_ms: u64::try_from(opts.timeout.as_millis()).unwrap_or(u64::MAX),
            };
            let text = format!("download {}", kind);
            (kind, text)
        }
    };

    if let Some(handle) = stderr_tail {
        if let Some(tail) = collect_tail(handle, STDERR_DRAIN).await {
            let tail = tail.trim_end();
            if !kind.is_success() && !tail.is_empty() {
                diagnostic.push('\n');
                diagnostic.push_str(tail);
            }
        }
    }

    tracing::debug!(task = index, outcome = %kind, "retrieval command finished");
    ExecutionOutcome::new(index, kind, diagnostic)
}

/// Maps an exit status through the tool's exit-code table.
fn classify_exit(status: ExitStatus, table: &ExitCodeTable) -> (OutcomeKind, String) {
    match status.code() {
        Some(0) => (OutcomeKind::Success, String::new()),
        Some(code) => {
            let kind = OutcomeKind::ToolError {
                code: Some(code),
                category: table.lookup(code),
            };
            let text = kind.to_string();
            (kind, text)
        }
        None => (
            OutcomeKind::ToolError {
                code: None,
                category: None,
            },
            describe_signal(status),
        ),
    }
}

#[cfg(unix)]
fn describe_signal(status: ExitStatus) -> String {
    use std::os::unix::process::ExitStatusExt;
    match status.signal() {
        Some(sig) => format!("retrieval command terminated by signal {}", sig),
        None => "retrieval command ended without an exit code".to_string(),
    }
}

#[cfg(not(unix))]
fn describe_signal(_status: ExitStatus) -> String {
    "retrieval command ended without an exit code".to_string()
}

/// Waits up to `wait` for the stderr reader. A leftover descendant can keep
/// the pipe open past the tool's exit; the reader is aborted in that case.
async fn collect_tail(mut handle: JoinHandle<String>, wait: Duration) -> Option<String> {
    match tokio::time::timeout(wait, &mut handle).await {
        Ok(Ok(tail)) => Some(tail),
        Ok(Err(e)) => {
            tracing::debug!(error = %e, "stderr reader failed");
            None
        }
        Err(_) => {
            handle.abort();
            tracing::debug!("stderr still open after the tool ended, reader aborted");
            None
        }
    }
}

/// Reads `reader` to the end, keeping only the last few KiB.
async fn capture_tail<R: AsyncRead + Unpin>(mut reader: R) -> String {
    let mut tail: Vec<u8> = Vec::new();
    let mut buf = [0u8; 4096];
    loop {
        match reader.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                tail.extend_from_slice(&buf[..n]);
                if tail.len() > DIAGNOSTIC_TAIL_BYTES {
                    let excess = tail.len() - DIAGNOSTIC_TAIL_BYTES;
                    tail.drain(..excess);
                }
            }
        }
    }
    String::from_utf8_lossy(&tail).into_owned()
}

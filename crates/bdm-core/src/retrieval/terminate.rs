//! Stopping a running retrieval command together with its descendants.

use std::time::Duration;
use tokio::process::Child;

/// Terminates `child` and, on unix, its whole process group.
///
/// Sends SIGTERM to the group, waits up to `grace` for the child to exit, then
/// SIGKILLs whatever is left. Always reaps the child before returning.
pub(super) async fn terminate(child: &mut Child, grace: Duration) {
    #[cfg(unix)]
    if let Some(pid) = child.id() {
        signal_group(pid, libc::SIGTERM);
        let exited = tokio::time::timeout(grace, child.wait()).await.is_ok();
        // Descendants that ignored SIGTERM keep the group alive after the leader exits.
        signal_group(pid, libc::SIGKILL);
        if exited {
            return;
        }
        tracing::debug!(pid, "retrieval command ignored SIGTERM; killed");
    }

    if let Err(e) = child.kill().await {
        tracing::debug!(error = %e, "kill retrieval command");
    }
}

#[cfg(unix)]
fn signal_group(pid: u32, signal: libc::c_int) {
    let Ok(pgid) = libc::pid_t::try_from(pid) else {
        return;
    };
    // SAFETY: kill(2) has no memory-safety preconditions; a stale group id yields ESRCH.
    unsafe {
        libc::kill(-pgid, signal);
    }
}

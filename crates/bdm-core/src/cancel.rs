//! Cancellation controller: turns SIGINT/SIGTERM into one shared, write-once
//! cancellation event observed by every task of a batch.
//!
//! Workers only ever hold a [`CancellationScope`], which can be checked and
//! awaited but not triggered; the controller is the single writer.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Read-only view of the batch cancellation state.
#[derive(Debug, Clone)]
pub struct CancellationScope {
    token: CancellationToken,
}

impl CancellationScope {
    pub fn is_triggered(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Completes once the scope is triggered (immediately if it already was).
    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }
}

/// Owner of the cancellation state for one batch.
///
/// Dropping the controller stops listening for signals.
#[derive(Debug, Default)]
pub struct CancellationController {
    token: CancellationToken,
    by_signal: Arc<AtomicBool>,
    listener: Option<JoinHandle<()>>,
}

impl CancellationController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs the SIGINT/SIGTERM handlers and returns the shared scope.
    ///
    /// Handlers are registered before this returns, so a signal arriving right
    /// after is already turned into cancellation. Calling it again keeps the
    /// existing listener. Must run inside a tokio runtime.
    pub fn arm(&mut self) -> CancellationScope {
        if self.listener.is_none() {
            let signals = Signals::register();
            let token = self.token.clone();
            let by_signal = Arc::clone(&self.by_signal);
            self.listener = Some(tokio::spawn(async move {
                listen_for_signals(signals, token, by_signal).await;
            }));
        }
        self.scope()
    }

    pub fn scope(&self) -> CancellationScope {
        CancellationScope {
            token: self.token.clone(),
        }
    }

    /// Triggers cancellation. Idempotent and irreversible.
    pub fn trigger(&self) {
        if !self.token.is_cancelled() {
            tracing::info!("batch cancellation triggered");
        }
        self.token.cancel();
    }

    pub fn is_triggered(&self) -> bool {
        self.token.is_cancelled()
    }

    /// True if cancellation came from a process signal rather than `trigger`.
    pub fn triggered_by_signal(&self) -> bool {
        self.by_signal.load(Ordering::Acquire)
    }
}

impl Drop for CancellationController {
    fn drop(&mut self) {
        if let Some(listener) = self.listener.take() {
            listener.abort();
        }
    }
}

/// Waits for signals for the lifetime of the listener. The first one cancels
/// the token; later ones are swallowed so a second Ctrl+C does not kill the
/// process while workers are still terminating their children.
async fn listen_for_signals(
    mut signals: Signals,
    token: CancellationToken,
    by_signal: Arc<AtomicBool>,
) {
    loop {
        let Some(name) = signals.recv().await else {
            return;
        };
        if token.is_cancelled() {
            tracing::debug!(signal = name, "already cancelling; signal ignored");
            continue;
        }
        tracing::warn!(signal = name, "interrupt received, cancelling batch");
        by_signal.store(true, Ordering::Release);
        token.cancel();
    }
}

/// Registered interruption handlers.
#[cfg(unix)]
struct Signals {
    sigterm: Option<tokio::signal::unix::Signal>,
    sigint: Option<tokio::signal::unix::Signal>,
}

#[cfg(unix)]
impl Signals {
    /// Registration may fail in restricted environments (containers, tests);
    /// whatever could be installed is kept.
    fn register() -> Self {
        use tokio::signal::unix::{signal, SignalKind};

        let sigterm = signal(SignalKind::terminate())
            .map_err(|e| tracing::warn!(error = %e, "could not register SIGTERM handler"))
            .ok();
        let sigint = signal(SignalKind::interrupt())
            .map_err(|e| tracing::warn!(error = %e, "could not register SIGINT handler"))
            .ok();
        Self { sigterm, sigint }
    }

    /// Name of the next signal received, or `None` once no source is left.
    async fn recv(&mut self) -> Option<&'static str> {
        match (self.sigterm.as_mut(), self.sigint.as_mut()) {
            (Some(sigterm), Some(sigint)) => tokio::select! {
                r = sigterm.recv() => r.map(|_| "SIGTERM"),
                r = sigint.recv() => r.map(|_| "SIGINT"),
            },
            (Some(sigterm), None) => sigterm.recv().await.map(|_| "SIGTERM"),
            (None, Some(sigint)) => sigint.recv().await.map(|_| "SIGINT"),
            (None, None) => {
                tracing::error!("no signal handlers registered, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok().map(|_| "ctrl-c")
            }
        }
    }
}

#[cfg(not(unix))]
struct Signals;

#[cfg(not(unix))]
impl Signals {
    fn register() -> Self {
        Signals
    }

    async fn recv(&mut self) -> Option<&'static str> {
        match tokio::signal::ctrl_c().await {
            Ok(()) => Some("ctrl-c"),
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for Ctrl+C");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn trigger_is_idempotent_and_visible_to_scopes() {
        let controller = CancellationController::new();
        let scope = controller.scope();
        let other = scope.clone();
        assert!(!scope.is_triggered());
        controller.trigger();
        controller.trigger();
        assert!(controller.is_triggered());
        assert!(scope.is_triggered());
        assert!(other.is_triggered());
        assert!(!controller.triggered_by_signal());
    }

    #[tokio::test]
    async fn cancelled_wakes_waiters() {
        let mut controller = CancellationController::new();
        let scope = controller.arm();
        let waiter = tokio::spawn(async move { scope.cancelled().await });
        tokio::time::sleep(Duration::from_millis(20)).await;
        controller.trigger();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should wake")
            .unwrap();
    }

    #[tokio::test]
    async fn scope_from_arm_shares_state() {
        let mut controller = CancellationController::new();
        let a = controller.arm();
        let b = controller.arm();
        controller.trigger();
        assert!(a.is_triggered() && b.is_triggered());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn signal_right_after_arm_becomes_cancellation() {
        let mut controller = CancellationController::new();
        let scope = controller.arm();

        // No await between arm and the signal: the handler must already be in place.
        unsafe {
            libc::raise(libc::SIGTERM);
        }
        tokio::time::timeout(Duration::from_secs(2), scope.cancelled())
            .await
            .expect("signal should trigger the scope");
        assert!(scope.is_triggered());
        assert!(controller.triggered_by_signal());

        // A second signal is swallowed and leaves the state unchanged.
        unsafe {
            libc::raise(libc::SIGTERM);
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(controller.is_triggered());
        assert!(controller.triggered_by_signal());
    }
}

//! Concurrency limiter: a fixed-size admission pool shared by the workers of a batch.
//!
//! Each admitted task holds a [`Permit`] until it reaches a terminal state; the
//! permit is released when dropped. Admission gives up as soon as the
//! cancellation scope triggers instead of waiting for a free slot.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::cancel::CancellationScope;
use crate::error::ConfigError;

/// Result of [`AdmissionPool::admit`].
#[derive(Debug)]
pub enum Admission {
    /// A slot was free; run the task while holding the permit.
    Granted(Permit),
    /// The batch was cancelled; do not start the task.
    Cancelled,
}

/// Counting admission pool sized to the configured parallelism.
#[derive(Debug, Clone)]
pub struct AdmissionPool {
    semaphore: Arc<Semaphore>,
    capacity: usize,
    counters: Arc<Counters>,
}

#[derive(Debug, Default)]
struct Counters {
    in_use: AtomicUsize,
    peak: AtomicUsize,
}

impl AdmissionPool {
    /// Create a pool with `parallelism` slots. Zero is a configuration error.
    pub fn new(parallelism: usize) -> Result<Self, ConfigError> {
        if parallelism == 0 {
            return Err(ConfigError::InvalidParallelism(parallelism));
        }
        Ok(Self {
            semaphore: Arc::new(Semaphore::new(parallelism)),
            capacity: parallelism,
            counters: Arc::new(Counters::default()),
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of permits currently held.
    pub fn in_use(&self) -> usize {
        self.counters.in_use.load(Ordering::Acquire)
    }

    /// Highest number of permits held at the same time since the pool was created.
    pub fn peak(&self) -> usize {
        self.counters.peak.load(Ordering::Acquire)
    }

    /// Waits for a free slot. Returns [`Admission::Cancelled`] without waiting
    /// if `scope` has already triggered, or as soon as it triggers while waiting.
    pub async fn admit(&self, scope: &CancellationScope) -> Admission {
        if scope.is_triggered() {
            return Admission::Cancelled;
        }
        let acquired = tokio::select! {
            biased;
            _ = scope.cancelled() => return Admission::Cancelled,
            acquired = Arc::clone(&self.semaphore).acquire_owned() => acquired,
        };
        let Ok(permit) = acquired else {
            return Admission::Cancelled;
        };
        // A trigger that raced with the acquire still wins.
        if scope.is_triggered() {
            return Admission::Cancelled;
        }

        let now = self.counters.in_use.fetch_add(1, Ordering::AcqRel) + 1;
        self.counters.peak.fetch_max(now, Ordering::AcqRel);
        Admission::Granted(Permit {
            _permit: permit,
            counters: Arc::clone(&self.counters),
        })
    }

    /// Gives a slot back. Equivalent to dropping the permit.
    pub fn release(&self, permit: Permit) {
        drop(permit);
    }
}

/// One slot of the admission pool; released on drop.
#[derive(Debug)]
pub struct Permit {
    _permit: OwnedSemaphorePermit,
    counters: Arc<Counters>,
}

impl Drop for Permit {
    fn drop(&mut self) {
        self.counters.in_use.fetch_sub(1, Ordering::AcqRel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::CancellationController;
    use std::time::Duration;

    #[test]
    fn zero_parallelism_is_rejected() {
        assert!(matches!(
            AdmissionPool::new(0),
            Err(ConfigError::InvalidParallelism(0))
        ));
    }

    #[tokio::test]
    async fn admit_and_release() {
        let controller = CancellationController::new();
        let scope = controller.scope();
        let pool = AdmissionPool::new(2).unwrap();
        let a = pool.admit(&scope).await;
        let b = pool.admit(&scope).await;
        assert_eq!(pool.in_use(), 2);
        let Admission::Granted(a) = a else {
            panic!("expected permit")
        };
        pool.release(a);
        assert_eq!(pool.in_use(), 1);
        drop(b);
        assert_eq!(pool.in_use(), 0);
        assert_eq!(pool.peak(), 2);
    }

    #[tokio::test]
    async fn blocked_admit_returns_on_cancel() {
        let controller = CancellationController::new();
        let scope = controller.scope();
        let pool = AdmissionPool::new(1).unwrap();
        let _held = pool.admit(&scope).await;

        let waiter = {
            let pool = pool.clone();
            let scope = scope.clone();
            tokio::spawn(async move { pool.admit(&scope).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        controller.trigger();
        let res = tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("admit should not block after cancel")
            .unwrap();
        assert!(matches!(res, Admission::Cancelled));
    }

    #[tokio::test]
    async fn admit_after_trigger_is_refused_even_with_free_slots() {
        let controller = CancellationController::new();
        controller.trigger();
        let pool = AdmissionPool::new(4).unwrap();
        assert!(matches!(
            pool.admit(&controller.scope()).await,
            Admission::Cancelled
        ));
        assert_eq!(pool.in_use(), 0);
    }
}

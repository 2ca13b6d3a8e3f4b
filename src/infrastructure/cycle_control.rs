//! Resolution Cycle Control
//!
//! Single-flight admission and cooperative cancellation for resolution
//! cycles. Cancellation is only observed between provider attempts; an
//! in-flight request is left to finish or time out on its own.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// Cancellation flag for one cycle.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Resolves once the token is cancelled.
    pub async fn cancelled(&self) {
        loop {
            // Registered before the flag check so a concurrent cancel is not missed.
            let notified = self.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}

/// Coordinator allowing at most one resolution cycle at a time.
#[derive(Clone, Default)]
pub struct CycleController {
    /// Whether a cycle currently holds the guard
    running: Arc<AtomicBool>,
    /// Token of the running cycle, if any
    current: Arc<Mutex<Option<CancellationToken>>>,
}

impl CycleController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admit a new cycle, or return `None` if one is already running.
    pub fn try_begin(&self) -> Option<CycleGuard> {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::debug!("resolution cycle rejected: another cycle is in flight");
            return None;
        }

        let token = CancellationToken::new();
        *self.current.lock() = Some(token.clone());

        Some(CycleGuard {
            controller: self.clone(),
            token,
        })
    }

    /// Whether a cycle is in flight.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Request cancellation of the running cycle. Returns false if idle.
    pub fn cancel(&self) -> bool {
        match self.current.lock().as_ref() {
            Some(token) => {
                tracing::info!("cancelling resolution cycle");
                token.cancel();
                true
            }
            None => false,
        }
    }

    fn finish(&self) {
        *self.current.lock() = None;
        self.running.store(false, Ordering::SeqCst);
    }
}

/// RAII guard for the running cycle.
///
/// Releases the single-flight slot when dropped, including when the
/// cycle's task panics or is aborted.
pub struct CycleGuard {
    controller: CycleController,
    token: CancellationToken,
}

impl CycleGuard {
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }
}

impl Drop for CycleGuard {
    fn drop(&mut self) {
        self.controller.finish();
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_controller_starts_idle() {
        let controller = CycleController::new();
        assert!(!controller.is_running());
        assert!(!controller.cancel());
    }

    #[test]
    fn test_single_flight() {
        let controller = CycleController::new();

        let guard = controller.try_begin();
        assert!(guard.is_some());
        assert!(controller.is_running());

        // Second admission is rejected while the first is alive
        assert!(controller.try_begin().is_none());

        drop(guard);
        assert!(!controller.is_running());
        assert!(controller.try_begin().is_some());
    }

    #[test]
    fn test_cancel_reaches_running_cycle() {
        let controller = CycleController::new();
        let guard = controller.try_begin().unwrap();
        let token = guard.token();

        assert!(!token.is_cancelled());
        assert!(controller.cancel());
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_new_cycle_gets_fresh_token() {
        let controller = CycleController::new();

        let first = controller.try_begin().unwrap();
        controller.cancel();
        drop(first);

        let second = controller.try_begin().unwrap();
        assert!(!second.token().is_cancelled());
    }

    #[tokio::test]
    async fn test_cancelled_wakes_waiter() {
        let token = CancellationToken::new();
        let waiter = token.clone();
        let task = tokio::spawn(async move { waiter.cancelled().await });

        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        token.cancel();

        tokio::time::timeout(std::time::Duration::from_secs(1), task)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_cancelled_returns_at_once_when_already_cancelled() {
        let token = CancellationToken::new();
        token.cancel();
        tokio::time::timeout(std::time::Duration::from_millis(100), token.cancelled())
            .await
            .unwrap();
    }

    #[test]
    fn test_clones_share_state() {
        let controller = CycleController::new();
        let other = controller.clone();

        let _guard = controller.try_begin().unwrap();
        assert!(other.is_running());
        assert!(other.try_begin().is_none());
    }
}

//! Cooperative cancellation for worker threads.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

struct Inner {
    cancelled: AtomicBool,
    lock: Mutex<()>,
    wakeup: Condvar,
}

/// Shared stop flag observed by a worker body.
///
/// Cancelling never interrupts the thread. Workers check
/// [`is_cancelled`](Self::is_cancelled) between units of work, or sleep with
/// [`wait_timeout`](Self::wait_timeout), which returns early on cancel.
#[derive(Clone)]
pub struct CancellationToken {
    inner: Arc<Inner>,
}

impl CancellationToken {
    /// Create a token in the not-cancelled state.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                cancelled: AtomicBool::new(false),
                lock: Mutex::new(()),
                wakeup: Condvar::new(),
            }),
        }
    }

    /// Request cancellation and wake every thread sleeping on this token.
    pub fn cancel(&self) {
        // Store under the lock so a waiter cannot miss the wakeup between
        // its flag check and the condvar wait.
        let _guard = self.inner.lock.lock();
        self.inner.cancelled.store(true, Ordering::SeqCst);
        self.inner.wakeup.notify_all();
    }

    /// Check whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Sleep for up to `timeout`, returning early if the token is cancelled.
    ///
    /// Returns `true` if the token is cancelled when the call returns.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut guard = self.inner.lock.lock();
        while !self.is_cancelled() {
            if self.inner.wakeup.wait_until(&mut guard, deadline).timed_out() {
                break;
            }
        }
        self.is_cancelled()
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancellationToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_token_new() {
        let token = CancellationToken::new();
        assert!(!token.is_cancelled());
    }

    #[test]
    fn test_cancel_is_shared_by_clones() {
        let token = CancellationToken::new();
        let cloned = token.clone();

        token.cancel();
        assert!(cloned.is_cancelled());
    }

    #[test]
    fn test_wait_timeout_elapses() {
        let token = CancellationToken::new();
        let started = Instant::now();

        assert!(!token.wait_timeout(Duration::from_millis(50)));
        assert!(started.elapsed() >= Duration::from_millis(50));
    }

    #[test]
    fn test_wait_timeout_returns_early_on_cancel() {
        let token = CancellationToken::new();
        let canceller = token.clone();

        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            canceller.cancel();
        });

        let started = Instant::now();
        assert!(token.wait_timeout(Duration::from_secs(10)));
        assert!(started.elapsed() < Duration::from_secs(5));
        handle.join().unwrap();
    }

    #[test]
    fn test_wait_after_cancel_is_immediate() {
        let token = CancellationToken::new();
        token.cancel();
        assert!(token.wait_timeout(Duration::from_secs(10)));
    }
}

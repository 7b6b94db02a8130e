//! Blocking thread-safe double-ended queue.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex, MutexGuard};

/// A double-ended queue guarded by a mutex and a condition variable.
///
/// Producers push at either end; each push wakes one blocked consumer.
/// Values are moved in and out, so no element is ever shared between
/// threads. Every accessor takes the lock for the duration of the call only,
/// so the results of [`len`](Self::len), [`front`](Self::front) and friends
/// are snapshots that may be stale once another thread mutates the queue.
pub struct ThreadSafeDeque<T> {
    items: Mutex<VecDeque<T>>,
    available: Condvar,
}

/// End of the deque an operation works on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum End {
    Front,
    Back,
}

impl<T> ThreadSafeDeque<T> {
    /// Create an empty deque.
    pub fn new() -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
            available: Condvar::new(),
        }
    }

    /// Create an empty deque with room for `capacity` elements.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Mutex::new(VecDeque::with_capacity(capacity)),
            available: Condvar::new(),
        }
    }

    /// Push a value at the front and wake one waiter.
    pub fn push_front(&self, value: T) {
        self.items.lock().push_front(value);
        self.available.notify_one();
    }

    /// Push a value at the back and wake one waiter.
    pub fn push_back(&self, value: T) {
        self.items.lock().push_back(value);
        self.available.notify_one();
    }

    /// Pop from the front, blocking until a value arrives.
    ///
    /// With `Some(timeout)` the wait is bounded and `None` is returned once
    /// it elapses. With `None` the call waits forever.
    pub fn pop_front(&self, timeout: Option<Duration>) -> Option<T> {
        self.pop_blocking(End::Front, timeout)
    }

    /// Pop from the back, blocking until a value arrives.
    ///
    /// See [`pop_front`](Self::pop_front) for the timeout semantics.
    pub fn pop_back(&self, timeout: Option<Duration>) -> Option<T> {
        self.pop_blocking(End::Back, timeout)
    }

    /// Pop from the front, waiting as long as it takes.
    pub fn wait_pop_front(&self) -> T {
        loop {
            if let Some(value) = self.pop_blocking(End::Front, None) {
                return value;
            }
        }
    }

    /// Pop from the back, waiting as long as it takes.
    pub fn wait_pop_back(&self) -> T {
        loop {
            if let Some(value) = self.pop_blocking(End::Back, None) {
                return value;
            }
        }
    }

    /// Pop from the front without blocking.
    pub fn try_pop_front(&self) -> Option<T> {
        self.items.lock().pop_front()
    }

    /// Pop from the back without blocking.
    pub fn try_pop_back(&self) -> Option<T> {
        self.items.lock().pop_back()
    }

    /// Number of elements currently queued.
    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    /// Whether the deque is currently empty.
    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }

    /// Remove every queued element.
    pub fn clear(&self) {
        self.items.lock().clear();
    }

    fn pop_blocking(&self, end: End, timeout: Option<Duration>) -> Option<T> {
        let mut items = self.items.lock();
        match timeout {
            None => {
                self.available.wait_while(&mut items, |items| items.is_empty());
            }
            Some(timeout) => {
                let deadline = Instant::now() + timeout;
                // Loop on the predicate: wakeups can be spurious or stolen by
                // another consumer.
                while items.is_empty() {
                    if self.available.wait_until(&mut items, deadline).timed_out() {
                        break;
                    }
                }
            }
        }
        Self::take(&mut items, end)
    }

    fn take(items: &mut MutexGuard<'_, VecDeque<T>>, end: End) -> Option<T> {
        match end {
            End::Front => items.pop_front(),
            End::Back => items.pop_back(),
        }
    }
}

impl<T: Clone> ThreadSafeDeque<T> {
    /// Copy of the front element, if any.
    pub fn front(&self) -> Option<T> {
        self.items.lock().front().cloned()
    }

    /// Copy of the back element, if any.
    pub fn back(&self) -> Option<T> {
        self.items.lock().back().cloned()
    }
}

impl<T> Default for ThreadSafeDeque<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> Clone for ThreadSafeDeque<T> {
    /// Snapshot the source under its lock. The clone has its own waiters.
    fn clone(&self) -> Self {
        let items = self.items.lock().clone();
        Self {
            items: Mutex::new(items),
            available: Condvar::new(),
        }
    }
}

impl<T> From<Vec<T>> for ThreadSafeDeque<T> {
    fn from(values: Vec<T>) -> Self {
        Self {
            items: Mutex::new(VecDeque::from(values)),
            available: Condvar::new(),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for ThreadSafeDeque<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreadSafeDeque")
            .field("items", &*self.items.lock())
            .finish()
    }
}

#[cfg(test)]
#[path = "deque_tests.rs"]
mod tests;

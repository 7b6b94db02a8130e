//! Unbounded single-producer/single-consumer lock-free queue.
//!
//! The queue is a singly linked list with a permanent sentinel node. `push`
//! stores the value into the current tail (the sentinel) and publishes a
//! fresh empty node as the new tail; `pop` advances `head` and returns the
//! payload of the node it leaves behind. `head == tail` means empty, and
//! neither pointer is ever null.
//!
//! Only one thread may push and only one thread may pop at a time: `push`
//! does not CAS the tail, so two concurrent producers would corrupt the
//! chain. This is enforced by the API rather than by the algorithm. Methods
//! on [`LockFreeQueue`] take `&mut self`, and concurrent use goes through
//! [`LockFreeQueue::split`], which hands out exactly one non-cloneable
//! [`Producer`] and one [`Consumer`].

use std::cell::Cell;
use std::marker::PhantomData;
use std::ptr;
use std::sync::atomic::{AtomicPtr, Ordering};
use std::sync::Arc;

use crossbeam_utils::CachePadded;

struct Node<T> {
    value: Option<T>,
    next: AtomicPtr<Node<T>>,
}

impl<T> Node<T> {
    fn sentinel() -> *mut Self {
        Box::into_raw(Box::new(Self {
            value: None,
            next: AtomicPtr::new(ptr::null_mut()),
        }))
    }
}

/// Shared list state. `head` belongs to the consumer, `tail` to the producer.
struct Inner<T> {
    head: CachePadded<AtomicPtr<Node<T>>>,
    tail: CachePadded<AtomicPtr<Node<T>>>,
}

// SAFETY: nodes are only reached through `head`/`tail`, and the split API
// guarantees a single writer for each pointer. Values cross threads by move.
// `Producer` and `Consumer` are `!Sync`, so borrowed values are never seen
// by two threads at once.
unsafe impl<T: Send> Send for Inner<T> {}
unsafe impl<T: Send> Sync for Inner<T> {}

impl<T> Inner<T> {
    fn new() -> Self {
        let sentinel = Node::sentinel();
        Self {
            head: CachePadded::new(AtomicPtr::new(sentinel)),
            tail: CachePadded::new(AtomicPtr::new(sentinel)),
        }
    }

    /// Producer side only.
    fn push(&self, value: T) {
        let next = Node::sentinel();
        let tail = self.tail.load(Ordering::Relaxed);
        // SAFETY: `tail` is never null and the consumer never touches the
        // tail node, so the producer has exclusive access to it until the
        // store below publishes the new tail.
        unsafe {
            (*tail).value = Some(value);
            (*tail).next.store(next, Ordering::Release);
        }
        self.tail.store(next, Ordering::Release);
    }

    /// Consumer side only.
    fn pop(&self) -> Option<T> {
        let head = self.head.load(Ordering::Relaxed);
        if head == self.tail.load(Ordering::Acquire) {
            return None;
        }
        // SAFETY: `head != tail`, so the producer has finished with `head`
        // and published its `next`. Only the consumer frees nodes.
        unsafe {
            let next = (*head).next.load(Ordering::Acquire);
            self.head.store(next, Ordering::Release);
            let mut node = Box::from_raw(head);
            node.value.take()
        }
    }

    /// Consumer side only.
    fn front(&self) -> Option<&T> {
        let head = self.head.load(Ordering::Relaxed);
        if head == self.tail.load(Ordering::Acquire) {
            return None;
        }
        // SAFETY: as in `pop`; the node stays alive until the consumer pops it,
        // which requires `&mut` or a consumer method that cannot overlap the
        // returned borrow.
        unsafe { (*head).value.as_ref() }
    }

    fn is_empty(&self) -> bool {
        self.head.load(Ordering::Acquire) == self.tail.load(Ordering::Acquire)
    }
}

impl<T> Drop for Inner<T> {
    fn drop(&mut self) {
        let mut current = *self.head.get_mut();
        while !current.is_null() {
            // SAFETY: drop has exclusive access; every node was created by
            // `Box::into_raw` and is reachable exactly once from `head`.
            let node = unsafe { Box::from_raw(current) };
            current = node.next.load(Ordering::Relaxed);
        }
    }
}

/// Unbounded FIFO queue for one producer and one consumer.
///
/// Used directly, every method requires `&mut self`. Call
/// [`split`](Self::split) to move the two ends onto different threads.
pub struct LockFreeQueue<T> {
    inner: Inner<T>,
    /// Last node that received a value, for [`back`](Self::back).
    last: *mut Node<T>,
}

// SAFETY: `last` only ever points into the list owned by `inner`.
unsafe impl<T: Send> Send for LockFreeQueue<T> {}

impl<T> LockFreeQueue<T> {
    /// Create an empty queue holding just the sentinel node.
    pub fn new() -> Self {
        Self {
            inner: Inner::new(),
            last: ptr::null_mut(),
        }
    }

    /// Append a value. Always succeeds; allocates one node.
    pub fn push(&mut self, value: T) {
        self.last = self.inner.tail.load(Ordering::Relaxed);
        self.inner.push(value);
    }

    /// Remove and return the oldest value, or `None` when empty.
    pub fn try_pop(&mut self) -> Option<T> {
        let value = self.inner.pop();
        if self.inner.is_empty() {
            self.last = ptr::null_mut();
        }
        value
    }

    /// Alias of [`try_pop`](Self::try_pop).
    pub fn pop(&mut self) -> Option<T> {
        self.try_pop()
    }

    /// Borrow the oldest value without removing it.
    pub fn front(&self) -> Option<&T> {
        self.inner.front()
    }

    /// Borrow the most recently pushed value without removing it.
    pub fn back(&self) -> Option<&T> {
        if self.inner.is_empty() || self.last.is_null() {
            return None;
        }
        // SAFETY: the queue is non-empty, so `last` (the node that received
        // the newest value) has not been popped, and `&self` excludes pops.
        unsafe { (*self.last).value.as_ref() }
    }

    /// Whether the queue holds no values (`head == tail`).
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Split into a producer and a consumer that may live on different threads.
    pub fn split(self) -> (Producer<T>, Consumer<T>) {
        let inner = Arc::new(self.into_inner());
        (
            Producer {
                inner: Arc::clone(&inner),
                _not_sync: PhantomData,
            },
            Consumer {
                inner,
                _not_sync: PhantomData,
            },
        )
    }

    fn into_inner(self) -> Inner<T> {
        let Self { inner, .. } = self;
        inner
    }
}

impl<T> Default for LockFreeQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for LockFreeQueue<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockFreeQueue")
            .field("empty", &self.is_empty())
            .finish()
    }
}

/// Sending end of a split [`LockFreeQueue`].
///
/// Neither `Clone` nor `Sync`: it can move to another thread, but only one
/// thread ever pushes.
///
/// ```compile_fail
/// use taskctl_workqueue::LockFreeQueue;
///
/// let (producer, _consumer) = LockFreeQueue::<u32>::new().split();
/// std::thread::scope(|s| {
///     let shared = &producer;
///     s.spawn(move || shared.is_empty());
/// });
/// ```
pub struct Producer<T> {
    inner: Arc<Inner<T>>,
    _not_sync: PhantomData<Cell<()>>,
}

impl<T> Producer<T> {
    /// Append a value. Never blocks.
    pub fn push(&mut self, value: T) {
        self.inner.push(value);
    }

    /// Whether the consumer has drained everything pushed so far.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

/// Receiving end of a split [`LockFreeQueue`].
///
/// Neither `Clone` nor `Sync`, so a borrowed [`front`](Self::front) never
/// reaches a second thread:
///
/// ```compile_fail
/// use std::cell::Cell;
/// use taskctl_workqueue::LockFreeQueue;
///
/// let (mut producer, consumer) = LockFreeQueue::new().split();
/// producer.push(Cell::new(0u32));
/// std::thread::scope(|s| {
///     let shared = &consumer;
///     s.spawn(move || shared.front().map(|c| c.set(1)));
/// });
/// ```
pub struct Consumer<T> {
    inner: Arc<Inner<T>>,
    _not_sync: PhantomData<Cell<()>>,
}

impl<T> Consumer<T> {
    /// Remove and return the oldest value, or `None` when empty.
    pub fn try_pop(&mut self) -> Option<T> {
        self.inner.pop()
    }

    /// Alias of [`try_pop`](Self::try_pop).
    pub fn pop(&mut self) -> Option<T> {
        self.try_pop()
    }

    /// Borrow the oldest value without removing it.
    pub fn front(&self) -> Option<&T> {
        self.inner.front()
    }

    /// Whether there is nothing to pop right now.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Pop everything currently visible, in push order.
    pub fn drain(&mut self) -> impl Iterator<Item = T> + '_ {
        std::iter::from_fn(move || self.inner.pop())
    }
}

#[cfg(test)]
#[path = "lockfree_tests.rs"]
mod tests;

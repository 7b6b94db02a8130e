//! # taskctl Work Queue
//!
//! Concurrency primitives used by the taskctl daemon to run and tear down
//! background work.
//!
//! ## Features
//!
//! - Blocking thread-safe double-ended queue
//! - Single-producer/single-consumer lock-free queue
//! - RAII thread wrapper that joins on drop
//! - Cooperative cancellation tokens
//! - Worker task manager owning named, cancellable threads

pub mod cancel;
pub mod deque;
pub mod error;
pub mod lockfree;
pub mod manager;
pub mod scoped;

pub use cancel::CancellationToken;
pub use deque::ThreadSafeDeque;
pub use error::TaskError;
pub use lockfree::{Consumer, LockFreeQueue, Producer};
pub use manager::{ManagerHandle, TaskId, WorkerContext, WorkerTaskManager};
pub use scoped::ScopedThread;

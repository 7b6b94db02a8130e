//! Worker task manager owning named, cancellable threads.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, error, info};

use crate::cancel::CancellationToken;
use crate::error::TaskError;
use crate::scoped::ScopedThread;

/// Identifier of a started task. Allocated sequentially and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

impl TaskId {
    /// Raw sequence number.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "task-{}", self.0)
    }
}

struct WorkerEntry {
    name: String,
    token: CancellationToken,
    thread: ScopedThread<()>,
}

struct Registry {
    next_id: AtomicU64,
    workers: Mutex<BTreeMap<TaskId, WorkerEntry>>,
}

/// Everything a worker body receives when it starts.
pub struct WorkerContext {
    id: TaskId,
    token: CancellationToken,
    manager: ManagerHandle,
}

impl WorkerContext {
    /// Id of this worker.
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Cancellation token for this worker.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Read-only handle back to the owning manager.
    pub fn manager(&self) -> &ManagerHandle {
        &self.manager
    }

    /// Shortcut for `token().is_cancelled()`.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Shortcut for `token().wait_timeout(timeout)`.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        self.token.wait_timeout(timeout)
    }
}

/// Read-only view of a [`WorkerTaskManager`] handed to its workers.
///
/// It cannot stop tasks: a worker stopping itself would join its own thread.
#[derive(Clone)]
pub struct ManagerHandle {
    registry: Weak<Registry>,
}

impl ManagerHandle {
    /// Whether the manager still exists.
    pub fn is_alive(&self) -> bool {
        self.registry.strong_count() > 0
    }

    /// Number of registered workers, or 0 once the manager is gone.
    pub fn task_count(&self) -> usize {
        self.registry
            .upgrade()
            .map_or(0, |registry| registry.workers.lock().len())
    }

    /// Whether `id` is still registered.
    pub fn contains(&self, id: TaskId) -> bool {
        self.registry
            .upgrade()
            .is_some_and(|registry| registry.workers.lock().contains_key(&id))
    }
}

/// Owns a set of named worker threads, each with its own cancellation token.
///
/// Workers are cooperative: [`stop_task`](Self::stop_task) and
/// [`stop_all`](Self::stop_all) cancel the token and block until the body
/// returns. Dropping the manager runs `stop_all`, so no worker thread
/// outlives it.
pub struct WorkerTaskManager {
    registry: Arc<Registry>,
}

impl WorkerTaskManager {
    /// Create a manager with no workers.
    pub fn new() -> Self {
        Self {
            registry: Arc::new(Registry {
                next_id: AtomicU64::new(0),
                workers: Mutex::new(BTreeMap::new()),
            }),
        }
    }

    /// Handle that workers (or anyone else) can use to inspect the manager.
    pub fn handle(&self) -> ManagerHandle {
        ManagerHandle {
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Spawn a named worker running `body`.
    ///
    /// The body gets a fresh cancellation token and a handle to this
    /// manager. It must poll the token and return once it is cancelled.
    pub fn start_task<F>(&self, name: impl Into<String>, body: F) -> Result<TaskId, TaskError>
    where
        F: FnOnce(WorkerContext) + Send + 'static,
    {
        let name = name.into();
        let id = TaskId(self.registry.next_id.fetch_add(1, Ordering::SeqCst));
        let token = CancellationToken::new();
        let ctx = WorkerContext {
            id,
            token: token.clone(),
            manager: self.handle(),
        };

        // Register while holding the lock so the worker sees itself listed.
        let mut workers = self.registry.workers.lock();
        let thread_name = name.clone();
        let thread = ScopedThread::spawn(name.clone(), move || {
            debug!("Worker {} '{}' running", id, thread_name);
            body(ctx);
            debug!("Worker {} '{}' returned", id, thread_name);
        })?;
        workers.insert(
            id,
            WorkerEntry {
                name: name.clone(),
                token,
                thread,
            },
        );
        drop(workers);

        info!("Started worker {} '{}'", id, name);
        Ok(id)
    }

    /// Cancel and join one worker.
    ///
    /// Returns `Ok(false)` if `id` was never issued or was already stopped.
    /// A worker that panicked is still removed, and the panic is reported.
    pub fn stop_task(&self, id: TaskId) -> Result<bool, TaskError> {
        let Some(entry) = self.registry.workers.lock().remove(&id) else {
            debug!("Stop requested for unknown worker {}", id);
            return Ok(false);
        };

        entry.token.cancel();
        entry.thread.join()?;
        info!("Stopped worker {} '{}'", id, entry.name);
        Ok(true)
    }

    /// Cancel every worker, then join them all and clear the table.
    ///
    /// Idempotent. If any worker panicked, all others are still joined and
    /// the first panic is returned.
    pub fn stop_all(&self) -> Result<(), TaskError> {
        let workers = std::mem::take(&mut *self.registry.workers.lock());
        if workers.is_empty() {
            return Ok(());
        }

        for entry in workers.values() {
            entry.token.cancel();
        }

        let count = workers.len();
        let mut first_error = None;
        for (id, entry) in workers {
            if let Err(e) = entry.thread.join() {
                error!("Worker {} '{}' failed: {}", id, entry.name, e);
                first_error.get_or_insert(e);
            }
        }

        info!("Stopped all {} workers", count);
        first_error.map_or(Ok(()), Err)
    }

    /// Number of registered workers.
    pub fn len(&self) -> usize {
        self.registry.workers.lock().len()
    }

    /// Whether no worker is registered.
    pub fn is_empty(&self) -> bool {
        self.registry.workers.lock().is_empty()
    }

    /// Whether `id` is registered.
    pub fn contains(&self, id: TaskId) -> bool {
        self.registry.workers.lock().contains_key(&id)
    }

    /// Ids of registered workers in start order.
    pub fn task_ids(&self) -> Vec<TaskId> {
        self.registry.workers.lock().keys().copied().collect()
    }

    /// Name of the worker registered under `id`.
    pub fn task_name(&self, id: TaskId) -> Option<String> {
        self.registry
            .workers
            .lock()
            .get(&id)
            .map(|entry| entry.name.clone())
    }
}

impl Default for WorkerTaskManager {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for WorkerTaskManager {
    fn drop(&mut self) {
        if let Err(e) = self.stop_all() {
            error!("Worker shutdown on drop reported: {}", e);
        }
    }
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;

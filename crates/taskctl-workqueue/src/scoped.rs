//! Thread wrapper that joins on drop.

use std::thread::{self, JoinHandle, ThreadId};

use tracing::{debug, warn};

use crate::error::TaskError;

/// Owns exactly one OS thread and joins it when dropped.
///
/// Dropping during unwinding still joins, so a thread can never outlive the
/// scope that spawned it. Use [`join`](Self::join) to collect the result
/// explicitly.
pub struct ScopedThread<T = ()> {
    name: String,
    handle: Option<JoinHandle<T>>,
}

impl<T: Send + 'static> ScopedThread<T> {
    /// Spawn a named thread running `f`.
    pub fn spawn<F>(name: impl Into<String>, f: F) -> Result<Self, TaskError>
    where
        F: FnOnce() -> T + Send + 'static,
    {
        let name = name.into();
        let handle = thread::Builder::new()
            .name(name.clone())
            .spawn(f)
            .map_err(|source| TaskError::Spawn {
                name: name.clone(),
                source,
            })?;

        debug!("Spawned scoped thread '{}'", name);
        Ok(Self {
            name,
            handle: Some(handle),
        })
    }
}

impl<T> ScopedThread<T> {
    /// Name given at spawn time.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Id of the owned thread, or `None` once joined.
    pub fn thread_id(&self) -> Option<ThreadId> {
        self.handle.as_ref().map(|h| h.thread().id())
    }

    /// Whether the thread body has returned (or the thread was joined).
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Wait for the thread and return its result.
    pub fn join(mut self) -> Result<T, TaskError> {
        match self.handle.take() {
            Some(handle) => handle
                .join()
                .map_err(|payload| TaskError::from_panic(&self.name, payload)),
            None => unreachable!("ScopedThread handle is only taken by join or drop"),
        }
    }
}

impl<T> Drop for ScopedThread<T> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("Scoped thread '{}' panicked before it was joined", self.name);
            } else {
                debug!("Scoped thread '{}' joined on drop", self.name);
            }
        }
    }
}

impl<T> std::fmt::Debug for ScopedThread<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopedThread")
            .field("name", &self.name)
            .field("joined", &self.handle.is_none())
            .finish()
    }
}

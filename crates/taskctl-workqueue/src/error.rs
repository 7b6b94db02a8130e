//! Worker and thread errors.

use thiserror::Error;

/// Errors raised while spawning or joining worker threads.
#[derive(Debug, Error)]
pub enum TaskError {
    /// The OS refused to create a new thread.
    #[error("Failed to spawn thread '{name}': {source}")]
    Spawn {
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// The thread body panicked; the panic was caught by `join`.
    #[error("Thread '{name}' panicked: {message}")]
    Panicked { name: String, message: String },
}

impl TaskError {
    /// Build a `Panicked` error from the payload returned by `JoinHandle::join`.
    pub(crate) fn from_panic(name: &str, payload: Box<dyn std::any::Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic payload".to_string()
        };
        TaskError::Panicked {
            name: name.to_string(),
            message,
        }
    }
}

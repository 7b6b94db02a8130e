//! Daemon-related errors.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during daemon operations.
///
/// Lifecycle hooks never produce these: a hook that fails reports
/// [`HookOutcome::Failed`](crate::HookOutcome::Failed) instead.
#[derive(Debug, Error)]
pub enum DaemonError {
    /// Failed to create PID file.
    #[error("Failed to create PID file at {path}: {reason}")]
    PidFileCreation { path: PathBuf, reason: String },

    /// Failed to read PID file.
    #[error("Failed to read PID file at {path}: {reason}")]
    PidFileRead { path: PathBuf, reason: String },

    /// Failed to remove PID file.
    #[error("Failed to remove PID file at {path}: {reason}")]
    PidFileRemoval { path: PathBuf, reason: String },

    /// Process fork or session setup failed.
    #[error("Failed to daemonize process: {0}")]
    ForkFailed(String),

    /// Failed to set up signal handlers.
    #[error("Failed to set up signal handlers: {0}")]
    SignalSetup(String),

    /// Failed to deliver a signal to another process.
    #[error("Failed to send {signal} to PID {pid}: {reason}")]
    SignalSend {
        signal: String,
        pid: u32,
        reason: String,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

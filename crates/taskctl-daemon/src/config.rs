//! Daemon configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::DaemonError;

/// Process-level configuration handed to the lifecycle context.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Whether to fork into the background.
    #[serde(default)]
    pub is_daemon: bool,

    /// Where to write the PID after daemonizing. `None` skips the PID file.
    #[serde(default)]
    pub pid_file: Option<PathBuf>,

    /// Application configuration file checked by the context.
    #[serde(default)]
    pub config_file: Option<PathBuf>,
}

impl DaemonConfig {
    /// Create a foreground config with no PID or configuration file.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether the process daemonizes.
    pub fn with_daemon(mut self, is_daemon: bool) -> Self {
        self.is_daemon = is_daemon;
        self
    }

    /// Set the PID file path.
    pub fn with_pid_file(mut self, pid_file: impl Into<PathBuf>) -> Self {
        self.pid_file = Some(pid_file.into());
        self
    }

    /// Set the configuration file path.
    pub fn with_config_file(mut self, config_file: impl Into<PathBuf>) -> Self {
        self.config_file = Some(config_file.into());
        self
    }

    /// PID file path, if any.
    pub fn pid_file(&self) -> Option<&Path> {
        self.pid_file.as_deref()
    }

    /// Configuration file path, if any.
    pub fn config_file(&self) -> Option<&Path> {
        self.config_file.as_deref()
    }

    /// Validate the configuration structurally.
    ///
    /// Whether referenced files exist is up to the lifecycle context.
    pub fn validate(&self) -> Result<(), DaemonError> {
        if self.pid_file.as_ref().is_some_and(|p| p.as_os_str().is_empty()) {
            return Err(DaemonError::Config("pid_file must not be empty".to_string()));
        }

        if self
            .config_file
            .as_ref()
            .is_some_and(|p| p.as_os_str().is_empty())
        {
            return Err(DaemonError::Config(
                "config_file must not be empty".to_string(),
            ));
        }

        if self.pid_file.is_some() && !self.is_daemon {
            tracing::debug!("pid_file is only written when running as a daemon");
        }

        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

//! PID file written once the process has detached.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::DaemonError;

/// Decimal PID stored at a fixed path.
///
/// A `PidFile` that wrote its file deletes it again when dropped. A file
/// written by someone else is left alone.
#[derive(Debug)]
pub struct PidFile {
    path: PathBuf,
    owned: bool,
}

impl PidFile {
    /// Point at `path`. Nothing touches the filesystem yet.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            owned: false,
        }
    }

    /// Path the PID is stored at.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether a file is present at the path.
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Whether the file was written here and will be deleted on drop.
    pub fn is_owned(&self) -> bool {
        self.owned
    }

    /// PID stored in the file, or `None` when there is no file.
    pub fn read_pid(&self) -> Result<Option<u32>, DaemonError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.read_error(e.to_string())),
        };

        text.trim()
            .parse::<u32>()
            .map(Some)
            .map_err(|e| self.read_error(format!("Invalid PID format: {}", e)))
    }

    /// Store the PID of this process.
    pub fn write_pid(&mut self) -> Result<(), DaemonError> {
        self.write_pid_value(std::process::id())
    }

    /// Store `pid`, creating missing parent directories.
    pub fn write_pid_value(&mut self, pid: u32) -> Result<(), DaemonError> {
        let parent = self.path.parent().filter(|p| !p.as_os_str().is_empty());
        if let Some(dir) = parent {
            fs::create_dir_all(dir)
                .map_err(|e| self.create_error(format!("Failed to create parent directory: {}", e)))?;
        }

        fs::File::create(&self.path)
            .and_then(|mut file| write!(file, "{}", pid))
            .map_err(|e| self.create_error(e.to_string()))?;

        self.owned = true;
        info!("Wrote PID {} to {}", pid, self.path.display());
        Ok(())
    }

    /// Delete the file. A file that is already gone counts as removed.
    pub fn remove(&mut self) -> Result<(), DaemonError> {
        self.owned = false;
        match fs::remove_file(&self.path) {
            Ok(()) => {
                info!("Removed PID file {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(DaemonError::PidFileRemoval {
                path: self.path.clone(),
                reason: e.to_string(),
            }),
        }
    }

    fn read_error(&self, reason: String) -> DaemonError {
        DaemonError::PidFileRead {
            path: self.path.clone(),
            reason,
        }
    }

    fn create_error(&self, reason: String) -> DaemonError {
        DaemonError::PidFileCreation {
            path: self.path.clone(),
            reason,
        }
    }
}

impl Drop for PidFile {
    fn drop(&mut self) {
        if self.owned {
            if let Err(e) = self.remove() {
                warn!("Could not remove PID file on exit: {}", e);
            }
        }
    }
}

#[cfg(test)]
#[path = "pid_tests.rs"]
mod tests;

//! Detaching the current process into the background.

use std::path::Path;

use tracing::info;

use crate::error::DaemonError;
use crate::pid::PidFile;

/// Daemonize the process (Unix only).
///
/// Forks once (the parent exits with status 0), starts a new session,
/// changes to `/`, sets the umask to `0o022`, points the standard streams at
/// `/dev/null` and finally writes the child's PID to `pid_file` if one is
/// given. A relative `pid_file` is resolved against the working directory
/// at call time.
///
/// Must run before any other thread is spawned: only the calling thread
/// survives the fork.
///
/// The returned guard removes the PID file when dropped.
#[cfg(unix)]
pub fn make_daemon(pid_file: Option<&Path>) -> Result<Option<PidFile>, DaemonError> {
    use std::os::unix::io::AsRawFd;

    use nix::sys::stat::{Mode, umask};
    use nix::unistd::{ForkResult, chdir, dup2, fork, setsid};

    let pid_path = pid_file.map(std::path::absolute).transpose()?;

    info!("Daemonizing process...");

    // SAFETY: called before worker threads exist, the child only continues
    // on this thread.
    match unsafe { fork() } {
        Ok(ForkResult::Parent { .. }) => std::process::exit(0),
        Ok(ForkResult::Child) => {}
        Err(e) => return Err(DaemonError::ForkFailed(e.to_string())),
    }

    setsid().map_err(|e| DaemonError::ForkFailed(format!("setsid failed: {}", e)))?;

    chdir("/").map_err(|e| DaemonError::ForkFailed(format!("chdir failed: {}", e)))?;

    umask(Mode::from_bits_truncate(0o022));

    let dev_null = std::fs::OpenOptions::new()
        .read(true)
        .write(true)
        .open("/dev/null")
        .map_err(|e| DaemonError::ForkFailed(format!("Failed to open /dev/null: {}", e)))?;
    let fd = dev_null.as_raw_fd();
    for stream in 0..=2 {
        dup2(fd, stream)
            .map_err(|e| DaemonError::ForkFailed(format!("dup2 failed: {}", e)))?;
    }

    let guard = match pid_path {
        Some(path) => {
            let mut pid = PidFile::new(path);
            pid.write_pid()?;
            Some(pid)
        }
        None => None,
    };

    info!("Process daemonized (PID: {})", std::process::id());
    Ok(guard)
}

#[cfg(not(unix))]
pub fn make_daemon(_pid_file: Option<&Path>) -> Result<Option<PidFile>, DaemonError> {
    Err(DaemonError::ForkFailed(
        "Daemonization not supported on this platform".to_string(),
    ))
}

//! OS signal wiring for the daemon.
//!
//! Handlers installed here do a single atomic store into the daemon's state
//! word. They never lock, allocate, log or call into application code.

use std::fmt;
use std::str::FromStr;

use tracing::info;

use crate::daemon::DaemonState;
use crate::error::DaemonError;

/// Control signal understood by the daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DaemonSignal {
    /// Graceful shutdown (SIGTERM, SIGINT).
    Stop,
    /// Reload configuration (SIGHUP).
    Reload,
    /// SIGUSR1.
    User1,
    /// SIGUSR2.
    User2,
}

impl DaemonSignal {
    /// State requested when this signal is delivered.
    pub fn requested_state(self) -> DaemonState {
        match self {
            DaemonSignal::Stop => DaemonState::Stop,
            DaemonSignal::Reload => DaemonState::Reload,
            DaemonSignal::User1 => DaemonState::User1,
            DaemonSignal::User2 => DaemonState::User2,
        }
    }

    #[cfg(unix)]
    fn os_signal(self) -> nix::sys::signal::Signal {
        use nix::sys::signal::Signal;

        match self {
            DaemonSignal::Stop => Signal::SIGTERM,
            DaemonSignal::Reload => Signal::SIGHUP,
            DaemonSignal::User1 => Signal::SIGUSR1,
            DaemonSignal::User2 => Signal::SIGUSR2,
        }
    }
}

impl fmt::Display for DaemonSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DaemonSignal::Stop => write!(f, "STOP"),
            DaemonSignal::Reload => write!(f, "RELOAD"),
            DaemonSignal::User1 => write!(f, "USER1"),
            DaemonSignal::User2 => write!(f, "USER2"),
        }
    }
}

impl FromStr for DaemonSignal {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "stop" | "term" | "int" => Ok(DaemonSignal::Stop),
            "reload" | "hup" => Ok(DaemonSignal::Reload),
            "user1" | "usr1" => Ok(DaemonSignal::User1),
            "user2" | "usr2" => Ok(DaemonSignal::User2),
            other => Err(format!(
                "unknown signal '{}', expected one of: stop, reload, user1, user2",
                other
            )),
        }
    }
}

#[cfg(unix)]
mod os {
    use std::ffi::c_int;

    use nix::sys::signal::{SaFlags, SigAction, SigHandler, SigSet, Signal, sigaction};
    use once_cell::sync::OnceCell;

    use crate::daemon::{DaemonState, request_from_signal};
    use crate::error::DaemonError;

    static INSTALLED: OnceCell<()> = OnceCell::new();

    extern "C" fn handle_signal(signum: c_int) {
        let requested = match Signal::try_from(signum) {
            Ok(Signal::SIGINT) | Ok(Signal::SIGTERM) => DaemonState::Stop,
            Ok(Signal::SIGHUP) => DaemonState::Reload,
            Ok(Signal::SIGUSR1) => DaemonState::User1,
            Ok(Signal::SIGUSR2) => DaemonState::User2,
            _ => return,
        };
        request_from_signal(requested);
    }

    pub(super) fn install() -> Result<bool, DaemonError> {
        let mut fresh = false;
        INSTALLED.get_or_try_init(|| {
            let action = SigAction::new(
                SigHandler::Handler(handle_signal),
                SaFlags::SA_RESTART,
                SigSet::empty(),
            );
            for signal in [
                Signal::SIGINT,
                Signal::SIGTERM,
                Signal::SIGHUP,
                Signal::SIGUSR1,
                Signal::SIGUSR2,
            ] {
                // SAFETY: the handler only performs an atomic update.
                unsafe { sigaction(signal, &action) }
                    .map_err(|e| DaemonError::SignalSetup(format!("{}: {}", signal, e)))?;
            }
            fresh = true;
            Ok::<(), DaemonError>(())
        })?;
        Ok(fresh)
    }
}

/// Route interrupt, terminate, hang-up and both user signals to the
/// process-wide [`Daemon`](crate::Daemon).
///
/// Calling it again after a successful install does nothing.
#[cfg(unix)]
pub fn install_signal_handlers() -> Result<(), DaemonError> {
    if os::install()? {
        info!("OS signal handlers installed (SIGINT, SIGTERM, SIGHUP, SIGUSR1, SIGUSR2)");
    }
    Ok(())
}

#[cfg(not(unix))]
pub fn install_signal_handlers() -> Result<(), DaemonError> {
    Err(DaemonError::SignalSetup(
        "Signal handling not supported on this platform".to_string(),
    ))
}

/// Send a control signal to a running daemon process.
#[cfg(unix)]
pub fn send_signal(pid: u32, signal: DaemonSignal) -> Result<(), DaemonError> {
    use nix::sys::signal::kill;
    use nix::unistd::Pid;

    let raw = i32::try_from(pid).map_err(|_| DaemonError::SignalSend {
        signal: signal.to_string(),
        pid,
        reason: "PID out of range".to_string(),
    })?;

    kill(Pid::from_raw(raw), signal.os_signal()).map_err(|e| DaemonError::SignalSend {
        signal: signal.to_string(),
        pid,
        reason: e.to_string(),
    })?;

    info!("Sent {} to PID {}", signal, pid);
    Ok(())
}

#[cfg(not(unix))]
pub fn send_signal(pid: u32, signal: DaemonSignal) -> Result<(), DaemonError> {
    Err(DaemonError::SignalSend {
        signal: signal.to_string(),
        pid,
        reason: "Signal sending not supported on this platform".to_string(),
    })
}

#[cfg(test)]
#[path = "signal_tests.rs"]
mod tests;

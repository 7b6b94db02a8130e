//! # taskctl daemon
//!
//! Process lifecycle core for the taskctl background service.
//!
//! ## Features
//!
//! - Process-wide [`Daemon`] state machine driven by OS signals
//!   (SIGINT/SIGTERM stop, SIGHUP reload, SIGUSR1/SIGUSR2 user requests)
//! - Signal handlers that only store an atomic request; hooks run on poll
//! - [`LifecycleContext`] hooks with tri-state [`HookOutcome`] results
//! - PID file management
//! - Process daemonization (Unix fork)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use taskctl_daemon::{Daemon, install_signal_handlers};
//!
//! install_signal_handlers()?;
//! let daemon = Daemon::instance();
//! daemon.bind_context(Arc::new(MyContext::default()));
//!
//! if daemon.start_all().is_failed() {
//!     return Err(anyhow::anyhow!("start failed"));
//! }
//! while daemon.poll() {
//!     // main loop work
//! }
//! daemon.close_all();
//! ```

pub mod config;
pub mod context;
pub mod daemon;
pub mod error;
pub mod hook;
pub mod pid;
pub mod process;
pub mod signal;

// Re-exports
pub use config::DaemonConfig;
pub use context::{LifecycleContext, default_tick};
pub use daemon::{Daemon, DaemonState, Hook};
pub use error::DaemonError;
pub use hook::HookOutcome;
pub use pid::PidFile;
pub use process::make_daemon;
pub use signal::{DaemonSignal, install_signal_handlers, send_signal};

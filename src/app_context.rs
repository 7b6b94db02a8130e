//! Concrete lifecycle context for the taskctl binary.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use taskctl_daemon::{DaemonConfig, HookOutcome, LifecycleContext, default_tick};
use tracing::{debug, info, warn};

/// Application context driven by the daemon hooks and the tick worker.
#[derive(Debug, Default)]
pub(crate) struct AppContext {
    config_file: Mutex<Option<PathBuf>>,
    reloads: AtomicU64,
    ticks: AtomicU64,
}

impl AppContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration file remembered by the last successful validation.
    pub fn config_file(&self) -> Option<PathBuf> {
        self.config_file.lock().clone()
    }

    pub fn reload_count(&self) -> u64 {
        self.reloads.load(Ordering::SeqCst)
    }

    pub fn tick_count(&self) -> u64 {
        self.ticks.load(Ordering::SeqCst)
    }

    fn check_path(path: &Path, desc: &str) -> bool {
        debug!("Validating path: {}", path.display());
        if path.exists() {
            true
        } else {
            warn!("{} \"{}\" doesn't exist", desc, path.display());
            false
        }
    }
}

impl LifecycleContext for AppContext {
    fn validate(&self, config: &DaemonConfig) -> HookOutcome {
        info!("Validating the configuration");

        if let Err(e) = config.validate() {
            warn!("Invalid daemon configuration: {}", e);
            return HookOutcome::Failed;
        }

        if let Some(path) = config.config_file() {
            if !Self::check_path(path, "Configuration file") {
                return HookOutcome::Failed;
            }
        }

        *self.config_file.lock() = config.config_file.clone();
        HookOutcome::Passed
    }

    fn start(&self) -> HookOutcome {
        info!("Starting the application");
        HookOutcome::Passed
    }

    fn reconfigure(&self) -> HookOutcome {
        info!("Reconfiguring the application");
        self.reloads.fetch_add(1, Ordering::SeqCst);

        // The file may have been removed since startup.
        match self.config_file() {
            Some(path) => HookOutcome::from_bool(Self::check_path(&path, "Configuration file")),
            None => HookOutcome::Passed,
        }
    }

    fn restart(&self) -> HookOutcome {
        info!("Restarting the application");
        HookOutcome::Passed
    }

    fn on_signal_1(&self) -> HookOutcome {
        info!("Processing the USER1 signal");
        HookOutcome::Passed
    }

    fn on_signal_2(&self) -> HookOutcome {
        info!("Processing the USER2 signal");
        HookOutcome::Passed
    }

    fn shutdown(&self) -> HookOutcome {
        info!("Shutting down the application");
        HookOutcome::Passed
    }

    fn tick(&self, min: Duration) -> Duration {
        self.ticks.fetch_add(1, Ordering::SeqCst);
        debug!("Processing the context, minimal duration: {} ms", min.as_millis());
        default_tick(min)
    }
}

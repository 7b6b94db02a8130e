//! Application lifecycle contract driven by the [`Daemon`](crate::Daemon).

use std::time::Duration;

use crate::config::DaemonConfig;
use crate::hook::HookOutcome;

/// Suggested minimums above this collapse to [`TICK_FALLBACK`].
pub const TICK_CEILING: Duration = Duration::from_millis(5000);

/// Interval returned when the suggested minimum exceeds [`TICK_CEILING`].
pub const TICK_FALLBACK: Duration = Duration::from_millis(1000);

/// Amount added to a suggested minimum at or below [`TICK_CEILING`].
pub const TICK_INCREMENT: Duration = Duration::from_millis(1000);

/// Default tick scheduling policy.
///
/// A minimum above [`TICK_CEILING`] collapses to [`TICK_FALLBACK`], anything
/// else is extended by [`TICK_INCREMENT`]. The result governs how long the
/// tick worker sleeps before the next call.
pub fn default_tick(min: Duration) -> Duration {
    if min > TICK_CEILING {
        TICK_FALLBACK
    } else {
        min.saturating_add(TICK_INCREMENT)
    }
}

/// Hooks an application implements to react to daemon lifecycle events.
///
/// Every hook has a default returning [`HookOutcome::Unset`], which the
/// daemon treats as success. Implementations only override what they need.
///
/// The context does not track daemon state. It is shared between the main
/// thread (through bound daemon hooks) and the tick worker, so methods take
/// `&self` and implementations use interior mutability where required.
pub trait LifecycleContext: Send + Sync {
    /// Check the configuration before anything starts.
    fn validate(&self, _config: &DaemonConfig) -> HookOutcome {
        HookOutcome::Unset
    }

    /// Called by `start_all`.
    fn start(&self) -> HookOutcome {
        HookOutcome::Unset
    }

    /// Called when a reload request is dispatched.
    fn reconfigure(&self) -> HookOutcome {
        HookOutcome::Unset
    }

    /// Restart the application. No daemon transition calls this.
    fn restart(&self) -> HookOutcome {
        HookOutcome::Unset
    }

    /// Called when a user-signal-1 request is dispatched.
    fn on_signal_1(&self) -> HookOutcome {
        HookOutcome::Unset
    }

    /// Called when a user-signal-2 request is dispatched.
    fn on_signal_2(&self) -> HookOutcome {
        HookOutcome::Unset
    }

    /// Called by `close_all`.
    fn shutdown(&self) -> HookOutcome {
        HookOutcome::Unset
    }

    /// Periodic work. Returns the delay until the next call given the
    /// minimum the caller is willing to wait.
    fn tick(&self, min: Duration) -> Duration {
        default_tick(min)
    }
}

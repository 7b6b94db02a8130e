//! Application tick worker.

use std::sync::Arc;
use std::time::Duration;

use taskctl_daemon::LifecycleContext;
use taskctl_workqueue::{Producer, WorkerContext};
use tracing::info;

/// Minimum delay handed to the first tick.
pub(crate) const INITIAL_TICK: Duration = Duration::from_millis(1000);

/// Published after every tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TickReport {
    pub seq: u64,
    /// Delay the context asked for before the next tick.
    pub interval: Duration,
}

/// Worker body: tick the context until cancelled.
///
/// Sleeps the interval returned by each tick on the cancellation token, so
/// stopping the worker wakes it immediately.
pub(crate) fn run(
    ctx: WorkerContext,
    app: Arc<dyn LifecycleContext>,
    mut reports: Producer<TickReport>,
) {
    info!("Application task started ({})", ctx.id());

    let mut interval = INITIAL_TICK;
    let mut seq = 0;
    while !ctx.is_cancelled() {
        interval = app.tick(interval);
        seq += 1;
        reports.push(TickReport { seq, interval });

        if !interval.is_zero() && ctx.wait_timeout(interval) {
            break;
        }
    }

    info!("Application task completed after {} ticks", seq);
}

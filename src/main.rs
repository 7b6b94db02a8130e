//! taskctl - signal-driven background task controller
//!
//! Main entry point: wires the lifecycle context into the process-wide
//! daemon, runs the workers and polls the daemon until it stops.

mod app_context;
mod cli;
mod console;
mod worker;

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail};
use clap::Parser;
use tracing::{debug, error, info};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use taskctl_daemon::{
    Daemon, DaemonSignal, DaemonState, LifecycleContext, PidFile, install_signal_handlers,
    make_daemon, send_signal,
};
use taskctl_workqueue::{LockFreeQueue, ThreadSafeDeque, WorkerTaskManager};

use crate::app_context::AppContext;
use crate::cli::Cli;
use crate::console::ConsoleCommand;

/// Longest the main loop waits for console input before polling again.
const LOOP_INTERVAL: Duration = Duration::from_millis(200);

/// Initialize tracing with console and optional file output.
///
/// The file appender is used as a blocking writer so no logging thread
/// exists when the process forks.
fn init_tracing(log_level: Option<&str>, log_dir: Option<&Path>) -> anyhow::Result<()> {
    let env_filter = match log_level {
        Some(level) => EnvFilter::try_new(level)
            .with_context(|| format!("invalid log level '{}'", level))?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    let file_layer = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("creating log directory {}", dir.display()))?;
            let appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .filename_prefix("taskctl")
                .filename_suffix("log")
                .max_log_files(30)
                .build(dir)
                .context("creating log file appender")?;
            Some(fmt::layer().with_writer(appender).with_ansi(false))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true),
        )
        .with(file_layer)
        .try_init()
        .context("installing tracing subscriber")?;

    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_tracing(cli.log_level.as_deref(), cli.log_dir.as_deref()) {
        eprintln!("Failed to initialize logging: {:#}", e);
        return ExitCode::FAILURE;
    }

    let result = match cli.signal {
        Some(signal) => signal_running(cli.pid_file.as_deref(), signal),
        None => run(&cli),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Send `signal` to the daemon whose PID is stored in `pid_file`.
fn signal_running(pid_file: Option<&Path>, signal: DaemonSignal) -> anyhow::Result<()> {
    let path = pid_file.context("sending a signal requires --pidfile")?;
    let pid = PidFile::new(path)
        .read_pid()?
        .with_context(|| format!("no PID file at {}", path.display()))?;
    send_signal(pid, signal)?;
    Ok(())
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    info!("Starting taskctl v{}", env!("CARGO_PKG_VERSION"));

    install_signal_handlers()?;

    let config = cli.daemon_config();
    let app = Arc::new(AppContext::new());
    let daemon = Daemon::instance();
    daemon.bind_context(app.clone());

    if app.validate(&config).is_failed() {
        bail!("AppContext configuration mismatch");
    }

    if daemon.start_all().is_failed() {
        bail!("Error starting the daemon");
    }

    // Held until exit so the PID file is removed on a clean shutdown.
    let _pid_file = if config.is_daemon {
        make_daemon(config.pid_file())?
    } else {
        None
    };

    let manager = WorkerTaskManager::new();

    let (reports, mut tick_reports) = LockFreeQueue::new().split();
    let tick_app: Arc<dyn LifecycleContext> = app.clone();
    manager.start_task("app-context", move |ctx| worker::run(ctx, tick_app, reports))?;

    let commands = Arc::new(ThreadSafeDeque::new());
    if !config.is_daemon {
        let console_commands = Arc::clone(&commands);
        manager.start_task("console", move |ctx| console::run(ctx, console_commands))?;
        println!("Press the h key to display the Console Menu...");
    }

    while daemon.poll() {
        if let Some(command) = commands.pop_front(Some(LOOP_INTERVAL)) {
            handle_command(daemon, command);
        }
        for report in tick_reports.drain() {
            debug!(
                "Application tick {} (next in {} ms)",
                report.seq,
                report.interval.as_millis()
            );
        }
    }

    info!("The daemon process is stopping");
    let stopped = manager.stop_all();

    if daemon.close_all().is_failed() {
        bail!("Error closing the daemon");
    }
    stopped.context("stopping workers")?;

    info!(
        "The daemon process ended successfully ({} reloads handled)",
        app.reload_count()
    );
    Ok(())
}

fn handle_command(daemon: &Daemon, command: ConsoleCommand) {
    match command {
        ConsoleCommand::Quit => {
            info!("Quit requested from console");
            daemon.request(DaemonState::Stop);
        }
        ConsoleCommand::Reload => {
            info!("Reload requested from console");
            daemon.request(DaemonState::Reload);
        }
        ConsoleCommand::Version => println!(" v.{}", env!("CARGO_PKG_VERSION")),
        ConsoleCommand::Help => eprintln!("{}", console::HELP),
    }
}

//! CLI definitions for taskctl.

use std::path::PathBuf;

use clap::Parser;
use clap::builder::{NonEmptyStringValueParser, TypedValueParser};
use taskctl_daemon::{DaemonConfig, DaemonSignal};

/// taskctl CLI.
#[derive(Debug, Parser)]
#[command(name = "taskctl")]
#[command(about = "Signal-driven background task controller")]
#[command(version)]
pub(crate) struct Cli {
    /// Run in the background as a daemon
    #[arg(short = 'D', long = "background")]
    pub background: bool,

    /// Configuration file path
    #[arg(
        short = 'C',
        long = "cfgfile",
        env = "TASKCTL_CONFIG",
        value_parser = NonEmptyStringValueParser::new().map(PathBuf::from)
    )]
    pub config_file: Option<PathBuf>,

    /// PID file path, written after daemonizing
    #[arg(
        short = 'P',
        long = "pidfile",
        env = "TASKCTL_PIDFILE",
        value_parser = NonEmptyStringValueParser::new().map(PathBuf::from)
    )]
    pub pid_file: Option<PathBuf>,

    /// Log filter directive, overrides RUST_LOG
    #[arg(long)]
    pub log_level: Option<String>,

    /// Also write logs to daily rotated files in this directory
    #[arg(long)]
    pub log_dir: Option<PathBuf>,

    /// Send a signal (stop, reload, user1, user2) to the daemon named by
    /// the PID file and exit
    #[arg(short = 's', long, value_parser = parse_signal, requires = "pid_file")]
    pub signal: Option<DaemonSignal>,
}

fn parse_signal(s: &str) -> Result<DaemonSignal, String> {
    s.parse()
}

impl Cli {
    /// Daemon configuration described by the command line.
    pub fn daemon_config(&self) -> DaemonConfig {
        let mut config = DaemonConfig::new().with_daemon(self.background);
        if let Some(path) = &self.pid_file {
            config = config.with_pid_file(path);
        }
        if let Some(path) = &self.config_file {
            config = config.with_config_file(path);
        }
        config
    }
}

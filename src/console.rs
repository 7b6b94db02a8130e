//! Interactive console for foreground runs.
//!
//! A worker reads commands from stdin and hands them to the main loop
//! through a [`ThreadSafeDeque`]. Stdin readiness is polled with a bounded
//! timeout so the worker notices cancellation without input.

use std::fmt;
use std::io::{self, BufRead};
use std::sync::Arc;
use std::time::Duration;

use taskctl_workqueue::{ThreadSafeDeque, WorkerContext};
use tracing::{debug, info, warn};

/// How long one stdin readiness check may block.
pub(crate) const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Command typed at the console.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ConsoleCommand {
    /// `q`
    Quit,
    /// `R`
    Reload,
    /// `v`
    Version,
    /// `h` or `?`
    Help,
}

impl ConsoleCommand {
    /// Parse the first non-blank character of a line.
    pub fn parse(line: &str) -> Option<Self> {
        match line.trim_start().chars().next()? {
            'q' => Some(ConsoleCommand::Quit),
            'R' => Some(ConsoleCommand::Reload),
            'v' => Some(ConsoleCommand::Version),
            'h' | '?' => Some(ConsoleCommand::Help),
            _ => None,
        }
    }
}

impl fmt::Display for ConsoleCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConsoleCommand::Quit => write!(f, "quit"),
            ConsoleCommand::Reload => write!(f, "reload"),
            ConsoleCommand::Version => write!(f, "version"),
            ConsoleCommand::Help => write!(f, "help"),
        }
    }
}

pub(crate) const HELP: &str = "\
Application test console:
 R   -  execute reload functions
 q   -  quit from application.
 v   -  version
 h|? -  this information.";

fn queue_line(bytes: &[u8], commands: &ThreadSafeDeque<ConsoleCommand>) {
    let line = String::from_utf8_lossy(bytes);
    match ConsoleCommand::parse(&line) {
        Some(command) => {
            debug!("Console command: {}", command);
            commands.push_back(command);
        }
        None if line.trim().is_empty() => {}
        None => debug!("Ignoring console input {:?}", line.trim()),
    }
}

/// Consume whatever input is buffered and queue every complete line.
///
/// Partial lines stay in `pending` as raw bytes until their newline
/// arrives, so a character split across reads is decoded whole. Returns
/// `Ok(false)` once the input is exhausted, after flushing `pending`.
pub(crate) fn forward_available<R: BufRead>(
    reader: &mut R,
    pending: &mut Vec<u8>,
    commands: &ThreadSafeDeque<ConsoleCommand>,
) -> io::Result<bool> {
    let chunk = reader.fill_buf()?;
    if chunk.is_empty() {
        let rest = std::mem::take(pending);
        queue_line(&rest, commands);
        return Ok(false);
    }

    let len = chunk.len();
    pending.extend_from_slice(chunk);
    reader.consume(len);

    while let Some(pos) = pending.iter().position(|&b| b == b'\n') {
        let line: Vec<u8> = pending.drain(..=pos).collect();
        queue_line(&line, commands);
    }
    Ok(true)
}

/// Worker body: forward stdin commands until cancelled or stdin closes.
pub(crate) fn run(ctx: WorkerContext, commands: Arc<ThreadSafeDeque<ConsoleCommand>>) {
    info!("Console started ({})", ctx.id());
    let stdin = io::stdin();
    let mut pending = Vec::new();

    while !ctx.is_cancelled() {
        match stdin_ready(POLL_INTERVAL) {
            Ok(true) => {}
            Ok(false) => continue,
            Err(e) => {
                warn!("Console input unavailable: {}", e);
                break;
            }
        }

        match forward_available(&mut stdin.lock(), &mut pending, &commands) {
            Ok(true) => {}
            Ok(false) => {
                debug!("Console input closed");
                break;
            }
            Err(e) => {
                warn!("Failed to read console input: {}", e);
                break;
            }
        }
    }

    info!("Console stopped");
}

#[cfg(unix)]
fn stdin_ready(timeout: Duration) -> io::Result<bool> {
    use std::os::fd::AsFd;

    use nix::errno::Errno;
    use nix::poll::{PollFd, PollFlags, PollTimeout, poll};

    let stdin = io::stdin();
    let mut fds = [PollFd::new(stdin.as_fd(), PollFlags::POLLIN)];
    let millis = u16::try_from(timeout.as_millis()).unwrap_or(u16::MAX);

    match poll(&mut fds, PollTimeout::from(millis)) {
        Ok(0) | Err(Errno::EINTR) => Ok(false),
        Ok(_) => Ok(fds[0]
            .revents()
            .is_some_and(|r| r.intersects(PollFlags::POLLIN | PollFlags::POLLHUP))),
        Err(e) => Err(io::Error::from(e)),
    }
}

#[cfg(not(unix))]
fn stdin_ready(_timeout: Duration) -> io::Result<bool> {
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::io::Cursor;

    #[rstest]
    #[case("q", Some(ConsoleCommand::Quit))]
    #[case("q\n", Some(ConsoleCommand::Quit))]
    #[case("  R\n", Some(ConsoleCommand::Reload))]
    #[case("v", Some(ConsoleCommand::Version))]
    #[case("h", Some(ConsoleCommand::Help))]
    #[case("?", Some(ConsoleCommand::Help))]
    #[case("r", None)]
    #[case("Q", None)]
    #[case("", None)]
    #[case("x\n", None)]
    fn test_parse(#[case] input: &str, #[case] expected: Option<ConsoleCommand>) {
        assert_eq!(ConsoleCommand::parse(input), expected);
    }

    #[test]
    fn test_forward_lines_in_order() {
        let deque = ThreadSafeDeque::new();
        let mut pending = Vec::new();
        let mut input = Cursor::new("h\n\nR\nzz\nq\n");

        while forward_available(&mut input, &mut pending, &deque).unwrap() {}

        assert_eq!(deque.try_pop_front(), Some(ConsoleCommand::Help));
        assert_eq!(deque.try_pop_front(), Some(ConsoleCommand::Reload));
        assert_eq!(deque.try_pop_front(), Some(ConsoleCommand::Quit));
        assert!(deque.is_empty());
        assert!(pending.is_empty());
    }

    #[test]
    fn test_partial_line_waits_for_newline() {
        let deque = ThreadSafeDeque::new();
        let mut pending = Vec::new();

        assert!(forward_available(&mut Cursor::new("R"), &mut pending, &deque).unwrap());
        assert!(deque.is_empty());
        assert_eq!(pending, b"R");

        assert!(forward_available(&mut Cursor::new("\nv\n"), &mut pending, &deque).unwrap());
        assert_eq!(deque.try_pop_front(), Some(ConsoleCommand::Reload));
        assert_eq!(deque.try_pop_front(), Some(ConsoleCommand::Version));
    }

    #[test]
    fn test_multibyte_character_split_across_reads() {
        let deque = ThreadSafeDeque::new();
        let mut pending = Vec::new();

        // "é" is 0xC3 0xA9; the first read ends between the two bytes.
        assert!(forward_available(&mut Cursor::new(&b"\xc3"[..]), &mut pending, &deque).unwrap());
        assert_eq!(pending, vec![0xc3]);

        let mut rest = Cursor::new(&b"\xa9\nR\n"[..]);
        assert!(forward_available(&mut rest, &mut pending, &deque).unwrap());
        assert!(pending.is_empty());
        assert_eq!(deque.try_pop_front(), Some(ConsoleCommand::Reload));
        assert!(deque.is_empty());
    }

    #[test]
    fn test_eof_flushes_pending() {
        let deque = ThreadSafeDeque::new();
        let mut pending = b"q".to_vec();
        assert!(!forward_available(&mut Cursor::new(""), &mut pending, &deque).unwrap());
        assert_eq!(deque.try_pop_front(), Some(ConsoleCommand::Quit));
        assert!(pending.is_empty());
    }

    #[test]
    fn test_help_lists_commands() {
        for key in ["R ", "q ", "v ", "h|?"] {
            assert!(HELP.contains(key));
        }
    }
}

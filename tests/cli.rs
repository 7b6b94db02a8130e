//! End-to-end runs of the taskctl binary.

use std::io::{BufRead, BufReader, Write};
use std::process::{Child, Command, ExitStatus, Output, Stdio};
use std::time::{Duration, Instant};

fn taskctl() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_taskctl"));
    cmd.env_remove("TASKCTL_CONFIG")
        .env_remove("TASKCTL_PIDFILE")
        .env_remove("RUST_LOG");
    cmd
}

fn spawn_foreground(args: &[&str]) -> Child {
    taskctl()
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap()
}

/// Block until the main loop announces the console.
fn wait_for_console(child: &mut Child) -> BufReader<std::process::ChildStdout> {
    let mut stdout = BufReader::new(child.stdout.take().unwrap());
    let mut line = String::new();
    loop {
        line.clear();
        assert!(stdout.read_line(&mut line).unwrap() > 0, "taskctl exited early");
        if line.contains("Console Menu") {
            return stdout;
        }
    }
}

fn wait_with_deadline(mut child: Child) -> (ExitStatus, Output) {
    let deadline = Instant::now() + Duration::from_secs(15);
    while child.try_wait().unwrap().is_none() {
        if Instant::now() > deadline {
            child.kill().unwrap();
            panic!("taskctl did not exit in time");
        }
        std::thread::sleep(Duration::from_millis(20));
    }
    let output = child.wait_with_output().unwrap();
    (output.status, output)
}

#[test]
fn test_version_flag() {
    let output = taskctl().arg("--version").output().unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_missing_config_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.toml");
    let output = taskctl()
        .arg("-C")
        .arg(&missing)
        .stdin(Stdio::null())
        .output()
        .unwrap();

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("configuration mismatch"));
}

#[test]
fn test_signal_without_pid_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let pid = dir.path().join("none.pid");
    let output = taskctl()
        .args(["-s", "reload", "-P"])
        .arg(&pid)
        .output()
        .unwrap();
    assert!(!output.status.success());
}

#[test]
fn test_console_quit() {
    let mut child = spawn_foreground(&[]);
    let _stdout = wait_for_console(&mut child);

    child.stdin.as_mut().unwrap().write_all(b"q\n").unwrap();

    let (status, output) = wait_with_deadline(child);
    assert!(status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Quit requested from console"));
    assert!(stderr.contains("Shutting down the application"));
}

#[test]
fn test_console_reload_then_quit() {
    let config = tempfile::NamedTempFile::new().unwrap();
    let mut child = taskctl()
        .arg("--cfgfile")
        .arg(config.path())
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    let _stdout = wait_for_console(&mut child);

    let stdin = child.stdin.as_mut().unwrap();
    stdin.write_all(b"R\n").unwrap();
    stdin.flush().unwrap();
    std::thread::sleep(Duration::from_millis(500));
    stdin.write_all(b"q\n").unwrap();

    let (status, output) = wait_with_deadline(child);
    assert!(status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Reconfiguring the application"));
    assert!(stderr.contains("1 reloads handled"));
}

#[cfg(unix)]
#[test]
fn test_terminate_signal_stops_cleanly() {
    use nix::sys::signal::{Signal, kill};
    use nix::unistd::Pid;

    let mut child = spawn_foreground(&[]);
    let _stdout = wait_for_console(&mut child);

    kill(Pid::from_raw(child.id() as i32), Signal::SIGTERM).unwrap();

    let (status, output) = wait_with_deadline(child);
    assert!(status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("The daemon process is stopping"));
}

#[cfg(unix)]
#[test]
fn test_user_signal_keeps_running() {
    use nix::sys::signal::{Signal, kill};
    use nix::unistd::Pid;

    let mut child = spawn_foreground(&[]);
    let _stdout = wait_for_console(&mut child);
    let pid = Pid::from_raw(child.id() as i32);

    kill(pid, Signal::SIGUSR1).unwrap();
    std::thread::sleep(Duration::from_millis(500));
    assert!(child.try_wait().unwrap().is_none());

    kill(pid, Signal::SIGINT).unwrap();
    let (status, output) = wait_with_deadline(child);
    assert!(status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Processing the USER1 signal"));
}

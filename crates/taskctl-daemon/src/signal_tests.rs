//! Tests for signal mapping. Raising real signals lives in `tests/signals.rs`.

use super::*;

#[test]
fn test_signal_display() {
    assert_eq!(DaemonSignal::Stop.to_string(), "STOP");
    assert_eq!(DaemonSignal::Reload.to_string(), "RELOAD");
    assert_eq!(DaemonSignal::User1.to_string(), "USER1");
    assert_eq!(DaemonSignal::User2.to_string(), "USER2");
}

#[test]
fn test_requested_state_mapping() {
    assert_eq!(DaemonSignal::Stop.requested_state(), DaemonState::Stop);
    assert_eq!(DaemonSignal::Reload.requested_state(), DaemonState::Reload);
    assert_eq!(DaemonSignal::User1.requested_state(), DaemonState::User1);
    assert_eq!(DaemonSignal::User2.requested_state(), DaemonState::User2);
}

#[test]
fn test_parse_signal_names() {
    assert_eq!("stop".parse::<DaemonSignal>().unwrap(), DaemonSignal::Stop);
    assert_eq!("TERM".parse::<DaemonSignal>().unwrap(), DaemonSignal::Stop);
    assert_eq!("hup".parse::<DaemonSignal>().unwrap(), DaemonSignal::Reload);
    assert_eq!("Reload".parse::<DaemonSignal>().unwrap(), DaemonSignal::Reload);
    assert_eq!("usr1".parse::<DaemonSignal>().unwrap(), DaemonSignal::User1);
    assert_eq!("user2".parse::<DaemonSignal>().unwrap(), DaemonSignal::User2);
}

#[test]
fn test_parse_unknown_signal() {
    let err = "kill".parse::<DaemonSignal>().unwrap_err();
    assert!(err.contains("unknown signal"));
}

#[cfg(unix)]
#[test]
fn test_os_signal_mapping() {
    use nix::sys::signal::Signal;

    assert_eq!(DaemonSignal::Stop.os_signal(), Signal::SIGTERM);
    assert_eq!(DaemonSignal::Reload.os_signal(), Signal::SIGHUP);
    assert_eq!(DaemonSignal::User1.os_signal(), Signal::SIGUSR1);
    assert_eq!(DaemonSignal::User2.os_signal(), Signal::SIGUSR2);
}

#[cfg(unix)]
#[test]
fn test_send_signal_to_missing_process() {
    // PID far above any default pid_max.
    let err = send_signal(999_999_999, DaemonSignal::User1).unwrap_err();
    assert!(matches!(err, DaemonError::SignalSend { pid: 999_999_999, .. }));
}

#[cfg(unix)]
#[test]
fn test_send_signal_pid_out_of_range() {
    let err = send_signal(u32::MAX, DaemonSignal::Reload).unwrap_err();
    assert!(err.to_string().contains("out of range"));
}

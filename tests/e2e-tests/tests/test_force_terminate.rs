//! Forced termination against a real TESTEXE process.

use e2e_tests::assertions::{check_exit_code, check_natural_exit};
use e2e_tests::{forced_exit_code, reaped_pid, TestExe};
use hsu_process::{force_terminate, ExitError, SIGINT, SIGTERM};
use std::time::Duration;

const WAIT_TIMEOUT: Duration = Duration::from_secs(10);

#[test]
fn test_terminate() {
    let mut testexe = TestExe::spawn_sleep(Duration::from_secs(1));

    force_terminate(testexe.pid(), SIGINT).expect("force_terminate failed");

    let status = testexe.wait(WAIT_TIMEOUT).unwrap();
    check_exit_code(&status, forced_exit_code()).unwrap();
}

#[test]
fn test_terminate_exit_code_ignores_signal() {
    for signal in [SIGINT, SIGTERM, -1, 0] {
        let mut testexe = TestExe::spawn_sleep(Duration::from_secs(5));

        force_terminate(testexe.pid(), signal).expect("force_terminate failed");

        let status = testexe.wait(WAIT_TIMEOUT).unwrap();
        check_exit_code(&status, forced_exit_code()).unwrap();
    }
}

#[test]
fn test_terminate_stubborn_process() {
    let mut testexe = TestExe::spawn_stubborn(Duration::from_secs(30));

    force_terminate(testexe.pid(), SIGTERM).unwrap();

    let status = testexe.wait(WAIT_TIMEOUT).unwrap();
    check_exit_code(&status, forced_exit_code()).unwrap();
}

#[test]
fn test_terminate_already_exited_is_success() {
    // Exited but not yet reaped: the PID still refers to this process.
    let mut testexe = TestExe::spawn_sleep(Duration::ZERO);
    std::thread::sleep(Duration::from_millis(500));

    force_terminate(testexe.pid(), SIGINT).expect("terminating an exited process should succeed");

    let status = testexe.wait(WAIT_TIMEOUT).unwrap();
    check_natural_exit(&status).unwrap();
}

#[test]
fn test_terminate_bad_pid() {
    let pid = reaped_pid();

    let err = force_terminate(pid, SIGINT).unwrap_err();
    assert!(matches!(err, ExitError::InvalidTarget { .. }));

    #[cfg(windows)]
    let expected = "OpenProcess: The parameter is incorrect.";
    #[cfg(unix)]
    let expected = "kill: ESRCH: No such process";

    assert_eq!(err.to_string(), expected);
}

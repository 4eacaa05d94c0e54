//! Concurrent cooperative exits from one supervisor.
//!
//! On Windows every delivery goes through the same console lock; these tests
//! check that serialization never deadlocks and never delays cancellation.

use e2e_tests::assertions::{check_exit_code, check_natural_exit, check_returned_within};
use e2e_tests::TestExe;
use hsu_process::{expected_exit_code, request_exit, ExitError, WaitContext, SIGINT};
use std::time::{Duration, Instant};

const WAIT_TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[cfg(any(windows, target_os = "linux"))]
async fn test_concurrent_exits_all_complete() {
    let mut testexes: Vec<TestExe> = (0..4).map(|_| TestExe::spawn_sleep(Duration::from_secs(5))).collect();

    let tasks: Vec<_> = testexes
        .iter()
        .map(|testexe| {
            let pid = testexe.pid();
            tokio::spawn(async move {
                let ctx = WaitContext::with_timeout(WAIT_TIMEOUT);
                request_exit(&ctx, pid, SIGINT).await
            })
        })
        .collect();

    for task in tasks {
        task.await.expect("exit task panicked").expect("request_exit failed");
    }

    for testexe in &mut testexes {
        let status = testexe.wait(WAIT_TIMEOUT).unwrap();
        check_exit_code(&status, expected_exit_code(SIGINT)).unwrap();
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[cfg(any(windows, target_os = "linux"))]
async fn test_cancelled_exit_alongside_active_exits() {
    let mut active = TestExe::spawn_sleep(Duration::from_secs(5));
    let mut untouched = TestExe::spawn_sleep(Duration::from_millis(300));

    let active_pid = active.pid();
    let active_task = tokio::spawn(async move {
        request_exit(&WaitContext::with_timeout(WAIT_TIMEOUT), active_pid, SIGINT).await
    });

    let cancelled = WaitContext::with_cancel();
    cancelled.cancel();
    let started = Instant::now();
    let err = request_exit(&cancelled, untouched.pid(), SIGINT).await.unwrap_err();
    assert_eq!(err, ExitError::Cancelled);
    check_returned_within(started, Duration::from_millis(100)).unwrap();

    active_task.await.unwrap().expect("request_exit failed");

    check_exit_code(&active.wait(WAIT_TIMEOUT).unwrap(), expected_exit_code(SIGINT)).unwrap();
    check_natural_exit(&untouched.wait(WAIT_TIMEOUT).unwrap()).unwrap();
}

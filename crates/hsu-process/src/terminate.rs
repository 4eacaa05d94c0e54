//! Cooperative and forced process exit.
//!
//! [`request_exit`] asks a process to shut down (a signal on Unix, a console
//! Ctrl+C on Windows) and waits for it within the caller's [`WaitContext`].
//! [`force_terminate`] ends a process immediately. Neither touches the
//! target's descendants.

use crate::check::ProcessHandle;
use crate::signal::{translate, NativeSignal};
use crate::wait::{wait_for_exit, DEFAULT_POLL_INTERVAL};
use hsu_common::{ExitResult, WaitContext};
use std::time::Duration;
use tracing::debug;

#[cfg(unix)]
use crate::terminate_unix as platform;
#[cfg(windows)]
use crate::terminate_windows as platform;

/// Ask the process to exit and wait until it does or `ctx` fires.
///
/// If `ctx` has already expired nothing is sent and the context error is
/// returned right away. Otherwise the interrupt is delivered exactly once
/// and the call returns `Ok(())` when the process exits, or `Cancelled` /
/// `DeadlineExceeded` when the context fires first. The process is never
/// killed on timeout; fall back to [`force_terminate`] for that.
///
/// # Examples
///
/// ```rust,no_run
/// use hsu_common::WaitContext;
/// use hsu_process::{force_terminate, request_exit, SIGINT};
/// use std::time::Duration;
///
/// # async fn stop(pid: u32) {
/// let ctx = WaitContext::with_timeout(Duration::from_secs(1));
/// if let Err(e) = request_exit(&ctx, pid, SIGINT).await {
///     eprintln!("exit failed: {}", e);
///     // Forcefully end the process (child processes are left alone).
///     let _ = force_terminate(pid, SIGINT);
/// }
/// # }
/// ```
pub async fn request_exit(ctx: &WaitContext, pid: u32, signal: i32) -> ExitResult<()> {
    request_exit_with_interval(ctx, pid, signal, DEFAULT_POLL_INTERVAL).await
}

/// [`request_exit`] with an explicit exit-polling cadence.
pub async fn request_exit_with_interval(
    ctx: &WaitContext,
    pid: u32,
    signal: i32,
    poll_interval: Duration,
) -> ExitResult<()> {
    if let Some(err) = ctx.err() {
        debug!(pid, signal, "Skipping exit request: {}", err);
        return Err(err);
    }

    let native = translate(signal)?;
    let process = ProcessHandle::open(pid)?;
    exit_gracefully(ctx, &process, native, poll_interval).await
}

/// End the process immediately.
///
/// `signal` is accepted for symmetry with [`request_exit`] and does not
/// change the outcome: Unix always sends `SIGKILL`, Windows always exits the
/// process with [`FORCED_EXIT_CODE`](crate::FORCED_EXIT_CODE). A process that
/// exits before it can be terminated counts as success.
pub fn force_terminate(pid: u32, signal: i32) -> ExitResult<()> {
    debug!(pid, signal, "Forcing termination");
    let process = ProcessHandle::open(pid)?;
    platform::terminate(&process)
}

/// Delivery followed by the wait, on an already resolved process.
pub(crate) async fn exit_gracefully(
    ctx: &WaitContext,
    process: &ProcessHandle,
    signal: NativeSignal,
    poll_interval: Duration,
) -> ExitResult<()> {
    if let Some(err) = ctx.err() {
        return Err(err);
    }

    platform::deliver_interrupt(ctx, process, signal).await?;
    debug!(pid = process.pid(), "Interrupt delivered, waiting for exit");
    wait_for_exit(ctx, process, poll_interval).await
}

/// Forced termination on an already resolved process.
pub(crate) fn terminate_resolved(process: &ProcessHandle) -> ExitResult<()> {
    platform::terminate(process)
}

//! Waiting for a process to exit within a [`WaitContext`] budget.

use crate::check::ProcessHandle;
use hsu_common::{ExitResult, WaitContext};
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::debug;

/// Default cadence for checking whether the target has exited.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Blocks the calling task until the process exits or `ctx` fires.
///
/// Returns `Ok(())` once the process is gone, or `Cancelled` /
/// `DeadlineExceeded` as soon as the context fires. The process is never
/// killed here. The exit watcher is dropped together with this future, so
/// nothing keeps running after it returns.
pub async fn wait_for_exit(
    ctx: &WaitContext,
    process: &ProcessHandle,
    poll_interval: Duration,
) -> ExitResult<()> {
    tokio::select! {
        biased;
        err = ctx.done() => {
            debug!(pid = process.pid(), "Stopped waiting for exit: {}", err);
            Err(err)
        }
        result = poll_until_exit(process, poll_interval) => result,
    }
}

async fn poll_until_exit(process: &ProcessHandle, poll_interval: Duration) -> ExitResult<()> {
    // `interval` panics on a zero period.
    let mut ticker = tokio::time::interval(poll_interval.max(Duration::from_millis(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        if process.has_exited()? {
            debug!(pid = process.pid(), "Process exited");
            return Ok(());
        }
    }
}

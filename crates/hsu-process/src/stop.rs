//! "Ask nicely, then kill".
//!
//! Supervisors usually want a cooperative exit bounded by a grace period,
//! followed by forced termination if the process does not comply.
//! [`stop_process`] packages that sequence around a single process handle so
//! the PID cannot be reused between the two attempts.

use crate::check::ProcessHandle;
use crate::config::GracefulStopConfig;
use crate::signal::{translate, NativeSignal};
use crate::terminate::{exit_gracefully, terminate_resolved};
use crate::wait::wait_for_exit;
use hsu_common::{ExitError, ExitResult, WaitContext};
use std::time::Duration;
use tracing::{debug, info, warn};

/// How long to wait for the process to disappear after forced termination.
pub const FORCE_KILL_TIMEOUT: Duration = Duration::from_secs(5);

/// How the process ended up stopping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// The process exited after the cooperative request.
    Graceful,
    /// The process was forcibly terminated.
    Forced,
}

/// Stop `pid` with an unbounded outer context.
pub async fn stop_process(pid: u32, config: &GracefulStopConfig) -> ExitResult<StopOutcome> {
    stop_process_with_context(&WaitContext::background(), pid, config).await
}

/// Request exit within `config.graceful_timeout`, then force termination.
///
/// Forcing happens when the grace period elapses or delivery fails, and only
/// if `config.force_kill` is set. When `parent` itself fires, its error is
/// returned and the process is left alone. Descendants are never killed.
pub async fn stop_process_with_context(
    parent: &WaitContext,
    pid: u32,
    config: &GracefulStopConfig,
) -> ExitResult<StopOutcome> {
    if let Some(err) = parent.err() {
        return Err(err);
    }

    let signal = translate(config.signal)?;
    let process = ProcessHandle::open(pid)?;
    stop_resolved(parent, &process, signal, config).await
}

async fn stop_resolved(
    parent: &WaitContext,
    process: &ProcessHandle,
    signal: NativeSignal,
    config: &GracefulStopConfig,
) -> ExitResult<StopOutcome> {
    let pid = process.pid();

    let graceful = parent.child_with_timeout(config.graceful_timeout);
    let reason = match exit_gracefully(&graceful, process, signal, config.poll_interval).await {
        Ok(()) => {
            info!(pid, "Process stopped gracefully");
            return Ok(StopOutcome::Graceful);
        }
        Err(err) => match fallback_reason(parent, process, err)? {
            Some(reason) => reason,
            None => {
                info!(pid, "Process exited before it could be asked to stop");
                return Ok(StopOutcome::Graceful);
            }
        },
    };

    if !config.force_kill {
        debug!(pid, "Force kill disabled, giving up: {}", reason);
        return Err(reason);
    }

    warn!(
        pid,
        "Graceful stop failed ({}) within {:?}, forcing termination", reason, config.graceful_timeout
    );
    terminate_resolved(process)?;

    let confirm = parent.child_with_timeout(FORCE_KILL_TIMEOUT);
    wait_for_exit(&confirm, process, config.poll_interval).await?;

    info!(pid, "Process terminated after force kill");
    Ok(StopOutcome::Forced)
}

/// Classifies a failed graceful attempt on a resolved process.
///
/// `Ok(Some(reason))` means force termination is warranted, `Ok(None)` means
/// the process is already gone. Delivery can fail against a live process, e.g.
/// a Windows target with no console to attach to, so `InvalidTarget` is only
/// final once the process has actually exited.
fn fallback_reason(
    parent: &WaitContext,
    process: &ProcessHandle,
    err: ExitError,
) -> ExitResult<Option<ExitError>> {
    match err {
        err if err.is_context_error() => match parent.err() {
            Some(parent_err) => Err(parent_err),
            None => Ok(Some(err)),
        },
        err @ (ExitError::InvalidTarget { .. } | ExitError::DeliveryFailed { .. }) => {
            if process.has_exited()? {
                Ok(None)
            } else {
                Ok(Some(err))
            }
        }
        err => Err(err),
    }
}

//! Unix delivery: signals go straight to the target with `kill(2)`.
//!
//! There is no process-wide state involved, so concurrent deliveries run
//! fully in parallel.

use crate::check::{errno_error, ProcessHandle};
use crate::signal::NativeSignal;
use hsu_common::{ExitError, ExitResult, WaitContext};
use nix::errno::Errno;
use nix::sys::signal::{kill, Signal};
use tracing::trace;

/// Sends the translated signal to the target.
///
/// `_ctx` is unused here: a single `kill` call cannot be interrupted.
pub(crate) async fn deliver_interrupt(
    _ctx: &WaitContext,
    process: &ProcessHandle,
    signal: NativeSignal,
) -> ExitResult<()> {
    let NativeSignal::Signal(signal) = signal;
    let pid = process.pid();

    trace!(pid, ?signal, "Sending signal");
    kill(process.nix_pid(), signal).map_err(|errno| match errno {
        Errno::ESRCH => ExitError::invalid_target(pid, errno_error("kill", errno)),
        _ => ExitError::delivery_failed(pid, errno_error("kill", errno)),
    })
}

/// Kills the target with `SIGKILL`. A target that is already gone counts as
/// terminated.
pub(crate) fn terminate(process: &ProcessHandle) -> ExitResult<()> {
    let pid = process.pid();

    trace!(pid, "Sending SIGKILL");
    match kill(process.nix_pid(), Signal::SIGKILL) {
        Ok(()) | Err(Errno::ESRCH) => Ok(()),
        Err(errno) => Err(ExitError::delivery_failed(pid, errno_error("kill", errno))),
    }
}

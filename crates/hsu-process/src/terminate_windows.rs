//! Windows delivery: console Ctrl+C broadcast and `TerminateProcess`.
//!
//! Windows has no per-process asynchronous signal. The closest cooperative
//! primitive is `GenerateConsoleCtrlEvent`, which broadcasts to every process
//! attached to the caller's console. To reach the target we therefore:
//!
//! 1. take the process-wide console lock,
//! 2. detach from our own console (if any),
//! 3. attach to the target's console,
//! 4. ignore Ctrl+C ourselves,
//! 5. broadcast Ctrl+C to the attached console,
//! 6. detach from the target's console, stop ignoring Ctrl+C and reattach
//!    to our original console,
//! 7. release the lock.
//!
//! Every process sharing the target's console receives the event as well.
//!
//! Windows offers no way to reattach to a console by identity, so step 6
//! reattaches with `ATTACH_PARENT_PROCESS`. That restores the original
//! console only when it was inherited from the parent. A caller that owned
//! its console (e.g. started with `CREATE_NEW_CONSOLE`) ends up on its
//! parent's console, or on none if the parent has no console.
//!
//! Console attachment is process-global, so all deliveries in this process
//! are serialized through [`CONSOLE_OPERATION_LOCK`], not per target.

use crate::check::{win32_error, ProcessHandle};
use crate::signal::{NativeSignal, FORCED_EXIT_CODE};
use hsu_common::{ExitError, ExitResult, NativeError, WaitContext};
use once_cell::sync::Lazy;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{trace, warn};
use windows::Win32::System::Console::{
    AttachConsole, FreeConsole, GenerateConsoleCtrlEvent, GetConsoleWindow, SetConsoleCtrlHandler,
    ATTACH_PARENT_PROCESS, CTRL_C_EVENT,
};
use windows::Win32::System::Threading::TerminateProcess;

/// Global lock for console operations to prevent race conditions
static CONSOLE_OPERATION_LOCK: Lazy<Arc<Mutex<()>>> = Lazy::new(|| Arc::new(Mutex::new(())));

/// Time given to the console host to dispatch the event before we detach
/// and stop ignoring Ctrl+C.
const CTRL_EVENT_SETTLE: Duration = Duration::from_millis(50);

/// Broadcasts Ctrl+C into the target's console group.
///
/// Waiting for the console lock observes `ctx`, so a caller whose budget
/// runs out is never stuck behind another delivery. Once the lock is held,
/// the console sequence runs to completion on a blocking thread that owns
/// the lock, even if this future is dropped.
pub(crate) async fn deliver_interrupt(
    ctx: &WaitContext,
    process: &ProcessHandle,
    _signal: NativeSignal,
) -> ExitResult<()> {
    let pid = process.pid();

    let guard = tokio::select! {
        biased;
        err = ctx.done() => return Err(err),
        guard = CONSOLE_OPERATION_LOCK.clone().lock_owned() => guard,
    };

    tokio::task::spawn_blocking(move || {
        let _guard = guard;
        broadcast_interrupt(pid)
    })
    .await
    .map_err(|e| {
        ExitError::delivery_failed(
            pid,
            NativeError::new("GenerateConsoleCtrlEvent", format!("console task failed: {e}"), None),
        )
    })?
}

/// Terminates the target with [`FORCED_EXIT_CODE`].
///
/// `TerminateProcess` fails with "access denied" on a process that has
/// already exited; that case counts as success.
pub(crate) fn terminate(process: &ProcessHandle) -> ExitResult<()> {
    let pid = process.pid();

    trace!(pid, "Calling TerminateProcess");
    match unsafe { TerminateProcess(process.raw(), FORCED_EXIT_CODE) } {
        Ok(()) => Ok(()),
        Err(_) if process.has_exited().unwrap_or(false) => Ok(()),
        Err(e) => Err(ExitError::delivery_failed(pid, win32_error("TerminateProcess", &e))),
    }
}

/// Runs steps 2-6 while the console lock is held by the caller.
fn broadcast_interrupt(pid: u32) -> ExitResult<()> {
    let mut session = ConsoleSession::begin(pid)?;

    let result = session
        .attach_target()
        .and_then(|()| session.ignore_ctrl_c())
        .and_then(|()| session.broadcast());

    let cleanup = session.end();
    match result {
        Ok(()) => {
            for failure in cleanup {
                warn!(pid, "Console restore failed after Ctrl+C delivery: {}", failure);
            }
            Ok(())
        }
        Err(e) => Err(e.with_cleanup(cleanup)),
    }
}

/// Tracks every console change made during one delivery so each can be
/// undone, in order, on every exit path.
struct ConsoleSession {
    pid: u32,
    had_console: bool,
    attached_to_target: bool,
    ignoring_ctrl_c: bool,
}

impl ConsoleSession {
    fn begin(pid: u32) -> ExitResult<Self> {
        let had_console = unsafe { GetConsoleWindow().0 != 0 };
        if had_console {
            unsafe { FreeConsole() }
                .map_err(|e| ExitError::delivery_failed(pid, win32_error("FreeConsole", &e)))?;
        }

        Ok(Self {
            pid,
            had_console,
            attached_to_target: false,
            ignoring_ctrl_c: false,
        })
    }

    /// Failure here means the target is gone or has no console we may join;
    /// the native text is kept as-is.
    fn attach_target(&mut self) -> ExitResult<()> {
        unsafe { AttachConsole(self.pid) }
            .map_err(|e| ExitError::invalid_target(self.pid, win32_error("AttachConsole", &e)))?;
        self.attached_to_target = true;
        Ok(())
    }

    fn ignore_ctrl_c(&mut self) -> ExitResult<()> {
        unsafe { SetConsoleCtrlHandler(None, true) }
            .map_err(|e| ExitError::delivery_failed(self.pid, win32_error("SetConsoleCtrlHandler", &e)))?;
        self.ignoring_ctrl_c = true;
        Ok(())
    }

    fn broadcast(&mut self) -> ExitResult<()> {
        trace!(pid = self.pid, "Broadcasting Ctrl+C to attached console");
        // Process group 0 addresses every process on the attached console.
        unsafe { GenerateConsoleCtrlEvent(CTRL_C_EVENT, 0) }
            .map_err(|e| ExitError::delivery_failed(self.pid, win32_error("GenerateConsoleCtrlEvent", &e)))?;
        std::thread::sleep(CTRL_EVENT_SETTLE);
        Ok(())
    }

    fn end(mut self) -> Vec<NativeError> {
        self.restore()
    }

    /// Detach from the target before lifting the Ctrl+C ignore, so the
    /// broadcast can never reach this process.
    fn restore(&mut self) -> Vec<NativeError> {
        let mut failures = Vec::new();

        if std::mem::take(&mut self.attached_to_target) {
            if let Err(e) = unsafe { FreeConsole() } {
                failures.push(win32_error("FreeConsole", &e));
            }
        }
        if std::mem::take(&mut self.ignoring_ctrl_c) {
            if let Err(e) = unsafe { SetConsoleCtrlHandler(None, false) } {
                failures.push(win32_error("SetConsoleCtrlHandler", &e));
            }
        }
        if std::mem::take(&mut self.had_console) {
            if let Err(e) = unsafe { AttachConsole(ATTACH_PARENT_PROCESS) } {
                failures.push(win32_error("AttachConsole", &e));
            }
        }

        failures
    }
}

impl Drop for ConsoleSession {
    fn drop(&mut self) {
        for failure in self.restore() {
            warn!(pid = self.pid, "Console restore failed: {}", failure);
        }
    }
}

//! Signal translation.
//!
//! Callers pass the same abstract signal number on every platform. On Unix
//! it maps one-to-one onto the native signal table. Windows has a single
//! cooperative primitive, the console Ctrl+C event, so every value maps to
//! it there.

use hsu_common::ExitResult;

/// Conventional "interrupt" signal number.
pub const SIGINT: i32 = 2;
/// Conventional "kill" signal number.
pub const SIGKILL: i32 = 9;
/// Conventional "terminate" signal number.
pub const SIGTERM: i32 = 15;

/// Exit code reported by a process ended with `force_terminate` on Windows.
///
/// On Unix a forced termination is always `SIGKILL`.
pub const FORCED_EXIT_CODE: u32 = 1;

/// The platform primitive a signal number translates to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeSignal {
    /// Delivered directly to the target with `kill(2)`.
    #[cfg(unix)]
    Signal(nix::sys::signal::Signal),

    /// Broadcast to the target's console group with `GenerateConsoleCtrlEvent`.
    #[cfg(windows)]
    ConsoleInterrupt,
}

/// Translates an abstract signal number into the native primitive.
///
/// On Unix, values outside the signal table (including `0`) fail with
/// `ExitError::InvalidSignal`. On Windows any value is accepted.
pub fn translate(signal: i32) -> ExitResult<NativeSignal> {
    #[cfg(unix)]
    {
        use nix::sys::signal::Signal;

        Signal::try_from(signal)
            .map(NativeSignal::Signal)
            .map_err(|_| hsu_common::ExitError::invalid_signal(signal))
    }

    #[cfg(windows)]
    {
        let _ = signal;
        Ok(NativeSignal::ConsoleInterrupt)
    }
}

/// Shell-convention exit status for a process that stopped because of
/// `signal` (`128 + signal`).
///
/// Informational only; nothing in this crate enforces it.
pub fn expected_exit_code(signal: i32) -> i32 {
    128 + signal
}

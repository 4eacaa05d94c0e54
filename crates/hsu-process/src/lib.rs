//! # HSU Process
//!
//! Cooperative and forced process exit for the HSU framework.
//!
//! This crate provides cross-platform primitives for:
//! - Resolving a PID into a live process handle
//! - Translating abstract signal numbers into native primitives
//! - Delivering a cooperative interrupt (signal on Unix, console Ctrl+C on Windows)
//! - Waiting for exit within a cancellable budget
//! - Forced termination
//!
//! Descendants of the target process are never touched.

pub mod check;
pub mod config;
pub mod signal;
pub mod stop;
pub mod terminate;
pub mod wait;

#[cfg(unix)]
mod terminate_unix;

#[cfg(windows)]
mod terminate_windows;

// Re-export main types
pub use check::{process_exists, ProcessHandle};
pub use config::{ConfigError, GracefulStopConfig};
pub use signal::{expected_exit_code, translate, NativeSignal, FORCED_EXIT_CODE, SIGINT, SIGKILL, SIGTERM};
pub use stop::{stop_process, stop_process_with_context, StopOutcome};
pub use terminate::{force_terminate, request_exit, request_exit_with_interval};
pub use wait::{wait_for_exit, DEFAULT_POLL_INTERVAL};

pub use hsu_common::{ExitError, ExitResult, NativeError, WaitContext};

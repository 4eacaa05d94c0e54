//! # HSU Common
//!
//! Types shared by the HSU graceful-exit crates: the error taxonomy returned
//! by `request_exit` / `force_terminate`, and the [`WaitContext`]
//! cancellation budget that bounds how long a caller waits for a process to
//! exit.

pub mod context;
pub mod errors;

// Re-export commonly used items
pub use context::WaitContext;
pub use errors::{ExitError, ExitResult, NativeError};

//! Error types for graceful process exit.
//!
//! # Rust Learning Note
//!
//! Go's `context` package reports `context.Canceled` /
//! `context.DeadlineExceeded` as sentinel values compared with `==`. In Rust
//! the same identity check is a pattern match:
//!
//! ```rust
//! use hsu_common::ExitError;
//!
//! fn is_budget_exhausted(err: &ExitError) -> bool {
//!     matches!(err, ExitError::Cancelled | ExitError::DeadlineExceeded)
//! }
//! ```
//!
//! Errors coming from the operating system keep their native text in
//! [`NativeError`], because downstream consumers match on those strings.

use std::fmt;
use thiserror::Error;

/// Result type for graceful exit operations.
pub type ExitResult<T> = std::result::Result<T, ExitError>;

/// An error reported by a platform API, with its text preserved verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeError {
    /// Name of the failing platform call, e.g. `OpenProcess` or `kill`.
    pub operation: &'static str,
    /// The platform's own message for the failure.
    pub message: String,
    /// Raw platform error code (errno or HRESULT), when one is available.
    pub code: Option<i32>,
}

impl NativeError {
    pub fn new(operation: &'static str, message: impl Into<String>, code: Option<i32>) -> Self {
        Self {
            operation,
            message: message.into(),
            code,
        }
    }
}

impl fmt::Display for NativeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.operation, self.message)
    }
}

impl std::error::Error for NativeError {}

/// Failure modes of `request_exit` and `force_terminate`.
///
/// `Cancelled` and `DeadlineExceeded` are unit variants so callers can test
/// for them directly; the remaining variants display the native error text
/// unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExitError {
    /// The caller's wait context was cancelled, before or during the wait.
    #[error("context canceled")]
    Cancelled,

    /// The caller's wait context deadline elapsed, before or during the wait.
    #[error("context deadline exceeded")]
    DeadlineExceeded,

    /// The PID does not resolve to an accessible, running process.
    #[error("{native}")]
    InvalidTarget {
        pid: u32,
        native: NativeError,
        /// Console restoration failures that happened after the primary error.
        cleanup: Vec<NativeError>,
    },

    /// The signal number cannot be translated on this platform.
    #[error("invalid signal: {signal}")]
    InvalidSignal { signal: i32 },

    /// Attaching, broadcasting, signalling or terminating failed.
    #[error("{native}")]
    DeliveryFailed {
        pid: u32,
        native: NativeError,
        /// Console restoration failures that happened after the primary error.
        cleanup: Vec<NativeError>,
    },
}

impl ExitError {
    pub fn invalid_target(pid: u32, native: NativeError) -> Self {
        Self::InvalidTarget {
            pid,
            native,
            cleanup: Vec::new(),
        }
    }

    pub fn delivery_failed(pid: u32, native: NativeError) -> Self {
        Self::DeliveryFailed {
            pid,
            native,
            cleanup: Vec::new(),
        }
    }

    pub fn invalid_signal(signal: i32) -> Self {
        Self::InvalidSignal { signal }
    }

    /// Returns true for the two wait-context errors.
    pub fn is_context_error(&self) -> bool {
        matches!(self, Self::Cancelled | Self::DeadlineExceeded)
    }

    /// The native platform error behind this error, if any.
    pub fn native(&self) -> Option<&NativeError> {
        match self {
            Self::InvalidTarget { native, .. } | Self::DeliveryFailed { native, .. } => Some(native),
            _ => None,
        }
    }

    /// Cleanup failures attached to this error.
    pub fn cleanup_errors(&self) -> &[NativeError] {
        match self {
            Self::InvalidTarget { cleanup, .. } | Self::DeliveryFailed { cleanup, .. } => cleanup,
            _ => &[],
        }
    }

    /// Attaches cleanup failures as supplementary context.
    ///
    /// The primary error and its display text are left untouched. Errors
    /// without a native cause have nowhere to carry cleanup context and are
    /// returned unchanged.
    pub fn with_cleanup(mut self, failures: impl IntoIterator<Item = NativeError>) -> Self {
        if let Self::InvalidTarget { cleanup, .. } | Self::DeliveryFailed { cleanup, .. } = &mut self {
            cleanup.extend(failures);
        }
        self
    }
}

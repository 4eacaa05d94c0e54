//! Cancellation and deadline budget for waiting on a process exit.
//!
//! [`WaitContext`] plays the role of Go's `context.Context` for
//! `request_exit`: it can be cancelled explicitly, can carry a deadline, and
//! reports which of the two fired through [`WaitContext::err`].

use crate::errors::ExitError;
use std::time::Duration;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;

/// A cancellation token with an optional deadline.
///
/// Clones share the same cancellation state; [`WaitContext::child`] creates a
/// context that is cancelled with its parent but can also be cancelled on
/// its own.
#[derive(Debug, Clone)]
pub struct WaitContext {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl WaitContext {
    /// A context that never expires unless cancelled.
    pub fn background() -> Self {
        Self {
            token: CancellationToken::new(),
            deadline: None,
        }
    }

    /// A context intended to be cancelled with [`WaitContext::cancel`].
    pub fn with_cancel() -> Self {
        Self::background()
    }

    /// A context whose deadline is `timeout` from now.
    ///
    /// A zero timeout yields an already expired context.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            token: CancellationToken::new(),
            deadline: Instant::now().checked_add(timeout),
        }
    }

    /// A context that expires at `deadline`.
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            token: CancellationToken::new(),
            deadline: Some(deadline),
        }
    }

    /// A child context sharing this context's deadline.
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    /// A child context whose deadline is the earlier of the parent's deadline
    /// and `timeout` from now.
    pub fn child_with_timeout(&self, timeout: Duration) -> Self {
        let own = Instant::now().checked_add(timeout);
        let deadline = match (self.deadline, own) {
            (Some(parent), Some(own)) => Some(parent.min(own)),
            (parent, own) => parent.or(own),
        };
        Self {
            token: self.token.child_token(),
            deadline,
        }
    }

    /// Cancels this context and every child derived from it.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Returns the reason this context is no longer valid, or `None` while it
    /// still has budget left.
    ///
    /// Explicit cancellation is reported before an elapsed deadline.
    pub fn err(&self) -> Option<ExitError> {
        if self.token.is_cancelled() {
            return Some(ExitError::Cancelled);
        }
        match self.deadline {
            Some(deadline) if deadline <= Instant::now() => Some(ExitError::DeadlineExceeded),
            _ => None,
        }
    }

    /// Resolves once the context is cancelled or its deadline elapses, and
    /// returns the matching error.
    pub async fn done(&self) -> ExitError {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    biased;
                    _ = self.token.cancelled() => ExitError::Cancelled,
                    _ = sleep_until(deadline) => ExitError::DeadlineExceeded,
                }
            }
            None => {
                self.token.cancelled().await;
                ExitError::Cancelled
            }
        }
    }
}

impl Default for WaitContext {
    fn default() -> Self {
        Self::background()
    }
}

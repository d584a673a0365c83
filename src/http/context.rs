//! Caller-side cancellation and deadlines for API calls.
//!
//! A [`Context`] is cheap to clone and carries an optional deadline plus a
//! cancellation token. Tokens of derived contexts are children of their
//! parent's, so cancelling a parent also cancels everything derived from it.
//! The dispatcher races network I/O against [`Context::done`] so a cancelled
//! call returns promptly.

use crate::http::error::Error;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Default)]
pub struct Context {
    deadline: Option<Instant>,
    cancel: Option<CancellationToken>,
}

/// Cancels the [`Context`] that created it and every context derived from it.
/// Dropping the handle does not cancel.
#[derive(Debug)]
pub struct CancelHandle {
    token: CancellationToken,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.token.cancel();
    }
}

impl Context {
    /// A context that is never cancelled and has no deadline.
    pub fn background() -> Self {
        Self::default()
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Keeps the earlier of the existing and the given deadline.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(current) => current.min(deadline),
            None => deadline,
        });
        self
    }

    pub fn with_cancel(mut self) -> (Self, CancelHandle) {
        let token = match &self.cancel {
            Some(parent) => parent.child_token(),
            None => CancellationToken::new(),
        };
        self.cancel = Some(token.clone());
        (self, CancelHandle { token })
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// The condition that ended this context, if it has ended.
    pub fn err(&self) -> Option<Error> {
        if self.cancel.as_ref().is_some_and(CancellationToken::is_cancelled) {
            return Some(Error::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(Error::DeadlineExceeded),
            _ => None,
        }
    }

    /// Resolves once the context is cancelled or its deadline passes; never
    /// resolves for a background context.
    pub async fn done(&self) -> Error {
        let cancelled = async {
            match &self.cancel {
                Some(token) => token.cancelled().await,
                None => std::future::pending::<()>().await,
            }
        };
        let expired = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::select! {
            biased;
            _ = cancelled => Error::Cancelled,
            _ = expired => Error::DeadlineExceeded,
        }
    }
}

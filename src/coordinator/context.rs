//! Request Context
//!
//! Carries a caller's cancellation signal and deadline through the
//! coordinator, and gives background work a context of its own.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::{CacheError, Result};

/// Cancellation token plus optional deadline.
///
/// Cloning shares the token: cancelling one clone cancels all of them.
/// Use [`RequestContext::child`] for a context that can be cancelled on its own.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl RequestContext {
    /// A context that is never cancelled and has no deadline.
    pub fn background() -> Self {
        Self::default()
    }

    /// A fresh context that expires `timeout` from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::background().timeout(timeout)
    }

    /// A detached context for background work: independent of any caller,
    /// bounded by its own `timeout`.
    pub fn detached(timeout: Duration) -> Self {
        Self::with_timeout(timeout)
    }

    /// Tightens the deadline to at most `timeout` from now.
    ///
    /// A `timeout` too large to represent as a deadline leaves the context unchanged.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        let Some(candidate) = Instant::now().checked_add(timeout) else {
            return self;
        };
        self.deadline = Some(match self.deadline {
            Some(existing) if existing < candidate => existing,
            _ => candidate,
        });
        self
    }

    /// A child context, cancelled when the parent is, but cancellable on its own.
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline. None when there is no deadline.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// Returns the reason this context is done, if it is.
    pub fn err(&self) -> Option<CacheError> {
        if self.token.is_cancelled() {
            Some(CacheError::Cancelled)
        } else if matches!(self.deadline, Some(d) if Instant::now() >= d) {
            Some(CacheError::DeadlineExceeded)
        } else {
            None
        }
    }

    /// Resolves when the context is cancelled or its deadline passes.
    pub async fn done(&self) -> CacheError {
        match self.deadline {
            Some(deadline) => tokio::select! {
                biased;
                _ = self.token.cancelled() => CacheError::Cancelled,
                _ = tokio::time::sleep_until(deadline) => CacheError::DeadlineExceeded,
            },
            None => {
                self.token.cancelled().await;
                CacheError::Cancelled
            }
        }
    }

    /// Runs `fut` until it finishes or the context is done, whichever is first.
    pub async fn run<F: Future>(&self, fut: F) -> Result<F::Output> {
        if let Some(err) = self.err() {
            return Err(err);
        }
        tokio::select! {
            biased;
            err = self.done() => Err(err),
            out = fut => Ok(out),
        }
    }
}

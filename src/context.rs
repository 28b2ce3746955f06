//! Request-scoped cancellation and deadline, passed unchanged from the
//! service to every collaborator it calls.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::TodoError;

#[derive(Debug, Clone, Default)]
pub struct Context {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl Context {
    pub fn background() -> Self {
        Self::default()
    }

    /// Child context that also ends at `deadline`. An earlier parent
    /// deadline wins.
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline {
            Some(parent) if parent < deadline => parent,
            _ => deadline,
        };
        Self {
            token: self.token.child_token(),
            deadline: Some(deadline),
        }
    }

    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Child context cancelled together with this one, or on its own via
    /// [`Context::cancel`].
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

    pub fn is_expired(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Ok while the context is live; the reason it ended otherwise.
    pub fn err(&self) -> Result<(), TodoError> {
        if self.is_cancelled() {
            return Err(TodoError::unknown("context canceled"));
        }
        if self.is_expired() {
            return Err(TodoError::unknown("context deadline exceeded"));
        }
        Ok(())
    }

    /// Resolves once the context is cancelled or its deadline passes.
    pub async fn done(&self) {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    _ = self.token.cancelled() => {}
                    _ = tokio::time::sleep_until(deadline) => {}
                }
            }
            None => self.token.cancelled().await,
        }
    }

    /// Runs `fut` unless the context ends first.
    pub async fn run<T, F>(&self, fut: F) -> Result<T, TodoError>
    where
        F: Future<Output = Result<T, TodoError>>,
    {
        self.err()?;
        tokio::select! {
            biased;
            _ = self.done() => Err(self.err().err().unwrap_or_else(|| TodoError::unknown("context canceled"))),
            out = fut => out,
        }
    }
}

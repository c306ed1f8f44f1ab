//! Cancellation context passed to context-aware driver operations.
//!
//! The adapter never inspects a context; it forwards it to the delegate.
//! The generic `sql` layer checks it before falling back to operations that
//! cannot observe cancellation themselves.

use crate::error::ContextError;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;

/// A cancellation signal with an optional deadline.
///
/// Clones share the same signal.
///
/// # Example
///
/// ```
/// use wrapdb_rs::context::Context;
/// use wrapdb_rs::error::ContextError;
///
/// let (ctx, cancel) = Context::with_cancel();
/// assert!(ctx.err().is_none());
/// cancel.cancel();
/// assert_eq!(ctx.err(), Some(ContextError::Canceled));
/// ```
#[derive(Debug, Clone)]
pub struct Context {
    cancelled: Option<watch::Receiver<bool>>,
    deadline: Option<Instant>,
}

/// Handle that cancels its [`Context`] and all of its clones.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    sender: Arc<watch::Sender<bool>>,
}

impl CancelHandle {
    /// Cancel the associated context.
    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }
}

impl Context {
    /// A context that is never cancelled and has no deadline.
    pub fn background() -> Self {
        Self {
            cancelled: None,
            deadline: None,
        }
    }

    /// A context cancelled through the returned handle.
    pub fn with_cancel() -> (Self, CancelHandle) {
        let (sender, receiver) = watch::channel(false);
        let ctx = Self {
            cancelled: Some(receiver),
            deadline: None,
        };
        (
            ctx,
            CancelHandle {
                sender: Arc::new(sender),
            },
        )
    }

    /// A context that expires after `timeout`.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::background().deadline_at(Instant::now() + timeout)
    }

    /// A context that expires at `deadline`.
    pub fn with_deadline(deadline: Instant) -> Self {
        Self::background().deadline_at(deadline)
    }

    /// Derive a context sharing this cancellation signal with a deadline.
    ///
    /// An existing earlier deadline is kept.
    pub fn deadline_at(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(existing) if existing < deadline => existing,
            _ => deadline,
        });
        self
    }

    /// The deadline, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Why the context is done, or `None` while it is still live.
    pub fn err(&self) -> Option<ContextError> {
        if let Some(receiver) = &self.cancelled {
            if *receiver.borrow() {
                return Some(ContextError::Canceled);
            }
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(ContextError::DeadlineExceeded),
            _ => None,
        }
    }

    /// Check if the context is cancelled or past its deadline.
    pub fn is_done(&self) -> bool {
        self.err().is_some()
    }

    /// Wait until the context is done and report why.
    ///
    /// Never resolves for a background context.
    pub async fn done(&self) -> ContextError {
        let mut receiver = self.cancelled.clone();
        let cancelled = async move {
            match receiver.as_mut() {
                Some(rx) => {
                    // A dropped handle can no longer cancel.
                    if rx.wait_for(|cancelled| *cancelled).await.is_err() {
                        std::future::pending::<()>().await;
                    }
                }
                None => std::future::pending::<()>().await,
            }
        };
        let expired = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline.into()).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            _ = cancelled => ContextError::Canceled,
            _ = expired => ContextError::DeadlineExceeded,
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::background()
    }
}

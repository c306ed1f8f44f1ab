//! Error types for wrapdb-rs.
//!
//! The adapter layer introduces a single error class, [`StackError`]: a
//! delegate error carrying the backtrace and source location of the point
//! where it crossed the adapter. The remaining types are sentinels and
//! bookkeeping errors raised by the registry, the cancellation context and
//! the generic `sql` layer.

use crate::wrapper::BacktraceMode;
use std::backtrace::{Backtrace, BacktraceStatus};
use std::error::Error as StdError;
use std::fmt;
use std::panic::Location;
use thiserror::Error;

/// Boxed error type used across the driver contract.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Result type returned by every fallible driver operation.
pub type DriverResult<T> = Result<T, BoxError>;

/// A delegate error annotated with call-site stack context.
///
/// `Display` renders exactly the message of the wrapped cause, so log lines
/// and comparisons on the message keep working. The alternate form (`{:#}`)
/// appends the interception site and the captured stack frames.
///
/// The cause stays reachable through [`std::error::Error::source`],
/// [`StackError::downcast_ref`] and [`find_cause`].
///
/// # Example
///
/// ```
/// use wrapdb_rs::error::StackError;
/// use std::error::Error;
///
/// let err = StackError::new(std::io::Error::other("connection refused"));
/// assert_eq!(err.to_string(), "connection refused");
/// assert!(format!("{:#}", err).contains("connection refused"));
/// assert!(err.source().is_some());
/// ```
pub struct StackError {
    cause: BoxError,
    location: &'static Location<'static>,
    backtrace: Backtrace,
}

impl StackError {
    /// Wrap `cause`, always capturing a backtrace.
    #[track_caller]
    pub fn new(cause: impl Into<BoxError>) -> Self {
        Self::with_mode(cause, BacktraceMode::Force)
    }

    /// Wrap `cause`, capturing a backtrace according to `mode`.
    #[track_caller]
    pub fn with_mode(cause: impl Into<BoxError>, mode: BacktraceMode) -> Self {
        Self {
            cause: cause.into(),
            location: Location::caller(),
            backtrace: mode.capture(),
        }
    }

    /// The original delegate error.
    pub fn cause(&self) -> &(dyn StdError + Send + Sync + 'static) {
        &*self.cause
    }

    /// Attempt to view the cause as a concrete error type.
    pub fn downcast_ref<E: StdError + 'static>(&self) -> Option<&E> {
        self.cause.downcast_ref::<E>()
    }

    /// Check whether the cause is of type `E`.
    pub fn is<E: StdError + 'static>(&self) -> bool {
        self.cause.is::<E>()
    }

    /// Discard the stack context and return the original error.
    pub fn into_cause(self) -> BoxError {
        self.cause
    }

    /// Source location where the error crossed the adapter.
    pub fn location(&self) -> &'static Location<'static> {
        self.location
    }

    /// Backtrace captured at the interception point.
    pub fn backtrace(&self) -> &Backtrace {
        &self.backtrace
    }
}

impl fmt::Display for StackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.cause)?;

        if f.alternate() {
            write!(f, "\n    at {}", self.location)?;
            if self.backtrace.status() == BacktraceStatus::Captured {
                write!(f, "\n\nStack backtrace:\n{}", self.backtrace)?;
            }
        }

        Ok(())
    }
}

impl fmt::Debug for StackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StackError")
            .field("cause", &self.cause)
            .field("location", &format_args!("{}", self.location))
            .field("backtrace", &self.backtrace.status())
            .finish()
    }
}

impl StdError for StackError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(&*self.cause as &(dyn StdError + 'static))
    }
}

/// Annotate `err` with stack context unless it already carries some.
///
/// An error that is already a [`StackError`] is returned untouched, so a
/// chain of nested adapters reports the innermost interception site.
#[track_caller]
pub fn annotate(err: BoxError, mode: BacktraceMode) -> BoxError {
    if err.is::<StackError>() {
        return err;
    }
    Box::new(StackError::with_mode(err, mode))
}

/// Annotate the error of `result`, leaving `Ok` values untouched.
#[track_caller]
pub fn with_stack<T>(result: DriverResult<T>, mode: BacktraceMode) -> DriverResult<T> {
    match result {
        Ok(value) => Ok(value),
        Err(err) => Err(annotate(err, mode)),
    }
}

/// Walk the `source()` chain of `err` looking for an error of type `E`.
///
/// The error itself is checked first, so this also matches unannotated
/// errors.
pub fn find_cause<'a, E: StdError + 'static>(err: &'a (dyn StdError + 'static)) -> Option<&'a E> {
    let mut current = Some(err);
    while let Some(e) = current {
        if let Some(found) = e.downcast_ref::<E>() {
            return Some(found);
        }
        current = e.source();
    }
    None
}

/// Sentinel and negotiation errors of the driver contract.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DriverError {
    /// Returned by an optional fast path to request the generic fallback
    #[error("driver: skip fast path; continue as if unimplemented")]
    Skip,

    /// Returned by a named-value checker to drop the argument
    #[error("driver: remove argument from query")]
    RemoveArgument,

    /// The delegate advertised a capability at wrap time but no longer offers it
    #[error("delegate no longer provides capability '{capability}'")]
    CapabilityWithdrawn { capability: &'static str },

    /// Non-default transaction options on a delegate without `ConnBeginTx`
    #[error("driver does not support non-default transaction options")]
    UnsupportedTxOptions,

    /// Argument count does not match the statement's placeholders
    #[error("expected {expected} arguments, got {got}")]
    ArgumentCount { expected: usize, got: usize },

    /// Argument ordinal is not 1-based
    #[error("argument ordinals start at 1, got {ordinal}")]
    InvalidOrdinal { ordinal: usize },
}

impl DriverError {
    /// Check whether `err`, or any error in its source chain, is [`DriverError::Skip`].
    pub fn is_skip(err: &(dyn StdError + 'static)) -> bool {
        matches!(find_cause::<DriverError>(err), Some(DriverError::Skip))
    }

    /// Check whether `err`, or any error in its source chain, is
    /// [`DriverError::RemoveArgument`].
    pub fn is_remove_argument(err: &(dyn StdError + 'static)) -> bool {
        matches!(
            find_cause::<DriverError>(err),
            Some(DriverError::RemoveArgument)
        )
    }
}

/// Errors reported by a finished [`Context`](crate::context::Context).
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextError {
    /// The context was cancelled explicitly
    #[error("context canceled")]
    Canceled,

    /// The context deadline passed
    #[error("context deadline exceeded")]
    DeadlineExceeded,
}

/// Errors related to driver registration and lookup.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Driver names must not be empty
    #[error("driver name must not be empty")]
    EmptyName,

    /// A driver is already registered under this name
    #[error("driver '{0}' is already registered")]
    Duplicate(String),

    /// No driver is registered under this name
    #[error("unknown driver '{0}' (forgotten registration?)")]
    UnknownDriver(String),
}

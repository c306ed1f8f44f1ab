//! Adapter configuration.
//!
//! This module holds the knobs that control how the adapter annotates
//! delegate errors. The options are copied into every connection and
//! statement produced by a wrapped driver.

use crate::error::{with_stack, DriverError, DriverResult};
use serde::{Deserialize, Serialize};
use std::backtrace::Backtrace;

/// How the adapter captures backtraces for annotated errors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BacktraceMode {
    /// Always capture, regardless of `RUST_BACKTRACE`
    #[default]
    Force,
    /// Capture only when `RUST_BACKTRACE` or `RUST_LIB_BACKTRACE` enables it
    Capture,
    /// Never capture; only the interception location is recorded
    Disabled,
}

impl BacktraceMode {
    /// Capture a backtrace at the current point according to this mode.
    pub fn capture(self) -> Backtrace {
        match self {
            BacktraceMode::Force => Backtrace::force_capture(),
            BacktraceMode::Capture => Backtrace::capture(),
            BacktraceMode::Disabled => Backtrace::disabled(),
        }
    }
}

/// Options for a wrapped driver.
///
/// # Example
///
/// ```
/// use wrapdb_rs::wrapper::{BacktraceMode, WrapOptions};
///
/// let options = WrapOptions::new()
///     .backtrace(BacktraceMode::Capture)
///     .log_errors(false);
/// assert_eq!(options.backtrace_mode(), BacktraceMode::Capture);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WrapOptions {
    /// Backtrace capture policy
    pub backtrace: BacktraceMode,
    /// Emit a `tracing` debug event for every annotated error
    pub log_errors: bool,
}

impl WrapOptions {
    /// Create options with the defaults (forced backtraces, error logging on).
    pub fn new() -> Self {
        Self {
            backtrace: BacktraceMode::Force,
            log_errors: true,
        }
    }

    /// Set the backtrace capture policy.
    pub fn backtrace(mut self, mode: BacktraceMode) -> Self {
        self.backtrace = mode;
        self
    }

    /// Enable or disable debug events for annotated errors.
    pub fn log_errors(mut self, enabled: bool) -> Self {
        self.log_errors = enabled;
        self
    }

    /// Get the backtrace capture policy.
    pub fn backtrace_mode(&self) -> BacktraceMode {
        self.backtrace
    }

    /// Annotate the error of a delegate call made for `operation`.
    #[track_caller]
    pub(crate) fn annotate<T>(&self, operation: &'static str, result: DriverResult<T>) -> DriverResult<T> {
        let mut mode = self.backtrace;
        if let Err(err) = &result {
            // Sentinels are control flow: no event and no stack frames.
            if DriverError::is_skip(&**err) || DriverError::is_remove_argument(&**err) {
                mode = BacktraceMode::Disabled;
            } else if self.log_errors {
                tracing::debug!(
                    target: "wrapdb::wrapper",
                    operation,
                    error = %err,
                    "delegate call failed"
                );
            }
        }
        with_stack(result, mode)
    }
}

impl Default for WrapOptions {
    fn default() -> Self {
        Self::new()
    }
}

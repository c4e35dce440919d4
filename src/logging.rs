//! Structured log view of a classified error.
//!
//! [`ErrorLog`] borrows from the error it describes and cannot outlive it.
//! It exposes the classification and trace as separate fields so a logging
//! framework decides how to serialize them, and writes a bounded one-line
//! form without intermediate allocations for untruncated fields.
//!
//! [`emit`] records the view as a `tracing` event.
//!
//! # Example
//!
//! ```rust
//! use classified_errors::{ClassifiedError, LogLevel};
//! use std::io;
//!
//! let err = ClassifiedError::fail(404, "not found")
//!     .wrap(io::Error::from(io::ErrorKind::NotFound), "open index");
//!
//! err.with_log(|log| {
//!     let mut line = String::new();
//!     log.write_to(&mut line).unwrap();
//!     assert!(line.starts_with("[404] message='not found' trace='open index: "));
//!     assert_eq!(log.level(), LogLevel::Warn);
//! });
//! ```

use crate::{ClassifiedError, Code, Trace};
use std::borrow::Cow;
use std::fmt;

/// Maximum length for any individual field in formatted output (DoS prevention)
const MAX_FIELD_OUTPUT_LEN: usize = 1024;

/// Truncation indicator appended to truncated strings
const TRUNCATION_INDICATOR: &str = "...[TRUNCATED]";

/// Severity chosen for an error when it is emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogLevel {
    /// Classified: an expected failure category.
    Warn,
    /// Unclassified: nobody recognised this failure before it surfaced.
    Error,
}

/// Structured log entry borrowing from a [`ClassifiedError`].
#[derive(Debug, Clone, Copy)]
pub struct ErrorLog<'a> {
    code: Code,
    message: &'a str,
    trace: Option<&'a Trace>,
}

impl<'a> ErrorLog<'a> {
    /// Format for human-readable logs in trusted debug contexts, including
    /// the extended trace with stack frames.
    ///
    /// Only available with BOTH the `trusted_debug` feature flag AND debug
    /// assertions enabled.
    #[cfg(all(feature = "trusted_debug", debug_assertions))]
    pub fn format_for_trusted_debug(&self) -> String {
        let mut output = self.to_string();
        if let Some(trace) = self.trace {
            output.push('\n');
            output.push_str(&format!("{:#}", trace));
        }
        output
    }

    /// Write the entry as one bounded line.
    ///
    /// Format: `[{code}] message='{message}' trace='{plain trace}' stacks={n}`.
    /// `trace` and `stacks` are omitted when there is no trace.
    pub fn write_to(&self, f: &mut impl fmt::Write) -> fmt::Result {
        write!(
            f,
            "[{}] message='{}'",
            self.code,
            truncate_with_indicator(self.message)
        )?;

        if let Some(trace) = self.trace {
            let text = trace.to_string();
            write!(
                f,
                " trace='{}' stacks={}",
                truncate_with_indicator(&text),
                trace.stack_depth()
            )?;
        }

        Ok(())
    }

    /// Classification code.
    #[inline]
    pub const fn code(&self) -> Code {
        self.code
    }

    /// Classification message.
    #[inline]
    pub const fn message(&self) -> &'a str {
        self.message
    }

    /// The trace, if any. Not truncated.
    #[inline]
    pub const fn trace(&self) -> Option<&'a Trace> {
        self.trace
    }

    /// Number of annotation layers, zero without a trace.
    #[inline]
    pub fn depth(&self) -> usize {
        self.trace.map_or(0, Trace::depth)
    }

    /// `Error` for unclassified errors, `Warn` otherwise.
    #[inline]
    pub const fn level(&self) -> LogLevel {
        if self.code.is_classified() {
            LogLevel::Warn
        } else {
            LogLevel::Error
        }
    }
}

impl fmt::Display for ErrorLog<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_to(f)
    }
}

impl ClassifiedError {
    /// Create a structured log entry with explicit lifetime.
    #[inline]
    pub fn log(&self) -> ErrorLog<'_> {
        ErrorLog {
            code: self.code(),
            message: self.message(),
            trace: self.get_error(),
        }
    }

    /// Callback-style access to [`ClassifiedError::log`].
    #[inline]
    pub fn with_log<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&ErrorLog<'_>) -> R,
    {
        let log = self.log();
        f(&log)
    }
}

/// Record `err` as a `tracing` event.
///
/// Fields: `code`, `error_message`, `trace` (plain text), `stacks`. The level
/// follows [`ErrorLog::level`].
pub fn emit(err: &ClassifiedError) {
    err.with_log(|log| {
        let trace = log.trace().map(ToString::to_string).unwrap_or_default();
        let stacks = log.trace().map_or(0, Trace::stack_depth);
        let code = log.code().value();
        let message = truncate_with_indicator(log.message());
        let trace = truncate_with_indicator(&trace);

        match log.level() {
            LogLevel::Error => tracing::error!(
                code,
                error_message = %message,
                trace = %trace,
                stacks,
                "unclassified error"
            ),
            LogLevel::Warn => tracing::warn!(
                code,
                error_message = %message,
                trace = %trace,
                stacks,
                "classified error"
            ),
        }
    });
}

/// Truncate a string for display to prevent DoS via extremely long error messages.
///
/// If the string exceeds MAX_FIELD_OUTPUT_LEN, it's truncated with an indicator
/// to make the truncation visible to operators.
///
/// Returns a Cow<str> to avoid allocation when no truncation is needed.
fn truncate_with_indicator(s: &str) -> Cow<'_, str> {
    if s.len() <= MAX_FIELD_OUTPUT_LEN {
        return Cow::Borrowed(s);
    }

    let max_content_len = MAX_FIELD_OUTPUT_LEN.saturating_sub(TRUNCATION_INDICATOR.len());

    // Last valid UTF-8 boundary at or before the limit
    let mut idx = max_content_len;
    while idx > 0 && !s.is_char_boundary(idx) {
        idx -= 1;
    }

    if idx == 0 {
        return Cow::Borrowed(TRUNCATION_INDICATOR);
    }

    let mut result = String::with_capacity(idx + TRUNCATION_INDICATOR.len());
    result.push_str(&s[..idx]);
    result.push_str(TRUNCATION_INDICATOR);
    Cow::Owned(result)
}

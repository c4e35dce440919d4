//! Render modes for classified errors.
//!
//! The same value serves compact logs and deep debugging:
//!
//! | Mode                    | Formatter | Output                                  |
//! |-------------------------|-----------|-----------------------------------------|
//! | [`RenderMode::Plain`]    | `{}`      | flattened annotations and origin        |
//! | [`RenderMode::Quoted`]   | n/a       | plain text, quoted and escaped          |
//! | [`RenderMode::Extended`] | `{:#}`    | every layer and stack, newline-terminated |
//!
//! Extended output for an error that has no trace yet falls back to plain
//! output, which is empty.

use crate::ClassifiedError;
use std::fmt;

/// Output mode selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RenderMode {
    /// Flattened message text.
    #[default]
    Plain,
    /// Flattened message text in double quotes, with escapes.
    Quoted,
    /// Full trace including stack frames and folded debug context.
    Extended,
}

/// Display adapter returned by [`ClassifiedError::render`].
#[derive(Clone, Copy)]
pub struct Rendered<'a> {
    error: &'a ClassifiedError,
    mode: RenderMode,
}

impl<'a> Rendered<'a> {
    #[inline]
    pub(crate) const fn new(error: &'a ClassifiedError, mode: RenderMode) -> Self {
        Self { error, mode }
    }
}

impl fmt::Display for Rendered<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.mode, self.error.get_error()) {
            (RenderMode::Extended, Some(trace)) => writeln!(f, "{:#}", trace),
            (RenderMode::Quoted, Some(trace)) => write!(f, "{:?}", trace.to_string()),
            (RenderMode::Quoted, None) => f.write_str("\"\""),
            (_, Some(trace)) => write!(f, "{}", trace),
            (_, None) => Ok(()),
        }
    }
}

impl fmt::Debug for Rendered<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

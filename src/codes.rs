//! Classification codes.
//!
//! A [`Code`] is the stable integer a caller branches on. The crate assigns no
//! business meaning to any value except `0`, which means "unclassified".
//! Services that mostly store and fetch data often reuse HTTP status codes
//! here, which is why [`Code::INTERNAL`] is `500`.
//!
//! # Example
//!
//! ```rust
//! use classified_errors::Code;
//!
//! const NOT_FOUND: Code = Code::new(404);
//!
//! assert!(NOT_FOUND.is_classified());
//! assert!(!Code::UNCLASSIFIED.is_classified());
//! assert_eq!(NOT_FOUND.to_string(), "404");
//! ```

use std::fmt;
use zeroize::Zeroize;

/// Integer classification of an error.
///
/// # Copy Semantics
///
/// Codes are small values compared and propagated by value. They are metadata,
/// never part of the cause chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Code(i64);

impl Code {
    /// No classification has been assigned.
    pub const UNCLASSIFIED: Code = Code(0);

    /// Conventional default for failures that reach a boundary unclassified.
    pub const INTERNAL: Code = Code(500);

    /// Create a code from its raw value.
    #[inline]
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// Get the raw numeric value.
    #[inline]
    pub const fn value(self) -> i64 {
        self.0
    }

    /// `false` only for [`Code::UNCLASSIFIED`].
    #[inline]
    pub const fn is_classified(self) -> bool {
        self.0 != 0
    }
}

impl From<i64> for Code {
    #[inline]
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<i32> for Code {
    #[inline]
    fn from(value: i32) -> Self {
        Self(i64::from(value))
    }
}

impl From<Code> for i64 {
    #[inline]
    fn from(code: Code) -> Self {
        code.0
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Write the debug-context form of a classification: `<Error {code}>: {message}`.
///
/// This is the fixed text used when a nested classified error is folded into
/// an outer error's trace.
#[inline]
pub fn write_debug_context(f: &mut impl fmt::Write, code: Code, message: &str) -> fmt::Result {
    write!(f, "<Error {}>: {}", code, message)
}

/// Render the debug-context form of a classification into a new string.
pub fn debug_context(code: Code, message: &str) -> String {
    format!("<Error {}>: {}", code, message)
}

/// A nested classification that had no trace of its own when it was folded
/// into another error.
///
/// It becomes the origin of the outer trace, so [`cause`](crate::cause) lands
/// on it and callers can downcast to recover the inner code and message.
///
/// # Example
///
/// ```rust
/// use classified_errors::{Classification, ClassifiedError, Code};
///
/// let inner = ClassifiedError::fail(404, "not found");
/// let outer = ClassifiedError::fail(502, "upstream failed").wrap(inner, "fetch profile");
///
/// let root = classified_errors::cause(&outer);
/// let folded = root.downcast_ref::<Classification>().unwrap();
/// assert_eq!(folded.code(), Code::new(404));
/// assert_eq!(folded.message(), "not found");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    code: Code,
    message: String,
}

impl Classification {
    #[inline]
    pub(crate) fn new(code: Code, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// The folded code.
    #[inline]
    pub const fn code(&self) -> Code {
        self.code
    }

    /// The folded message.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Drop for Classification {
    fn drop(&mut self) {
        self.message.zeroize();
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_debug_context(f, self.code, &self.message)
    }
}

impl std::error::Error for Classification {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_unclassified() {
        assert_eq!(Code::default(), Code::UNCLASSIFIED);
        assert!(!Code::new(0).is_classified());
        assert!(Code::new(-1).is_classified());
        assert!(Code::INTERNAL.is_classified());
    }

    #[test]
    fn conversions_preserve_value() {
        assert_eq!(Code::from(404).value(), 404);
        assert_eq!(Code::from(-7).value(), -7);
        assert_eq!(i64::from(Code::new(418)), 418);
    }

    #[test]
    fn codes_keep_full_64_bit_range() {
        let wide = Code::from(i64::MAX);
        assert_eq!(wide.value(), i64::MAX);
        assert_eq!(wide.to_string(), i64::MAX.to_string());
        assert_eq!(Code::from(i32::MIN).value(), i64::from(i32::MIN));
        assert_eq!(debug_context(Code::new(i64::MIN), "x"), format!("<Error {}>: x", i64::MIN));
    }

    #[test]
    fn debug_context_format_is_fixed() {
        assert_eq!(debug_context(Code::new(404), "not found"), "<Error 404>: not found");
        assert_eq!(debug_context(Code::UNCLASSIFIED, ""), "<Error 0>: ");
    }

    #[test]
    fn classification_displays_as_debug_context() {
        let c = Classification::new(Code::new(409), "conflict");
        assert_eq!(c.to_string(), "<Error 409>: conflict");
        assert_eq!(c.code(), Code::new(409));
        assert_eq!(c.message(), "conflict");
    }
}

//! Free functions, extension traits and macros.
//!
//! The free functions mirror the [`ClassifiedError`] methods but pick the
//! receiver themselves: a classified input becomes its own receiver (the
//! self-wrap path), anything else starts from an unclassified error.
//!
//! "No error" propagates without allocation through [`ResultExt`] (an `Ok`
//! passes through) and [`ErrorOptionExt`] (a `None` stays `None`).
//!
//! # Usage
//!
//! ```rust
//! use classified_errors::{failf, wrapf, Code, ErrorOptionExt, ResultExt};
//! use std::io;
//!
//! let user_id = 42;
//! let err = failf!(404, "user {} not found", user_id);
//! assert_eq!(err.message(), "user 42 not found");
//!
//! let err = wrapf!(io::Error::from(io::ErrorKind::NotFound), "open shard {}", 3);
//! assert_eq!(err.to_string(), "open shard 3: entity not found");
//!
//! let ok: Result<u8, io::Error> = Ok(7);
//! assert_eq!(ok.wrap("never rendered").unwrap(), 7);
//!
//! let nothing: Option<io::Error> = None;
//! assert!(nothing.wrap("never rendered").is_none());
//! assert!(None::<io::Error>.with_stack().is_none());
//! # let _ = Code::UNCLASSIFIED;
//! ```

use crate::{BoxError, ClassifiedError, Code, Wrappable};
use std::borrow::Cow;

// ============================================================================
// Free Functions
// ============================================================================

/// Classify a new failure. Same as [`ClassifiedError::fail`].
#[inline]
pub fn fail(code: impl Into<Code>, message: impl Into<Cow<'static, str>>) -> ClassifiedError {
    ClassifiedError::fail(code, message)
}

/// Annotate `err` with a message.
///
/// A classified `err` is annotated in place (message layer only); a plain one
/// is wrapped with the message and a fresh stack in a new unclassified error.
pub fn wrap(err: impl Into<BoxError>, annotation: impl Into<Cow<'static, str>>) -> ClassifiedError {
    match Wrappable::probe(err.into()) {
        Wrappable::Classified(re) => re.annotate(annotation),
        Wrappable::Plain(err) => ClassifiedError::unclassified().wrap(err, annotation),
    }
}

/// [`wrap`] with the annotation built by `f`.
#[inline]
pub fn wrap_with<F, D>(err: impl Into<BoxError>, f: F) -> ClassifiedError
where
    F: FnOnce() -> D,
    D: Into<Cow<'static, str>>,
{
    wrap(err, f())
}

/// Attach a stack to `err`.
///
/// A classified `err` is returned unchanged; a plain one gets a stack in a
/// new unclassified error.
pub fn with_stack(err: impl Into<BoxError>) -> ClassifiedError {
    match Wrappable::probe(err.into()) {
        Wrappable::Classified(re) => re,
        Wrappable::Plain(err) => ClassifiedError::unclassified().with_stack(err),
    }
}

/// Prepare any error for a response boundary.
///
/// Classified errors pass through unchanged. Plain errors get a stack and
/// [`Code::INTERNAL`] with the message `"internal error"`, so debug
/// information is kept for failures nobody classified.
///
/// # Example
///
/// ```rust
/// use classified_errors::{at_boundary, Code};
/// use std::io;
///
/// let err = at_boundary(io::Error::from(io::ErrorKind::BrokenPipe));
/// assert_eq!(err.code(), Code::INTERNAL);
/// assert!(err.has_trace());
/// ```
pub fn at_boundary(err: impl Into<BoxError>) -> ClassifiedError {
    match Wrappable::probe(err.into()) {
        Wrappable::Classified(re) if re.is_classified() => re,
        Wrappable::Classified(re) => ClassifiedError::fail(Code::INTERNAL, "internal error").with_stack(re),
        Wrappable::Plain(err) => ClassifiedError::fail(Code::INTERNAL, "internal error").with_stack(err),
    }
}

// ============================================================================
// Extension Traits
// ============================================================================

/// Annotation helpers for `Result`.
///
/// `Ok` values pass through untouched; errors go through the matching free
/// function.
pub trait ResultExt<T> {
    /// [`wrap`] the error, if any.
    fn wrap(self, annotation: impl Into<Cow<'static, str>>) -> Result<T, ClassifiedError>;

    /// [`wrap_with`] the error, if any. `f` only runs on the error path.
    fn wrap_with<F, D>(self, f: F) -> Result<T, ClassifiedError>
    where
        F: FnOnce() -> D,
        D: Into<Cow<'static, str>>;

    /// [`with_stack`] the error, if any.
    fn with_stack(self) -> Result<T, ClassifiedError>;

    /// Replace the error with a new classification that wraps it.
    fn fail_with(
        self,
        code: impl Into<Code>,
        message: impl Into<Cow<'static, str>>,
        annotation: impl Into<Cow<'static, str>>,
    ) -> Result<T, ClassifiedError>;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
    E: Into<BoxError>,
{
    #[inline]
    fn wrap(self, annotation: impl Into<Cow<'static, str>>) -> Result<T, ClassifiedError> {
        self.map_err(|e| wrap(e, annotation))
    }

    #[inline]
    fn wrap_with<F, D>(self, f: F) -> Result<T, ClassifiedError>
    where
        F: FnOnce() -> D,
        D: Into<Cow<'static, str>>,
    {
        self.map_err(|e| wrap(e, f()))
    }

    #[inline]
    fn with_stack(self) -> Result<T, ClassifiedError> {
        self.map_err(with_stack)
    }

    #[inline]
    fn fail_with(
        self,
        code: impl Into<Code>,
        message: impl Into<Cow<'static, str>>,
        annotation: impl Into<Cow<'static, str>>,
    ) -> Result<T, ClassifiedError> {
        self.map_err(|e| ClassifiedError::fail(code, message).wrap(e, annotation))
    }
}

/// Annotation helpers for an optional error, where `None` means "no error".
pub trait ErrorOptionExt {
    /// [`wrap`] the error, if any.
    fn wrap(self, annotation: impl Into<Cow<'static, str>>) -> Option<ClassifiedError>;

    /// [`with_stack`] the error, if any.
    fn with_stack(self) -> Option<ClassifiedError>;
}

impl<E> ErrorOptionExt for Option<E>
where
    E: Into<BoxError>,
{
    #[inline]
    fn wrap(self, annotation: impl Into<Cow<'static, str>>) -> Option<ClassifiedError> {
        self.map(|e| wrap(e, annotation))
    }

    #[inline]
    fn with_stack(self) -> Option<ClassifiedError> {
        self.map(with_stack)
    }
}

// ============================================================================
// Macros
// ============================================================================

/// Classify a new failure with a formatted message.
///
/// # Example
///
/// ```rust
/// # use classified_errors::failf;
/// let err = failf!(409, "order {} already exists", "A-17");
/// assert_eq!(err.message(), "order A-17 already exists");
/// assert_eq!(err.to_string(), "");
/// ```
#[macro_export]
macro_rules! failf {
    ($code:expr, $fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::ClassifiedError::fail($code, ::std::format!($fmt $(, $arg)*))
    };
}

/// Annotate an error with a formatted message.
///
/// `wrapf!(err, "fmt", args..)` goes through the free [`wrap`](crate::wrap).
/// `wrapf!(receiver => err, "fmt", args..)` goes through
/// [`ClassifiedError::wrap`](crate::ClassifiedError::wrap).
///
/// # Example
///
/// ```rust
/// # use classified_errors::{wrapf, ClassifiedError};
/// # use std::io;
/// let io_err = io::Error::from(io::ErrorKind::PermissionDenied);
/// let err = wrapf!(ClassifiedError::fail(403, "forbidden") => io_err, "open {}", "/srv/data");
///
/// assert_eq!(err.message(), "forbidden");
/// assert!(err.to_string().starts_with("open /srv/data: "));
/// ```
#[macro_export]
macro_rules! wrapf {
    ($receiver:expr => $err:expr, $fmt:literal $(, $arg:expr)* $(,)?) => {
        $receiver.wrap($err, ::std::format!($fmt $(, $arg)*))
    };
    ($err:expr, $fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::wrap($err, ::std::format!($fmt $(, $arg)*))
    };
}

//! # Classified Errors
//!
//! One error value that carries a classification, a message and an
//! accumulated trace.
//!
//! ## Design Philosophy
//!
//! 1. **Classification is set once.** The `(code, message)` pair is chosen
//!    where business logic first recognises a failure and is never overwritten
//!    by later wrapping.
//! 2. **Traces only grow.** Every annotation adds a layer; nothing is dropped.
//! 3. **Self-wraps add no stack.** Re-annotating an error that is already
//!    classified extends its trace with a message only, so an error passed up
//!    through many call sites carries one stack snapshot, not one per hop.
//! 4. **Nested classifications survive as text.** Wrapping a *different*
//!    classified error folds its code and message into the trace as
//!    `<Error {code}>: {message}` without promoting them.
//!
//! ## Quick Start
//!
//! ```rust
//! use classified_errors::{ClassifiedError, Code, ResultExt};
//! use std::fs;
//!
//! fn read_profile(path: &str) -> classified_errors::Result<String> {
//!     fs::read_to_string(path).wrap(format!("read profile {}", path))
//! }
//!
//! fn load(path: &str) -> classified_errors::Result<String> {
//!     read_profile(path)
//!         .map_err(|e| ClassifiedError::fail(404, "profile not found").wrap(e, "load profile"))
//! }
//!
//! let err = load("/definitely/not/here").unwrap_err();
//! assert_eq!(err.code(), Code::new(404));
//! assert_eq!(err.message(), "profile not found");
//!
//! // Plain text: annotations outermost first, then the origin.
//! assert!(err.to_string().starts_with("load profile: "));
//!
//! // Extended text (`{:#}`) also carries stacks and the folded debug context.
//! assert!(format!("{:#}", err).ends_with('\n'));
//! ```
//!
//! ## Cause Descent
//!
//! ```rust
//! use classified_errors::{cause, with_stack};
//! use std::io;
//!
//! let root = io::Error::new(io::ErrorKind::TimedOut, "upstream timed out");
//! let err = with_stack(with_stack(with_stack(root)));
//!
//! let origin = cause(&err);
//! assert_eq!(origin.to_string(), "upstream timed out");
//! assert!(origin.downcast_ref::<io::Error>().is_some());
//! ```
//!
//! ## Features
//!
//! - `env_backtrace`: capture stacks only when `RUST_BACKTRACE` /
//!   `RUST_LIB_BACKTRACE` enable it (default: always capture)
//! - `trusted_debug`: enable [`ErrorLog::format_for_trusted_debug`] (debug builds only)

#![warn(missing_docs)]
#![warn(clippy::all)]

use std::borrow::Cow;
use std::error::Error;
use std::fmt;
use std::result;

pub mod codes;
pub mod convenience;
pub mod logging;
pub mod render;
pub mod trace;

pub use codes::*;
pub use convenience::*;
pub use logging::*;
pub use render::*;
pub use trace::*;

/// Type alias for Results using our error type.
pub type Result<T, E = ClassifiedError> = result::Result<T, E>;

// ============================================================================
// Capability Probe
// ============================================================================

/// What an incoming error turned out to be.
enum Wrappable {
    /// Any error that is not a `ClassifiedError`. Traces are handled by the
    /// trace primitive itself, which extends them in place.
    Plain(BoxError),
    Classified(ClassifiedError),
}

impl Wrappable {
    #[inline]
    fn probe(err: BoxError) -> Self {
        match err.downcast::<ClassifiedError>() {
            Ok(classified) => Self::Classified(*classified),
            Err(plain) => Self::Plain(plain),
        }
    }
}

// ============================================================================
// Classified Error
// ============================================================================

/// Error value combining a classification with an accumulated trace.
///
/// # Key Properties
///
/// - `code` and `message` are fixed at construction
/// - `trace` is absent until the first wrap and only grows afterwards
/// - Wrapping methods consume and return the receiver, so calls chain:
///   `ClassifiedError::fail(409, "conflict").wrap(err, "save user")`
/// - Owned message and annotation text is zeroized on drop
///
/// # Self-wrap
///
/// A value cannot be passed to its own method, so the self-wrap case is
/// reached through the free functions ([`wrap`], [`with_stack`]) and the
/// [`ResultExt`] / [`ErrorOptionExt`] traits: when the incoming error is
/// already classified it becomes both receiver and argument, and only a
/// message layer is added. [`ClassifiedError::annotate`] is the direct form.
#[must_use = "errors should be handled or logged"]
pub struct ClassifiedError {
    code: Code,
    message: Annotation,
    trace: Option<Trace>,
}

impl ClassifiedError {
    /// Classify a new failure. The trace starts empty.
    ///
    /// Use [`failf!`] for a formatted message.
    #[inline]
    pub fn fail(code: impl Into<Code>, message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            code: code.into(),
            message: Annotation::new(message),
            trace: None,
        }
    }

    /// Blank receiver: no code, no message, no trace.
    #[inline]
    pub fn unclassified() -> Self {
        Self::fail(Code::UNCLASSIFIED, "")
    }

    /// Adopt an existing trace without classifying it.
    #[inline]
    pub fn from_trace(trace: Trace) -> Self {
        Self {
            code: Code::UNCLASSIFIED,
            message: Annotation::new(""),
            trace: Some(trace),
        }
    }

    /// Annotate `err` with a message.
    ///
    /// - A plain error is wrapped with the message and a fresh stack.
    /// - A classified error is folded in through [`with_stack`](Self::with_stack)
    ///   first, then the message is added on top without another stack.
    ///
    /// The receiver's `code` and `message` are never changed.
    pub fn wrap(
        mut self,
        err: impl Into<BoxError>,
        annotation: impl Into<Cow<'static, str>>,
    ) -> Self {
        match Wrappable::probe(err.into()) {
            Wrappable::Classified(inner) => {
                self.fold(inner);
                self.annotate_in_place(annotation);
            }
            Wrappable::Plain(err) => self.install(Trace::wrap(err, annotation)),
        }
        self
    }

    /// Capture a stack over `err`, without a message.
    ///
    /// A classified `err` contributes its debug context
    /// (`<Error {code}>: {message}`) as a message layer above the new stack.
    pub fn with_stack(mut self, err: impl Into<BoxError>) -> Self {
        match Wrappable::probe(err.into()) {
            Wrappable::Classified(inner) => self.fold(inner),
            Wrappable::Plain(err) => self.install(Trace::with_stack(err)),
        }
        self
    }

    /// Self-wrap: add a message layer to this error's own trace.
    ///
    /// No stack is captured. An error without a trace gets one whose origin is
    /// its own [`Classification`].
    #[inline]
    pub fn annotate(mut self, annotation: impl Into<Cow<'static, str>>) -> Self {
        self.annotate_in_place(annotation);
        self
    }

    fn annotate_in_place(&mut self, annotation: impl Into<Cow<'static, str>>) {
        if let Some(trace) = self.trace.as_mut() {
            trace.push_message(annotation);
            return;
        }
        self.trace = Some(Trace::with_message(self.classification(), annotation));
    }

    /// Fold a different classified error into this one's trace.
    fn fold(&mut self, mut inner: ClassifiedError) {
        let trace = match inner.trace.take() {
            Some(mut trace) => {
                trace.push_stack();
                // An unclassified inner error is plain propagation: nothing to fold.
                let classified = inner.is_classified() || !inner.message.is_empty();
                if classified && !inner.is_trace_origin(&trace) {
                    trace.push_message(inner.debug_context());
                }
                trace
            }
            // The classification itself is the origin; repeating it as a
            // message layer would print it twice.
            None => Trace::with_stack(inner.classification()),
        };
        self.install(trace);
    }

    /// Whether `trace`, or a trace it superseded, is rooted at this error's
    /// own classification.
    fn is_trace_origin(&self, trace: &Trace) -> bool {
        let rooted = trace
            .origin()
            .downcast_ref::<Classification>()
            .is_some_and(|c| c.code() == self.code && c.message() == self.message());
        rooted || trace.superseded().any(|previous| self.is_trace_origin(previous))
    }

    /// Replace the trace, keeping any previous one as a superseded layer.
    fn install(&mut self, mut trace: Trace) {
        if let Some(previous) = self.trace.take() {
            trace.supersede(previous);
        }
        self.trace = Some(trace);
    }

    /// Classification code.
    #[inline]
    pub const fn code(&self) -> Code {
        self.code
    }

    /// Classification message; empty when none was set.
    #[inline]
    pub fn message(&self) -> &str {
        self.message.as_str()
    }

    /// Whether a non-zero code was assigned.
    #[inline]
    pub const fn is_classified(&self) -> bool {
        self.code.is_classified()
    }

    /// Whether any wrap has happened yet.
    #[inline]
    pub const fn has_trace(&self) -> bool {
        self.trace.is_some()
    }

    /// The raw trace, for interop with code expecting a plain error.
    #[inline]
    pub const fn get_error(&self) -> Option<&Trace> {
        self.trace.as_ref()
    }

    /// Take the raw trace.
    #[inline]
    pub fn into_trace(mut self) -> Option<Trace> {
        self.trace.take()
    }

    /// Code and message for a response, with fallbacks for unclassified errors.
    ///
    /// # Example
    ///
    /// ```rust
    /// use classified_errors::{wrap, Code};
    /// use std::io;
    ///
    /// let err = wrap(io::Error::from(io::ErrorKind::BrokenPipe), "flush");
    /// let (code, message) = err.classification_or(Code::INTERNAL, "internal error");
    ///
    /// assert_eq!(code, Code::INTERNAL);
    /// assert_eq!(message, "internal error");
    /// ```
    pub fn classification_or<'a>(&'a self, code: Code, message: &'a str) -> (Code, &'a str) {
        if self.is_classified() {
            (self.code, self.message())
        } else {
            (code, message)
        }
    }

    /// This error's code and message as a standalone value.
    #[inline]
    pub fn classification(&self) -> Classification {
        Classification::new(self.code, self.message())
    }

    /// `<Error {code}>: {message}`
    #[inline]
    pub fn debug_context(&self) -> String {
        codes::debug_context(self.code, self.message())
    }

    /// The deepest error of the trace, or `self` when there is no trace.
    #[inline]
    pub fn cause(&self) -> &(dyn Error + 'static) {
        cause(self)
    }

    /// Render in the given mode.
    #[inline]
    pub const fn render(&self, mode: RenderMode) -> Rendered<'_> {
        Rendered::new(self, mode)
    }
}

impl Default for ClassifiedError {
    fn default() -> Self {
        Self::unclassified()
    }
}

impl From<Trace> for ClassifiedError {
    fn from(trace: Trace) -> Self {
        Self::from_trace(trace)
    }
}

impl fmt::Display for ClassifiedError {
    /// `{}` renders the plain trace text, `{:#}` the extended trace.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mode = if f.alternate() {
            RenderMode::Extended
        } else {
            RenderMode::Plain
        };
        fmt::Display::fmt(&self.render(mode), f)
    }
}

impl fmt::Debug for ClassifiedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassifiedError")
            .field("code", &self.code)
            .field("message", &self.message)
            .field("trace", &self.trace)
            .finish()
    }
}

impl Error for ClassifiedError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.trace.as_ref().and_then(|trace| trace.source())
    }
}

// ============================================================================
// Cause Resolution
// ============================================================================

/// One step down the cause chain, if `err` exposes the capability.
#[inline]
fn next_cause<'a>(err: &'a (dyn Error + 'static)) -> Option<&'a (dyn Error + 'static)> {
    if let Some(classified) = err.downcast_ref::<ClassifiedError>() {
        return classified
            .trace
            .as_ref()
            .map(|trace| trace as &(dyn Error + 'static));
    }
    err.downcast_ref::<Trace>()
        .map(|trace| trace.origin() as &(dyn Error + 'static))
}

/// Descend to the deepest underlying error.
///
/// Classified errors descend into their trace, traces into their origin.
/// Descent stops at the first error that is neither; its own
/// [`Error::source`] chain is not followed.
pub fn cause<'a>(err: &'a (dyn Error + 'static)) -> &'a (dyn Error + 'static) {
    let mut current = err;
    while let Some(next) = next_cause(current) {
        current = next;
    }
    current
}

#[cfg(test)]
mod unit_tests {
    use super::*;
    use std::io;

    fn plain() -> io::Error {
        io::Error::new(io::ErrorKind::Other, "connection reset")
    }

    fn stack_depth(err: &ClassifiedError) -> usize {
        err.get_error().map_or(0, Trace::stack_depth)
    }

    #[test]
    fn fail_has_no_trace() {
        let err = ClassifiedError::fail(404, "not found");

        assert_eq!(err.to_string(), "");
        assert_eq!(format!("{:#}", err), "");
        assert_eq!(err.code(), Code::new(404));
        assert_eq!(err.message(), "not found");
        assert!(!err.has_trace());
    }

    #[test]
    fn wrap_plain_keeps_classification() {
        let err = ClassifiedError::fail(503, "unavailable").wrap(plain(), "dial backend");

        assert_eq!(err.to_string(), "dial backend: connection reset");
        assert_eq!(err.code(), Code::new(503));
        assert_eq!(err.message(), "unavailable");
        assert_eq!(stack_depth(&err), 1);
    }

    #[test]
    fn self_wrap_adds_no_stack() {
        let err = wrap(plain(), "first");
        let err = wrap(err, "second");
        let err = wrap(err, "third");

        assert_eq!(stack_depth(&err), 1);
        assert_eq!(err.to_string(), "third: second: first: connection reset");
    }

    #[test]
    fn repeated_self_with_stack_is_noop() {
        let err = with_stack(plain());
        let before = err.get_error().map(Trace::depth);
        let err = with_stack(with_stack(err));

        assert_eq!(err.get_error().map(Trace::depth), before);
        assert_eq!(err.to_string(), "connection reset");
    }

    #[test]
    fn annotate_without_trace_seeds_from_classification() {
        let err = ClassifiedError::fail(403, "forbidden").annotate("check acl");

        assert_eq!(err.to_string(), "check acl: <Error 403>: forbidden");
        assert_eq!(stack_depth(&err), 0);
        assert_eq!(err.code(), Code::new(403));
    }

    #[test]
    fn nested_classification_is_folded() {
        let inner = ClassifiedError::fail(404, "not found");
        let outer = ClassifiedError::fail(502, "bad gateway").wrap(inner, "context");

        let extended = format!("{:#}", outer);
        assert!(extended.contains("<Error 404>: not found"));
        assert!(extended.contains("context"));
        assert_eq!(outer.code(), Code::new(502));
        assert_eq!(outer.message(), "bad gateway");
        assert_eq!(outer.to_string(), "context: <Error 404>: not found");
    }

    #[test]
    fn nested_traced_classification_keeps_inner_trace() {
        let inner = ClassifiedError::fail(404, "not found").wrap(plain(), "query row");
        let outer = ClassifiedError::fail(500, "lookup failed").wrap(inner, "load user");

        assert_eq!(
            outer.to_string(),
            "load user: <Error 404>: not found: query row: connection reset"
        );
        assert_eq!(stack_depth(&outer), 2);
        assert_eq!(outer.code(), Code::new(500));
        assert_eq!(outer.cause().to_string(), "connection reset");
    }

    #[test]
    fn with_stack_folds_debug_context() {
        let inner = ClassifiedError::fail(409, "conflict").wrap(plain(), "insert");
        let outer = ClassifiedError::fail(500, "save failed").with_stack(inner);

        let annotations: Vec<_> = outer.get_error().unwrap().annotations().collect();
        assert_eq!(annotations, vec!["insert", "<Error 409>: conflict"]);
        assert_eq!(outer.message(), "save failed");
    }

    #[test]
    fn boxed_classified_error_is_recognised() {
        let inner: Box<dyn Error + Send + Sync> =
            Box::new(ClassifiedError::fail(401, "unauthorized"));
        let outer = ClassifiedError::fail(500, "internal").wrap(inner, "authenticate");

        assert!(format!("{:#}", outer).contains("<Error 401>: unauthorized"));
        let folded = outer.cause().downcast_ref::<Classification>().unwrap();
        assert_eq!(folded.code(), Code::new(401));
    }

    #[test]
    fn rewrapping_keeps_previous_trace() {
        let err = ClassifiedError::fail(500, "x")
            .wrap(plain(), "first attempt")
            .wrap(io::Error::new(io::ErrorKind::Other, "timeout"), "second attempt");

        assert_eq!(
            err.to_string(),
            "second attempt: <Superseded: first attempt: connection reset>: timeout"
        );
        assert_eq!(stack_depth(&err), 2);
        assert_eq!(err.cause().to_string(), "timeout");

        let previous = err.get_error().unwrap().superseded().next().unwrap();
        assert!(previous.origin().downcast_ref::<io::Error>().is_some());
        assert_eq!(previous.origin().to_string(), "connection reset");
        assert!(format!("{:#}", err).contains("<Superseded>\nconnection reset\nfirst attempt"));
    }

    #[test]
    fn folding_annotated_classification_prints_it_once() {
        let inner = ClassifiedError::fail(404, "not found").annotate("a");
        let outer = ClassifiedError::fail(500, "y").wrap(inner, "b");

        assert_eq!(outer.to_string(), "b: a: <Error 404>: not found");
        assert_eq!(format!("{:#}", outer).matches("<Error 404>").count(), 1);
        assert_eq!(outer.code(), Code::new(500));
    }

    #[test]
    fn folding_different_classification_over_seeded_trace_keeps_both() {
        let inner = ClassifiedError::fail(404, "not found")
            .annotate("a")
            .with_stack(ClassifiedError::fail(409, "conflict"));
        let outer = ClassifiedError::fail(500, "y").wrap(inner, "b");

        let text = outer.to_string();
        assert_eq!(text, "b: <Superseded: a: <Error 404>: not found>: <Error 409>: conflict");
        assert_eq!(text.matches("<Error 404>").count(), 1);
        assert_eq!(text.matches("<Error 409>").count(), 1);
    }

    #[test]
    fn unclassified_inner_adds_no_debug_context() {
        let inner = wrap(plain(), "read");
        let outer = ClassifiedError::fail(500, "internal").wrap(inner, "handle request");

        assert_eq!(outer.to_string(), "handle request: read: connection reset");
        assert_eq!(stack_depth(&outer), 2);
    }

    #[test]
    fn cause_of_untraced_error_is_itself() {
        let err = ClassifiedError::fail(400, "bad request");
        assert!(err.cause().downcast_ref::<ClassifiedError>().is_some());
    }

    #[test]
    fn cause_stops_at_foreign_errors() {
        let err = wrap(plain(), "ctx");
        let root = cause(&err);
        assert!(root.downcast_ref::<io::Error>().is_some());
    }

    #[test]
    fn source_points_at_origin() {
        let err = wrap(plain(), "ctx");
        assert_eq!(err.source().unwrap().to_string(), "connection reset");
        assert!(ClassifiedError::fail(1, "x").source().is_none());
    }

    #[test]
    fn render_modes() {
        let err = wrap(plain(), "say \"hi\"");

        assert_eq!(
            err.render(RenderMode::Plain).to_string(),
            "say \"hi\": connection reset"
        );
        assert_eq!(
            err.render(RenderMode::Quoted).to_string(),
            "\"say \\\"hi\\\": connection reset\""
        );
        let extended = err.render(RenderMode::Extended).to_string();
        assert!(extended.starts_with("connection reset\nsay \"hi\""));
        assert!(extended.ends_with('\n'));

        let fresh = ClassifiedError::fail(1, "x");
        assert_eq!(fresh.render(RenderMode::Quoted).to_string(), "\"\"");
        assert_eq!(fresh.render(RenderMode::Extended).to_string(), "");
    }

    #[test]
    fn classification_or_prefers_own_values() {
        let err = ClassifiedError::fail(422, "invalid input").wrap(plain(), "parse");
        assert_eq!(
            err.classification_or(Code::INTERNAL, "internal error"),
            (Code::new(422), "invalid input")
        );
    }

    #[test]
    fn into_trace_returns_raw_chain() {
        let trace = wrap(plain(), "ctx").into_trace().unwrap();
        assert_eq!(trace.to_string(), "ctx: connection reset");
        assert!(ClassifiedError::unclassified().into_trace().is_none());
    }

    #[test]
    fn error_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync + 'static>() {}
        assert_send_sync::<ClassifiedError>();
        assert_send_sync::<Trace>();
    }
}

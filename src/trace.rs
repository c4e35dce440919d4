//! Stack-capturing trace primitive.
//!
//! A [`Trace`] is an origin error plus an ordered list of layers, innermost
//! first. A layer is either a message annotation or a stack snapshot.
//!
//! Three operations build traces:
//!
//! - [`Trace::wrap`]: message layer, then a stack layer on top
//! - [`Trace::with_message`]: message layer only
//! - [`Trace::with_stack`]: stack layer only
//!
//! Passing a trace (or a boxed one) back into any of them extends that trace
//! instead of nesting a second one inside it, so a chain built from many call
//! sites stays a single flat structure with one origin.
//!
//! A trace that is replaced by another one is kept whole as a
//! [`Layer::Superseded`] layer directly above the new origin, stacks and
//! origin included.
//!
//! # Rendering
//!
//! - `{}` writes the annotations outermost first, then the origin, joined by
//!   `": "`. Stack layers contribute nothing. A superseded trace is written
//!   as `<Superseded: {its plain text}>`.
//! - `{:#}` writes the origin, then every layer innermost first, including the
//!   captured stack frames.
//!
//! # Stack capture
//!
//! Stacks are captured with [`Backtrace::force_capture`]. With the
//! `env_backtrace` feature they are captured with [`Backtrace::capture`]
//! instead, which honours `RUST_BACKTRACE` / `RUST_LIB_BACKTRACE`.
//!
//! # Example
//!
//! ```rust
//! use classified_errors::Trace;
//! use std::io;
//!
//! let io_err = io::Error::new(io::ErrorKind::NotFound, "config.toml missing");
//! let trace = Trace::wrap(io_err, "load settings");
//! let trace = Trace::with_message(trace, "start service");
//!
//! assert_eq!(trace.to_string(), "start service: load settings: config.toml missing");
//! assert_eq!(trace.stack_depth(), 1);
//! assert_eq!(trace.origin().to_string(), "config.toml missing");
//! ```

use smallvec::SmallVec;
use std::backtrace::{Backtrace, BacktraceStatus};
use std::borrow::Cow;
use std::error::Error;
use std::fmt;
use zeroize::Zeroize;

/// Boxed error accepted as a trace origin.
pub type BoxError = Box<dyn Error + Send + Sync + 'static>;

// ============================================================================
// Annotation (zeroized text)
// ============================================================================

/// Annotation text with zeroization of owned data.
///
/// Borrowed values are assumed static and are not zeroized.
pub struct Annotation {
    text: Cow<'static, str>,
}

impl Annotation {
    #[inline]
    pub(crate) fn new(text: impl Into<Cow<'static, str>>) -> Self {
        Self { text: text.into() }
    }

    /// The annotation text.
    #[inline]
    pub fn as_str(&self) -> &str {
        self.text.as_ref()
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

impl Zeroize for Annotation {
    fn zeroize(&mut self) {
        if let Cow::Owned(ref mut s) = self.text {
            s.zeroize();
        }
    }
}

impl Drop for Annotation {
    fn drop(&mut self) {
        self.zeroize();
    }
}

impl fmt::Debug for Annotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_str(), f)
    }
}

impl fmt::Display for Annotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Layers
// ============================================================================

/// One annotation layer of a [`Trace`].
#[derive(Debug)]
pub enum Layer {
    /// Message-only annotation.
    Message(Annotation),
    /// Stack snapshot taken where the layer was added.
    Stack(Backtrace),
    /// An earlier trace replaced by this one.
    Superseded(Box<Trace>),
}

impl Layer {
    #[inline]
    fn capture() -> Self {
        #[cfg(feature = "env_backtrace")]
        let stack = Backtrace::capture();
        #[cfg(not(feature = "env_backtrace"))]
        let stack = Backtrace::force_capture();
        Self::Stack(stack)
    }
}

// ============================================================================
// Trace
// ============================================================================

/// Origin error plus accumulated annotation layers.
///
/// # Capacity Choice
///
/// Layers live in a `SmallVec<[Layer; 4]>`: a wrap adds two layers and most
/// errors cross one or two annotation sites, so typical traces stay inline.
pub struct Trace {
    origin: BoxError,
    layers: SmallVec<[Layer; 4]>,
}

impl Trace {
    /// Start a trace with no layers.
    ///
    /// A boxed `Trace` passed here is unboxed and returned as is.
    pub fn new(err: impl Into<BoxError>) -> Self {
        let err: BoxError = err.into();
        match err.downcast::<Trace>() {
            Ok(trace) => *trace,
            Err(origin) => Self {
                origin,
                layers: SmallVec::new(),
            },
        }
    }

    /// Annotate `err` with a message and capture a stack snapshot.
    pub fn wrap(err: impl Into<BoxError>, message: impl Into<Cow<'static, str>>) -> Self {
        let mut trace = Self::new(err);
        trace.push_message(message);
        trace.push_stack();
        trace
    }

    /// Annotate `err` with a message, without capturing a stack.
    pub fn with_message(err: impl Into<BoxError>, message: impl Into<Cow<'static, str>>) -> Self {
        let mut trace = Self::new(err);
        trace.push_message(message);
        trace
    }

    /// Capture a stack snapshot over `err`, without a message.
    pub fn with_stack(err: impl Into<BoxError>) -> Self {
        let mut trace = Self::new(err);
        trace.push_stack();
        trace
    }

    /// Add a message layer in place.
    #[inline]
    pub fn push_message(&mut self, message: impl Into<Cow<'static, str>>) {
        self.layers.push(Layer::Message(Annotation::new(message)));
    }

    /// Add a stack layer in place.
    #[inline]
    pub fn push_stack(&mut self) {
        self.layers.push(Layer::capture());
    }

    /// Keep `previous` as the innermost layer, directly above the origin.
    pub fn supersede(&mut self, previous: Trace) {
        self.layers.insert(0, Layer::Superseded(Box::new(previous)));
    }

    /// The deepest error of the chain.
    ///
    /// This is the "cause" capability: [`cause`](crate::cause) descends
    /// through it.
    #[inline]
    pub fn origin(&self) -> &(dyn Error + Send + Sync + 'static) {
        self.origin.as_ref()
    }

    /// Take the origin, discarding the layers.
    #[inline]
    pub fn into_origin(self) -> BoxError {
        self.origin
    }

    /// All layers, innermost first.
    #[inline]
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Message annotations, innermost first.
    pub fn annotations(&self) -> impl DoubleEndedIterator<Item = &str> {
        self.layers.iter().filter_map(|layer| match layer {
            Layer::Message(a) => Some(a.as_str()),
            _ => None,
        })
    }

    /// Stack snapshots of this trace, innermost first.
    ///
    /// Stacks of superseded traces are reached through [`Trace::superseded`].
    pub fn stacks(&self) -> impl DoubleEndedIterator<Item = &Backtrace> {
        self.layers.iter().filter_map(|layer| match layer {
            Layer::Stack(s) => Some(s),
            _ => None,
        })
    }

    /// Traces replaced by this one, innermost first.
    pub fn superseded(&self) -> impl DoubleEndedIterator<Item = &Trace> {
        self.layers.iter().filter_map(|layer| match layer {
            Layer::Superseded(t) => Some(t.as_ref()),
            _ => None,
        })
    }

    /// Number of stack layers, counting those of superseded traces.
    pub fn stack_depth(&self) -> usize {
        self.stacks().count() + self.superseded().map(Trace::stack_depth).sum::<usize>()
    }

    /// Total number of layers.
    #[inline]
    pub fn depth(&self) -> usize {
        self.layers.len()
    }

    fn fmt_plain(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for layer in self.layers.iter().rev() {
            match layer {
                Layer::Message(a) => write!(f, "{}: ", a)?,
                Layer::Superseded(t) => write!(f, "<Superseded: {}>: ", t)?,
                Layer::Stack(_) => {}
            }
        }
        write!(f, "{}", self.origin)
    }

    fn fmt_extended(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.origin)?;
        for layer in &self.layers {
            match layer {
                Layer::Message(a) => write!(f, "\n{}", a)?,
                Layer::Stack(s) if s.status() == BacktraceStatus::Captured => {
                    write!(f, "\n{}", s)?
                }
                Layer::Stack(_) => {}
                Layer::Superseded(t) => write!(f, "\n<Superseded>\n{:#}", t)?,
            }
        }
        Ok(())
    }
}

impl fmt::Display for Trace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            self.fmt_extended(f)
        } else {
            self.fmt_plain(f)
        }
    }
}

impl fmt::Debug for Trace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Trace")
            .field("origin", &self.origin.to_string())
            .field("annotations", &self.annotations().collect::<SmallVec<[&str; 4]>>())
            .field("stack_depth", &self.stack_depth())
            .field("superseded", &self.superseded().count())
            .finish()
    }
}

impl Error for Trace {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(self.origin.as_ref() as &(dyn Error + 'static))
    }
}

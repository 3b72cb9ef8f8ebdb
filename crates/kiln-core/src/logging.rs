//! Logging shims.
//!
//! With the `tracing` feature these are the real `tracing` macros. Without
//! it they expand to nothing, so call sites need no `cfg` guards.

#[cfg(feature = "tracing")]
pub(crate) use tracing::trace;

#[cfg(not(feature = "tracing"))]
macro_rules! trace {
    ($($arg:tt)*) => {};
}

#[cfg(not(feature = "tracing"))]
pub(crate) use trace;

#![forbid(unsafe_code)]

//! Structured logging shims.
//!
//! With the `tracing` feature enabled these are the `tracing` macros. Without
//! it they expand to nothing, so call sites never need their own `cfg`.
//!
//! Event names follow the `component.action` scheme (`registry.gc`,
//! `value.readonly`, `node.frozen`, ...) and are passed as the `message`
//! field.

#[cfg(feature = "tracing")]
pub(crate) use tracing::{debug, trace, warn};

#[cfg(not(feature = "tracing"))]
macro_rules! trace_event {
    ($($arg:tt)*) => {};
}

#[cfg(not(feature = "tracing"))]
macro_rules! debug_event {
    ($($arg:tt)*) => {};
}

#[cfg(not(feature = "tracing"))]
macro_rules! warn_event {
    ($($arg:tt)*) => {};
}

// A bare `use warn;` is ambiguous with the built-in `#[warn]` attribute.
#[cfg(not(feature = "tracing"))]
pub(crate) use debug_event as debug;
#[cfg(not(feature = "tracing"))]
pub(crate) use trace_event as trace;
#[cfg(not(feature = "tracing"))]
pub(crate) use warn_event as warn;

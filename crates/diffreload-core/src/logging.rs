#![forbid(unsafe_code)]

//! Logging shim.
//!
//! With the `tracing` feature the macros forward to `tracing`; without it they
//! expand to nothing, so call sites need no `cfg` of their own.

#[cfg(feature = "tracing")]
pub(crate) use tracing::{debug, trace};

#[cfg(not(feature = "tracing"))]
macro_rules! debug {
    ($($arg:tt)*) => {};
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace {
    ($($arg:tt)*) => {};
}

#[cfg(not(feature = "tracing"))]
pub(crate) use {debug, trace};

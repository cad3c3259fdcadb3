//! Logging helpers.
//!
//! With the `tracing` feature enabled these forward to the `tracing` crate. Without it
//! they expand to nothing, so tree operations carry no logging cost.

#[cfg(feature = "tracing")]
macro_rules! trace_log {
    ($($arg:tt)*) => {
        tracing::trace!($($arg)*)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_log {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "tracing")]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        tracing::debug!($($arg)*)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! debug_log {
    ($($arg:tt)*) => {};
}

/// Reports a broken structural invariant. This is never a recoverable condition: the
/// arena graph is inconsistent, so the error is logged and the thread panics.
macro_rules! invariant_violation {
    ($($arg:tt)*) => {{
        #[cfg(feature = "tracing")]
        tracing::error!($($arg)*);

        panic!("rtree invariant violated: {}", format_args!($($arg)*))
    }};
}

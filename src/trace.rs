//! Diagnostic output for the Queues
//!
//! Enable with the `tracing` Feature. Without it all the macros used
//! internally expand to nothing, so there is no overhead at all.
//!
//! Only cold paths emit anything (construction, rejected construction and
//! dropping a Queue that still contains Elements), the enqueue and dequeue
//! operations never log.

/// Installs a global `tracing` subscriber that writes to stderr, filtered
/// through `RUST_LOG` (defaults to `seqqueue=trace`)
///
/// Calling this more than once is harmless, only the first call installs the
/// subscriber. Does nothing if the `tracing` Feature is not enabled.
#[cfg(feature = "tracing")]
pub fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("seqqueue=trace"));

    let _ = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_thread_names(true),
        )
        .with(filter)
        .try_init();
}

/// Installs a global `tracing` subscriber
///
/// Does nothing, because the `tracing` Feature is not enabled.
#[cfg(not(feature = "tracing"))]
pub const fn init_tracing() {}

#[cfg(feature = "tracing")]
pub(crate) use tracing::{debug, trace, warn};

#[cfg(not(feature = "tracing"))]
macro_rules! debug_noop {
    ($($arg:tt)*) => {};
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_noop {
    ($($arg:tt)*) => {};
}

#[cfg(not(feature = "tracing"))]
macro_rules! warn_noop {
    ($($arg:tt)*) => {};
}

#[cfg(not(feature = "tracing"))]
pub(crate) use {debug_noop as debug, trace_noop as trace, warn_noop as warn};

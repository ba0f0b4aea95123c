//! Optional instrumentation for the unify/reify engine and the dispatcher.
//!
//! With the `tracing` feature the macros below are the `tracing` crate's own.
//! Without it they expand to nothing, so call sites cost nothing and their
//! arguments are never evaluated.
//!
//! ```rust,ignore
//! #[cfg(feature = "tracing")]
//! let _span = debug_span!("unify", bindings = s.len()).entered();
//! #[cfg(feature = "tracing")]
//! trace!(left = ?shape, "unify_mismatch");
//! ```
//!
//! Events emitted by the crate:
//!
//! | target            | level | message                                    |
//! |-------------------|-------|--------------------------------------------|
//! | `unification::dispatch`    | debug | `register`, handler installed      |
//! | `unification::unify`       | debug | span per top-level `unify`         |
//! | `unification::unify`       | trace | `unify_mismatch`, `unify_done`     |
//! | `unification::contracting` | trace | `chain_cycle_broken`               |
//! | `unification::trampoline`  | trace | `trampoline_done`, `trampoline_halt` |
//! | `unification::matching`    | debug | `signature_added`, `no_match`, `ordering_cycle` |
//! | `unification::object`      | debug | `record_rebuild_failed`            |

#[cfg(feature = "tracing")]
pub use tracing::{debug, debug_span, info, trace, trace_span, warn, Level, Span};

#[cfg(not(feature = "tracing"))]
mod noop {
    /// Stand-in span; entering it yields a guard that does nothing.
    pub struct Span;

    impl Span {
        pub fn none() -> Self {
            Span
        }

        pub fn entered(self) -> SpanGuard {
            SpanGuard
        }
    }

    pub struct SpanGuard;

    #[derive(Clone, Copy, Debug)]
    pub struct Level;

    impl Level {
        pub const TRACE: Level = Level;
        pub const DEBUG: Level = Level;
        pub const INFO: Level = Level;
    }

    #[macro_export]
    macro_rules! trace {
        ($($tt:tt)*) => {};
    }

    #[macro_export]
    macro_rules! debug {
        ($($tt:tt)*) => {};
    }

    #[macro_export]
    macro_rules! info {
        ($($tt:tt)*) => {};
    }

    #[macro_export]
    macro_rules! warn {
        ($($tt:tt)*) => {};
    }

    #[macro_export]
    macro_rules! trace_span {
        ($($tt:tt)*) => {
            $crate::trace::Span::none()
        };
    }

    #[macro_export]
    macro_rules! debug_span {
        ($($tt:tt)*) => {
            $crate::trace::Span::none()
        };
    }

    pub use crate::{debug, debug_span, info, trace, trace_span, warn};
}

#[cfg(not(feature = "tracing"))]
pub use noop::*;

/// Install a stderr `fmt` subscriber filtered by `RUST_LOG` (default `info`).
///
/// Safe to call more than once; later calls are ignored.
#[cfg(feature = "tracing")]
pub fn init_subscriber() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_level(true)
                .with_ansi(false),
        )
        .with(filter)
        .try_init()
        .ok();
}

#[cfg(not(feature = "tracing"))]
pub fn init_subscriber() {}

#[cfg(test)]
#[path = "tests/trace.rs"]
mod tests;

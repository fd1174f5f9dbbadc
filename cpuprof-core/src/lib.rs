#![warn(missing_docs)]
//! cpuprof Core - Instrumentation Runtime
//!
//! Building blocks shared by every demonstration workload:
//! - High-precision timing (RDTSCP / CNTVCT_EL0 with Instant fallback)
//! - `ProfileSession` for named measurements inside a scratch directory
//! - NVTX-style ranges that light up the nsys timeline when linked

mod measure;
mod nvtx;
mod session;

/// Whether this platform provides hardware cycle counters (x86_64 RDTSCP or AArch64 CNTVCT_EL0).
pub use measure::HAS_CYCLE_COUNTER;
pub use measure::{ScopedTimer, Timer, format_seconds, time};
pub use nvtx::{
    Color, Domain, Range, annotate, depth, is_available, mark, profile_function, range_pop,
    range_push,
};
pub use session::{Measurement, ProfileSession};

use thiserror::Error;

/// Errors raised by the instrumentation runtime
#[derive(Debug, Error)]
pub enum CoreError {
    /// The scratch directory for a session could not be created
    #[error("Failed to create scratch directory: {0}")]
    ScratchDir(#[source] std::io::Error),

    /// Generic I/O failure inside a session
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#![warn(missing_docs)]
//! cpuprof Workloads - Demonstration Programs
//!
//! Six self-contained programs meant to be observed by a CPU sampling
//! profiler. Each prints its own timings and returns when done:
//!
//! | id | module |
//! |----|--------|
//! | `1_basic_cpu` | [`cpu`] |
//! | `2_matrix_ops` | [`matrix`] |
//! | `3_parallel` | [`parallel`] |
//! | `4_nvtx` | [`annotated`] |
//! | `5_io_bound` | [`io`] |
//! | `6_memory` | [`memory`] |

pub mod annotated;
mod catalog;
pub mod cpu;
pub mod io;
pub mod matrix;
pub mod memory;
pub mod parallel;

pub use catalog::{DEMOS, Demo, Scale, find};

use thiserror::Error;

/// Errors raised by workloads
#[derive(Debug, Error)]
pub enum WorkloadError {
    /// Operand shapes are incompatible
    #[error("Incompatible matrix dimensions: {left:?} vs {right:?}")]
    DimensionMismatch {
        /// Left operand `(rows, cols)`
        left: (usize, usize),
        /// Right operand `(rows, cols)`
        right: (usize, usize),
    },

    /// Filesystem failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encode/decode failure
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// An async task panicked or was cancelled
    #[error("Task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    /// A worker thread panicked
    #[error("Worker thread panicked")]
    ThreadPanicked,

    /// Thread pool construction failed
    #[error("Thread pool error: {0}")]
    Pool(String),

    /// Session setup failed
    #[error(transparent)]
    Core(#[from] cpuprof_core::CoreError),

    /// No demo matches the requested id
    #[error("Unknown demo: {0}")]
    UnknownDemo(String),
}

/// Result alias for workload operations
pub type Result<T> = std::result::Result<T, WorkloadError>;

pub(crate) fn banner(title: &str) {
    println!("{}", title);
    println!("{}", "=".repeat(60));
}

pub(crate) fn footer() {
    println!("\n{}", "=".repeat(60));
}

#![warn(missing_docs)]
//! # cpuprof
//!
//! CPU profiling demonstrations and report tooling around NVIDIA Nsight Systems.
//!
//! - **Workloads**: six builtin programs (CPU, matrix, parallel, annotated, I/O,
//!   memory) with recognisable hotspots for a sampling profiler
//! - **Annotations**: NVTX-style ranges and marks that show up on the nsys timeline
//!   when built with the `nvtx` feature, no-ops otherwise
//! - **Runner**: discovers Python scripts and native binaries next to the builtins
//!   and launches any of them under `nsys profile`
//! - **Reports**: scrapes `nsys stats` output into speedup tables, SVG charts and
//!   HTML/JSON/Markdown reports
//!
//! ## Quick Start
//!
//! ```ignore
//! use cpuprof::prelude::*;
//!
//! let mut session = ProfileSession::new()?;
//! let sum = annotate("Accumulate", Color::GREEN, || (0..1_000u64).sum::<u64>());
//! session.measure("sieve", || cpuprof::workloads::cpu::prime_sieve(100_000));
//! ```
//!
//! ## Command Line
//!
//! ```text
//! cpuprof list                  # everything runnable
//! cpuprof run 2 --profile       # nsys profile + saved stats
//! cpuprof compare               # configured pairs -> Markdown + charts
//! cpuprof report --format html  # every profile -> charts + report
//! ```

// Re-export core types
pub use cpuprof_core::{
    Color, CoreError, Domain, Measurement, ProfileSession, Range, ScopedTimer, Timer, annotate,
    format_seconds, mark, profile_function, range_pop, range_push, time,
};

// Re-export report types
pub use cpuprof_report::{
    Comparison, ComparisonLabels, ComparisonPair, GroupedComparison, OutputFormat, ProfileStats,
    ReportDocument, ReportError, SpeedupSummary, compare_implementations, compare_stats,
    group_profiles, parse_stats,
};

/// Builtin demonstration workloads
pub use cpuprof_workloads as workloads;

/// Report generation (stats parsing, charts, HTML/JSON/Markdown)
pub use cpuprof_report as report;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        Color, Domain, ProfileSession, Range, ScopedTimer, Timer, annotate, mark,
        profile_function,
    };
    pub use cpuprof_workloads::Scale;
}

/// Run the cpuprof CLI.
///
/// ```ignore
/// fn main() -> anyhow::Result<()> {
///     cpuprof::run()
/// }
/// ```
pub use cpuprof_cli::run;

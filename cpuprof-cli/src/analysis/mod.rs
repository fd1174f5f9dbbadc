//! Result Analysis
//!
//! Turns saved profiles into comparisons, charts and reports.
//!
//! ## Pipeline Overview
//!
//! ```text
//! results/*.nsys-rep, results/*_stats.txt
//!       │
//!       ▼
//! ┌─────────────┐
//! │   compare   │  Configured baseline/candidate pairs, Markdown + charts
//! └─────────────┘
//! ┌─────────────┐
//! │   report    │  Every profile: stats, charts, HTML/JSON/Markdown
//! └──────┬──────┘
//!        │
//!        ▼
//! ┌─────────────┐
//! │ formatting  │  Terminal output
//! └─────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`compare`] - Explicit pair comparison (`cpuprof compare`)
//! - [`report`] - Full report generation (`cpuprof report`)
//! - [`formatting`] - Human-readable output formatting
//! - [`metadata`] - Host and tool metadata for `check` and reports

mod compare;
mod formatting;
mod metadata;
mod report;

pub use compare::{CompareOutcome, compare_results};
pub use formatting::{format_catalog, format_speedups};
pub use metadata::{build_report_meta, describe_host, interpreter_version, system_info};
pub use report::{ReportOutcome, ReportRequest, extract_stats, find_profiles, generate_report};

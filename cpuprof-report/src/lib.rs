#![warn(missing_docs)]
//! cpuprof Report - Profiler Statistics and Visualization
//!
//! Turns `nsys stats` console output into something readable:
//! - Best-effort scraping of durations, sample counts and hot functions
//! - Baseline vs candidate speedups (explicit pairs or prefix grouping)
//! - Markdown comparison report
//! - SVG charts (plotters)
//! - Single-file HTML report
//! - JSON (machine-readable)

pub mod charts;
mod comparison;
mod html;
mod json;
mod markdown;
mod report;
mod stats;
mod summary;

pub use comparison::{
    Comparison, ComparisonLabels, ComparisonPair, GroupedComparison, compare_implementations,
    compare_stats, default_pairs, group_profiles,
};
pub use html::{escape_html, generate_html_report, write_html_report};
pub use json::{generate_json_report, write_json_report};
pub use markdown::{generate_comparison_report, generate_profile_summary};
pub use report::{ReportDocument, ReportMeta, SystemInfo};
pub use stats::{HotFunction, ProfileStats, parse_stats, stats_from_file};
pub use summary::SpeedupSummary;

use thiserror::Error;

/// Errors raised while building reports
#[derive(Debug, Error)]
pub enum ReportError {
    /// Reading stats or writing report files failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A chart could not be rendered
    #[error("Chart rendering failed for {chart}: {message}")]
    Chart {
        /// Chart file name
        chart: String,
        /// Backend message
        message: String,
    },
}

/// Result alias for report operations
pub type Result<T> = std::result::Result<T, ReportError>;

/// Output format selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Single-file HTML page with charts
    #[default]
    Html,
    /// JSON document
    Json,
    /// Markdown summary
    Markdown,
}

impl OutputFormat {
    /// File extension used for this format
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Html => "html",
            OutputFormat::Json => "json",
            OutputFormat::Markdown => "md",
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "html" => Ok(OutputFormat::Html),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            other => Err(format!("Unknown output format: {}", other)),
        }
    }
}

/// Format an integer with `,` thousands separators (`1234567` -> `1,234,567`)
pub fn format_count(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1000), "1,000");
        assert_eq!(format_count(1234567), "1,234,567");
    }

    #[test]
    fn test_output_format_parse() {
        assert_eq!("HTML".parse::<OutputFormat>(), Ok(OutputFormat::Html));
        assert_eq!("md".parse::<OutputFormat>(), Ok(OutputFormat::Markdown));
        assert_eq!("json".parse::<OutputFormat>(), Ok(OutputFormat::Json));
        assert!("csv".parse::<OutputFormat>().is_err());
    }
}

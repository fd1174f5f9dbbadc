//! Report Data Structures

use crate::comparison::{Comparison, GroupedComparison};
use crate::stats::ProfileStats;
use crate::summary::SpeedupSummary;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Complete profiling report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportDocument {
    pub meta: ReportMeta,
    pub profiles: Vec<ProfileStats>,
    /// Prefix-grouped pairs (performance matrix rows)
    pub comparisons: Vec<GroupedComparison>,
    /// Explicit pairs, when the report was built from `<name>_stats.txt` files
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pairs: Vec<Comparison>,
    pub summary: Option<SpeedupSummary>,
}

impl ReportDocument {
    /// Assemble a document and compute its speedup summary
    pub fn new(
        meta: ReportMeta,
        profiles: Vec<ProfileStats>,
        comparisons: Vec<GroupedComparison>,
    ) -> Self {
        let speedups: Vec<f64> = comparisons.iter().map(|c| c.speedup).collect();
        Self {
            meta,
            profiles,
            summary: SpeedupSummary::from_speedups(&speedups),
            comparisons,
            pairs: Vec::new(),
        }
    }
}

/// Report metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMeta {
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub git_commit: Option<String>,
    pub system: SystemInfo,
    /// First line of `nsys --version`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profiler: Option<String>,
    /// Version of the interpreter that ran script examples
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interpreter: Option<String>,
}

/// System information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemInfo {
    pub os: String,
    pub arch: String,
    pub cpu: String,
    pub cpu_cores: u32,
    pub memory_gb: f64,
}

//! Speedup Summary
//!
//! Aggregates a set of speedup factors into the numbers shown at the top of
//! every comparison report.

use serde::{Deserialize, Serialize};

/// Aggregate over a set of speedups
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeedupSummary {
    /// Number of comparisons
    pub count: usize,
    /// Arithmetic mean
    pub mean: f64,
    /// Median
    pub median: f64,
    /// Smallest speedup
    pub min: f64,
    /// Largest speedup
    pub max: f64,
}

impl SpeedupSummary {
    /// Summarize `speedups`; `None` when empty
    pub fn from_speedups(speedups: &[f64]) -> Option<Self> {
        let sorted = sorted(speedups);
        let (&min, &max) = (sorted.first()?, sorted.last()?);
        let count = sorted.len();

        Some(Self {
            count,
            mean: sorted.iter().sum::<f64>() / count as f64,
            median: median_of_sorted(&sorted),
            min,
            max,
        })
    }
}

fn sorted(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted
}

/// Middle value, or the mean of the two middle values for an even count.
/// `sorted` must be ascending and non-empty.
fn median_of_sorted(sorted: &[f64]) -> f64 {
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

//! Baseline vs Candidate Comparison
//!
//! Two ways of pairing profiles:
//! - explicit [`ComparisonPair`]s read from `<name>_stats.txt` files
//! - [`group_profiles`], which pairs profiles sharing a key after their
//!   baseline/candidate prefix is stripped (`py_1_basic_cpu` and
//!   `cpp_1_basic_cpu` both land in group `1`)
//!
//! Speedup is always `baseline_duration / candidate_duration`, so values
//! above 1.0 mean the candidate is faster.

use crate::stats::{ProfileStats, stats_from_file};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Prefixes and display names for the two sides of a comparison
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonLabels {
    /// Name prefix of baseline profiles
    pub baseline_prefix: String,
    /// Name prefix of candidate profiles
    pub candidate_prefix: String,
    /// Display name of the baseline side
    pub baseline_label: String,
    /// Display name of the candidate side
    pub candidate_label: String,
}

impl Default for ComparisonLabels {
    fn default() -> Self {
        Self {
            baseline_prefix: "py_".to_string(),
            candidate_prefix: "cpp_".to_string(),
            baseline_label: "Python".to_string(),
            candidate_label: "C++".to_string(),
        }
    }
}

impl ComparisonLabels {
    /// Whether `name` belongs to the baseline side
    pub fn is_baseline(&self, name: &str) -> bool {
        name.starts_with(&self.baseline_prefix)
    }

    /// Whether `name` belongs to the candidate side
    pub fn is_candidate(&self, name: &str) -> bool {
        name.starts_with(&self.candidate_prefix)
    }
}

/// Two profiles that implement the same example
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonPair {
    /// Baseline profile name
    pub baseline: String,
    /// Candidate profile name
    pub candidate: String,
    /// Human-readable title
    pub title: String,
}

impl ComparisonPair {
    /// Build a pair
    pub fn new(
        baseline: impl Into<String>,
        candidate: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        Self {
            baseline: baseline.into(),
            candidate: candidate.into(),
            title: title.into(),
        }
    }
}

/// The example pairs compared by default
pub fn default_pairs() -> Vec<ComparisonPair> {
    vec![
        ComparisonPair::new("py_1_basic_cpu", "cpp_1_basic_cpu", "Basic CPU Profiling"),
        ComparisonPair::new("py_2_matrix_ops", "cpp_2_matrix_ops", "Matrix Operations"),
        ComparisonPair::new(
            "py_3_multiprocessing",
            "cpp_3_multithreading",
            "Parallel Processing",
        ),
        ComparisonPair::new("py_4_nvtx", "cpp_4_nvtx", "NVTX Annotations"),
        ComparisonPair::new("py_5_io_bound", "cpp_5_memory", "Memory/IO Intensive"),
    ]
}

/// One comparable pair with its stats
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    /// Pair title
    pub title: String,
    /// Baseline stats (duration guaranteed non-zero)
    pub baseline: ProfileStats,
    /// Candidate stats (duration guaranteed non-zero)
    pub candidate: ProfileStats,
    /// `baseline / candidate`
    pub speedup: f64,
}

impl Comparison {
    /// Baseline duration in seconds
    pub fn baseline_secs(&self) -> f64 {
        self.baseline.duration_secs.unwrap_or(0.0)
    }

    /// Candidate duration in seconds
    pub fn candidate_secs(&self) -> f64 {
        self.candidate.duration_secs.unwrap_or(0.0)
    }
}

/// Pair two stats; `None` unless both durations are present and non-zero
pub fn compare_stats(
    title: impl Into<String>,
    baseline: ProfileStats,
    candidate: ProfileStats,
) -> Option<Comparison> {
    let b = baseline.usable_duration()?;
    let c = candidate.usable_duration()?;
    Some(Comparison {
        title: title.into(),
        speedup: b / c,
        baseline,
        candidate,
    })
}

/// Compare every pair whose `<name>_stats.txt` files both carry a duration.
///
/// Output keeps the order of `pairs`; incomplete pairs are skipped.
pub fn compare_implementations(
    results_dir: &Path,
    pairs: &[ComparisonPair],
) -> crate::Result<Vec<Comparison>> {
    let mut comparisons = Vec::new();

    for pair in pairs {
        let baseline = stats_from_file(results_dir.join(format!("{}_stats.txt", pair.baseline)))?;
        let candidate =
            stats_from_file(results_dir.join(format!("{}_stats.txt", pair.candidate)))?;

        match compare_stats(&pair.title, baseline, candidate) {
            Some(cmp) => comparisons.push(cmp),
            None => tracing::debug!(
                "Skipping {}: missing duration for {} or {}",
                pair.title,
                pair.baseline,
                pair.candidate
            ),
        }
    }

    Ok(comparisons)
}

/// A prefix-grouped pair (one row of the performance matrix)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupedComparison {
    /// Group key
    pub test: String,
    /// Baseline profile name
    pub baseline_name: String,
    /// Candidate profile name
    pub candidate_name: String,
    /// Baseline duration in seconds
    pub baseline_secs: f64,
    /// Candidate duration in seconds
    pub candidate_secs: f64,
    /// `baseline / candidate`
    pub speedup: f64,
}

fn group_key<'a>(name: &'a str, labels: &ComparisonLabels) -> &'a str {
    let stripped = name
        .strip_prefix(labels.baseline_prefix.as_str())
        .or_else(|| name.strip_prefix(labels.candidate_prefix.as_str()))
        .unwrap_or(name);
    stripped.split('_').next().unwrap_or(stripped)
}

/// Group profiles by key and pair the two sides.
///
/// Groups appear in first-seen order. When a side occurs twice in a group the
/// later profile wins. Groups lacking a side or a usable duration are dropped.
pub fn group_profiles(
    profiles: &[ProfileStats],
    labels: &ComparisonLabels,
) -> Vec<GroupedComparison> {
    let mut groups: Vec<(&str, Option<&ProfileStats>, Option<&ProfileStats>)> = Vec::new();

    for profile in profiles {
        let is_baseline = labels.is_baseline(&profile.name);
        let is_candidate = labels.is_candidate(&profile.name);
        if !is_baseline && !is_candidate {
            continue;
        }

        let key = group_key(&profile.name, labels);
        let idx = match groups.iter().position(|(k, _, _)| *k == key) {
            Some(idx) => idx,
            None => {
                groups.push((key, None, None));
                groups.len() - 1
            }
        };

        if is_baseline {
            groups[idx].1 = Some(profile);
        } else {
            groups[idx].2 = Some(profile);
        }
    }

    groups
        .into_iter()
        .filter_map(|(key, baseline, candidate)| {
            let baseline = baseline?;
            let candidate = candidate?;
            let b = baseline.usable_duration()?;
            let c = candidate.usable_duration()?;
            Some(GroupedComparison {
                test: key.to_string(),
                baseline_name: baseline.name.clone(),
                candidate_name: candidate.name.clone(),
                baseline_secs: b,
                candidate_secs: c,
                speedup: b / c,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(name: &str, duration: Option<f64>) -> ProfileStats {
        ProfileStats {
            duration_secs: duration,
            ..ProfileStats::named(name)
        }
    }

    #[test]
    fn test_default_pairs() {
        let pairs = default_pairs();
        assert_eq!(pairs.len(), 5);
        assert_eq!(pairs[2].candidate, "cpp_3_multithreading");
        assert_eq!(pairs[4].title, "Memory/IO Intensive");
    }

    #[test]
    fn test_compare_stats_requires_durations() {
        let a = profile("py_x", Some(4.0));
        let b = profile("cpp_x", Some(2.0));
        let cmp = compare_stats("X", a.clone(), b.clone()).unwrap();
        assert_eq!(cmp.speedup, 2.0);

        assert!(compare_stats("X", a.clone(), profile("cpp_x", None)).is_none());
        assert!(compare_stats("X", a, profile("cpp_x", Some(0.0))).is_none());
        assert!(compare_stats("X", profile("py_x", Some(0.0)), b).is_none());
    }

    #[test]
    fn test_compare_implementations_from_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("py_1_basic_cpu_stats.txt"),
            "Duration: 3.0 seconds\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("cpp_1_basic_cpu_stats.txt"),
            "Duration: 0.5 seconds\n",
        )
        .unwrap();
        // Only one side present
        std::fs::write(
            dir.path().join("py_4_nvtx_stats.txt"),
            "Duration: 1.0 seconds\n",
        )
        .unwrap();

        let comparisons = compare_implementations(dir.path(), &default_pairs()).unwrap();
        assert_eq!(comparisons.len(), 1);
        assert_eq!(comparisons[0].title, "Basic CPU Profiling");
        assert!((comparisons[0].speedup - 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_group_profiles() {
        let labels = ComparisonLabels::default();
        let profiles = vec![
            profile("py_1_basic_cpu", Some(2.0)),
            profile("cpp_1_basic_cpu", Some(0.5)),
            profile("py_3_multiprocessing", Some(6.0)),
            profile("cpp_3_multithreading", Some(2.0)),
            profile("py_2_matrix_ops", Some(1.0)),
            profile("rs_1_basic_cpu", Some(0.1)),
            profile("cpp_4_nvtx", None),
            profile("py_4_nvtx", Some(1.0)),
        ];

        let groups = group_profiles(&profiles, &labels);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].test, "1");
        assert_eq!(groups[0].speedup, 4.0);
        assert_eq!(groups[1].test, "3");
        assert_eq!(groups[1].candidate_name, "cpp_3_multithreading");
        assert_eq!(groups[1].speedup, 3.0);
    }

    #[test]
    fn test_group_key_without_underscore() {
        let labels = ComparisonLabels::default();
        assert_eq!(group_key("py_matrix", &labels), "matrix");
        assert_eq!(group_key("cpp_2_matrix_ops", &labels), "2");
    }
}

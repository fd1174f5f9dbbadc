//! Stats Scraping
//!
//! Extracts metrics from the console text printed by `nsys stats`. The text
//! is not a stable format, so every field is optional: anything that does not
//! match keeps its default and parsing never fails.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::sync::LazyLock;

static DURATION: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"Duration:\s*([\d.]+)").ok());
static SAMPLES: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"Total samples:\s*(\d+)").ok());
static CONTEXT_SWITCHES: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"Context switches:\s*(\d+)").ok());
static OS_RUNTIME: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"OS runtime events:\s*(\d+)").ok());
static NVTX: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"NVTX events:\s*(\d+)").ok());
static CPU_UTILIZATION: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"CPU utilization:\s*([\d.]+)\s*%").ok());

/// A function and its share of sampled CPU time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotFunction {
    /// Symbol as printed by the profiler
    pub name: String,
    /// Share of samples, in percent
    pub percent: f64,
}

/// Metrics scraped from one profile
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileStats {
    /// Profile name (report stem, e.g. `py_1_basic_cpu`)
    pub name: String,
    /// Wall-clock duration in seconds
    pub duration_secs: Option<f64>,
    /// Total CPU samples
    pub cpu_samples: u64,
    /// Context switches
    pub context_switches: u64,
    /// OS runtime trace events
    pub os_runtime_events: u64,
    /// NVTX range/mark events
    pub nvtx_events: u64,
    /// CPU utilization in percent
    pub cpu_utilization: Option<f64>,
    /// Hot functions in the order the profiler listed them
    pub top_functions: Vec<HotFunction>,
}

impl ProfileStats {
    /// Empty stats for `name`
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Duration if present and non-zero
    pub fn usable_duration(&self) -> Option<f64> {
        self.duration_secs.filter(|d| *d > 0.0)
    }

    /// CPU samples per second of wall time
    pub fn samples_per_second(&self) -> Option<f64> {
        match self.usable_duration() {
            Some(d) if self.cpu_samples > 0 => Some(self.cpu_samples as f64 / d),
            _ => None,
        }
    }
}

fn capture<T: FromStr>(re: &LazyLock<Option<Regex>>, text: &str) -> Option<T> {
    let re = re.as_ref()?;
    re.captures(text)?.get(1)?.as_str().parse().ok()
}

fn parse_top_functions(text: &str) -> Vec<HotFunction> {
    let lines: Vec<&str> = text.lines().collect();
    let Some(header) = lines
        .iter()
        .position(|l| l.contains("Top Functions") || l.contains("CPU Functions"))
    else {
        return Vec::new();
    };

    // One column-header line sits between the title and the rows
    lines
        .iter()
        .skip(header + 2)
        .take_while(|l| !l.trim().is_empty())
        .filter_map(|line| {
            let mut parts = line.split_whitespace();
            let first = parts.next()?;
            if !first.contains('%') {
                return None;
            }
            let percent: f64 = first.trim_matches('%').parse().ok()?;
            let name = parts.collect::<Vec<_>>().join(" ");
            if name.is_empty() {
                return None;
            }
            Some(HotFunction { name, percent })
        })
        .collect()
}

/// Parse `nsys stats` console output
pub fn parse_stats(name: &str, text: &str) -> ProfileStats {
    ProfileStats {
        name: name.to_string(),
        duration_secs: capture(&DURATION, text),
        cpu_samples: capture(&SAMPLES, text).unwrap_or(0),
        context_switches: capture(&CONTEXT_SWITCHES, text).unwrap_or(0),
        os_runtime_events: capture(&OS_RUNTIME, text).unwrap_or(0),
        nvtx_events: capture(&NVTX, text).unwrap_or(0),
        cpu_utilization: capture(&CPU_UTILIZATION, text),
        top_functions: parse_top_functions(text),
    }
}

/// Read a saved `<name>_stats.txt` file.
///
/// A missing file yields empty stats; other read failures are errors.
pub fn stats_from_file(path: impl AsRef<Path>) -> crate::Result<ProfileStats> {
    let path = path.as_ref();
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .map(|s| s.strip_suffix("_stats").unwrap_or(s).to_string())
        .unwrap_or_default();

    if !path.exists() {
        tracing::debug!("Stats file {} not found", path.display());
        return Ok(ProfileStats::named(name));
    }

    let text = std::fs::read_to_string(path)?;
    Ok(parse_stats(&name, &text))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
Generating SQLite file report.sqlite
Duration: 2.345 seconds
Total samples: 12345
Context switches: 321
OS runtime events: 88
NVTX events: 14
CPU utilization: 87.5 %

Top Functions
 Time(%)  Function
 45.2%    fibonacci_recursive
 20.1%    std::vec::Vec<T>::push
 oops     not a row
 3.0%

Other section
";

    #[test]
    fn test_parse_full_output() {
        let stats = parse_stats("py_1_basic_cpu", SAMPLE);
        assert_eq!(stats.name, "py_1_basic_cpu");
        assert_eq!(stats.duration_secs, Some(2.345));
        assert_eq!(stats.cpu_samples, 12345);
        assert_eq!(stats.context_switches, 321);
        assert_eq!(stats.os_runtime_events, 88);
        assert_eq!(stats.nvtx_events, 14);
        assert_eq!(stats.cpu_utilization, Some(87.5));
        assert_eq!(stats.top_functions.len(), 2);
        assert_eq!(stats.top_functions[0].name, "fibonacci_recursive");
        assert_eq!(stats.top_functions[0].percent, 45.2);
        assert_eq!(stats.top_functions[1].name, "std::vec::Vec<T>::push");
    }

    #[test]
    fn test_duration_without_unit() {
        let stats = parse_stats("x", "Duration: 0.5\n");
        assert_eq!(stats.duration_secs, Some(0.5));
    }

    #[test]
    fn test_missing_fields_keep_defaults() {
        let stats = parse_stats("empty", "nothing useful here");
        assert_eq!(stats.duration_secs, None);
        assert_eq!(stats.cpu_samples, 0);
        assert_eq!(stats.cpu_utilization, None);
        assert!(stats.top_functions.is_empty());
    }

    #[test]
    fn test_malformed_duration_is_none() {
        let stats = parse_stats("x", "Duration: 1.2.3 seconds");
        assert_eq!(stats.duration_secs, None);
    }

    #[test]
    fn test_cpu_functions_header() {
        let text = "CPU Functions\nPct Name\n10.0% main\n5.5% helper fn\n";
        let stats = parse_stats("x", text);
        assert_eq!(stats.top_functions.len(), 2);
        assert_eq!(stats.top_functions[1].name, "helper fn");
        assert_eq!(stats.top_functions[1].percent, 5.5);
    }

    #[test]
    fn test_samples_per_second() {
        let mut stats = ProfileStats::named("x");
        assert_eq!(stats.samples_per_second(), None);
        stats.duration_secs = Some(2.0);
        stats.cpu_samples = 1000;
        assert_eq!(stats.samples_per_second(), Some(500.0));
        stats.duration_secs = Some(0.0);
        assert_eq!(stats.samples_per_second(), None);
    }

    #[test]
    fn test_stats_from_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let stats = stats_from_file(dir.path().join("cpp_4_nvtx_stats.txt")).unwrap();
        assert_eq!(stats.name, "cpp_4_nvtx");
        assert_eq!(stats.duration_secs, None);
    }

    #[test]
    fn test_stats_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("py_2_matrix_ops_stats.txt");
        std::fs::write(&path, SAMPLE).unwrap();
        let stats = stats_from_file(&path).unwrap();
        assert_eq!(stats.name, "py_2_matrix_ops");
        assert_eq!(stats.cpu_samples, 12345);
    }
}

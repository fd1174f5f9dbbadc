//! Configuration loading from cpuprof.toml
//!
//! cpuprof configuration can be specified in a `cpuprof.toml` file in the project root.
//! The configuration is automatically discovered by walking up from the current directory.

use cpuprof_report::charts::ChartSize;
use cpuprof_report::{ComparisonLabels, ComparisonPair, default_pairs};
use cpuprof_workloads::Scale;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the configuration file
pub const CONFIG_FILE: &str = "cpuprof.toml";

/// cpuprof configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CpuprofConfig {
    /// Directory layout
    #[serde(default)]
    pub paths: PathsConfig,
    /// Profiler invocation
    #[serde(default)]
    pub nsys: NsysConfig,
    /// Example execution
    #[serde(default)]
    pub runner: RunnerConfig,
    /// Baseline vs candidate comparison
    #[serde(default)]
    pub compare: CompareConfig,
    /// Report generation
    #[serde(default)]
    pub report: ReportConfig,
}

/// Directory layout, relative to the working directory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Where `.nsys-rep` and `<name>_stats.txt` files go
    #[serde(default = "default_results_dir")]
    pub results_dir: PathBuf,
    /// Where charts and HTML/JSON reports go
    #[serde(default = "default_reports_dir")]
    pub reports_dir: PathBuf,
    /// Python example scripts
    #[serde(default = "default_python_dir")]
    pub python_dir: PathBuf,
    /// Native example sources
    #[serde(default = "default_native_dir")]
    pub native_dir: PathBuf,
    /// Built native example binaries
    #[serde(default = "default_native_bin_dir")]
    pub native_bin_dir: PathBuf,
    /// Helper scripts
    #[serde(default = "default_scripts_dir")]
    pub scripts_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            results_dir: default_results_dir(),
            reports_dir: default_reports_dir(),
            python_dir: default_python_dir(),
            native_dir: default_native_dir(),
            native_bin_dir: default_native_bin_dir(),
            scripts_dir: default_scripts_dir(),
        }
    }
}

fn default_results_dir() -> PathBuf {
    PathBuf::from("results")
}
fn default_reports_dir() -> PathBuf {
    PathBuf::from("results/reports")
}
fn default_python_dir() -> PathBuf {
    PathBuf::from("python")
}
fn default_native_dir() -> PathBuf {
    PathBuf::from("cpp")
}
fn default_native_bin_dir() -> PathBuf {
    PathBuf::from("cpp/bin")
}
fn default_scripts_dir() -> PathBuf {
    PathBuf::from("scripts")
}

/// How `nsys profile` is invoked
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NsysConfig {
    /// Profiler executable
    #[serde(default = "default_nsys_binary")]
    pub binary: String,
    /// `--sample` mode
    #[serde(default = "default_sample")]
    pub sample: String,
    /// `--trace` list
    #[serde(default = "default_trace")]
    pub trace: String,
    /// Pass `--cpuctxsw=true` for native targets
    #[serde(default = "default_native_ctxsw")]
    pub native_cpuctxsw: bool,
    /// Extra arguments inserted before `-o`
    #[serde(default)]
    pub extra_args: Vec<String>,
}

impl Default for NsysConfig {
    fn default() -> Self {
        Self {
            binary: default_nsys_binary(),
            sample: default_sample(),
            trace: default_trace(),
            native_cpuctxsw: default_native_ctxsw(),
            extra_args: Vec::new(),
        }
    }
}

fn default_nsys_binary() -> String {
    "nsys".to_string()
}
fn default_sample() -> String {
    "cpu".to_string()
}
fn default_trace() -> String {
    "osrt,nvtx".to_string()
}
fn default_native_ctxsw() -> bool {
    true
}

/// Example execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Interpreter for script examples
    #[serde(default = "default_python")]
    pub python: String,
    /// Command that builds the native examples
    #[serde(default = "default_build_command")]
    pub build_command: String,
    /// Scale for builtin demos: "full" or "quick"
    #[serde(default = "default_scale")]
    pub scale: String,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            python: default_python(),
            build_command: default_build_command(),
            scale: default_scale(),
        }
    }
}

impl RunnerConfig {
    /// Parsed demo scale (falls back to full on unknown values)
    pub fn scale(&self) -> Scale {
        self.scale.parse().unwrap_or_default()
    }
}

fn default_python() -> String {
    "python".to_string()
}
fn default_build_command() -> String {
    "make all".to_string()
}
fn default_scale() -> String {
    "full".to_string()
}

/// Baseline vs candidate comparison
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompareConfig {
    /// Prefix of baseline profile names
    #[serde(default = "default_baseline_prefix")]
    pub baseline_prefix: String,
    /// Prefix of candidate profile names
    #[serde(default = "default_candidate_prefix")]
    pub candidate_prefix: String,
    /// Display name of the baseline side
    #[serde(default = "default_baseline_label")]
    pub baseline_label: String,
    /// Display name of the candidate side
    #[serde(default = "default_candidate_label")]
    pub candidate_label: String,
    /// Explicit pairs for `cpuprof compare`
    #[serde(default = "default_pairs")]
    pub pairs: Vec<ComparisonPair>,
}

impl Default for CompareConfig {
    fn default() -> Self {
        Self {
            baseline_prefix: default_baseline_prefix(),
            candidate_prefix: default_candidate_prefix(),
            baseline_label: default_baseline_label(),
            candidate_label: default_candidate_label(),
            pairs: default_pairs(),
        }
    }
}

impl CompareConfig {
    /// Labels handed to the report crate
    pub fn labels(&self) -> ComparisonLabels {
        ComparisonLabels {
            baseline_prefix: self.baseline_prefix.clone(),
            candidate_prefix: self.candidate_prefix.clone(),
            baseline_label: self.baseline_label.clone(),
            candidate_label: self.candidate_label.clone(),
        }
    }
}

fn default_baseline_prefix() -> String {
    "py_".to_string()
}
fn default_candidate_prefix() -> String {
    "cpp_".to_string()
}
fn default_baseline_label() -> String {
    "Python".to_string()
}
fn default_candidate_label() -> String {
    "C++".to_string()
}

/// Report generation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Functions per hot-function chart
    #[serde(default = "default_top_functions")]
    pub top_functions: usize,
    /// Profiles that get a hot-function chart
    #[serde(default = "default_hot_function_charts")]
    pub hot_function_charts: usize,
    /// Chart width in pixels
    #[serde(default = "default_width")]
    pub width: u32,
    /// Chart height in pixels
    #[serde(default = "default_height")]
    pub height: u32,
    /// Default output format: html, json or markdown
    #[serde(default = "default_format")]
    pub format: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            top_functions: default_top_functions(),
            hot_function_charts: default_hot_function_charts(),
            width: default_width(),
            height: default_height(),
            format: default_format(),
        }
    }
}

impl ReportConfig {
    /// Chart dimensions
    pub fn chart_size(&self) -> ChartSize {
        ChartSize {
            width: self.width,
            height: self.height,
        }
    }
}

fn default_top_functions() -> usize {
    10
}
fn default_hot_function_charts() -> usize {
    5
}
fn default_width() -> u32 {
    1200
}
fn default_height() -> u32 {
    720
}
fn default_format() -> String {
    "html".to_string()
}

impl CpuprofConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Try to discover and load configuration by walking up from current directory
    pub fn discover() -> Option<Self> {
        let mut dir = std::env::current_dir().ok()?;
        loop {
            let config_path = dir.join(CONFIG_FILE);
            if config_path.exists() {
                return match Self::load(&config_path) {
                    Ok(config) => Some(config),
                    Err(e) => {
                        tracing::warn!("Ignoring {}: {}", config_path.display(), e);
                        None
                    }
                };
            }
            if !dir.pop() {
                break;
            }
        }
        None
    }

    /// Generate a default configuration as TOML string
    pub fn default_toml() -> String {
        r#"# cpuprof Configuration

[paths]
# Profiles (.nsys-rep) and saved stats (<name>_stats.txt)
results_dir = "results"
# Charts and HTML/JSON reports
reports_dir = "results/reports"
# Python example scripts (*.py)
python_dir = "python"
# Native example sources and built binaries
native_dir = "cpp"
native_bin_dir = "cpp/bin"
scripts_dir = "scripts"

[nsys]
binary = "nsys"
# --sample mode
sample = "cpu"
# --trace list
trace = "osrt,nvtx"
# Record context switches for native targets
native_cpuctxsw = true
# Extra arguments passed to `nsys profile` (uncomment to enable)
# extra_args = ["--stats=true"]

[runner]
# Interpreter for script examples
python = "python"
# Builds the native examples
build_command = "make all"
# Builtin demo scale: full or quick
scale = "full"

[compare]
baseline_prefix = "py_"
candidate_prefix = "cpp_"
baseline_label = "Python"
candidate_label = "C++"

[[compare.pairs]]
baseline = "py_1_basic_cpu"
candidate = "cpp_1_basic_cpu"
title = "Basic CPU Profiling"

[[compare.pairs]]
baseline = "py_2_matrix_ops"
candidate = "cpp_2_matrix_ops"
title = "Matrix Operations"

[[compare.pairs]]
baseline = "py_3_multiprocessing"
candidate = "cpp_3_multithreading"
title = "Parallel Processing"

[[compare.pairs]]
baseline = "py_4_nvtx"
candidate = "cpp_4_nvtx"
title = "NVTX Annotations"

[[compare.pairs]]
baseline = "py_5_io_bound"
candidate = "cpp_5_memory"
title = "Memory/IO Intensive"

[report]
# Functions per hot-function chart
top_functions = 10
# Number of profiles that get a hot-function chart
hot_function_charts = 5
# Chart dimensions
width = 1200
height = 720
# Default output format: html, json, markdown
format = "html"
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CpuprofConfig::default();
        assert_eq!(config.paths.results_dir, PathBuf::from("results"));
        assert_eq!(config.nsys.trace, "osrt,nvtx");
        assert!(config.nsys.native_cpuctxsw);
        assert_eq!(config.compare.pairs.len(), 5);
        assert_eq!(config.runner.scale(), Scale::Full);
    }

    #[test]
    fn test_parse_toml() {
        let toml_str = r#"
            [paths]
            results_dir = "out"

            [compare]
            baseline_prefix = "rs_"
            baseline_label = "Rust"

            [[compare.pairs]]
            baseline = "rs_1_basic_cpu"
            candidate = "cpp_1_basic_cpu"
            title = "Basic"
        "#;

        let config: CpuprofConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.paths.results_dir, PathBuf::from("out"));
        assert_eq!(config.compare.pairs.len(), 1);
        assert_eq!(config.compare.labels().baseline_label, "Rust");
        // Defaults should still apply
        assert_eq!(config.compare.candidate_prefix, "cpp_");
        assert_eq!(config.paths.reports_dir, PathBuf::from("results/reports"));
        assert_eq!(config.report.top_functions, 10);
    }

    #[test]
    fn test_default_toml_parses() {
        let config: CpuprofConfig = toml::from_str(&CpuprofConfig::default_toml()).unwrap();
        let defaults = CpuprofConfig::default();
        assert_eq!(config.paths.native_bin_dir, defaults.paths.native_bin_dir);
        assert_eq!(config.compare.pairs, defaults.compare.pairs);
        assert_eq!(config.runner.build_command, "make all");
        assert_eq!(config.report.hot_function_charts, 5);
        assert!(config.nsys.extra_args.is_empty());
    }

    #[test]
    fn test_unknown_scale_falls_back() {
        let runner = RunnerConfig {
            scale: "huge".to_string(),
            ..Default::default()
        };
        assert_eq!(runner.scale(), Scale::Full);
        let runner = RunnerConfig {
            scale: "quick".to_string(),
            ..Default::default()
        };
        assert_eq!(runner.scale(), Scale::Quick);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "[runner]\nscale = \"quick\"\n").unwrap();
        let config = CpuprofConfig::load(&path).unwrap();
        assert_eq!(config.runner.scale(), Scale::Quick);
    }
}

//! Environment Check
//!
//! Verifies that everything needed to profile the examples is in place and
//! prints a ✓/⚠/✗ line per finding. Warnings count as failed checks.

use crate::analysis::{describe_host, interpreter_version, system_info};
use crate::config::CpuprofConfig;
use crate::nsys::Nsys;
use std::io::Write;
use std::path::Path;

/// Outcome of all checks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckSummary {
    /// Checks that passed
    pub passed: usize,
    /// Checks run
    pub total: usize,
}

impl CheckSummary {
    /// Whether every check passed
    pub fn all_passed(&self) -> bool {
        self.passed == self.total
    }
}

fn check_toolchain(out: &mut impl Write) -> std::io::Result<bool> {
    writeln!(out, "Toolchain:")?;
    writeln!(
        out,
        "  cpuprof {} ({}/{})",
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS,
        std::env::consts::ARCH
    )?;
    writeln!(out, "  Host: {}", describe_host(&system_info()))?;
    writeln!(out, "  ✓ Built with Rust {}+", env!("CARGO_PKG_RUST_VERSION"))?;
    Ok(true)
}

fn check_nvtx(out: &mut impl Write) -> std::io::Result<bool> {
    writeln!(out, "\nNVTX Annotations:")?;
    if cpuprof_core::is_available() {
        writeln!(out, "  ✓ NVTX backend compiled in")?;
        Ok(true)
    } else {
        writeln!(out, "  ⚠ NVTX calls are no-ops")?;
        writeln!(out, "  Rebuild with: cargo build --features nvtx")?;
        Ok(false)
    }
}

fn count_entries(dir: &Path) -> Option<usize> {
    std::fs::read_dir(dir).ok().map(|entries| entries.count())
}

fn check_directories(out: &mut impl Write, config: &CpuprofConfig) -> std::io::Result<bool> {
    writeln!(out, "\nProject Structure:")?;
    let dirs = [
        &config.paths.python_dir,
        &config.paths.native_dir,
        &config.paths.scripts_dir,
        &config.paths.results_dir,
    ];

    let mut all_good = true;
    for dir in dirs {
        let name = dir.display().to_string();
        match count_entries(dir) {
            Some(count) => writeln!(out, "  ✓ {:10} ({} files)", name, count)?,
            None => {
                writeln!(out, "  ✗ {:10} (missing)", name)?;
                all_good = false;
            }
        }
    }
    Ok(all_good)
}

fn check_nsys(out: &mut impl Write, nsys: &Nsys) -> std::io::Result<bool> {
    writeln!(out, "\nNVIDIA Nsight Systems:")?;
    match nsys.version() {
        Ok(version) => {
            writeln!(out, "  ✓ nsys found: {}", version)?;
            Ok(true)
        }
        Err(e) => {
            tracing::debug!("nsys check failed: {}", e);
            writeln!(out, "  ✗ nsys not found in PATH")?;
            writeln!(out, "  Install from: https://developer.nvidia.com/nsight-systems")?;
            Ok(false)
        }
    }
}

fn check_python(out: &mut impl Write, python: &str) -> std::io::Result<bool> {
    writeln!(out, "\nPython Interpreter:")?;
    match interpreter_version(python) {
        Some(version) => {
            writeln!(out, "  ✓ {}", version)?;
            Ok(true)
        }
        None => {
            writeln!(out, "  ✗ {} not found", python)?;
            Ok(false)
        }
    }
}

fn check_native_build(out: &mut impl Write, bin_dir: &Path) -> std::io::Result<bool> {
    writeln!(out, "\nNative Build Status:")?;
    let Ok(entries) = std::fs::read_dir(bin_dir) else {
        writeln!(out, "  ⚠ Native bin directory not found")?;
        writeln!(out, "  Run: cpuprof build")?;
        return Ok(false);
    };

    let mut binaries: Vec<String> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    binaries.sort();

    if binaries.is_empty() {
        writeln!(out, "  ⚠ No native examples built yet")?;
        writeln!(out, "  Run: cpuprof build")?;
        return Ok(false);
    }

    writeln!(out, "  ✓ {} native examples built", binaries.len())?;
    for name in binaries.iter().take(3) {
        writeln!(out, "    - {}", name)?;
    }
    if binaries.len() > 3 {
        writeln!(out, "    ... and {} more", binaries.len() - 3)?;
    }
    Ok(true)
}

/// Run every check, printing results to `out`
pub fn run_checks(
    config: &CpuprofConfig,
    nsys: &Nsys,
    out: &mut impl Write,
) -> std::io::Result<CheckSummary> {
    writeln!(out, "{}", "=".repeat(60))?;
    writeln!(out, "Environment Check for NVIDIA Nsight Systems Profiling")?;
    writeln!(out, "{}", "=".repeat(60))?;

    let results = [
        check_toolchain(out)?,
        check_nvtx(out)?,
        check_directories(out, config)?,
        check_nsys(out, nsys)?,
        check_python(out, &config.runner.python)?,
        check_native_build(out, &config.paths.native_bin_dir)?,
    ];

    let summary = CheckSummary {
        passed: results.iter().filter(|ok| **ok).count(),
        total: results.len(),
    };

    writeln!(out, "\n{}", "=".repeat(60))?;
    if summary.all_passed() {
        writeln!(
            out,
            "✓ All checks passed! ({}/{})",
            summary.passed, summary.total
        )?;
        writeln!(out, "\nYou're ready to run the profiling examples!")?;
        writeln!(out, "\nNext steps:")?;
        writeln!(out, "  1. Run a demo: cpuprof demo 1_basic_cpu")?;
        writeln!(out, "  2. Profile an example: cpuprof run 1 --profile")?;
        writeln!(out, "  3. Use interactive runner: cpuprof menu")?;
    } else {
        writeln!(
            out,
            "⚠ Some checks failed ({}/{} passed)",
            summary.passed, summary.total
        )?;
        writeln!(out, "\nPlease fix the issues above before running examples.")?;
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NsysConfig;

    fn config_in(root: &Path) -> CpuprofConfig {
        let mut config = CpuprofConfig::default();
        config.paths.python_dir = root.join("python");
        config.paths.native_dir = root.join("cpp");
        config.paths.native_bin_dir = root.join("cpp/bin");
        config.paths.scripts_dir = root.join("scripts");
        config.paths.results_dir = root.join("results");
        config.runner.python = "definitely-not-a-real-python".to_string();
        config
    }

    fn missing_nsys() -> Nsys {
        Nsys::new(NsysConfig {
            binary: "definitely-not-a-real-nsys-binary".to_string(),
            ..Default::default()
        })
    }

    #[test]
    fn test_checks_fail_in_empty_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut out = Vec::new();
        let summary = run_checks(&config_in(dir.path()), &missing_nsys(), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert_eq!(summary.total, 6);
        assert!(!summary.all_passed());
        assert!(text.contains("(missing)"));
        assert!(text.contains("✗ nsys not found in PATH"));
        assert!(text.contains("Native bin directory not found"));
        assert!(text.contains("✗ definitely-not-a-real-python not found"));
        assert!(text.contains(&format!("  Host: {}", describe_host(&system_info()))));
        assert!(text.contains(&format!(
            "⚠ Some checks failed ({}/6 passed)",
            summary.passed
        )));
    }

    #[test]
    fn test_directories_and_native_build() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        for d in ["python", "cpp/bin", "scripts", "results"] {
            std::fs::create_dir_all(dir.path().join(d)).unwrap();
        }
        for name in ["a", "b", "c", "d", "e"] {
            std::fs::write(dir.path().join("cpp/bin").join(name), "").unwrap();
        }

        let mut out = Vec::new();
        assert!(check_directories(&mut out, &config).unwrap());
        assert!(check_native_build(&mut out, &config.paths.native_bin_dir).unwrap());
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("✓ 5 native examples built"));
        assert!(text.contains("    - a"));
        assert!(!text.contains("    - d"));
        assert!(text.contains("... and 2 more"));
    }

    #[test]
    fn test_empty_bin_dir_warns() {
        let dir = tempfile::tempdir().unwrap();
        let mut out = Vec::new();
        assert!(!check_native_build(&mut out, dir.path()).unwrap());
        assert!(String::from_utf8(out).unwrap().contains("No native examples built yet"));
    }
}

//! Host and Tool Metadata
//!
//! Facts about the machine and the external tools, shared by `cpuprof check`
//! (printed) and `cpuprof report` (stored in the JSON document). The `/proc`
//! lookups simply come back empty off Linux.

use crate::nsys::Nsys;
use chrono::Utc;
use cpuprof_report::{ReportMeta, SystemInfo};
use std::path::Path;
use std::process::{Command, Stdio};

/// Report metadata: git commit, host, profiler and interpreter versions
pub fn build_report_meta(nsys: &Nsys, python: &str) -> ReportMeta {
    ReportMeta {
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
        git_commit: first_line_of("git", &["rev-parse", "HEAD"]),
        system: system_info(),
        profiler: nsys.version().ok(),
        interpreter: interpreter_version(python),
    }
}

/// Describe the host profiles are recorded on
pub fn system_info() -> SystemInfo {
    let memory_kb = proc_value("/proc/meminfo", "MemTotal")
        .and_then(|v| v.split_whitespace().next()?.parse::<u64>().ok());

    SystemInfo {
        os: std::env::consts::OS.to_string(),
        arch: std::env::consts::ARCH.to_string(),
        cpu: proc_value("/proc/cpuinfo", "model name").unwrap_or_else(|| "Unknown".to_string()),
        cpu_cores: std::thread::available_parallelism()
            .map(|n| n.get() as u32)
            .unwrap_or(1),
        memory_gb: memory_kb.map_or(0.0, |kb| kb as f64 / (1024.0 * 1024.0)),
    }
}

/// One-line host summary for terminal output
pub fn describe_host(info: &SystemInfo) -> String {
    if info.memory_gb > 0.0 {
        format!(
            "{} ({} cores, {:.1} GB RAM)",
            info.cpu, info.cpu_cores, info.memory_gb
        )
    } else {
        format!("{} ({} cores)", info.cpu, info.cpu_cores)
    }
}

/// `<python> --version`, read from stdout or, for older interpreters, stderr
pub fn interpreter_version(python: &str) -> Option<String> {
    let output = Command::new(python)
        .arg("--version")
        .stdin(Stdio::null())
        .output()
        .ok()
        .filter(|o| o.status.success())?;
    let text = if output.stdout.is_empty() {
        output.stderr
    } else {
        output.stdout
    };
    let version = String::from_utf8_lossy(&text).trim().to_string();
    (!version.is_empty()).then_some(version)
}

fn first_line_of(program: &str, args: &[&str]) -> Option<String> {
    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .ok()
        .filter(|o| o.status.success())?;
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
}

/// Value of the first `key : value` line of a `/proc` style file
fn proc_value(path: impl AsRef<Path>, key: &str) -> Option<String> {
    parse_proc_value(&std::fs::read_to_string(path).ok()?, key)
}

fn parse_proc_value(content: &str, key: &str) -> Option<String> {
    content.lines().find_map(|line| {
        let (name, value) = line.split_once(':')?;
        (name.trim() == key).then(|| value.trim().to_string())
    })
}

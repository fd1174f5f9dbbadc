//! Nsight Systems Invocation
//!
//! Builds `nsys profile` / `nsys stats` command lines and runs the profiler
//! as a child process. Nothing here parses profiler output; that is the
//! report crate's job.

use crate::config::NsysConfig;
use std::path::Path;
use std::process::{Command, Stdio};
use thiserror::Error;

/// Errors from running the profiler
#[derive(Debug, Error)]
pub enum NsysError {
    /// The profiler binary is not on PATH
    #[error("{0} not found in PATH")]
    NotFound(String),

    /// The process could not be started
    #[error("Failed to run {program}: {source}")]
    Spawn {
        /// Program that failed to start
        program: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The process exited unsuccessfully
    #[error("{program} exited with {status}: {stderr}")]
    Failed {
        /// Program that failed
        program: String,
        /// Exit status description
        status: String,
        /// Captured stderr
        stderr: String,
    },
}

/// A program plus arguments to launch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Launch {
    /// Executable
    pub program: String,
    /// Arguments
    pub args: Vec<String>,
    /// Native code (gets context-switch tracing under the profiler)
    pub native: bool,
}

impl Launch {
    /// Build a launch description
    pub fn new(program: impl Into<String>, args: Vec<String>, native: bool) -> Self {
        Self {
            program: program.into(),
            args,
            native,
        }
    }

    /// Render for display
    pub fn to_command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Convert into a `std::process::Command` inheriting stdio
    pub fn to_command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        command
    }
}

/// A fully built `nsys` invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NsysCommand {
    launch: Launch,
}

impl NsysCommand {
    /// `nsys profile --sample=<mode> --trace=<list> [--cpuctxsw=true] -o <output> <target...>`
    pub fn profile(config: &NsysConfig, output: &Path, target: &Launch) -> Self {
        let mut args = vec![
            "profile".to_string(),
            format!("--sample={}", config.sample),
            format!("--trace={}", config.trace),
        ];
        if target.native && config.native_cpuctxsw {
            args.push("--cpuctxsw=true".to_string());
        }
        args.extend(config.extra_args.iter().cloned());
        args.push("-o".to_string());
        args.push(output.display().to_string());
        args.push(target.program.clone());
        args.extend(target.args.iter().cloned());

        Self {
            launch: Launch::new(config.binary.clone(), args, false),
        }
    }

    /// `nsys stats <report>`
    pub fn stats(config: &NsysConfig, report_path: &Path) -> Self {
        Self {
            launch: Launch::new(
                config.binary.clone(),
                vec!["stats".to_string(), report_path.display().to_string()],
                false,
            ),
        }
    }

    /// Program and arguments
    pub fn launch(&self) -> &Launch {
        &self.launch
    }

    /// Render for display
    pub fn to_command_line(&self) -> String {
        self.launch.to_command_line()
    }

    /// Run and capture stdout
    pub fn output(&self) -> Result<String, NsysError> {
        let program = self.launch.program.clone();
        let output = self
            .launch
            .to_command()
            .stdin(Stdio::null())
            .output()
            .map_err(|source| spawn_error(&program, source))?;

        if !output.status.success() {
            return Err(NsysError::Failed {
                program,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

fn spawn_error(program: &str, source: std::io::Error) -> NsysError {
    if source.kind() == std::io::ErrorKind::NotFound {
        NsysError::NotFound(program.to_string())
    } else {
        NsysError::Spawn {
            program: program.to_string(),
            source,
        }
    }
}

/// Handle on the profiler binary
#[derive(Debug, Clone)]
pub struct Nsys {
    config: NsysConfig,
}

impl Nsys {
    /// Use the binary and flags from `config`
    pub fn new(config: NsysConfig) -> Self {
        Self { config }
    }

    /// Configured settings
    pub fn config(&self) -> &NsysConfig {
        &self.config
    }

    /// First line of `nsys --version`
    pub fn version(&self) -> Result<String, NsysError> {
        let output = Command::new(&self.config.binary)
            .arg("--version")
            .stdin(Stdio::null())
            .output()
            .map_err(|source| spawn_error(&self.config.binary, source))?;

        if !output.status.success() {
            return Err(NsysError::Failed {
                program: self.config.binary.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(stdout.trim().lines().next().unwrap_or_default().to_string())
    }

    /// Whether `nsys --version` succeeds
    pub fn is_available(&self) -> bool {
        self.version().is_ok()
    }

    /// Build a profiling command for `target`
    pub fn profile_command(&self, output: &Path, target: &Launch) -> NsysCommand {
        NsysCommand::profile(&self.config, output, target)
    }

    /// Console output of `nsys stats <report>`
    pub fn stats_text(&self, report_path: &Path) -> Result<String, NsysError> {
        NsysCommand::stats(&self.config, report_path).output()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_command_for_script() {
        let config = NsysConfig::default();
        let target = Launch::new("python", vec!["python/1_basic.py".to_string()], false);
        let cmd = NsysCommand::profile(&config, Path::new("results/py_1_basic"), &target);
        assert_eq!(
            cmd.to_command_line(),
            "nsys profile --sample=cpu --trace=osrt,nvtx -o results/py_1_basic python python/1_basic.py"
        );
    }

    #[test]
    fn test_profile_command_for_native() {
        let config = NsysConfig {
            extra_args: vec!["--force-overwrite=true".to_string()],
            ..Default::default()
        };
        let target = Launch::new("cpp/bin/4_nvtx", Vec::new(), true);
        let cmd = NsysCommand::profile(&config, Path::new("results/cpp_4_nvtx"), &target);
        assert_eq!(
            cmd.launch().args,
            vec![
                "profile",
                "--sample=cpu",
                "--trace=osrt,nvtx",
                "--cpuctxsw=true",
                "--force-overwrite=true",
                "-o",
                "results/cpp_4_nvtx",
                "cpp/bin/4_nvtx",
            ]
        );
    }

    #[test]
    fn test_ctxsw_can_be_disabled() {
        let config = NsysConfig {
            native_cpuctxsw: false,
            ..Default::default()
        };
        let target = Launch::new("bin", Vec::new(), true);
        let cmd = NsysCommand::profile(&config, Path::new("out"), &target);
        assert!(!cmd.to_command_line().contains("cpuctxsw"));
    }

    #[test]
    fn test_stats_command() {
        let cmd = NsysCommand::stats(&NsysConfig::default(), Path::new("results/a.nsys-rep"));
        assert_eq!(cmd.to_command_line(), "nsys stats results/a.nsys-rep");
    }

    #[test]
    fn test_missing_binary_reports_not_found() {
        let nsys = Nsys::new(NsysConfig {
            binary: "definitely-not-a-real-nsys-binary".to_string(),
            ..Default::default()
        });
        assert!(!nsys.is_available());
        assert!(matches!(nsys.version(), Err(NsysError::NotFound(_))));
        assert!(matches!(
            nsys.stats_text(Path::new("x.nsys-rep")),
            Err(NsysError::NotFound(_))
        ));
    }
}

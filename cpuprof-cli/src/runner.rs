//! Example Runner
//!
//! Runs catalog entries directly or under `nsys profile`, runs everything in
//! one go, and builds the native examples.

use crate::catalog::{Example, ExampleKind};
use crate::config::CpuprofConfig;
use crate::nsys::{Launch, Nsys};
use cpuprof_workloads::Scale;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;

/// Operations the interactive menu can trigger
pub trait Actions {
    /// Run one example, optionally under the profiler
    fn run(&mut self, example: &Example, profile: bool) -> anyhow::Result<()>;
    /// Run every listed example without profiling
    fn run_all(&mut self, examples: &[&Example]) -> anyhow::Result<()>;
    /// Build the native examples
    fn build(&mut self) -> anyhow::Result<()>;
}

/// Runs examples according to the configuration
pub struct Runner<'a> {
    config: &'a CpuprofConfig,
    nsys: Nsys,
    scale: Scale,
}

impl<'a> Runner<'a> {
    /// Create a runner for builtin demos at `scale`
    pub fn new(config: &'a CpuprofConfig, scale: Scale) -> Self {
        Self {
            config,
            nsys: Nsys::new(config.nsys.clone()),
            scale,
        }
    }

    /// Profiler handle
    pub fn nsys(&self) -> &Nsys {
        &self.nsys
    }

    /// Base output path (without extension) for a profile of `example`
    pub fn profile_output(&self, example: &Example) -> PathBuf {
        self.config.paths.results_dir.join(example.profile_name())
    }

    /// Run `example`. Returns whether it exited successfully.
    pub fn run_example(&self, example: &Example, profile: bool) -> anyhow::Result<bool> {
        if profile {
            return self.profile_example(example);
        }

        if let ExampleKind::Builtin(demo) = &example.kind {
            println!("\nRunning: {} ({}, in-process)", demo.id, self.scale);
            demo.execute(self.scale)?;
            return Ok(true);
        }

        let launch = example.launch(self.config, self.scale)?;
        println!("\nRunning: {}", launch.to_command_line());
        spawn_and_wait(&launch)
    }

    fn profile_example(&self, example: &Example) -> anyhow::Result<bool> {
        std::fs::create_dir_all(&self.config.paths.results_dir)?;

        let output = self.profile_output(example);
        let target = example.launch(self.config, self.scale)?;
        let command = self.nsys.profile_command(&output, &target);
        println!("\nRunning: {}", command.to_command_line());

        let ok = spawn_and_wait(command.launch())?;
        if ok {
            self.save_stats(example);
        }
        Ok(ok)
    }

    /// Save `nsys stats` output next to the profile as `<name>_stats.txt`.
    /// Failures are logged and otherwise ignored.
    fn save_stats(&self, example: &Example) {
        let report = self
            .config
            .paths
            .results_dir
            .join(format!("{}.nsys-rep", example.profile_name()));
        if !report.exists() {
            tracing::debug!("No report at {}, skipping stats", report.display());
            return;
        }

        let stats_path = self
            .config
            .paths
            .results_dir
            .join(format!("{}_stats.txt", example.profile_name()));
        match self.nsys.stats_text(&report) {
            Ok(text) => {
                if let Err(e) = std::fs::write(&stats_path, text) {
                    tracing::warn!("Could not write {}: {}", stats_path.display(), e);
                } else {
                    println!("Stats saved to: {}", stats_path.display());
                }
            }
            Err(e) => tracing::warn!("Could not extract stats for {}: {}", report.display(), e),
        }
    }

    /// Run every example without profiling. Returns the number that failed.
    pub fn run_all_examples(&self, examples: &[&Example]) -> anyhow::Result<usize> {
        let pb = ProgressBar::new(examples.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );

        let mut failed = 0;
        for example in examples {
            pb.set_message(example.profile_name());
            let result = pb.suspend(|| self.run_example(example, false));
            match result {
                Ok(true) => {}
                Ok(false) => failed += 1,
                Err(e) => {
                    tracing::warn!("{} failed: {}", example.profile_name(), e);
                    failed += 1;
                }
            }
            pb.inc(1);
        }

        pb.finish_with_message("Complete");
        Ok(failed)
    }

    /// Run the configured build command. Returns whether it succeeded.
    pub fn build_examples(&self) -> anyhow::Result<bool> {
        println!("\nBuilding native examples...");
        let mut parts = self.config.runner.build_command.split_whitespace();
        let Some(program) = parts.next() else {
            anyhow::bail!("Empty build command");
        };

        let output = std::process::Command::new(program)
            .args(parts)
            .stdin(std::process::Stdio::null())
            .output()?;

        if output.status.success() {
            println!("Build successful!");
            Ok(true)
        } else {
            println!("Build failed!");
            println!("{}", String::from_utf8_lossy(&output.stderr));
            Ok(false)
        }
    }
}

fn spawn_and_wait(launch: &Launch) -> anyhow::Result<bool> {
    let status = launch.to_command().status()?;
    if !status.success() {
        tracing::warn!("{} exited with {}", launch.program, status);
    }
    Ok(status.success())
}

impl Actions for Runner<'_> {
    fn run(&mut self, example: &Example, profile: bool) -> anyhow::Result<()> {
        self.run_example(example, profile).map(|_| ())
    }

    fn run_all(&mut self, examples: &[&Example]) -> anyhow::Result<()> {
        println!("\nRunning all examples...");
        self.run_all_examples(examples).map(|_| ())
    }

    fn build(&mut self) -> anyhow::Result<()> {
        self.build_examples().map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;

    #[test]
    fn test_profile_output_path() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = CpuprofConfig::default();
        config.paths.results_dir = dir.path().join("results");
        config.paths.python_dir = dir.path().join("python");
        config.paths.native_bin_dir = dir.path().join("bin");

        let catalog = Catalog::discover(&config);
        let runner = Runner::new(&config, Scale::Quick);
        let example = catalog.find("1_basic_cpu").unwrap();
        assert_eq!(
            runner.profile_output(example),
            dir.path().join("results").join("rs_1_basic_cpu")
        );
    }

    #[test]
    fn test_build_reports_failure() {
        let mut config = CpuprofConfig::default();
        config.runner.build_command = "false".to_string();
        let runner = Runner::new(&config, Scale::Quick);
        #[cfg(unix)]
        assert!(!runner.build_examples().unwrap());
    }

    #[test]
    fn test_empty_build_command_errors() {
        let mut config = CpuprofConfig::default();
        config.runner.build_command = "   ".to_string();
        let runner = Runner::new(&config, Scale::Quick);
        assert!(runner.build_examples().is_err());
    }

    #[test]
    fn test_profile_without_nsys_fails_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = CpuprofConfig::default();
        config.paths.results_dir = dir.path().join("results");
        config.nsys.binary = "definitely-not-a-real-nsys-binary".to_string();

        let catalog = Catalog::discover(&config);
        let runner = Runner::new(&config, Scale::Quick);
        let example = catalog.select(1).unwrap();
        assert!(runner.run_example(example, true).is_err());
        // The results directory is created before launching
        assert!(dir.path().join("results").is_dir());
    }
}

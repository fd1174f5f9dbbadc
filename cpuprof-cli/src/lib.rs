#![warn(missing_docs)]
//! cpuprof CLI Library
//!
//! Command-line front end: discovers examples, runs them (optionally under
//! `nsys profile`), checks the environment and turns saved profiles into
//! comparisons and reports.
//!
//! # Example
//!
//! ```ignore
//! fn main() -> anyhow::Result<()> {
//!     cpuprof_cli::run()
//! }
//! ```

mod analysis;
mod catalog;
mod config;
mod environment;
mod menu;
mod nsys;
mod runner;

pub use analysis::{
    CompareOutcome, ReportOutcome, ReportRequest, build_report_meta, compare_results,
    describe_host, extract_stats, find_profiles, format_catalog, format_speedups, generate_report,
    interpreter_version, system_info,
};
pub use catalog::{Catalog, Example, ExampleKind};
pub use config::*;
pub use environment::{CheckSummary, run_checks};
pub use menu::run_menu;
pub use nsys::{Launch, Nsys, NsysCommand, NsysError};
pub use runner::{Actions, Runner};

use clap::{Parser, Subcommand};
use cpuprof_report::OutputFormat;
use cpuprof_workloads::Scale;
use regex::Regex;
use std::path::{Path, PathBuf};

/// cpuprof CLI arguments
#[derive(Parser, Debug)]
#[command(name = "cpuprof")]
#[command(
    author,
    version,
    about = "cpuprof - CPU profiling examples and reports for NVIDIA Nsight Systems"
)]
pub struct Cli {
    /// Optional subcommand; defaults to the interactive menu
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Configuration file (default: discover cpuprof.toml upwards from the cwd)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List discovered examples
    List {
        /// Filter examples by regex on their profile name
        #[arg(default_value = ".*")]
        filter: String,
    },
    /// Run one example
    Run {
        /// Menu number, profile name (py_1_basic_cpu) or stem (1_basic_cpu)
        example: String,
        /// Run under `nsys profile` and save stats next to the report
        #[arg(short, long)]
        profile: bool,
        /// Workload size for builtin demos (full, quick)
        #[arg(long)]
        scale: Option<Scale>,
    },
    /// Run every example without profiling
    All {
        /// Filter examples by regex on their profile name
        #[arg(default_value = ".*")]
        filter: String,
        /// Workload size for builtin demos (full, quick)
        #[arg(long)]
        scale: Option<Scale>,
    },
    /// Build the native examples
    Build,
    /// Interactive menu (default)
    Menu {
        /// Workload size for builtin demos (full, quick)
        #[arg(long)]
        scale: Option<Scale>,
    },
    /// Run a builtin demo in this process
    Demo {
        /// Demo id (3_parallel) or number (3)
        id: String,
        /// Workload size (full, quick)
        #[arg(long)]
        scale: Option<Scale>,
    },
    /// Check that the profiling environment is ready
    Check,
    /// Compare configured baseline/candidate pairs from saved stats
    Compare {
        /// Directory holding <name>_stats.txt files
        #[arg(long)]
        results_dir: Option<PathBuf>,
    },
    /// Generate charts and a report from every saved profile
    Report {
        /// Directory holding .nsys-rep files
        #[arg(long)]
        results_dir: Option<PathBuf>,
        /// Output directory for charts and reports
        #[arg(long)]
        reports_dir: Option<PathBuf>,
        /// Only include profiles whose file name contains this text
        #[arg(long)]
        filter: Option<String>,
        /// Output format: html, json, markdown
        #[arg(long)]
        format: Option<String>,
    },
    /// Write a default cpuprof.toml
    Init {
        /// Destination file
        #[arg(default_value = CONFIG_FILE)]
        path: PathBuf,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Run the cpuprof CLI with the process arguments.
///
/// # Returns
/// Returns `Ok(())` on success, or an error if something goes wrong.
pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    run_with_cli(cli)
}

/// Run the cpuprof CLI with pre-parsed arguments.
pub fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter("cpuprof=debug")
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter("cpuprof=info")
            .init();
    }

    let config = match &cli.config {
        Some(path) => CpuprofConfig::load(path)?,
        None => CpuprofConfig::discover().unwrap_or_default(),
    };

    let command = cli.command.unwrap_or(Commands::Menu { scale: None });
    execute(command, &config)
}

/// Execute one subcommand against a loaded configuration
pub fn execute(command: Commands, config: &CpuprofConfig) -> anyhow::Result<()> {
    let resolve = |scale: Option<Scale>| scale.unwrap_or_else(|| config.runner.scale());

    match command {
        Commands::List { filter } => list_examples(config, &filter),
        Commands::Run {
            example,
            profile,
            scale,
        } => run_one(config, &example, profile, resolve(scale)),
        Commands::All { filter, scale } => run_all(config, &filter, resolve(scale)),
        Commands::Build => {
            if !Runner::new(config, config.runner.scale()).build_examples()? {
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Menu { scale } => run_interactive(config, resolve(scale)),
        Commands::Demo { id, scale } => {
            let demo = cpuprof_workloads::find(&id)?;
            demo.execute(resolve(scale))?;
            Ok(())
        }
        Commands::Check => {
            let nsys = Nsys::new(config.nsys.clone());
            let summary = run_checks(config, &nsys, &mut std::io::stdout())?;
            if !summary.all_passed() {
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Compare { results_dir } => {
            let results_dir = results_dir.unwrap_or_else(|| config.paths.results_dir.clone());
            compare_results(config, &results_dir).map(|_| ())
        }
        Commands::Report {
            results_dir,
            reports_dir,
            filter,
            format,
        } => {
            let format = format.as_deref().unwrap_or(&config.report.format);
            let request = ReportRequest {
                results_dir: results_dir.unwrap_or_else(|| config.paths.results_dir.clone()),
                reports_dir: reports_dir.unwrap_or_else(|| config.paths.reports_dir.clone()),
                filter,
                format: format.parse().unwrap_or_else(|e| {
                    tracing::warn!("{}, using html", e);
                    OutputFormat::Html
                }),
            };
            let nsys = Nsys::new(config.nsys.clone());
            generate_report(config, &nsys, &request).map(|_| ())
        }
        Commands::Init { path, force } => init_config(&path, force),
    }
}

fn list_examples(config: &CpuprofConfig, filter: &str) -> anyhow::Result<()> {
    let pattern = Regex::new(filter)?;
    let catalog = Catalog::discover(config);
    print!("{}", format_catalog(&catalog.filter(&pattern)));
    Ok(())
}

fn run_one(config: &CpuprofConfig, name: &str, profile: bool, scale: Scale) -> anyhow::Result<()> {
    let catalog = Catalog::discover(config);
    let Some(example) = catalog.find(name) else {
        anyhow::bail!(
            "Unknown example: {} (see `cpuprof list` for what is available)",
            name
        );
    };

    let runner = Runner::new(config, scale);
    if profile && !runner.nsys().is_available() {
        anyhow::bail!(
            "nsys ({}) not found in PATH; run without --profile or install NVIDIA Nsight Systems",
            config.nsys.binary
        );
    }

    if !runner.run_example(example, profile)? {
        std::process::exit(1);
    }
    Ok(())
}

fn run_all(config: &CpuprofConfig, filter: &str, scale: Scale) -> anyhow::Result<()> {
    let pattern = Regex::new(filter)?;
    let catalog = Catalog::discover(config);
    let examples = catalog.filter(&pattern);
    if examples.is_empty() {
        println!("No examples match '{}'", filter);
        return Ok(());
    }

    println!("\nRunning {} examples...", examples.len());
    let failed = Runner::new(config, scale).run_all_examples(&examples)?;
    if failed > 0 {
        println!("{} of {} examples failed", failed, examples.len());
        std::process::exit(1);
    }
    println!("All {} examples completed", examples.len());
    Ok(())
}

fn run_interactive(config: &CpuprofConfig, scale: Scale) -> anyhow::Result<()> {
    let mut runner = Runner::new(config, scale);
    if !runner.nsys().is_available() {
        tracing::warn!("nsys not found in PATH. Please install NVIDIA Nsight Systems.");
        println!("You can still run examples without profiling.");
    }

    let stdin = std::io::stdin();
    let mut input = stdin.lock();
    let mut out = std::io::stdout();
    run_menu(
        || Catalog::discover(config),
        &mut runner,
        &mut input,
        &mut out,
    )
}

fn init_config(path: &Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }
    std::fs::write(path, CpuprofConfig::default_toml())?;
    println!("✓ Wrote {}", path.display());
    Ok(())
}

//! Example Catalog
//!
//! Discovers everything runnable:
//! - builtin Rust demos (always present, prefix `rs_`)
//! - Python scripts in the python dir (prefix `py_`)
//! - native binaries in the native bin dir (prefix `cpp_`)
//!
//! Builtin demos are launched by re-executing the current binary with
//! `demo <id>`, so the profiler sees a standalone process just like for the
//! other two kinds.

use crate::config::CpuprofConfig;
use crate::nsys::Launch;
use cpuprof_workloads::{DEMOS, Demo, Scale};
use regex::Regex;
use std::path::{Path, PathBuf};

/// Where an example comes from
#[derive(Debug, Clone)]
pub enum ExampleKind {
    /// Compiled into this binary
    Builtin(&'static Demo),
    /// Script run through the configured interpreter
    Script(PathBuf),
    /// Prebuilt native executable
    Binary(PathBuf),
}

/// A runnable example
#[derive(Debug, Clone)]
pub struct Example {
    /// Source
    pub kind: ExampleKind,
    /// File stem or demo id
    pub stem: String,
}

impl Example {
    fn builtin(demo: &'static Demo) -> Self {
        Self {
            kind: ExampleKind::Builtin(demo),
            stem: demo.id.to_string(),
        }
    }

    fn from_path(path: PathBuf, script: bool) -> Option<Self> {
        let stem = path.file_stem()?.to_str()?.to_string();
        let kind = if script {
            ExampleKind::Script(path)
        } else {
            ExampleKind::Binary(path)
        };
        Some(Self { kind, stem })
    }

    /// Profile name prefix
    pub fn prefix(&self) -> &'static str {
        match self.kind {
            ExampleKind::Builtin(_) => "rs_",
            ExampleKind::Script(_) => "py_",
            ExampleKind::Binary(_) => "cpp_",
        }
    }

    /// Output name for profiles, e.g. `py_1_basic_cpu_profiling`
    pub fn profile_name(&self) -> String {
        format!("{}{}", self.prefix(), self.stem)
    }

    /// Whether the example is native code
    pub fn is_native(&self) -> bool {
        !matches!(self.kind, ExampleKind::Script(_))
    }

    /// How to start the example as a child process
    pub fn launch(&self, config: &CpuprofConfig, scale: Scale) -> std::io::Result<Launch> {
        Ok(match &self.kind {
            ExampleKind::Builtin(demo) => {
                let exe = std::env::current_exe()?;
                Launch::new(
                    exe.display().to_string(),
                    vec![
                        "demo".to_string(),
                        demo.id.to_string(),
                        "--scale".to_string(),
                        scale.to_string(),
                    ],
                    true,
                )
            }
            ExampleKind::Script(path) => Launch::new(
                config.runner.python.clone(),
                vec![path.display().to_string()],
                false,
            ),
            ExampleKind::Binary(path) => Launch::new(path.display().to_string(), Vec::new(), true),
        })
    }
}

/// Every example, grouped by source
#[derive(Debug, Clone)]
pub struct Catalog {
    /// Builtin Rust demos
    pub builtins: Vec<Example>,
    /// Python scripts, sorted by path
    pub scripts: Vec<Example>,
    /// Native binaries, sorted by path
    pub binaries: Vec<Example>,
}

fn sorted_entries(dir: &Path, keep: impl Fn(&Path) -> bool) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut paths: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| keep(p))
        .collect();
    paths.sort();
    paths
}

impl Catalog {
    /// Scan the configured directories. Missing directories contribute nothing.
    pub fn discover(config: &CpuprofConfig) -> Self {
        let scripts = sorted_entries(&config.paths.python_dir, |p| {
            p.is_file() && p.extension().is_some_and(|e| e == "py")
        })
        .into_iter()
        .filter_map(|p| Example::from_path(p, true))
        .collect();

        let binaries = sorted_entries(&config.paths.native_bin_dir, |p| p.is_file())
            .into_iter()
            .filter_map(|p| Example::from_path(p, false))
            .collect();

        Self {
            builtins: DEMOS.iter().map(Example::builtin).collect(),
            scripts,
            binaries,
        }
    }

    /// Builtins, then scripts, then binaries
    pub fn all(&self) -> impl Iterator<Item = &Example> {
        self.builtins
            .iter()
            .chain(&self.scripts)
            .chain(&self.binaries)
    }

    /// Total number of examples
    pub fn len(&self) -> usize {
        self.builtins.len() + self.scripts.len() + self.binaries.len()
    }

    /// Whether the catalog is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 1-based selection across [`Catalog::all`]
    pub fn select(&self, index: usize) -> Option<&Example> {
        index.checked_sub(1).and_then(|i| self.all().nth(i))
    }

    /// Resolve a user-supplied name: a 1-based number, a profile name
    /// (`py_2_matrix_operations`) or a stem (`2_matrix_ops`)
    pub fn find(&self, name: &str) -> Option<&Example> {
        if let Ok(index) = name.parse::<usize>() {
            return self.select(index);
        }
        self.all()
            .find(|e| e.profile_name() == name)
            .or_else(|| self.all().find(|e| e.stem == name))
    }

    /// Examples whose profile name matches `pattern`
    pub fn filter(&self, pattern: &Regex) -> Vec<&Example> {
        self.all()
            .filter(|e| pattern.is_match(&e.profile_name()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_in(root: &Path) -> CpuprofConfig {
        let mut config = CpuprofConfig::default();
        config.paths.python_dir = root.join("python");
        config.paths.native_bin_dir = root.join("cpp/bin");
        config
    }

    #[test]
    fn test_missing_dirs_yield_builtins_only() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = Catalog::discover(&config_in(dir.path()));
        assert_eq!(catalog.len(), DEMOS.len());
        assert!(catalog.scripts.is_empty());
        assert!(catalog.binaries.is_empty());
        assert_eq!(catalog.select(1).unwrap().profile_name(), "rs_1_basic_cpu");
        assert!(catalog.select(0).is_none());
    }

    #[test]
    fn test_discover_sorted_sources() {
        let dir = tempfile::tempdir().unwrap();
        let python = dir.path().join("python");
        let bin = dir.path().join("cpp/bin");
        std::fs::create_dir_all(&python).unwrap();
        std::fs::create_dir_all(&bin).unwrap();
        std::fs::write(python.join("2_matrix_operations.py"), "").unwrap();
        std::fs::write(python.join("1_basic_cpu_profiling.py"), "").unwrap();
        std::fs::write(python.join("README.md"), "").unwrap();
        std::fs::write(bin.join("4_nvtx_annotations"), "").unwrap();

        let config = config_in(dir.path());
        let catalog = Catalog::discover(&config);
        assert_eq!(catalog.scripts.len(), 2);
        assert_eq!(catalog.scripts[0].stem, "1_basic_cpu_profiling");
        assert_eq!(catalog.binaries.len(), 1);

        let first_script = catalog.select(DEMOS.len() + 1).unwrap();
        assert_eq!(first_script.profile_name(), "py_1_basic_cpu_profiling");
        assert!(!first_script.is_native());

        let native = catalog.select(catalog.len()).unwrap();
        assert_eq!(native.profile_name(), "cpp_4_nvtx_annotations");
        assert!(native.is_native());
        assert!(catalog.select(catalog.len() + 1).is_none());

        let launch = first_script.launch(&config, Scale::Full).unwrap();
        assert_eq!(launch.program, "python");
        assert!(launch.args[0].ends_with("1_basic_cpu_profiling.py"));
    }

    #[test]
    fn test_find_and_filter() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = Catalog::discover(&config_in(dir.path()));
        assert_eq!(catalog.find("3").unwrap().stem, "3_parallel");
        assert_eq!(catalog.find("rs_4_nvtx").unwrap().stem, "4_nvtx");
        assert_eq!(catalog.find("6_memory").unwrap().prefix(), "rs_");
        assert!(catalog.find("nope").is_none());

        let re = Regex::new("matrix|memory").unwrap();
        assert_eq!(catalog.filter(&re).len(), 2);
    }

    #[test]
    fn test_builtin_launch_reexecutes_self() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let catalog = Catalog::discover(&config);
        let launch = catalog.select(2).unwrap().launch(&config, Scale::Quick).unwrap();
        assert!(launch.native);
        assert_eq!(launch.args, vec!["demo", "2_matrix_ops", "--scale", "quick"]);
    }
}

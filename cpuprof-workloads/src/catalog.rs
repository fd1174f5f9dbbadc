//! Registry of the builtin demos

use crate::{Result, WorkloadError};

/// Problem size for a demo run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scale {
    /// Sizes chosen to give the profiler several seconds of samples
    #[default]
    Full,
    /// Tiny sizes for smoke tests
    Quick,
}

impl Scale {
    /// Choose between the full-size and quick value
    pub fn pick<T>(self, full: T, quick: T) -> T {
        match self {
            Scale::Full => full,
            Scale::Quick => quick,
        }
    }

    /// Lowercase name, as accepted by `FromStr`
    pub fn as_str(self) -> &'static str {
        match self {
            Scale::Full => "full",
            Scale::Quick => "quick",
        }
    }
}

impl std::str::FromStr for Scale {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "full" => Ok(Scale::Full),
            "quick" | "smoke" => Ok(Scale::Quick),
            other => Err(format!("Unknown scale: {}", other)),
        }
    }
}

impl std::fmt::Display for Scale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A builtin demo program
#[derive(Debug, Clone, Copy)]
pub struct Demo {
    /// Stable identifier, also the stem of its profile output
    pub id: &'static str,
    /// Human-readable title
    pub title: &'static str,
    /// One-line description
    pub description: &'static str,
    /// Entry point
    pub run: fn(Scale) -> Result<()>,
}

/// All builtin demos, in menu order
pub static DEMOS: &[Demo] = &[
    Demo {
        id: "1_basic_cpu",
        title: "Basic CPU Profiling",
        description: "Recursion, sieves, dense loops, strings, sorting and hashing",
        run: crate::cpu::run,
    },
    Demo {
        id: "2_matrix_ops",
        title: "Matrix Operations",
        description: "Naive, transposed, tiled and Strassen multiplication, convolution",
        run: crate::matrix::run,
    },
    Demo {
        id: "3_parallel",
        title: "Parallel Processing",
        description: "Thread pools, channels, lock contention, false sharing, work stealing",
        run: crate::parallel::run,
    },
    Demo {
        id: "4_nvtx",
        title: "NVTX Annotations",
        description: "Annotated preprocessing, training and pipeline ranges",
        run: crate::annotated::run,
    },
    Demo {
        id: "5_io_bound",
        title: "I/O Intensive",
        description: "File, structured, threaded and async I/O patterns",
        run: crate::io::run,
    },
    Demo {
        id: "6_memory",
        title: "Memory Intensive",
        description: "Access patterns, cache lines, allocation and data layout",
        run: crate::memory::run,
    },
];

/// Look a demo up by full id (`3_parallel`) or numeric prefix (`3`).
pub fn find(id: &str) -> Result<&'static Demo> {
    let id = id.trim();
    DEMOS
        .iter()
        .find(|d| d.id == id || d.id.split('_').next() == Some(id))
        .ok_or_else(|| WorkloadError::UnknownDemo(id.to_string()))
}

impl Demo {
    /// Run at the given scale
    pub fn execute(&self, scale: Scale) -> Result<()> {
        tracing::debug!(demo = self.id, %scale, "running demo");
        (self.run)(scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_by_id_and_prefix() {
        assert_eq!(find("3_parallel").unwrap().id, "3_parallel");
        assert_eq!(find("5").unwrap().id, "5_io_bound");
        assert!(matches!(find("9"), Err(WorkloadError::UnknownDemo(_))));
    }

    #[test]
    fn test_ids_unique() {
        let mut ids: Vec<_> = DEMOS.iter().map(|d| d.id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), DEMOS.len());
    }

    #[test]
    fn test_scale_parse() {
        assert_eq!("quick".parse::<Scale>().unwrap(), Scale::Quick);
        assert_eq!("FULL".parse::<Scale>().unwrap(), Scale::Full);
        assert!("medium".parse::<Scale>().is_err());
        assert_eq!(Scale::Quick.pick(10, 1), 1);
    }
}

//! Profiling Session
//!
//! A `ProfileSession` owns a scratch directory for the duration of a demo and
//! records named wall-clock measurements. The directory is removed when the
//! session is dropped.

use crate::CoreError;
use crate::measure::{Timer, format_seconds};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

/// One named measurement
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    /// Label printed next to the timing
    pub name: String,
    /// Elapsed wall time
    pub elapsed: Duration,
}

/// Scratch directory plus an ordered log of measurements
#[derive(Debug)]
pub struct ProfileSession {
    dir: TempDir,
    results: Vec<Measurement>,
    quiet: bool,
}

impl ProfileSession {
    /// Create a session backed by a fresh `nsys_io_test_*` temp directory
    pub fn new() -> Result<Self, CoreError> {
        let dir = tempfile::Builder::new()
            .prefix("nsys_io_test_")
            .tempdir()
            .map_err(CoreError::ScratchDir)?;
        tracing::debug!(path = %dir.path().display(), "created session scratch dir");
        Ok(Self {
            dir,
            results: Vec::new(),
            quiet: false,
        })
    }

    /// Suppress the per-measurement line printed by [`measure`](Self::measure)
    pub fn quiet(mut self) -> Self {
        self.quiet = true;
        self
    }

    /// Scratch directory path
    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// Path of a file inside the scratch directory
    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Run `f`, record how long it took under `name`, and return its result.
    pub fn measure<T>(&mut self, name: &str, f: impl FnOnce() -> T) -> T {
        let timer = Timer::start();
        let out = f();
        self.record(name, timer.elapsed());
        out
    }

    /// Record an externally measured duration.
    ///
    /// Re-recording an existing name replaces its value in place.
    pub fn record(&mut self, name: &str, elapsed: Duration) {
        if !self.quiet {
            println!("   {}: {}", name, format_seconds(elapsed));
        }
        match self.results.iter_mut().find(|m| m.name == name) {
            Some(existing) => existing.elapsed = elapsed,
            None => self.results.push(Measurement {
                name: name.to_string(),
                elapsed,
            }),
        }
    }

    /// Measurements in the order they were first recorded
    pub fn results(&self) -> &[Measurement] {
        &self.results
    }

    /// Measurements sorted slowest first
    pub fn sorted_by_duration(&self) -> Vec<Measurement> {
        let mut sorted = self.results.clone();
        sorted.sort_by(|a, b| b.elapsed.cmp(&a.elapsed));
        sorted
    }

    /// Sum of all recorded durations
    pub fn total(&self) -> Duration {
        self.results.iter().map(|m| m.elapsed).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_records_in_order() {
        let mut session = ProfileSession::new().unwrap().quiet();
        session.record("a", Duration::from_millis(5));
        session.record("b", Duration::from_millis(20));
        session.record("c", Duration::from_millis(10));

        let names: Vec<_> = session.results().iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["a", "b", "c"]);

        let sorted: Vec<_> = session
            .sorted_by_duration()
            .into_iter()
            .map(|m| m.name)
            .collect();
        assert_eq!(sorted, ["b", "c", "a"]);
        assert_eq!(session.total(), Duration::from_millis(35));
    }

    #[test]
    fn test_measure_returns_result() {
        let mut session = ProfileSession::new().unwrap().quiet();
        let v = session.measure("sum", || (1..=10).sum::<u32>());
        assert_eq!(v, 55);
        assert_eq!(session.results().len(), 1);
    }

    #[test]
    fn test_rerecord_replaces() {
        let mut session = ProfileSession::new().unwrap().quiet();
        session.record("x", Duration::from_millis(1));
        session.record("x", Duration::from_millis(9));
        assert_eq!(session.results().len(), 1);
        assert_eq!(session.results()[0].elapsed, Duration::from_millis(9));
    }

    #[test]
    fn test_scratch_dir_removed_on_drop() {
        let session = ProfileSession::new().unwrap();
        let dir = session.dir().to_path_buf();
        assert!(dir.exists());
        assert!(
            dir.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("nsys_io_test_"))
        );
        std::fs::write(session.path("marker.txt"), b"x").unwrap();
        drop(session);
        assert!(!dir.exists());
    }
}

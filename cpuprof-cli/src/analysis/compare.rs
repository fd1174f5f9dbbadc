//! `cpuprof compare`: explicit baseline/candidate pairs from saved stats

use super::formatting::format_speedups;
use crate::config::CpuprofConfig;
use cpuprof_report::{Comparison, charts, compare_implementations, generate_comparison_report};
use std::path::{Path, PathBuf};

/// Files produced by a comparison run
#[derive(Debug)]
pub struct CompareOutcome {
    /// Comparable pairs in configured order
    pub comparisons: Vec<Comparison>,
    /// `detailed_comparison_report.md`
    pub report_path: PathBuf,
    /// Charts that were drawn
    pub charts: Vec<PathBuf>,
}

/// Compare configured pairs whose `<name>_stats.txt` files sit in `results_dir`
pub fn compare_results(
    config: &CpuprofConfig,
    results_dir: &Path,
) -> anyhow::Result<CompareOutcome> {
    if !results_dir.is_dir() {
        anyhow::bail!(
            "results directory not found: {}\nProfile some examples first (cpuprof run <example> --profile).",
            results_dir.display()
        );
    }

    println!("Analyzing profiling results...");
    let comparisons = compare_implementations(results_dir, &config.compare.pairs)?;
    if comparisons.is_empty() {
        anyhow::bail!("No valid comparison data found!");
    }

    let labels = config.compare.labels();
    let report = generate_comparison_report(&comparisons, &labels);
    let report_path = results_dir.join("detailed_comparison_report.md");
    std::fs::write(&report_path, report)?;
    println!("✓ Detailed report saved to: {}", report_path.display());

    let size = config.report.chart_size();
    let mut drawn = Vec::new();
    for chart in [
        charts::performance_comparison(&comparisons, &labels, size, results_dir),
        charts::sampling_rate_chart(&comparisons, &labels, size, results_dir),
    ] {
        match chart {
            Ok(Some(path)) => drawn.push(path),
            Ok(None) => {}
            Err(e) => tracing::warn!("{}", e),
        }
    }
    if !drawn.is_empty() {
        println!("✓ Visualizations saved to: {}/", results_dir.display());
    }

    print!("{}", format_speedups(&comparisons));
    println!("\nAnalysis complete!");

    Ok(CompareOutcome {
        comparisons,
        report_path,
        charts: drawn,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_results_dir() {
        let dir = tempfile::tempdir().unwrap();
        let err = compare_results(&CpuprofConfig::default(), &dir.path().join("nope")).unwrap_err();
        assert!(err.to_string().contains("results directory not found"));
    }

    #[test]
    fn test_no_comparable_pairs() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("py_4_nvtx_stats.txt"), "Duration: 1.0").unwrap();
        let err = compare_results(&CpuprofConfig::default(), dir.path()).unwrap_err();
        assert_eq!(err.to_string(), "No valid comparison data found!");
    }

    #[test]
    fn test_writes_report_and_charts() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("py_2_matrix_ops_stats.txt"),
            "Duration: 8.0 seconds\nTotal samples: 8000\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("cpp_2_matrix_ops_stats.txt"),
            "Duration: 0.4 seconds\nTotal samples: 400\n",
        )
        .unwrap();

        let outcome = compare_results(&CpuprofConfig::default(), dir.path()).unwrap();
        assert_eq!(outcome.comparisons.len(), 1);
        assert!((outcome.comparisons[0].speedup - 20.0).abs() < 1e-9);
        let md = std::fs::read_to_string(&outcome.report_path).unwrap();
        assert!(md.contains("### Matrix Operations"));
        assert_eq!(outcome.charts.len(), 2);
        assert!(dir.path().join("performance_comparison.svg").exists());
        assert!(dir.path().join("cpu_sampling_comparison.svg").exists());
    }
}

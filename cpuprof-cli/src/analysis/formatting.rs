//! Output Formatting
//!
//! Terminal output for `list` and `compare`.

use crate::catalog::{Example, ExampleKind};
use cpuprof_report::{Comparison, SpeedupSummary};

/// Format the example listing
pub fn format_catalog(examples: &[&Example]) -> String {
    let mut output = String::new();
    output.push_str("cpuprof Examples:\n");

    let sections: [(&str, fn(&ExampleKind) -> bool); 3] = [
        ("builtin", |k| matches!(k, ExampleKind::Builtin(_))),
        ("python", |k| matches!(k, ExampleKind::Script(_))),
        ("native", |k| matches!(k, ExampleKind::Binary(_))),
    ];

    for (label, is_kind) in sections {
        let members: Vec<&&Example> = examples.iter().filter(|e| is_kind(&e.kind)).collect();
        if members.is_empty() {
            continue;
        }
        output.push_str(&format!("├── {}\n", label));
        for example in members {
            let detail = match &example.kind {
                ExampleKind::Builtin(demo) => demo.title.to_string(),
                ExampleKind::Script(path) | ExampleKind::Binary(path) => {
                    path.display().to_string()
                }
            };
            output.push_str(&format!(
                "│   ├── {} ({})\n",
                example.profile_name(),
                detail
            ));
        }
    }

    output.push_str(&format!("{} examples found.\n", examples.len()));
    output
}

/// Format the `compare` summary table
pub fn format_speedups(comparisons: &[Comparison]) -> String {
    let mut output = String::new();
    output.push_str("\nPerformance Summary:\n");
    output.push_str(&"-".repeat(50));
    output.push('\n');

    for cmp in comparisons {
        output.push_str(&format!("{:30} Speedup: {:6.2}x\n", cmp.title, cmp.speedup));
    }

    let speedups: Vec<f64> = comparisons.iter().map(|c| c.speedup).collect();
    if let Some(summary) = SpeedupSummary::from_speedups(&speedups) {
        output.push_str(&"-".repeat(50));
        output.push('\n');
        output.push_str(&format!(
            "{:30} mean {:.2}x  median {:.2}x\n",
            format!("{} comparisons", summary.count),
            summary.mean,
            summary.median
        ));
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::config::CpuprofConfig;
    use cpuprof_report::{ProfileStats, compare_stats};

    fn stats(name: &str, duration: f64) -> ProfileStats {
        ProfileStats {
            duration_secs: Some(duration),
            ..ProfileStats::named(name)
        }
    }

    #[test]
    fn test_speedup_line_format() {
        let cmp = compare_stats(
            "Matrix Operations",
            stats("py_2", 12.5),
            stats("cpp_2", 0.5),
        )
        .unwrap();
        let text = format_speedups(&[cmp]);
        assert!(text.contains(&format!(
            "{:30} Speedup: {:6.2}x",
            "Matrix Operations", 25.0
        )));
        assert!(text.contains("Matrix Operations              Speedup:  25.00x"));
        assert!(text.contains("1 comparisons"));
    }

    #[test]
    fn test_catalog_listing() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = CpuprofConfig::default();
        config.paths.python_dir = dir.path().join("python");
        config.paths.native_bin_dir = dir.path().join("bin");
        let catalog = Catalog::discover(&config);
        let all: Vec<&Example> = catalog.all().collect();

        let text = format_catalog(&all);
        assert!(text.contains("├── builtin"));
        assert!(text.contains("rs_3_parallel (Parallel Processing)"));
        assert!(!text.contains("├── python"));
        assert!(text.ends_with("6 examples found.\n"));
    }
}

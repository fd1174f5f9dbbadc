//! Markdown Output

use crate::comparison::{Comparison, ComparisonLabels, GroupedComparison};
use crate::stats::ProfileStats;
use crate::summary::SpeedupSummary;
use crate::format_count;

const TOP_FUNCTIONS: usize = 5;

fn push_top_functions(report: &mut Vec<String>, label: &str, stats: &ProfileStats) {
    report.push(format!("\n**Top Functions ({}):**", label));
    for func in stats.top_functions.iter().take(TOP_FUNCTIONS) {
        report.push(format!("  - {}: {:.1}%", func.name, func.percent));
    }
}

/// Generate the detailed baseline vs candidate comparison report
pub fn generate_comparison_report(comparisons: &[Comparison], labels: &ComparisonLabels) -> String {
    let base = &labels.baseline_label;
    let cand = &labels.candidate_label;

    let mut report = Vec::new();
    report.push("# Performance Comparison Report".to_string());
    report.push("\n## Executive Summary\n".to_string());

    let speedups: Vec<f64> = comparisons.iter().map(|c| c.speedup).collect();
    if let Some(summary) = SpeedupSummary::from_speedups(&speedups) {
        report.push(format!(
            "- **Average {} Speedup**: {:.2}x faster than {}",
            cand, summary.mean, base
        ));
        report.push(format!("- **Max Speedup**: {:.2}x", summary.max));
        report.push(format!("- **Min Speedup**: {:.2}x", summary.min));
    }

    report.push("\n## Detailed Comparison\n".to_string());

    for cmp in comparisons {
        report.push(format!("### {}", cmp.title));
        report.push(format!("- **{} Duration**: {:.3}s", base, cmp.baseline_secs()));
        report.push(format!("- **{} Duration**: {:.3}s", cand, cmp.candidate_secs()));
        report.push(format!("- **Speedup**: {:.2}x", cmp.speedup));

        if cmp.baseline.cpu_samples > 0 {
            report.push(format!(
                "- **{} CPU Samples**: {}",
                base,
                format_count(cmp.baseline.cpu_samples)
            ));
        }
        if cmp.candidate.cpu_samples > 0 {
            report.push(format!(
                "- **{} CPU Samples**: {}",
                cand,
                format_count(cmp.candidate.cpu_samples)
            ));
        }

        push_top_functions(&mut report, base, &cmp.baseline);
        push_top_functions(&mut report, cand, &cmp.candidate);

        report.push(String::new());
    }

    report.join("\n")
}

/// Generate a markdown summary of a set of profiles (the `report --format markdown` output)
pub fn generate_profile_summary(
    profiles: &[ProfileStats],
    groups: &[GroupedComparison],
    labels: &ComparisonLabels,
    generated: &str,
) -> String {
    let mut out = String::new();
    out.push_str("# Profiling Report\n\n");
    out.push_str(&format!("Generated: {}\n\n", generated));

    out.push_str("| Profile | Duration | CPU Samples | Context Switches |\n");
    out.push_str("|---------|----------|-------------|------------------|\n");
    for p in profiles {
        let duration = p
            .duration_secs
            .map(|d| format!("{:.3}s", d))
            .unwrap_or_else(|| "n/a".to_string());
        out.push_str(&format!(
            "| {} | {} | {} | {} |\n",
            p.name,
            duration,
            format_count(p.cpu_samples),
            format_count(p.context_switches)
        ));
    }

    if !groups.is_empty() {
        out.push_str(&format!(
            "\n## {} vs {}\n\n",
            labels.baseline_label, labels.candidate_label
        ));
        out.push_str(&format!(
            "| Test | {} (s) | {} (s) | Speedup |\n",
            labels.baseline_label, labels.candidate_label
        ));
        out.push_str("|------|------|------|---------|\n");
        for g in groups {
            out.push_str(&format!(
                "| {} | {:.3} | {:.3} | {:.2}x |\n",
                g.test, g.baseline_secs, g.candidate_secs, g.speedup
            ));
        }
    }

    out
}

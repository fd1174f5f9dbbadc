//! HTML Output
//!
//! Renders a single self-contained page: summary counts, links to the chart
//! files sitting next to it, one metrics table per profile and a static list
//! of recommendations. Every string taken from a profile is escaped.

use crate::comparison::ComparisonLabels;
use crate::format_count;
use crate::stats::ProfileStats;
use std::path::{Path, PathBuf};

const STYLE: &str = r#"
        body { font-family: Arial, sans-serif; margin: 20px; background-color: #f5f5f5; }
        .container { max-width: 1200px; margin: 0 auto; background-color: white; padding: 20px; box-shadow: 0 0 10px rgba(0,0,0,0.1); }
        h1 { color: #2c3e50; text-align: center; border-bottom: 3px solid #3498db; padding-bottom: 10px; }
        h2 { color: #34495e; margin-top: 30px; }
        .summary { background-color: #ecf0f1; padding: 15px; border-radius: 5px; margin: 20px 0; }
        .profile-section { margin: 20px 0; padding: 15px; border: 1px solid #bdc3c7; border-radius: 5px; }
        table { width: 100%; border-collapse: collapse; margin: 15px 0; }
        th, td { padding: 10px; text-align: left; border-bottom: 1px solid #ddd; }
        th { background-color: #3498db; color: white; }
        tr:hover { background-color: #f5f5f5; }
        .chart { text-align: center; margin: 20px 0; }
        .chart img { max-width: 100%; height: auto; border: 1px solid #ddd; border-radius: 5px; }
        .timestamp { text-align: right; color: #7f8c8d; font-size: 0.9em; }
"#;

const RECOMMENDATIONS: &[&str] = &[
    "Review hot functions to identify optimization opportunities",
    "Compare implementations side by side for performance insights",
    "Use nsys-ui for detailed interactive analysis",
    "Consider NVTX annotations for better profiling granularity",
];

/// Escape text for inclusion in HTML element content or attributes
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

fn chart_link(chart: &Path, reports_dir: &Path) -> Option<String> {
    if !chart.exists() {
        return None;
    }
    let rel = chart
        .strip_prefix(reports_dir)
        .ok()
        .map(Path::to_path_buf)
        .or_else(|| chart.file_name().map(PathBuf::from))?;
    let alt = chart.file_stem().and_then(|s| s.to_str()).unwrap_or("chart");
    Some(format!(
        "<div class=\"chart\"><img src=\"{}\" alt=\"{}\"></div>\n",
        escape_html(&rel.to_string_lossy()),
        escape_html(alt)
    ))
}

fn profile_section(profile: &ProfileStats) -> String {
    let duration = profile
        .duration_secs
        .map(|d| format!("{:.3}s", d))
        .unwrap_or_else(|| "n/a".to_string());

    let mut html = format!(
        r#"
        <div class="profile-section">
            <h3>{}</h3>
            <table>
                <tr><th>Metric</th><th>Value</th></tr>
                <tr><td>Duration</td><td>{}</td></tr>
                <tr><td>CPU Samples</td><td>{}</td></tr>
                <tr><td>Context Switches</td><td>{}</td></tr>
            </table>
"#,
        escape_html(&profile.name),
        duration,
        format_count(profile.cpu_samples),
        format_count(profile.context_switches),
    );

    if !profile.top_functions.is_empty() {
        html.push_str(
            r#"            <h4>Top 5 Functions</h4>
            <table>
                <tr><th>Function</th><th>CPU Time %</th></tr>
"#,
        );
        for func in profile.top_functions.iter().take(5) {
            html.push_str(&format!(
                "                <tr><td>{}</td><td>{:.1}%</td></tr>\n",
                escape_html(&func.name),
                func.percent
            ));
        }
        html.push_str("            </table>\n");
    }

    html.push_str("        </div>\n");
    html
}

/// Render the HTML report.
///
/// `charts` are linked relative to `reports_dir`; paths that do not exist are
/// left out.
pub fn generate_html_report(
    profiles: &[ProfileStats],
    charts: &[PathBuf],
    reports_dir: &Path,
    labels: &ComparisonLabels,
    generated: &str,
) -> String {
    let baseline_count = profiles.iter().filter(|p| labels.is_baseline(&p.name)).count();
    let candidate_count = profiles.iter().filter(|p| labels.is_candidate(&p.name)).count();

    let chart_links: String = charts
        .iter()
        .filter_map(|c| chart_link(c, reports_dir))
        .collect();
    let charts_section = if chart_links.is_empty() {
        String::new()
    } else {
        format!("<h2>Performance Charts</h2>\n{}", chart_links)
    };

    let profiles_section: String = profiles.iter().map(profile_section).collect();

    let recommendations: String = RECOMMENDATIONS
        .iter()
        .map(|r| format!("                <li>{}</li>\n", r))
        .collect();

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>NVIDIA Nsight Systems Profiling Report</title>
    <style>{style}</style>
</head>
<body>
    <div class="container">
        <h1>NVIDIA Nsight Systems Profiling Report</h1>
        <p class="timestamp">Generated: {generated}</p>

        <div class="summary">
            <h2>Summary</h2>
            <p>Total profiles analyzed: {total}</p>
            <p>{base_label} profiles: {base_count}</p>
            <p>{cand_label} profiles: {cand_count}</p>
        </div>

        {charts_section}

        <h2>Profile Details</h2>
        {profiles_section}

        <div class="summary">
            <h2>Recommendations</h2>
            <ul>
{recommendations}            </ul>
        </div>
    </div>
</body>
</html>
"#,
        style = STYLE,
        generated = escape_html(generated),
        total = profiles.len(),
        base_label = escape_html(&labels.baseline_label),
        base_count = baseline_count,
        cand_label = escape_html(&labels.candidate_label),
        cand_count = candidate_count,
        charts_section = charts_section,
        profiles_section = profiles_section,
        recommendations = recommendations,
    )
}

/// Write `profiling_report.html` into `reports_dir`, timestamped with local time
pub fn write_html_report(
    profiles: &[ProfileStats],
    charts: &[PathBuf],
    reports_dir: &Path,
    labels: &ComparisonLabels,
) -> crate::Result<PathBuf> {
    std::fs::create_dir_all(reports_dir)?;
    let generated = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    let html = generate_html_report(profiles, charts, reports_dir, labels, &generated);
    let path = reports_dir.join("profiling_report.html");
    std::fs::write(&path, html)?;
    Ok(path)
}

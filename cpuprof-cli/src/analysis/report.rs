//! `cpuprof report`: stats, charts and a report for every `.nsys-rep` file
//!
//! ```text
//! results/*.nsys-rep ──► stats (parallel) ──► charts ──► HTML / JSON / Markdown
//! ```
//!
//! Stats come from a cached `<name>_stats.txt` next to the profile when one
//! exists, otherwise from running `nsys stats`.

use super::metadata::build_report_meta;
use crate::config::CpuprofConfig;
use crate::nsys::Nsys;
use cpuprof_report::{
    OutputFormat, ProfileStats, ReportDocument, charts, generate_profile_summary, group_profiles,
    parse_stats, write_html_report, write_json_report,
};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::path::{Path, PathBuf};

/// Inputs of a report run
#[derive(Debug, Clone)]
pub struct ReportRequest {
    /// Directory holding `.nsys-rep` files
    pub results_dir: PathBuf,
    /// Output directory
    pub reports_dir: PathBuf,
    /// Keep only profiles whose path contains this substring
    pub filter: Option<String>,
    /// Primary output format
    pub format: OutputFormat,
}

/// Files produced by a report run
#[derive(Debug)]
pub struct ReportOutcome {
    /// Profiles that had a duration
    pub profiles: Vec<ProfileStats>,
    /// Charts drawn
    pub charts: Vec<PathBuf>,
    /// Primary report file
    pub report_path: PathBuf,
    /// JSON document (always written)
    pub json_path: PathBuf,
}

/// Sorted `*.nsys-rep` files in `results_dir`, optionally filtered by substring
pub fn find_profiles(results_dir: &Path, filter: Option<&str>) -> std::io::Result<Vec<PathBuf>> {
    let mut profiles: Vec<PathBuf> = std::fs::read_dir(results_dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "nsys-rep"))
        .filter(|p| filter.is_none_or(|f| p.to_string_lossy().contains(f)))
        .collect();
    profiles.sort();
    Ok(profiles)
}

fn profile_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Stats for one profile; failures leave the duration empty
pub fn extract_stats(nsys: &Nsys, profile: &Path) -> ProfileStats {
    let name = profile_stem(profile);
    let cached = profile.with_file_name(format!("{}_stats.txt", name));

    let text = if cached.is_file() {
        std::fs::read_to_string(&cached).map_err(|e| e.to_string())
    } else {
        nsys.stats_text(profile).map_err(|e| e.to_string())
    };

    match text {
        Ok(text) => parse_stats(&name, &text),
        Err(e) => {
            tracing::warn!("Error extracting stats from {}: {}", profile.display(), e);
            ProfileStats::named(name)
        }
    }
}

fn extract_all(nsys: &Nsys, profiles: &[PathBuf]) -> Vec<ProfileStats> {
    let pb = ProgressBar::new(profiles.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    pb.set_message("extracting stats");

    let stats = profiles
        .par_iter()
        .map(|p| {
            let stats = extract_stats(nsys, p);
            pb.inc(1);
            stats
        })
        .collect();

    pb.finish_with_message("Complete");
    stats
}

fn keep_chart(
    charts: &mut Vec<PathBuf>,
    result: cpuprof_report::Result<Option<PathBuf>>,
    what: &str,
) {
    match result {
        Ok(Some(path)) => {
            println!("✓ Created {}", what);
            charts.push(path);
        }
        Ok(None) => {}
        Err(e) => tracing::warn!("{}", e),
    }
}

/// Generate the report. `Ok(None)` when there was nothing to report on.
pub fn generate_report(
    config: &CpuprofConfig,
    nsys: &Nsys,
    request: &ReportRequest,
) -> anyhow::Result<Option<ReportOutcome>> {
    println!("Generating visual profiling report...");

    let paths = if request.results_dir.is_dir() {
        find_profiles(&request.results_dir, request.filter.as_deref())?
    } else {
        Vec::new()
    };
    if paths.is_empty() {
        println!("No profiling results found!");
        return Ok(None);
    }
    println!("Found {} profiles to analyze", paths.len());

    let profiles: Vec<ProfileStats> = extract_all(nsys, &paths)
        .into_iter()
        .filter(|p| p.duration_secs.is_some())
        .collect();
    if profiles.is_empty() {
        println!("No valid profile data extracted!");
        return Ok(None);
    }

    std::fs::create_dir_all(&request.reports_dir)?;
    let labels = config.compare.labels();
    let size = config.report.chart_size();
    let groups = group_profiles(&profiles, &labels);

    println!("Generating visualizations...");
    let mut drawn = Vec::new();
    keep_chart(
        &mut drawn,
        charts::duration_chart(&profiles, &labels, size, &request.reports_dir),
        "duration comparison chart",
    );
    keep_chart(
        &mut drawn,
        charts::performance_matrix(&groups, &labels, size, &request.reports_dir),
        "performance matrix",
    );
    for profile in profiles.iter().take(config.report.hot_function_charts) {
        keep_chart(
            &mut drawn,
            charts::hot_functions_chart(
                profile,
                config.report.top_functions,
                size,
                &request.reports_dir,
            ),
            &format!("hot functions chart for {}", profile.name),
        );
    }

    let document = ReportDocument::new(
        build_report_meta(nsys, &config.runner.python),
        profiles.clone(),
        groups.clone(),
    );
    let json_path = write_json_report(&document, &request.reports_dir)?;

    let report_path = match request.format {
        OutputFormat::Html => {
            println!("Generating HTML report...");
            write_html_report(&profiles, &drawn, &request.reports_dir, &labels)?
        }
        OutputFormat::Json => json_path.clone(),
        OutputFormat::Markdown => {
            let generated = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
            let path = request.reports_dir.join("profiling_report.md");
            std::fs::write(
                &path,
                generate_profile_summary(&profiles, &groups, &labels, &generated),
            )?;
            path
        }
    };

    println!("\n✓ Report generated successfully!");
    println!("  Report: {}", report_path.display());
    println!("  JSON: {}", json_path.display());
    println!("  Charts: {}/*.svg", request.reports_dir.display());
    let absolute = std::fs::canonicalize(&report_path).unwrap_or_else(|_| report_path.clone());
    println!("  Open in browser: file://{}", absolute.display());

    Ok(Some(ReportOutcome {
        profiles,
        charts: drawn,
        report_path,
        json_path,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NsysConfig;

    fn offline_nsys() -> Nsys {
        Nsys::new(NsysConfig {
            binary: "definitely-not-a-real-nsys-binary".to_string(),
            ..Default::default()
        })
    }

    #[test]
    fn test_find_profiles_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["py_2.nsys-rep", "cpp_1.nsys-rep", "py_1.nsys-rep", "notes.txt"] {
            std::fs::write(dir.path().join(name), "").unwrap();
        }

        let all = find_profiles(dir.path(), None).unwrap();
        let names: Vec<String> = all.iter().map(|p| profile_stem(p)).collect();
        assert_eq!(names, vec!["cpp_1", "py_1", "py_2"]);

        let py = find_profiles(dir.path(), Some("py_")).unwrap();
        assert_eq!(py.len(), 2);
    }

    #[test]
    fn test_extract_prefers_cached_stats() {
        let dir = tempfile::tempdir().unwrap();
        let rep = dir.path().join("cpp_1_basic_cpu.nsys-rep");
        std::fs::write(&rep, "").unwrap();
        std::fs::write(
            dir.path().join("cpp_1_basic_cpu_stats.txt"),
            "Duration: 0.75 seconds\n",
        )
        .unwrap();

        let stats = extract_stats(&offline_nsys(), &rep);
        assert_eq!(stats.name, "cpp_1_basic_cpu");
        assert_eq!(stats.duration_secs, Some(0.75));
    }

    #[test]
    fn test_extract_without_nsys_leaves_duration_empty() {
        let dir = tempfile::tempdir().unwrap();
        let rep = dir.path().join("py_1.nsys-rep");
        std::fs::write(&rep, "").unwrap();
        let stats = extract_stats(&offline_nsys(), &rep);
        assert_eq!(stats.duration_secs, None);
    }

    #[test]
    fn test_no_profiles() {
        let dir = tempfile::tempdir().unwrap();
        let request = ReportRequest {
            results_dir: dir.path().to_path_buf(),
            reports_dir: dir.path().join("reports"),
            filter: None,
            format: OutputFormat::Html,
        };
        let outcome =
            generate_report(&CpuprofConfig::default(), &offline_nsys(), &request).unwrap();
        assert!(outcome.is_none());
    }

    #[test]
    fn test_markdown_report() {
        let dir = tempfile::tempdir().unwrap();
        for (name, duration) in [("py_1_basic_cpu", 2.0), ("cpp_1_basic_cpu", 0.5)] {
            std::fs::write(dir.path().join(format!("{}.nsys-rep", name)), "").unwrap();
            std::fs::write(
                dir.path().join(format!("{}_stats.txt", name)),
                format!("Duration: {} seconds\n", duration),
            )
            .unwrap();
        }

        let request = ReportRequest {
            results_dir: dir.path().to_path_buf(),
            reports_dir: dir.path().join("reports"),
            filter: None,
            format: OutputFormat::Markdown,
        };
        let outcome = generate_report(&CpuprofConfig::default(), &offline_nsys(), &request)
            .unwrap()
            .unwrap();
        assert_eq!(outcome.profiles.len(), 2);
        assert!(outcome.report_path.ends_with("profiling_report.md"));
        let md = std::fs::read_to_string(&outcome.report_path).unwrap();
        assert!(md.contains("| 1 | 2.000 | 0.500 | 4.00x |"));
        assert!(outcome.json_path.exists());
    }
}

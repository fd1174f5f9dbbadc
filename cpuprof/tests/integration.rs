//! Integration tests for cpuprof
//!
//! These tests drive the path from saved `nsys stats` output to comparisons,
//! charts and reports, plus the builtin workloads and the example catalog.

use cpuprof::prelude::*;
use cpuprof::report::charts::{self, ChartSize};
use cpuprof::report::{
    generate_comparison_report, generate_html_report, generate_json_report,
    generate_profile_summary,
};
use cpuprof::{
    ComparisonLabels, ComparisonPair, ProfileStats, ReportDocument, compare_implementations,
    group_profiles, parse_stats,
};
use cpuprof_cli::{Catalog, CpuprofConfig, ExampleKind, Nsys, NsysConfig, build_report_meta};
use std::path::Path;

const PY_STATS: &str = "\
Profile: py_2_matrix_operations
Duration: 4.5 seconds
Total samples: 45000
Context switches: 120
OS runtime events: 310
CPU utilization: 98.5 %

Top Functions
 Time(%)  Name
 41.2%    matmul_naive
 12.0%    PyObject_GetAttr

";

const CPP_STATS: &str = "\
Duration: 0.3 seconds
Total samples: 3000
Context switches: 15

CPU Functions
 Time(%)  Name
 77.7%    multiply_naive(Matrix const&, Matrix const&)
";

fn write_stats(dir: &Path, name: &str, text: &str) {
    std::fs::write(dir.join(format!("{}_stats.txt", name)), text).unwrap();
}

/// Saved stats for one pair become a comparison and a Markdown report
#[test]
fn test_stats_to_comparison_report() {
    let dir = tempfile::tempdir().unwrap();
    write_stats(dir.path(), "py_2_matrix_operations", PY_STATS);
    write_stats(dir.path(), "cpp_2_matrix_operations", CPP_STATS);

    let pairs = vec![
        ComparisonPair::new(
            "py_2_matrix_operations",
            "cpp_2_matrix_operations",
            "Matrix Operations",
        ),
        ComparisonPair::new("py_9_missing", "cpp_9_missing", "Missing"),
    ];
    let comparisons = compare_implementations(dir.path(), &pairs).unwrap();
    assert_eq!(comparisons.len(), 1);
    assert!((comparisons[0].speedup - 15.0).abs() < 1e-9);

    let md = generate_comparison_report(&comparisons, &ComparisonLabels::default());
    assert!(md.contains("### Matrix Operations"));
    assert!(md.contains("45,000"));
    assert!(md.contains("matmul_naive"));
}

/// Parsed profiles are grouped, charted and rendered into every format
#[test]
fn test_profiles_to_reports() {
    let dir = tempfile::tempdir().unwrap();
    let labels = ComparisonLabels::default();

    let profiles = vec![
        parse_stats("py_2_matrix_operations", PY_STATS),
        parse_stats("cpp_2_matrix_operations", CPP_STATS),
        parse_stats("rs_3_parallel", "Duration: 0.8 seconds\n"),
    ];
    assert_eq!(profiles[0].top_functions.len(), 2);
    assert_eq!(profiles[0].cpu_utilization, Some(98.5));

    let groups = group_profiles(&profiles, &labels);
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].test, "2");
    assert!((groups[0].speedup - 15.0).abs() < 1e-9);

    let size = ChartSize::default();
    let duration = charts::duration_chart(&profiles, &labels, size, dir.path())
        .unwrap()
        .unwrap();
    let matrix = charts::performance_matrix(&groups, &labels, size, dir.path())
        .unwrap()
        .unwrap();
    let hot = charts::hot_functions_chart(&profiles[0], 10, size, dir.path())
        .unwrap()
        .unwrap();
    for chart in [&duration, &matrix, &hot] {
        let svg = std::fs::read_to_string(chart).unwrap();
        assert!(svg.starts_with("<svg"));
    }

    let html = generate_html_report(
        &profiles,
        &[duration, matrix, hot],
        dir.path(),
        &labels,
        "2026-01-01 00:00:00",
    );
    assert!(html.contains("duration_comparison.svg"));
    assert!(html.contains("py_2_matrix_operations"));

    let summary = generate_profile_summary(&profiles, &groups, &labels, "now");
    assert!(summary.contains("| 2 | 4.500 | 0.300 | 15.00x |"));

    let nsys = Nsys::new(NsysConfig {
        binary: "definitely-not-a-real-nsys-binary".to_string(),
        ..Default::default()
    });
    let meta = build_report_meta(&nsys, "definitely-not-a-real-python");
    let document = ReportDocument::new(meta, profiles, groups);
    let json = generate_json_report(&document).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["profiles"].as_array().unwrap().len(), 3);
    assert_eq!(value["summary"]["count"], 1);
    assert!(value["meta"].get("profiler").is_none());
}

/// Profiles without a duration never produce a speedup
#[test]
fn test_missing_duration_is_not_compared() {
    let labels = ComparisonLabels::default();
    let profiles = vec![
        ProfileStats::named("py_1_basic_cpu"),
        parse_stats("cpp_1_basic_cpu", "Duration: 0.2 seconds"),
    ];
    assert!(group_profiles(&profiles, &labels).is_empty());
}

/// Builtin demos are always in the catalog, scripts and binaries are discovered
#[test]
fn test_catalog_discovery() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = CpuprofConfig::default();
    config.paths.python_dir = dir.path().join("python");
    config.paths.native_bin_dir = dir.path().join("bin");
    std::fs::create_dir_all(&config.paths.python_dir).unwrap();
    std::fs::create_dir_all(&config.paths.native_bin_dir).unwrap();
    std::fs::write(config.paths.python_dir.join("2_matrix_operations.py"), "").unwrap();
    std::fs::write(config.paths.python_dir.join("README.md"), "").unwrap();
    std::fs::write(config.paths.native_bin_dir.join("2_matrix_operations"), "").unwrap();

    let catalog = Catalog::discover(&config);
    assert_eq!(catalog.len(), 8);

    let script = catalog.find("py_2_matrix_operations").unwrap();
    assert!(matches!(script.kind, ExampleKind::Script(_)));
    assert!(!script.is_native());

    let binary = catalog.select(8).unwrap();
    assert_eq!(binary.profile_name(), "cpp_2_matrix_operations");

    let builtin = catalog.find("1").unwrap();
    assert_eq!(builtin.profile_name(), "rs_1_basic_cpu");
}

/// A quick builtin demo runs to completion in-process
#[test]
fn test_quick_demo_runs() {
    let demo = cpuprof::workloads::find("1").unwrap();
    demo.execute(Scale::Quick).unwrap();
}

/// Sessions and ranges compose with the workloads
#[test]
fn test_session_with_annotations() {
    let mut session = ProfileSession::new().unwrap().quiet();
    let primes = session.measure("sieve", || {
        annotate("Sieve", Color::GREEN, || {
            cpuprof::workloads::cpu::prime_sieve(1_000)
        })
    });
    assert_eq!(primes.len(), 168);
    assert_eq!(session.results().len(), 1);
    assert_eq!(session.results()[0].name, "sieve");
}

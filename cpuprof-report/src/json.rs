//! JSON Output

use crate::report::ReportDocument;
use std::path::{Path, PathBuf};

/// Generate a prettified JSON report.
pub fn generate_json_report(report: &ReportDocument) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(report)
}

/// Write `profiling_report.json` into `reports_dir`
pub fn write_json_report(report: &ReportDocument, reports_dir: &Path) -> crate::Result<PathBuf> {
    std::fs::create_dir_all(reports_dir)?;
    let path = reports_dir.join("profiling_report.json");
    std::fs::write(&path, generate_json_report(report)?)?;
    Ok(path)
}

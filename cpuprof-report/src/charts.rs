//! SVG Charts
//!
//! Every chart is drawn with plotters' SVG backend into the reports
//! directory. The top-level functions return `Ok(None)` when the input has
//! nothing to draw, so callers can collect whatever was produced.
//!
//! Categorical axes are drawn on an `f64` range with one bar group centered
//! on each integer; the label formatter maps integers back to names.

use crate::comparison::{Comparison, ComparisonLabels, GroupedComparison};
use crate::stats::ProfileStats;
use crate::{ReportError, Result};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::path::{Path, PathBuf};

/// Result of drawing onto an SVG area
pub type DrawResult<T> = std::result::Result<T, DrawingAreaErrorKind<std::io::Error>>;

/// Drawing area of an SVG chart
pub type Area<'a> = DrawingArea<SVGBackend<'a>, Shift>;

const FASTER: RGBColor = RGBColor(0x2e, 0xcc, 0x71);
const SLOWER: RGBColor = RGBColor(0xe7, 0x4c, 0x3c);
const BASELINE: RGBColor = RGBColor(0x34, 0x98, 0xdb);
const CANDIDATE: RGBColor = RGBColor(0xe6, 0x7e, 0x22);
const SAMPLING_BASELINE: RGBColor = RGBColor(0x9b, 0x59, 0xb6);
const SAMPLING_CANDIDATE: RGBColor = RGBColor(0x1a, 0xbc, 0x9c);
const MATRIX_SPEEDUP: RGBColor = RGBColor(0x9b, 0x59, 0xb6);

/// Chart dimensions in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartSize {
    /// Width
    pub width: u32,
    /// Height
    pub height: u32,
}

impl Default for ChartSize {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 720,
        }
    }
}

/// One named series of a paired bar chart
#[derive(Debug, Clone, Copy)]
pub struct BarSeries<'a> {
    /// Legend label
    pub label: &'a str,
    /// One value per category
    pub values: &'a [f64],
    /// Fill color
    pub color: RGBColor,
}

fn render<F>(path: &Path, size: ChartSize, draw: F) -> Result<()>
where
    F: FnOnce(&Area<'_>) -> DrawResult<()>,
{
    let root = SVGBackend::new(path, (size.width, size.height)).into_drawing_area();
    let result = root
        .fill(&WHITE)
        .and_then(|_| draw(&root))
        .and_then(|_| root.present());

    result.map_err(|e| ReportError::Chart {
        chart: path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        message: e.to_string(),
    })
}

fn category_label(categories: &[String], x: f64) -> String {
    let idx = x.round();
    if (x - idx).abs() > 1e-6 || idx < 0.0 {
        return String::new();
    }
    categories.get(idx as usize).cloned().unwrap_or_default()
}

fn value_label_style() -> TextStyle<'static> {
    TextStyle::from(("sans-serif", 14).into_font()).pos(Pos::new(HPos::Center, VPos::Bottom))
}

fn max_or(values: impl Iterator<Item = f64>, floor: f64) -> f64 {
    values.fold(floor, f64::max)
}

fn draw_speedup_bars(
    area: &Area<'_>,
    caption: &str,
    y_desc: &str,
    categories: &[String],
    speedups: &[f64],
    color_of: &dyn Fn(f64) -> RGBColor,
    decimals: usize,
) -> DrawResult<()> {
    let n = categories.len() as f64;
    let y_max = max_or(speedups.iter().copied(), 1.0) * 1.2;

    let mut chart = ChartBuilder::on(area)
        .caption(caption, ("sans-serif", 24))
        .margin(15)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(-0.5f64..n - 0.5, 0f64..y_max)?;

    let fmt = |x: &f64| category_label(categories, *x);
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(categories.len())
        .x_label_formatter(&fmt)
        .y_desc(y_desc)
        .draw()?;

    chart.draw_series(speedups.iter().enumerate().map(|(i, &s)| {
        let x = i as f64;
        Rectangle::new([(x - 0.35, 0.0), (x + 0.35, s)], color_of(s).filled())
    }))?;

    // Dashed parity line at 1.0x
    let dash = 0.1;
    let mut segments = Vec::new();
    let mut x = -0.5;
    while x < n - 0.5 {
        segments.push((x, (x + dash).min(n - 0.5)));
        x += dash * 2.0;
    }
    chart.draw_series(segments.into_iter().map(|(x0, x1)| {
        PathElement::new(vec![(x0, 1.0), (x1, 1.0)], BLACK.mix(0.5).stroke_width(1))
    }))?;

    chart.draw_series(speedups.iter().enumerate().map(|(i, &s)| {
        Text::new(
            format!("{:.*}x", decimals, s),
            (i as f64, s),
            value_label_style(),
        )
    }))?;

    Ok(())
}

/// Speedup bars, green above parity and red below, with a dashed 1.0x line
pub fn speedup_chart(
    area: &Area<'_>,
    categories: &[String],
    speedups: &[f64],
    labels: &ComparisonLabels,
) -> DrawResult<()> {
    let y_desc = format!(
        "Speedup ({} vs {})",
        labels.candidate_label, labels.baseline_label
    );
    draw_speedup_bars(
        area,
        "Performance Speedup Comparison",
        &y_desc,
        categories,
        speedups,
        &|s: f64| if s > 1.0 { FASTER } else { SLOWER },
        2,
    )
}

/// Side-by-side bars for two series over the same categories
pub fn paired_bar_chart(
    area: &Area<'_>,
    caption: &str,
    y_desc: &str,
    categories: &[String],
    left: BarSeries<'_>,
    right: BarSeries<'_>,
) -> DrawResult<()> {
    let n = categories.len() as f64;
    let y_max = max_or(left.values.iter().chain(right.values).copied(), 0.0) * 1.15;
    let y_max = if y_max > 0.0 { y_max } else { 1.0 };
    let width = 0.35;

    let mut chart = ChartBuilder::on(area)
        .caption(caption, ("sans-serif", 24))
        .margin(15)
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d(-0.5f64..n - 0.5, 0f64..y_max)?;

    let fmt = |x: &f64| category_label(categories, *x);
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(categories.len())
        .x_label_formatter(&fmt)
        .y_desc(y_desc)
        .draw()?;

    for (series, offset) in [(left, -width / 2.0), (right, width / 2.0)] {
        let color = series.color;
        chart
            .draw_series(series.values.iter().enumerate().map(|(i, &v)| {
                let center = i as f64 + offset;
                Rectangle::new(
                    [(center - width / 2.0, 0.0), (center + width / 2.0, v)],
                    color.filled(),
                )
            }))?
            .label(series.label)
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 12, y + 5)], color.filled()));
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    Ok(())
}

/// Execution time per comparison, baseline next to candidate
pub fn execution_time_chart(
    area: &Area<'_>,
    comparisons: &[Comparison],
    labels: &ComparisonLabels,
) -> DrawResult<()> {
    let categories: Vec<String> = comparisons.iter().map(|c| c.title.clone()).collect();
    let baseline: Vec<f64> = comparisons.iter().map(Comparison::baseline_secs).collect();
    let candidate: Vec<f64> = comparisons.iter().map(Comparison::candidate_secs).collect();

    paired_bar_chart(
        area,
        "Execution Time Comparison",
        "Execution Time (seconds)",
        &categories,
        BarSeries {
            label: &labels.baseline_label,
            values: &baseline,
            color: BASELINE,
        },
        BarSeries {
            label: &labels.candidate_label,
            values: &candidate,
            color: CANDIDATE,
        },
    )
}

/// `performance_comparison.svg`: speedups above, execution times below
pub fn performance_comparison(
    comparisons: &[Comparison],
    labels: &ComparisonLabels,
    size: ChartSize,
    out_dir: &Path,
) -> Result<Option<PathBuf>> {
    if comparisons.is_empty() {
        return Ok(None);
    }

    let path = out_dir.join("performance_comparison.svg");
    let categories: Vec<String> = comparisons.iter().map(|c| c.title.clone()).collect();
    let speedups: Vec<f64> = comparisons.iter().map(|c| c.speedup).collect();

    render(&path, size, |root| {
        let (upper, lower) = root.split_vertically((size.height / 2) as i32);
        speedup_chart(&upper, &categories, &speedups, labels)?;
        execution_time_chart(&lower, comparisons, labels)
    })?;

    Ok(Some(path))
}

/// `cpu_sampling_comparison.svg`: samples per second where both sides have samples
pub fn sampling_rate_chart(
    comparisons: &[Comparison],
    labels: &ComparisonLabels,
    size: ChartSize,
    out_dir: &Path,
) -> Result<Option<PathBuf>> {
    let rows: Vec<(String, f64, f64)> = comparisons
        .iter()
        .filter_map(|c| {
            Some((
                c.title.clone(),
                c.baseline.samples_per_second()?,
                c.candidate.samples_per_second()?,
            ))
        })
        .collect();

    if rows.is_empty() {
        return Ok(None);
    }

    let path = out_dir.join("cpu_sampling_comparison.svg");
    let categories: Vec<String> = rows.iter().map(|r| r.0.clone()).collect();
    let baseline: Vec<f64> = rows.iter().map(|r| r.1).collect();
    let candidate: Vec<f64> = rows.iter().map(|r| r.2).collect();

    render(&path, size, |root| {
        paired_bar_chart(
            root,
            "CPU Sampling Rate Comparison",
            "CPU Samples per Second",
            &categories,
            BarSeries {
                label: &labels.baseline_label,
                values: &baseline,
                color: SAMPLING_BASELINE,
            },
            BarSeries {
                label: &labels.candidate_label,
                values: &candidate,
                color: SAMPLING_CANDIDATE,
            },
        )
    })?;

    Ok(Some(path))
}

/// `duration_comparison.svg`: every baseline profile, then every candidate profile
pub fn duration_chart(
    profiles: &[ProfileStats],
    labels: &ComparisonLabels,
    size: ChartSize,
    out_dir: &Path,
) -> Result<Option<PathBuf>> {
    let side = |pred: &dyn Fn(&str) -> bool| -> Vec<(String, f64)> {
        profiles
            .iter()
            .filter(|p| pred(&p.name))
            .filter_map(|p| Some((p.name.clone(), p.duration_secs?)))
            .collect()
    };
    let baseline = side(&|n: &str| labels.is_baseline(n));
    let candidate = side(&|n: &str| labels.is_candidate(n));

    if baseline.is_empty() && candidate.is_empty() {
        return Ok(None);
    }

    let path = out_dir.join("duration_comparison.svg");
    let categories: Vec<String> = baseline
        .iter()
        .chain(&candidate)
        .map(|(name, _)| name.clone())
        .collect();
    let n = categories.len() as f64;
    let y_max = max_or(baseline.iter().chain(&candidate).map(|(_, d)| *d), 0.0) * 1.15;
    let y_max = if y_max > 0.0 { y_max } else { 1.0 };

    render(&path, size, |root| {
        let mut chart = ChartBuilder::on(root)
            .caption("Execution Duration Comparison", ("sans-serif", 24))
            .margin(15)
            .x_label_area_size(60)
            .y_label_area_size(70)
            .build_cartesian_2d(-0.5f64..n - 0.5, 0f64..y_max)?;

        let fmt = |x: &f64| category_label(&categories, *x);
        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(categories.len())
            .x_label_formatter(&fmt)
            .x_desc("Profile Name")
            .y_desc("Duration (seconds)")
            .draw()?;

        let sides = [
            (&baseline, 0usize, BASELINE, labels.baseline_label.as_str()),
            (&candidate, baseline.len(), SLOWER, labels.candidate_label.as_str()),
        ];
        for (rows, start, color, label) in sides {
            if rows.is_empty() {
                continue;
            }
            chart
                .draw_series(rows.iter().enumerate().map(|(i, (_, d))| {
                    let x = (start + i) as f64;
                    Rectangle::new([(x - 0.4, 0.0), (x + 0.4, *d)], color.filled())
                }))?
                .label(label)
                .legend(move |(x, y)| {
                    Rectangle::new([(x, y - 5), (x + 12, y + 5)], color.filled())
                });
            chart.draw_series(rows.iter().enumerate().map(|(i, (_, d))| {
                Text::new(
                    format!("{:.2}s", d),
                    ((start + i) as f64, *d),
                    value_label_style(),
                )
            }))?;
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;
        Ok(())
    })?;

    Ok(Some(path))
}

/// `performance_matrix.svg`: grouped speedups left, grouped times right
pub fn performance_matrix(
    groups: &[GroupedComparison],
    labels: &ComparisonLabels,
    size: ChartSize,
    out_dir: &Path,
) -> Result<Option<PathBuf>> {
    if groups.is_empty() {
        return Ok(None);
    }

    let path = out_dir.join("performance_matrix.svg");
    let categories: Vec<String> = groups.iter().map(|g| g.test.clone()).collect();
    let speedups: Vec<f64> = groups.iter().map(|g| g.speedup).collect();
    let baseline: Vec<f64> = groups.iter().map(|g| g.baseline_secs).collect();
    let candidate: Vec<f64> = groups.iter().map(|g| g.candidate_secs).collect();
    let y_desc = format!(
        "Speedup Factor ({} vs {})",
        labels.candidate_label, labels.baseline_label
    );

    render(&path, size, |root| {
        let (left, right) = root.split_horizontally((size.width / 2) as i32);
        draw_speedup_bars(
            &left,
            "Performance Speedup Comparison",
            &y_desc,
            &categories,
            &speedups,
            &|_: f64| MATRIX_SPEEDUP,
            1,
        )?;
        paired_bar_chart(
            &right,
            "Execution Time Comparison",
            "Execution Time (seconds)",
            &categories,
            BarSeries {
                label: &labels.baseline_label,
                values: &baseline,
                color: BASELINE,
            },
            BarSeries {
                label: &labels.candidate_label,
                values: &candidate,
                color: SLOWER,
            },
        )
    })?;

    Ok(Some(path))
}

/// Shorten a symbol to 50 characters plus `...`
pub fn truncate_name(name: &str) -> String {
    if name.chars().count() > 50 {
        let head: String = name.chars().take(50).collect();
        format!("{}...", head)
    } else {
        name.to_string()
    }
}

/// `hot_functions_<name>.svg`: horizontal bars for the top `top_n` functions
pub fn hot_functions_chart(
    profile: &ProfileStats,
    top_n: usize,
    size: ChartSize,
    out_dir: &Path,
) -> Result<Option<PathBuf>> {
    let functions: Vec<_> = profile.top_functions.iter().take(top_n).collect();
    if functions.is_empty() {
        return Ok(None);
    }

    let path = out_dir.join(format!("hot_functions_{}.svg", profile.name));
    let n = functions.len();
    // Hottest function on top
    let names: Vec<String> = functions
        .iter()
        .rev()
        .map(|f| truncate_name(&f.name))
        .collect();
    let x_max = max_or(functions.iter().map(|f| f.percent), 1.0) * 1.15;
    let caption = format!("Top {} Hot Functions - {}", top_n, profile.name);

    render(&path, size, |root| {
        let mut chart = ChartBuilder::on(root)
            .caption(&caption, ("sans-serif", 24))
            .margin(15)
            .x_label_area_size(50)
            .y_label_area_size(340)
            .build_cartesian_2d(0f64..x_max, -0.5f64..n as f64 - 0.5)?;

        let fmt = |y: &f64| category_label(&names, *y);
        chart
            .configure_mesh()
            .disable_y_mesh()
            .y_labels(n)
            .y_label_formatter(&fmt)
            .x_desc("CPU Time (%)")
            .draw()?;

        chart.draw_series(functions.iter().enumerate().map(|(i, f)| {
            let y = (n - 1 - i) as f64;
            Rectangle::new([(0.0, y - 0.35), (f.percent, y + 0.35)], FASTER.filled())
        }))?;

        let label_style =
            TextStyle::from(("sans-serif", 14).into_font()).pos(Pos::new(HPos::Left, VPos::Center));
        chart.draw_series(functions.iter().enumerate().map(|(i, f)| {
            Text::new(
                format!("{:.1}%", f.percent),
                (f.percent + x_max * 0.01, (n - 1 - i) as f64),
                label_style.clone(),
            )
        }))?;
        Ok(())
    })?;

    Ok(Some(path))
}

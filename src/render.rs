/// Plain-text rendering of a `SiteReport` for the terminal.
///
/// Temperatures print with one decimal, matching the heatmap annotations
/// of the dashboards. Empty heatmap cells print as `-`.

use std::fmt::Write;

use crate::analysis::{SnapshotMatrix, TimeSeries, WeeklyExtremes, WeeklySummary};
use crate::report::{Section, SiteReport};

const EMPTY_CELL: &str = "-";

fn fmt_temp(value: f64) -> String {
    format!("{:.1}", value)
}

/// Module × hour table.
pub fn render_snapshot(matrix: &SnapshotMatrix) -> String {
    let label_width = matrix
        .module_ids
        .iter()
        .map(|id| id.chars().count())
        .max()
        .unwrap_or(0)
        .max("module".len());

    let mut out = String::new();
    let _ = writeln!(out, "Module × hour mean temperature at {}", matrix.timestamp);
    let _ = write!(out, "{:<width$}", "module", width = label_width);
    for hour in &matrix.hours {
        let _ = write!(out, " {:>6}", format!("{:02}h", hour));
    }
    out.push('\n');

    for (module_id, row) in matrix.module_ids.iter().zip(&matrix.cells) {
        // `{:<width$}` pads by chars, which is what we measured above.
        let _ = write!(out, "{:<width$}", module_id, width = label_width);
        for cell in row {
            let text = cell.map(fmt_temp).unwrap_or_else(|| EMPTY_CELL.to_string());
            let _ = write!(out, " {:>6}", text);
        }
        out.push('\n');
    }
    out
}

/// Date / daily mean / overall mean / module mean table.
pub fn render_weekly_summary(summary: &WeeklySummary) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Window {} .. {}",
        summary.window_start, summary.window_end
    );
    let _ = writeln!(
        out,
        "{:<10}  {:>10}  {:>12}  {:>11}",
        "date", "daily mean", "overall mean", "module mean"
    );
    for row in summary.rows() {
        let _ = writeln!(
            out,
            "{:<10}  {:>10}  {:>12}  {:>11}",
            row.date.to_string(),
            fmt_temp(row.daily_mean),
            fmt_temp(row.overall_mean),
            fmt_temp(row.module_mean)
        );
    }
    out
}

/// Hottest / coldest reading table.
pub fn render_extremes(extremes: &WeeklyExtremes) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{:<8}  {:>11}  {:<10}  {}", "", "temperature", "date", "module");
    for (label, r) in [("highest", &extremes.max), ("lowest", &extremes.min)] {
        let _ = writeln!(
            out,
            "{:<8}  {:>11}  {:<10}  {}",
            label,
            fmt_temp(r.temperature),
            r.date.to_string(),
            r.module_id
        );
    }
    out
}

pub fn render_series(series: &TimeSeries) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Series ({}), {} points", series.mode, series.points.len());
    for p in &series.points {
        match &p.module_id {
            Some(module) => {
                let _ = writeln!(out, "{}  {:>6}  {}", p.at, fmt_temp(p.temperature), module);
            }
            None => {
                let _ = writeln!(out, "{}  {:>6}", p.at.date(), fmt_temp(p.temperature));
            }
        }
    }
    out
}

fn render_section<T>(out: &mut String, title: &str, section: &Section<T>, body: impl Fn(&T) -> String) {
    let _ = writeln!(out, "\n{}", title);
    match section {
        Section::Ready(value) => out.push_str(&body(value)),
        Section::Warning(msg) => {
            let _ = writeln!(out, "⚠ {}", msg);
        }
    }
}

/// Full report, one section after another.
pub fn render_report(report: &SiteReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "📍 {} ({} readings)", report.site, report.row_count);

    render_section(&mut out, "🌡️  Latest snapshot", &report.snapshot, render_snapshot);
    render_section(&mut out, "📅 Weekly averages", &report.weekly_summary, render_weekly_summary);
    render_section(&mut out, "📈 Weekly extremes", &report.weekly_extremes, render_extremes);
    if let Some(series) = &report.series {
        render_section(&mut out, "📉 Time series", series, render_series);
    }
    out
}

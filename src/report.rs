/// Per-site report: every summary section for one site selection.
///
/// Each section is computed independently. A section whose computation
/// fails (no rows for the site, an empty window) becomes a warning and the
/// rest of the report is still produced. The CLI and the HTTP endpoint both
/// render this structure.

use serde::Serialize;
use tracing::warn;

use crate::analysis::{
    SeriesMode, SnapshotMatrix, TimeSeries, WeeklyExtremes, WeeklySummary, WeeklyWindow,
    latest_snapshot_matrix, time_series, weekly_extremes, weekly_summary,
};
use crate::config::ServiceConfig;
use crate::model::{Anchor, ReadingTable, SummaryError};

/// A computed section, or the warning shown in its place.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Section<T> {
    #[serde(rename = "data")]
    Ready(T),
    Warning(String),
}

impl<T> Section<T> {
    /// Wraps an engine result, logging a warning for the failed case.
    pub fn from_result(site: &str, section: &str, result: Result<T, SummaryError>) -> Self {
        match result {
            Ok(value) => Section::Ready(value),
            Err(e) => {
                warn!(site, section, error = %e, "section unavailable");
                Section::Warning(e.to_string())
            }
        }
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            Section::Ready(value) => Some(value),
            Section::Warning(_) => None,
        }
    }

    pub fn warning(&self) -> Option<&str> {
        match self {
            Section::Ready(_) => None,
            Section::Warning(msg) => Some(msg),
        }
    }
}

/// Query parameters shared by every section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportOptions {
    pub anchor: Anchor,
    pub window_days: i64,
    /// Chart series to include, if any.
    pub series: Option<SeriesMode>,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            anchor: Anchor::SiteLatest,
            window_days: crate::analysis::weekly::DEFAULT_WINDOW_DAYS,
            series: None,
        }
    }
}

impl From<&ServiceConfig> for ReportOptions {
    fn from(config: &ServiceConfig) -> Self {
        ReportOptions {
            anchor: config.summary.anchor.into(),
            window_days: config.summary.window_days,
            series: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SiteReport {
    pub site: String,
    pub row_count: usize,
    pub snapshot: Section<SnapshotMatrix>,
    pub weekly_summary: Section<WeeklySummary>,
    pub weekly_extremes: Section<WeeklyExtremes>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub series: Option<Section<TimeSeries>>,
}

impl SiteReport {
    /// Warnings from every failed section, in display order.
    pub fn warnings(&self) -> Vec<&str> {
        let mut out = vec![
            self.snapshot.warning(),
            self.weekly_summary.warning(),
            self.weekly_extremes.warning(),
        ];
        if let Some(series) = &self.series {
            out.push(series.warning());
        }
        out.into_iter().flatten().collect()
    }
}

/// Runs every section for `site`.
pub fn build_site_report(table: &ReadingTable, site: &str, options: &ReportOptions) -> SiteReport {
    let window = WeeklyWindow::new(options.anchor, options.window_days);

    SiteReport {
        site: site.to_string(),
        row_count: table.for_site(site).count(),
        snapshot: Section::from_result(site, "snapshot", latest_snapshot_matrix(table, site, options.anchor)),
        weekly_summary: Section::from_result(site, "weekly_summary", weekly_summary(table, site, &window)),
        weekly_extremes: Section::from_result(site, "weekly_extremes", weekly_extremes(table, site, &window)),
        series: options
            .series
            .map(|mode| Section::from_result(site, "series", time_series(table, site, mode, options.anchor))),
    }
}

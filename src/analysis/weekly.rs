/// Rolling-window summary and extremes.
///
/// Both operations look at the selected site's rows inside
/// `[end - days, end]` (inclusive at both ends), where `end` comes from the
/// window's `Anchor`.
///
/// `WeeklySummary` carries two different averages on purpose:
/// - `overall_mean` weights every row equally;
/// - `module_mean_of_means` averages each module first, then averages those
///   per-module means, so every module counts once no matter how many rows
///   it reported.
///
/// They agree only when every module has the same row count. Dashboards show
/// both columns, so neither may be folded into the other.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::Serialize;
use tracing::debug;

use crate::analysis::groupings::{ModuleKey, group_by, mean, mean_temperature, window_start, within};
use crate::model::{Anchor, Reading, ReadingTable, SummaryError};

/// Default look-back, in days.
pub const DEFAULT_WINDOW_DAYS: i64 = 7;

/// Longest look-back accepted from configuration or the command line.
pub const MAX_WINDOW_DAYS: i64 = 36_500;

/// A look-back window ending at an anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeeklyWindow {
    pub anchor: Anchor,
    pub days: i64,
}

impl Default for WeeklyWindow {
    fn default() -> Self {
        Self {
            anchor: Anchor::SiteLatest,
            days: DEFAULT_WINDOW_DAYS,
        }
    }
}

impl WeeklyWindow {
    pub fn new(anchor: Anchor, days: i64) -> Self {
        Self { anchor, days }
    }

    /// Resolves `(start, end)` for `site`. A start earlier than chrono can
    /// represent clamps to `NaiveDateTime::MIN`.
    pub fn bounds(&self, table: &ReadingTable, site: &str) -> Option<(NaiveDateTime, NaiveDateTime)> {
        let end = self.anchor.resolve(table, site)?;
        let start = match Duration::try_days(self.days) {
            Some(span) => window_start(end, span),
            None if self.days > 0 => NaiveDateTime::MIN,
            None => NaiveDateTime::MAX,
        };
        Some((start, end))
    }
}

/// One calendar date inside the window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyAverage {
    pub date: NaiveDate,
    pub mean: f64,
    pub count: usize,
}

/// Mean temperature of one module inside the window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModuleAverage {
    pub module_id: String,
    pub mean: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklySummary {
    pub site: String,
    pub window_start: NaiveDateTime,
    pub window_end: NaiveDateTime,
    /// One entry per date present in the window, ascending.
    pub daily: Vec<DailyAverage>,
    /// Row-weighted mean over the whole window.
    pub overall_mean: f64,
    /// Per-module means, in natural module order.
    pub modules: Vec<ModuleAverage>,
    /// Unweighted mean of `modules[..].mean`.
    pub module_mean_of_means: f64,
}

/// The summary table as the dashboard lays it out: one row per date, with
/// the two window-wide scalars repeated on each row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow {
    pub date: NaiveDate,
    pub daily_mean: f64,
    pub overall_mean: f64,
    pub module_mean: f64,
}

impl WeeklySummary {
    pub fn rows(&self) -> Vec<SummaryRow> {
        self.daily
            .iter()
            .map(|d| SummaryRow {
                date: d.date,
                daily_mean: d.mean,
                overall_mean: self.overall_mean,
                module_mean: self.module_mean_of_means,
            })
            .collect()
    }
}

/// A single extreme reading.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtremeReading {
    pub temperature: f64,
    pub date: NaiveDate,
    pub module_id: String,
    pub timestamp: NaiveDateTime,
    /// Table position of the source row.
    pub row: usize,
}

impl From<&Reading> for ExtremeReading {
    fn from(r: &Reading) -> Self {
        ExtremeReading {
            temperature: r.temperature,
            date: r.date(),
            module_id: r.module_id.clone(),
            timestamp: r.timestamp,
            row: r.row,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklyExtremes {
    pub site: String,
    pub window_start: NaiveDateTime,
    pub window_end: NaiveDateTime,
    pub max: ExtremeReading,
    pub min: ExtremeReading,
}

// ---------------------------------------------------------------------------
// Window selection
// ---------------------------------------------------------------------------

/// Site rows inside the window, in table order, plus the resolved bounds.
fn window_rows<'a>(
    table: &'a ReadingTable,
    site: &str,
    window: &WeeklyWindow,
) -> Result<(Vec<&'a Reading>, NaiveDateTime, NaiveDateTime), SummaryError> {
    let site_rows: Vec<&Reading> = table.for_site(site).collect();
    if site_rows.is_empty() {
        return Err(SummaryError::EmptySelection(site.to_string()));
    }
    let (start, end) = window
        .bounds(table, site)
        .ok_or_else(|| SummaryError::EmptySelection(site.to_string()))?;

    let rows = within(&site_rows, start, end);
    debug!(site, %start, %end, rows = rows.len(), "selected window rows");
    if rows.is_empty() {
        return Err(SummaryError::EmptyWindow {
            site: site.to_string(),
            start,
            end,
        });
    }
    Ok((rows, start, end))
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// Daily, overall and per-module averages for `site` over the window.
///
/// # Errors
/// - `EmptySelection` — the site has no rows.
/// - `EmptyWindow` — no site rows fall inside the window.
pub fn weekly_summary(
    table: &ReadingTable,
    site: &str,
    window: &WeeklyWindow,
) -> Result<WeeklySummary, SummaryError> {
    let (rows, window_start, window_end) = window_rows(table, site, window)?;

    let daily: Vec<DailyAverage> = group_by(&rows, |r| r.date())
        .into_iter()
        .filter_map(|(date, group)| {
            mean_temperature(&group).map(|mean| DailyAverage {
                date,
                mean,
                count: group.len(),
            })
        })
        .collect();

    let modules: Vec<ModuleAverage> = group_by(&rows, |r| ModuleKey(r.module_id.clone()))
        .into_iter()
        .filter_map(|(ModuleKey(module_id), group)| {
            mean_temperature(&group).map(|mean| ModuleAverage {
                module_id,
                mean,
                count: group.len(),
            })
        })
        .collect();

    // Both are defined: `rows` is non-empty, so there is at least one
    // date and one module.
    let overall_mean = mean_temperature(&rows).unwrap_or(f64::NAN);
    let module_mean_of_means = mean(modules.iter().map(|m| m.mean)).unwrap_or(f64::NAN);

    Ok(WeeklySummary {
        site: site.to_string(),
        window_start,
        window_end,
        daily,
        overall_mean,
        modules,
        module_mean_of_means,
    })
}

/// Hottest and coldest reading for `site` in the window.
///
/// Ties resolve to the first occurrence in table order.
///
/// # Errors
/// - `EmptySelection` — the site has no rows.
/// - `EmptyWindow` — no site rows fall inside the window.
pub fn weekly_extremes(
    table: &ReadingTable,
    site: &str,
    window: &WeeklyWindow,
) -> Result<WeeklyExtremes, SummaryError> {
    let (rows, window_start, window_end) = window_rows(table, site, window)?;

    let mut max = rows[0];
    let mut min = rows[0];
    for &r in &rows[1..] {
        if r.temperature > max.temperature {
            max = r;
        }
        if r.temperature < min.temperature {
            min = r;
        }
    }

    Ok(WeeklyExtremes {
        site: site.to_string(),
        window_start,
        window_end,
        max: max.into(),
        min: min.into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InputConfig;
    use crate::ingest::{csv::parse_table, fixtures::*};

    fn parse(text: &str) -> ReadingTable {
        parse_table(text, &InputConfig::default()).expect("fixture should parse")
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // --- Summary ------------------------------------------------------------

    #[test]
    fn test_summary_reference_example() {
        let table = parse(fixture_spec_example_csv());
        let summary = weekly_summary(&table, "SiteA", &WeeklyWindow::default()).unwrap();

        assert_eq!(summary.daily.len(), 2);
        assert_eq!(summary.daily[0].date, date(2024, 1, 1));
        assert!((summary.daily[0].mean - 21.0).abs() < 1e-9);
        assert_eq!(summary.daily[1].date, date(2024, 1, 2));
        assert!((summary.daily[1].mean - 30.0).abs() < 1e-9);
        assert!((summary.overall_mean - 24.0).abs() < 1e-9);
        // M1: (20 + 30) / 2 = 25, M2: 22 → (25 + 22) / 2
        assert!((summary.module_mean_of_means - 23.5).abs() < 1e-9);
    }

    #[test]
    fn test_summary_window_excludes_older_rows() {
        let table = parse(fixture_two_sites_csv());
        let summary = weekly_summary(&table, "SiteA", &WeeklyWindow::default()).unwrap();

        let dates: Vec<NaiveDate> = summary.daily.iter().map(|d| d.date).collect();
        assert_eq!(dates, vec![date(2024, 1, 2), date(2024, 1, 5), date(2024, 1, 8), date(2024, 1, 9)]);
        assert!((summary.daily[3].mean - 23.9).abs() < 1e-9);
        assert_eq!(summary.daily[3].count, 5);
        assert!((summary.overall_mean - 23.5).abs() < 1e-9);
    }

    #[test]
    fn test_module_mean_of_means_differs_from_overall_mean() {
        let table = parse(fixture_two_sites_csv());
        let summary = weekly_summary(&table, "SiteA", &WeeklyWindow::default()).unwrap();

        let ids: Vec<&str> = summary.modules.iter().map(|m| m.module_id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "10"]);
        assert!((summary.modules[0].mean - 26.5).abs() < 1e-9);
        assert!((summary.modules[1].mean - 22.8).abs() < 1e-9);
        assert!((summary.modules[2].mean - 21.0).abs() < 1e-9);

        let expected = (26.5 + 22.8 + 21.0) / 3.0;
        assert!((summary.module_mean_of_means - expected).abs() < 1e-9);
        assert!((summary.module_mean_of_means - summary.overall_mean).abs() > 0.01);
    }

    #[test]
    fn test_summary_rows_repeat_window_scalars() {
        let table = parse(fixture_spec_example_csv());
        let summary = weekly_summary(&table, "SiteA", &WeeklyWindow::default()).unwrap();
        let rows = summary.rows();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| (r.overall_mean - 24.0).abs() < 1e-9));
        assert!(rows.iter().all(|r| (r.module_mean - 23.5).abs() < 1e-9));
    }

    #[test]
    fn test_daily_means_reconstruct_full_groupby_when_window_covers_table() {
        let table = parse(fixture_two_sites_csv());
        let window = WeeklyWindow::new(Anchor::SiteLatest, 3650);
        let summary = weekly_summary(&table, "SiteA", &window).unwrap();

        let rows: Vec<&Reading> = table.for_site("SiteA").collect();
        let direct = group_by(&rows, |r| r.date());
        assert_eq!(summary.daily.len(), direct.len());
        for d in &summary.daily {
            let group = &direct[&d.date];
            let sum: f64 = group.iter().map(|r| r.temperature).sum();
            assert_eq!(d.count, group.len());
            assert!((d.mean * d.count as f64 - sum).abs() < 1e-9);
        }

        let weighted: f64 = summary.daily.iter().map(|d| d.mean * d.count as f64).sum();
        let total: usize = summary.daily.iter().map(|d| d.count).sum();
        assert!((weighted / total as f64 - summary.overall_mean).abs() < 1e-9);
    }

    #[test]
    fn test_table_anchor_window_for_lagging_site() {
        // SiteB's last row is 01-02; anchored to the table's 01-09 the
        // window starts exactly at 01-02 and still includes it.
        let table = parse(fixture_two_sites_csv());
        let window = WeeklyWindow::new(Anchor::TableLatest, 7);
        let summary = weekly_summary(&table, "SiteB", &window).unwrap();
        assert_eq!(summary.daily.len(), 1);
        assert!((summary.overall_mean - 12.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_window_reported() {
        let table = parse(fixture_two_sites_csv());
        let window = WeeklyWindow::new(Anchor::TableLatest, 6);
        let result = weekly_summary(&table, "SiteB", &window);
        assert!(matches!(result, Err(SummaryError::EmptyWindow { .. })));

        let result = weekly_extremes(&table, "SiteB", &window);
        assert!(matches!(result, Err(SummaryError::EmptyWindow { .. })));
    }

    #[test]
    fn test_unknown_site_reported() {
        let table = parse(fixture_two_sites_csv());
        let result = weekly_summary(&table, "Nowhere", &WeeklyWindow::default());
        assert_eq!(result, Err(SummaryError::EmptySelection("Nowhere".to_string())));
    }

    // --- Extremes -----------------------------------------------------------

    #[test]
    fn test_extremes_reference_example() {
        let table = parse(fixture_spec_example_csv());
        let extremes = weekly_extremes(&table, "SiteA", &WeeklyWindow::default()).unwrap();

        assert!((extremes.max.temperature - 30.0).abs() < 1e-9);
        assert_eq!(extremes.max.date, date(2024, 1, 2));
        assert_eq!(extremes.max.module_id, "M1");

        assert!((extremes.min.temperature - 20.0).abs() < 1e-9);
        assert_eq!(extremes.min.date, date(2024, 1, 1));
        assert_eq!(extremes.min.module_id, "M1");
    }

    #[test]
    fn test_extremes_bound_every_window_value() {
        let table = parse(fixture_two_sites_csv());
        let window = WeeklyWindow::default();
        let extremes = weekly_extremes(&table, "SiteA", &window).unwrap();
        let (start, end) = window.bounds(&table, "SiteA").unwrap();

        let in_window: Vec<&Reading> = table
            .for_site("SiteA")
            .filter(|r| r.timestamp >= start && r.timestamp <= end)
            .collect();
        for r in &in_window {
            assert!(extremes.max.temperature >= r.temperature);
            assert!(extremes.min.temperature <= r.temperature);
        }
        assert!(in_window.iter().any(|r| r.row == extremes.max.row));
        assert!(in_window.iter().any(|r| r.row == extremes.min.row));

        // 18.0 on 01-01 is outside the window.
        assert!((extremes.min.temperature - 19.0).abs() < 1e-9);
        assert_eq!(extremes.min.date, date(2024, 1, 2));
        assert!((extremes.max.temperature - 27.5).abs() < 1e-9);
        assert_eq!(extremes.max.module_id, "1");
    }

    #[test]
    fn test_extremes_ties_resolve_to_first_occurrence() {
        let text = "날짜,통합국명,모듈번호,hh,온도\n\
                    2024-06-01,S,7,0,5.0\n\
                    2024-06-02,S,8,0,9.0\n\
                    2024-06-03,S,9,0,9.0\n\
                    2024-06-04,S,3,0,5.0\n";
        let table = parse(text);
        let extremes = weekly_extremes(&table, "S", &WeeklyWindow::default()).unwrap();
        assert_eq!(extremes.max.module_id, "8");
        assert_eq!(extremes.max.row, 1);
        assert_eq!(extremes.min.module_id, "7");
        assert_eq!(extremes.min.row, 0);
    }

    #[test]
    fn test_oversized_window_clamps_instead_of_overflowing() {
        let table = parse(fixture_two_sites_csv());
        for days in [100_000_000, i64::MAX] {
            let window = WeeklyWindow::new(Anchor::SiteLatest, days);
            let summary = weekly_summary(&table, "SiteA", &window).unwrap();
            assert_eq!(summary.window_start, NaiveDateTime::MIN);
            assert_eq!(summary.daily.len(), 5);
            assert!(weekly_extremes(&table, "SiteA", &window).is_ok());
        }
    }

    #[test]
    fn test_reading_at_earliest_date_does_not_overflow_window() {
        let table = parse("날짜,통합국명,모듈번호,hh,온도\n-262143-01-01,S,1,0,4.0\n");
        let summary = weekly_summary(&table, "S", &WeeklyWindow::default()).unwrap();
        assert_eq!(summary.daily.len(), 1);
        assert!(summary.window_start <= table.readings[0].timestamp);
        assert!(weekly_extremes(&table, "S", &WeeklyWindow::default()).is_ok());
    }

    #[test]
    fn test_single_row_window_is_both_extremes() {
        let table = parse(fixture_two_sites_csv());
        let window = WeeklyWindow::new(Anchor::SiteLatest, 0);
        let extremes = weekly_extremes(&table, "SiteB", &window).unwrap();
        assert_eq!(extremes.max, extremes.min);
    }
}

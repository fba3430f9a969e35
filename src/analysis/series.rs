/// Chart-ready time series for a site.
///
/// One parameterized operation covers every chart window the dashboards
/// offered. Points come back ordered by timestamp (rows sharing a timestamp
/// keep table order). Nothing is resampled or interpolated: a day without
/// readings is simply absent from the series.

use chrono::{Duration, NaiveDateTime};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use crate::analysis::groupings::{group_by, window_start, within};
use crate::model::{Anchor, Reading, ReadingTable, SummaryError};

/// Which slice of the site's history to chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum SeriesMode {
    /// Every reading
    All,
    /// Readings in the 24 hours up to the reference time
    #[value(name = "last24h")]
    #[serde(rename = "last24h")]
    Last24h,
    /// Readings in the 14 days up to the reference time
    #[value(name = "last14d")]
    #[serde(rename = "last14d")]
    Last14d,
    /// Maximum temperature per calendar date
    DailyMax,
}

impl SeriesMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeriesMode::All => "all",
            SeriesMode::Last24h => "last24h",
            SeriesMode::Last14d => "last14d",
            SeriesMode::DailyMax => "daily-max",
        }
    }

    /// Look-back span for the windowed modes.
    fn span(&self) -> Option<Duration> {
        match self {
            SeriesMode::Last24h => Some(Duration::hours(24)),
            SeriesMode::Last14d => Some(Duration::days(14)),
            SeriesMode::All | SeriesMode::DailyMax => None,
        }
    }
}

impl fmt::Display for SeriesMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SeriesMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(SeriesMode::All),
            "last24h" => Ok(SeriesMode::Last24h),
            "last14d" => Ok(SeriesMode::Last14d),
            "daily-max" | "daily_max" | "dailymax" => Ok(SeriesMode::DailyMax),
            other => Err(format!(
                "unknown series mode '{}' (expected all, last24h, last14d or daily-max)",
                other
            )),
        }
    }
}

/// One chart point. For `DailyMax`, `at` is the date's midnight and
/// `module_id` is `None`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub at: NaiveDateTime,
    pub module_id: Option<String>,
    pub temperature: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeries {
    pub site: String,
    pub mode: SeriesMode,
    pub points: Vec<SeriesPoint>,
}

/// Builds the series for `site` in `mode`. The anchor only matters for the
/// windowed modes.
///
/// # Errors
/// - `EmptySelection` — the site has no rows.
/// - `EmptyWindow` — a windowed mode selected no rows.
pub fn time_series(
    table: &ReadingTable,
    site: &str,
    mode: SeriesMode,
    anchor: Anchor,
) -> Result<TimeSeries, SummaryError> {
    let site_rows: Vec<&Reading> = table.for_site(site).collect();
    if site_rows.is_empty() {
        return Err(SummaryError::EmptySelection(site.to_string()));
    }

    let mut rows = match mode.span() {
        Some(span) => {
            let end = anchor
                .resolve(table, site)
                .ok_or_else(|| SummaryError::EmptySelection(site.to_string()))?;
            let start = window_start(end, span);
            let rows = within(&site_rows, start, end);
            if rows.is_empty() {
                return Err(SummaryError::EmptyWindow {
                    site: site.to_string(),
                    start,
                    end,
                });
            }
            rows
        }
        None => site_rows,
    };
    // Stable: equal timestamps keep table order.
    rows.sort_by_key(|r| r.timestamp);

    let points: Vec<SeriesPoint> = match mode {
        SeriesMode::DailyMax => group_by(&rows, |r| r.date())
            .into_iter()
            .filter_map(|(date, group)| {
                let max = group.iter().map(|r| r.temperature).fold(f64::NEG_INFINITY, f64::max);
                date.and_hms_opt(0, 0, 0).map(|at| SeriesPoint {
                    at,
                    module_id: None,
                    temperature: max,
                })
            })
            .collect(),
        _ => rows
            .iter()
            .map(|r| SeriesPoint {
                at: r.timestamp,
                module_id: Some(r.module_id.clone()),
                temperature: r.temperature,
            })
            .collect(),
    };

    debug!(site, mode = %mode, points = points.len(), "built time series");

    Ok(TimeSeries {
        site: site.to_string(),
        mode,
        points,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ColumnConfig, InputConfig};
    use crate::ingest::{csv::parse_table, fixtures::*};
    use chrono::NaiveDate;

    fn plant() -> ReadingTable {
        let config = InputConfig {
            columns: ColumnConfig {
                timestamp: "timestamp".to_string(),
                site_name: "site".to_string(),
                module_id: "module".to_string(),
                hour_of_day: "hour".to_string(),
                temperature: "temp".to_string(),
            },
            ..InputConfig::default()
        };
        parse_table(fixture_plant_datetime_csv(), &config).expect("fixture should parse")
    }

    fn at(d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap().and_hms_opt(h, 0, 0).unwrap()
    }

    #[test]
    fn test_all_mode_returns_every_row_in_time_order() {
        let series = time_series(&plant(), "Plant", SeriesMode::All, Anchor::SiteLatest).unwrap();
        assert_eq!(series.points.len(), 7);
        assert!(series.points.windows(2).all(|w| w[0].at <= w[1].at));
    }

    #[test]
    fn test_equal_timestamps_keep_table_order() {
        let series = time_series(&plant(), "Plant", SeriesMode::All, Anchor::SiteLatest).unwrap();
        let same: Vec<&str> = series
            .points
            .iter()
            .filter(|p| p.at == at(15, 6))
            .map(|p| p.module_id.as_deref().unwrap())
            .collect();
        assert_eq!(same, vec!["A", "B"]);
    }

    #[test]
    fn test_last24h_window_is_inclusive() {
        let series = time_series(&plant(), "Plant", SeriesMode::Last24h, Anchor::SiteLatest).unwrap();
        let temps: Vec<f64> = series.points.iter().map(|p| p.temperature).collect();
        assert_eq!(temps, vec![11.0, 8.0, 6.0, 12.0]);
        assert_eq!(series.points[0].at, at(14, 23));
    }

    #[test]
    fn test_last14d_window_starts_exactly_fourteen_days_back() {
        let series = time_series(&plant(), "Plant", SeriesMode::Last14d, Anchor::SiteLatest).unwrap();
        assert_eq!(series.points.len(), 6);
        // 03-01 12:00 is exactly 14 days before 03-15 12:00; 03-01 00:00 is not.
        assert_eq!(series.points[0].at, at(1, 12));
    }

    #[test]
    fn test_daily_max_keeps_gaps() {
        let series = time_series(&plant(), "Plant", SeriesMode::DailyMax, Anchor::SiteLatest).unwrap();
        let days: Vec<(NaiveDateTime, f64)> = series.points.iter().map(|p| (p.at, p.temperature)).collect();
        assert_eq!(
            days,
            vec![(at(1, 0), 7.0), (at(10, 0), 9.0), (at(14, 0), 11.0), (at(15, 0), 12.0)]
        );
        assert!(series.points.iter().all(|p| p.module_id.is_none()));
    }

    #[test]
    fn test_windowed_mode_with_no_rows_is_empty_window() {
        let anchor = Anchor::At(at(20, 0) + Duration::days(30));
        let result = time_series(&plant(), "Plant", SeriesMode::Last24h, anchor);
        assert!(matches!(result, Err(SummaryError::EmptyWindow { .. })));
    }

    #[test]
    fn test_windowed_mode_near_earliest_date() {
        let text = "날짜,통합국명,모듈번호,hh,온도\n-262143-01-01,S,1,0,4.0\n";
        let table = parse_table(text, &InputConfig::default()).unwrap();
        for mode in [SeriesMode::Last24h, SeriesMode::Last14d] {
            let series = time_series(&table, "S", mode, Anchor::SiteLatest).unwrap();
            assert_eq!(series.points.len(), 1);
        }
    }

    #[test]
    fn test_unknown_site_is_empty_selection() {
        let result = time_series(&plant(), "Elsewhere", SeriesMode::All, Anchor::SiteLatest);
        assert_eq!(result, Err(SummaryError::EmptySelection("Elsewhere".to_string())));
    }

    #[test]
    fn test_mode_names_round_trip() {
        for mode in [SeriesMode::All, SeriesMode::Last24h, SeriesMode::Last14d, SeriesMode::DailyMax] {
            assert_eq!(mode.as_str().parse::<SeriesMode>(), Ok(mode));
        }
        assert!("hourly".parse::<SeriesMode>().is_err());
    }

    #[test]
    fn test_mode_serializes_as_query_name() {
        assert_eq!(serde_json::to_string(&SeriesMode::DailyMax).unwrap(), "\"daily-max\"");
        assert_eq!(serde_json::to_string(&SeriesMode::Last24h).unwrap(), "\"last24h\"");
    }
}

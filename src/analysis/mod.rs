/// Temperature summary engine.
///
/// Every operation is a pure function of `(table, site, window)`; nothing is
/// cached between calls.
///
/// Submodules:
/// - `groupings` — per-site grouping and shared aggregation helpers.
/// - `snapshot`  — module × hour heatmap at the latest timestamp.
/// - `weekly`    — rolling-window averages and extremes.
/// - `series`    — chart series for the selectable time windows.

pub mod groupings;
pub mod series;
pub mod snapshot;
pub mod weekly;

pub use series::{SeriesMode, SeriesPoint, TimeSeries, time_series};
pub use snapshot::{SnapshotMatrix, latest_snapshot_matrix};
pub use weekly::{WeeklyExtremes, WeeklySummary, WeeklyWindow, weekly_extremes, weekly_summary};

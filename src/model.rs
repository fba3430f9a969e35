/// Core data types for the temperature summary service.
///
/// This module defines the shared domain model imported by all other modules:
/// the parsed `Reading`, the `ReadingTable` it lives in, the `Anchor` that
/// fixes a query's reference time, and the `SummaryError` taxonomy.
/// It contains no I/O.

use chrono::NaiveDateTime;
use serde::Serialize;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Reading types
// ---------------------------------------------------------------------------

/// A single temperature measurement: one data row of the uploaded table.
///
/// `raw` holds the exact source bytes of the record, including its line
/// terminator, so a site's subset can be written back out unchanged.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reading {
    /// Position among data rows (0-based, header excluded).
    pub row: usize,
    pub timestamp: NaiveDateTime,
    pub site_name: String,
    pub module_id: String,
    pub hour_of_day: u8,
    pub temperature: f64, // °C
    #[serde(skip)]
    pub raw: String,
}

impl Reading {
    pub fn date(&self) -> chrono::NaiveDate {
        self.timestamp.date()
    }
}

/// Parsed, validated input table. Immutable once loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadingTable {
    /// Header record exactly as it appeared (BOM stripped, terminator kept).
    pub header: String,
    pub readings: Vec<Reading>,
    /// Terminator used when the source's last record had none.
    pub line_ending: &'static str,
    pub has_bom: bool,
}

impl ReadingTable {
    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    /// Rows belonging to `site`, in table order.
    pub fn for_site<'a, 's>(&'a self, site: &'s str) -> impl Iterator<Item = &'a Reading> + use<'a, 's> {
        self.readings.iter().filter(move |r| r.site_name == site)
    }

    /// Latest timestamp anywhere in the table.
    pub fn latest_timestamp(&self) -> Option<NaiveDateTime> {
        self.readings.iter().map(|r| r.timestamp).max()
    }

    /// Latest timestamp among `site`'s rows.
    pub fn latest_for_site(&self, site: &str) -> Option<NaiveDateTime> {
        self.for_site(site).map(|r| r.timestamp).max()
    }
}

// ---------------------------------------------------------------------------
// Query parameters
// ---------------------------------------------------------------------------

/// Reference time a query is measured back from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Anchor {
    /// Latest timestamp among the selected site's rows.
    #[default]
    SiteLatest,
    /// Latest timestamp in the whole table, regardless of site.
    TableLatest,
    At(NaiveDateTime),
}

impl Anchor {
    /// Resolves the anchor for `site`. `None` only when there is nothing
    /// to anchor to (empty table, or a site with no rows under `SiteLatest`).
    pub fn resolve(&self, table: &ReadingTable, site: &str) -> Option<NaiveDateTime> {
        match self {
            Anchor::SiteLatest => table.latest_for_site(site),
            Anchor::TableLatest => table.latest_timestamp(),
            Anchor::At(t) => Some(*t),
        }
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors raised while loading a table or computing a summary.
///
/// None of these are fatal: the caller reports them and skips the affected
/// section.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SummaryError {
    /// The input had no header record at all.
    #[error("input is empty: no header record found")]
    EmptyInput,
    /// A column required for the operation is absent from the header.
    #[error("missing required column '{0}'")]
    MissingColumn(String),
    /// A timestamp cell matched none of the configured formats.
    #[error("row {row}: unparseable timestamp '{value}'")]
    UnparseableTimestamp { row: usize, value: String },
    /// A non-timestamp cell failed validation (bad number, hour out of range).
    #[error("row {row}: invalid {column} value '{value}'")]
    InvalidValue { row: usize, column: String, value: String },
    /// A record could not be split into the header's fields.
    #[error("row {row}: malformed record ({reason})")]
    MalformedRecord { row: usize, reason: String },
    /// No rows exist for the selected site.
    #[error("no readings for site '{0}'")]
    EmptySelection(String),
    /// The site has rows, but none in the requested time range.
    #[error("no readings for site '{site}' between {start} and {end}")]
    EmptyWindow {
        site: String,
        start: NaiveDateTime,
        end: NaiveDateTime,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::{csv::parse_table, fixtures::*};
    use crate::config::InputConfig;
    use chrono::NaiveDate;

    fn table() -> ReadingTable {
        parse_table(fixture_two_sites_csv(), &InputConfig::default()).expect("fixture should parse")
    }

    #[test]
    fn test_site_latest_differs_from_table_latest() {
        let table = table();
        let site = Anchor::SiteLatest.resolve(&table, "SiteB").unwrap();
        let global = Anchor::TableLatest.resolve(&table, "SiteB").unwrap();
        assert_eq!(site, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap().and_hms_opt(0, 0, 0).unwrap());
        assert!(global > site, "SiteA has later rows than SiteB");
    }

    #[test]
    fn test_site_rows_outlive_the_site_name() {
        let table = table();
        let rows: Vec<&Reading> = {
            let site = String::from("SiteB");
            table.for_site(&site).collect()
        };
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.site_name == "SiteB"));
    }

    #[test]
    fn test_site_latest_is_none_for_unknown_site() {
        assert!(Anchor::SiteLatest.resolve(&table(), "Nowhere").is_none());
    }

    #[test]
    fn test_error_messages_name_the_problem() {
        let e = SummaryError::MissingColumn("온도".to_string());
        assert_eq!(e.to_string(), "missing required column '온도'");

        let e = SummaryError::EmptySelection("SiteZ".to_string());
        assert!(e.to_string().contains("SiteZ"));
    }
}

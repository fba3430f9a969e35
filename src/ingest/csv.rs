/// Delimited-text loader for temperature exports.
///
/// Parses the uploaded table into a validated `ReadingTable`. Columns are
/// located by header name (see `config::ColumnConfig`), so column order in
/// the file does not matter and extra columns are carried along untouched.
///
/// Format handled:
/// - optional UTF-8 BOM (spreadsheet "CSV UTF-8" exports)
/// - `\n` or `\r\n` line endings
/// - double-quoted fields, with `""` as an escaped quote and embedded
///   delimiters or line breaks allowed inside quotes
/// - blank lines are skipped
///
/// Every record keeps its exact source text so `export` can reproduce a
/// site's subset byte for byte.

use chrono::{NaiveDate, NaiveDateTime, Timelike};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

use crate::analysis::groupings::site_names;
use crate::config::InputConfig;
use crate::model::{Reading, ReadingTable, SummaryError};

const UTF8_BOM: char = '\u{feff}';

/// Failure to produce a table from a file on disk.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read input: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Invalid(#[from] SummaryError),
}

// ---------------------------------------------------------------------------
// Record splitting
// ---------------------------------------------------------------------------

/// One record of the source text.
#[derive(Debug, Clone, Copy, PartialEq)]
struct RawRecord<'a> {
    /// Full text including the line terminator, if any.
    text: &'a str,
    /// Text without the terminator.
    body: &'a str,
}

/// Splits text into records on line breaks that fall outside quotes.
///
/// A `"` opens a quoted section only as the first character of a field;
/// anywhere else it is literal text. Returns the records and the first
/// line terminator seen (`"\n"` when the text has none).
fn split_records(text: &str, delimiter: u8) -> Result<(Vec<RawRecord<'_>>, &'static str), SummaryError> {
    let mut records = Vec::new();
    let mut line_ending: Option<&'static str> = None;
    let mut in_quotes = false;
    let mut field_start = true;
    let mut start = 0;
    let bytes = text.as_bytes();

    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        let mut next_field_start = false;
        if in_quotes {
            if b == b'"' {
                if bytes.get(i + 1) == Some(&b'"') {
                    i += 1;
                } else {
                    in_quotes = false;
                }
            }
        } else if b == b'"' && field_start {
            in_quotes = true;
        } else if b == delimiter {
            next_field_start = true;
        } else if b == b'\n' {
            let crlf = i > start && bytes[i - 1] == b'\r';
            let body_end = if crlf { i - 1 } else { i };
            line_ending.get_or_insert(if crlf { "\r\n" } else { "\n" });
            records.push(RawRecord {
                text: &text[start..=i],
                body: &text[start..body_end],
            });
            start = i + 1;
            next_field_start = true;
        }
        field_start = next_field_start;
        i += 1;
    }

    if in_quotes {
        return Err(SummaryError::MalformedRecord {
            row: records.len(),
            reason: "unterminated quoted field".to_string(),
        });
    }

    if start < text.len() {
        let rest = &text[start..];
        let body = rest.strip_suffix('\r').unwrap_or(rest);
        records.push(RawRecord { text: rest, body });
    }

    Ok((records, line_ending.unwrap_or("\n")))
}

/// Splits one record body into unquoted field values. Quote rules match
/// `split_records`.
fn split_fields(body: &str, delimiter: char) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut field_start = true;
    let mut chars = body.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            } else {
                current.push(c);
            }
        } else if c == '"' && field_start {
            in_quotes = true;
        } else if c == delimiter {
            fields.push(std::mem::take(&mut current));
            field_start = true;
            continue;
        } else {
            current.push(c);
        }
        field_start = false;
    }
    fields.push(current);
    fields
}

// ---------------------------------------------------------------------------
// Value parsing
// ---------------------------------------------------------------------------

/// Parses a timestamp cell with the first matching format. Date-only
/// formats resolve to midnight.
pub fn parse_timestamp(value: &str, formats: &[String]) -> Option<NaiveDateTime> {
    let value = value.trim();
    formats.iter().find_map(|fmt| {
        NaiveDateTime::parse_from_str(value, fmt)
            .ok()
            .or_else(|| {
                NaiveDate::parse_from_str(value, fmt)
                    .ok()
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
            })
    })
}

/// Parses an hour cell. Accepts "7" as well as "7.0" (numeric columns
/// round-tripped through a spreadsheet), and requires 0–23.
fn parse_hour(value: &str) -> Option<u8> {
    let value = value.trim();
    let hour = value.parse::<u8>().ok().or_else(|| {
        value
            .parse::<f64>()
            .ok()
            .filter(|h| h.fract() == 0.0 && *h >= 0.0 && *h < 256.0)
            .map(|h| h as u8)
    })?;
    (hour <= 23).then_some(hour)
}

fn parse_temperature(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|t| t.is_finite())
}

// ---------------------------------------------------------------------------
// Table parsing
// ---------------------------------------------------------------------------

/// Column positions resolved from the header.
struct ColumnIndex {
    timestamp: usize,
    site_name: usize,
    module_id: usize,
    hour_of_day: Option<usize>,
    temperature: usize,
}

impl ColumnIndex {
    fn resolve(headers: &[String], config: &InputConfig) -> Result<Self, SummaryError> {
        let col_map: HashMap<&str, usize> = headers
            .iter()
            .enumerate()
            .map(|(idx, h)| (h.trim(), idx))
            .collect();

        let c = &config.columns;
        let required = |name: &str| {
            col_map
                .get(name)
                .copied()
                .ok_or_else(|| SummaryError::MissingColumn(name.to_string()))
        };

        Ok(ColumnIndex {
            timestamp: required(c.timestamp.as_str())?,
            site_name: required(c.site_name.as_str())?,
            module_id: required(c.module_id.as_str())?,
            hour_of_day: col_map.get(c.hour_of_day.as_str()).copied(),
            temperature: required(c.temperature.as_str())?,
        })
    }
}

/// Parses delimited text into a validated table.
///
/// # Errors
/// - `EmptyInput` — no header record.
/// - `MissingColumn` — a required header is absent (the hour column is
///   optional; without it the hour is taken from the timestamp).
/// - `MalformedRecord` — unterminated quote, or a record whose field count
///   differs from the header's.
/// - `UnparseableTimestamp` / `InvalidValue` — a cell failed validation.
///
/// Row numbers in errors count data records from 1.
pub fn parse_table(text: &str, config: &InputConfig) -> Result<ReadingTable, SummaryError> {
    let delimiter = config.delimiter;
    if !delimiter.is_ascii() {
        return Err(SummaryError::MalformedRecord {
            row: 0,
            reason: format!("delimiter {:?} is not a single ASCII character", delimiter),
        });
    }
    let delimiter_byte = delimiter as u8;

    let (text, has_bom) = match text.strip_prefix(UTF8_BOM) {
        Some(rest) => (rest, true),
        None => (text, false),
    };

    let (records, line_ending) = split_records(text, delimiter_byte)?;
    let mut records = records.into_iter().filter(|r| !r.body.trim().is_empty());

    let header = records.next().ok_or(SummaryError::EmptyInput)?;
    let headers = split_fields(header.body, delimiter);
    let columns = ColumnIndex::resolve(&headers, config)?;

    let mut readings = Vec::new();
    for (idx, record) in records.enumerate() {
        let row = idx + 1;
        let fields = split_fields(record.body, delimiter);
        if fields.len() != headers.len() {
            return Err(SummaryError::MalformedRecord {
                row,
                reason: format!("expected {} fields, found {}", headers.len(), fields.len()),
            });
        }

        let ts_cell = &fields[columns.timestamp];
        let timestamp = parse_timestamp(ts_cell, &config.timestamp_formats).ok_or_else(|| {
            SummaryError::UnparseableTimestamp {
                row,
                value: ts_cell.clone(),
            }
        })?;

        let invalid = |column: &str, value: &str| SummaryError::InvalidValue {
            row,
            column: column.to_string(),
            value: value.to_string(),
        };

        let site_name = fields[columns.site_name].clone();
        if site_name.trim().is_empty() {
            return Err(invalid(config.columns.site_name.as_str(), site_name.as_str()));
        }
        let module_id = fields[columns.module_id].trim().to_string();
        if module_id.is_empty() {
            return Err(invalid(config.columns.module_id.as_str(), module_id.as_str()));
        }

        let hour_of_day = match columns.hour_of_day {
            Some(i) => parse_hour(&fields[i]).ok_or_else(|| invalid(config.columns.hour_of_day.as_str(), fields[i].as_str()))?,
            None => timestamp.hour() as u8,
        };

        let temp_cell = &fields[columns.temperature];
        let temperature =
            parse_temperature(temp_cell).ok_or_else(|| invalid(config.columns.temperature.as_str(), temp_cell.as_str()))?;

        readings.push(Reading {
            row: idx,
            timestamp,
            site_name,
            module_id,
            hour_of_day,
            temperature,
            raw: record.text.to_string(),
        });
    }

    debug!(
        rows = readings.len(),
        derived_hour = columns.hour_of_day.is_none(),
        "parsed delimited table"
    );

    Ok(ReadingTable {
        header: header.text.to_string(),
        readings,
        line_ending,
        has_bom,
    })
}

/// Reads and parses the file at `path`.
pub fn load_table<P: AsRef<Path>>(path: P, config: &InputConfig) -> Result<ReadingTable, LoadError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)?;
    let table = parse_table(&text, config)?;
    info!(
        path = %path.display(),
        rows = table.len(),
        sites = site_names(&table).len(),
        "loaded temperature table"
    );
    Ok(table)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

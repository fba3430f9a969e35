/// Site grouping and aggregation helpers.
///
/// `group_by_site` takes the flat `ReadingTable` produced by the ingest layer
/// and organizes it into per-site row lists, making it convenient to ask
/// "what did SiteA report?" without filtering the table every time.
///
/// The remaining helpers (`group_by`, `mean`, `compare_module_ids`) are the
/// building blocks the summary operations share: group rows by a key,
/// average a group, and order module identifiers naturally.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{Duration, NaiveDateTime};

use crate::model::{Reading, ReadingTable};

// ---------------------------------------------------------------------------
// Grouping
// ---------------------------------------------------------------------------

/// Distinct site names in order of first appearance (the site picker list).
pub fn site_names(table: &ReadingTable) -> Vec<String> {
    let mut seen = HashSet::new();
    table
        .readings
        .iter()
        .filter(|r| seen.insert(r.site_name.as_str()))
        .map(|r| r.site_name.clone())
        .collect()
}

/// Groups the table's rows by site name. Rows keep table order within
/// each group.
pub fn group_by_site(table: &ReadingTable) -> HashMap<String, Vec<&Reading>> {
    let mut grouped: HashMap<String, Vec<&Reading>> = HashMap::new();

    for reading in &table.readings {
        grouped
            .entry(reading.site_name.clone())
            .or_default()
            .push(reading);
    }

    grouped
}

/// Groups rows by an ordered key. Rows keep their input order within each
/// group.
pub fn group_by<'a, K, F>(readings: &[&'a Reading], key: F) -> BTreeMap<K, Vec<&'a Reading>>
where
    K: Ord,
    F: Fn(&Reading) -> K,
{
    let mut grouped: BTreeMap<K, Vec<&'a Reading>> = BTreeMap::new();
    for &reading in readings {
        grouped.entry(key(reading)).or_default().push(reading);
    }
    grouped
}

/// Rows with `start <= timestamp <= end`, in input order.
pub fn within<'a>(readings: &[&'a Reading], start: NaiveDateTime, end: NaiveDateTime) -> Vec<&'a Reading> {
    readings
        .iter()
        .copied()
        .filter(|r| r.timestamp >= start && r.timestamp <= end)
        .collect()
}

/// `end - span`, saturating at the representable range instead of
/// overflowing.
pub fn window_start(end: NaiveDateTime, span: Duration) -> NaiveDateTime {
    end.checked_sub_signed(span).unwrap_or(if span > Duration::zero() {
        NaiveDateTime::MIN
    } else {
        NaiveDateTime::MAX
    })
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Arithmetic mean, `None` for an empty input.
pub fn mean<I: IntoIterator<Item = f64>>(values: I) -> Option<f64> {
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Mean temperature of a group of rows.
pub fn mean_temperature(readings: &[&Reading]) -> Option<f64> {
    mean(readings.iter().map(|r| r.temperature))
}

/// Orders module identifiers naturally: purely numeric ids compare as
/// numbers ("2" < "10") and sort before non-numeric ids, which compare
/// as strings.
pub fn compare_module_ids(a: &str, b: &str) -> Ordering {
    match (a.parse::<i64>(), b.parse::<i64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

/// Module identifier with natural ordering, for use as a map key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleKey(pub String);

impl Ord for ModuleKey {
    fn cmp(&self, other: &Self) -> Ordering {
        compare_module_ids(&self.0, &other.0)
    }
}

impl PartialOrd for ModuleKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

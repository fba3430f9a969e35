/// Latest-snapshot heatmap: module × hour mean temperature.
///
/// Takes the selected site's rows at one instant (by default the site's
/// latest timestamp) and pivots them into a matrix indexed by module and
/// columned by hour. Cells average every row that shares a module/hour pair,
/// so a duplicated ingest does not skew the picture. Pairs with no rows stay
/// empty (`None`) rather than being filled.

use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::debug;

use crate::analysis::groupings::{ModuleKey, group_by, mean_temperature};
use crate::model::{Anchor, Reading, ReadingTable, SummaryError};

/// Pivoted snapshot for one site and instant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotMatrix {
    pub site: String,
    pub timestamp: NaiveDateTime,
    /// Row labels, in natural module order.
    pub module_ids: Vec<String>,
    /// Column labels, ascending.
    pub hours: Vec<u8>,
    /// `cells[m][h]` is the mean for `module_ids[m]` at `hours[h]`.
    pub cells: Vec<Vec<Option<f64>>>,
}

impl SnapshotMatrix {
    pub fn cell(&self, module_id: &str, hour: u8) -> Option<f64> {
        let m = self.module_ids.iter().position(|id| id == module_id)?;
        let h = self.hours.iter().position(|&x| x == hour)?;
        self.cells[m][h]
    }
}

/// Builds the module × hour matrix for `site` at the anchor timestamp.
///
/// # Errors
/// - `EmptySelection` — the site has no rows at all.
/// - `EmptyWindow` — the site has rows, but none at the anchor timestamp
///   (possible with `Anchor::TableLatest` or `Anchor::At`).
pub fn latest_snapshot_matrix(
    table: &ReadingTable,
    site: &str,
    anchor: Anchor,
) -> Result<SnapshotMatrix, SummaryError> {
    let site_rows: Vec<&Reading> = table.for_site(site).collect();
    if site_rows.is_empty() {
        return Err(SummaryError::EmptySelection(site.to_string()));
    }
    let at = anchor
        .resolve(table, site)
        .ok_or_else(|| SummaryError::EmptySelection(site.to_string()))?;

    let rows: Vec<&Reading> = site_rows.into_iter().filter(|r| r.timestamp == at).collect();
    if rows.is_empty() {
        return Err(SummaryError::EmptyWindow {
            site: site.to_string(),
            start: at,
            end: at,
        });
    }

    let by_module = group_by(&rows, |r| ModuleKey(r.module_id.clone()));
    let mut hours: Vec<u8> = rows.iter().map(|r| r.hour_of_day).collect();
    hours.sort_unstable();
    hours.dedup();

    let mut module_ids = Vec::with_capacity(by_module.len());
    let mut cells = Vec::with_capacity(by_module.len());
    for (ModuleKey(module_id), module_rows) in by_module {
        let by_hour = group_by(&module_rows, |r| r.hour_of_day);
        let row: Vec<Option<f64>> = hours
            .iter()
            .map(|h| by_hour.get(h).and_then(|group| mean_temperature(group)))
            .collect();
        module_ids.push(module_id);
        cells.push(row);
    }

    debug!(site, %at, rows = rows.len(), modules = module_ids.len(), hours = hours.len(), "built snapshot matrix");

    Ok(SnapshotMatrix {
        site: site.to_string(),
        timestamp: at,
        module_ids,
        hours,
        cells,
    })
}

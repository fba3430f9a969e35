/// Site subset download.
///
/// Re-emits the header and every record belonging to one site exactly as
/// they appeared in the upload: same bytes, same order, same columns. The
/// only bytes added are a UTF-8 BOM when the source had one, and a line
/// terminator after a record that had none (the source's last line), so
/// the records never run together.

use std::fs;
use std::io;
use std::path::Path;
use tracing::info;

use crate::model::{ReadingTable, SummaryError};

fn push_record(out: &mut String, raw: &str, line_ending: &str) {
    out.push_str(raw);
    if !raw.ends_with('\n') {
        out.push_str(line_ending);
    }
}

/// Serialized subset for `site`.
///
/// # Errors
/// `EmptySelection` when the table has no rows for `site`.
pub fn site_csv(table: &ReadingTable, site: &str) -> Result<String, SummaryError> {
    let mut out = String::new();
    if table.has_bom {
        out.push('\u{feff}');
    }
    push_record(&mut out, &table.header, table.line_ending);

    let mut count = 0;
    for reading in table.for_site(site) {
        push_record(&mut out, &reading.raw, table.line_ending);
        count += 1;
    }

    if count == 0 {
        return Err(SummaryError::EmptySelection(site.to_string()));
    }
    Ok(out)
}

/// Failure writing a subset to disk.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error(transparent)]
    Selection(#[from] SummaryError),
    #[error("failed to write export: {0}")]
    Io(#[from] io::Error),
}

/// Writes the subset for `site` to `path`, returning the bytes written.
pub fn write_site_csv<P: AsRef<Path>>(table: &ReadingTable, site: &str, path: P) -> Result<usize, ExportError> {
    let path = path.as_ref();
    let body = site_csv(table, site)?;
    fs::write(path, body.as_bytes())?;
    info!(site, path = %path.display(), bytes = body.len(), "wrote site export");
    Ok(body.len())
}

/// Suggested download file name for a site.
pub fn export_file_name(site: &str) -> String {
    let safe: String = site
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    format!("{}_readings.csv", safe)
}

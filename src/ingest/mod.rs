/// Input loading for uploaded temperature tables.
///
/// - `csv`      — delimited-text parsing and validation into `ReadingTable`
/// - `fixtures` (test only) — representative export payloads

pub mod csv;
pub mod fixtures;

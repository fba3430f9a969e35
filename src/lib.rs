/// tempmon_service: temperature summary service for site/module sensor exports.
///
/// # Module structure
///
/// ```text
/// tempmon_service
/// ├── model       — shared data types (Reading, ReadingTable, Anchor, SummaryError)
/// ├── config      — input layout and service configuration loader (tempmon.toml)
/// ├── logging     — tracing subscriber setup
/// ├── ingest
/// │   ├── csv     — delimited-text parsing and validation
/// │   └── fixtures (test only) — representative export payloads
/// ├── analysis
/// │   ├── groupings — per-site grouping and aggregation helpers
/// │   ├── snapshot  — module × hour matrix at the latest timestamp
/// │   ├── weekly    — rolling-window averages and extremes
/// │   └── series    — chart series per selectable window
/// ├── report      — every section for one site, failures as warnings
/// ├── export      — byte-exact per-site CSV download
/// ├── render      — plain-text tables for the CLI
/// └── endpoint    — HTTP JSON API over a loaded table
/// ```

/// Public modules
pub mod analysis;
pub mod config;
pub mod endpoint;
pub mod export;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod render;
pub mod report;

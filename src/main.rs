//! Temperature Summary Service - CLI
//!
//! Loads a site/module temperature export and either:
//! 1. Lists the sites it contains (no `--site`)
//! 2. Prints the latest snapshot, weekly averages and extremes for one site
//! 3. Writes that site's rows back out as CSV (`--export`)
//! 4. Serves the same data over HTTP (`--endpoint PORT`)
//!
//! Usage:
//!   cargo run --release -- readings.csv
//!   cargo run --release -- readings.csv --site 강남 --series last24h
//!   cargo run --release -- readings.csv --endpoint 8080
//!
//! Environment:
//!   TEMPMON_CONFIG - configuration file (default tempmon.toml)
//!   TEMPMON_LOG    - log filter override

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use tempmon_service::analysis::SeriesMode;
use tempmon_service::analysis::weekly::MAX_WINDOW_DAYS;
use tempmon_service::analysis::groupings::{group_by_site, site_names};
use tempmon_service::config::{AnchorMode, load_config_or_default};
use tempmon_service::ingest::csv::load_table;
use tempmon_service::model::ReadingTable;
use tempmon_service::report::{ReportOptions, build_site_report};
use tempmon_service::{endpoint, export, logging, render};

/// Temperature summaries for site/module sensor exports
#[derive(Parser, Debug)]
#[command(name = "tempmon_service")]
#[command(version)]
#[command(about = "Latest snapshot, weekly averages and extremes per site")]
struct Args {
    /// Temperature export (delimited text with a header row)
    csv: PathBuf,

    /// Site to summarise; lists the available sites when omitted
    #[arg(short, long)]
    site: Option<String>,

    /// Also print a time series
    #[arg(long, value_enum)]
    series: Option<SeriesMode>,

    /// Write the site's rows to this file
    #[arg(long)]
    export: Option<PathBuf>,

    /// Reference time for the latest snapshot and the window
    #[arg(long, value_enum)]
    anchor: Option<AnchorMode>,

    /// Look-back window in days
    #[arg(long, value_parser = clap::value_parser!(i64).range(1..=MAX_WINDOW_DAYS))]
    window_days: Option<i64>,

    /// Serve the HTTP API on this port instead of printing
    #[arg(long)]
    endpoint: Option<u16>,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

fn print_sites(table: &ReadingTable) {
    let grouped = group_by_site(table);
    println!("📋 Sites ({}):", grouped.len());
    for name in site_names(table) {
        let rows = grouped.get(&name).map_or(0, Vec::len);
        println!("   {} - {} readings", name, rows);
    }
    println!("\nRe-run with --site NAME for a summary.");
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = load_config_or_default(args.config.as_deref()).context("failed to load configuration")?;
    if let Some(anchor) = args.anchor {
        config.summary.anchor = anchor;
    }
    if let Some(days) = args.window_days {
        config.summary.window_days = days;
    }
    if let Some(port) = args.endpoint {
        config.endpoint.port = Some(port);
    }

    logging::init_logging(&config.logging, args.debug).context("failed to initialize logging")?;

    println!("🌡️  Temperature Summary Service");
    println!("===============================\n");

    let table = load_table(&args.csv, &config.input)
        .with_context(|| format!("failed to load {}", args.csv.display()))?;
    println!("✓ Loaded {} readings from {}\n", table.len(), args.csv.display());

    let mut options = ReportOptions::from(&config);
    options.series = args.series;

    if let Some(port) = config.endpoint.port {
        println!("🚀 Starting HTTP endpoint server...");
        endpoint::start_endpoint_server(port, &table, &options)?;
        return Ok(());
    }

    let Some(site) = args.site.as_deref() else {
        if args.export.is_some() {
            eprintln!("⚠ --export needs --site; nothing written\n");
        }
        print_sites(&table);
        return Ok(());
    };

    info!(site, anchor = ?options.anchor, window_days = options.window_days, "building report");
    let report = build_site_report(&table, site, &options);
    print!("{}", render::render_report(&report));

    if let Some(path) = &args.export {
        match export::write_site_csv(&table, site, path) {
            Ok(bytes) => println!("\n💾 Wrote {} bytes to {}", bytes, path.display()),
            Err(e) => eprintln!("\n⚠ Export skipped: {}", e),
        }
    }

    Ok(())
}

/// HTTP endpoint for querying site summaries
///
/// Serves the loaded table over a small JSON API so other tools can pull
/// the same sections the CLI prints.
///
/// Endpoints:
/// - GET /health - Service health check
/// - GET /sites - Site names in first-appearance order, with row counts
/// - GET /site/{name} - Full site report (`?series=MODE` adds a chart series)
/// - GET /site/{name}/series?mode=MODE - One time series
/// - GET /site/{name}/csv - The site's rows, exactly as uploaded
///
/// Site names arrive percent-encoded; Hangul names are the common case.

use std::borrow::Cow;
use std::io::Cursor;

use serde_json::json;
use tracing::{info, warn};

use crate::analysis::groupings::{group_by_site, site_names};
use crate::analysis::{SeriesMode, time_series};
use crate::export::{export_file_name, site_csv};
use crate::model::{ReadingTable, SummaryError};
use crate::report::{ReportOptions, build_site_report};

const JSON: &str = "application/json";
const CSV: &str = "text/csv; charset=utf-8";

#[derive(Debug, thiserror::Error)]
pub enum EndpointError {
    #[error("failed to start HTTP server on port {port}: {reason}")]
    Bind { port: u16, reason: String },
}

// ---------------------------------------------------------------------------
// Replies
// ---------------------------------------------------------------------------

/// A routed reply, independent of the HTTP library.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
    /// `Content-Disposition` value for downloads.
    pub disposition: Option<String>,
}

impl Reply {
    fn json(status: u16, value: serde_json::Value) -> Self {
        let body = serde_json::to_vec_pretty(&value).unwrap_or_else(|_| value.to_string().into_bytes());
        Reply {
            status,
            content_type: JSON,
            body,
            disposition: None,
        }
    }

    fn error(status: u16, message: impl Into<String>) -> Self {
        Reply::json(status, json!({ "error": message.into() }))
    }

    fn from_summary_error(site: &str, e: &SummaryError) -> Self {
        let status = match e {
            SummaryError::EmptySelection(_) | SummaryError::EmptyWindow { .. } => 404,
            _ => 400,
        };
        Reply::json(status, json!({ "error": e.to_string(), "site": site }))
    }
}

// ---------------------------------------------------------------------------
// Routing
// ---------------------------------------------------------------------------

/// Value of `key` in a raw query string, percent-decoded.
fn query_param<'a>(query: &'a str, key: &str) -> Option<Cow<'a, str>> {
    query
        .split('&')
        .map(|pair| pair.split_once('=').unwrap_or((pair, "")))
        .find(|(k, _)| *k == key)
        .map(|(_, v)| urlencoding::decode(v).unwrap_or(Cow::Borrowed(v)))
}

fn parse_mode(raw: Option<Cow<'_, str>>) -> Result<Option<SeriesMode>, Reply> {
    match raw {
        None => Ok(None),
        Some(value) => value.parse::<SeriesMode>().map(Some).map_err(|e| Reply::error(400, e)),
    }
}

/// Routes a GET request URL (path plus optional query) against `table`.
pub fn route(url: &str, table: &ReadingTable, options: &ReportOptions) -> Reply {
    let (path, query) = url.split_once('?').unwrap_or((url, ""));
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    match segments.as_slice() {
        ["health"] => handle_health(table),
        ["sites"] => handle_sites(table),
        ["site", name] => match urlencoding::decode(name) {
            Ok(site) => handle_site_report(table, &site, options, query),
            Err(_) => Reply::error(400, "site name is not valid UTF-8"),
        },
        ["site", name, "series"] => match urlencoding::decode(name) {
            Ok(site) => handle_series(table, &site, options, query),
            Err(_) => Reply::error(400, "site name is not valid UTF-8"),
        },
        ["site", name, "csv"] => match urlencoding::decode(name) {
            Ok(site) => handle_csv(table, &site),
            Err(_) => Reply::error(400, "site name is not valid UTF-8"),
        },
        _ => Reply::json(
            404,
            json!({
                "error": "Not found",
                "available_endpoints": [
                    "/health",
                    "/sites",
                    "/site/{name}",
                    "/site/{name}/series?mode=all|last24h|last14d|daily-max",
                    "/site/{name}/csv"
                ]
            }),
        ),
    }
}

fn handle_health(table: &ReadingTable) -> Reply {
    Reply::json(
        200,
        json!({
            "status": "ok",
            "service": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
            "rows": table.len()
        }),
    )
}

fn handle_sites(table: &ReadingTable) -> Reply {
    let grouped = group_by_site(table);
    let sites: Vec<serde_json::Value> = site_names(table)
        .into_iter()
        .map(|name| {
            let rows = grouped.get(&name).map_or(0, Vec::len);
            json!({ "name": name, "rows": rows })
        })
        .collect();
    Reply::json(200, json!({ "sites": sites }))
}

fn handle_site_report(table: &ReadingTable, site: &str, options: &ReportOptions, query: &str) -> Reply {
    if table.for_site(site).next().is_none() {
        return Reply::from_summary_error(site, &SummaryError::EmptySelection(site.to_string()));
    }
    let series = match parse_mode(query_param(query, "series")) {
        Ok(series) => series,
        Err(reply) => return reply,
    };
    let options = ReportOptions { series, ..*options };

    let report = build_site_report(table, site, &options);
    match serde_json::to_value(&report) {
        Ok(value) => Reply::json(200, value),
        Err(e) => Reply::error(500, e.to_string()),
    }
}

fn handle_series(table: &ReadingTable, site: &str, options: &ReportOptions, query: &str) -> Reply {
    let mode = match parse_mode(query_param(query, "mode")) {
        Ok(mode) => mode.unwrap_or(SeriesMode::All),
        Err(reply) => return reply,
    };
    match time_series(table, site, mode, options.anchor) {
        Ok(series) => match serde_json::to_value(&series) {
            Ok(value) => Reply::json(200, value),
            Err(e) => Reply::error(500, e.to_string()),
        },
        Err(e) => Reply::from_summary_error(site, &e),
    }
}

fn handle_csv(table: &ReadingTable, site: &str) -> Reply {
    match site_csv(table, site) {
        Ok(body) => Reply {
            status: 200,
            content_type: CSV,
            body: body.into_bytes(),
            // Header values must be ASCII, so the name goes out RFC 5987 encoded.
            disposition: Some(format!(
                "attachment; filename*=UTF-8''{}",
                urlencoding::encode(&export_file_name(site))
            )),
        },
        Err(e) => Reply::from_summary_error(site, &e),
    }
}

// ---------------------------------------------------------------------------
// HTTP Server
// ---------------------------------------------------------------------------

fn into_response(reply: Reply) -> tiny_http::Response<Cursor<Vec<u8>>> {
    let mut response =
        tiny_http::Response::from_data(reply.body).with_status_code(tiny_http::StatusCode::from(reply.status));
    if let Ok(header) = tiny_http::Header::from_bytes(&b"Content-Type"[..], reply.content_type.as_bytes()) {
        response.add_header(header);
    }
    if let Some(disposition) = reply.disposition {
        if let Ok(header) = tiny_http::Header::from_bytes(&b"Content-Disposition"[..], disposition.as_bytes()) {
            response.add_header(header);
        }
    }
    response
}

/// Serves `table` on `port` until the process exits. Requests are handled
/// one at a time on the calling thread.
pub fn start_endpoint_server(port: u16, table: &ReadingTable, options: &ReportOptions) -> Result<(), EndpointError> {
    let server = tiny_http::Server::http(format!("0.0.0.0:{}", port)).map_err(|e| EndpointError::Bind {
        port,
        reason: e.to_string(),
    })?;

    println!("📡 HTTP endpoint listening on http://0.0.0.0:{}", port);
    println!("   GET /sites - List sites");
    println!("   GET /site/{{name}} - Site report");
    println!("   GET /site/{{name}}/series?mode=... - Time series");
    println!("   GET /site/{{name}}/csv - Download site rows");
    println!("   GET /health - Service health check\n");

    for request in server.incoming_requests() {
        let reply = if *request.method() == tiny_http::Method::Get {
            route(request.url(), table, options)
        } else {
            Reply::error(405, "only GET is supported")
        };
        info!(method = %request.method(), url = request.url(), status = reply.status, "request");

        if let Err(e) = request.respond(into_response(reply)) {
            warn!(error = %e, "failed to send response");
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

/// Structured logging for the temperature summary service.
///
/// Installs a `tracing` subscriber that writes to stderr (stdout carries
/// the report itself) or, when `[logging] file` is set, appends to that
/// file without ANSI colours. `TEMPMON_LOG` overrides the configured level
/// with any `EnvFilter` directive, e.g. `TEMPMON_LOG=tempmon_service=debug`.

use std::env;
use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// Environment variable overriding the configured log filter.
pub const LOG_ENV: &str = "TEMPMON_LOG";

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("failed to open log file {path}: {source}")]
    File { path: PathBuf, source: io::Error },
    #[error("invalid log filter '{0}'")]
    Filter(String),
    #[error("logger already initialized")]
    AlreadyInitialized,
}

/// Filter directive to use: the override when present and non-blank,
/// otherwise the configured level.
pub fn filter_directive(level: &str, env_override: Option<&str>) -> String {
    match env_override.map(str::trim) {
        Some(directive) if !directive.is_empty() => directive.to_string(),
        _ => level.trim().to_string(),
    }
}

fn build_filter(directive: &str) -> Result<EnvFilter, LoggingError> {
    EnvFilter::try_new(directive).map_err(|_| LoggingError::Filter(directive.to_string()))
}

fn open_log_file(path: &Path) -> Result<std::fs::File, LoggingError> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| LoggingError::File {
            path: path.to_path_buf(),
            source,
        })
}

/// Installs the global subscriber. `verbose` forces `debug` regardless of
/// the configured level (the environment override still wins).
pub fn init_logging(config: &LoggingConfig, verbose: bool) -> Result<(), LoggingError> {
    let level = if verbose { "debug" } else { config.level.as_str() };
    let env_value = env::var(LOG_ENV).ok();
    let directive = filter_directive(level, env_value.as_deref());
    let filter = build_filter(&directive)?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);

    let result = match &config.file {
        Some(path) => {
            let file = open_log_file(path)?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).try_init()
        }
        None => builder.with_writer(io::stderr).try_init(),
    };
    result.map_err(|_| LoggingError::AlreadyInitialized)
}

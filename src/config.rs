/// Service configuration loader - parses tempmon.toml
///
/// Separates the input file's layout (header names, delimiter, timestamp
/// formats) and the summary defaults from code, so a differently-exported
/// CSV can be summarised without recompiling the service.

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::analysis::weekly::MAX_WINDOW_DAYS;
use crate::model::Anchor;

/// Default configuration file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "tempmon.toml";

/// Environment variable naming an alternative configuration file.
pub const CONFIG_PATH_ENV: &str = "TEMPMON_CONFIG";

// ---------------------------------------------------------------------------
// Configuration structures
// ---------------------------------------------------------------------------

/// Root configuration structure for TOML parsing
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub input: InputConfig,
    pub summary: SummaryConfig,
    pub endpoint: EndpointConfig,
    pub logging: LoggingConfig,
}

/// Layout of the uploaded table
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct InputConfig {
    pub delimiter: char,
    /// chrono format strings tried in order. Date-only formats are allowed
    /// and resolve to midnight.
    pub timestamp_formats: Vec<String>,
    pub columns: ColumnConfig,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            delimiter: ',',
            timestamp_formats: vec![
                "%Y-%m-%d %H:%M:%S%.f".to_string(),
                "%Y-%m-%d %H:%M".to_string(),
                "%Y-%m-%dT%H:%M:%S%.f".to_string(),
                "%Y/%m/%d %H:%M:%S".to_string(),
                "%Y-%m-%d".to_string(),
                "%Y/%m/%d".to_string(),
                "%Y%m%d".to_string(),
            ],
            columns: ColumnConfig::default(),
        }
    }
}

/// Header names for each field of a reading.
///
/// Defaults are the headers of the station temperature export.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ColumnConfig {
    pub timestamp: String,
    pub site_name: String,
    pub module_id: String,
    /// Optional: when the header lacks it, the hour comes from the timestamp.
    pub hour_of_day: String,
    pub temperature: String,
}

impl Default for ColumnConfig {
    fn default() -> Self {
        Self {
            timestamp: "날짜".to_string(),
            site_name: "통합국명".to_string(),
            module_id: "모듈번호".to_string(),
            hour_of_day: "hh".to_string(),
            temperature: "온도".to_string(),
        }
    }
}

/// Which reference time the summaries are anchored to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AnchorMode {
    /// Latest reading of the selected site
    #[default]
    Site,
    /// Latest reading of the whole table
    Table,
}

impl From<AnchorMode> for Anchor {
    fn from(mode: AnchorMode) -> Self {
        match mode {
            AnchorMode::Site => Anchor::SiteLatest,
            AnchorMode::Table => Anchor::TableLatest,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SummaryConfig {
    pub window_days: i64,
    pub anchor: AnchorMode,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            window_days: 7,
            anchor: AnchorMode::Site,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct EndpointConfig {
    pub port: Option<u16>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// EnvFilter directive, e.g. "info" or "tempmon_service=debug".
    pub level: String,
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("failed to parse {path}: {source}")]
    Parse { path: PathBuf, source: toml::de::Error },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

impl ServiceConfig {
    /// Checks values serde cannot: the delimiter must be one ASCII byte
    /// that is not a quote or line break, the window must be positive,
    /// and every column needs a name.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let d = self.input.delimiter;
        if !d.is_ascii() || d == '"' || d == '\n' || d == '\r' {
            return Err(ConfigError::Invalid(format!(
                "delimiter {:?} must be a single ASCII character other than a quote or newline",
                d
            )));
        }
        if !(1..=MAX_WINDOW_DAYS).contains(&self.summary.window_days) {
            return Err(ConfigError::Invalid(format!(
                "summary.window_days must be between 1 and {}, got {}",
                MAX_WINDOW_DAYS, self.summary.window_days
            )));
        }
        if self.input.timestamp_formats.is_empty() {
            return Err(ConfigError::Invalid("input.timestamp_formats is empty".to_string()));
        }
        let c = &self.input.columns;
        for (field, name) in [
            ("timestamp", &c.timestamp),
            ("site_name", &c.site_name),
            ("module_id", &c.module_id),
            ("hour_of_day", &c.hour_of_day),
            ("temperature", &c.temperature),
        ] {
            if name.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("input.columns.{} is empty", field)));
            }
        }
        Ok(())
    }
}

/// Loads and validates the configuration file at `path`.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<ServiceConfig, ConfigError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&contents).map_err(|e| match e {
        ConfigError::Parse { source, .. } => ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        },
        other => other,
    })
}

/// Parses configuration text (used by `load_config` and tests).
pub fn parse_config(contents: &str) -> Result<ServiceConfig, ConfigError> {
    let config: ServiceConfig = toml::from_str(contents).map_err(|source| ConfigError::Parse {
        path: PathBuf::from("<inline>"),
        source,
    })?;
    config.validate()?;
    Ok(config)
}

/// Resolves the configuration path from an explicit argument, then
/// `TEMPMON_CONFIG` (a `.env` file is honoured), then `tempmon.toml`.
pub fn resolve_config_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    dotenv::dotenv().ok();
    env::var(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Loads the configuration, falling back to defaults when the file does
/// not exist. A file that exists but is malformed is still an error.
pub fn load_config_or_default(explicit: Option<&Path>) -> Result<ServiceConfig, ConfigError> {
    let path = resolve_config_path(explicit);
    match load_config(&path) {
        Err(ConfigError::Io { source, .. }) if source.kind() == io::ErrorKind::NotFound && explicit.is_none() => {
            Ok(ServiceConfig::default())
        }
        other => other,
    }
}

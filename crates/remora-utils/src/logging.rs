//! # Logging Utilities
//!
//! Logging infrastructure for Remora using `tracing`.
//!
//! - Pretty output for interactive use, JSON for machine consumption
//! - `RUST_LOG` directives (`remora_core=debug`) or an explicit level
//! - Optional daily-rolling log file next to the console output
//!
//! Console output goes to stderr so command output on stdout stays clean.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use remora_utils::{init_logging, LoggingOptions};
//!
//! let _guard = init_logging(LoggingOptions::from_env()).expect("Failed to initialize logging");
//! tracing::info!("Application started");
//! ```
//!
//! ## Environment Variables
//!
//! - `RUST_LOG`: level filter (e.g. `debug`, `remora_core::bridge=trace`)
//! - `REMORA_LOG_FORMAT`: `pretty` (default) or `json`
//! - `REMORA_LOG_FILE`: optional log file path; the file rolls daily

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::{env, io};

use chrono::{DateTime, Utc};
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::fmt::{self};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat
{
    /// Human-readable, colored on the console
    #[default]
    Pretty,
    /// One JSON object per event
    Json,
}

impl FromStr for LogFormat
{
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        match s.to_lowercase().as_str() {
            "pretty" | "dev" | "development" => Ok(LogFormat::Pretty),
            "json" | "prod" | "production" => Ok(LogFormat::Json),
            _ => Err(format!("Unknown log format: {s}. Use 'pretty' or 'json'")),
        }
    }
}

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel
{
    /// Error level
    Error,
    /// Warning level
    Warn,
    /// Info level (default)
    Info,
    /// Debug level
    Debug,
    /// Trace level (most verbose)
    Trace,
}

impl From<LogLevel> for Level
{
    fn from(level: LogLevel) -> Self
    {
        match level {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}

impl FromStr for LogLevel
{
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        match s.to_lowercase().as_str() {
            "error" | "err" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" | "dbg" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            _ => Err(format!(
                "Unknown log level: {s}. Use 'error', 'warn', 'info', 'debug', or 'trace'"
            )),
        }
    }
}

/// Where and how to log.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoggingOptions
{
    /// Explicit level; wins over `RUST_LOG` when set
    pub level: Option<LogLevel>,
    /// Output format for console and file
    pub format: LogFormat,
    /// Log file path; `None` logs to the console only
    pub file: Option<PathBuf>,
}

impl LoggingOptions
{
    /// Options from `REMORA_LOG_FORMAT` and `REMORA_LOG_FILE`.
    ///
    /// Unparseable values fall back to the defaults. The level is left unset
    /// so `RUST_LOG` applies.
    #[must_use]
    pub fn from_env() -> Self
    {
        Self {
            level: None,
            format: env::var("REMORA_LOG_FORMAT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or_default(),
            file: env::var_os("REMORA_LOG_FILE").map(PathBuf::from),
        }
    }

    /// Same options with an explicit level.
    #[must_use]
    pub fn with_level(mut self, level: Option<LogLevel>) -> Self
    {
        if level.is_some() {
            self.level = level;
        }
        self
    }
}

/// Keeps the file writer flushing until dropped.
///
/// Hold it for the life of the program; dropping it early loses buffered
/// file output.
#[derive(Debug)]
pub struct LoggingGuard
{
    started_at: DateTime<Utc>,
    file: Option<PathBuf>,
    _writer: Option<WorkerGuard>,
}

impl LoggingGuard
{
    /// When logging was initialized.
    pub fn started_at(&self) -> DateTime<Utc>
    {
        self.started_at
    }

    /// The log file, if one is being written.
    pub fn file(&self) -> Option<&Path>
    {
        self.file.as_deref()
    }
}

/// Build the event filter.
///
/// Priority: explicit level, then `rust_log` directives, then INFO. Invalid
/// directives fall back to INFO rather than failing startup.
pub fn build_filter(explicit: Option<LogLevel>, rust_log: Option<&str>) -> EnvFilter
{
    match (explicit, rust_log) {
        (Some(level), _) => EnvFilter::new(Level::from(level).to_string()),
        (None, Some(directives)) => {
            EnvFilter::try_new(directives).unwrap_or_else(|_| EnvFilter::new(Level::INFO.to_string()))
        }
        (None, None) => EnvFilter::new(Level::INFO.to_string()),
    }
}

/// Install the global subscriber.
///
/// ## Example
///
/// ```rust,no_run
/// use remora_utils::{init_logging, LogLevel, LoggingOptions};
///
/// let options = LoggingOptions::from_env().with_level(Some(LogLevel::Debug));
/// let guard = init_logging(options).expect("Failed to initialize logging");
/// tracing::debug!(started = %guard.started_at(), "logging ready");
/// ```
///
/// ## Errors
///
/// - `FileError`: the log directory could not be created
/// - `InitializationFailed`: a global subscriber is already installed
pub fn init_logging(options: LoggingOptions) -> Result<LoggingGuard, LoggingError>
{
    let rust_log = env::var("RUST_LOG").ok();
    let filter = build_filter(options.level, rust_log.as_deref());

    let mut layers: Vec<BoxedLayer> = vec![console_layer(options.format)];
    let mut writer = None;
    if let Some(path) = &options.file {
        let (layer, guard) = file_layer(path, options.format)?;
        layers.push(layer);
        writer = Some(guard);
    }

    Registry::default()
        .with(layers.with_filter(filter))
        .try_init()
        .map_err(|e| LoggingError::InitializationFailed(e.to_string()))?;

    Ok(LoggingGuard {
        started_at: Utc::now(),
        file: options.file,
        _writer: writer,
    })
}

fn console_layer(format: LogFormat) -> BoxedLayer
{
    let layer = fmt::layer()
        .with_target(true)
        .with_thread_names(true)
        .with_timer(ChronoUtc::rfc_3339())
        .with_writer(io::stderr);
    match format {
        LogFormat::Pretty => layer.with_ansi(true).boxed(),
        LogFormat::Json => layer.json().with_current_span(true).with_span_list(true).boxed(),
    }
}

fn file_layer(path: &Path, format: LogFormat) -> Result<(BoxedLayer, WorkerGuard), LoggingError>
{
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&directory)?;
    let file_name = path
        .file_name()
        .ok_or_else(|| LoggingError::InvalidPath(path.display().to_string()))?;

    let appender = tracing_appender::rolling::daily(&directory, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(appender);
    let layer = fmt::layer()
        .with_writer(non_blocking)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_timer(ChronoUtc::rfc_3339())
        .with_ansi(false);
    let layer = match format {
        LogFormat::Pretty => layer.boxed(),
        LogFormat::Json => layer.json().with_current_span(true).with_span_list(true).boxed(),
    };
    Ok((layer, guard))
}

/// Logging initialization error
#[derive(Debug, thiserror::Error)]
pub enum LoggingError
{
    /// The log file path has no file name
    #[error("Invalid log file path: {0}")]
    InvalidPath(String),

    /// A subscriber is already installed
    #[error("Failed to initialize logging: {0}")]
    InitializationFailed(String),

    /// File logging error
    #[error("File logging error: {0}")]
    FileError(#[from] io::Error),
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_log_format_from_str()
    {
        assert_eq!(LogFormat::from_str("pretty").unwrap(), LogFormat::Pretty);
        assert_eq!(LogFormat::from_str("JSON").unwrap(), LogFormat::Json);
        assert_eq!(LogFormat::from_str("prod").unwrap(), LogFormat::Json);
        assert!(LogFormat::from_str("xml").is_err());
    }

    #[test]
    fn test_log_level_from_str()
    {
        assert_eq!(LogLevel::from_str("warning").unwrap(), LogLevel::Warn);
        assert_eq!(LogLevel::from_str("dbg").unwrap(), LogLevel::Debug);
        assert_eq!(Level::from(LogLevel::Trace), Level::TRACE);
        assert!(LogLevel::from_str("loud").is_err());
    }

    #[test]
    fn test_filter_priority()
    {
        let explicit = build_filter(Some(LogLevel::Debug), Some("remora_core=trace"));
        assert_eq!(explicit.to_string().to_lowercase(), "debug");

        let directives = build_filter(None, Some("remora_core=trace"));
        assert_eq!(directives.to_string(), "remora_core=trace");

        assert_eq!(build_filter(None, None).to_string().to_lowercase(), "info");
    }

    #[test]
    fn test_explicit_level_overrides_options()
    {
        let options = LoggingOptions::default().with_level(Some(LogLevel::Warn));
        assert_eq!(options.level, Some(LogLevel::Warn));
        assert_eq!(options.with_level(None).level, Some(LogLevel::Warn));
    }
}

//! # Logging Utilities
//!
//! Logging infrastructure for dienav using `tracing`.
//!
//! The engine crates only emit `tracing` events; this module owns the
//! subscriber. It supports:
//! - Pretty (development) and JSON (production) output
//! - Environment variable configuration
//! - Console, file, or test-harness output
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dienav_utils::init_logging;
//!
//! // Reads RUST_LOG, DIENAV_LOG_FORMAT and DIENAV_LOG_FILE
//! let _guard = init_logging().expect("Failed to initialize logging");
//!
//! tracing::info!("symbol file loaded");
//! ```
//!
//! ## Environment Variables
//!
//! - `RUST_LOG`: Log filter (e.g., `RUST_LOG=debug`, `RUST_LOG=dienav_core=trace`)
//! - `DIENAV_LOG_FORMAT`: Output format (`json` or `pretty`, default: `pretty`)
//! - `DIENAV_LOG_FILE`: Optional log file, rotated daily, written in addition to the console
//!
//! The returned [`LoggingGuard`] flushes the file writer when dropped; keep
//! it alive for as long as logging is needed.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::{env, io};

use chrono::Utc;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::fmt::writer::MakeWriter;
use tracing_subscriber::fmt::{self, TestWriter};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

/// Environment variable selecting the output format.
pub const LOG_FORMAT_ENV: &str = "DIENAV_LOG_FORMAT";
/// Environment variable naming an additional log file.
pub const LOG_FILE_ENV: &str = "DIENAV_LOG_FILE";

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat
{
    /// Pretty-printed, human-readable format (default for development)
    #[default]
    Pretty,
    /// JSON format (default for production)
    Json,
}

impl FromStr for LogFormat
{
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        match s.to_lowercase().as_str() {
            "pretty" | "dev" | "development" => Ok(LogFormat::Pretty),
            "json" | "prod" | "production" => Ok(LogFormat::Json),
            _ => Err(LoggingError::InvalidFormat(s.to_string())),
        }
    }
}

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel
{
    /// Error level
    Error,
    /// Warning level
    Warn,
    /// Info level (default)
    #[default]
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
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        match s.to_lowercase().as_str() {
            "error" | "err" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" | "dbg" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            _ => Err(LoggingError::InvalidLevel(s.to_string())),
        }
    }
}

/// Where console output goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConsoleOutput
{
    /// Standard output
    #[default]
    Stdout,
    /// Standard error
    Stderr,
    /// The test harness's captured output
    Test,
    /// No console output (file only)
    Disabled,
}

/// Complete logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LoggingConfig
{
    /// Output format
    pub format: LogFormat,
    /// Level used when `RUST_LOG` is unset or unparsable
    pub level: LogLevel,
    /// Console destination
    pub console: ConsoleOutput,
    /// Optional daily-rotated log file
    pub file: Option<PathBuf>,
}

impl LoggingConfig
{
    /// Configuration from the process environment.
    ///
    /// ## Errors
    ///
    /// Returns an error if `DIENAV_LOG_FORMAT` is set to an unknown format.
    pub fn from_env() -> Result<Self, LoggingError>
    {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Configuration from an arbitrary variable lookup.
    ///
    /// ## Errors
    ///
    /// Returns an error if the format variable names an unknown format.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, LoggingError>
    {
        let format = match lookup(LOG_FORMAT_ENV) {
            Some(value) => value.parse()?,
            None => LogFormat::Pretty,
        };
        // A bare level in RUST_LOG doubles as the default level; module
        // filters are applied by the EnvFilter itself.
        let level = lookup("RUST_LOG")
            .and_then(|value| value.parse().ok())
            .unwrap_or_default();
        let file = lookup(LOG_FILE_ENV).filter(|path| !path.is_empty()).map(PathBuf::from);

        Ok(Self {
            format,
            level,
            console: ConsoleOutput::Stdout,
            file,
        })
    }

    /// Install the global subscriber.
    ///
    /// ## Errors
    ///
    /// Returns an error if a global subscriber is already installed.
    pub fn init(self) -> Result<LoggingGuard, LoggingError>
    {
        let default_level: Level = self.level.into();
        let filter = || EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level.to_string()));

        let mut layers: Vec<BoxedLayer> = Vec::new();
        match self.console {
            ConsoleOutput::Stdout => layers.push(build_layer(self.format, io::stdout, true, filter())),
            ConsoleOutput::Stderr => layers.push(build_layer(self.format, io::stderr, true, filter())),
            ConsoleOutput::Test => layers.push(build_layer(self.format, TestWriter::new(), false, filter())),
            ConsoleOutput::Disabled => {}
        }

        let mut file_guard = None;
        if let Some(path) = &self.file {
            let directory = path.parent().filter(|dir| !dir.as_os_str().is_empty()).unwrap_or(Path::new("."));
            let file_name = path.file_name().ok_or_else(|| {
                LoggingError::FileError(io::Error::new(io::ErrorKind::InvalidInput, "log file path has no file name"))
            })?;
            let appender = tracing_appender::rolling::daily(directory, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            layers.push(build_layer(self.format, writer, false, filter()));
            file_guard = Some(guard);
        }

        Registry::default()
            .with(layers)
            .try_init()
            .map_err(|err| LoggingError::InitializationFailed(err.to_string()))?;

        Ok(LoggingGuard { _file: file_guard })
    }
}

fn build_layer<W>(format: LogFormat, writer: W, ansi: bool, filter: EnvFilter) -> BoxedLayer
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let layer = fmt::layer::<Registry>()
        .with_target(true)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_file(true)
        .with_line_number(true)
        .with_timer(ChronoUtc::rfc_3339())
        .with_writer(writer);

    match format {
        LogFormat::Pretty => layer.with_ansi(ansi).with_filter(filter).boxed(),
        LogFormat::Json => layer
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_filter(filter)
            .boxed(),
    }
}

/// Keeps the file writer alive; logs written after it is dropped may be lost.
#[derive(Debug)]
pub struct LoggingGuard
{
    _file: Option<WorkerGuard>,
}

/// Initialize logging from the environment.
///
/// Reads configuration from environment variables:
/// - `RUST_LOG`: Log filter (e.g., `debug`, `dienav_core=debug`)
/// - `DIENAV_LOG_FORMAT`: Output format (`json` or `pretty`, default: `pretty`)
/// - `DIENAV_LOG_FILE`: Optional path to log file
///
/// ## Errors
///
/// Returns an error if:
/// - Logging is already initialized
/// - `DIENAV_LOG_FORMAT` is invalid
/// - The log file path is unusable
pub fn init_logging() -> Result<LoggingGuard, LoggingError>
{
    LoggingConfig::from_env()?.init()
}

/// Initialize console logging with explicit level and format
///
/// ## Example
///
/// ```rust,no_run
/// use dienav_utils::{LogFormat, LogLevel, init_logging_with_level};
///
/// let _guard = init_logging_with_level(LogLevel::Debug, LogFormat::Pretty)
///     .expect("Failed to initialize logging");
/// ```
///
/// ## Errors
///
/// Returns an error if logging is already initialized.
pub fn init_logging_with_level(level: LogLevel, format: LogFormat) -> Result<LoggingGuard, LoggingError>
{
    LoggingConfig {
        format,
        level,
        ..LoggingConfig::default()
    }
    .init()
}

/// Initialize file-only logging for hosts that own the terminal (a
/// debugger front end embedding the engine).
///
/// The file is created as `<directory>/YYYY-MM-DD-dienav.log`; `directory`
/// defaults to `~/.dienav`, or the system temporary directory when `HOME`
/// is unset.
///
/// ## Errors
///
/// Returns an error if logging is already initialized or the directory
/// can't be created.
pub fn init_file_logging(directory: Option<&Path>, level: LogLevel) -> Result<(PathBuf, LoggingGuard), LoggingError>
{
    let directory = match directory {
        Some(directory) => directory.to_path_buf(),
        None => env::var_os("HOME").map_or_else(env::temp_dir, |home| PathBuf::from(home).join(".dienav")),
    };
    std::fs::create_dir_all(&directory)?;

    let log_file = dated_log_file(&directory);
    let guard = LoggingConfig {
        format: LogFormat::Pretty,
        level,
        console: ConsoleOutput::Disabled,
        file: Some(log_file.clone()),
    }
    .init()?;
    Ok((log_file, guard))
}

/// Route engine logs into the test harness's captured output.
///
/// Safe to call from every test; only the first call installs a
/// subscriber.
pub fn init_test_logging()
{
    let _ = LoggingConfig {
        level: LogLevel::Debug,
        console: ConsoleOutput::Test,
        ..LoggingConfig::default()
    }
    .init();
}

fn dated_log_file(directory: &Path) -> PathBuf
{
    let today = Utc::now().format("%Y-%m-%d");
    directory.join(format!("{today}-dienav.log"))
}

/// Logging initialization error
#[derive(Debug, thiserror::Error)]
pub enum LoggingError
{
    /// Invalid log format
    #[error("Invalid log format: {0}. Use 'pretty' or 'json'")]
    InvalidFormat(String),

    /// Invalid log level
    #[error("Invalid log level: {0}. Use 'error', 'warn', 'info', 'debug', or 'trace'")]
    InvalidLevel(String),

    /// Failed to initialize logging
    #[error("Failed to initialize logging: {0}")]
    InitializationFailed(String),

    /// File logging error
    #[error("File logging error: {0}")]
    FileError(#[from] io::Error),
}

//! Logging subsystem
//!
//! Structured logging via tracing with JSON (production) and plaintext
//! (development) output formats.
//!
//! # Log Targets
//!
//! Use these consistent target names across the codebase:
//! - `gateway` - startup and serving
//! - `http` - HTTP handlers
//! - `guard` - route guard decisions
//! - `widget` - widget delivery
//! - `embed` - chat surface and relay
//! - `config` - configuration loading
//!
//! # Environment Variables
//!
//! - `GATEHOUSE_LOG` - Primary log level/filter (takes precedence)
//! - `RUST_LOG` - Fallback log level/filter

use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::OnceLock;

use tracing::Level;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;

/// Guard to track if logging has been initialized
static INIT_GUARD: OnceLock<()> = OnceLock::new();

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// JSON format for production (structured logs)
    Json,
    /// Human-readable plaintext for development
    #[default]
    Plaintext,
}

/// Log output destination
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LogOutput {
    /// Write to stdout
    #[default]
    Stdout,
    /// Write to stderr
    Stderr,
    /// Write to a file at the given path
    File(PathBuf),
}

/// Configuration for the logging subsystem
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Output format (JSON or plaintext)
    pub format: LogFormat,
    /// Output destination (stdout, stderr, or file)
    pub output: LogOutput,
    /// Default log level when no env filter is set
    pub default_level: Level,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Plaintext,
            output: LogOutput::Stdout,
            default_level: Level::INFO,
        }
    }
}

impl LogConfig {
    /// Create a development configuration (plaintext to stdout, debug level)
    pub fn development() -> Self {
        Self {
            format: LogFormat::Plaintext,
            output: LogOutput::Stdout,
            default_level: Level::DEBUG,
        }
    }

    /// Create a production configuration (JSON to stdout, info level)
    pub fn production() -> Self {
        Self {
            format: LogFormat::Json,
            output: LogOutput::Stdout,
            default_level: Level::INFO,
        }
    }
}

/// Error type for logging initialization
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("failed to create log file: {0}")]
    FileCreation(#[from] io::Error),
    #[error("failed to parse log filter: {0}")]
    FilterParse(#[from] tracing_subscriber::filter::ParseError),
    #[error("logging already initialized")]
    AlreadyInitialized,
}

/// Build an EnvFilter from environment variables or default level.
///
/// Checks GATEHOUSE_LOG first, then RUST_LOG, falling back to the default
/// level.
fn build_env_filter(default_level: Level) -> Result<EnvFilter, LoggingError> {
    if let Ok(filter) = std::env::var("GATEHOUSE_LOG") {
        return Ok(EnvFilter::try_new(filter)?);
    }
    if let Ok(filter) = std::env::var("RUST_LOG") {
        return Ok(EnvFilter::try_new(filter)?);
    }

    let default_filter = format!(
        "{level},gateway={level},http={level},guard={level},widget={level},embed={level},config={level}",
        level = default_level.as_str().to_lowercase()
    );
    Ok(EnvFilter::try_new(default_filter)?)
}

/// Initialize the logging subsystem with the given configuration.
///
/// Call once at application startup; subsequent calls return an error.
pub fn init_logging(config: LogConfig) -> Result<(), LoggingError> {
    if INIT_GUARD.set(()).is_err() {
        return Err(LoggingError::AlreadyInitialized);
    }

    let filter = build_env_filter(config.default_level)?;
    let timer = UtcTime::rfc_3339();

    let writer = match &config.output {
        LogOutput::Stdout => BoxMakeWriter::new(io::stdout),
        LogOutput::Stderr => BoxMakeWriter::new(io::stderr),
        LogOutput::File(path) => BoxMakeWriter::new(File::create(path)?),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(timer)
        .with_target(true)
        .with_writer(writer);

    match config.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Plaintext => builder.init(),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LogConfig::default();
        assert_eq!(config.format, LogFormat::Plaintext);
        assert_eq!(config.output, LogOutput::Stdout);
        assert_eq!(config.default_level, Level::INFO);
    }

    #[test]
    fn test_development_profile() {
        let config = LogConfig::development();
        assert_eq!(config.format, LogFormat::Plaintext);
        assert_eq!(config.default_level, Level::DEBUG);
    }

    #[test]
    fn test_production_profile() {
        let config = LogConfig::production();
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.default_level, Level::INFO);
    }

    #[test]
    fn test_build_env_filter_default() {
        // Filters built from the default level parse successfully.
        let filter = build_env_filter(Level::INFO);
        assert!(filter.is_ok());
    }
}

//! Structured logging via the `tracing` ecosystem
//!
//! Supports compact, pretty, and JSON output, level filtering through the
//! configuration or the `RUST_LOG` environment variable, and optional
//! source locations.
//!
//! ## Example
//!
//! ```rust,ignore
//! use hfale_core::observe::{init_logging, LogConfig, LogLevel};
//!
//! init_logging(&LogConfig {
//!     level: LogLevel::Debug,
//!     ..LogConfig::default()
//! });
//!
//! tracing::info!(channel = 7_073_000u32, "scanning started");
//! ```

use serde::{Deserialize, Serialize};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Log level configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        };
        f.write_str(s)
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One event per line, minimal fields.
    #[default]
    Compact,
    /// Multi-line human-readable output.
    Pretty,
    /// Machine-readable JSON.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Log level.
    pub level: LogLevel,
    /// Output format.
    pub format: LogFormat,
    /// Include source file and line.
    pub source_location: bool,
    /// Explicit filter directive (e.g. `"hfale_core=debug"`); overrides
    /// `level` when present.
    pub filter: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Compact,
            source_location: false,
            filter: None,
        }
    }
}

/// Initialize the global logging subscriber. Call once at startup;
/// repeated calls are silently ignored.
pub fn init_logging(config: &LogConfig) {
    let filter = match &config.filter {
        Some(custom) => EnvFilter::try_new(custom)
            .unwrap_or_else(|_| EnvFilter::new(config.level.to_string())),
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(config.level.to_string())),
    };

    let result = match config.format {
        LogFormat::Json => tracing::subscriber::set_global_default(
            tracing_subscriber::registry().with(filter).with(
                fmt::layer()
                    .json()
                    .with_file(config.source_location)
                    .with_line_number(config.source_location),
            ),
        ),
        LogFormat::Pretty => tracing::subscriber::set_global_default(
            tracing_subscriber::registry().with(filter).with(
                fmt::layer()
                    .pretty()
                    .with_file(config.source_location)
                    .with_line_number(config.source_location),
            ),
        ),
        LogFormat::Compact => tracing::subscriber::set_global_default(
            tracing_subscriber::registry().with(filter).with(
                fmt::layer()
                    .compact()
                    .with_file(config.source_location)
                    .with_line_number(config.source_location),
            ),
        ),
    };

    // A subscriber may already be installed (tests, embedding hosts).
    let _ = result;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_serializes_to_yaml_and_back() {
        let config = LogConfig {
            level: LogLevel::Debug,
            format: LogFormat::Json,
            source_location: true,
            filter: Some("hfale_core=trace".to_string()),
        };
        let yaml = serde_yaml::to_string(&config).unwrap();
        let parsed: LogConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn defaults_are_quiet_compact() {
        let config = LogConfig::default();
        assert_eq!(config.level, LogLevel::Info);
        assert_eq!(config.format, LogFormat::Compact);
    }

    #[test]
    fn init_is_idempotent() {
        init_logging(&LogConfig::default());
        init_logging(&LogConfig::default());
    }
}

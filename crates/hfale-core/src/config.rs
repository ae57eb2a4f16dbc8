//! Station Configuration
//!
//! YAML-backed configuration for an ALE station: the self address, scan
//! list, LQA tuning, ARQ parameters, and logging. Loaded from an explicit
//! path, the `HFALE_CONFIG` environment variable, or a short search path;
//! missing fields fall back to their defaults so a minimal file like
//!
//! ```yaml
//! self_address: "W1AW"
//! scan:
//!   dwell_time_ms: 200
//!   scan_list:
//!     - frequency_hz: 7073000
//!     - frequency_hz: 14109000
//!       mode: "USB"
//! ```
//!
//! is a complete station definition.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::address::AddressBook;
use crate::fs1052_arq::{DEFAULT_ACK_TIMEOUT_MS, DEFAULT_MAX_RETRANSMITS, DEFAULT_WINDOW_SIZE};
use crate::link_state_machine::ScanConfig;
use crate::lqa_analyzer::AnalyzerConfig;
use crate::lqa_database::LqaConfig;
use crate::lqa_metrics::MetricsConfig;
use crate::observe::LogConfig;

/// Configuration failures.
#[derive(Debug, Clone)]
pub enum ConfigError {
    /// No configuration file could be located.
    NotFound(String),
    /// The file exists but could not be read.
    ReadError(String),
    /// The file is not valid YAML for this schema.
    ParseError(String),
    /// A field value is out of range.
    ValidationError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::NotFound(msg) => write!(f, "config not found: {}", msg),
            ConfigError::ReadError(msg) => write!(f, "failed to read config: {}", msg),
            ConfigError::ParseError(msg) => write!(f, "failed to parse config: {}", msg),
            ConfigError::ValidationError(msg) => write!(f, "invalid config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// ARQ data-link parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArqParams {
    /// ACK wait before retransmission, milliseconds.
    pub ack_timeout_ms: u64,
    /// Retransmission budget per block.
    pub max_retransmits: u8,
    /// Transmission window in blocks.
    pub window_size: usize,
}

impl Default for ArqParams {
    fn default() -> Self {
        Self {
            ack_timeout_ms: DEFAULT_ACK_TIMEOUT_MS,
            max_retransmits: DEFAULT_MAX_RETRANSMITS,
            window_size: DEFAULT_WINDOW_SIZE,
        }
    }
}

/// Complete station configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StationConfig {
    /// This station's ALE address (3..=15 restricted-ASCII characters).
    pub self_address: String,
    /// Scan list and dwell time.
    pub scan: ScanConfig,
    /// LQA database tuning.
    pub lqa: LqaConfig,
    /// Metrics collection tuning.
    pub metrics: MetricsConfig,
    /// Channel selection and sounding schedule.
    pub analyzer: AnalyzerConfig,
    /// Data-link parameters.
    pub arq: ArqParams,
    /// Logging setup.
    pub log: LogConfig,
}

impl StationConfig {
    /// Load configuration from the default search path.
    ///
    /// Search order:
    /// 1. `HFALE_CONFIG` environment variable
    /// 2. `./hfale.yaml`
    /// 3. the per-user config directory (`~/.config/hfale/config.yaml`
    ///    on Linux, the platform equivalent elsewhere)
    /// 4. `/etc/hfale/config.yaml`
    pub fn load() -> Result<Self, ConfigError> {
        if let Ok(path) = std::env::var("HFALE_CONFIG") {
            return Self::load_from(Path::new(&path));
        }

        for path in Self::config_search_paths() {
            if path.exists() {
                return Self::load_from(&path);
            }
        }

        Err(ConfigError::NotFound(
            "no station config in search path; set HFALE_CONFIG".to_string(),
        ))
    }

    /// Get configuration search paths.
    pub fn config_search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("./hfale.yaml")];

        // User config directory
        if let Some(config_dir) = directories::ProjectDirs::from("", "", "hfale") {
            paths.push(config_dir.config_dir().join("config.yaml"));
        }

        // System config
        paths.push(PathBuf::from("/etc/hfale/config.yaml"));

        paths
    }

    /// Load and validate from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(format!("{}: {}", path.display(), e)))?;
        Self::from_yaml(&content)
    }

    /// Parse and validate from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: StationConfig =
            serde_yaml::from_str(yaml).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to YAML.
    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        serde_yaml::to_string(self).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Check field ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.self_address.is_empty() && !AddressBook::is_valid_address(&self.self_address) {
            return Err(ConfigError::ValidationError(format!(
                "self_address {:?} must be 3..=15 characters from the ALE character set",
                self.self_address
            )));
        }

        let weight_sum =
            self.lqa.snr_weight + self.lqa.success_weight + self.lqa.recency_weight;
        if !(0.99..=1.01).contains(&weight_sum) {
            return Err(ConfigError::ValidationError(format!(
                "LQA weights sum to {weight_sum}, expected 1.0"
            )));
        }

        if self.arq.window_size == 0 || self.arq.window_size > 256 {
            return Err(ConfigError::ValidationError(
                "arq.window_size must be in 1..=256".to_string(),
            ));
        }

        for channel in &self.scan.scan_list {
            if channel.frequency_hz == 0 {
                return Err(ConfigError::ValidationError(
                    "scan channel frequency must be non-zero".to_string(),
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_yaml_gets_defaults() {
        let config = StationConfig::from_yaml("self_address: \"W1AW\"\n").unwrap();
        assert_eq!(config.self_address, "W1AW");
        assert_eq!(config.arq.window_size, DEFAULT_WINDOW_SIZE);
        assert_eq!(config.lqa.max_age_ms, 3_600_000);
        assert_eq!(config.metrics.averaging_window, 10);
    }

    #[test]
    fn full_round_trip() {
        let mut config = StationConfig::default();
        config.self_address = "K6KPH".to_string();
        config.scan.scan_list.push(crate::link_state_machine::Channel::new(7_073_000));
        config.arq.window_size = 8;

        let yaml = config.to_yaml().unwrap();
        let parsed = StationConfig::from_yaml(&yaml).unwrap();
        assert_eq!(parsed.self_address, "K6KPH");
        assert_eq!(parsed.scan.scan_list.len(), 1);
        assert_eq!(parsed.arq.window_size, 8);
    }

    #[test]
    fn scan_list_yaml_shape() {
        let yaml = r#"
self_address: "W1AW"
scan:
  dwell_time_ms: 250
  scan_list:
    - frequency_hz: 7073000
    - frequency_hz: 14109000
      mode: "LSB"
"#;
        let config = StationConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.scan.dwell_time_ms, 250);
        assert_eq!(config.scan.scan_list[0].mode, "USB");
        assert_eq!(config.scan.scan_list[1].mode, "LSB");
    }

    #[test]
    fn bad_self_address_rejected() {
        assert!(StationConfig::from_yaml("self_address: \"ab\"\n").is_err());
        assert!(StationConfig::from_yaml("self_address: \"lower\"\n").is_err());
        // Empty means "not yet configured" and is allowed.
        assert!(StationConfig::from_yaml("{}\n").is_ok());
    }

    #[test]
    fn bad_weights_rejected() {
        let yaml = r#"
lqa:
  snr_weight: 0.9
  success_weight: 0.9
  recency_weight: 0.9
"#;
        let err = StationConfig::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn zero_window_rejected() {
        let yaml = "arq:\n  window_size: 0\n";
        assert!(StationConfig::from_yaml(yaml).is_err());
    }

    #[test]
    fn parse_error_is_typed() {
        let err = StationConfig::from_yaml(": not yaml :").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn search_path_starts_in_working_directory() {
        let paths = StationConfig::config_search_paths();
        assert!(paths.len() >= 2);
        assert_eq!(paths[0], PathBuf::from("./hfale.yaml"));
        assert_eq!(paths.last().unwrap(), &PathBuf::from("/etc/hfale/config.yaml"));
    }
}

//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::{BridgeError, Result};

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub serial: SerialConfig,
    #[serde(default)]
    pub tables: TablesConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Serial port configuration
#[derive(Debug, Deserialize, Clone)]
pub struct SerialConfig {
    /// Device path; empty means auto-detect
    #[serde(default = "default_serial_port")]
    pub port: String,

    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
}

/// Lookup table locations
#[derive(Debug, Deserialize, Clone)]
pub struct TablesConfig {
    #[serde(default = "default_crc_table")]
    pub crc_table: String,

    #[serde(default = "default_sensor_parameters")]
    pub sensor_parameters: String,
}

/// Telemetry output configuration
#[derive(Debug, Deserialize, Clone)]
pub struct TelemetryConfig {
    #[serde(default = "default_telemetry_enabled")]
    pub enabled: bool,

    #[serde(default = "default_log_dir")]
    pub log_dir: String,

    #[serde(default = "default_file_name")]
    pub file_name: String,
}

/// Diagnostic log configuration
#[derive(Debug, Deserialize, Clone, Default)]
pub struct LoggingConfig {
    /// Directory for daily-rolling log files; console only when unset
    #[serde(default)]
    pub directory: Option<String>,
}

// Default value functions
fn default_serial_port() -> String { "/dev/ttyUSB0".to_string() }
fn default_baud_rate() -> u32 { 57600 }

fn default_crc_table() -> String { "config/crc8.json".to_string() }
fn default_sensor_parameters() -> String { "config/sensor_parameters.json".to_string() }

fn default_telemetry_enabled() -> bool { true }
fn default_log_dir() -> String { "./logs".to_string() }
fn default_file_name() -> String { "telemetry.jsonl".to_string() }

/// Baud rates supported by EnOcean USB gateways
const VALID_BAUD_RATES: [u32; 5] = [9600, 57600, 115200, 230400, 460800];

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: default_serial_port(),
            baud_rate: default_baud_rate(),
        }
    }
}

impl Default for TablesConfig {
    fn default() -> Self {
        Self {
            crc_table: default_crc_table(),
            sensor_parameters: default_sensor_parameters(),
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: default_telemetry_enabled(),
            log_dir: default_log_dir(),
            file_name: default_file_name(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    ///
    /// * `Result<Config>` - Loaded and validated configuration
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use enocean_bridge::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    fn validate(&self) -> Result<()> {
        if !VALID_BAUD_RATES.contains(&self.serial.baud_rate) {
            return Err(invalid(format!(
                "baud_rate must be one of: {:?}",
                VALID_BAUD_RATES
            )));
        }

        if self.tables.crc_table.is_empty() {
            return Err(invalid("crc_table path cannot be empty"));
        }

        if self.tables.sensor_parameters.is_empty() {
            return Err(invalid("sensor_parameters path cannot be empty"));
        }

        if self.telemetry.enabled && self.telemetry.log_dir.is_empty() {
            return Err(invalid("telemetry log_dir cannot be empty when enabled"));
        }

        if self.telemetry.enabled && self.telemetry.file_name.is_empty() {
            return Err(invalid("telemetry file_name cannot be empty when enabled"));
        }

        if matches!(self.logging.directory.as_deref(), Some("")) {
            return Err(invalid("logging directory cannot be empty when set"));
        }

        Ok(())
    }
}

fn invalid(msg: impl std::fmt::Display) -> BridgeError {
    BridgeError::Config(toml::de::Error::custom(msg))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn load_str(toml_content: &str) -> Result<Config> {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();
        Config::load(temp_file.path())
    }

    #[test]
    fn test_default_config() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_load_config_from_file() {
        let config = load_str(
            r#"
[serial]
port = "/dev/ttyACM1"
baud_rate = 115200

[tables]
crc_table = "/etc/enocean/crc8.json"

[telemetry]
enabled = false

[logging]
directory = "/var/log/enocean"
"#,
        )
        .unwrap();

        assert_eq!(config.serial.port, "/dev/ttyACM1");
        assert_eq!(config.serial.baud_rate, 115200);
        assert_eq!(config.tables.crc_table, "/etc/enocean/crc8.json");
        assert_eq!(config.tables.sensor_parameters, "config/sensor_parameters.json");
        assert!(!config.telemetry.enabled);
        assert_eq!(config.logging.directory.as_deref(), Some("/var/log/enocean"));
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = load_str("").unwrap();
        assert_eq!(config.serial.port, "/dev/ttyUSB0");
        assert_eq!(config.serial.baud_rate, 57600);
        assert!(config.telemetry.enabled);
        assert!(config.logging.directory.is_none());
    }

    #[test]
    fn test_load_shipped_config() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config/default.toml");
        let config = Config::load(path).unwrap();
        assert_eq!(config.serial.baud_rate, 57600);
    }

    #[test]
    fn test_malformed_toml() {
        let result = load_str("[serial\nport = 3");
        assert!(matches!(result, Err(BridgeError::Config(_))));
    }

    #[test]
    fn test_missing_file() {
        let result = Config::load("/nonexistent/enocean-bridge.toml");
        assert!(matches!(result, Err(BridgeError::Io(_))));
    }

    #[test]
    fn test_empty_port_means_auto_detect() {
        let mut config = Config::default();
        config.serial.port = String::new();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_baud_rate() {
        let mut config = Config::default();
        config.serial.baud_rate = 420000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_valid_baud_rates() {
        for &baud in &VALID_BAUD_RATES {
            let mut config = Config::default();
            config.serial.baud_rate = baud;
            assert!(config.validate().is_ok(), "Baud rate {} should be valid", baud);
        }
    }

    #[test]
    fn test_empty_table_paths() {
        let mut config = Config::default();
        config.tables.crc_table = String::new();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.tables.sensor_parameters = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_log_dir_when_enabled() {
        let mut config = Config::default();
        config.telemetry.log_dir = String::new();
        assert!(config.validate().is_err());

        config.telemetry.enabled = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_file_name_when_enabled() {
        let mut config = Config::default();
        config.telemetry.file_name = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_logging_directory() {
        let mut config = Config::default();
        config.logging.directory = Some(String::new());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_default_functions() {
        assert_eq!(default_serial_port(), "/dev/ttyUSB0");
        assert_eq!(default_baud_rate(), 57600);
        assert_eq!(default_crc_table(), "config/crc8.json");
        assert_eq!(default_sensor_parameters(), "config/sensor_parameters.json");
        assert_eq!(default_telemetry_enabled(), true);
        assert_eq!(default_log_dir(), "./logs");
        assert_eq!(default_file_name(), "telemetry.jsonl");
    }
}

//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.

use serde::Deserialize;
use serde::de::Error;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::{NovaError, Result};
use crate::protocol::message::{NOVA_DEFAULT_PORT, NOVA_RECONNECT_INTERVAL};

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub device: DeviceConfig,

    #[serde(default)]
    pub connection: ConnectionConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Device endpoint and identification
#[derive(Debug, Deserialize, Clone)]
pub struct DeviceConfig {
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_device_name")]
    pub name: String,

    // Discovery metadata, informational only
    #[serde(default)]
    pub manufacturer: Option<String>,

    #[serde(default)]
    pub model: Option<String>,

    #[serde(default)]
    pub serial: Option<String>,
}

/// Connection lifecycle configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ConnectionConfig {
    #[serde(default = "default_reconnect_interval_ms")]
    pub reconnect_interval_ms: u64,

    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Also write daily rolling log files here when set
    #[serde(default)]
    pub directory: Option<String>,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            reconnect_interval_ms: default_reconnect_interval_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            directory: None,
        }
    }
}

// Default value functions
fn default_port() -> u16 { NOVA_DEFAULT_PORT }
fn default_device_name() -> String { "NOVA".to_string() }

fn default_reconnect_interval_ms() -> u64 { NOVA_RECONNECT_INTERVAL.as_millis() as u64 }
fn default_connect_timeout_ms() -> u64 { 5000 }

fn default_log_level() -> String { "info".to_string() }

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Identification of the configured device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub name: String,
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    pub serial: Option<String>,
}

impl std::fmt::Display for DeviceInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)?;
        let details: Vec<&str> = [&self.manufacturer, &self.model, &self.serial]
            .into_iter()
            .filter_map(|v| v.as_deref())
            .collect();
        if !details.is_empty() {
            write!(f, " ({})", details.join(", "))?;
        }
        Ok(())
    }
}

impl DeviceConfig {
    pub fn info(&self) -> DeviceInfo {
        DeviceInfo {
            name: self.name.clone(),
            manufacturer: self.manufacturer.clone(),
            model: self.model.clone(),
            serial: self.serial.clone(),
        }
    }
}

impl ConnectionConfig {
    pub fn reconnect_interval(&self) -> Duration {
        Duration::from_millis(self.reconnect_interval_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
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
    /// use nova_bridge::config::Config;
    ///
    /// let config = Config::load("config/nova.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate configuration from a TOML string
    ///
    /// # Errors
    ///
    /// Returns error if parsing or validation fails
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    fn validate(&self) -> Result<()> {
        if self.device.host.trim().is_empty() {
            return Err(invalid("device host cannot be empty"));
        }

        if self.device.port == 0 {
            return Err(invalid("device port must be between 1 and 65535"));
        }

        if self.connection.reconnect_interval_ms == 0
            || self.connection.reconnect_interval_ms > 600_000
        {
            return Err(invalid("reconnect_interval_ms must be between 1 and 600000"));
        }

        if self.connection.connect_timeout_ms == 0 || self.connection.connect_timeout_ms > 60_000 {
            return Err(invalid("connect_timeout_ms must be between 1 and 60000"));
        }

        if !LOG_LEVELS.contains(&self.logging.level.as_str()) {
            return Err(invalid(format!(
                "log level must be one of: {}",
                LOG_LEVELS.join(", ")
            )));
        }

        if matches!(&self.logging.directory, Some(dir) if dir.trim().is_empty()) {
            return Err(invalid("logging directory cannot be empty when set"));
        }

        Ok(())
    }
}

fn invalid(msg: impl std::fmt::Display) -> NovaError {
    NovaError::Config(toml::de::Error::custom(msg))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_valid_config() -> Config {
        Config {
            device: DeviceConfig {
                host: "192.168.1.40".to_string(),
                port: default_port(),
                name: default_device_name(),
                manufacturer: None,
                model: None,
                serial: None,
            },
            connection: ConnectionConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    #[test]
    fn test_default_config() {
        assert!(create_valid_config().validate().is_ok());
    }

    #[test]
    fn test_load_config_from_file() {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let toml_content = r#"
[device]
host = "nova.local"
manufacturer = "Open Launch"
model = "NOVA"
serial = "NV-0042"

[connection]
reconnect_interval_ms = 2500
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = Config::load(temp_file.path()).unwrap();
        assert_eq!(config.device.host, "nova.local");
        assert_eq!(config.device.port, 2920);
        assert_eq!(config.device.serial.as_deref(), Some("NV-0042"));
        assert_eq!(config.connection.reconnect_interval(), Duration::from_millis(2500));
        assert_eq!(config.connection.connect_timeout(), Duration::from_millis(5000));
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = Config::from_toml("[device]\nhost = \"10.0.0.5\"\n").unwrap();
        assert_eq!(config.device.name, "NOVA");
        assert_eq!(config.connection.reconnect_interval(), Duration::from_secs(10));
        assert!(config.logging.directory.is_none());
    }

    #[test]
    fn test_missing_file() {
        let result = Config::load("/nonexistent/nova.toml");
        assert!(matches!(result, Err(NovaError::Io(_))));
    }

    #[test]
    fn test_missing_device_section() {
        let result = Config::from_toml("[connection]\n");
        assert!(matches!(result, Err(NovaError::Config(_))));
    }

    #[test]
    fn test_empty_host() {
        let mut config = create_valid_config();
        config.device.host = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_port_zero() {
        let mut config = create_valid_config();
        config.device.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_reconnect_interval_zero() {
        let mut config = create_valid_config();
        config.connection.reconnect_interval_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_reconnect_interval_too_high() {
        let mut config = create_valid_config();
        config.connection.reconnect_interval_ms = 600_001;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_connect_timeout_zero() {
        let mut config = create_valid_config();
        config.connection.connect_timeout_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_connect_timeout_too_high() {
        let mut config = create_valid_config();
        config.connection.connect_timeout_ms = 60_001;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_log_level() {
        let mut config = create_valid_config();
        config.logging.level = "verbose".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_valid_log_levels() {
        for level in LOG_LEVELS {
            let mut config = create_valid_config();
            config.logging.level = level.to_string();
            assert!(config.validate().is_ok(), "Log level {} should be valid", level);
        }
    }

    #[test]
    fn test_empty_log_directory() {
        let mut config = create_valid_config();
        config.logging.directory = Some(String::new());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_device_info_display() {
        let mut config = create_valid_config();
        assert_eq!(config.device.info().to_string(), "NOVA");

        config.device.manufacturer = Some("Open Launch".to_string());
        config.device.serial = Some("NV-0042".to_string());
        assert_eq!(config.device.info().to_string(), "NOVA (Open Launch, NV-0042)");
    }

    #[test]
    fn test_default_functions() {
        assert_eq!(default_port(), 2920);
        assert_eq!(default_device_name(), "NOVA");
        assert_eq!(default_reconnect_interval_ms(), 10_000);
        assert_eq!(default_connect_timeout_ms(), 5000);
        assert_eq!(default_log_level(), "info");
    }
}

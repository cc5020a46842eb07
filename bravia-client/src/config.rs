//! File and environment configuration.
//!
//! Configuration is loaded in the following order (later overrides earlier):
//! 1. Default values
//! 2. YAML config file (if specified via BRAVIA_CONFIG)
//! 3. Environment variables

use crate::connection::{
    ConnectionConfig, DEFAULT_COMMAND_TIMEOUT, DEFAULT_DIAL_TIMEOUT,
    DEFAULT_MAX_CONSECUTIVE_DESYNCS, DEFAULT_NOTIFICATION_CAPACITY, DEFAULT_RETRY_DELAY,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Device connection settings.
    pub device: DeviceConfig,
}

impl Config {
    /// Loads configuration from file, then applies environment variable overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(path) = std::env::var("BRAVIA_CONFIG") {
            config = Self::from_file(&path)?;
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(path.to_path_buf(), e))?;
        let config: Config = serde_yaml::from_str(&content)
            .map_err(|e| ConfigError::ParseError(path.to_path_buf(), e.to_string()))?;
        Ok(config)
    }

    /// Loads configuration from environment variables only.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides();
        config
    }

    fn apply_env_overrides(&mut self) {
        self.device.apply_env_overrides();
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.device.validate()
    }

    /// Builds the engine configuration.
    pub fn connection(&self) -> ConnectionConfig {
        self.device.connection()
    }
}

/// Device connection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Device address as `host:port`.
    pub addr: String,
    /// Dial timeout in milliseconds.
    pub dial_timeout_ms: u64,
    /// Answer deadline for a single command in milliseconds.
    pub command_timeout_ms: u64,
    /// Delay before each redial after a read failure, in milliseconds.
    pub retry_delay_ms: u64,
    /// Desync reconnects allowed back to back before they are throttled.
    pub max_consecutive_desyncs: u32,
    /// Notifications buffered per subscriber.
    pub notification_capacity: usize,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            addr: format!("127.0.0.1:{}", bravia_protocol::DEFAULT_PORT),
            dial_timeout_ms: DEFAULT_DIAL_TIMEOUT.as_millis() as u64,
            command_timeout_ms: DEFAULT_COMMAND_TIMEOUT.as_millis() as u64,
            retry_delay_ms: DEFAULT_RETRY_DELAY.as_millis() as u64,
            max_consecutive_desyncs: DEFAULT_MAX_CONSECUTIVE_DESYNCS,
            notification_capacity: DEFAULT_NOTIFICATION_CAPACITY,
        }
    }
}

impl DeviceConfig {
    fn apply_env_overrides(&mut self) {
        if let Ok(addr) = std::env::var("BRAVIA_ADDR") {
            if !addr.is_empty() {
                self.addr = addr;
            }
        }

        if let Ok(ms) = std::env::var("BRAVIA_DIAL_TIMEOUT_MS") {
            if let Ok(ms) = ms.parse() {
                self.dial_timeout_ms = ms;
            }
        }

        if let Ok(ms) = std::env::var("BRAVIA_COMMAND_TIMEOUT_MS") {
            if let Ok(ms) = ms.parse() {
                self.command_timeout_ms = ms;
            }
        }

        if let Ok(ms) = std::env::var("BRAVIA_RETRY_DELAY_MS") {
            if let Ok(ms) = ms.parse() {
                self.retry_delay_ms = ms;
            }
        }

        if let Ok(max) = std::env::var("BRAVIA_MAX_DESYNCS") {
            if let Ok(n) = max.parse() {
                self.max_consecutive_desyncs = n;
            }
        }
    }

    /// Validates the device configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.addr.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "device.addr must not be empty".to_string(),
            ));
        }
        if self.command_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "device.command_timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.notification_capacity == 0 {
            return Err(ConfigError::ValidationError(
                "device.notification_capacity must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn connection(&self) -> ConnectionConfig {
        ConnectionConfig::new(self.addr.clone())
            .with_dial_timeout(Duration::from_millis(self.dial_timeout_ms))
            .with_command_timeout(Duration::from_millis(self.command_timeout_ms))
            .with_retry_delay(Duration::from_millis(self.retry_delay_ms))
            .with_max_consecutive_desyncs(self.max_consecutive_desyncs)
            .with_notification_capacity(self.notification_capacity)
    }
}

/// Configuration error.
#[derive(Debug)]
pub enum ConfigError {
    IoError(PathBuf, std::io::Error),
    ParseError(PathBuf, String),
    ValidationError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(path, e) => {
                write!(f, "failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::ParseError(path, e) => {
                write!(f, "failed to parse config file '{}': {}", path.display(), e)
            }
            ConfigError::ValidationError(msg) => {
                write!(f, "configuration validation failed: {}", msg)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

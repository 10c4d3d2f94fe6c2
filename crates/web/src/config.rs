//! Server configuration.
//!
//! Every field has a default, so a JSON document only needs the values it changes:
//!
//! ```
//! use stepwise_web::config::ServerConfig;
//!
//! let config = ServerConfig::from_json(r#"{ "timing": { "missing_content_timeout_ms": 2500 } }"#).unwrap();
//! assert_eq!(config.timing.missing_content_timeout_ms, 2500);
//! assert_eq!(config.sizing.read_buffer_capacity, 8 * 1024);
//! ```

use std::time::Duration;

use serde::Deserialize;
use stepwise_http::connection::{DEFAULT_MISSING_CONTENT_TIMEOUT, DEFAULT_POLL_INTERVAL, DEFAULT_READ_BUFFER_CAPACITY};
use thiserror::Error;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub sizing: SizingConf,
    pub timing: TimingConf,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SizingConf {
    /// Initial capacity of each connection's read buffer, in bytes.
    pub read_buffer_capacity: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TimingConf {
    pub missing_content_timeout_ms: u64,
    pub poll_interval_ms: u64,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("can't parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config value {field}: {reason}")]
    Invalid { field: &'static str, reason: &'static str },
}

impl ServerConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: ServerConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sizing.read_buffer_capacity == 0 {
            return Err(ConfigError::Invalid { field: "sizing.read_buffer_capacity", reason: "must be positive" });
        }
        if self.timing.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid { field: "timing.poll_interval_ms", reason: "must be positive" });
        }
        if self.timing.poll_interval_ms > self.timing.missing_content_timeout_ms {
            return Err(ConfigError::Invalid { field: "timing.poll_interval_ms", reason: "must not exceed the missing content timeout" });
        }
        Ok(())
    }
}

impl Default for SizingConf {
    fn default() -> Self {
        Self { read_buffer_capacity: DEFAULT_READ_BUFFER_CAPACITY }
    }
}

impl TimingConf {
    pub fn missing_content_timeout(&self) -> Duration {
        Duration::from_millis(self.missing_content_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for TimingConf {
    fn default() -> Self {
        Self {
            missing_content_timeout_ms: duration_ms(DEFAULT_MISSING_CONTENT_TIMEOUT),
            poll_interval_ms: duration_ms(DEFAULT_POLL_INTERVAL),
        }
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

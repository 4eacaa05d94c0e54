//! Graceful stop configuration.
//!
//! Mirrors the stop-related knobs of the process manager config, e.g.:
//!
//! ```yaml
//! signal: 15
//! graceful_timeout: 5s
//! poll_interval: 20ms
//! force_kill: true
//! ```

use crate::signal::SIGINT;
use crate::wait::DEFAULT_POLL_INTERVAL;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Upper bound on the poll interval. Cancellation is observed immediately
/// regardless; this only bounds how late a process exit is noticed.
pub const MAX_POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid graceful stop configuration: {0}")]
    Invalid(String),

    #[error("Failed to parse graceful stop configuration: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// How `stop_process` asks a process to exit and when it gives up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GracefulStopConfig {
    /// Abstract signal number passed to `request_exit`.
    #[serde(default = "default_signal")]
    pub signal: i32,

    /// Budget for the cooperative exit before falling back to force.
    #[serde(default = "default_graceful_timeout", with = "duration_serde")]
    pub graceful_timeout: Duration,

    /// How often the wait checks whether the process is gone.
    #[serde(default = "default_poll_interval", with = "duration_serde")]
    pub poll_interval: Duration,

    /// Terminate the process when the graceful timeout elapses.
    #[serde(default = "default_force_kill")]
    pub force_kill: bool,
}

impl Default for GracefulStopConfig {
    fn default() -> Self {
        Self {
            signal: default_signal(),
            graceful_timeout: default_graceful_timeout(),
            poll_interval: default_poll_interval(),
            force_kill: default_force_kill(),
        }
    }
}

impl GracefulStopConfig {
    /// Parse and validate a YAML document.
    pub fn load_from_string(content: &str) -> Result<Self, ConfigError> {
        let config: GracefulStopConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval.is_zero() {
            return Err(ConfigError::Invalid("poll_interval must be greater than zero".to_string()));
        }
        if self.poll_interval > MAX_POLL_INTERVAL {
            return Err(ConfigError::Invalid(format!(
                "poll_interval must not exceed {:?}, got {:?}",
                MAX_POLL_INTERVAL, self.poll_interval
            )));
        }
        Ok(())
    }
}

fn default_signal() -> i32 {
    SIGINT
}

fn default_graceful_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_poll_interval() -> Duration {
    DEFAULT_POLL_INTERVAL
}

fn default_force_kill() -> bool {
    true
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if duration.subsec_millis() == 0 {
            serializer.serialize_str(&format!("{}s", duration.as_secs()))
        } else {
            serializer.serialize_str(&format!("{}ms", duration.as_millis()))
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_duration(&s).map_err(serde::de::Error::custom)
    }

    pub(super) fn parse_duration(s: &str) -> Result<Duration, String> {
        // Check for "ms" BEFORE "s" since "ms" ends with 's'
        if let Some(num_str) = s.strip_suffix("ms") {
            let millis: u64 = num_str.parse().map_err(|_| format!("Invalid duration: {}", s))?;
            Ok(Duration::from_millis(millis))
        } else if let Some(num_str) = s.strip_suffix('s') {
            let secs: u64 = num_str.parse().map_err(|_| format!("Invalid duration: {}", s))?;
            Ok(Duration::from_secs(secs))
        } else if let Some(num_str) = s.strip_suffix('m') {
            let mins: u64 = num_str.parse().map_err(|_| format!("Invalid duration: {}", s))?;
            let secs = mins.checked_mul(60).ok_or_else(|| format!("Invalid duration: {}", s))?;
            Ok(Duration::from_secs(secs))
        } else {
            Err(format!("Duration must end with 's', 'ms', or 'm': {}", s))
        }
    }
}

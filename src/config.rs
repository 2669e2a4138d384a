//! Runtime parameters for the binary and the replay driver.

use std::env;
use std::time::Duration;

use thiserror::Error;

pub const RETRIES_VAR: &str = "ATOMIC_ACCOUNTS_RETRIES";
pub const STALE_MS_VAR: &str = "ATOMIC_ACCOUNTS_STALE_MS";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{key}: cannot parse '{value}' as an integer")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Attempts allowed per atomic operation in both designs.
    pub retry_count: usize,
    /// Age after which a pending log entry is aborted on the next flatten.
    pub stale_after: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            retry_count: 10,
            stale_after: Duration::from_millis(500),
        }
    }
}

impl Config {
    /// Load from the process environment, keeping defaults for unset keys.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Config::default();
        if let Some(value) = lookup(RETRIES_VAR) {
            config.retry_count = parse(RETRIES_VAR, value)?;
        }
        if let Some(value) = lookup(STALE_MS_VAR) {
            config.stale_after = Duration::from_millis(parse(STALE_MS_VAR, value)?);
        }
        Ok(config)
    }
}

fn parse<T: std::str::FromStr>(key: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Invalid { key, value })
}

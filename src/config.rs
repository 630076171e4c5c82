//! Process configuration from the environment

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_API_BASE: &str = "https://api.telegram.org";
const DEFAULT_POLL_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} is not a valid number: {value:?}")]
    InvalidNumber { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct BotConfig {
    pub token: String,
    pub db_path: PathBuf,
    pub api_base: String,
    pub poll_timeout: Duration,
}

impl BotConfig {
    /// Read `UYP_*` variables from the process environment
    ///
    /// # Errors
    ///
    /// See [`BotConfig::from_lookup`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable source
    ///
    /// # Errors
    ///
    /// `ConfigError::Missing` without a non-blank `UYP_BOT_TOKEN`, and
    /// `ConfigError::InvalidNumber` if `UYP_POLL_TIMEOUT_SECS` is not a whole number.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let token = lookup("UYP_BOT_TOKEN")
            .filter(|t| !t.trim().is_empty())
            .ok_or(ConfigError::Missing("UYP_BOT_TOKEN"))?;

        let db_path = lookup("UYP_DB_PATH").map_or_else(
            || {
                let home = lookup("HOME").unwrap_or_else(|| "/tmp".to_string());
                PathBuf::from(format!("{home}/.uyp-bot/uyp.db"))
            },
            PathBuf::from,
        );

        let api_base = lookup("UYP_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_string());

        let poll_timeout_secs = match lookup("UYP_POLL_TIMEOUT_SECS") {
            Some(value) => value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidNumber {
                    name: "UYP_POLL_TIMEOUT_SECS",
                    value,
                })?,
            None => DEFAULT_POLL_TIMEOUT_SECS,
        };

        Ok(Self {
            token,
            db_path,
            api_base,
            poll_timeout: Duration::from_secs(poll_timeout_secs),
        })
    }
}

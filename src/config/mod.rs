//! Configuration module for the telemetry reporter.
//!
//! Structured configuration loading from environment variables, split into the
//! store connection and the reporter itself.

mod database_env_config;
mod telemetry_env_config;

pub use database_env_config::{DEFAULT_DATABASE_URL, DatabaseEnvConfig};
pub use telemetry_env_config::{
    DEFAULT_CLIENT_SOURCE, TelemetryEnvConfig, frequency_from_hours, validate_consumer_url,
};

use crate::domain::errors::ConfigError;
use anyhow::{Context, Result};
use std::str::FromStr;

/// Main application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub database: DatabaseEnvConfig,
    pub telemetry: TelemetryEnvConfig,
}

impl Config {
    /// Load everything from the process environment. Configuration problems
    /// surface here, before the first tick is scheduled.
    pub fn from_env() -> Result<Self> {
        let database = DatabaseEnvConfig::from_env().context("Invalid database configuration")?;
        let telemetry =
            TelemetryEnvConfig::from_env().context("Invalid telemetry configuration")?;

        Ok(Self {
            database,
            telemetry,
        })
    }
}

/// Parse `name` from `lookup`, falling back to `default` when unset.
pub(crate) fn parse_or<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidValue {
                name,
                value: raw.clone(),
                reason: e.to_string(),
            }),
        None => Ok(default),
    }
}

//! Telemetry reporter configuration parsing from environment variables.

use super::parse_or;
use crate::domain::errors::ConfigError;
use std::time::Duration;
use url::Url;

pub const DEFAULT_CLIENT_SOURCE: &str = "PythonClient";

/// Telemetry environment configuration
#[derive(Debug, Clone)]
pub struct TelemetryEnvConfig {
    pub opt_out: bool,
    /// Always present unless `opt_out` is set.
    pub consumer_url: Option<Url>,
    pub frequency: Duration,
    pub max_collection_attempts: u32,
    pub retry_delay: Duration,
    pub request_timeout: Duration,
    pub client_source: String,
}

impl TelemetryEnvConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let opt_out = parse_or(&lookup, "TELEMETRY_OPT_OUT", false)?;

        let consumer_url = match lookup("TELEMETRY_CONSUMER_URL").filter(|v| !v.trim().is_empty())
        {
            Some(raw) => Some(validate_consumer_url(&raw)?),
            None if opt_out => None,
            None => {
                return Err(ConfigError::Missing {
                    name: "TELEMETRY_CONSUMER_URL",
                });
            }
        };

        let frequency_hours: u64 = parse_or(&lookup, "TELEMETRY_FREQUENCY_HOURS", 1)?;
        let frequency = frequency_from_hours("TELEMETRY_FREQUENCY_HOURS", frequency_hours)?;

        let max_collection_attempts: u32 =
            parse_or(&lookup, "TELEMETRY_MAX_COLLECTION_ATTEMPTS", 3)?;
        if max_collection_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                name: "TELEMETRY_MAX_COLLECTION_ATTEMPTS",
                value: "0".to_string(),
                reason: "must allow at least one attempt".to_string(),
            });
        }

        let retry_delay_ms: u64 = parse_or(&lookup, "TELEMETRY_RETRY_DELAY_MS", 1000)?;
        let request_timeout_secs: u64 = parse_or(&lookup, "TELEMETRY_REQUEST_TIMEOUT_SECS", 30)?;
        if request_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                name: "TELEMETRY_REQUEST_TIMEOUT_SECS",
                value: "0".to_string(),
                reason: "must be at least 1 second".to_string(),
            });
        }

        Ok(Self {
            opt_out,
            consumer_url,
            frequency,
            max_collection_attempts,
            retry_delay: Duration::from_millis(retry_delay_ms),
            request_timeout: Duration::from_secs(request_timeout_secs),
            client_source: lookup("TELEMETRY_CLIENT_SOURCE")
                .unwrap_or_else(|| DEFAULT_CLIENT_SOURCE.to_string()),
        })
    }
}

/// Reject anything that is not an absolute http(s) URL with a host.
pub fn validate_consumer_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim()).map_err(|e| ConfigError::InvalidConsumerUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidConsumerUrl {
            url: raw.to_string(),
            reason: format!("unsupported scheme '{}'", url.scheme()),
        });
    }
    if url.host_str().is_none() {
        return Err(ConfigError::InvalidConsumerUrl {
            url: raw.to_string(),
            reason: "missing host".to_string(),
        });
    }

    Ok(url)
}

/// Tick interval for a frequency given in whole hours. Zero and values too
/// large to express in seconds are rejected.
pub fn frequency_from_hours(name: &'static str, hours: u64) -> Result<Duration, ConfigError> {
    if hours == 0 {
        return Err(ConfigError::InvalidValue {
            name,
            value: "0".to_string(),
            reason: "must be at least 1 hour".to_string(),
        });
    }

    hours
        .checked_mul(60 * 60)
        .map(Duration::from_secs)
        .ok_or_else(|| ConfigError::InvalidValue {
            name,
            value: hours.to_string(),
            reason: "too many hours".to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults_with_consumer_url() {
        let config = TelemetryEnvConfig::from_lookup(lookup_from(&[(
            "TELEMETRY_CONSUMER_URL",
            "https://collector.example.com/api/v1/telemetry",
        )]))
        .unwrap();

        assert!(!config.opt_out);
        assert_eq!(
            config.consumer_url.unwrap().as_str(),
            "https://collector.example.com/api/v1/telemetry"
        );
        assert_eq!(config.frequency, Duration::from_secs(3600));
        assert_eq!(config.max_collection_attempts, 3);
        assert_eq!(config.retry_delay, Duration::from_millis(1000));
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.client_source, "PythonClient");
    }

    #[test]
    fn test_missing_consumer_url_is_rejected() {
        let err = TelemetryEnvConfig::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Missing {
                name: "TELEMETRY_CONSUMER_URL"
            }
        ));
    }

    #[test]
    fn test_opt_out_does_not_need_consumer_url() {
        let config =
            TelemetryEnvConfig::from_lookup(lookup_from(&[("TELEMETRY_OPT_OUT", "true")])).unwrap();
        assert!(config.opt_out);
        assert!(config.consumer_url.is_none());
    }

    #[test]
    fn test_invalid_consumer_url() {
        for raw in ["not a url", "ftp://collector.example.com/", "file:///tmp/x"] {
            let err =
                TelemetryEnvConfig::from_lookup(lookup_from(&[("TELEMETRY_CONSUMER_URL", raw)]))
                    .unwrap_err();
            assert!(
                matches!(err, ConfigError::InvalidConsumerUrl { .. }),
                "expected URL error for {raw}"
            );
        }
    }

    #[test]
    fn test_zero_values_rejected() {
        let err = TelemetryEnvConfig::from_lookup(lookup_from(&[
            ("TELEMETRY_CONSUMER_URL", "http://localhost:8080/"),
            ("TELEMETRY_FREQUENCY_HOURS", "0"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));

        let err = TelemetryEnvConfig::from_lookup(lookup_from(&[
            ("TELEMETRY_CONSUMER_URL", "http://localhost:8080/"),
            ("TELEMETRY_MAX_COLLECTION_ATTEMPTS", "0"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_huge_frequency_is_rejected() {
        let err = TelemetryEnvConfig::from_lookup(lookup_from(&[
            ("TELEMETRY_CONSUMER_URL", "http://localhost:8080/"),
            ("TELEMETRY_FREQUENCY_HOURS", "6000000000000000"),
        ]))
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                name: "TELEMETRY_FREQUENCY_HOURS",
                ..
            }
        ));
    }

    #[test]
    fn test_frequency_from_hours() {
        assert_eq!(
            frequency_from_hours("--frequency-hours", 6).unwrap(),
            Duration::from_secs(6 * 3600)
        );
        assert!(frequency_from_hours("--frequency-hours", 0).is_err());
        let err = frequency_from_hours("--frequency-hours", u64::MAX).unwrap_err();
        assert!(err.to_string().contains("--frequency-hours"));
    }

    #[test]
    fn test_zero_request_timeout_is_rejected() {
        let err = TelemetryEnvConfig::from_lookup(lookup_from(&[
            ("TELEMETRY_CONSUMER_URL", "http://localhost:8080/"),
            ("TELEMETRY_REQUEST_TIMEOUT_SECS", "0"),
        ]))
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                name: "TELEMETRY_REQUEST_TIMEOUT_SECS",
                ..
            }
        ));
    }

    #[test]
    fn test_unparseable_number() {
        let err = TelemetryEnvConfig::from_lookup(lookup_from(&[
            ("TELEMETRY_CONSUMER_URL", "http://localhost:8080/"),
            ("TELEMETRY_RETRY_DELAY_MS", "soon"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("TELEMETRY_RETRY_DELAY_MS"));
    }
}

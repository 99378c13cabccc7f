use std::time::Duration;

use crate::retry::RetryPolicy;

/// Reference cadence between status polls.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2000;

/// Default bound on a single service request.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Default cap on the retry backoff delay.
pub const DEFAULT_BACKOFF_MAX_SECS: u64 = 30;

/// Default job service base URL.
pub const DEFAULT_API_URL: &str = "http://localhost:8000/api";

/// Tracker configuration loaded from environment variables.
///
/// All fields have defaults suitable for a local job service.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackerConfig {
    /// Job service base URL (default: `http://localhost:8000/api`).
    pub api_url: String,
    /// Time between status polls (default: 2 s).
    pub poll_interval: Duration,
    /// Bound on each create/status request (default: 30 s).
    pub request_timeout: Duration,
    /// Backoff applied when polls fail.
    pub retry: RetryPolicy,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        let poll_interval = Duration::from_millis(DEFAULT_POLL_INTERVAL_MS);
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            poll_interval,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            retry: RetryPolicy {
                initial_delay: poll_interval,
                max_delay: Duration::from_secs(DEFAULT_BACKOFF_MAX_SECS),
                ..Default::default()
            },
        }
    }
}

impl TrackerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                        | Default                       |
    /// |--------------------------------|-------------------------------|
    /// | `KARAOKE_API_URL`              | `http://localhost:8000/api`   |
    /// | `KARAOKE_POLL_INTERVAL_MS`     | `2000`                        |
    /// | `KARAOKE_REQUEST_TIMEOUT_SECS` | `30`                          |
    /// | `KARAOKE_MAX_POLL_FAILURES`    | unset (retry forever)         |
    /// | `KARAOKE_BACKOFF_MAX_SECS`     | `30`                          |
    ///
    /// The poll interval, request timeout and failure cap must be non-zero,
    /// and the backoff cap may not be shorter than the poll interval.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = lookup("KARAOKE_API_URL").unwrap_or_else(|| DEFAULT_API_URL.into());

        let poll_interval_ms: u64 = parse_var(
            &lookup,
            "KARAOKE_POLL_INTERVAL_MS",
            DEFAULT_POLL_INTERVAL_MS,
        )?;
        if poll_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                key: "KARAOKE_POLL_INTERVAL_MS",
                reason: "must be greater than zero".into(),
            });
        }

        let poll_interval = Duration::from_millis(poll_interval_ms);

        let request_timeout_secs: u64 = parse_var(
            &lookup,
            "KARAOKE_REQUEST_TIMEOUT_SECS",
            DEFAULT_REQUEST_TIMEOUT_SECS,
        )?;
        if request_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "KARAOKE_REQUEST_TIMEOUT_SECS",
                reason: "must be greater than zero".into(),
            });
        }

        let backoff_max_secs: u64 =
            parse_var(&lookup, "KARAOKE_BACKOFF_MAX_SECS", DEFAULT_BACKOFF_MAX_SECS)?;
        if Duration::from_secs(backoff_max_secs) < poll_interval {
            return Err(ConfigError::Invalid {
                key: "KARAOKE_BACKOFF_MAX_SECS",
                reason: format!("must be at least the poll interval ({poll_interval:?})"),
            });
        }

        let max_consecutive_failures = match lookup("KARAOKE_MAX_POLL_FAILURES") {
            Some(raw) => match parse_value::<u32>("KARAOKE_MAX_POLL_FAILURES", &raw)? {
                0 => {
                    return Err(ConfigError::Invalid {
                        key: "KARAOKE_MAX_POLL_FAILURES",
                        reason: "must be at least 1; unset it to retry forever".into(),
                    })
                }
                max => Some(max),
            },
            None => None,
        };

        Ok(Self {
            api_url,
            poll_interval,
            request_timeout: Duration::from_secs(request_timeout_secs),
            retry: RetryPolicy {
                initial_delay: poll_interval,
                max_delay: Duration::from_secs(backoff_max_secs),
                max_consecutive_failures,
                ..Default::default()
            },
        })
    }
}

fn parse_var<T, F>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => parse_value(key, &raw),
        None => Ok(default),
    }
}

fn parse_value<T>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        key,
        reason: e.to_string(),
    })
}

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{key} is invalid: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use assert_matches::assert_matches;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = TrackerConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, TrackerConfig::default());
        assert_eq!(config.poll_interval, Duration::from_millis(2000));
        assert_eq!(config.retry.max_consecutive_failures, None);
    }

    #[test]
    fn overrides_are_applied() {
        let config = TrackerConfig::from_lookup(lookup_from(&[
            ("KARAOKE_API_URL", "http://jobs.internal/api"),
            ("KARAOKE_POLL_INTERVAL_MS", "500"),
            ("KARAOKE_REQUEST_TIMEOUT_SECS", "5"),
            ("KARAOKE_MAX_POLL_FAILURES", "4"),
            ("KARAOKE_BACKOFF_MAX_SECS", "10"),
        ]))
        .unwrap();

        assert_eq!(config.api_url, "http://jobs.internal/api");
        assert_eq!(config.poll_interval, Duration::from_millis(500));
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.retry.initial_delay, Duration::from_millis(500));
        assert_eq!(config.retry.max_delay, Duration::from_secs(10));
        assert_eq!(config.retry.max_consecutive_failures, Some(4));
    }

    #[test]
    fn unparsable_value_is_reported_with_its_key() {
        let err = TrackerConfig::from_lookup(lookup_from(&[("KARAOKE_POLL_INTERVAL_MS", "soon")]))
            .unwrap_err();
        assert_matches!(err, ConfigError::Invalid { key: "KARAOKE_POLL_INTERVAL_MS", .. });
    }

    #[test]
    fn zero_poll_interval_is_rejected() {
        let err = TrackerConfig::from_lookup(lookup_from(&[("KARAOKE_POLL_INTERVAL_MS", "0")]))
            .unwrap_err();
        assert_matches!(err, ConfigError::Invalid { key: "KARAOKE_POLL_INTERVAL_MS", .. });
    }

    #[test]
    fn zero_request_timeout_is_rejected() {
        let err =
            TrackerConfig::from_lookup(lookup_from(&[("KARAOKE_REQUEST_TIMEOUT_SECS", "0")]))
                .unwrap_err();
        assert_matches!(err, ConfigError::Invalid { key: "KARAOKE_REQUEST_TIMEOUT_SECS", .. });
    }

    #[test]
    fn zero_backoff_cap_is_rejected() {
        let err = TrackerConfig::from_lookup(lookup_from(&[("KARAOKE_BACKOFF_MAX_SECS", "0")]))
            .unwrap_err();
        assert_matches!(err, ConfigError::Invalid { key: "KARAOKE_BACKOFF_MAX_SECS", .. });
    }

    #[test]
    fn backoff_cap_below_poll_interval_is_rejected() {
        let err = TrackerConfig::from_lookup(lookup_from(&[
            ("KARAOKE_POLL_INTERVAL_MS", "5000"),
            ("KARAOKE_BACKOFF_MAX_SECS", "4"),
        ]))
        .unwrap_err();
        assert_matches!(err, ConfigError::Invalid { key: "KARAOKE_BACKOFF_MAX_SECS", .. });
    }

    #[test]
    fn backoff_cap_equal_to_poll_interval_is_accepted() {
        let config = TrackerConfig::from_lookup(lookup_from(&[
            ("KARAOKE_POLL_INTERVAL_MS", "5000"),
            ("KARAOKE_BACKOFF_MAX_SECS", "5"),
        ]))
        .unwrap();
        assert_eq!(config.retry.max_delay, config.retry.initial_delay);
    }

    #[test]
    fn zero_max_poll_failures_is_rejected() {
        let err = TrackerConfig::from_lookup(lookup_from(&[("KARAOKE_MAX_POLL_FAILURES", "0")]))
            .unwrap_err();
        assert_matches!(err, ConfigError::Invalid { key: "KARAOKE_MAX_POLL_FAILURES", .. });
    }
}

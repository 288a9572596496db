//! Feed configuration
//!
//! Defaults match the remote service's stock deployment; every field can be
//! overridden from the environment.

use std::env;
use std::time::Duration;

use types::window::{DEFAULT_PAGE_LIMIT, DEFAULT_STEP};

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("base_url must not be empty")]
    EmptyBaseUrl,

    #[error("page_limit must be positive")]
    ZeroPageLimit,

    #[error("step must be positive")]
    ZeroStep,

    #[error("command_buffer must be positive")]
    ZeroCommandBuffer,
}

/// Configuration for the chart feed.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedConfig {
    /// Base URL of the remote service, without trailing slash.
    pub base_url: String,
    /// Records requested per window.
    pub page_limit: u32,
    /// Offset step for next/previous.
    pub step: u64,
    /// Per-request timeout.
    pub request_timeout: Duration,
    /// Capacity of the command channel into the driver.
    pub command_buffer: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5001".to_string(),
            page_limit: DEFAULT_PAGE_LIMIT,
            step: DEFAULT_STEP,
            request_timeout: Duration::from_millis(10_000),
            command_buffer: 64,
        }
    }
}

impl FeedConfig {
    /// Build from `CHART_FEED_*` environment variables, falling back to
    /// defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: env_str("CHART_FEED_BASE_URL", &defaults.base_url)
                .trim_end_matches('/')
                .to_string(),
            page_limit: env_parse("CHART_FEED_PAGE_LIMIT", defaults.page_limit),
            step: env_parse("CHART_FEED_STEP", defaults.step),
            request_timeout: Duration::from_millis(env_parse(
                "CHART_FEED_TIMEOUT_MS",
                defaults.request_timeout.as_millis() as u64,
            )),
            command_buffer: env_parse("CHART_FEED_COMMAND_BUFFER", defaults.command_buffer),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::EmptyBaseUrl);
        }
        if self.page_limit == 0 {
            return Err(ConfigError::ZeroPageLimit);
        }
        if self.step == 0 {
            return Err(ConfigError::ZeroStep);
        }
        if self.command_buffer == 0 {
            return Err(ConfigError::ZeroCommandBuffer);
        }
        Ok(())
    }

    /// Absolute URL for an endpoint path such as `/HomeScreen`.
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

fn env_str(name: &str, default: &str) -> String {
    env::var(name)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = FeedConfig::default();
        assert_eq!(config.page_limit, 50);
        assert_eq!(config.step, 7);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_values() {
        let config = FeedConfig {
            page_limit: 0,
            ..FeedConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroPageLimit));

        let config = FeedConfig {
            step: 0,
            ..FeedConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroStep));

        let config = FeedConfig {
            base_url: " ".into(),
            ..FeedConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::EmptyBaseUrl));
    }

    #[test]
    fn test_endpoint_joins_single_slash() {
        let config = FeedConfig {
            base_url: "http://10.0.0.2:5001/".into(),
            ..FeedConfig::default()
        };
        assert_eq!(config.endpoint("/HomeScreen"), "http://10.0.0.2:5001/HomeScreen");
        assert_eq!(
            config.endpoint("dropdown-options"),
            "http://10.0.0.2:5001/dropdown-options"
        );
    }
}

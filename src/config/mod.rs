//! Environment-backed configuration.
//!
//! All settings have defaults. Override with `SHINSA_*` environment
//! variables.

mod error;

#[cfg(test)]
mod tests;

pub use error::ConfigError;

use std::env;
use std::time::Duration;

/// Engine configuration loaded from environment variables.
///
/// Use [`MatchConfig::from_env`] to read `SHINSA_*` overrides on top of
/// defaults, then [`MatchConfig::validate`].
#[derive(Debug, Clone)]
pub struct MatchConfig {
    /// Minimum cosine similarity for a semantic match. Default: `0.75`.
    pub similarity_threshold: f32,

    /// Provider call attempts per cache key, first call included.
    /// Default: `3`.
    pub max_retries: u32,

    /// Backoff before the first retry; doubles per retry. Default: `200ms`.
    pub retry_backoff: Duration,

    /// Max entries in the embedding cache. Default: `10_000`.
    pub cache_capacity: u64,
}

pub const DEFAULT_SIMILARITY_THRESHOLD: f32 = 0.75;

const MAX_RETRY_ATTEMPTS: u32 = 10;

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            max_retries: 3,
            retry_backoff: Duration::from_millis(200),
            cache_capacity: 10_000,
        }
    }
}

impl MatchConfig {
    const ENV_THRESHOLD: &'static str = "SHINSA_SIMILARITY_THRESHOLD";
    const ENV_MAX_RETRIES: &'static str = "SHINSA_MAX_RETRIES";
    const ENV_RETRY_BACKOFF_MS: &'static str = "SHINSA_RETRY_BACKOFF_MS";
    const ENV_CACHE_CAPACITY: &'static str = "SHINSA_CACHE_CAPACITY";

    /// Loads configuration from environment variables (falling back to
    /// defaults).
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let similarity_threshold =
            Self::parse_from_env(Self::ENV_THRESHOLD, defaults.similarity_threshold)?;
        let max_retries = Self::parse_from_env(Self::ENV_MAX_RETRIES, defaults.max_retries)?;
        let backoff_ms = Self::parse_from_env(
            Self::ENV_RETRY_BACKOFF_MS,
            defaults.retry_backoff.as_millis() as u64,
        )?;
        let cache_capacity =
            Self::parse_from_env(Self::ENV_CACHE_CAPACITY, defaults.cache_capacity)?;

        let config = Self {
            similarity_threshold,
            max_retries,
            retry_backoff: Duration::from_millis(backoff_ms),
            cache_capacity,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validates value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.similarity_threshold.is_finite()
            || self.similarity_threshold <= 0.0
            || self.similarity_threshold > 1.0
        {
            return Err(ConfigError::InvalidThreshold {
                value: self.similarity_threshold,
            });
        }
        if self.max_retries == 0 || self.max_retries > MAX_RETRY_ATTEMPTS {
            return Err(ConfigError::InvalidRetries {
                value: self.max_retries,
                max: MAX_RETRY_ATTEMPTS,
            });
        }
        Ok(())
    }

    fn parse_from_env<T: std::str::FromStr>(
        var: &'static str,
        default: T,
    ) -> Result<T, ConfigError> {
        match env::var(var) {
            Ok(value) => value
                .parse()
                .map_err(|_| ConfigError::InvalidValue { var, value }),
            Err(_) => Ok(default),
        }
    }
}

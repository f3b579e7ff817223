use std::time::Duration;

use super::{ConfigError, DEFAULT_SIMILARITY_THRESHOLD, MatchConfig};

#[test]
fn test_defaults_are_valid() {
    let config = MatchConfig::default();
    config.validate().expect("defaults must validate");
    assert_eq!(config.similarity_threshold, DEFAULT_SIMILARITY_THRESHOLD);
    assert_eq!(config.max_retries, 3);
    assert_eq!(config.retry_backoff, Duration::from_millis(200));
}

#[test]
fn test_from_env_without_overrides_matches_defaults() {
    let config = MatchConfig::from_env().expect("no overrides set");
    assert_eq!(
        config.similarity_threshold,
        MatchConfig::default().similarity_threshold
    );
    assert_eq!(config.cache_capacity, MatchConfig::default().cache_capacity);
}

#[test]
fn test_threshold_out_of_range_rejected() {
    for value in [0.0, -0.2, 1.5, f32::NAN] {
        let config = MatchConfig {
            similarity_threshold: value,
            ..MatchConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidThreshold { .. })
        ));
    }
}

#[test]
fn test_threshold_of_exactly_one_allowed() {
    let config = MatchConfig {
        similarity_threshold: 1.0,
        ..MatchConfig::default()
    };
    config.validate().expect("1.0 means exact-only matching");
}

#[test]
fn test_retry_bounds_enforced() {
    for value in [0, 11] {
        let config = MatchConfig {
            max_retries: value,
            ..MatchConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidRetries { .. })
        ));
    }
}

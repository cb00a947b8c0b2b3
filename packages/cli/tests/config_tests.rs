// ABOUTME: Tests for environment-driven server configuration
// ABOUTME: Uses a map lookup so tests never mutate the process environment

use std::collections::HashMap;
use std::time::Duration;

use pretty_assertions::assert_eq;
use tokenvault_cli::{Config, ConfigError, StateCacheBackend};

fn config_from(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    Config::from_lookup(|key| vars.get(key).cloned())
}

#[test]
fn test_config_defaults() {
    let config = config_from(&[]).unwrap();

    assert_eq!(config.port, 8080);
    assert_eq!(config.host, "127.0.0.1");
    assert_eq!(config.database_url, "sqlite://tokenvault.db");
    assert_eq!(config.state_cache, StateCacheBackend::Database);
    assert_eq!(config.reap_interval, Duration::from_secs(60));
    assert!(!config.oauth.dev_mode);
    assert!(config.oauth.force_consent);
    assert_eq!(config.oauth.state_ttl, Duration::from_secs(180));
    assert_eq!(config.oauth.scopes.len(), 2);
}

#[test]
fn test_config_overrides() {
    let config = config_from(&[
        ("PORT", "3000"),
        ("DATABASE_URL", "sqlite:///var/lib/tokenvault/vault.db"),
        ("TOKENVAULT_STATE_CACHE", "memory"),
        ("TOKENVAULT_DEV_MODE", "true"),
        ("TOKENVAULT_FORCE_CONSENT", "off"),
        ("TOKENVAULT_STATE_TTL_SECS", "60"),
        ("TOKENVAULT_EXCHANGE_TIMEOUT_SECS", "5"),
        ("TOKENVAULT_TOKEN_URL", "http://localhost:9000/token"),
        ("TOKENVAULT_SCOPES", "openid, email"),
    ])
    .unwrap();

    assert_eq!(config.port, 3000);
    assert_eq!(config.database_url, "sqlite:///var/lib/tokenvault/vault.db");
    assert_eq!(config.state_cache, StateCacheBackend::Memory);
    assert!(config.oauth.dev_mode);
    assert!(!config.oauth.force_consent);
    assert_eq!(config.oauth.state_ttl, Duration::from_secs(60));
    assert_eq!(config.oauth.exchange_timeout, Duration::from_secs(5));
    assert_eq!(config.oauth.token_url, "http://localhost:9000/token");
    assert_eq!(config.oauth.scopes, vec!["openid".to_string(), "email".to_string()]);
}

#[test]
fn test_config_invalid_port() {
    let result = config_from(&[("PORT", "not-a-number")]);
    assert!(matches!(result.unwrap_err(), ConfigError::InvalidPort(_)));
}

#[test]
fn test_config_port_zero() {
    let result = config_from(&[("PORT", "0")]);
    assert!(matches!(result.unwrap_err(), ConfigError::PortOutOfRange(0)));
}

#[test]
fn test_config_invalid_state_cache() {
    let result = config_from(&[("TOKENVAULT_STATE_CACHE", "memcache")]);
    assert!(matches!(result.unwrap_err(), ConfigError::InvalidStateCache(_)));
}

#[test]
fn test_config_invalid_values() {
    assert!(matches!(
        config_from(&[("TOKENVAULT_DEV_MODE", "maybe")]).unwrap_err(),
        ConfigError::InvalidBool { .. }
    ));
    assert!(matches!(
        config_from(&[("TOKENVAULT_STATE_TTL_SECS", "0")]).unwrap_err(),
        ConfigError::InvalidDuration { .. }
    ));
    assert!(matches!(
        config_from(&[("TOKENVAULT_SCOPES", " , ")]).unwrap_err(),
        ConfigError::Empty("TOKENVAULT_SCOPES")
    ));
}

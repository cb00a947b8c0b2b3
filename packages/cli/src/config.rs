// ABOUTME: Server configuration loaded from environment variables
// ABOUTME: Parses listen address, database, state cache backend and OAuth settings

use std::env;
use std::num::ParseIntError;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use tokenvault_auth::OAuthSettings;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid port number: {0}")]
    InvalidPort(#[source] ParseIntError),
    #[error("Port {0} is out of valid range (1-65535)")]
    PortOutOfRange(u16),
    #[error("Invalid state cache backend: {0}")]
    InvalidStateCache(String),
    #[error("Invalid boolean for {name}: {value}")]
    InvalidBool { name: &'static str, value: String },
    #[error("Invalid duration for {name}: {value}")]
    InvalidDuration { name: &'static str, value: String },
    #[error("{0} must not be empty")]
    Empty(&'static str),
}

/// Where pending login states are kept
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateCacheBackend {
    Database, // Shared by every instance on the same database
    Memory,   // Single process only
}

impl FromStr for StateCacheBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "database" | "sqlite" => Ok(StateCacheBackend::Database),
            "memory" => Ok(StateCacheBackend::Memory),
            _ => Err(ConfigError::InvalidStateCache(s.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub state_cache: StateCacheBackend,
    pub reap_interval: Duration,
    pub oauth: OAuthSettings,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from any key lookup, falling back to defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = lookup("PORT")
            .unwrap_or_else(|| "8080".to_string())
            .parse::<u16>()
            .map_err(ConfigError::InvalidPort)?;

        if port == 0 {
            return Err(ConfigError::PortOutOfRange(port));
        }

        let host = lookup("TOKENVAULT_HOST").unwrap_or_else(|| "127.0.0.1".to_string());

        let database_url =
            lookup("DATABASE_URL").unwrap_or_else(|| "sqlite://tokenvault.db".to_string());
        if database_url.trim().is_empty() {
            return Err(ConfigError::Empty("DATABASE_URL"));
        }

        let state_cache = lookup("TOKENVAULT_STATE_CACHE")
            .unwrap_or_else(|| "database".to_string())
            .parse::<StateCacheBackend>()?;

        let reap_interval = parse_secs(&lookup, "TOKENVAULT_REAP_INTERVAL_SECS")?
            .unwrap_or(Duration::from_secs(60));

        let mut oauth = OAuthSettings::default();

        if let Some(url) = lookup("TOKENVAULT_AUTH_URL") {
            oauth.auth_url = url;
        }
        if let Some(url) = lookup("TOKENVAULT_TOKEN_URL") {
            oauth.token_url = url;
        }
        if let Some(scopes) = lookup("TOKENVAULT_SCOPES") {
            let scopes: Vec<String> = scopes
                .split(|c: char| c == ',' || c.is_whitespace())
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
            if scopes.is_empty() {
                return Err(ConfigError::Empty("TOKENVAULT_SCOPES"));
            }
            oauth.scopes = scopes;
        }
        if let Some(dev_mode) = parse_bool(&lookup, "TOKENVAULT_DEV_MODE")? {
            oauth.dev_mode = dev_mode;
        }
        if let Some(force_consent) = parse_bool(&lookup, "TOKENVAULT_FORCE_CONSENT")? {
            oauth.force_consent = force_consent;
        }
        if let Some(ttl) = parse_secs(&lookup, "TOKENVAULT_STATE_TTL_SECS")? {
            oauth.state_ttl = ttl;
        }
        if let Some(timeout) = parse_secs(&lookup, "TOKENVAULT_EXCHANGE_TIMEOUT_SECS")? {
            oauth.exchange_timeout = timeout;
        }

        Ok(Config {
            host,
            port,
            database_url,
            state_cache,
            reap_interval,
            oauth,
        })
    }
}

fn parse_bool<F>(lookup: &F, name: &'static str) -> Result<Option<bool>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(None),
        Some(value) => match value.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(Some(true)),
            "0" | "false" | "no" | "off" => Ok(Some(false)),
            _ => Err(ConfigError::InvalidBool { name, value }),
        },
    }
}

/// Whole seconds, must be at least 1
fn parse_secs<F>(lookup: &F, name: &'static str) -> Result<Option<Duration>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(None),
        Some(value) => match value.trim().parse::<u64>() {
            Ok(secs) if secs > 0 => Ok(Some(Duration::from_secs(secs))),
            _ => Err(ConfigError::InvalidDuration { name, value }),
        },
    }
}

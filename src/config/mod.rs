//! Configuration module - environment variable parsing

use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::game::DuelRules;

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Server binding address
    pub server_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Emit JSON log lines instead of the human readable format
    pub log_json: bool,
    /// Allowed client origins for CORS (empty = same origin only)
    pub client_origins: Vec<String>,

    /// Arena size, health and cooldown
    pub rules: DuelRules,
    /// Fixed simulation period
    pub tick_period: Duration,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Hosting platforms provide PORT, fall back to SERVER_ADDR or default
        let server_addr = match lookup("PORT") {
            Some(port) => format!("0.0.0.0:{}", port),
            None => lookup("SERVER_ADDR").unwrap_or_else(|| "0.0.0.0:8080".to_string()),
        };

        let client_origins = lookup("CLIENT_ORIGIN")
            .map(|raw| {
                raw.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let defaults = DuelRules::default();
        let rules = DuelRules {
            arena_width: parse_at_least(&lookup, "ARENA_WIDTH", defaults.arena_width, 1)?,
            arena_height: parse_at_least(&lookup, "ARENA_HEIGHT", defaults.arena_height, 1)?,
            max_hp: parse_at_least(&lookup, "MAX_HP", defaults.max_hp, 1)?,
            shot_cooldown: parse_var(&lookup, "SHOT_COOLDOWN_TICKS", defaults.shot_cooldown)?,
        };

        let tick_ms: u64 = parse_at_least(&lookup, "TICK_MS", 100, 1)?;

        Ok(Self {
            server_addr: server_addr
                .parse()
                .map_err(|_| ConfigError::InvalidAddress)?,
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            log_json: matches!(lookup("LOG_FORMAT").as_deref(), Some("json")),
            client_origins,
            rules,
            tick_period: Duration::from_millis(tick_ms),
        })
    }
}

fn parse_var<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value: raw }),
        None => Ok(default),
    }
}

fn parse_at_least<F, T>(lookup: &F, key: &'static str, default: T, min: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + PartialOrd + ToString,
{
    let value = parse_var(lookup, key, default)?;
    if value < min {
        return Err(ConfigError::OutOfRange {
            key,
            min: min.to_string(),
        });
    }
    Ok(value)
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },

    #[error("{key} must be at least {min}")]
    OutOfRange { key: &'static str, min: String },

    #[error("Invalid server address format")]
    InvalidAddress,
}

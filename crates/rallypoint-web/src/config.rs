use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Server configuration, read from the environment at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    /// PostgreSQL connection URL. When unset, the server runs on the
    /// in-memory store alone.
    #[serde(default, skip_serializing)]
    pub database_url: Option<String>,
    /// Bound on each durable-store call before failing over.
    pub store_timeout_ms: u64,
    pub max_connections: u32,
    /// Goal reported for petitions without a record.
    pub default_goal: i64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            database_url: None,
            store_timeout_ms: 5000,
            max_connections: 5,
            default_goal: 10_000,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            port: parse_var("RALLYPOINT_PORT", defaults.port),
            database_url: std::env::var("DATABASE_URL")
                .ok()
                .filter(|url| !url.trim().is_empty()),
            store_timeout_ms: parse_var("RALLYPOINT_STORE_TIMEOUT_MS", defaults.store_timeout_ms),
            max_connections: parse_var("RALLYPOINT_MAX_CONNECTIONS", defaults.max_connections),
            default_goal: parse_var("RALLYPOINT_DEFAULT_GOAL", defaults.default_goal),
        }
    }

    pub const fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }
}

fn parse_var<T>(key: &str, default: T) -> T
where
    T: FromStr + std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, %default, "invalid value, using default");
            default
        }),
        Err(_) => default,
    }
}

//! Runtime configuration loaded from environment variables

use std::env;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_HIVE_API_URL: &str = "https://api.hive.blog";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub hive_api_url: String,
    pub bind_addr: String,
    /// Freshness window for chain globals and assembled user stats
    pub cache_ttl_secs: u64,
    /// Number of history entries requested per lookup
    pub history_limit: u32,
    pub history_window_days: i64,
    pub rpc_timeout_secs: u64,
    pub fanout: FanoutConfig,
}

/// Limits for speculative delegation lookups
#[derive(Debug, Clone, Copy)]
pub struct FanoutConfig {
    pub concurrency: usize,
    pub deadline: Duration,
    pub max_candidates: usize,
}

impl Default for FanoutConfig {
    fn default() -> Self {
        Self {
            concurrency: 8,
            deadline: Duration::from_secs(20),
            max_candidates: 100,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            hive_api_url: DEFAULT_HIVE_API_URL.to_string(),
            bind_addr: "0.0.0.0:3000".to_string(),
            cache_ttl_secs: 60,
            history_limit: 1000,
            history_window_days: 7,
            rpc_timeout_secs: 30,
            fanout: FanoutConfig::default(),
        }
    }
}

impl AppConfig {
    /// Build config from the process environment, keeping defaults for unset
    /// or unparseable values.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let fanout = FanoutConfig {
            concurrency: env_or("FANOUT_CONCURRENCY", defaults.fanout.concurrency).max(1),
            deadline: Duration::from_secs(env_or(
                "FANOUT_DEADLINE_SECS",
                defaults.fanout.deadline.as_secs(),
            )),
            max_candidates: env_or("FANOUT_CANDIDATES", defaults.fanout.max_candidates),
        };

        Self {
            hive_api_url: env::var("HIVE_API_URL").unwrap_or(defaults.hive_api_url),
            bind_addr: env::var("BIND_ADDR").unwrap_or(defaults.bind_addr),
            cache_ttl_secs: env_or("CACHE_TTL_SECS", defaults.cache_ttl_secs),
            history_limit: env_or("HISTORY_LIMIT", defaults.history_limit),
            history_window_days: env_or("HISTORY_WINDOW_DAYS", defaults.history_window_days),
            rpc_timeout_secs: env_or("RPC_TIMEOUT_SECS", defaults.rpc_timeout_secs),
            fanout,
        }
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

fn env_or<T>(key: &str, default: T) -> T
where
    T: FromStr + std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => parse_or(key, &raw, default),
        Err(_) => default,
    }
}

fn parse_or<T>(key: &str, raw: &str, default: T) -> T
where
    T: FromStr + std::fmt::Display,
{
    match raw.trim().parse::<T>() {
        Ok(value) => value,
        Err(_) => {
            tracing::warn!("Invalid value '{}' for {}, using default {}", raw, key, default);
            default
        }
    }
}

//! Server Configuration
//!
//! Read once at startup from the environment (`.env` is loaded first).

use limiter::{ConsistencyMode, LimiterConfig, RateLimitConfig};
use std::env;
use std::fmt::Display;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value:?} ({reason})")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Where window records are kept
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Redis,
    /// Process-local; only for a single instance
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "redis" => Ok(StoreBackend::Redis),
            "memory" => Ok(StoreBackend::Memory),
            _ => Err("expected \"redis\" or \"memory\"".to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub store: StoreBackend,
    pub redis_url: String,
    pub redis_key_prefix: String,
    pub limiter: LimiterConfig,
    pub request_timeout: Duration,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = RateLimitConfig::default();

        let max_requests = parse_var(&lookup, "RATE_LIMIT_MAX_REQUESTS", defaults.max_requests)?;
        let window_secs =
            parse_var(&lookup, "RATE_LIMIT_WINDOW_SECS", defaults.window.as_secs())?;
        if window_secs == 0 {
            return Err(ConfigError::Invalid {
                name: "RATE_LIMIT_WINDOW_SECS",
                value: "0".to_string(),
                reason: "window must be at least one second".to_string(),
            });
        }

        let limiter = LimiterConfig::new(RateLimitConfig::new(max_requests, window_secs))
            .with_mode(parse_var(
                &lookup,
                "RATE_LIMIT_MODE",
                ConsistencyMode::ReadModifyWrite,
            )?)
            .with_trust_forwarded(parse_var(&lookup, "RATE_LIMIT_TRUST_FORWARDED", true)?);

        Ok(Self {
            bind_addr: parse_var(&lookup, "BIND_ADDR", SocketAddr::from(([127, 0, 0, 1], 8000)))?,
            store: parse_var(&lookup, "COUNTER_STORE", StoreBackend::Redis)?,
            redis_url: redis_url(&lookup)?,
            redis_key_prefix: lookup("REDIS_KEY_PREFIX").unwrap_or_default(),
            limiter,
            request_timeout: Duration::from_secs(parse_var(
                &lookup,
                "REQUEST_TIMEOUT_SECS",
                15u64,
            )?),
        })
    }
}

/// `REDIS_URL` wins; otherwise built from address, password and database index
fn redis_url<F>(lookup: &F) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = lookup("REDIS_URL").filter(|url| !url.trim().is_empty()) {
        return Ok(url);
    }

    let addr = lookup("REDIS_ADDR").unwrap_or_else(|| "localhost:6379".to_string());
    let db: u32 = parse_var(lookup, "REDIS_DB", 0)?;
    let auth = match lookup("REDIS_PASSWORD").filter(|p| !p.is_empty()) {
        Some(password) => format!(":{password}@"),
        None => String::new(),
    };

    Ok(format!("redis://{auth}{addr}/{db}"))
}

fn parse_var<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    match lookup(name) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            value: raw.clone(),
            reason: e.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.bind_addr, "127.0.0.1:8000".parse().unwrap());
        assert_eq!(config.store, StoreBackend::Redis);
        assert_eq!(config.redis_url, "redis://localhost:6379/0");
        assert_eq!(config.redis_key_prefix, "");
        assert_eq!(config.limiter.rate_limit.max_requests, 10);
        assert_eq!(config.limiter.rate_limit.window_secs(), 20);
        assert_eq!(config.limiter.mode, ConsistencyMode::ReadModifyWrite);
        assert!(config.limiter.trust_forwarded);
        assert_eq!(config.request_timeout, Duration::from_secs(15));
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("RATE_LIMIT_MAX_REQUESTS", "100"),
            ("RATE_LIMIT_WINDOW_SECS", "60"),
            ("RATE_LIMIT_MODE", "atomic"),
            ("RATE_LIMIT_TRUST_FORWARDED", "false"),
            ("COUNTER_STORE", "memory"),
            ("BIND_ADDR", "0.0.0.0:9000"),
        ])
        .unwrap();
        assert_eq!(config.limiter.rate_limit.max_requests, 100);
        assert_eq!(config.limiter.rate_limit.window_secs(), 60);
        assert_eq!(config.limiter.mode, ConsistencyMode::Atomic);
        assert!(!config.limiter.trust_forwarded);
        assert_eq!(config.store, StoreBackend::Memory);
        assert_eq!(config.bind_addr.port(), 9000);
    }

    #[test]
    fn test_redis_url_from_parts() {
        let config = config_from(&[
            ("REDIS_ADDR", "cache.internal:6380"),
            ("REDIS_PASSWORD", "hunter2"),
            ("REDIS_DB", "3"),
        ])
        .unwrap();
        assert_eq!(config.redis_url, "redis://:hunter2@cache.internal:6380/3");
    }

    #[test]
    fn test_redis_url_override() {
        let config = config_from(&[
            ("REDIS_URL", "redis://redis:6379/1"),
            ("REDIS_ADDR", "ignored:1"),
        ])
        .unwrap();
        assert_eq!(config.redis_url, "redis://redis:6379/1");
    }

    #[test]
    fn test_invalid_values() {
        let err = config_from(&[("RATE_LIMIT_MAX_REQUESTS", "lots")]).unwrap_err();
        assert!(err.to_string().contains("RATE_LIMIT_MAX_REQUESTS"));

        assert!(config_from(&[("RATE_LIMIT_WINDOW_SECS", "0")]).is_err());
        assert!(config_from(&[("RATE_LIMIT_MODE", "sliding")]).is_err());
        assert!(config_from(&[("COUNTER_STORE", "postgres")]).is_err());
    }
}

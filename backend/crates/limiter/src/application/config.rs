//! Application Configuration
//!
//! Configuration for the rate limiter application layer.

use std::fmt;
use std::str::FromStr;

pub use platform::rate_limit::RateLimitConfig;

/// How the counter store is driven for a single check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConsistencyMode {
    /// Separate read and write round-trips.
    ///
    /// Concurrent requests from one client can read the same count and
    /// both be admitted, under-counting bursts.
    #[default]
    ReadModifyWrite,
    /// Single store-side atomic evaluation; bursts serialize per client
    Atomic,
}

impl ConsistencyMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConsistencyMode::ReadModifyWrite => "read-modify-write",
            ConsistencyMode::Atomic => "atomic",
        }
    }
}

impl fmt::Display for ConsistencyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown consistency mode: {0:?} (expected \"read-modify-write\" or \"atomic\")")]
pub struct UnknownModeError(String);

impl FromStr for ConsistencyMode {
    type Err = UnknownModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "read-modify-write" | "rmw" => Ok(ConsistencyMode::ReadModifyWrite),
            "atomic" => Ok(ConsistencyMode::Atomic),
            _ => Err(UnknownModeError(s.to_string())),
        }
    }
}

/// Rate limiter application configuration
#[derive(Debug, Clone)]
pub struct LimiterConfig {
    /// Window length and request cap
    pub rate_limit: RateLimitConfig,
    /// Store access strategy
    pub mode: ConsistencyMode,
    /// Whether `X-Forwarded-For` is consulted before the peer address
    pub trust_forwarded: bool,
}

impl Default for LimiterConfig {
    fn default() -> Self {
        Self::new(RateLimitConfig::default())
    }
}

impl LimiterConfig {
    pub fn new(rate_limit: RateLimitConfig) -> Self {
        Self {
            rate_limit,
            mode: ConsistencyMode::default(),
            trust_forwarded: true,
        }
    }

    pub fn with_mode(mut self, mode: ConsistencyMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_trust_forwarded(mut self, trust: bool) -> Self {
        self.trust_forwarded = trust;
        self
    }
}

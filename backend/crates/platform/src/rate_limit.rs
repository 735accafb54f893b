//! Rate Limiting Infrastructure
//!
//! Common rate limiting vocabulary shared by storage backends and the
//! HTTP layer.

use std::time::Duration;

/// Rate limit configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Maximum requests allowed in the window
    pub max_requests: u32,
    /// Fixed window length
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 10,
            window: Duration::from_secs(20),
        }
    }
}

impl RateLimitConfig {
    pub fn new(max_requests: u32, window_secs: u64) -> Self {
        Self {
            max_requests,
            window: Duration::from_secs(window_secs),
        }
    }

    /// Window length in whole seconds, the unit window starts are stored in
    pub fn window_secs(&self) -> i64 {
        i64::try_from(self.window.as_secs()).unwrap_or(i64::MAX)
    }
}

/// Outcome of a rate limit check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Let the request through
    Admit,
    /// Reject until the window rolls over
    Deny,
}

impl Decision {
    /// `true` when the request must be rejected
    pub fn is_blocked(self) -> bool {
        matches!(self, Decision::Deny)
    }

    pub fn is_admitted(self) -> bool {
        matches!(self, Decision::Admit)
    }
}

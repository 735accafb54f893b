//! Window Counter Use Case
//!
//! Decides admit/deny for a request by resolving its client and running
//! the fixed-window algorithm against the shared counter store.

use crate::application::config::{ConsistencyMode, LimiterConfig};
use crate::domain::clock::{Clock, SystemClock};
use crate::domain::repository::CounterStore;
use crate::domain::services::{WindowTransition, evaluate_window};
use crate::error::{RateLimitError, RateLimitResult};
use axum::http::HeaderMap;
use platform::client::{ClientIdentifier, ClientKey};
use platform::rate_limit::Decision;
use std::sync::Arc;

/// Fixed-window rate limiter over a shared [`CounterStore`]
pub struct WindowCounter<S, C = SystemClock>
where
    S: CounterStore,
    C: Clock,
{
    store: Arc<S>,
    clock: C,
    identifier: ClientIdentifier,
    config: Arc<LimiterConfig>,
}

impl<S> WindowCounter<S, SystemClock>
where
    S: CounterStore,
{
    pub fn new(store: Arc<S>, config: Arc<LimiterConfig>) -> Self {
        Self::with_clock(store, config, SystemClock)
    }
}

impl<S, C> WindowCounter<S, C>
where
    S: CounterStore,
    C: Clock,
{
    pub fn with_clock(store: Arc<S>, config: Arc<LimiterConfig>, clock: C) -> Self {
        let identifier = ClientIdentifier::new().trust_forwarded(config.trust_forwarded);
        Self {
            store,
            clock,
            identifier,
            config,
        }
    }

    pub fn config(&self) -> &LimiterConfig {
        &self.config
    }

    /// Check a request given its headers and `host:port` peer address.
    ///
    /// ## Returns
    /// * `Ok(Decision::Admit)` - Let the request through; also returned when
    ///   the client cannot be identified
    /// * `Ok(Decision::Deny)` - Client exhausted its window
    /// * `Err(_)` - Counter store failure; the request was not evaluated
    pub async fn check(&self, headers: &HeaderMap, remote_addr: &str) -> RateLimitResult<Decision> {
        let key = match self.identifier.resolve(headers, remote_addr) {
            Ok(key) => key,
            Err(e) => {
                RateLimitError::from(e).log();
                return Ok(Decision::Admit);
            }
        };

        self.check_key(&key).await
    }

    /// Check a request for an already resolved client.
    pub async fn check_key(&self, key: &ClientKey) -> RateLimitResult<Decision> {
        let now = self.clock.now_unix();

        let transition = match self.config.mode {
            ConsistencyMode::ReadModifyWrite => self.read_modify_write(key, now).await?,
            ConsistencyMode::Atomic => {
                self.store
                    .apply_window(key, now, &self.config.rate_limit)
                    .await?
            }
        };

        log_transition(key, now, transition, &self.config);

        Ok(transition.decision())
    }

    async fn read_modify_write(&self, key: &ClientKey, now: i64) -> RateLimitResult<WindowTransition> {
        let record = self.store.get_record(key).await?;

        if let Some(record) = &record {
            tracing::debug!(
                client = %key,
                saved_time = record.window_start,
                now,
                diff = record.elapsed(now),
                count = record.count,
                "Evaluating window"
            );
        }

        let evaluation = evaluate_window(record.as_ref(), now, &self.config.rate_limit);

        if let Some(update) = &evaluation.update {
            self.store.put_record(key, update).await?;
        }

        Ok(evaluation.transition)
    }
}

fn log_transition(key: &ClientKey, now: i64, transition: WindowTransition, config: &LimiterConfig) {
    match transition {
        WindowTransition::Opened => {
            tracing::info!(client = %key, window_start = now, "Client not seen before, window opened");
        }
        WindowTransition::Reset => {
            tracing::debug!(client = %key, window_start = now, "Window expired, counter reset");
        }
        WindowTransition::Counted => {}
        WindowTransition::Blocked => {
            tracing::warn!(
                client = %key,
                max = config.rate_limit.max_requests,
                window_secs = config.rate_limit.window_secs(),
                "Rate limit exceeded"
            );
        }
    }
}

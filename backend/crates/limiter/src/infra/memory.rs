//! In-memory Counter Store
//!
//! Process-local store for development and tests. Shares nothing across
//! processes, so it only limits correctly behind a single instance.

use crate::domain::entities::WindowRecord;
use crate::domain::repository::CounterStore;
use crate::domain::services::{WindowTransition, evaluate_window};
use crate::error::RateLimitResult;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use platform::client::ClientKey;
use platform::rate_limit::RateLimitConfig;
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct InMemoryCounterStore {
    records: Arc<DashMap<String, WindowRecord>>,
}

impl InMemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Drop records whose window ended before `now` (background cleanup).
    ///
    /// A dropped client starts over as unseen, which is the same outcome
    /// an expired window would give.
    pub fn purge_expired(&self, now: i64, config: &RateLimitConfig) -> usize {
        let before = self.records.len();
        let window_secs = config.window_secs();
        self.records
            .retain(|_, record| record.elapsed(now) < window_secs);
        before.saturating_sub(self.records.len())
    }
}

impl CounterStore for InMemoryCounterStore {
    async fn get_record(&self, key: &ClientKey) -> RateLimitResult<Option<WindowRecord>> {
        Ok(self.records.get(key.as_str()).map(|record| *record))
    }

    async fn put_record(&self, key: &ClientKey, record: &WindowRecord) -> RateLimitResult<()> {
        self.records.insert(key.as_str().to_owned(), *record);
        Ok(())
    }

    async fn apply_window(
        &self,
        key: &ClientKey,
        now: i64,
        config: &RateLimitConfig,
    ) -> RateLimitResult<WindowTransition> {
        // The entry guard holds the shard lock for the whole evaluation
        let transition = match self.records.entry(key.as_str().to_owned()) {
            Entry::Occupied(mut entry) => {
                let evaluation = evaluate_window(Some(entry.get()), now, config);
                if let Some(update) = evaluation.update {
                    *entry.get_mut() = update;
                }
                evaluation.transition
            }
            Entry::Vacant(entry) => {
                let evaluation = evaluate_window(None, now, config);
                if let Some(update) = evaluation.update {
                    entry.insert(update);
                }
                evaluation.transition
            }
        };
        Ok(transition)
    }
}

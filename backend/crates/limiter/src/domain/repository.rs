//! Repository Traits
//!
//! Interface to the shared counter store. Implementations live in the
//! infrastructure layer.

use crate::domain::entities::WindowRecord;
use crate::domain::services::WindowTransition;
use crate::error::RateLimitResult;
use platform::client::ClientKey;
use platform::rate_limit::RateLimitConfig;

/// Counter store trait
///
/// One long-lived instance is shared by every request task, so
/// implementations must be safe for concurrent use without external
/// locking. Individual calls are atomic per key; a `get_record` followed
/// by `put_record` is not.
#[trait_variant::make(CounterStore: Send)]
pub trait LocalCounterStore {
    /// Read the window record for a client, `None` if it has never been seen
    async fn get_record(&self, key: &ClientKey) -> RateLimitResult<Option<WindowRecord>>;

    /// Overwrite the window record for a client
    async fn put_record(&self, key: &ClientKey, record: &WindowRecord) -> RateLimitResult<()>;

    /// Read, evaluate and write back the window as one indivisible step
    async fn apply_window(
        &self,
        key: &ClientKey,
        now: i64,
        config: &RateLimitConfig,
    ) -> RateLimitResult<WindowTransition>;
}

//! Redis Counter Store
//!
//! Each client is a hash keyed by `<prefix><client ip>` with two decimal
//! string fields, `timeStamp` (window start, Unix seconds) and `count`.

use crate::domain::entities::WindowRecord;
use crate::domain::repository::CounterStore;
use crate::domain::services::WindowTransition;
use crate::error::{RateLimitError, RateLimitResult};
use ::redis::aio::ConnectionManager;
use ::redis::{AsyncCommands, Script};
use platform::client::ClientKey;
use platform::rate_limit::RateLimitConfig;
use std::collections::HashMap;
use std::sync::LazyLock;

const FIELD_TIMESTAMP: &str = "timeStamp";
const FIELD_COUNT: &str = "count";

/// Server-side twin of `evaluate_window`, run atomically by Redis.
///
/// Returns 0 opened, 1 counted, 2 reset, 3 blocked.
static APPLY_WINDOW_SCRIPT: LazyLock<Script> = LazyLock::new(|| {
    Script::new(
        r#"
        local key = KEYS[1]
        local now = tonumber(ARGV[1])
        local window_secs = tonumber(ARGV[2])
        local max_requests = tonumber(ARGV[3])

        if redis.call('EXISTS', key) == 0 then
            redis.call('HSET', key, 'timeStamp', now, 'count', 0)
            return 0
        end

        -- Same acceptance as the Rust decoder: i64 timestamp, u32 count, else 0
        local function read_int(raw, signed)
            local pattern = signed and '^[+-]?%d+$' or '^%+?%d+$'
            if not raw or not string.match(raw, pattern) then
                return 0
            end
            local value = tonumber(raw)
            if not signed and value > 4294967295 then
                return 0
            end
            return value
        end

        local started = read_int(redis.call('HGET', key, 'timeStamp'), true)
        local count = read_int(redis.call('HGET', key, 'count'), false)

        if now - started >= window_secs then
            redis.call('HSET', key, 'timeStamp', now, 'count', 0)
            return 2
        end

        if count + 1 < max_requests then
            redis.call('HSET', key, 'timeStamp', started, 'count', count + 1)
            return 1
        end

        return 3
        "#,
    )
});

/// Redis-backed counter store
///
/// [`ConnectionManager`] multiplexes one connection across tasks and
/// reconnects on its own, so clones are cheap and share state.
#[derive(Clone)]
pub struct RedisCounterStore {
    conn: ConnectionManager,
    key_prefix: String,
}

impl RedisCounterStore {
    pub fn new(conn: ConnectionManager, key_prefix: impl Into<String>) -> Self {
        Self {
            conn,
            key_prefix: key_prefix.into(),
        }
    }

    /// Open a managed connection to `url` (`redis://[:password@]host:port/db`).
    pub async fn connect(url: &str, key_prefix: impl Into<String>) -> RateLimitResult<Self> {
        let client = ::redis::Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;

        tracing::info!("Connected to counter store");

        Ok(Self::new(conn, key_prefix))
    }

    fn record_key(&self, key: &ClientKey) -> String {
        format!("{}{}", self.key_prefix, key)
    }
}

impl CounterStore for RedisCounterStore {
    async fn get_record(&self, key: &ClientKey) -> RateLimitResult<Option<WindowRecord>> {
        let mut conn = self.conn.clone();
        let fields: HashMap<String, String> = conn.hgetall(self.record_key(key)).await?;
        Ok(decode_record(key, &fields))
    }

    async fn put_record(&self, key: &ClientKey, record: &WindowRecord) -> RateLimitResult<()> {
        let mut conn = self.conn.clone();
        let fields = encode_record(record);
        let _: () = conn
            .hset_multiple(self.record_key(key), &fields[..])
            .await?;
        Ok(())
    }

    async fn apply_window(
        &self,
        key: &ClientKey,
        now: i64,
        config: &RateLimitConfig,
    ) -> RateLimitResult<WindowTransition> {
        let mut conn = self.conn.clone();
        let code: i64 = APPLY_WINDOW_SCRIPT
            .key(self.record_key(key))
            .arg(now)
            .arg(config.window_secs())
            .arg(config.max_requests)
            .invoke_async(&mut conn)
            .await?;

        transition_from_code(code)
    }
}

fn encode_record(record: &WindowRecord) -> [(&'static str, String); 2] {
    [
        (FIELD_TIMESTAMP, record.window_start.to_string()),
        (FIELD_COUNT, record.count.to_string()),
    ]
}

/// An empty hash means the client has never been seen.
///
/// Missing or garbled fields read as 0; a zero timestamp forces a reset on
/// the next request, so a corrupt record heals itself.
fn decode_record(key: &ClientKey, fields: &HashMap<String, String>) -> Option<WindowRecord> {
    if fields.is_empty() {
        return None;
    }

    Some(WindowRecord {
        window_start: parse_field(key, fields, FIELD_TIMESTAMP),
        count: parse_field(key, fields, FIELD_COUNT),
    })
}

fn parse_field<T>(key: &ClientKey, fields: &HashMap<String, String>, name: &str) -> T
where
    T: std::str::FromStr + Default,
{
    match fields.get(name).map(|raw| raw.parse::<T>()) {
        Some(Ok(value)) => value,
        Some(Err(_)) | None => {
            tracing::warn!(client = %key, field = name, "Malformed window record field, using 0");
            T::default()
        }
    }
}

fn transition_from_code(code: i64) -> RateLimitResult<WindowTransition> {
    match code {
        0 => Ok(WindowTransition::Opened),
        1 => Ok(WindowTransition::Counted),
        2 => Ok(WindowTransition::Reset),
        3 => Ok(WindowTransition::Blocked),
        other => Err(RateLimitError::StoreOperationFailed(format!(
            "Unexpected window script result: {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> ClientKey {
        ClientKey::from_ip("203.0.113.5".parse().unwrap())
    }

    fn fields(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_encode_record_field_names() {
        let record = WindowRecord {
            window_start: 1_700_000_000,
            count: 9,
        };
        let encoded = encode_record(&record);
        assert_eq!(encoded[0], ("timeStamp", "1700000000".to_string()));
        assert_eq!(encoded[1], ("count", "9".to_string()));
    }

    #[test]
    fn test_decode_empty_hash_is_unseen_client() {
        assert_eq!(decode_record(&key(), &HashMap::new()), None);
    }

    #[test]
    fn test_decode_record() {
        let decoded = decode_record(
            &key(),
            &fields(&[("timeStamp", "1700000000"), ("count", "3")]),
        );
        assert_eq!(
            decoded,
            Some(WindowRecord {
                window_start: 1_700_000_000,
                count: 3
            })
        );
    }

    #[test]
    fn test_decode_malformed_fields_as_zero() {
        let decoded = decode_record(&key(), &fields(&[("timeStamp", "yesterday")]));
        assert_eq!(
            decoded,
            Some(WindowRecord {
                window_start: 0,
                count: 0
            })
        );
    }

    #[test]
    fn test_decode_negative_or_fractional_count_as_zero() {
        for raw in ["-5", "2.5", "4294967296"] {
            let decoded = decode_record(
                &key(),
                &fields(&[("timeStamp", "1700000000"), ("count", raw)]),
            );
            assert_eq!(decoded.map(|r| r.count), Some(0), "count {raw:?}");
        }
    }

    #[test]
    fn test_transition_codes() {
        assert_eq!(transition_from_code(0).unwrap(), WindowTransition::Opened);
        assert_eq!(transition_from_code(1).unwrap(), WindowTransition::Counted);
        assert_eq!(transition_from_code(2).unwrap(), WindowTransition::Reset);
        assert_eq!(transition_from_code(3).unwrap(), WindowTransition::Blocked);
        assert!(matches!(
            transition_from_code(7),
            Err(RateLimitError::StoreOperationFailed(_))
        ));
    }
}

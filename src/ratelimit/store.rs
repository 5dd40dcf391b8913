//! Key/value stores with per-key expiry, backing the rate limiter.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use tokio::time::Instant;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("redis: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("store operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("unexpected value {value:?} under key {key}")]
    Corrupt { key: String, value: String },

    #[error("store lock poisoned")]
    Poisoned,
}

/// Entries expire on their own; there is no delete.
#[async_trait]
pub trait TtlStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError>;

    /// Remaining lifetime of `key`, or `None` once it is gone.
    async fn ttl(&self, key: &str) -> Result<Option<Duration>, StoreError>;

    /// Atomically bump the counter under `key` and return the new count.
    /// A missing key starts at 1 and expires after `window`; an existing
    /// key keeps its expiry.
    async fn incr_with_ttl(&self, key: &str, window: Duration) -> Result<u64, StoreError>;
}

/// In-process store. Expiry is read from tokio's clock, so a paused test
/// runtime can step through windows with `tokio::time::advance`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, (String, Instant)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_entries<T>(
        &self,
        f: impl FnOnce(&mut HashMap<String, (String, Instant)>) -> T,
    ) -> Result<T, StoreError> {
        let mut entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        let now = Instant::now();
        entries.retain(|_, (_, expires)| *expires > now);
        Ok(f(&mut entries))
    }
}

#[async_trait]
impl TtlStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.with_entries(|entries| entries.get(key).map(|(value, _)| value.clone()))
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        let expires = Instant::now() + ttl;
        self.with_entries(|entries| {
            entries.insert(key.to_string(), (value.to_string(), expires));
        })
    }

    async fn ttl(&self, key: &str) -> Result<Option<Duration>, StoreError> {
        let now = Instant::now();
        self.with_entries(|entries| entries.get(key).map(|(_, expires)| *expires - now))
    }

    async fn incr_with_ttl(&self, key: &str, window: Duration) -> Result<u64, StoreError> {
        let expires = Instant::now() + window;
        self.with_entries(|entries| -> Result<u64, StoreError> {
            match entries.get_mut(key) {
                Some((value, _)) => {
                    let count = value.parse::<u64>().map_err(|_| StoreError::Corrupt {
                        key: key.to_string(),
                        value: value.clone(),
                    })? + 1;
                    *value = count.to_string();
                    Ok(count)
                }
                None => {
                    entries.insert(key.to_string(), ("1".to_string(), expires));
                    Ok(1)
                }
            }
        })?
    }
}

/// INCR, and attach the expiry only when the key has none yet.
const INCR_WITH_TTL: &str = r"
local count = redis.call('INCR', KEYS[1])
if redis.call('PTTL', KEYS[1]) < 0 then
    redis.call('PEXPIRE', KEYS[1], ARGV[1])
end
return count
";

/// Redis-backed store. Every round-trip is bounded by `timeout`.
#[derive(Clone)]
pub struct RedisStore {
    conn: MultiplexedConnection,
    timeout: Duration,
    incr_with_ttl: Arc<redis::Script>,
}

impl RedisStore {
    pub async fn connect(url: &str, timeout: Duration) -> Result<Self, StoreError> {
        let client = redis::Client::open(url)?;
        let conn = bounded(timeout, client.get_multiplexed_async_connection()).await?;
        Ok(Self {
            conn,
            timeout,
            incr_with_ttl: Arc::new(redis::Script::new(INCR_WITH_TTL)),
        })
    }
}

async fn bounded<T>(
    timeout: Duration,
    fut: impl Future<Output = redis::RedisResult<T>>,
) -> Result<T, StoreError> {
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => Ok(result?),
        Err(_) => Err(StoreError::Timeout(timeout)),
    }
}

#[async_trait]
impl TtlStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.conn.clone();
        bounded(self.timeout, conn.get::<_, Option<String>>(key)).await
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let millis = (ttl.as_millis() as u64).max(1);
        bounded(self.timeout, conn.pset_ex::<_, _, ()>(key, value, millis)).await
    }

    async fn ttl(&self, key: &str) -> Result<Option<Duration>, StoreError> {
        let mut conn = self.conn.clone();
        // -2: no such key, -1: no expiry
        let millis: i64 = bounded(self.timeout, conn.pttl::<_, i64>(key)).await?;
        Ok((millis > 0).then(|| Duration::from_millis(millis as u64)))
    }

    async fn incr_with_ttl(&self, key: &str, window: Duration) -> Result<u64, StoreError> {
        let mut conn = self.conn.clone();
        let millis = (window.as_millis() as u64).max(1);
        let mut invocation = self.incr_with_ttl.key(key);
        invocation.arg(millis);
        let count: u64 = bounded(self.timeout, invocation.invoke_async(&mut conn)).await?;
        Ok(count)
    }
}

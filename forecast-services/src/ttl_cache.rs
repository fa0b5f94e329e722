//! TTL Cache
//!
//! Key/value store mapping a string key to a byte payload with an expiry.
//! Reads never extend an entry's lifetime, and a write always resets it.
//! There is no size-based eviction; expired entries are logically absent
//! and are dropped lazily on read or by the periodic sweep.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use forecast_core::ForecastError;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};

/// Errors from a cache backend
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Cache backend unavailable: {0}")]
    Unavailable(String),
}

impl From<CacheError> for ForecastError {
    fn from(err: CacheError) -> Self {
        ForecastError::cache_unavailable(err.to_string())
    }
}

/// A cache backend
///
/// Operations on a single key are atomic with respect to each other.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Payload for `key`, or `None` when missing or expired
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    /// Store `payload` under `key` for `ttl`, replacing any existing entry
    async fn set(&self, key: &str, payload: Vec<u8>, ttl: Duration) -> Result<(), CacheError>;

    /// Remove `key` if present
    async fn invalidate(&self, key: &str) -> Result<(), CacheError>;
}

#[derive(Debug, Clone)]
struct CacheEntry {
    payload: Vec<u8>,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// In-process cache backend
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: DashMap<String, CacheEntry>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every expired entry, returning how many were removed
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_live(now));
        before.saturating_sub(self.entries.len())
    }

    /// Number of entries that have not expired
    pub fn live_entries(&self) -> usize {
        let now = Instant::now();
        self.entries.iter().filter(|e| e.value().is_live(now)).count()
    }

    /// Periodically purge expired entries until the handle is aborted
    pub fn spawn_sweeper(self: Arc<Self>, every: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!("Cache sweeper started (every {:?})", every);
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                let removed = self.purge_expired();
                if removed > 0 {
                    debug!("Purged {} expired cache entries", removed);
                }
            }
        })
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let now = Instant::now();

        // The shard guard must be released before removing from the same map
        match self.entries.get(key) {
            Some(entry) if entry.is_live(now) => return Ok(Some(entry.payload.clone())),
            Some(_) => {}
            None => return Ok(None),
        }

        self.entries.remove_if(key, |_, entry| !entry.is_live(now));
        Ok(None)
    }

    async fn set(&self, key: &str, payload: Vec<u8>, ttl: Duration) -> Result<(), CacheError> {
        let entry = CacheEntry {
            payload,
            expires_at: Instant::now() + ttl,
        };
        self.entries.insert(key.to_string(), entry);
        Ok(())
    }

    async fn invalidate(&self, key: &str) -> Result<(), CacheError> {
        self.entries.remove(key);
        Ok(())
    }
}

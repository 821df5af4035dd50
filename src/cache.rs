use std::collections::HashMap;
use std::hash::Hash;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::Instant;

/// A value plus the instant after which it is treated as absent.
#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

/// Key/value store with a fixed per-instance TTL.
///
/// Readers share the lock, writers take it exclusively. Expired entries are
/// never swept: `get` reports them as absent and the next `set` for the same
/// key overwrites them, so a cache fed with ever-new keys grows without bound.
pub struct ExpiringCache<K, V> {
    entries: RwLock<HashMap<K, CacheEntry<V>>>,
    ttl: Duration,
}

impl<K, V> ExpiringCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub async fn get(&self, key: &K) -> Option<V> {
        let entries = self.entries.read().await;
        let entry = entries.get(key)?;
        if Instant::now() >= entry.expires_at {
            return None;
        }
        Some(entry.value.clone())
    }

    pub async fn set(&self, key: K, value: V) {
        let expires_at = Instant::now() + self.ttl;
        let mut entries = self.entries.write().await;
        entries.insert(key, CacheEntry { value, expires_at });
    }

    /// Number of physically stored entries, expired ones included.
    pub async fn stored_len(&self) -> usize {
        self.entries.read().await.len()
    }
}

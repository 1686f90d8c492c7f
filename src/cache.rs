//! Bounded, time-expiring in-memory cache bucket.
//!
//! Each bucket (routes, location searches, elevation batches) is an explicit
//! object owned by whoever constructs it; there is no global instance.

use lru::LruCache;
use std::fmt::Debug;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

struct StoredEntry<V> {
    value: V,
    expires_at: Instant,
}

/// LRU cache whose entries also expire after a fixed TTL
pub struct TtlCache<K, V> {
    name: &'static str,
    ttl: Duration,
    store: Mutex<LruCache<K, StoredEntry<V>>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Hash + Eq + Debug,
    V: Clone,
{
    #[must_use]
    pub fn new(name: &'static str, capacity: NonZeroUsize, ttl: Duration) -> Self {
        Self {
            name,
            ttl,
            store: Mutex::new(LruCache::new(capacity)),
        }
    }

    fn store(&self) -> MutexGuard<'_, LruCache<K, StoredEntry<V>>> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Retrieves a value if it exists and has not expired.
    /// Expired entries are evicted on access.
    #[tracing::instrument(name = "query_cache", level = "debug", skip(self), fields(bucket = self.name))]
    pub fn get(&self, key: &K) -> Option<V> {
        let mut store = self.store();
        let fresh = match store.get(key) {
            Some(entry) if Instant::now() < entry.expires_at => Some(entry.value.clone()),
            Some(_) => None,
            None => {
                tracing::debug!("Key not found");
                return None;
            }
        };

        if fresh.is_some() {
            tracing::debug!("Key found and still fresh");
        } else {
            tracing::debug!("Key found but expired");
            store.pop(key);
        }
        fresh
    }

    /// Stores a value, evicting the least recently used entry when full
    #[tracing::instrument(name = "put_cache", level = "debug", skip(self, value), fields(bucket = self.name))]
    pub fn put(&self, key: K, value: V) {
        let entry = StoredEntry {
            value,
            expires_at: Instant::now() + self.ttl,
        };
        self.store().put(key, entry);
    }

    pub fn clear(&self) {
        self.store().clear();
    }

    /// Number of stored entries, including expired ones not yet evicted
    #[must_use]
    pub fn len(&self) -> usize {
        self.store().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

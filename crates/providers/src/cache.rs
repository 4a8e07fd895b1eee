use std::{hash::Hash, num::NonZeroUsize, time::Duration};

use lru::LruCache;
use tokio::time::Instant;

/// The default capacity of the balance and supply cache.
const DEFAULT_READ_CAPACITY: NonZeroUsize = NonZeroUsize::new(500).expect("non zero");

/// The default time to live of balance and supply entries.
const DEFAULT_READ_TTL: Duration = Duration::from_secs(120);

/// The default capacity of the block caches.
const DEFAULT_BLOCK_CAPACITY: NonZeroUsize = NonZeroUsize::new(2048).expect("non zero");

/// The default time to live of the chain tip.
const DEFAULT_LATEST_TTL: Duration = Duration::from_secs(1);

/// The cache configuration of a [`crate::RetryingClient`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// The capacity of the balance and supply cache.
    pub read_capacity: NonZeroUsize,
    /// The time to live of balance and supply entries.
    pub read_ttl: Duration,
    /// The capacity of the header and block caches, keyed by block hash.
    pub block_capacity: NonZeroUsize,
    /// The time to live of the cached chain tip.
    pub latest_ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            read_capacity: DEFAULT_READ_CAPACITY,
            read_ttl: DEFAULT_READ_TTL,
            block_capacity: DEFAULT_BLOCK_CAPACITY,
            latest_ttl: DEFAULT_LATEST_TTL,
        }
    }
}

/// A bounded LRU cache whose entries expire after a fixed time to live.
#[derive(Debug)]
pub struct TtlCache<K: Hash + Eq, V> {
    entries: LruCache<K, (Instant, V)>,
    ttl: Duration,
}

impl<K: Hash + Eq, V: Clone> TtlCache<K, V> {
    /// Returns a new [`TtlCache`].
    pub fn new(capacity: NonZeroUsize, ttl: Duration) -> Self {
        Self { entries: LruCache::new(capacity), ttl }
    }

    /// Returns the live value for the key, evicting it if expired.
    pub fn get(&mut self, key: &K) -> Option<V> {
        let (inserted_at, value) = self.entries.get(key)?;
        if inserted_at.elapsed() <= self.ttl {
            return Some(value.clone());
        }
        self.entries.pop(key);
        None
    }

    /// Returns true if the key holds a live value.
    pub fn contains(&mut self, key: &K) -> bool {
        self.get(key).is_some()
    }

    /// Inserts the value, evicting the least recently used entry if at capacity.
    pub fn insert(&mut self, key: K, value: V) {
        self.entries.put(key, (Instant::now(), value));
    }

    /// Returns the number of entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the cache holds no entry.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_entries_expire_after_ttl() {
        let mut cache = TtlCache::new(NonZeroUsize::new(2).unwrap(), Duration::from_secs(120));
        cache.insert(1u64, "a");

        tokio::time::advance(Duration::from_secs(119)).await;
        assert_eq!(cache.get(&1), Some("a"));

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(cache.get(&1), None);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_capacity_is_bounded() {
        let mut cache = TtlCache::new(NonZeroUsize::new(2).unwrap(), Duration::from_secs(120));
        cache.insert(1u64, ());
        cache.insert(2, ());
        cache.insert(3, ());

        assert_eq!(cache.len(), 2);
        assert!(!cache.contains(&1));
        assert!(cache.contains(&3));
    }
}

//! TTL Cache
//!
//! Memoizes resolver results for a fixed time-to-live. Entries are only
//! ever dropped by expiry; the key space is tiny (one address key plus
//! one geolocation key per address seen).

use dashmap::DashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

/// A cached value with its creation time.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub value: V,
    pub created_at: Instant,
}

impl<V> CacheEntry<V> {
    pub fn new(value: V) -> Self {
        Self {
            value,
            created_at: Instant::now(),
        }
    }

    /// Usable only while `age < ttl`.
    pub fn is_fresh(&self, ttl: Duration, now: Instant) -> bool {
        now.saturating_duration_since(self.created_at) < ttl
    }
}

/// DashMap-backed TTL cache.
///
/// Safe to share between concurrent resolution cycles: each key is
/// guarded by DashMap's shard locks.
pub struct TtlCache<K, V> {
    entries: DashMap<K, CacheEntry<V>>,
    ttl: Duration,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    /// Create an empty cache.
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Return the value if present and not yet expired.
    ///
    /// An expired entry is removed on the way out.
    pub fn get(&self, key: &K) -> Option<V> {
        let now = Instant::now();
        {
            let entry = self.entries.get(key)?;
            if entry.is_fresh(self.ttl, now) {
                return Some(entry.value.clone());
            }
        }
        self.entries
            .remove_if(key, |_, entry| !entry.is_fresh(self.ttl, now));
        None
    }

    /// Insert or replace a value, restarting its TTL.
    pub fn put(&self, key: K, value: V) {
        self.entries.insert(key, CacheEntry::new(value));
    }

    /// Number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

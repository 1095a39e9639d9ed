//! Bounded time-aware memoization.
//!
//! Explicit replacement for decorator-style caching: a plain map with a
//! capacity bound and per-entry TTL, written to from a single logical
//! thread per invocation.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

/// Capacity- and TTL-bounded cache. When full, the oldest entry is
/// evicted.
pub struct TtlCache<K, V> {
    capacity: usize,
    ttl: Duration,
    entries: HashMap<K, (Instant, V)>,
}

impl<K: Eq + Hash + Clone, V: Clone> TtlCache<K, V> {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        assert!(capacity > 0, "cache capacity must be positive");
        Self {
            capacity,
            ttl,
            entries: HashMap::new(),
        }
    }

    pub fn get(&self, key: &K) -> Option<V> {
        let (inserted_at, value) = self.entries.get(key)?;
        if inserted_at.elapsed() >= self.ttl {
            return None;
        }
        Some(value.clone())
    }

    pub fn insert(&mut self, key: K, value: V) {
        if !self.entries.contains_key(&key) && self.entries.len() >= self.capacity {
            self.evict_oldest();
        }
        self.entries.insert(key, (Instant::now(), value));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn evict_oldest(&mut self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|(_, (inserted_at, _))| *inserted_at)
            .map(|(key, _)| key.clone());
        if let Some(key) = oldest {
            self.entries.remove(&key);
        }
    }
}

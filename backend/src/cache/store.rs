use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use super::clock::{Clock, SystemClock};
use super::entry::CacheEntry;
use super::stats::CacheStats;

#[derive(Debug)]
struct Inner<K, V> {
    entries: HashMap<K, CacheEntry<V>>,
    /// tick → key, oldest first
    recency: BTreeMap<u64, K>,
    next_tick: u64,
    hits: u64,
    misses: u64,
    evictions: u64,
    expirations: u64,
}

impl<K: Eq + Hash + Clone, V> Inner<K, V> {
    fn new() -> Self {
        Self {
            entries: HashMap::new(),
            recency: BTreeMap::new(),
            next_tick: 0,
            hits: 0,
            misses: 0,
            evictions: 0,
            expirations: 0,
        }
    }

    fn bump(&mut self) -> u64 {
        let tick = self.next_tick;
        self.next_tick += 1;
        tick
    }

    fn remove_entry(&mut self, key: &K) -> Option<CacheEntry<V>> {
        let entry = self.entries.remove(key)?;
        self.recency.remove(&entry.tick);
        Some(entry)
    }

    fn evict_lru(&mut self) {
        if let Some((_, key)) = self.recency.pop_first() {
            self.entries.remove(&key);
            self.evictions += 1;
        }
    }
}

/// Bounded key/value store with per-entry expiry and least-recently-used eviction.
///
/// Cloning is cheap and yields a handle to the same underlying store. All
/// operations take one short-lived lock around the map and its recency index.
#[derive(Debug)]
pub struct TtlCache<K, V> {
    inner: Arc<Mutex<Inner<K, V>>>,
    clock: Arc<dyn Clock>,
    capacity: usize,
    ttl: Duration,
}

impl<K, V> Clone for TtlCache<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            clock: Arc::clone(&self.clock),
            capacity: self.capacity,
            ttl: self.ttl,
        }
    }
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Create a cache using the system clock. A capacity of zero is treated as one.
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self::with_clock(capacity, ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(capacity: usize, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner::new())),
            clock,
            capacity: capacity.max(1),
            ttl,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Look up a fresh value. Expired entries are removed and reported as a miss;
    /// a hit becomes the most recently used entry.
    pub fn get(&self, key: &K) -> Option<V> {
        let now = self.clock.now();
        let mut guard = self.inner.lock();
        let inner = &mut *guard;

        let expired = match inner.entries.get(key) {
            None => {
                inner.misses += 1;
                return None;
            }
            Some(entry) => entry.is_expired(now),
        };

        if expired {
            inner.remove_entry(key);
            inner.expirations += 1;
            inner.misses += 1;
            return None;
        }

        let tick = inner.bump();
        let entry = inner.entries.get_mut(key)?;
        let old_tick = std::mem::replace(&mut entry.tick, tick);
        let value = entry.value.clone();
        inner.recency.remove(&old_tick);
        inner.recency.insert(tick, key.clone());
        inner.hits += 1;
        Some(value)
    }

    /// Insert or overwrite with the default TTL.
    pub fn set(&self, key: K, value: V) {
        self.set_with_ttl(key, value, self.ttl);
    }

    /// Insert or overwrite with an explicit TTL. At capacity, the least recently
    /// used entry is evicted first.
    pub fn set_with_ttl(&self, key: K, value: V, ttl: Duration) {
        let now = self.clock.now();
        let mut inner = self.inner.lock();

        if inner.remove_entry(&key).is_none() && inner.entries.len() >= self.capacity {
            inner.evict_lru();
        }

        let tick = inner.bump();
        inner.recency.insert(tick, key.clone());
        inner.entries.insert(key, CacheEntry::new(value, now, ttl, tick));
    }

    pub fn remove(&self, key: &K) -> Option<V> {
        self.inner.lock().remove_entry(key).map(|e| e.value)
    }

    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        inner.recency.clear();
    }

    /// Number of stored entries, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every expired entry and return how many were dropped.
    pub fn cleanup(&self) -> usize {
        let now = self.clock.now();
        let mut inner = self.inner.lock();
        let expired: Vec<K> = inner
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &expired {
            inner.remove_entry(key);
        }
        inner.expirations += expired.len() as u64;
        expired.len()
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock();
        CacheStats {
            size: inner.entries.len(),
            capacity: self.capacity,
            ttl_ms: self.ttl.as_millis() as u64,
            hits: inner.hits,
            misses: inner.misses,
            evictions: inner.evictions,
            expirations: inner.expirations,
        }
    }
}

/// Build a stable key from a prefix and parameters; parameter order does not matter.
///
/// `cache_key("search", [("page", "1"), ("category", "stars")])` is
/// `search:category=stars|page=1`.
pub fn cache_key<I, P, S>(prefix: &str, params: I) -> String
where
    I: IntoIterator<Item = (P, S)>,
    P: AsRef<str>,
    S: AsRef<str>,
{
    let mut pairs: Vec<(String, String)> = params
        .into_iter()
        .map(|(k, v)| (k.as_ref().to_string(), v.as_ref().to_string()))
        .collect();
    pairs.sort();
    let joined = pairs
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("|");
    format!("{}:{}", prefix, joined)
}

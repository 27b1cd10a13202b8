use std::time::{Duration, Instant};

/// A cached value with its insertion time and recency tick.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub value: V,
    pub inserted_at: Instant,
    pub ttl: Duration,
    /// Position in the recency order; larger is more recent
    pub(crate) tick: u64,
}

impl<V> CacheEntry<V> {
    pub(crate) fn new(value: V, inserted_at: Instant, ttl: Duration, tick: u64) -> Self {
        Self {
            value,
            inserted_at,
            ttl,
            tick,
        }
    }

    /// Fresh while `now - inserted_at < ttl`.
    pub fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.inserted_at) >= self.ttl
    }
}

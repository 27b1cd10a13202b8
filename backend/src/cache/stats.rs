use serde::Serialize;

/// Point-in-time counters for a [`super::TtlCache`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    /// Entries currently stored, including expired ones not yet swept
    pub size: usize,
    pub capacity: usize,
    pub ttl_ms: u64,
    pub hits: u64,
    pub misses: u64,
    /// Entries dropped to make room under capacity pressure
    pub evictions: u64,
    /// Entries dropped because their TTL elapsed
    pub expirations: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let lookups = self.hits + self.misses;
        if lookups == 0 {
            0.0
        } else {
            self.hits as f64 / lookups as f64
        }
    }
}

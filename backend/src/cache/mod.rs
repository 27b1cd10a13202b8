//! Expiring LRU cache shared across concurrent requests.
//!
//! Time is read through an injected [`Clock`] so expiry can be tested
//! deterministically with [`ManualClock`].

mod clock;
mod entry;
mod stats;
mod store;
mod sweeper;

pub use clock::{Clock, ManualClock, SystemClock};
pub use entry::CacheEntry;
pub use stats::CacheStats;
pub use store::{cache_key, TtlCache};
pub use sweeper::{spawn_sweeper, Sweep};

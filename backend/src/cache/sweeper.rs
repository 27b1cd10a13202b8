use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::store::TtlCache;

/// Something holding expiring state that can be swept on a timer.
pub trait Sweep: Send + Sync {
    /// Drop expired state and return how many entries were removed.
    fn sweep(&self) -> usize;
}

impl<K, V> Sweep for TtlCache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync,
    V: Clone + Send + Sync,
{
    fn sweep(&self) -> usize {
        self.cleanup()
    }
}

/// Run `target.sweep()` every `interval` until `token` is cancelled.
///
/// The first sweep happens one full interval after spawning. Must be called
/// from within a tokio runtime.
pub fn spawn_sweeper<S>(
    target: Arc<S>,
    interval: Duration,
    token: CancellationToken,
) -> JoinHandle<()>
where
    S: Sweep + ?Sized + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // interval fires immediately on the first tick
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    debug!("Cache sweeper stopped");
                    break;
                }
                _ = ticker.tick() => {
                    let removed = target.sweep();
                    if removed > 0 {
                        info!("Cache sweep removed {} expired entries", removed);
                    }
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_runs_until_cancelled() {
        let clock = Arc::new(ManualClock::new());
        let cache: TtlCache<String, u32> =
            TtlCache::with_clock(10, Duration::from_secs(1), clock.clone());
        cache.set("a".to_string(), 1);
        cache.set("b".to_string(), 2);
        clock.advance(Duration::from_secs(2));

        let token = CancellationToken::new();
        let handle = spawn_sweeper(Arc::new(cache.clone()), Duration::from_secs(30), token.clone());

        tokio::time::sleep(Duration::from_secs(31)).await;
        assert!(cache.is_empty());

        token.cancel();
        handle.await.unwrap();
    }
}

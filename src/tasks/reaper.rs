//! Cache Reaper Task
//!
//! Background task that periodically removes expired cache entries, whether
//! or not they are ever read again.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::cache::ResponseCache;

/// Handle to a running reaper.
///
/// Stop it with [`Reaper::shutdown`], which waits until the task has observed
/// the stop signal. Dropping the handle only signals the stop.
#[derive(Debug)]
pub struct Reaper {
    stop: watch::Sender<bool>,
    handle: Option<JoinHandle<()>>,
}

/// Spawns a background task that sweeps `cache` every `interval`.
///
/// The first sweep happens one full interval after spawning.
///
/// # Example
/// ```ignore
/// let cache = ResponseCache::new(10, Duration::from_secs(60));
/// let reaper = spawn_reaper(cache.clone(), Duration::from_secs(10));
/// // Later, during shutdown:
/// reaper.shutdown().await;
/// ```
pub fn spawn_reaper(cache: ResponseCache, interval: Duration) -> Reaper {
    let (stop, mut stop_rx) = watch::channel(false);

    let handle = tokio::spawn(async move {
        info!(
            "Cache reaper started with interval of {} seconds",
            interval.as_secs_f64()
        );

        let mut ticker = interval_at(Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                // Err means the handle is gone, which is a stop as well
                _ = stop_rx.changed() => break,
                _ = ticker.tick() => {
                    let removed = cache.cleanup_expired().await;
                    if removed > 0 {
                        info!("Cache cleanup: {} expired entries removed", removed);
                    } else {
                        debug!("Cache cleanup: no expired entries found");
                    }
                }
            }
        }

        info!("Cache reaper stopped");
    });

    Reaper {
        stop,
        handle: Some(handle),
    }
}

impl Reaper {
    /// Signals the reaper to stop and waits for it to finish.
    pub async fn shutdown(mut self) {
        let _ = self.stop.send(true);
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                warn!("Cache reaper ended abnormally: {}", e);
            }
        }
    }

    /// True once the task has exited.
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, JoinHandle::is_finished)
    }
}

impl Drop for Reaper {
    fn drop(&mut self) {
        let _ = self.stop.send(true);
    }
}

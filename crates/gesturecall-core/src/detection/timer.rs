//! Repeating frame timer.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Fires a callback every `interval` until cancelled.
///
/// The first fire happens one interval after creation. Ticks missed while the
/// runtime was busy are skipped rather than bunched.
pub struct FrameTimer {
    id: String,
    interval: Duration,
    valid: Arc<AtomicBool>,
    fire_count: Arc<AtomicU64>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl FrameTimer {
    pub fn repeating<F>(id: impl Into<String>, interval: Duration, on_tick: F) -> Self
    where
        F: Fn(u64) + Send + Sync + 'static,
    {
        let id = id.into();
        let valid = Arc::new(AtomicBool::new(true));
        let fire_count = Arc::new(AtomicU64::new(0));
        let cancel = CancellationToken::new();

        let task = {
            let id = id.clone();
            let valid = valid.clone();
            let fire_count = fire_count.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move {
                let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
                loop {
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = ticker.tick() => {
                            if !valid.load(Ordering::SeqCst) {
                                break;
                            }
                            let n = fire_count.fetch_add(1, Ordering::Relaxed) + 1;
                            on_tick(n);
                        }
                    }
                }
                debug!("Timer {} stopped", id);
            })
        };

        debug!("Timer {} started with interval {:?}", id, interval);
        Self {
            id,
            interval,
            valid,
            fire_count,
            cancel,
            task,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Check if the timer is valid (not cancelled).
    pub fn is_valid(&self) -> bool {
        self.valid.load(Ordering::SeqCst)
    }

    pub fn fire_count(&self) -> u64 {
        self.fire_count.load(Ordering::Relaxed)
    }

    /// Cancel the timer. No tick fires after this returns.
    pub fn cancel(&self) {
        self.valid.store(false, Ordering::SeqCst);
        self.cancel.cancel();
        debug!("Timer {} cancelled", self.id);
    }
}

impl Drop for FrameTimer {
    fn drop(&mut self) {
        self.cancel();
        self.task.abort();
    }
}

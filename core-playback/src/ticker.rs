//! Elapsed-time ticker
//!
//! A periodic task that pokes the coordinator while a track is audibly
//! playing. Every start bumps a generation counter; ticks carry the
//! generation they were started with so the coordinator can drop ticks that
//! were already queued when the ticker was stopped.

use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::trace;

pub struct ElapsedTicker {
    period: Duration,
    generation: u64,
    running: Option<(CancellationToken, JoinHandle<()>)>,
}

impl ElapsedTicker {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            generation: 0,
            running: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Whether a tick stamped with `generation` came from the live ticker.
    pub fn is_current(&self, generation: u64) -> bool {
        self.is_running() && generation == self.generation
    }

    /// Start ticking. `on_tick` is called immediately and then once per
    /// period; returning `false` ends the task. No-op when already running.
    pub fn start<F>(&mut self, on_tick: F)
    where
        F: Fn(u64) -> bool + Send + 'static,
    {
        if self.is_running() {
            return;
        }

        self.generation += 1;
        let generation = self.generation;
        let period = self.period;
        let token = CancellationToken::new();
        let cancelled = token.clone();

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = cancelled.cancelled() => break,
                    _ = interval.tick() => {
                        if !on_tick(generation) {
                            break;
                        }
                    }
                }
            }
            trace!(generation, "Elapsed ticker finished");
        });

        self.running = Some((token, handle));
    }

    pub fn stop(&mut self) {
        if let Some((token, handle)) = self.running.take() {
            token.cancel();
            handle.abort();
        }
    }
}

impl Drop for ElapsedTicker {
    fn drop(&mut self) {
        self.stop();
    }
}

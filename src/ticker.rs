//! Fixed-rate frame ticker
//!
//! Calls a render callback at a fixed rate until stopped. Pacing is
//! deadline based: after an overrun the next tick fires as soon as the
//! callback returns and the schedule continues from there, so a slow frame
//! lowers the effective rate without bursts of catch-up ticks and without
//! compounding drift.
//!
//! Ticks never overlap: the callback returns before the next deadline is
//! awaited.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Notify;
use tokio::time::{self, Instant, MissedTickBehavior};

/// Highest supported rate; keeps the interval at least one millisecond
pub const MAX_FPS: u32 = 1000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TickerError {
    #[error("frame rate must be between 1 and 1000, got {0}")]
    InvalidRate(u32),
}

/// Timing passed to the callback on every tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickContext {
    /// Time since the ticker started
    pub elapsed: Duration,
    /// Time since the previous tick (zero on the first one)
    pub delta: Duration,
}

impl TickContext {
    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed.as_secs_f64() * 1000.0
    }

    pub fn delta_ms(&self) -> f64 {
        self.delta.as_secs_f64() * 1000.0
    }
}

#[derive(Debug, Default)]
struct StopSignal {
    stopped: AtomicBool,
    notify: Notify,
}

/// Cloneable handle that stops a running [`Ticker`]
///
/// May be used from any thread or task. The tick in progress, if any,
/// completes and no later tick starts. A `stop` from another thread that
/// races with the start of a tick counts that tick as in progress.
#[derive(Debug, Clone)]
pub struct StopHandle {
    signal: Arc<StopSignal>,
}

impl StopHandle {
    pub fn stop(&self) {
        self.signal.stopped.store(true, Ordering::SeqCst);
        // Stores a permit if the ticker is not waiting right now
        self.signal.notify.notify_one();
    }

    pub fn is_stopped(&self) -> bool {
        self.signal.stopped.load(Ordering::SeqCst)
    }
}

/// Fixed-rate scheduler
#[derive(Debug)]
pub struct Ticker {
    fps: u32,
    interval: Duration,
    signal: Arc<StopSignal>,
}

impl Ticker {
    /// Create a ticker running at `fps` ticks per second
    pub fn new(fps: u32) -> Result<Self, TickerError> {
        if fps == 0 || fps > MAX_FPS {
            return Err(TickerError::InvalidRate(fps));
        }
        Ok(Self {
            fps,
            interval: Duration::from_secs(1) / fps,
            signal: Arc::default(),
        })
    }

    /// Target time between ticks
    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            signal: Arc::clone(&self.signal),
        }
    }

    /// Run `on_tick` at the configured rate until stopped
    ///
    /// The first tick fires immediately. Returns the number of ticks run.
    pub async fn start<F>(&self, mut on_tick: F) -> u64
    where
        F: FnMut(TickContext),
    {
        let mut interval = time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let start = Instant::now();
        let mut last = start;
        let mut ticks = 0u64;

        log::info!("Ticker started at {} fps ({:?} per frame)", self.fps, self.interval);

        loop {
            tokio::select! {
                biased;
                _ = self.signal.notify.notified() => break,
                _ = interval.tick() => {}
            }
            let now = Instant::now();
            let context = TickContext {
                elapsed: now.duration_since(start),
                delta: now.duration_since(last),
            };

            // Last stop check before the callback
            if self.signal.stopped.load(Ordering::SeqCst) {
                break;
            }
            last = now;
            on_tick(context);
            ticks += 1;

            let spent = Instant::now().duration_since(now);
            if spent > self.interval {
                log::debug!(
                    "Tick {} overran by {:?}, next tick delayed",
                    ticks,
                    spent - self.interval
                );
            }

            if self.signal.stopped.load(Ordering::SeqCst) {
                break;
            }
        }

        log::info!("Ticker stopped after {} ticks", ticks);
        ticks
    }
}

//! Recording clock: the elapsed-seconds counter behind timestamp inference.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

/// Read side handed to the reconciler and API handlers. Reads tolerate up
/// to one tick of staleness; nothing ever blocks on the timer.
#[derive(Clone, Default)]
pub struct ClockHandle {
    seconds: Arc<AtomicU64>,
}

impl ClockHandle {
    pub fn elapsed_seconds(&self) -> u64 {
        self.seconds.load(Ordering::Relaxed)
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_seconds() * 1000
    }
}

/// The session timer. Ticks once per second while not paused; owned by the
/// session machine, never by the reconciler.
pub struct RecordingClock {
    seconds: Arc<AtomicU64>,
    paused: Arc<AtomicBool>,
    ticker: Option<JoinHandle<()>>,
}

impl RecordingClock {
    pub fn new() -> Self {
        Self {
            seconds: Arc::new(AtomicU64::new(0)),
            paused: Arc::new(AtomicBool::new(false)),
            ticker: None,
        }
    }

    pub fn handle(&self) -> ClockHandle {
        ClockHandle {
            seconds: self.seconds.clone(),
        }
    }

    /// Reset to zero and start ticking.
    pub fn start(&mut self) {
        self.stop();
        self.seconds.store(0, Ordering::Relaxed);
        self.paused.store(false, Ordering::Relaxed);

        let seconds = self.seconds.clone();
        let paused = self.paused.clone();
        self.ticker = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The first tick completes immediately.
            interval.tick().await;
            loop {
                interval.tick().await;
                if !paused.load(Ordering::Relaxed) {
                    seconds.fetch_add(1, Ordering::Relaxed);
                }
            }
        }));
    }

    pub fn pause(&self) {
        self.paused.store(true, Ordering::Relaxed);
    }

    pub fn resume(&self) {
        self.paused.store(false, Ordering::Relaxed);
    }

    /// Stop ticking and return the elapsed seconds.
    pub fn stop(&mut self) -> u64 {
        if let Some(ticker) = self.ticker.take() {
            debug!("Stopping recording clock");
            ticker.abort();
        }
        self.seconds.load(Ordering::Relaxed)
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.seconds.load(Ordering::Relaxed)
    }

    /// Advance one second if not paused. The tick task goes through here;
    /// tests drive it directly.
    pub fn tick(&self) {
        if !self.paused.load(Ordering::Relaxed) {
            self.seconds.fetch_add(1, Ordering::Relaxed);
        }
    }
}

impl Default for RecordingClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for RecordingClock {
    fn drop(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
    }
}

//! Tick source abstraction for the playback engine.
//!
//! The engine never schedules its own callbacks; something external calls
//! `Player::tick` with a timestamp. In the egui shell that is the repaint
//! loop. `Ticker` covers everything else: `IntervalTicker` for headless
//! hosts, `ManualTicker` for deterministic tests that simulate elapsed time.
//!
//! `stop()` cancels the tick source, so no stale callback can resume a
//! torn-down sequence; dropping an `IntervalTicker` joins its thread.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use log::trace;

pub type TickFn = Box<dyn FnMut(Instant) + Send>;

/// Something that calls back on each refresh.
pub trait Ticker {
    /// Install the callback and begin ticking. Replaces any prior callback.
    fn start(&mut self, callback: TickFn);
    /// Cancel ticking. Pending callbacks never fire after this returns.
    fn stop(&mut self);
}

/// Hand-cranked ticker with a virtual clock.
pub struct ManualTicker {
    callback: Option<TickFn>,
    now: Instant,
}

impl ManualTicker {
    pub fn new() -> Self {
        Self { callback: None, now: Instant::now() }
    }

    /// Advance the virtual clock by `step`, `steps` times, firing the
    /// callback at each simulated timestamp.
    pub fn advance_by(&mut self, step: Duration, steps: usize) {
        for _ in 0..steps {
            self.now += step;
            if let Some(cb) = self.callback.as_mut() {
                cb(self.now);
            }
        }
    }

    pub fn now(&self) -> Instant {
        self.now
    }
}

impl Default for ManualTicker {
    fn default() -> Self {
        Self::new()
    }
}

impl Ticker for ManualTicker {
    fn start(&mut self, callback: TickFn) {
        self.callback = Some(callback);
    }

    fn stop(&mut self) {
        self.callback = None;
    }
}

/// Thread-backed fixed-interval ticker for hosts without a display-refresh
/// signal.
pub struct IntervalTicker {
    interval: Duration,
    handle: Option<thread::JoinHandle<()>>,
    shutdown: Arc<AtomicBool>,
}

impl IntervalTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval, handle: None, shutdown: Arc::new(AtomicBool::new(false)) }
    }
}

impl Ticker for IntervalTicker {
    fn start(&mut self, mut callback: TickFn) {
        self.stop();

        let shutdown = Arc::new(AtomicBool::new(false));
        self.shutdown = Arc::clone(&shutdown);
        let interval = self.interval;

        self.handle = Some(
            thread::Builder::new()
                .name("peak-ticker".into())
                .spawn(move || {
                    trace!("Ticker started ({:?} interval)", interval);
                    while !shutdown.load(Ordering::Relaxed) {
                        callback(Instant::now());
                        thread::sleep(interval);
                    }
                    trace!("Ticker stopped");
                })
                .expect("Failed to spawn ticker thread"),
        );
    }

    fn stop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for IntervalTicker {
    fn drop(&mut self) {
        self.stop();
    }
}

use super::{Metronome, MetronomeListener, TapTempo, CLICKS_PER_BEAT};
use atomic_float::AtomicF64;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Weak;
use std::time::{Duration, Instant};

/// Metronome without a clock. Clicks are driven explicitly with
/// [`click`](Self::click) or [`beat`](Self::beat), which makes generator
/// output deterministic for tests and offline rendering.
pub struct ManualMetronome {
    running: AtomicBool,
    bpm: AtomicF64,
    starts: AtomicUsize,
    stops: AtomicUsize,
    listener: Mutex<Option<Weak<dyn MetronomeListener>>>,
    taps: Mutex<TapTempo>,
}

impl ManualMetronome {
    pub fn new(bpm: f64) -> Self {
        Self {
            running: AtomicBool::new(false),
            bpm: AtomicF64::new(bpm),
            starts: AtomicUsize::new(0),
            stops: AtomicUsize::new(0),
            listener: Mutex::new(None),
            taps: Mutex::new(TapTempo::new(Duration::from_secs(2))),
        }
    }

    fn listener(&self) -> Option<std::sync::Arc<dyn MetronomeListener>> {
        self.listener.lock().as_ref().and_then(Weak::upgrade)
    }

    /// Delivers one click to the listener if the metronome is running.
    /// Returns whether a click was delivered.
    pub fn click(&self, position: u32) -> bool {
        if !self.is_running() {
            return false;
        }
        match self.listener() {
            Some(listener) => {
                listener.metronome_clicked(position % CLICKS_PER_BEAT);
                true
            }
            None => false,
        }
    }

    /// Delivers a full beat of clicks.
    pub fn beat(&self) {
        for position in 0..CLICKS_PER_BEAT {
            self.click(position);
        }
    }

    pub fn start_count(&self) -> usize {
        self.starts.load(Ordering::Acquire)
    }

    pub fn stop_count(&self) -> usize {
        self.stops.load(Ordering::Acquire)
    }

    /// Tap tempo at an explicit instant.
    pub fn tap_at(&self, now: Instant) {
        if let Some(bpm) = self.taps.lock().tap(now) {
            self.set_bpm(bpm);
        }
    }
}

impl Default for ManualMetronome {
    fn default() -> Self {
        Self::new(120.0)
    }
}

impl Metronome for ManualMetronome {
    fn start(&self) {
        if !self.running.swap(true, Ordering::AcqRel) {
            self.starts.fetch_add(1, Ordering::AcqRel);
        }
    }

    fn stop(&self) {
        if self.running.swap(false, Ordering::AcqRel) {
            self.stops.fetch_add(1, Ordering::AcqRel);
        }
    }

    fn restart(&self) {
        self.start();
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    fn bpm(&self) -> f64 {
        self.bpm.load(Ordering::Acquire)
    }

    fn set_bpm(&self, bpm: f64) {
        self.bpm.store(bpm, Ordering::Release);
    }

    fn tap_tempo(&self) {
        self.tap_at(Instant::now());
    }

    fn set_listener(&self, listener: Weak<dyn MetronomeListener>) {
        *self.listener.lock() = Some(listener);
    }
}

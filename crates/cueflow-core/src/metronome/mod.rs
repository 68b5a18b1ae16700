//! Metronome contract and implementations.
//!
//! A metronome emits [`CLICKS_PER_BEAT`] clicks per beat to its listener.
//! Listener callbacks are delivered from the metronome's own context, never
//! from inside `start`/`stop`/`set_bpm`, so callers may invoke those while
//! holding a lock the listener also takes.

mod manual;
mod tap;
mod thread;

pub use manual::ManualMetronome;
pub use tap::TapTempo;
pub use thread::ThreadMetronome;

use serde::{Deserialize, Serialize};
use std::sync::Weak;

/// Metronome resolution.
pub const CLICKS_PER_BEAT: u32 = 24;

pub trait Metronome: Send + Sync {
    fn start(&self);
    fn stop(&self);
    /// Starts over from click 0, starting the metronome if it is stopped.
    fn restart(&self);
    fn is_running(&self) -> bool;
    fn bpm(&self) -> f64;
    fn set_bpm(&self, bpm: f64);
    fn tap_tempo(&self);
    fn set_listener(&self, listener: Weak<dyn MetronomeListener>);
}

pub trait MetronomeListener: Send + Sync {
    /// `position` counts clicks within the beat, 0 to [`CLICKS_PER_BEAT`] - 1.
    fn metronome_clicked(&self, position: u32);
    fn metronome_started(&self) {}
    fn metronome_stopped(&self) {}
    fn bpm_changed(&self, _bpm: f64) {}
}

/// Note value a generator steps on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Subdivision {
    Quarter,
    #[default]
    Eighth,
    EighthTriplet,
    Sixteenth,
    SixteenthTriplet,
    ThirtySecond,
}

impl Subdivision {
    pub fn per_beat(self) -> u32 {
        match self {
            Subdivision::Quarter => 1,
            Subdivision::Eighth => 2,
            Subdivision::EighthTriplet => 3,
            Subdivision::Sixteenth => 4,
            Subdivision::SixteenthTriplet => 6,
            Subdivision::ThirtySecond => 8,
        }
    }

    /// Clicks between two steps.
    pub fn clicks(self) -> u32 {
        CLICKS_PER_BEAT / self.per_beat()
    }

    #[inline]
    pub fn matches(self, position: u32) -> bool {
        position % self.clicks() == 0
    }
}

/// Time between two clicks at `bpm`.
pub(crate) fn click_interval(bpm: f64) -> std::time::Duration {
    std::time::Duration::from_secs_f64(60.0 / bpm / CLICKS_PER_BEAT as f64)
}

//! Engine configuration.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const MIN_BPM: f64 = 20.0;
pub const MAX_BPM: f64 = 999.0;

/// Where sustain pedal (CC64) messages go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SustainRouting {
    /// Every one of the 16 channels, bypassing control maps. Synths that
    /// share voices across channels otherwise keep ringing notes whose
    /// channel was not in the current assignment set.
    #[default]
    AllChannels,
    /// Route like any other controller (cue map, global map, broadcast).
    AssignedChannels,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub initial_bpm: f64,
    pub sustain_routing: SustainRouting,
    /// Controllers sent on all 16 channels by a panic.
    pub panic_controllers: Vec<u8>,
    /// Send CC7 with the usage volume after every program change.
    pub send_volume_on_assign: bool,
    /// Taps further apart than this start a new tap-tempo measurement.
    pub tap_tempo_reset_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            initial_bpm: 120.0,
            sustain_routing: SustainRouting::AllChannels,
            panic_controllers: vec![cueflow_midi::cc::ALL_NOTES_OFF],
            send_volume_on_assign: true,
            tap_tempo_reset_ms: 2000,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        if !(MIN_BPM..=MAX_BPM).contains(&self.initial_bpm) {
            return Err(Error::InvalidTempo(self.initial_bpm));
        }
        if let Some(cc) = self.panic_controllers.iter().find(|&&cc| cc > 127) {
            return Err(Error::InvalidConfig(format!(
                "panic controller {} out of range (0-127)",
                cc
            )));
        }
        if self.tap_tempo_reset_ms == 0 {
            return Err(Error::InvalidConfig(
                "tap_tempo_reset_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn tap_tempo_reset(&self) -> Duration {
        Duration::from_millis(self.tap_tempo_reset_ms)
    }
}

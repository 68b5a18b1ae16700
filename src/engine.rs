//! Cueflow: the performance engine together with the MIDI ports it owns.

use crate::builder::CueflowBuilder;
use cueflow_core::{CueKey, PerformanceEngine, Position, Result, Setlist, SongId};
use cueflow_midi::InputMessage;

#[cfg(feature = "midi-io")]
use cueflow_midi::{MidiInputManager, MidiOutputManager};

/// Owns the hardware connections for as long as it lives; dropping it
/// disconnects input devices. The wrapped [`PerformanceEngine`] is a cheap
/// clone and can be handed to a UI thread via [`Cueflow::engine`].
///
/// # Example
///
/// ```ignore
/// use cueflow::prelude::*;
///
/// let cueflow = Cueflow::builder(setlist).sink(sink).build()?;
/// cueflow.go_to(0)?;
/// cueflow.send(InputMessage::note_on(0, 60, 100));
/// ```
pub struct Cueflow {
    pub(crate) engine: PerformanceEngine,
    #[cfg(feature = "midi-io")]
    pub(crate) output: Option<MidiOutputManager>,
    #[cfg(feature = "midi-io")]
    pub(crate) inputs: Vec<MidiInputManager>,
}

impl Cueflow {
    pub fn builder(setlist: Setlist) -> CueflowBuilder {
        CueflowBuilder::new(setlist)
    }

    pub fn engine(&self) -> &PerformanceEngine {
        &self.engine
    }

    /// Feed one input message, as an input device callback would.
    pub fn send(&self, message: InputMessage) {
        self.engine.send(message);
    }

    pub fn go_to(&self, index: usize) -> Result<()> {
        self.engine.go_to(index)
    }

    pub fn go_to_cue(&self, key: &CueKey) -> Result<()> {
        self.engine.go_to_cue(key)
    }

    pub fn go_to_song(&self, song: SongId, measure: u32) -> Result<()> {
        self.engine.go_to_song(song, measure)
    }

    pub fn advance(&self) {
        self.engine.advance();
    }

    pub fn reverse(&self) {
        self.engine.reverse();
    }

    pub fn restart(&self) {
        self.engine.restart();
    }

    pub fn panic(&self) {
        self.engine.panic();
    }

    pub fn position(&self) -> Position {
        self.engine.position()
    }

    /// Name of the connected output port, if a hardware port is in use.
    #[cfg(feature = "midi-io")]
    pub fn output_device_name(&self) -> Option<String> {
        self.output
            .as_ref()
            .and_then(MidiOutputManager::connected_device_name)
    }

    #[cfg(feature = "midi-io")]
    pub fn input_device_names(&self) -> Vec<String> {
        self.inputs
            .iter()
            .filter_map(MidiInputManager::connected_device_name)
            .collect()
    }

    /// Disconnects inputs first so nothing arrives after the engine stops.
    pub fn shutdown(&self) {
        #[cfg(feature = "midi-io")]
        for input in &self.inputs {
            input.disconnect();
        }
        self.engine.shutdown();
    }
}

impl Drop for Cueflow {
    fn drop(&mut self) {
        #[cfg(feature = "midi-io")]
        for input in &self.inputs {
            input.disconnect();
        }
    }
}

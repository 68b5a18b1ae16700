//! Metronome-driven note generators.
//!
//! Generators never answer a key press directly. They collect held notes and
//! emit on metronome clicks that match their [`Subdivision`](crate::Subdivision).

pub mod arpeggiator;
pub mod sequencer;

pub use arpeggiator::{ArpPattern, Arpeggiator, ArpeggiatorSettings};
pub use sequencer::{NoteChangeBehavior, Sequencer, SequencerDefinition};

use smallvec::SmallVec;

/// Notes to release and start for one click, in that order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneratorOutput {
    pub offs: SmallVec<[u8; 8]>,
    /// `(note, velocity)`
    pub ons: SmallVec<[(u8, u8); 8]>,
}

impl GeneratorOutput {
    pub fn is_empty(&self) -> bool {
        self.offs.is_empty() && self.ons.is_empty()
    }
}

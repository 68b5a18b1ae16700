//! Hardware MIDI I/O over `midir`.

pub(crate) mod input;
pub(crate) mod output;

pub use input::{InputHandler, MidiInputDevice, MidiInputManager};
pub use output::{MidiOutputDevice, MidiOutputManager};

use cueflow_midi::{KeyboardId, NoteRange};
use serde::{Deserialize, Serialize};

/// A physical input keyboard, identified by the MIDI channel it sends on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keyboard {
    pub id: KeyboardId,
    pub name: String,
    pub channel: u8,
    pub physical: NoteRange,
    pub sounding: NoteRange,
    pub is_main: bool,
}

impl Keyboard {
    /// A full-range keyboard.
    pub fn new(id: KeyboardId, name: impl Into<String>, channel: u8) -> Self {
        Self {
            id,
            name: name.into(),
            channel,
            physical: NoteRange::full(id),
            sounding: NoteRange::full(id),
            is_main: false,
        }
    }

    pub fn with_physical_range(mut self, range: NoteRange) -> Self {
        self.physical = NoteRange { keyboard: self.id, ..range };
        self
    }

    pub fn with_sounding_range(mut self, range: NoteRange) -> Self {
        self.sounding = NoteRange { keyboard: self.id, ..range };
        self
    }

    pub fn main(mut self) -> Self {
        self.is_main = true;
        self
    }
}

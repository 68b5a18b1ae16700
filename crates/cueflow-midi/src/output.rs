//! Outgoing messages and the sinks that deliver them.
//!
//! Message constructors validate their arguments instead of masking them: a
//! router that computes channel 16 or note 130 has a bug, and the send boundary
//! is where it gets reported (and dropped).

use crate::error::{Error, Result};
use crate::message::{
    cc, STATUS_CONTROL_CHANGE, STATUS_NOTE_OFF, STATUS_NOTE_ON, STATUS_PROGRAM_CHANGE,
};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Number of MIDI channels addressable on one port.
pub const CHANNEL_COUNT: u8 = 16;

/// A validated channel-voice message ready for the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutputMessage {
    NoteOn { channel: u8, note: u8, velocity: u8 },
    NoteOff { channel: u8, note: u8, velocity: u8 },
    ControlChange { channel: u8, control: u8, value: u8 },
    ProgramChange { channel: u8, program: u8 },
}

fn check_channel(channel: u8) -> Result<u8> {
    if channel < CHANNEL_COUNT {
        Ok(channel)
    } else {
        Err(Error::InvalidChannel(channel))
    }
}

fn check_note(note: i32) -> Result<u8> {
    if (0..=127).contains(&note) {
        Ok(note as u8)
    } else {
        Err(Error::InvalidNote(note))
    }
}

fn check_velocity(velocity: i32) -> Result<u8> {
    if (0..=127).contains(&velocity) {
        Ok(velocity as u8)
    } else {
        Err(Error::InvalidVelocity(velocity))
    }
}

impl OutputMessage {
    pub fn note_on(channel: u8, note: i32, velocity: i32) -> Result<Self> {
        Ok(OutputMessage::NoteOn {
            channel: check_channel(channel)?,
            note: check_note(note)?,
            velocity: check_velocity(velocity)?,
        })
    }

    pub fn note_off(channel: u8, note: i32) -> Result<Self> {
        Ok(OutputMessage::NoteOff {
            channel: check_channel(channel)?,
            note: check_note(note)?,
            velocity: 0,
        })
    }

    pub fn control_change(channel: u8, control: u8, value: u8) -> Result<Self> {
        if control > 127 || value > 127 {
            return Err(Error::InvalidController { cc: control, value });
        }
        Ok(OutputMessage::ControlChange {
            channel: check_channel(channel)?,
            control,
            value,
        })
    }

    pub fn program_change(channel: u8, program: u8) -> Result<Self> {
        if program > 127 {
            return Err(Error::InvalidProgram(program));
        }
        Ok(OutputMessage::ProgramChange {
            channel: check_channel(channel)?,
            program,
        })
    }

    #[inline]
    pub fn channel(&self) -> u8 {
        match *self {
            OutputMessage::NoteOn { channel, .. }
            | OutputMessage::NoteOff { channel, .. }
            | OutputMessage::ControlChange { channel, .. }
            | OutputMessage::ProgramChange { channel, .. } => channel,
        }
    }

    pub fn to_bytes(&self) -> SmallVec<[u8; 3]> {
        match *self {
            OutputMessage::NoteOn {
                channel,
                note,
                velocity,
            } => SmallVec::from_slice(&[STATUS_NOTE_ON | channel, note, velocity]),
            OutputMessage::NoteOff {
                channel,
                note,
                velocity,
            } => SmallVec::from_slice(&[STATUS_NOTE_OFF | channel, note, velocity]),
            OutputMessage::ControlChange {
                channel,
                control,
                value,
            } => SmallVec::from_slice(&[STATUS_CONTROL_CHANGE | channel, control, value]),
            OutputMessage::ProgramChange { channel, program } => {
                SmallVec::from_slice(&[STATUS_PROGRAM_CHANGE | channel, program])
            }
        }
    }
}

/// Destination for routed MIDI.
///
/// Implementations must not block for long: the engine calls `send` while
/// holding its session lock.
pub trait MidiSink: Send + Sync {
    fn send(&self, message: OutputMessage) -> Result<()>;

    fn send_note_on(&self, channel: u8, note: i32, velocity: i32) -> Result<()> {
        self.send(OutputMessage::note_on(channel, note, velocity)?)
    }

    fn send_note_off(&self, channel: u8, note: i32) -> Result<()> {
        self.send(OutputMessage::note_off(channel, note)?)
    }

    fn send_control_change(&self, channel: u8, control: u8, value: u8) -> Result<()> {
        self.send(OutputMessage::control_change(channel, control, value)?)
    }

    fn send_program_change(&self, channel: u8, program: u8) -> Result<()> {
        self.send(OutputMessage::program_change(channel, program)?)
    }

    /// CC123 on every channel.
    fn send_all_notes_off(&self) -> Result<()> {
        for channel in 0..CHANNEL_COUNT {
            self.send_control_change(channel, cc::ALL_NOTES_OFF, 0)?;
        }
        Ok(())
    }
}

impl<S: MidiSink + ?Sized> MidiSink for std::sync::Arc<S> {
    fn send(&self, message: OutputMessage) -> Result<()> {
        (**self).send(message)
    }
}

/// Records every message it receives. Used for tests and dry runs.
#[derive(Debug, Default)]
pub struct CaptureSink {
    messages: Mutex<Vec<OutputMessage>>,
}

impl CaptureSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<OutputMessage> {
        self.messages.lock().clone()
    }

    /// Returns and clears the recorded messages.
    pub fn take(&self) -> Vec<OutputMessage> {
        std::mem::take(&mut *self.messages.lock())
    }

    pub fn clear(&self) {
        self.messages.lock().clear();
    }

    pub fn note_ons(&self) -> Vec<(u8, u8, u8)> {
        self.messages
            .lock()
            .iter()
            .filter_map(|m| match *m {
                OutputMessage::NoteOn {
                    channel,
                    note,
                    velocity,
                } => Some((channel, note, velocity)),
                _ => None,
            })
            .collect()
    }

    pub fn note_offs(&self) -> Vec<(u8, u8)> {
        self.messages
            .lock()
            .iter()
            .filter_map(|m| match *m {
                OutputMessage::NoteOff { channel, note, .. } => Some((channel, note)),
                _ => None,
            })
            .collect()
    }

    pub fn control_changes(&self) -> Vec<(u8, u8, u8)> {
        self.messages
            .lock()
            .iter()
            .filter_map(|m| match *m {
                OutputMessage::ControlChange {
                    channel,
                    control,
                    value,
                } => Some((channel, control, value)),
                _ => None,
            })
            .collect()
    }

    pub fn program_changes(&self) -> Vec<(u8, u8)> {
        self.messages
            .lock()
            .iter()
            .filter_map(|m| match *m {
                OutputMessage::ProgramChange { channel, program } => Some((channel, program)),
                _ => None,
            })
            .collect()
    }
}

impl MidiSink for CaptureSink {
    fn send(&self, message: OutputMessage) -> Result<()> {
        self.messages.lock().push(message);
        Ok(())
    }
}

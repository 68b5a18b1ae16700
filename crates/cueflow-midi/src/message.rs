//! Incoming channel-voice messages.
//!
//! Hardware callbacks hand us raw bytes; only note and control-change messages
//! matter to the router, everything else parses to [`InputMessage::Other`].

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

pub const STATUS_NOTE_OFF: u8 = 0x80;
pub const STATUS_NOTE_ON: u8 = 0x90;
pub const STATUS_CONTROL_CHANGE: u8 = 0xB0;
pub const STATUS_PROGRAM_CHANGE: u8 = 0xC0;

/// Well-known controller numbers.
pub mod cc {
    pub const BANK_SELECT_MSB: u8 = 0;
    pub const VOLUME: u8 = 7;
    pub const BANK_SELECT_LSB: u8 = 32;
    pub const SUSTAIN: u8 = 64;
    pub const ALL_SOUND_OFF: u8 = 120;
    pub const ALL_NOTES_OFF: u8 = 123;
}

/// Parsed channel-voice message from an input device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InputMessage {
    NoteOn { channel: u8, note: u8, velocity: u8 },
    NoteOff { channel: u8, note: u8, velocity: u8 },
    ControlChange { channel: u8, control: u8, value: u8 },
    /// Any other channel-voice message; carries only the channel.
    Other { channel: u8, status: u8 },
}

impl InputMessage {
    #[inline]
    pub fn note_on(channel: u8, note: u8, velocity: u8) -> Self {
        InputMessage::NoteOn {
            channel,
            note,
            velocity,
        }
    }

    #[inline]
    pub fn note_off(channel: u8, note: u8) -> Self {
        InputMessage::NoteOff {
            channel,
            note,
            velocity: 0,
        }
    }

    #[inline]
    pub fn control_change(channel: u8, control: u8, value: u8) -> Self {
        InputMessage::ControlChange {
            channel,
            control,
            value,
        }
    }

    /// Parses a complete message. Running status is not supported.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let unsupported = || Error::UnsupportedMessage(bytes.to_vec());
        let status = *bytes.first().ok_or_else(unsupported)?;
        if !(0x80..0xF0).contains(&status) {
            return Err(unsupported());
        }

        let channel = status & 0x0F;
        let data = |i: usize| -> Result<u8> {
            match bytes.get(i) {
                Some(&b) if b < 0x80 => Ok(b),
                _ => Err(unsupported()),
            }
        };

        match status & 0xF0 {
            STATUS_NOTE_OFF => Ok(InputMessage::NoteOff {
                channel,
                note: data(1)?,
                velocity: data(2)?,
            }),
            STATUS_NOTE_ON => Ok(InputMessage::NoteOn {
                channel,
                note: data(1)?,
                velocity: data(2)?,
            }),
            STATUS_CONTROL_CHANGE => Ok(InputMessage::ControlChange {
                channel,
                control: data(1)?,
                value: data(2)?,
            }),
            other => Ok(InputMessage::Other {
                channel,
                status: other,
            }),
        }
    }

    #[inline]
    pub fn channel(&self) -> u8 {
        match *self {
            InputMessage::NoteOn { channel, .. }
            | InputMessage::NoteOff { channel, .. }
            | InputMessage::ControlChange { channel, .. }
            | InputMessage::Other { channel, .. } => channel,
        }
    }

    /// Note-on with velocity 0 counts as note-off.
    #[inline]
    pub fn is_note_on(&self) -> bool {
        matches!(self, InputMessage::NoteOn { velocity, .. } if *velocity > 0)
    }

    #[inline]
    pub fn is_note_off(&self) -> bool {
        matches!(
            self,
            InputMessage::NoteOff { .. } | InputMessage::NoteOn { velocity: 0, .. }
        )
    }

    #[inline]
    pub fn note(&self) -> Option<u8> {
        match *self {
            InputMessage::NoteOn { note, .. } | InputMessage::NoteOff { note, .. } => Some(note),
            _ => None,
        }
    }
}

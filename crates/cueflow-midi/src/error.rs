//! Error types for the MIDI layer.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Invalid MIDI channel: {0} (expected 0-15)")]
    InvalidChannel(u8),

    #[error("Invalid MIDI note: {0} (expected 0-127)")]
    InvalidNote(i32),

    #[error("Invalid velocity: {0} (expected 0-127)")]
    InvalidVelocity(i32),

    #[error("Invalid controller value: cc={cc}, value={value}")]
    InvalidController { cc: u8, value: u8 },

    #[error("Invalid program: {0} (expected 0-127)")]
    InvalidProgram(u8),

    #[error("Unsupported MIDI message: {0:02X?}")]
    UnsupportedMessage(Vec<u8>),

    #[error("Invalid note name: {0}")]
    InvalidNoteName(String),

    #[error("MIDI port error: {0}")]
    MidiPort(String),

    #[error("MIDI device error: {0}")]
    MidiDevice(String),
}

#[cfg(feature = "midi-io")]
impl From<midir::InitError> for Error {
    fn from(e: midir::InitError) -> Self {
        Error::MidiDevice(e.to_string())
    }
}

#[cfg(feature = "midi-io")]
impl From<midir::ConnectError<midir::MidiOutput>> for Error {
    fn from(e: midir::ConnectError<midir::MidiOutput>) -> Self {
        Error::MidiPort(e.to_string())
    }
}

#[cfg(feature = "midi-io")]
impl From<midir::ConnectError<midir::MidiInput>> for Error {
    fn from(e: midir::ConnectError<midir::MidiInput>) -> Self {
        Error::MidiPort(e.to_string())
    }
}

#[cfg(feature = "midi-io")]
impl From<midir::SendError> for Error {
    fn from(e: midir::SendError) -> Self {
        Error::MidiPort(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

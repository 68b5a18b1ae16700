//! Error types for cueflow-core.

use crate::assign::UsageId;
use crate::setlist::{CueKey, SongId, SynthId};
use cueflow_midi::KeyboardId;
use thiserror::Error;

/// Error type for engine setup and navigation.
///
/// Per-event failures (a malformed outgoing message, a stale routing target)
/// are logged and dropped inside the engine; they never surface here.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error(transparent)]
    Midi(#[from] cueflow_midi::Error),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Invalid tempo: {0}. Must be between 20.0 and 999.0 BPM")]
    InvalidTempo(f64),

    #[error("Unknown synthesizer {synth:?} referenced by usage {usage:?}")]
    UnknownSynthesizer { synth: SynthId, usage: UsageId },

    #[error("Unknown {keyboard} referenced by {context}")]
    UnknownKeyboard {
        keyboard: KeyboardId,
        context: String,
    },

    #[error("Usage id {0:?} appears more than once in the setlist")]
    DuplicateUsageId(UsageId),

    #[error("Unknown song {0:?}")]
    UnknownSong(SongId),

    #[error("No cue at {0}")]
    UnknownCue(CueKey),

    #[error("Cue index {index} out of range (setlist has {len} cues)")]
    CueOutOfRange { index: usize, len: usize },

    #[error("Invalid sequence: {0}")]
    InvalidSequence(String),

    #[error("Engine has been shut down")]
    ShutDown,
}

/// Result type alias.
pub type Result<T> = core::result::Result<T, Error>;

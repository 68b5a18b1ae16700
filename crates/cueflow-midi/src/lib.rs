//! MIDI layer for the cueflow performance router.
//!
//! Provides pitch/range value types, input message parsing, validated output
//! messages, the [`MidiSink`] abstraction and hardware I/O.
//!
//! Feature gates: `midi-io` (hardware ports via `midir`).

pub mod error;
pub use error::{Error, Result};

pub mod note;
pub use note::{KeyboardId, Note, NoteRange};

pub mod message;
pub use message::{cc, InputMessage};

pub mod output;
pub use output::{CaptureSink, MidiSink, OutputMessage, CHANNEL_COUNT};

#[cfg(feature = "midi-io")]
pub mod io;

#[cfg(feature = "midi-io")]
pub use io::{InputHandler, MidiInputDevice, MidiInputManager, MidiOutputDevice, MidiOutputManager};

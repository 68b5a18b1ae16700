//! Pitch and key-range value types.
//!
//! A [`Note`] is a MIDI note number (0-127). Middle C (MIDI 60) is `C4`,
//! concert A (MIDI 69) is `A4`.
//!
//! # Example
//! ```ignore
//! use cueflow_midi::{KeyboardId, Note, NoteRange};
//!
//! let c4: Note = "C4".parse()?;
//! assert_eq!(c4.midi(), 60);
//! assert_eq!(c4.transpose(7), Some(Note::new(67)?));
//!
//! let range = NoteRange::new(KeyboardId(1), "C3".parse()?, "C5".parse()?);
//! assert!(range.contains(60));
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const PITCH_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// MIDI note number (0-127).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Note(u8);

impl Note {
    pub const LOWEST: Note = Note(0);
    pub const HIGHEST: Note = Note(127);
    pub const MIDDLE_C: Note = Note(60);

    pub fn new(midi: u8) -> Result<Note> {
        if midi > 127 {
            return Err(Error::InvalidNote(midi as i32));
        }
        Ok(Note(midi))
    }

    /// Clamps out-of-range values to 0-127.
    pub fn saturating(midi: i32) -> Note {
        Note(midi.clamp(0, 127) as u8)
    }

    pub const fn midi(self) -> u8 {
        self.0
    }

    /// 0-11, where 0 = C.
    pub const fn pitch_class(self) -> u8 {
        self.0 % 12
    }

    /// Returns -1 to 9.
    pub const fn octave(self) -> i8 {
        (self.0 / 12) as i8 - 1
    }

    /// Returns `None` if the result would leave the MIDI range.
    pub fn transpose(self, semitones: i16) -> Option<Note> {
        let shifted = self.0 as i16 + semitones;
        if (0..=127).contains(&shifted) {
            Some(Note(shifted as u8))
        } else {
            None
        }
    }

    /// Signed distance in semitones from `other` to `self`.
    pub fn interval_from(self, other: Note) -> i16 {
        self.0 as i16 - other.0 as i16
    }

    pub fn name(self) -> String {
        format!("{}{}", PITCH_NAMES[self.pitch_class() as usize], self.octave())
    }
}

impl From<Note> for u8 {
    fn from(note: Note) -> u8 {
        note.0
    }
}

impl TryFrom<u8> for Note {
    type Error = Error;

    fn try_from(midi: u8) -> Result<Self> {
        Note::new(midi)
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

impl FromStr for Note {
    type Err = Error;

    /// Parses scientific pitch notation: `C4`, `F#3`, `Bb-1`.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidNoteName(s.to_string());
        let mut chars = s.trim().chars().peekable();

        let letter = chars.next().ok_or_else(invalid)?.to_ascii_uppercase();
        let base: i32 = match letter {
            'C' => 0,
            'D' => 2,
            'E' => 4,
            'F' => 5,
            'G' => 7,
            'A' => 9,
            'B' => 11,
            _ => return Err(invalid()),
        };

        let accidental = match chars.peek() {
            Some('#') | Some('s') => {
                chars.next();
                1
            }
            Some('b') => {
                chars.next();
                -1
            }
            _ => 0,
        };

        let octave: i32 = chars.collect::<String>().parse().map_err(|_| invalid())?;
        let midi = (octave + 1) * 12 + base + accidental;
        if !(0..=127).contains(&midi) {
            return Err(Error::InvalidNote(midi));
        }
        Ok(Note(midi as u8))
    }
}

/// Identifies a logical input keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct KeyboardId(pub u32);

impl fmt::Display for KeyboardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "keyboard#{}", self.0)
    }
}

/// Inclusive range of notes on one keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NoteRange {
    pub keyboard: KeyboardId,
    pub lower: Note,
    pub upper: Note,
}

impl NoteRange {
    /// Bounds given in the wrong order are swapped.
    pub fn new(keyboard: KeyboardId, lower: Note, upper: Note) -> Self {
        let (lower, upper) = if lower <= upper {
            (lower, upper)
        } else {
            (upper, lower)
        };
        Self {
            keyboard,
            lower,
            upper,
        }
    }

    /// The whole MIDI range of `keyboard`.
    pub fn full(keyboard: KeyboardId) -> Self {
        Self::new(keyboard, Note::LOWEST, Note::HIGHEST)
    }

    #[inline]
    pub fn contains(&self, midi: u8) -> bool {
        self.lower.midi() <= midi && midi <= self.upper.midi()
    }

    #[inline]
    pub fn covers(&self, keyboard: KeyboardId, midi: u8) -> bool {
        self.keyboard == keyboard && self.contains(midi)
    }

    /// Number of keys covered.
    pub fn span(&self) -> usize {
        (self.upper.midi() - self.lower.midi()) as usize + 1
    }
}

//! Musical scales for pitch-class remapping and sequencer quantization.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScaleKind {
    Chromatic,
    Major,
    NaturalMinor,
    HarmonicMinor,
    Dorian,
    Mixolydian,
    MajorPentatonic,
    MinorPentatonic,
    Blues,
}

impl ScaleKind {
    /// Semitone offsets from the root, ascending, starting at 0.
    pub fn intervals(self) -> &'static [u8] {
        match self {
            ScaleKind::Chromatic => &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11],
            ScaleKind::Major => &[0, 2, 4, 5, 7, 9, 11],
            ScaleKind::NaturalMinor => &[0, 2, 3, 5, 7, 8, 10],
            ScaleKind::HarmonicMinor => &[0, 2, 3, 5, 7, 8, 11],
            ScaleKind::Dorian => &[0, 2, 3, 5, 7, 9, 10],
            ScaleKind::Mixolydian => &[0, 2, 4, 5, 7, 9, 10],
            ScaleKind::MajorPentatonic => &[0, 2, 4, 7, 9],
            ScaleKind::MinorPentatonic => &[0, 3, 5, 7, 10],
            ScaleKind::Blues => &[0, 3, 5, 6, 7, 10],
        }
    }
}

/// A scale rooted on a pitch class (0 = C).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Scale {
    pub root: u8,
    pub kind: ScaleKind,
}

impl Scale {
    pub fn new(root: u8, kind: ScaleKind) -> Self {
        Self {
            root: root % 12,
            kind,
        }
    }

    pub fn major(root: u8) -> Self {
        Self::new(root, ScaleKind::Major)
    }

    pub fn minor(root: u8) -> Self {
        Self::new(root, ScaleKind::NaturalMinor)
    }

    /// Whether the pitch class of `note` belongs to the scale.
    pub fn contains(&self, note: u8) -> bool {
        let degree = (note % 12 + 12 - self.root) % 12;
        self.kind.intervals().contains(&degree)
    }

    /// Snaps `note` down to the nearest scale tone. Notes already in the scale
    /// are returned unchanged. A note below the lowest scale tone of the MIDI
    /// range snaps up instead.
    pub fn quantize(&self, note: u8) -> u8 {
        let mut candidate = note;
        loop {
            if self.contains(candidate) {
                return candidate;
            }
            if candidate == 0 {
                break;
            }
            candidate -= 1;
        }
        let mut candidate = note;
        while candidate < 127 && !self.contains(candidate) {
            candidate += 1;
        }
        candidate
    }

    /// Signed offset that moves a note of pitch class `pitch_class` onto the
    /// scale.
    pub fn offset_for(&self, pitch_class: u8) -> i8 {
        let pitch_class = pitch_class % 12;
        // Use octave 5 so snapping down never crosses zero.
        let note = 60 + pitch_class;
        self.quantize(note) as i8 - note as i8
    }
}

//! Synthesizers and the patches they play.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SynthId(pub u32);

/// Bank select values sent before the program change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Bank {
    pub msb: u8,
    pub lsb: Option<u8>,
}

/// A sound on a synthesizer.
///
/// Two patches are the same sound when synth, bank, name and program match;
/// the default volume does not take part in equality.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patch {
    pub synth: SynthId,
    pub name: String,
    pub bank: Option<Bank>,
    pub program: u8,
    pub default_volume: u8,
}

impl Patch {
    pub fn new(synth: SynthId, name: impl Into<String>, program: u8) -> Self {
        Self {
            synth,
            name: name.into(),
            bank: None,
            program: program.min(127),
            default_volume: 100,
        }
    }

    pub fn with_bank(mut self, msb: u8, lsb: Option<u8>) -> Self {
        self.bank = Some(Bank { msb, lsb });
        self
    }

    pub fn with_default_volume(mut self, volume: u8) -> Self {
        self.default_volume = volume.min(127);
        self
    }
}

impl PartialEq for Patch {
    fn eq(&self, other: &Self) -> bool {
        self.synth == other.synth
            && self.bank == other.bank
            && self.name == other.name
            && self.program == other.program
    }
}

impl Eq for Patch {}

impl Hash for Patch {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.synth.hash(state);
        self.bank.hash(state);
        self.name.hash(state);
        self.program.hash(state);
    }
}

impl fmt::Display for Patch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (program {})", self.name, self.program)
    }
}

/// An output synthesizer and the channels it may be driven on, in
/// preference order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Synthesizer {
    pub id: SynthId,
    pub name: String,
    pub channels: Vec<u8>,
}

impl Synthesizer {
    pub fn new(id: SynthId, name: impl Into<String>, channels: impl Into<Vec<u8>>) -> Self {
        Self {
            id,
            name: name.into(),
            channels: channels.into(),
        }
    }
}

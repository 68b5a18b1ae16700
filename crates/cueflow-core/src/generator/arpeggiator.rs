//! Arpeggiator: cycles through the held chord one note per step.

use super::GeneratorOutput;
use crate::metronome::Subdivision;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ArpPattern {
    #[default]
    Ascending,
    Descending,
    /// Up and down, starting from the lowest note: 0,1,2,1,0,1,...
    AlternatingBottom,
    /// Down and up, starting from the highest note.
    AlternatingTop,
    Random,
    /// Random, never the same index twice in a row.
    RandomNonRepeating,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArpeggiatorSettings {
    pub pattern: ArpPattern,
    pub subdivision: Subdivision,
    /// Fewer held notes than this produce silence.
    pub min_notes: usize,
}

impl Default for ArpeggiatorSettings {
    fn default() -> Self {
        Self {
            pattern: ArpPattern::Ascending,
            subdivision: Subdivision::Eighth,
            min_notes: 1,
        }
    }
}

/// Runtime state of one arpeggiator usage.
#[derive(Debug)]
pub struct Arpeggiator {
    settings: ArpeggiatorSettings,
    held: BTreeSet<u8>,
    velocity: u8,
    counter: usize,
    cursor: Option<usize>,
    ascending: bool,
    last_index: Option<usize>,
    sounding: Option<u8>,
    rng: StdRng,
}

impl Arpeggiator {
    pub fn new(settings: ArpeggiatorSettings) -> Self {
        Self::with_rng(settings, StdRng::from_entropy())
    }

    /// Fixed seed for reproducible random patterns.
    pub fn with_seed(settings: ArpeggiatorSettings, seed: u64) -> Self {
        Self::with_rng(settings, StdRng::seed_from_u64(seed))
    }

    fn with_rng(settings: ArpeggiatorSettings, rng: StdRng) -> Self {
        Self {
            settings,
            held: BTreeSet::new(),
            velocity: 0,
            counter: 0,
            cursor: None,
            ascending: true,
            last_index: None,
            sounding: None,
            rng,
        }
    }

    pub fn settings(&self) -> &ArpeggiatorSettings {
        &self.settings
    }

    pub fn held(&self) -> impl Iterator<Item = u8> + '_ {
        self.held.iter().copied()
    }

    pub fn sounding(&self) -> Option<u8> {
        self.sounding
    }

    /// The latest press sets the velocity of every following step.
    pub fn press(&mut self, note: u8, velocity: u8) {
        self.held.insert(note);
        self.velocity = velocity;
    }

    pub fn release(&mut self, note: u8) {
        self.held.remove(&note);
        if self.held.is_empty() {
            self.reset_pattern();
        }
    }

    pub fn release_all(&mut self) {
        self.held.clear();
        self.reset_pattern();
    }

    fn reset_pattern(&mut self) {
        self.counter = 0;
        self.cursor = None;
        self.last_index = None;
    }

    /// Index into the sorted held notes for the next step.
    pub(crate) fn next_index(&mut self, len: usize) -> usize {
        debug_assert!(len > 0);
        let index = match self.settings.pattern {
            ArpPattern::Ascending => {
                let i = self.counter % len;
                self.counter = self.counter.wrapping_add(1);
                i
            }
            ArpPattern::Descending => {
                let i = len - 1 - self.counter % len;
                self.counter = self.counter.wrapping_add(1);
                i
            }
            ArpPattern::AlternatingBottom | ArpPattern::AlternatingTop => self.next_alternating(len),
            ArpPattern::Random => self.rng.gen_range(0..len),
            ArpPattern::RandomNonRepeating => {
                let last = self.last_index.filter(|&i| i < len);
                match last {
                    Some(last) if len > 1 => {
                        let i = self.rng.gen_range(0..len - 1);
                        if i >= last {
                            i + 1
                        } else {
                            i
                        }
                    }
                    _ => self.rng.gen_range(0..len),
                }
            }
        };
        self.last_index = Some(index);
        index
    }

    fn next_alternating(&mut self, len: usize) -> usize {
        if len == 1 {
            self.cursor = Some(0);
            return 0;
        }
        let current = match self.cursor {
            None => {
                self.ascending = self.settings.pattern == ArpPattern::AlternatingBottom;
                if self.ascending {
                    0
                } else {
                    len - 1
                }
            }
            Some(previous) => {
                // The chord may have shrunk since the last step.
                let previous = previous.min(len - 1);
                if self.ascending {
                    if previous + 1 < len {
                        previous + 1
                    } else {
                        self.ascending = false;
                        previous - 1
                    }
                } else if previous > 0 {
                    previous - 1
                } else {
                    self.ascending = true;
                    previous + 1
                }
            }
        };
        self.cursor = Some(current);
        current
    }

    /// Handles one metronome click.
    pub fn click(&mut self, position: u32) -> GeneratorOutput {
        let mut output = GeneratorOutput::default();
        if !self.settings.subdivision.matches(position) {
            return output;
        }

        if let Some(previous) = self.sounding.take() {
            output.offs.push(previous);
        }

        let min_notes = self.settings.min_notes.max(1);
        if self.held.len() >= min_notes {
            let notes: SmallVec<[u8; 16]> = self.held.iter().copied().collect();
            let index = self.next_index(notes.len());
            let note = notes[index];
            output.ons.push((note, self.velocity));
            self.sounding = Some(note);
        }
        output
    }

    /// Releases the sounding note, if any.
    pub fn silence(&mut self) -> GeneratorOutput {
        let mut output = GeneratorOutput::default();
        if let Some(note) = self.sounding.take() {
            output.offs.push(note);
        }
        output
    }
}

//! Step sequencer: plays a note grid relative to the held note.

use super::GeneratorOutput;
use crate::metronome::Subdivision;
use crate::setlist::Scale;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::sync::Arc;

/// What happens to a running sequence when the held note changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum NoteChangeBehavior {
    /// Keep stepping; the new note takes over when the sequence wraps.
    #[default]
    ContinueSequence,
    /// Jump back to step 0 on the new note.
    RestartSequence,
}

/// A grid of `rows x steps` cells. Each row is a semitone offset from the
/// held note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSequencerDefinition")]
pub struct SequencerDefinition {
    pub name: String,
    rows: Vec<i16>,
    steps: usize,
    grid: Vec<Vec<bool>>,
    pub quantize: Option<Scale>,
    pub note_change: NoteChangeBehavior,
}

/// Unchecked wire form of [`SequencerDefinition`].
#[derive(Deserialize)]
struct RawSequencerDefinition {
    name: String,
    rows: Vec<i16>,
    steps: usize,
    grid: Vec<Vec<bool>>,
    #[serde(default)]
    quantize: Option<Scale>,
    #[serde(default)]
    note_change: NoteChangeBehavior,
}

impl TryFrom<RawSequencerDefinition> for SequencerDefinition {
    type Error = Error;

    fn try_from(raw: RawSequencerDefinition) -> Result<Self> {
        let definition = Self {
            name: raw.name,
            rows: raw.rows,
            steps: raw.steps,
            grid: raw.grid,
            quantize: raw.quantize,
            note_change: raw.note_change,
        };
        definition.validate()?;
        Ok(definition)
    }
}

impl SequencerDefinition {
    pub fn new(name: impl Into<String>, rows: Vec<i16>, steps: usize) -> Result<Self> {
        let grid = vec![vec![false; steps]; rows.len()];
        let definition = Self {
            name: name.into(),
            rows,
            steps,
            grid,
            quantize: None,
            note_change: NoteChangeBehavior::default(),
        };
        definition.validate()?;
        Ok(definition)
    }

    /// Checks that the grid is non-empty and has one `steps`-long row per
    /// offset.
    pub fn validate(&self) -> Result<()> {
        if self.rows.is_empty() {
            return Err(Error::InvalidSequence(format!("'{}' has no rows", self.name)));
        }
        if self.steps == 0 {
            return Err(Error::InvalidSequence(format!("'{}' has no steps", self.name)));
        }
        if self.grid.len() != self.rows.len() || self.grid.iter().any(|r| r.len() != self.steps) {
            return Err(Error::InvalidSequence(format!(
                "'{}' grid is not {}x{}",
                self.name,
                self.rows.len(),
                self.steps
            )));
        }
        Ok(())
    }

    pub fn with_scale(mut self, scale: Scale) -> Self {
        self.quantize = Some(scale);
        self
    }

    pub fn with_note_change(mut self, behavior: NoteChangeBehavior) -> Self {
        self.note_change = behavior;
        self
    }

    /// Enables `(row, step)`. Chainable counterpart of [`set`](Self::set).
    pub fn with_cell(mut self, row: usize, step: usize) -> Result<Self> {
        self.set(row, step, true)?;
        Ok(self)
    }

    pub fn set(&mut self, row: usize, step: usize, on: bool) -> Result<()> {
        let steps = self.steps;
        let cell = self
            .grid
            .get_mut(row)
            .and_then(|r| r.get_mut(step))
            .ok_or_else(|| {
                Error::InvalidSequence(format!(
                    "cell ({row}, {step}) outside {}x{}",
                    self.rows.len(),
                    steps
                ))
            })?;
        *cell = on;
        Ok(())
    }

    pub fn is_set(&self, row: usize, step: usize) -> bool {
        self.grid
            .get(row)
            .and_then(|r| r.get(step))
            .copied()
            .unwrap_or(false)
    }

    pub fn rows(&self) -> &[i16] {
        &self.rows
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Notes sounding at `step` over `base`. Offsets that leave the MIDI
    /// range are skipped.
    pub fn notes_at(&self, step: usize, base: u8) -> SmallVec<[u8; 8]> {
        let mut notes = SmallVec::new();
        for (row, &offset) in self.rows.iter().enumerate() {
            if !self.is_set(row, step) {
                continue;
            }
            let note = base as i16 + offset;
            if !(0..=127).contains(&note) {
                continue;
            }
            let note = match self.quantize {
                Some(scale) => scale.quantize(note as u8),
                None => note as u8,
            };
            if !notes.contains(&note) {
                notes.push(note);
            }
        }
        notes
    }
}

/// Runtime state of one sequencer usage.
#[derive(Debug)]
pub struct Sequencer {
    definition: Arc<SequencerDefinition>,
    subdivision: Subdivision,
    /// Held notes in press order with their velocities.
    held: Vec<(u8, u8)>,
    base: Option<(u8, u8)>,
    step: usize,
    sounding: SmallVec<[u8; 8]>,
}

impl Sequencer {
    pub fn new(definition: Arc<SequencerDefinition>, subdivision: Subdivision) -> Self {
        Self {
            definition,
            subdivision,
            held: Vec::new(),
            base: None,
            step: 0,
            sounding: SmallVec::new(),
        }
    }

    /// Step that the next matching click plays.
    pub fn step(&self) -> usize {
        self.step
    }

    pub fn base_note(&self) -> Option<u8> {
        self.base.map(|(note, _)| note)
    }

    pub fn press(&mut self, note: u8, velocity: u8) {
        self.held.retain(|&(n, _)| n != note);
        self.held.push((note, velocity));
        if self.definition.note_change == NoteChangeBehavior::RestartSequence
            && self.base_note() != Some(note)
        {
            self.base = Some((note, velocity));
            self.step = 0;
        }
    }

    pub fn release(&mut self, note: u8) {
        self.held.retain(|&(n, _)| n != note);
    }

    pub fn release_all(&mut self) {
        self.held.clear();
    }

    pub fn click(&mut self, position: u32) -> GeneratorOutput {
        let mut output = GeneratorOutput::default();
        if !self.subdivision.matches(position) {
            return output;
        }
        output.offs.extend(self.sounding.drain(..));

        let Some(&current) = self.held.last() else {
            self.base = None;
            self.step = 0;
            return output;
        };

        match self.definition.note_change {
            NoteChangeBehavior::RestartSequence => {
                if self.base_note() != Some(current.0) {
                    self.base = Some(current);
                    self.step = 0;
                }
            }
            NoteChangeBehavior::ContinueSequence => {
                if self.step == 0 || self.base.is_none() {
                    self.base = Some(current);
                }
            }
        }

        if let Some((base, velocity)) = self.base {
            for note in self.definition.notes_at(self.step, base) {
                output.ons.push((note, velocity));
                self.sounding.push(note);
            }
        }
        self.step = (self.step + 1) % self.definition.steps();
        output
    }

    pub fn silence(&mut self) -> GeneratorOutput {
        GeneratorOutput {
            offs: self.sounding.drain(..).collect(),
            ons: SmallVec::new(),
        }
    }
}

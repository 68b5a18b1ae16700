//! Per-cue runtime state of usages that remember something between events.

use super::{PatchUsage, UsageId, UsageKind};
use crate::effect::EffectChain;
use crate::generator::{Arpeggiator, GeneratorOutput, Sequencer};
use std::collections::BTreeMap;

#[derive(Debug)]
pub(crate) enum UsageRuntime {
    Monophonic { sounding: Option<i16> },
    Arpeggiator(Arpeggiator),
    Sequencer(Sequencer),
}

#[derive(Debug)]
pub(crate) struct RuntimeEntry {
    pub(crate) state: UsageRuntime,
    pub(crate) effects: EffectChain,
    /// This usage started the metronome and is responsible for stopping it.
    pub(crate) started_metronome: bool,
}

impl RuntimeEntry {
    pub(crate) fn press(&mut self, note: u8, velocity: u8) {
        match &mut self.state {
            UsageRuntime::Arpeggiator(arp) => arp.press(note, velocity),
            UsageRuntime::Sequencer(seq) => seq.press(note, velocity),
            UsageRuntime::Monophonic { .. } => {}
        }
    }

    pub(crate) fn release(&mut self, note: u8, transposition: i16) {
        match &mut self.state {
            UsageRuntime::Arpeggiator(arp) => arp.release(note),
            UsageRuntime::Sequencer(seq) => seq.release(note),
            UsageRuntime::Monophonic { sounding } => {
                if *sounding == Some(note as i16 + transposition) {
                    *sounding = None;
                }
            }
        }
    }

    pub(crate) fn release_all(&mut self) {
        match &mut self.state {
            UsageRuntime::Arpeggiator(arp) => arp.release_all(),
            UsageRuntime::Sequencer(seq) => seq.release_all(),
            UsageRuntime::Monophonic { .. } => {}
        }
    }

    fn click(&mut self, position: u32) -> GeneratorOutput {
        match &mut self.state {
            UsageRuntime::Arpeggiator(arp) => arp.click(position),
            UsageRuntime::Sequencer(seq) => seq.click(position),
            UsageRuntime::Monophonic { .. } => GeneratorOutput::default(),
        }
    }

    pub(crate) fn silence(&mut self) -> GeneratorOutput {
        match &mut self.state {
            UsageRuntime::Arpeggiator(arp) => arp.silence(),
            UsageRuntime::Sequencer(seq) => seq.silence(),
            UsageRuntime::Monophonic { .. } => GeneratorOutput::default(),
        }
    }
}

/// Runtime entries of the current cue, keyed by usage.
#[derive(Debug, Default)]
pub(crate) struct RuntimeArena {
    entries: BTreeMap<UsageId, RuntimeEntry>,
}

impl RuntimeArena {
    /// Creates fresh state for `usage` if its kind needs any.
    pub(crate) fn prepare(&mut self, usage: &PatchUsage) {
        let state = match &usage.kind {
            UsageKind::Simple {
                monophonic: true, ..
            } => UsageRuntime::Monophonic { sounding: None },
            UsageKind::Arpeggiator(settings) => {
                UsageRuntime::Arpeggiator(Arpeggiator::new(*settings))
            }
            UsageKind::Sequencer {
                definition,
                subdivision,
            } => UsageRuntime::Sequencer(Sequencer::new(definition.clone(), *subdivision)),
            _ => return,
        };
        self.entries.insert(
            usage.id,
            RuntimeEntry {
                state,
                effects: usage.effects.clone(),
                started_metronome: false,
            },
        );
    }

    pub(crate) fn get_mut(&mut self, id: UsageId) -> Option<&mut RuntimeEntry> {
        self.entries.get_mut(&id)
    }

    pub(crate) fn get(&self, id: UsageId) -> Option<&RuntimeEntry> {
        self.entries.get(&id)
    }

    /// Removes every entry, in usage order.
    pub(crate) fn drain(&mut self) -> Vec<(UsageId, RuntimeEntry)> {
        std::mem::take(&mut self.entries).into_iter().collect()
    }

    /// Advances every generator by one click.
    pub(crate) fn click(&mut self, position: u32) -> Vec<(UsageId, GeneratorOutput)> {
        self.entries
            .iter_mut()
            .map(|(&id, entry)| (id, entry.click(position)))
            .filter(|(_, output)| !output.is_empty())
            .collect()
    }

    pub(crate) fn silence(&mut self) -> Vec<(UsageId, GeneratorOutput)> {
        self.entries
            .iter_mut()
            .map(|(&id, entry)| (id, entry.silence()))
            .filter(|(_, output)| !output.is_empty())
            .collect()
    }

    pub(crate) fn clear_held(&mut self) {
        for entry in self.entries.values_mut() {
            entry.release_all();
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

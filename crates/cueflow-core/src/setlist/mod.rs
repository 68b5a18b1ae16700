//! Setlist definitions: keyboards, synthesizers, songs and their cues.

mod cue;
mod keyboard;
mod patch;
mod scale;

pub use cue::{Cue, CueKey, Song, SongId};
pub use keyboard::Keyboard;
pub use patch::{Bank, Patch, SynthId, Synthesizer};
pub use scale::{Scale, ScaleKind};

use crate::assign::UsageKind;
use crate::control_map::{ControlMap, ControlTarget};
use crate::effect::EffectChain;
use crate::trigger::{Trigger, TriggerAction, TriggerPredicate};
use crate::{Error, Result};
use cueflow_midi::KeyboardId;
use std::collections::BTreeSet;
use tracing::warn;

/// Everything the engine performs from.
#[derive(Debug, Clone, Default)]
pub struct Setlist {
    pub keyboards: Vec<Keyboard>,
    pub synthesizers: Vec<Synthesizer>,
    pub songs: Vec<Song>,
    /// Kept sorted by song order, then measure.
    pub cues: Vec<Cue>,
    pub global_triggers: Vec<Trigger>,
    pub global_control_map: ControlMap,
    pub global_effects: EffectChain,
}

impl Setlist {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_keyboard(mut self, keyboard: Keyboard) -> Self {
        self.keyboards.push(keyboard);
        self
    }

    pub fn with_synthesizer(mut self, synth: Synthesizer) -> Self {
        self.synthesizers.push(synth);
        self
    }

    pub fn with_song(mut self, song: Song) -> Self {
        self.songs.push(song);
        self
    }

    /// Adds a cue, keeping cue order.
    pub fn with_cue(mut self, cue: Cue) -> Self {
        self.cues.push(cue);
        self.sort_cues();
        self
    }

    pub fn with_global_trigger(mut self, trigger: Trigger) -> Self {
        self.global_triggers.push(trigger);
        self
    }

    pub fn with_global_control_map(mut self, map: ControlMap) -> Self {
        self.global_control_map = map;
        self
    }

    pub fn with_global_effects(mut self, effects: EffectChain) -> Self {
        self.global_effects = effects;
        self
    }

    /// Orders cues by (song order, measure). Stable for equal keys.
    pub fn sort_cues(&mut self) {
        let orders: Vec<(SongId, u32)> = self.songs.iter().map(|s| (s.id, s.order)).collect();
        let order_of = |song: SongId| {
            orders
                .iter()
                .find(|(id, _)| *id == song)
                .map(|&(_, o)| o)
                .unwrap_or(u32::MAX)
        };
        self.cues.sort_by_key(|c| (order_of(c.song), c.measure));
    }

    /// The first keyboard sending on `channel`.
    pub fn keyboard_for_channel(&self, channel: u8) -> Option<&Keyboard> {
        self.keyboards.iter().find(|k| k.channel == channel)
    }

    pub fn synthesizer(&self, id: SynthId) -> Option<&Synthesizer> {
        self.synthesizers.iter().find(|s| s.id == id)
    }

    pub fn song(&self, id: SongId) -> Option<&Song> {
        self.songs.iter().find(|s| s.id == id)
    }

    /// Indices of the cues of `song`, in cue order.
    pub fn cues_of(&self, song: SongId) -> impl Iterator<Item = (usize, &Cue)> {
        self.cues
            .iter()
            .enumerate()
            .filter(move |(_, c)| c.song == song)
    }

    pub fn cue_index(&self, key: &CueKey) -> Option<usize> {
        self.cues.iter().position(|c| c.key() == *key)
    }

    /// The cue of `song` in effect at `measure`: the last cue starting at or
    /// before it, or the song's first cue.
    pub fn locate(&self, song: SongId, measure: u32) -> Option<usize> {
        let mut first = None;
        let mut best = None;
        for (index, cue) in self.cues_of(song) {
            first.get_or_insert(index);
            if cue.measure <= measure {
                best = Some(index);
            }
        }
        best.or(first)
    }

    fn check_keyboard(&self, keyboard: KeyboardId, context: impl FnOnce() -> String) -> Result<()> {
        if self.keyboards.iter().any(|k| k.id == keyboard) {
            Ok(())
        } else {
            Err(Error::UnknownKeyboard {
                keyboard,
                context: context(),
            })
        }
    }

    /// Checks references between definitions.
    pub fn validate(&self) -> Result<()> {
        let mut usage_ids = BTreeSet::new();
        for cue in &self.cues {
            if self.song(cue.song).is_none() {
                return Err(Error::UnknownSong(cue.song));
            }
            for usage in cue.patch_usages() {
                if !usage_ids.insert(usage.id) {
                    return Err(Error::DuplicateUsageId(usage.id));
                }
                if self.synthesizer(usage.patch.synth).is_none() {
                    return Err(Error::UnknownSynthesizer {
                        synth: usage.patch.synth,
                        usage: usage.id,
                    });
                }
                self.check_keyboard(usage.range.keyboard, || usage.id.to_string())?;
                if let UsageKind::Sequencer { definition, .. } = &usage.kind {
                    definition.validate()?;
                }
            }
            for node in &cue.assignments {
                self.check_keyboard(node.range().keyboard, || format!("cue '{}'", cue.name))?;
            }
            for trigger in &cue.triggers {
                self.validate_trigger(trigger)?;
            }
        }
        for trigger in &self.global_triggers {
            self.validate_trigger(trigger)?;
        }

        let maps = self
            .cues
            .iter()
            .filter_map(|c| c.control_map.as_ref())
            .chain(std::iter::once(&self.global_control_map));
        for map in maps {
            for entry in &map.entries {
                if entry.source > 127 || entry.destinations.iter().any(|&d| d > 127) {
                    return Err(Error::InvalidConfig(format!(
                        "control map entry for CC{} uses a controller above 127",
                        entry.source
                    )));
                }
                for target in &entry.targets {
                    if let ControlTarget::Usage(id) = target {
                        if !usage_ids.contains(id) {
                            warn!("Control map for CC{} targets unknown {}", entry.source, id);
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn validate_trigger(&self, trigger: &Trigger) -> Result<()> {
        for predicate in &trigger.predicates {
            let keyboard = match predicate {
                TriggerPredicate::NoteOn(range) | TriggerPredicate::NoteOff(range) => {
                    range.keyboard
                }
                TriggerPredicate::Chord { keyboard, .. }
                | TriggerPredicate::Control { keyboard, .. } => *keyboard,
            };
            self.check_keyboard(keyboard, || "trigger".to_string())?;
        }
        for action in &trigger.actions {
            if let TriggerAction::GoTo { song, .. } = action {
                if self.song(*song).is_none() {
                    return Err(Error::UnknownSong(*song));
                }
            }
        }
        Ok(())
    }
}

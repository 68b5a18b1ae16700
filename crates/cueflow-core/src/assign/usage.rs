//! Patch usages: one patch bound to a key range with a play behavior.

use super::UsageId;
use crate::effect::{Effect, EffectChain};
use crate::generator::{ArpeggiatorSettings, SequencerDefinition};
use crate::metronome::Subdivision;
use crate::setlist::{Patch, Scale};
use cueflow_midi::NoteRange;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Per-pitch-class note offsets. Pitch classes without an entry are silent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScaleMap {
    offsets: [Option<i8>; 12],
}

impl ScaleMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every pitch class snaps down onto `scale`.
    pub fn snap_to(scale: Scale) -> Self {
        let mut map = Self::new();
        for pc in 0..12u8 {
            map.offsets[pc as usize] = Some(scale.offset_for(pc));
        }
        map
    }

    /// Only the pitch classes of `scale` sound, unchanged.
    pub fn only(scale: Scale) -> Self {
        let mut map = Self::new();
        for pc in 0..12u8 {
            if scale.contains(pc) {
                map.offsets[pc as usize] = Some(0);
            }
        }
        map
    }

    pub fn with(mut self, pitch_class: u8, offset: i8) -> Self {
        self.set(pitch_class, Some(offset));
        self
    }

    pub fn set(&mut self, pitch_class: u8, offset: Option<i8>) {
        self.offsets[(pitch_class % 12) as usize] = offset;
    }

    pub fn offset(&self, note: u8) -> Option<i8> {
        self.offsets[(note % 12) as usize]
    }
}

/// Play behavior of a [`PatchUsage`].
#[derive(Debug, Clone)]
pub enum UsageKind {
    Simple {
        transposition: i16,
        monophonic: bool,
    },
    /// Each mapped trigger note sounds its slave notes instead of itself.
    GhostNotes(BTreeMap<u8, Vec<u8>>),
    CustomScale(ScaleMap),
    Arpeggiator(ArpeggiatorSettings),
    Sequencer {
        definition: Arc<SequencerDefinition>,
        subdivision: Subdivision,
    },
}

impl UsageKind {
    pub fn is_generator(&self) -> bool {
        matches!(self, UsageKind::Arpeggiator(_) | UsageKind::Sequencer { .. })
    }
}

/// A patch bound to a key range. Leaves of the assignment tree.
#[derive(Debug, Clone)]
pub struct PatchUsage {
    pub id: UsageId,
    pub patch: Patch,
    pub range: NoteRange,
    pub volume: u8,
    pub effects: EffectChain,
    /// Controller values sent each time the usage becomes active.
    pub initial_controls: Vec<(u8, u8)>,
    pub kind: UsageKind,
}

impl PatchUsage {
    pub fn new(id: UsageId, patch: Patch, range: NoteRange, kind: UsageKind) -> Self {
        let volume = patch.default_volume;
        Self {
            id,
            patch,
            range,
            volume,
            effects: EffectChain::new(),
            initial_controls: Vec::new(),
            kind,
        }
    }

    pub fn simple(id: UsageId, patch: Patch, range: NoteRange) -> Self {
        Self::new(
            id,
            patch,
            range,
            UsageKind::Simple {
                transposition: 0,
                monophonic: false,
            },
        )
    }

    pub fn ghost_notes(
        id: UsageId,
        patch: Patch,
        range: NoteRange,
        map: BTreeMap<u8, Vec<u8>>,
    ) -> Self {
        Self::new(id, patch, range, UsageKind::GhostNotes(map))
    }

    pub fn custom_scale(id: UsageId, patch: Patch, range: NoteRange, map: ScaleMap) -> Self {
        Self::new(id, patch, range, UsageKind::CustomScale(map))
    }

    pub fn arpeggiator(
        id: UsageId,
        patch: Patch,
        range: NoteRange,
        settings: ArpeggiatorSettings,
    ) -> Self {
        Self::new(id, patch, range, UsageKind::Arpeggiator(settings))
    }

    pub fn sequencer(
        id: UsageId,
        patch: Patch,
        range: NoteRange,
        definition: Arc<SequencerDefinition>,
        subdivision: Subdivision,
    ) -> Self {
        Self::new(
            id,
            patch,
            range,
            UsageKind::Sequencer {
                definition,
                subdivision,
            },
        )
    }

    pub fn with_volume(mut self, volume: u8) -> Self {
        self.volume = volume.min(127);
        self
    }

    pub fn with_effect(mut self, effect: impl Effect + 'static) -> Self {
        self.effects.push(Arc::new(effect));
        self
    }

    pub fn with_initial_control(mut self, control: u8, value: u8) -> Self {
        self.initial_controls.push((control, value));
        self
    }

    /// Only meaningful for [`UsageKind::Simple`].
    pub fn with_transposition(mut self, semitones: i16) -> Self {
        if let UsageKind::Simple { transposition, .. } = &mut self.kind {
            *transposition = semitones;
        }
        self
    }

    /// Only meaningful for [`UsageKind::Simple`].
    pub fn monophonic(mut self) -> Self {
        if let UsageKind::Simple { monophonic, .. } = &mut self.kind {
            *monophonic = true;
        }
        self
    }

    /// The variant's own condition, on top of the range check.
    pub fn accepts(&self, note: u8) -> bool {
        match &self.kind {
            UsageKind::GhostNotes(map) => map.contains_key(&note),
            UsageKind::CustomScale(map) => map.offset(note).is_some(),
            _ => true,
        }
    }
}

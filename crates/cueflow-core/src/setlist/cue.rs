use crate::assign::{AssignmentNode, PatchMerge, PatchUsage};
use crate::control_map::ControlMap;
use crate::effect::{Effect, EffectChain};
use crate::trigger::Trigger;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SongId(pub u32);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Song {
    pub id: SongId,
    /// Position of the song in the set.
    pub order: u32,
    pub name: String,
}

impl Song {
    pub fn new(id: SongId, order: u32, name: impl Into<String>) -> Self {
        Self {
            id,
            order,
            name: name.into(),
        }
    }
}

/// Identifies a cue by where it sits in the music.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CueKey {
    pub song: SongId,
    pub measure: u32,
}

impl fmt::Display for CueKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "song {} measure {}", self.song.0, self.measure)
    }
}

/// One point in the performance and the sounds that go with it.
#[derive(Debug, Clone)]
pub struct Cue {
    pub song: SongId,
    pub measure: u32,
    pub name: String,
    pub assignments: Vec<AssignmentNode>,
    pub triggers: Vec<Trigger>,
    pub control_map: Option<ControlMap>,
    pub effects: EffectChain,
    pub disable_global_effects: bool,
    pub disable_global_triggers: bool,
    pub disable_global_control_map: bool,
}

impl Cue {
    pub fn new(song: SongId, measure: u32, name: impl Into<String>) -> Self {
        Self {
            song,
            measure,
            name: name.into(),
            assignments: Vec::new(),
            triggers: Vec::new(),
            control_map: None,
            effects: EffectChain::new(),
            disable_global_effects: false,
            disable_global_triggers: false,
            disable_global_control_map: false,
        }
    }

    pub fn key(&self) -> CueKey {
        CueKey {
            song: self.song,
            measure: self.measure,
        }
    }

    pub fn with_usage(mut self, usage: PatchUsage) -> Self {
        self.assignments.push(AssignmentNode::Usage(usage));
        self
    }

    pub fn with_merge(mut self, merge: PatchMerge) -> Self {
        self.assignments.push(AssignmentNode::Merge(merge));
        self
    }

    pub fn with_trigger(mut self, trigger: Trigger) -> Self {
        self.triggers.push(trigger);
        self
    }

    pub fn with_control_map(mut self, map: ControlMap) -> Self {
        self.control_map = Some(map);
        self
    }

    pub fn with_effect(mut self, effect: impl Effect + 'static) -> Self {
        self.effects.push(Arc::new(effect));
        self
    }

    pub fn without_global_effects(mut self) -> Self {
        self.disable_global_effects = true;
        self
    }

    pub fn without_global_triggers(mut self) -> Self {
        self.disable_global_triggers = true;
        self
    }

    pub fn without_global_control_map(mut self) -> Self {
        self.disable_global_control_map = true;
        self
    }

    /// Every patch usage reachable from this cue, depth first.
    pub fn patch_usages(&self) -> Vec<&PatchUsage> {
        let mut out = Vec::new();
        for node in &self.assignments {
            node.collect_leaves(&mut out);
        }
        out
    }
}

//! The patch assignment tree.
//!
//! A cue's assignments are a forest of [`AssignmentNode`]s: leaves are
//! [`PatchUsage`]s, branches are [`PatchMerge`]s. Note-ons walk the tree and
//! collect [`Response`]s; the engine turns those into channel messages.

mod merge;
pub(crate) mod runtime;
mod usage;

pub use merge::PatchMerge;
pub use usage::{PatchUsage, ScaleMap, UsageKind};

use crate::metronome::Metronome;
use cueflow_midi::{cc, KeyboardId, NoteRange};
use runtime::{RuntimeArena, UsageRuntime};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;
use tracing::debug;

/// Stable identity of a patch usage, unique across the setlist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UsageId(pub u32);

impl fmt::Display for UsageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "usage#{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub enum AssignmentNode {
    Usage(PatchUsage),
    Merge(PatchMerge),
}

impl From<PatchUsage> for AssignmentNode {
    fn from(usage: PatchUsage) -> Self {
        AssignmentNode::Usage(usage)
    }
}

impl From<PatchMerge> for AssignmentNode {
    fn from(merge: PatchMerge) -> Self {
        AssignmentNode::Merge(merge)
    }
}

/// Notes one usage wants sounded for a key press. Note numbers are not yet
/// range checked; transposition may push them outside 0-127.
#[derive(Debug)]
pub struct Response<'a> {
    pub usage: &'a PatchUsage,
    /// `(note, velocity)` before effects.
    pub notes: SmallVec<[(i16, u8); 4]>,
    /// Monophonic usages release their previous note first.
    pub release_first: Option<i16>,
}

impl<'a> Response<'a> {
    fn new(usage: &'a PatchUsage) -> Self {
        Self {
            usage,
            notes: SmallVec::new(),
            release_first: None,
        }
    }
}

pub(crate) struct ReceiveContext<'r> {
    pub(crate) runtime: &'r mut RuntimeArena,
    pub(crate) metronome: &'r dyn Metronome,
}

impl AssignmentNode {
    pub fn range(&self) -> &NoteRange {
        match self {
            AssignmentNode::Usage(usage) => &usage.range,
            AssignmentNode::Merge(merge) => &merge.range,
        }
    }

    pub fn responds_to(&self, keyboard: KeyboardId, note: u8) -> bool {
        if !self.range().covers(keyboard, note) {
            return false;
        }
        match self {
            AssignmentNode::Usage(usage) => usage.accepts(note),
            AssignmentNode::Merge(merge) => {
                merge.children.iter().any(|c| c.responds_to(keyboard, note))
            }
        }
    }

    /// Leaf usages, depth first.
    pub fn leaves(&self) -> Vec<&PatchUsage> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    pub(crate) fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a PatchUsage>) {
        match self {
            AssignmentNode::Usage(usage) => out.push(usage),
            AssignmentNode::Merge(merge) => {
                for child in &merge.children {
                    child.collect_leaves(out);
                }
            }
        }
    }

    /// Collects responses for a note this node responds to.
    pub(crate) fn receive<'a>(
        &'a self,
        keyboard: KeyboardId,
        note: u8,
        velocity: u8,
        ctx: &mut ReceiveContext<'_>,
        out: &mut Vec<Response<'a>>,
    ) {
        match self {
            AssignmentNode::Usage(usage) => receive_usage(usage, note, velocity, ctx, out),
            AssignmentNode::Merge(merge) => {
                for child in &merge.children {
                    if child.responds_to(keyboard, note) {
                        child.receive(keyboard, note, velocity, ctx, out);
                    }
                }
            }
        }
    }

    pub(crate) fn note_released(&self, keyboard: KeyboardId, note: u8, runtime: &mut RuntimeArena) {
        match self {
            AssignmentNode::Usage(usage) => {
                if usage.range.keyboard != keyboard {
                    return;
                }
                let transposition = match usage.kind {
                    UsageKind::Simple { transposition, .. } => transposition,
                    _ => 0,
                };
                if let Some(entry) = runtime.get_mut(usage.id) {
                    entry.release(note, transposition);
                }
            }
            AssignmentNode::Merge(merge) => {
                for child in &merge.children {
                    child.note_released(keyboard, note, runtime);
                }
            }
        }
    }

    pub(crate) fn control_changed(
        &self,
        keyboard: KeyboardId,
        control: u8,
        value: u8,
        runtime: &mut RuntimeArena,
    ) {
        match self {
            AssignmentNode::Usage(usage) => {
                if usage.range.keyboard != keyboard {
                    return;
                }
                if control == cc::ALL_NOTES_OFF || control == cc::ALL_SOUND_OFF {
                    if let Some(entry) = runtime.get_mut(usage.id) {
                        entry.release_all();
                    }
                }
            }
            AssignmentNode::Merge(merge) => {
                for child in &merge.children {
                    child.control_changed(keyboard, control, value, runtime);
                }
            }
        }
    }
}

fn receive_usage<'a>(
    usage: &'a PatchUsage,
    note: u8,
    velocity: u8,
    ctx: &mut ReceiveContext<'_>,
    out: &mut Vec<Response<'a>>,
) {
    let mut response = Response::new(usage);
    match &usage.kind {
        UsageKind::Simple {
            transposition,
            monophonic,
        } => {
            let sounded = note as i16 + transposition;
            response.notes.push((sounded, velocity));
            if *monophonic {
                if let Some(entry) = ctx.runtime.get_mut(usage.id) {
                    if let UsageRuntime::Monophonic { sounding } = &mut entry.state {
                        response.release_first = sounding.replace(sounded);
                    }
                }
            }
        }
        UsageKind::GhostNotes(map) => {
            if let Some(slaves) = map.get(&note) {
                response
                    .notes
                    .extend(slaves.iter().map(|&n| (n as i16, velocity)));
            }
        }
        UsageKind::CustomScale(map) => {
            if let Some(offset) = map.offset(note) {
                response.notes.push((note as i16 + offset as i16, velocity));
            }
        }
        UsageKind::Arpeggiator(_) | UsageKind::Sequencer { .. } => {
            match ctx.runtime.get_mut(usage.id) {
                Some(entry) => {
                    entry.press(note, velocity);
                    if !ctx.metronome.is_running() {
                        ctx.metronome.start();
                        entry.started_metronome = true;
                    }
                }
                None => debug!("{} has no runtime state", usage.id),
            }
            return;
        }
    }
    out.push(response);
}

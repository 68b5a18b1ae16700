//! Control-change routing.
//!
//! Incoming controllers go to the first tier that claims them: the sustain
//! rule, the cue's control map, the global control map, and finally every
//! assigned channel.

use crate::allocator::Assignments;
use crate::assign::UsageId;
use crate::config::SustainRouting;
use cueflow_midi::{cc, CHANNEL_COUNT};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ControlTarget {
    /// Every currently assigned channel.
    All,
    Usage(UsageId),
}

/// One source controller fanned out to destination controllers on targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlMapEntry {
    pub source: u8,
    pub destinations: Vec<u8>,
    pub targets: Vec<ControlTarget>,
}

impl ControlMapEntry {
    pub fn new(source: u8) -> Self {
        Self {
            source,
            destinations: Vec::new(),
            targets: Vec::new(),
        }
    }

    pub fn to_control(mut self, control: u8) -> Self {
        self.destinations.push(control);
        self
    }

    pub fn on(mut self, target: ControlTarget) -> Self {
        self.targets.push(target);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlMap {
    pub entries: Vec<ControlMapEntry>,
}

impl ControlMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, entry: ControlMapEntry) -> Self {
        self.entries.push(entry);
        self
    }

    /// First entry for `source`.
    pub fn find(&self, source: u8) -> Option<&ControlMapEntry> {
        self.entries.iter().find(|e| e.source == source)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteTier {
    Sustain,
    Cue,
    Global,
    Broadcast,
}

/// Where one incoming controller goes. Every send carries the incoming value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlRoute {
    pub tier: RouteTier,
    /// `(channel, controller)`
    pub sends: Vec<(u8, u8)>,
}

pub fn route_control(
    control: u8,
    cue_map: Option<&ControlMap>,
    global_map: Option<&ControlMap>,
    assignments: &Assignments,
    sustain: SustainRouting,
) -> ControlRoute {
    if control == cc::SUSTAIN && sustain == SustainRouting::AllChannels {
        return ControlRoute {
            tier: RouteTier::Sustain,
            sends: (0..CHANNEL_COUNT).map(|ch| (ch, control)).collect(),
        };
    }

    let tiers = [(RouteTier::Cue, cue_map), (RouteTier::Global, global_map)];
    for (tier, map) in tiers {
        if let Some(entry) = map.and_then(|m| m.find(control)) {
            return ControlRoute {
                tier,
                sends: expand_entry(entry, assignments),
            };
        }
    }

    ControlRoute {
        tier: RouteTier::Broadcast,
        sends: assignments.channels().into_iter().map(|ch| (ch, control)).collect(),
    }
}

fn expand_entry(entry: &ControlMapEntry, assignments: &Assignments) -> Vec<(u8, u8)> {
    let mut channels = BTreeSet::new();
    for target in &entry.targets {
        match *target {
            ControlTarget::All => channels.extend(assignments.channels()),
            ControlTarget::Usage(id) => match assignments.channel(id) {
                Some(ch) => {
                    channels.insert(ch);
                }
                None => warn!(
                    "Missing patch-usage response target {} for CC{}",
                    id, entry.source
                ),
            },
        }
    }

    let mut sends = Vec::with_capacity(channels.len() * entry.destinations.len());
    for &ch in &channels {
        for &dest in &entry.destinations {
            sends.push((ch, dest));
        }
    }
    sends
}

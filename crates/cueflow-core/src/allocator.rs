//! Channel allocation across cue transitions.
//!
//! A usage whose patch is already loaded on a channel keeps that channel, so
//! held notes ring through the change and no program change is sent. Every
//! other usage draws a channel from its synthesizer's pool.

use crate::assign::{PatchUsage, UsageId};
use crate::setlist::{Patch, SynthId, Synthesizer};
use std::collections::BTreeSet;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub usage: UsageId,
    pub patch: Patch,
    pub channel: u8,
}

/// Channels held by the usages of the current cue, in allocation order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Assignments {
    entries: Vec<Assignment>,
}

impl Assignments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces any earlier assignment of `usage`.
    pub fn insert(&mut self, usage: UsageId, patch: Patch, channel: u8) {
        self.entries.retain(|a| a.usage != usage);
        self.entries.push(Assignment {
            usage,
            patch,
            channel,
        });
    }

    pub fn channel(&self, usage: UsageId) -> Option<u8> {
        self.entries
            .iter()
            .find(|a| a.usage == usage)
            .map(|a| a.channel)
    }

    /// Distinct assigned channels, ascending.
    pub fn channels(&self) -> BTreeSet<u8> {
        self.entries.iter().map(|a| a.channel).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Assignment> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocationFailure {
    PoolExhausted { synth: SynthId },
    UnknownSynthesizer { synth: SynthId },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Allocation {
    pub assignments: Assignments,
    /// Kept their channel; no program change needed.
    pub reused: Vec<UsageId>,
    /// Got a new channel; need a program change and volume.
    pub fresh: Vec<UsageId>,
    pub unassigned: Vec<(UsageId, AllocationFailure)>,
}

/// Assigns channels for `next` given the assignments of the cue being left.
///
/// Each previous assignment, in order, hands its channel to the first
/// not-yet-matched usage in `next` with an equal patch. The rest draw from
/// their synthesizer's pool, skipping channels already claimed; channels
/// still sounding a previous, unrelated patch are tried last.
pub fn allocate(
    previous: &Assignments,
    next: &[&PatchUsage],
    synthesizers: &[Synthesizer],
) -> Allocation {
    let mut allocation = Allocation::default();
    let mut claimed = BTreeSet::new();
    let mut matched = vec![false; next.len()];

    for old in previous.iter() {
        if claimed.contains(&old.channel) {
            continue;
        }
        let candidate = next
            .iter()
            .enumerate()
            .find(|(i, usage)| !matched[*i] && usage.patch == old.patch);
        if let Some((i, usage)) = candidate {
            matched[i] = true;
            claimed.insert(old.channel);
            allocation
                .assignments
                .insert(usage.id, usage.patch.clone(), old.channel);
            allocation.reused.push(usage.id);
            debug!("{} keeps channel {} for {}", usage.id, old.channel, usage.patch);
        }
    }

    let busy: BTreeSet<u8> = previous
        .iter()
        .map(|a| a.channel)
        .filter(|ch| !claimed.contains(ch))
        .collect();

    for (i, usage) in next.iter().enumerate() {
        if matched[i] {
            continue;
        }
        let Some(synth) = synthesizers.iter().find(|s| s.id == usage.patch.synth) else {
            warn!("{} refers to unknown synthesizer {:?}", usage.id, usage.patch.synth);
            allocation.unassigned.push((
                usage.id,
                AllocationFailure::UnknownSynthesizer {
                    synth: usage.patch.synth,
                },
            ));
            continue;
        };

        let free = synth
            .channels
            .iter()
            .copied()
            .filter(|ch| !claimed.contains(ch));
        let channel = free
            .clone()
            .find(|ch| !busy.contains(ch))
            .or_else(|| free.clone().next());

        match channel {
            Some(channel) => {
                claimed.insert(channel);
                allocation
                    .assignments
                    .insert(usage.id, usage.patch.clone(), channel);
                allocation.fresh.push(usage.id);
                debug!("{} takes channel {} for {}", usage.id, channel, usage.patch);
            }
            None => {
                warn!(
                    "Channel pool of {} exhausted; {} ({}) stays silent",
                    synth.name, usage.id, usage.patch
                );
                allocation
                    .unassigned
                    .push((usage.id, AllocationFailure::PoolExhausted { synth: synth.id }));
            }
        }
    }

    allocation
}

//! Triggers: input patterns that fire navigation and transport actions.

use crate::setlist::SongId;
use cueflow_midi::{KeyboardId, NoteRange};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueMatch {
    Exact(u8),
    /// Inclusive.
    Range { lower: u8, upper: u8 },
}

impl ValueMatch {
    pub fn matches(&self, value: u8) -> bool {
        match *self {
            ValueMatch::Exact(v) => v == value,
            ValueMatch::Range { lower, upper } => lower <= value && value <= upper,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TriggerPredicate {
    NoteOn(NoteRange),
    NoteOff(NoteRange),
    /// The keyboard's held notes equal `notes` exactly.
    Chord {
        keyboard: KeyboardId,
        notes: BTreeSet<u8>,
    },
    Control {
        keyboard: KeyboardId,
        control: u8,
        value: ValueMatch,
    },
}

/// An input event as seen by triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerInput {
    NoteOn { keyboard: KeyboardId, note: u8 },
    NoteOff { keyboard: KeyboardId, note: u8 },
    Control { keyboard: KeyboardId, control: u8, value: u8 },
}

impl TriggerInput {
    pub fn keyboard(&self) -> KeyboardId {
        match *self {
            TriggerInput::NoteOn { keyboard, .. }
            | TriggerInput::NoteOff { keyboard, .. }
            | TriggerInput::Control { keyboard, .. } => keyboard,
        }
    }
}

impl TriggerPredicate {
    /// `held` is the set of notes currently down on the event's keyboard,
    /// including the event itself.
    pub fn matches(&self, input: &TriggerInput, held: &BTreeSet<u8>) -> bool {
        match (self, *input) {
            (TriggerPredicate::NoteOn(range), TriggerInput::NoteOn { keyboard, note }) => {
                range.covers(keyboard, note)
            }
            (TriggerPredicate::NoteOff(range), TriggerInput::NoteOff { keyboard, note }) => {
                range.covers(keyboard, note)
            }
            (
                TriggerPredicate::Chord { keyboard, notes },
                TriggerInput::NoteOn { keyboard: kb, .. },
            ) => *keyboard == kb && held == notes,
            (
                TriggerPredicate::Control {
                    keyboard,
                    control,
                    value,
                },
                TriggerInput::Control {
                    keyboard: kb,
                    control: c,
                    value: v,
                },
            ) => *keyboard == kb && *control == c && value.matches(v),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Combination {
    /// Any predicate fires the trigger.
    #[default]
    Any,
    /// Every predicate has matched at some point since the last firing.
    All,
    /// Every predicate has matched, in declaration order.
    AllInSequence,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum WaitTime {
    Millis(u64),
    Beats(f64),
}

impl WaitTime {
    pub fn duration(&self, bpm: f64) -> Duration {
        match *self {
            WaitTime::Millis(ms) => Duration::from_millis(ms),
            WaitTime::Beats(beats) if bpm > 0.0 && beats > 0.0 => {
                Duration::from_secs_f64(beats * 60.0 / bpm)
            }
            WaitTime::Beats(_) => Duration::ZERO,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MetronomeAction {
    Start,
    Stop,
    SetBpm(f64),
    TapTempo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TriggerAction {
    Advance,
    Reverse,
    GoTo { song: SongId, measure: u32 },
    /// Blocks the input thread; later actions run after the wait.
    Wait(WaitTime),
    Panic,
    Metronome(MetronomeAction),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trigger {
    pub predicates: Vec<TriggerPredicate>,
    pub combination: Combination,
    pub actions: Vec<TriggerAction>,
    /// Minimum time between two firings.
    pub safety_delay: Duration,
}

impl Trigger {
    pub fn new(combination: Combination) -> Self {
        Self {
            predicates: Vec::new(),
            combination,
            actions: Vec::new(),
            safety_delay: Duration::ZERO,
        }
    }

    pub fn when(mut self, predicate: TriggerPredicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn then(mut self, action: TriggerAction) -> Self {
        self.actions.push(action);
        self
    }

    pub fn with_safety_delay(mut self, delay: Duration) -> Self {
        self.safety_delay = delay;
        self
    }
}

/// A trigger with its matching progress for the current cue.
#[derive(Debug, Clone)]
pub struct ActiveTrigger {
    trigger: Trigger,
    satisfied: Vec<bool>,
    next: usize,
    last_fired: Option<Instant>,
}

impl ActiveTrigger {
    pub fn new(trigger: Trigger) -> Self {
        let satisfied = vec![false; trigger.predicates.len()];
        Self {
            trigger,
            satisfied,
            next: 0,
            last_fired: None,
        }
    }

    pub fn trigger(&self) -> &Trigger {
        &self.trigger
    }

    pub fn reset(&mut self) {
        self.satisfied.iter_mut().for_each(|s| *s = false);
        self.next = 0;
    }

    /// Feeds one input event. Returns true when the trigger fires.
    pub fn evaluate(&mut self, input: &TriggerInput, held: &BTreeSet<u8>, now: Instant) -> bool {
        if self.trigger.predicates.is_empty() {
            return false;
        }

        let complete = match self.trigger.combination {
            Combination::Any => self
                .trigger
                .predicates
                .iter()
                .any(|p| p.matches(input, held)),
            Combination::All => {
                for (i, predicate) in self.trigger.predicates.iter().enumerate() {
                    if predicate.matches(input, held) {
                        self.satisfied[i] = true;
                    }
                }
                self.satisfied.iter().all(|&s| s)
            }
            Combination::AllInSequence => {
                if self.trigger.predicates[self.next].matches(input, held) {
                    self.next += 1;
                }
                self.next == self.trigger.predicates.len()
            }
        };

        if !complete {
            return false;
        }
        self.reset();

        if let Some(last) = self.last_fired {
            if now.saturating_duration_since(last) < self.trigger.safety_delay {
                return false;
            }
        }
        self.last_fired = Some(now);
        true
    }
}

//! Engine session state and cue transitions.

use crate::allocator::{allocate, AllocationFailure, Assignments};
use crate::assign::runtime::RuntimeArena;
use crate::assign::UsageId;
use crate::config::EngineConfig;
use crate::effect::EffectChain;
use crate::generator::GeneratorOutput;
use crate::metronome::Metronome;
use crate::notify::{PerformanceEvent, PerformanceNotifier};
use crate::patch_change::PatchChanger;
use crate::setlist::{Cue, CueKey, Setlist, SongId};
use crate::trigger::ActiveTrigger;
use crate::{Error, Result};
use cueflow_midi::{cc, KeyboardId, MidiSink, CHANNEL_COUNT};
use smallvec::SmallVec;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Where the performer is in the setlist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Position {
    /// No cue has been entered yet.
    #[default]
    Uninitialized,
    Active(usize),
    /// Terminal.
    ShutDown,
}

impl Position {
    pub fn index(self) -> Option<usize> {
        match self {
            Position::Active(index) => Some(index),
            _ => None,
        }
    }
}

/// Send boundary: invalid messages are logged and dropped here.
pub(crate) struct Output {
    sink: Arc<dyn MidiSink>,
}

impl Output {
    pub(crate) fn new(sink: Arc<dyn MidiSink>) -> Self {
        Self { sink }
    }

    pub(crate) fn sink(&self) -> &dyn MidiSink {
        self.sink.as_ref()
    }

    fn check(result: cueflow_midi::Result<()>, what: &str) -> bool {
        match result {
            Ok(()) => true,
            Err(e) => {
                warn!("Dropped {}: {}", what, e);
                false
            }
        }
    }

    /// Returns whether the note went out.
    pub(crate) fn note_on(&self, channel: u8, note: i16, velocity: u8) -> bool {
        Self::check(
            self.sink.send_note_on(channel, note as i32, velocity as i32),
            "note-on",
        )
    }

    pub(crate) fn note_off(&self, channel: u8, note: i16) {
        Self::check(self.sink.send_note_off(channel, note as i32), "note-off");
    }

    pub(crate) fn control_change(&self, channel: u8, control: u8, value: u8) {
        Self::check(
            self.sink.send_control_change(channel, control, value),
            "control change",
        );
    }

    /// Last resort when a note-off cannot be addressed.
    pub(crate) fn all_notes_off(&self) {
        for channel in 0..CHANNEL_COUNT {
            self.control_change(channel, cc::ALL_NOTES_OFF, 0);
        }
    }
}

/// Mutable state of the current performance.
#[derive(Default)]
pub(crate) struct Session {
    pub(crate) assignments: Assignments,
    /// Output notes sounded for each held input key.
    pub(crate) tracking: HashMap<(KeyboardId, u8), SmallVec<[(u8, u8); 4]>>,
    pub(crate) runtime: RuntimeArena,
    /// Triggers of the current cue.
    pub(crate) triggers: Vec<ActiveTrigger>,
    pub(crate) effects: EffectChain,
    /// Input keys currently down, for chord triggers.
    pub(crate) held: HashMap<KeyboardId, BTreeSet<u8>>,
}

pub(crate) struct EngineState {
    pub(crate) setlist: Setlist,
    pub(crate) config: EngineConfig,
    pub(crate) position: Position,
    /// Re-resolve the next transition even if the index does not change.
    pub(crate) force_reload: bool,
    pub(crate) session: Session,
    /// Setlist-wide triggers. They outlive cue changes so their safety delay
    /// spans the transition they cause.
    pub(crate) global_triggers: Vec<ActiveTrigger>,
    pub(crate) output: Output,
    pub(crate) metronome: Arc<dyn Metronome>,
    pub(crate) patch_changer: Arc<dyn PatchChanger>,
    pub(crate) notifier: Arc<dyn PerformanceNotifier>,
}

pub(crate) fn global_triggers(setlist: &Setlist) -> Vec<ActiveTrigger> {
    setlist
        .global_triggers
        .iter()
        .cloned()
        .map(ActiveTrigger::new)
        .collect()
}

impl EngineState {
    pub(crate) fn current_cue(&self) -> Option<&Cue> {
        self.position.index().and_then(|i| self.setlist.cues.get(i))
    }

    fn ensure_running(&self) -> Result<()> {
        if self.position == Position::ShutDown {
            return Err(Error::ShutDown);
        }
        Ok(())
    }

    pub(crate) fn go_to(&mut self, index: usize) -> Result<()> {
        self.ensure_running()?;
        let len = self.setlist.cues.len();
        if index >= len {
            return Err(Error::CueOutOfRange { index, len });
        }
        self.apply_transition(index);
        Ok(())
    }

    pub(crate) fn go_to_cue(&mut self, key: &CueKey) -> Result<()> {
        let index = self
            .setlist
            .cue_index(key)
            .ok_or(Error::UnknownCue(*key))?;
        self.go_to(index)
    }

    pub(crate) fn go_to_song(&mut self, song: SongId, measure: u32) -> Result<()> {
        self.ensure_running()?;
        if self.setlist.song(song).is_none() {
            return Err(Error::UnknownSong(song));
        }
        match self.setlist.locate(song, measure) {
            Some(index) => self.go_to(index),
            None => {
                warn!("Song {:?} has no cues", song);
                Ok(())
            }
        }
    }

    pub(crate) fn advance(&mut self) {
        let len = self.setlist.cues.len();
        if len == 0 {
            warn!("Cannot advance: setlist has no cues");
            return;
        }
        let next = match self.position {
            Position::Uninitialized => 0,
            Position::Active(index) => (index + 1).min(len - 1),
            Position::ShutDown => return,
        };
        self.apply_transition(next);
    }

    pub(crate) fn reverse(&mut self) {
        let len = self.setlist.cues.len();
        if len == 0 {
            warn!("Cannot reverse: setlist has no cues");
            return;
        }
        let previous = match self.position {
            Position::Uninitialized => 0,
            Position::Active(index) => index.saturating_sub(1).min(len - 1),
            Position::ShutDown => return,
        };
        self.apply_transition(previous);
    }

    pub(crate) fn restart(&mut self) {
        if self.position == Position::ShutDown {
            return;
        }
        self.panic();
        if self.setlist.cues.is_empty() {
            return;
        }
        self.force_reload = true;
        self.apply_transition(0);
    }

    pub(crate) fn reload(&mut self) {
        if let Some(index) = self.position.index() {
            self.force_reload = true;
            self.apply_transition(index);
        }
    }

    pub(crate) fn edit_setlist(&mut self, edit: impl FnOnce(&mut Setlist)) -> Result<()> {
        self.ensure_running()?;
        let mut draft = self.setlist.clone();
        edit(&mut draft);
        draft.sort_cues();
        draft.validate()?;
        self.setlist = draft;
        self.global_triggers = global_triggers(&self.setlist);
        self.force_reload = true;

        if let Some(index) = self.position.index() {
            let len = self.setlist.cues.len();
            if len == 0 {
                self.cleanup();
                self.session.assignments = Assignments::new();
                self.session.effects = EffectChain::new();
                self.position = Position::Uninitialized;
            } else {
                self.apply_transition(index.min(len - 1));
            }
        }
        Ok(())
    }

    /// Moves to cue `index`: tears down the old cue's runtime, allocates
    /// channels, prepares the new cue, and rebuilds triggers and effects.
    pub(crate) fn apply_transition(&mut self, index: usize) {
        if index >= self.setlist.cues.len() {
            return;
        }
        if self.position == Position::Active(index) && !self.force_reload {
            debug!("Already at cue {}", index);
            return;
        }
        self.force_reload = false;
        self.cleanup();

        let cue = &self.setlist.cues[index];
        let usages = cue.patch_usages();
        let allocation = allocate(&self.session.assignments, &usages, &self.setlist.synthesizers);

        for &(usage, failure) in &allocation.unassigned {
            let event = match failure {
                AllocationFailure::PoolExhausted { synth } => {
                    PerformanceEvent::ChannelPoolExhausted { synth, usage }
                }
                AllocationFailure::UnknownSynthesizer { synth } => {
                    PerformanceEvent::UnknownSynthesizer { synth, usage }
                }
            };
            self.notifier.notify(event);
        }

        for usage in &usages {
            let Some(channel) = allocation.assignments.channel(usage.id) else {
                continue;
            };
            if allocation.fresh.contains(&usage.id) {
                if let Err(e) =
                    self.patch_changer
                        .change_patch(self.output.sink(), &usage.patch, channel)
                {
                    warn!("Patch change for {} on channel {} failed: {}", usage.id, channel, e);
                }
                if self.config.send_volume_on_assign {
                    self.output.control_change(channel, cc::VOLUME, usage.volume);
                }
            }
        }

        for usage in &usages {
            self.session.runtime.prepare(usage);
            if let Some(channel) = allocation.assignments.channel(usage.id) {
                for &(control, value) in &usage.initial_controls {
                    self.output.control_change(channel, control, value);
                }
            }
        }
        self.session.assignments = allocation.assignments;

        for trigger in &mut self.global_triggers {
            trigger.reset();
        }
        self.session.triggers = cue.triggers.iter().cloned().map(ActiveTrigger::new).collect();

        let mut effects = cue.effects.clone();
        if !cue.disable_global_effects {
            effects.extend(&self.setlist.global_effects);
        }
        self.session.effects = effects;

        self.position = Position::Active(index);
        info!("Cue {} '{}' ({})", index, cue.name, cue.key());
        self.notifier.notify(PerformanceEvent::LocationChanged {
            index,
            song: cue.song,
            measure: cue.measure,
            name: cue.name.clone(),
        });
    }

    /// Tears down the runtime state of the current cue.
    pub(crate) fn cleanup(&mut self) {
        for (id, mut entry) in self.session.runtime.drain() {
            let silenced = entry.silence();
            self.emit_generator(id, silenced);
            if entry.started_metronome && self.metronome.is_running() {
                debug!("{} stops the metronome it started", id);
                self.metronome.stop();
            }
        }
        self.session.triggers.clear();
    }

    /// Sends generator output on the usage's channel.
    pub(crate) fn emit_generator(&self, id: UsageId, output: GeneratorOutput) {
        let Some(channel) = self.session.assignments.channel(id) else {
            if !output.offs.is_empty() {
                warn!("{} has no channel for note-off; sending all notes off", id);
                self.output.all_notes_off();
            } else if !output.ons.is_empty() {
                debug!("{} has no channel; dropping generator notes", id);
            }
            return;
        };

        for &note in &output.offs {
            self.output.note_off(channel, note as i16);
        }
        let usage_effects = self.session.runtime.get(id).map(|e| &e.effects);
        for &(note, velocity) in &output.ons {
            let velocity = match usage_effects {
                Some(effects) => effects.process_raw(note, velocity as i32),
                None => velocity as i32,
            };
            let velocity = self.session.effects.process(note, velocity);
            self.output.note_on(channel, note as i16, velocity);
        }
    }

    pub(crate) fn silence_generators(&mut self) {
        for (id, output) in self.session.runtime.silence() {
            self.emit_generator(id, output);
        }
    }

    /// Panic burst on every channel; forgets every sounding and held note.
    pub(crate) fn panic(&mut self) {
        for &controller in &self.config.panic_controllers {
            for channel in 0..CHANNEL_COUNT {
                self.output.control_change(channel, controller, 0);
            }
        }
        self.session.tracking.clear();
        self.session.runtime.silence();
        self.session.runtime.clear_held();
        self.session.held.clear();
        self.notifier.notify(PerformanceEvent::Panic);
    }

    pub(crate) fn shutdown(&mut self) {
        if self.position == Position::ShutDown {
            return;
        }
        self.cleanup();
        self.panic();
        self.session.assignments = Assignments::new();
        self.session.effects = EffectChain::new();
        self.position = Position::ShutDown;
        info!("Performance engine shut down");
        self.notifier.notify(PerformanceEvent::ShutDown);
    }
}

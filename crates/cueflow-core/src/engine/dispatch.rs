//! Input dispatch: triggers, note routing, controller routing, clicks.

use super::state::{EngineState, Position};
use crate::assign::ReceiveContext;
use crate::control_map::route_control;
use crate::trigger::{ActiveTrigger, MetronomeAction, TriggerAction, TriggerInput};
use cueflow_midi::{InputMessage, KeyboardId};
use smallvec::SmallVec;
use std::collections::BTreeSet;
use std::time::Instant;
use tracing::{debug, warn};

impl EngineState {
    pub(crate) fn handle_input(&mut self, message: InputMessage) {
        if self.position == Position::ShutDown {
            return;
        }
        let channel = message.channel();
        let Some(keyboard) = self.setlist.keyboard_for_channel(channel).map(|k| k.id) else {
            debug!("No keyboard on channel {}, ignoring {:?}", channel, message);
            return;
        };

        match message {
            InputMessage::NoteOn { note, velocity, .. } if velocity > 0 => {
                self.session.held.entry(keyboard).or_default().insert(note);
                self.run_triggers(TriggerInput::NoteOn { keyboard, note });
                self.note_on(keyboard, note, velocity);
            }
            InputMessage::NoteOn { note, .. } | InputMessage::NoteOff { note, .. } => {
                self.release_held(keyboard, note);
                self.run_triggers(TriggerInput::NoteOff { keyboard, note });
                self.note_off(keyboard, note);
            }
            InputMessage::ControlChange { control, value, .. } => {
                self.run_triggers(TriggerInput::Control {
                    keyboard,
                    control,
                    value,
                });
                self.control_change(keyboard, control, value);
            }
            InputMessage::Other { status, .. } => {
                debug!("Ignoring status {:#04x} from {}", status, keyboard);
            }
        }
    }

    pub(crate) fn release_held(&mut self, keyboard: KeyboardId, note: u8) {
        if let Some(held) = self.session.held.get_mut(&keyboard) {
            held.remove(&note);
        }
    }

    fn run_triggers(&mut self, input: TriggerInput) {
        let globals_enabled = self
            .current_cue()
            .map_or(true, |cue| !cue.disable_global_triggers);
        let globals: &mut [ActiveTrigger] = if globals_enabled {
            &mut self.global_triggers
        } else {
            &mut []
        };
        if globals.is_empty() && self.session.triggers.is_empty() {
            return;
        }

        let now = Instant::now();
        let none = BTreeSet::new();
        let held = self.session.held.get(&input.keyboard()).unwrap_or(&none);

        let mut actions = Vec::new();
        for trigger in globals.iter_mut().chain(self.session.triggers.iter_mut()) {
            if trigger.evaluate(&input, held, now) {
                actions.extend(trigger.trigger().actions.iter().cloned());
            }
        }
        self.execute_actions(actions);
    }

    pub(crate) fn execute_actions(&mut self, actions: Vec<TriggerAction>) {
        for action in actions {
            debug!("Trigger action {:?}", action);
            match action {
                TriggerAction::Advance => self.advance(),
                TriggerAction::Reverse => self.reverse(),
                TriggerAction::GoTo { song, measure } => {
                    if let Err(e) = self.go_to_song(song, measure) {
                        warn!("Trigger go-to failed: {}", e);
                    }
                }
                TriggerAction::Wait(wait) => {
                    std::thread::sleep(wait.duration(self.metronome.bpm()));
                }
                TriggerAction::Panic => self.panic(),
                TriggerAction::Metronome(action) => match action {
                    MetronomeAction::Start => self.metronome.start(),
                    MetronomeAction::Stop => {
                        self.metronome.stop();
                        self.silence_generators();
                    }
                    MetronomeAction::SetBpm(bpm) => self.metronome.set_bpm(bpm),
                    MetronomeAction::TapTempo => self.metronome.tap_tempo(),
                },
            }
        }
    }

    pub(crate) fn note_on(&mut self, keyboard: KeyboardId, note: u8, velocity: u8) {
        let Some(cue) = self.position.index().and_then(|i| self.setlist.cues.get(i)) else {
            return;
        };

        let mut responses = Vec::new();
        let mut ctx = ReceiveContext {
            runtime: &mut self.session.runtime,
            metronome: self.metronome.as_ref(),
        };
        for node in &cue.assignments {
            if node.responds_to(keyboard, note) {
                node.receive(keyboard, note, velocity, &mut ctx, &mut responses);
            }
        }
        if responses.is_empty() {
            return;
        }

        let mut sounded: SmallVec<[(u8, u8); 4]> = SmallVec::new();
        let mut lost_release = false;
        for response in &responses {
            let Some(channel) = self.session.assignments.channel(response.usage.id) else {
                debug!("{} has no channel, dropping note {}", response.usage.id, note);
                lost_release |= response.release_first.is_some();
                continue;
            };
            if let Some(previous) = response.release_first {
                self.output.note_off(channel, previous);
            }
            for &(out_note, out_velocity) in &response.notes {
                let effect_note = out_note.clamp(0, 127) as u8;
                let v = response.usage.effects.process_raw(effect_note, out_velocity as i32);
                let v = self.session.effects.process(effect_note, v);
                if self.output.note_on(channel, out_note, v) {
                    sounded.push((channel, out_note as u8));
                }
            }
        }
        if lost_release {
            warn!("Monophonic release without a channel; sending all notes off");
            self.output.all_notes_off();
        }
        if !sounded.is_empty() {
            self.session.tracking.insert((keyboard, note), sounded);
        }
    }

    pub(crate) fn note_off(&mut self, keyboard: KeyboardId, note: u8) {
        if let Some(cue) = self.position.index().and_then(|i| self.setlist.cues.get(i)) {
            for node in &cue.assignments {
                node.note_released(keyboard, note, &mut self.session.runtime);
            }
        }
        match self.session.tracking.remove(&(keyboard, note)) {
            Some(pairs) => {
                for (channel, out_note) in pairs {
                    self.output.note_off(channel, out_note as i16);
                }
            }
            None => debug!("No sounding notes for {} note {}", keyboard, note),
        }
    }

    fn control_change(&mut self, keyboard: KeyboardId, control: u8, value: u8) {
        let cue = self.position.index().and_then(|i| self.setlist.cues.get(i));
        if let Some(cue) = cue {
            for node in &cue.assignments {
                node.control_changed(keyboard, control, value, &mut self.session.runtime);
            }
        }

        let cue_map = cue.and_then(|c| c.control_map.as_ref());
        let global_map = match cue {
            Some(c) if c.disable_global_control_map => None,
            _ => Some(&self.setlist.global_control_map),
        };
        let route = route_control(
            control,
            cue_map,
            global_map,
            &self.session.assignments,
            self.config.sustain_routing,
        );
        debug!("CC{} routed via {:?} to {} sends", control, route.tier, route.sends.len());
        for (channel, destination) in route.sends {
            self.output.control_change(channel, destination, value);
        }
    }

    pub(crate) fn metronome_clicked(&mut self, position: u32) {
        if self.position.index().is_none() {
            return;
        }
        for (id, output) in self.session.runtime.click(position) {
            self.emit_generator(id, output);
        }
    }
}

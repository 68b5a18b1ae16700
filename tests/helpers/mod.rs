//! Fixtures for cueflow integration tests.
//!
//! Every rig runs against a [`CaptureSink`] and a [`ManualMetronome`], so a
//! test drives time by hand and sees exactly what went out on the wire.

#![allow(dead_code)]

use crossbeam_channel::{unbounded, Receiver};
use cueflow::prelude::*;
use std::sync::Arc;

pub const LOWER: KeyboardId = KeyboardId(0);
pub const UPPER: KeyboardId = KeyboardId(1);

/// Input channels the keyboards send on.
pub const LOWER_CH: u8 = 0;
pub const UPPER_CH: u8 = 1;

pub const RACK: SynthId = SynthId(0);
pub const OPENER: SongId = SongId(0);
pub const CLOSER: SongId = SongId(1);

/// Routes engine logs through the test harness. Safe to call from every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

pub fn note(name: &str) -> Note {
    name.parse().expect("valid note name")
}

pub fn range(keyboard: KeyboardId, lower: &str, upper: &str) -> NoteRange {
    NoteRange::new(keyboard, note(lower), note(upper))
}

pub fn patch(name: &str, program: u8) -> Patch {
    Patch::new(RACK, name, program)
}

/// Two keyboards, one rack drawing from `channels`, two songs, no cues.
pub fn stage(channels: &[u8]) -> Setlist {
    Setlist::new()
        .with_keyboard(Keyboard::new(LOWER, "Lower", LOWER_CH).main())
        .with_keyboard(Keyboard::new(UPPER, "Upper", UPPER_CH))
        .with_synthesizer(Synthesizer::new(RACK, "Rack", channels.to_vec()))
        .with_song(Song::new(OPENER, 0, "Opener"))
        .with_song(Song::new(CLOSER, 1, "Closer"))
}

pub struct Rig {
    pub cueflow: Cueflow,
    pub sink: Arc<CaptureSink>,
    pub metronome: Arc<ManualMetronome>,
    pub events: Receiver<PerformanceEvent>,
}

impl Rig {
    pub fn new(setlist: Setlist) -> Self {
        Self::with_config(setlist, EngineConfig::default())
    }

    pub fn with_config(setlist: Setlist, config: EngineConfig) -> Self {
        init_tracing();
        let sink = Arc::new(CaptureSink::new());
        let metronome = Arc::new(ManualMetronome::default());
        let (tx, events) = unbounded();
        let cueflow = Cueflow::builder(setlist)
            .config(config)
            .sink(sink.clone())
            .metronome(metronome.clone())
            .notifier(tx)
            .build()
            .expect("rig should build");
        Self {
            cueflow,
            sink,
            metronome,
            events,
        }
    }

    pub fn engine(&self) -> &PerformanceEngine {
        self.cueflow.engine()
    }

    pub fn press(&self, channel: u8, name: &str, velocity: u8) {
        self.cueflow
            .send(InputMessage::note_on(channel, note(name).midi(), velocity));
    }

    pub fn release(&self, channel: u8, name: &str) {
        self.cueflow
            .send(InputMessage::note_off(channel, note(name).midi()));
    }

    pub fn control(&self, channel: u8, control: u8, value: u8) {
        self.cueflow
            .send(InputMessage::control_change(channel, control, value));
    }

    /// Enters cue `index` and forgets everything sent so far.
    pub fn enter(&self, index: usize) {
        self.cueflow.go_to(index).expect("cue exists");
        self.sink.clear();
        self.drain_events();
    }

    pub fn drain_events(&self) -> Vec<PerformanceEvent> {
        self.events.try_iter().collect()
    }
}

//! # Cueflow
//!
//! Live-performance MIDI router. A setlist of cues decides, measure by
//! measure, which synthesizer patches each keyboard plays; cueflow assigns
//! output channels, changes patches and routes notes and controllers while
//! the performer moves through the show.
//!
//! ## Quick start
//!
//! ```ignore
//! use cueflow::prelude::*;
//!
//! let lower = KeyboardId(0);
//! let synth = Synthesizer::new(SynthId(0), "Rack", vec![0, 1, 2, 3]);
//! let piano = Patch::new(synth.id, "Grand", 0);
//!
//! let setlist = Setlist::new()
//!     .with_keyboard(Keyboard::new(lower, "Lower", 0).main())
//!     .with_synthesizer(synth)
//!     .with_song(Song::new(SongId(0), 0, "Opener"))
//!     .with_cue(Cue::new(SongId(0), 1, "Intro").with_usage(PatchUsage::simple(
//!         UsageId(0),
//!         piano,
//!         NoteRange::full(lower),
//!     )));
//!
//! let cueflow = Cueflow::builder(setlist)
//!     .output_device_name("IAC")
//!     .input_device_name("Keystation")
//!     .build()?;
//! cueflow.go_to(0)?;
//! ```
//!
//! ## Feature flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `midi-io` | Hardware MIDI ports via `midir` (default) |
//!
//! Without `midi-io`, supply a [`MidiSink`](cueflow_midi::MidiSink) through
//! [`CueflowBuilder::sink`] and feed input with [`Cueflow::send`].

pub mod builder;
pub mod engine;
pub mod error;

pub use builder::CueflowBuilder;
pub use engine::Cueflow;
pub use error::{Error, Result};

pub use cueflow_core as core;
pub use cueflow_midi as midi;

pub use cueflow_core::{
    AssignmentNode, Cue, CueKey, EngineConfig, Keyboard, Metronome, Patch, PatchMerge, PatchUsage,
    PerformanceEngine, PerformanceEvent, Position, Setlist, Song, SongId, SynthId, Synthesizer,
    Trigger, TriggerAction, UsageId,
};
pub use cueflow_midi::{
    CaptureSink, InputMessage, KeyboardId, MidiSink, Note, NoteRange, OutputMessage,
};

#[cfg(feature = "midi-io")]
pub use cueflow_midi::{MidiInputManager, MidiOutputManager};

/// Convenient imports for common usage.
pub mod prelude {
    pub use crate::{Cueflow, CueflowBuilder, Error, Result};

    pub use cueflow_core::{
        ArpPattern, ArpeggiatorSettings, AssignmentNode, Bank, Combination, ControlMap,
        ControlMapEntry, ControlTarget, Cue, CueKey, EffectChain, EngineConfig, Keyboard,
        ManualMetronome, Metronome, MetronomeAction, Patch, PatchMerge, PatchUsage,
        PerformanceEngine, PerformanceEvent, Position, Scale, ScaleKind, SequencerDefinition,
        Setlist, Song, SongId, Subdivision, SustainRouting, SynthId, Synthesizer, Trigger,
        TriggerAction, TriggerPredicate, UsageId, VelocityScale, WaitTime,
    };
    pub use cueflow_midi::{
        CaptureSink, InputMessage, KeyboardId, MidiSink, Note, NoteRange, OutputMessage,
    };
}

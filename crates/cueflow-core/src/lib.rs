//! Performance engine for live MIDI routing.
//!
//! A [`Setlist`] describes keyboards, synthesizers and an ordered list of
//! [`Cue`]s. The [`PerformanceEngine`] walks through those cues, assigning
//! output channels to each cue's patches and routing incoming notes and
//! controllers to them.

pub mod allocator;
pub mod assign;
pub mod config;
pub mod control_map;
pub mod effect;
pub mod engine;
pub mod error;
pub mod generator;
pub mod metronome;
pub mod notify;
pub mod patch_change;
pub mod setlist;
pub mod trigger;

pub use allocator::{allocate, Allocation, AllocationFailure, Assignment, Assignments};
pub use assign::{AssignmentNode, PatchMerge, PatchUsage, Response, ScaleMap, UsageId, UsageKind};
pub use config::{EngineConfig, SustainRouting};
pub use control_map::{
    route_control, ControlMap, ControlMapEntry, ControlRoute, ControlTarget, RouteTier,
};
pub use effect::{Effect, EffectChain, FixedVelocity, VelocityCurve, VelocityScale};
pub use engine::{PerformanceEngine, PerformanceEngineBuilder, Position};
pub use error::{Error, Result};
pub use generator::{
    ArpPattern, Arpeggiator, ArpeggiatorSettings, GeneratorOutput, NoteChangeBehavior, Sequencer,
    SequencerDefinition,
};
pub use metronome::{
    ManualMetronome, Metronome, MetronomeListener, Subdivision, TapTempo, ThreadMetronome,
    CLICKS_PER_BEAT,
};
pub use notify::{PerformanceEvent, PerformanceNotifier};
pub use patch_change::{BankProgramChange, PatchChanger};
pub use setlist::{
    Bank, Cue, CueKey, Keyboard, Patch, Scale, ScaleKind, Setlist, Song, SongId, SynthId,
    Synthesizer,
};
pub use trigger::{
    ActiveTrigger, Combination, MetronomeAction, Trigger, TriggerAction, TriggerInput,
    TriggerPredicate, ValueMatch, WaitTime,
};

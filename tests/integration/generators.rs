//! Generator integration tests
//!
//! Tests arpeggiator and sequencer usages stepped by metronome clicks, and
//! that a generator cleans up after itself when its cue is left.

use crate::helpers::*;
use cueflow::core::NoteChangeBehavior;
use cueflow::prelude::*;
use std::sync::Arc;

fn arp_cue() -> Cue {
    Cue::new(OPENER, 1, "Arp").with_usage(PatchUsage::arpeggiator(
        UsageId(1),
        patch("Pluck", 45),
        range(LOWER, "C3", "C5"),
        ArpeggiatorSettings::default(),
    ))
}

fn piano_cue() -> Cue {
    Cue::new(OPENER, 9, "Piano").with_usage(PatchUsage::simple(
        UsageId(9),
        patch("Piano", 0),
        range(LOWER, "C3", "C5"),
    ))
}

fn sequencer_cue(behavior: NoteChangeBehavior) -> Cue {
    let definition = SequencerDefinition::new("octaves", vec![0, 12], 2)
        .and_then(|d| d.with_cell(0, 0))
        .and_then(|d| d.with_cell(1, 1))
        .expect("cells inside grid")
        .with_note_change(behavior);
    Cue::new(OPENER, 1, "Sequence").with_usage(PatchUsage::sequencer(
        UsageId(1),
        patch("Bass", 38),
        range(LOWER, "C2", "C5"),
        Arc::new(definition),
        Subdivision::Quarter,
    ))
}

#[test]
fn test_arpeggiator_cycles_held_chord_on_eighths() {
    let rig = Rig::new(stage(&[0, 1]).with_cue(arp_cue()).with_cue(piano_cue()));
    rig.enter(0);

    rig.press(LOWER_CH, "C4", 100);
    rig.press(LOWER_CH, "G4", 100);
    rig.press(LOWER_CH, "E4", 100);
    assert!(rig.sink.note_ons().is_empty(), "keys only feed the arpeggiator");
    assert!(rig.metronome.is_running());
    assert_eq!(rig.metronome.start_count(), 1);

    rig.metronome.beat();
    rig.metronome.beat();

    assert_eq!(
        rig.sink.note_ons(),
        vec![(0, 60, 100), (0, 64, 100), (0, 67, 100), (0, 60, 100)]
    );
    assert_eq!(rig.sink.note_offs(), vec![(0, 60), (0, 64), (0, 67)]);
}

#[test]
fn test_leaving_cue_silences_and_stops_metronome() {
    let rig = Rig::new(stage(&[0, 1]).with_cue(arp_cue()).with_cue(piano_cue()));
    rig.enter(0);
    rig.press(LOWER_CH, "C4", 100);
    rig.metronome.beat();
    assert_eq!(rig.engine().runtime_state_count(), 1);
    rig.sink.clear();

    rig.cueflow.advance();

    assert_eq!(rig.sink.note_offs(), vec![(0, 60)]);
    assert!(!rig.metronome.is_running());
    assert_eq!(rig.metronome.stop_count(), 1);
    assert_eq!(rig.engine().runtime_state_count(), 0);
}

#[test]
fn test_external_metronome_keeps_running() {
    let rig = Rig::new(stage(&[0, 1]).with_cue(arp_cue()).with_cue(piano_cue()));
    rig.enter(0);
    rig.metronome.start();

    rig.press(LOWER_CH, "C4", 100);
    rig.cueflow.advance();

    assert!(rig.metronome.is_running());
    assert_eq!(rig.metronome.stop_count(), 0);
}

#[test]
fn test_arpeggiator_falls_silent_after_release() {
    let rig = Rig::new(stage(&[0]).with_cue(arp_cue()));
    rig.enter(0);

    rig.press(LOWER_CH, "D4", 90);
    rig.metronome.beat();
    rig.release(LOWER_CH, "D4");
    rig.metronome.beat();
    rig.metronome.beat();

    assert_eq!(rig.sink.note_ons(), vec![(0, 62, 90), (0, 62, 90)]);
    assert_eq!(rig.sink.note_offs(), vec![(0, 62), (0, 62)]);
}

#[test]
fn test_all_notes_off_releases_generator_keys() {
    let rig = Rig::new(stage(&[0]).with_cue(arp_cue()));
    rig.enter(0);
    rig.press(LOWER_CH, "C4", 100);
    rig.metronome.beat();

    rig.control(LOWER_CH, 123, 0);
    rig.sink.clear();
    rig.metronome.beat();

    assert_eq!(rig.sink.note_offs(), vec![(0, 60)]);
    assert!(rig.sink.note_ons().is_empty());
}

#[test]
fn test_clicks_before_any_cue_do_nothing() {
    let rig = Rig::new(stage(&[0]).with_cue(arp_cue()));
    rig.metronome.start();
    rig.metronome.beat();
    rig.engine().metronome_clicked(0);
    assert!(rig.sink.messages().is_empty());
}

#[test]
fn test_sequencer_continues_over_new_note() {
    let rig = Rig::new(stage(&[0]).with_cue(sequencer_cue(NoteChangeBehavior::ContinueSequence)));
    rig.enter(0);

    rig.press(LOWER_CH, "C3", 90);
    rig.metronome.beat();
    rig.press(LOWER_CH, "E3", 80);
    rig.metronome.beat();
    rig.metronome.beat();

    assert_eq!(
        rig.sink.note_ons(),
        vec![(0, 48, 90), (0, 60, 90), (0, 52, 80)]
    );
    assert_eq!(rig.sink.note_offs(), vec![(0, 48), (0, 60)]);
}

#[test]
fn test_sequencer_restarts_on_new_note() {
    let rig = Rig::new(stage(&[0]).with_cue(sequencer_cue(NoteChangeBehavior::RestartSequence)));
    rig.enter(0);

    rig.press(LOWER_CH, "C3", 90);
    rig.metronome.beat();
    rig.press(LOWER_CH, "E3", 80);
    rig.metronome.beat();

    assert_eq!(rig.sink.note_ons(), vec![(0, 48, 90), (0, 52, 80)]);
    assert_eq!(rig.sink.note_offs(), vec![(0, 48)]);
}

#[test]
fn test_generator_output_passes_through_cue_effects() {
    let rig = Rig::new(stage(&[0]).with_cue(arp_cue().with_effect(VelocityScale(0.5))));
    rig.enter(0);

    rig.press(LOWER_CH, "C4", 100);
    rig.engine().metronome_clicked(0);

    assert_eq!(rig.sink.note_ons(), vec![(0, 60, 50)]);
}

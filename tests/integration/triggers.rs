//! Trigger integration tests
//!
//! Tests that pedal notes, chords and controllers move the performance and
//! drive the metronome.

use crate::helpers::*;
use cueflow::core::ValueMatch;
use cueflow::prelude::*;
use std::collections::BTreeSet;
use std::time::{Duration, Instant};

fn single(keyboard: KeyboardId, name: &str) -> TriggerPredicate {
    TriggerPredicate::NoteOn(range(keyboard, name, name))
}

fn piano(id: u32) -> PatchUsage {
    PatchUsage::simple(UsageId(id), patch("Piano", 0), range(LOWER, "C3", "C5"))
}

/// Three Opener cues and one Closer cue, all playing piano on C3-C5.
fn show() -> Setlist {
    stage(&[0, 1, 2, 3])
        .with_cue(Cue::new(OPENER, 1, "Intro").with_usage(piano(1)))
        .with_cue(Cue::new(OPENER, 9, "Verse").with_usage(piano(2)))
        .with_cue(Cue::new(OPENER, 17, "Chorus").with_usage(piano(3)))
        .with_cue(Cue::new(CLOSER, 1, "Finale").with_usage(piano(4)))
}

fn pedal_advance() -> Trigger {
    Trigger::new(Combination::Any)
        .when(single(LOWER, "C1"))
        .then(TriggerAction::Advance)
}

#[test]
fn test_pedal_note_advances() {
    let rig = Rig::new(show().with_global_trigger(pedal_advance()));
    rig.enter(0);

    rig.press(LOWER_CH, "C1", 100);
    assert_eq!(rig.cueflow.position(), Position::Active(1));
    rig.release(LOWER_CH, "C1");

    rig.press(LOWER_CH, "C1", 100);
    assert_eq!(rig.cueflow.position(), Position::Active(2));

    assert!(rig.sink.note_ons().is_empty(), "C1 is outside every usage");
}

#[test]
fn test_safety_delay_spans_the_cue_change() {
    let trigger = pedal_advance().with_safety_delay(Duration::from_secs(60));
    let rig = Rig::new(show().with_global_trigger(trigger));
    rig.enter(0);

    rig.press(LOWER_CH, "C1", 100);
    rig.release(LOWER_CH, "C1");
    rig.press(LOWER_CH, "C1", 100);

    assert_eq!(rig.cueflow.position(), Position::Active(1));
}

#[test]
fn test_cue_can_disable_global_triggers() {
    let setlist = stage(&[0])
        .with_global_trigger(pedal_advance())
        .with_cue(Cue::new(OPENER, 1, "Intro").with_usage(piano(1)))
        .with_cue(
            Cue::new(OPENER, 9, "Solo")
                .with_usage(piano(2))
                .without_global_triggers(),
        )
        .with_cue(Cue::new(OPENER, 17, "Outro").with_usage(piano(3)));
    let rig = Rig::new(setlist);
    rig.enter(0);

    rig.press(LOWER_CH, "C1", 100);
    rig.release(LOWER_CH, "C1");
    rig.press(LOWER_CH, "C1", 100);

    assert_eq!(rig.cueflow.position(), Position::Active(1));
}

#[test]
fn test_trigger_runs_before_note_is_routed() {
    let setlist = stage(&[0, 1])
        .with_cue(
            Cue::new(OPENER, 1, "Intro")
                .with_usage(piano(1))
                .with_trigger(
                    Trigger::new(Combination::Any)
                        .when(single(LOWER, "C4"))
                        .then(TriggerAction::Advance),
                ),
        )
        .with_cue(Cue::new(OPENER, 9, "Strings").with_usage(PatchUsage::simple(
            UsageId(2),
            patch("Strings", 48),
            range(LOWER, "C3", "C5"),
        )));
    let rig = Rig::new(setlist);
    rig.enter(0);

    rig.press(LOWER_CH, "C4", 100);

    assert_eq!(rig.cueflow.position(), Position::Active(1));
    let strings = rig.engine().assigned_channel(UsageId(2)).unwrap();
    assert_eq!(rig.sink.note_ons(), vec![(strings, 60, 100)]);
}

#[test]
fn test_sequence_must_arrive_in_order() {
    let trigger = Trigger::new(Combination::AllInSequence)
        .when(single(LOWER, "C1"))
        .when(single(LOWER, "D1"))
        .then(TriggerAction::GoTo {
            song: CLOSER,
            measure: 1,
        });
    let rig = Rig::new(show().with_global_trigger(trigger));
    rig.enter(0);

    rig.press(LOWER_CH, "D1", 100);
    rig.press(LOWER_CH, "C1", 100);
    assert_eq!(rig.cueflow.position(), Position::Active(0));

    rig.press(LOWER_CH, "D1", 100);
    assert_eq!(rig.cueflow.position(), Position::Active(3));
}

#[test]
fn test_chord_reverses() {
    let notes: BTreeSet<u8> = [note("C1").midi(), note("E1").midi()].into_iter().collect();
    let trigger = Trigger::new(Combination::Any)
        .when(TriggerPredicate::Chord {
            keyboard: LOWER,
            notes,
        })
        .then(TriggerAction::Reverse);
    let rig = Rig::new(show().with_global_trigger(trigger));
    rig.enter(2);

    rig.press(LOWER_CH, "C1", 100);
    assert_eq!(rig.cueflow.position(), Position::Active(2));

    rig.press(LOWER_CH, "E1", 100);
    assert_eq!(rig.cueflow.position(), Position::Active(1));
}

#[test]
fn test_footswitch_controls_metronome() {
    let footswitch = |value: ValueMatch, action: MetronomeAction| {
        Trigger::new(Combination::Any)
            .when(TriggerPredicate::Control {
                keyboard: UPPER,
                control: 80,
                value,
            })
            .then(TriggerAction::Metronome(action))
    };
    let setlist = show()
        .with_global_trigger(footswitch(
            ValueMatch::Range {
                lower: 64,
                upper: 127,
            },
            MetronomeAction::Start,
        ))
        .with_global_trigger(footswitch(ValueMatch::Exact(0), MetronomeAction::Stop))
        .with_global_trigger(footswitch(ValueMatch::Exact(1), MetronomeAction::SetBpm(90.0)));
    let rig = Rig::new(setlist);
    rig.enter(0);

    rig.control(UPPER_CH, 80, 20);
    assert!(!rig.metronome.is_running());

    rig.control(UPPER_CH, 80, 100);
    assert!(rig.metronome.is_running());

    rig.control(UPPER_CH, 80, 1);
    assert_eq!(rig.metronome.bpm(), 90.0);

    rig.control(UPPER_CH, 80, 0);
    assert!(!rig.metronome.is_running());
}

#[test]
fn test_metronome_stop_silences_generators() {
    let setlist = stage(&[0]).with_cue(
        Cue::new(OPENER, 1, "Arp")
            .with_usage(PatchUsage::arpeggiator(
                UsageId(1),
                patch("Pluck", 45),
                range(LOWER, "C3", "C5"),
                ArpeggiatorSettings::default(),
            ))
            .with_trigger(
                Trigger::new(Combination::Any)
                    .when(TriggerPredicate::Control {
                        keyboard: LOWER,
                        control: 81,
                        value: ValueMatch::Exact(127),
                    })
                    .then(TriggerAction::Metronome(MetronomeAction::Stop)),
            ),
    );
    let rig = Rig::new(setlist);
    rig.enter(0);
    rig.press(LOWER_CH, "C4", 100);
    rig.metronome.beat();
    rig.sink.clear();

    rig.control(LOWER_CH, 81, 127);

    assert!(!rig.metronome.is_running());
    assert_eq!(rig.sink.note_offs(), vec![(0, 60)]);
}

#[test]
fn test_wait_delays_following_actions() {
    let trigger = Trigger::new(Combination::Any)
        .when(single(LOWER, "C1"))
        .then(TriggerAction::Wait(WaitTime::Millis(30)))
        .then(TriggerAction::Advance);
    let rig = Rig::new(show().with_global_trigger(trigger));
    rig.enter(0);

    let started = Instant::now();
    rig.press(LOWER_CH, "C1", 100);

    assert!(started.elapsed() >= Duration::from_millis(30));
    assert_eq!(rig.cueflow.position(), Position::Active(1));
}

#[test]
fn test_panic_trigger() {
    let trigger = Trigger::new(Combination::Any)
        .when(TriggerPredicate::NoteOff(range(LOWER, "C1", "C1")))
        .then(TriggerAction::Panic);
    let rig = Rig::new(show().with_global_trigger(trigger));
    rig.enter(0);

    rig.press(LOWER_CH, "C4", 100);
    rig.press(LOWER_CH, "C1", 100);
    assert!(rig.drain_events().is_empty());

    rig.release(LOWER_CH, "C1");
    assert_eq!(rig.drain_events(), vec![PerformanceEvent::Panic]);

    rig.sink.clear();
    rig.release(LOWER_CH, "C4");
    assert!(rig.sink.note_offs().is_empty());
}

//! Note routing integration tests
//!
//! Tests key ranges, usage kinds, velocity effects and that every note-on
//! gets its note-off, even across cue changes.

use crate::helpers::*;
use cueflow::prelude::*;
use cueflow::core::{FixedVelocity, ScaleMap};
use std::collections::BTreeMap;

fn piano_cue() -> Cue {
    Cue::new(OPENER, 1, "Verse").with_usage(PatchUsage::simple(
        UsageId(1),
        patch("Piano", 0),
        range(LOWER, "C3", "C5"),
    ))
}

/// One note in, one note out, one matching release.
#[test]
fn test_middle_c_routes_to_assigned_channel() {
    let rig = Rig::new(stage(&[0, 1, 2, 3]).with_cue(piano_cue()));
    rig.enter(0);

    rig.press(LOWER_CH, "C4", 100);
    assert_eq!(rig.sink.note_ons(), vec![(0, 60, 100)]);

    rig.release(LOWER_CH, "C4");
    assert_eq!(rig.sink.note_offs(), vec![(0, 60)]);
    assert_eq!(rig.sink.messages().len(), 2);
}

#[test]
fn test_notes_outside_range_are_dropped() {
    let rig = Rig::new(stage(&[0, 1]).with_cue(piano_cue()));
    rig.enter(0);

    rig.press(LOWER_CH, "B2", 100);
    rig.press(LOWER_CH, "C#5", 100);
    rig.press(UPPER_CH, "C4", 100);
    // No keyboard sends on channel 9.
    rig.press(9, "C4", 100);

    assert!(rig.sink.messages().is_empty());
}

#[test]
fn test_velocity_zero_note_on_releases() {
    let rig = Rig::new(stage(&[0, 1]).with_cue(piano_cue()));
    rig.enter(0);

    rig.press(LOWER_CH, "E4", 90);
    rig.cueflow.send(InputMessage::note_on(LOWER_CH, 64, 0));

    assert_eq!(rig.sink.note_ons(), vec![(0, 64, 90)]);
    assert_eq!(rig.sink.note_offs(), vec![(0, 64)]);
}

#[test]
fn test_release_follows_the_note_across_cue_change() {
    let setlist = stage(&[0, 1, 2, 3])
        .with_cue(piano_cue())
        .with_cue(Cue::new(OPENER, 9, "Chorus").with_usage(PatchUsage::simple(
            UsageId(2),
            patch("Strings", 48),
            range(LOWER, "C3", "C5"),
        )));
    let rig = Rig::new(setlist);
    rig.enter(0);

    rig.press(LOWER_CH, "C4", 100);
    rig.cueflow.advance();
    let strings = rig
        .engine()
        .assigned_channel(UsageId(2))
        .expect("strings assigned");
    assert_ne!(strings, 0, "a held piano channel is not handed to a new patch");
    rig.sink.clear();

    rig.release(LOWER_CH, "C4");
    assert_eq!(rig.sink.note_offs(), vec![(0, 60)]);
    assert!(rig.sink.note_ons().is_empty());
}

#[test]
fn test_transposition() {
    let setlist = stage(&[0]).with_cue(Cue::new(OPENER, 1, "Up").with_usage(
        PatchUsage::simple(UsageId(1), patch("Bell", 14), range(LOWER, "C3", "C5"))
            .with_transposition(12),
    ));
    let rig = Rig::new(setlist);
    rig.enter(0);

    rig.press(LOWER_CH, "C4", 80);
    rig.release(LOWER_CH, "C4");

    assert_eq!(rig.sink.note_ons(), vec![(0, 72, 80)]);
    assert_eq!(rig.sink.note_offs(), vec![(0, 72)]);
}

#[test]
fn test_monophonic_releases_previous_note() {
    let setlist = stage(&[0]).with_cue(Cue::new(OPENER, 1, "Lead").with_usage(
        PatchUsage::simple(UsageId(1), patch("Lead", 81), range(LOWER, "C3", "C5")).monophonic(),
    ));
    let rig = Rig::new(setlist);
    rig.enter(0);

    rig.press(LOWER_CH, "C4", 100);
    rig.press(LOWER_CH, "E4", 100);

    assert_eq!(rig.sink.note_ons(), vec![(0, 60, 100), (0, 64, 100)]);
    assert_eq!(rig.sink.note_offs(), vec![(0, 60)]);

    rig.sink.clear();
    rig.release(LOWER_CH, "E4");
    assert_eq!(rig.sink.note_offs(), vec![(0, 64)]);
}

#[test]
fn test_ghost_notes_sound_mapped_notes_only() {
    let mut map = BTreeMap::new();
    map.insert(60, vec![48, 67]);
    let setlist = stage(&[0]).with_cue(Cue::new(OPENER, 1, "Pad").with_usage(
        PatchUsage::ghost_notes(UsageId(1), patch("Pad", 88), range(LOWER, "C3", "C5"), map),
    ));
    let rig = Rig::new(setlist);
    rig.enter(0);

    rig.press(LOWER_CH, "D4", 100);
    assert!(rig.sink.note_ons().is_empty());

    rig.press(LOWER_CH, "C4", 70);
    assert_eq!(rig.sink.note_ons(), vec![(0, 48, 70), (0, 67, 70)]);

    rig.release(LOWER_CH, "C4");
    assert_eq!(rig.sink.note_offs(), vec![(0, 48), (0, 67)]);
}

#[test]
fn test_custom_scale_snaps_to_c_major() {
    let setlist = stage(&[0]).with_cue(Cue::new(OPENER, 1, "Diatonic").with_usage(
        PatchUsage::custom_scale(
            UsageId(1),
            patch("Marimba", 12),
            range(LOWER, "C3", "C5"),
            ScaleMap::snap_to(Scale::major(0)),
        ),
    ));
    let rig = Rig::new(setlist);
    rig.enter(0);

    rig.press(LOWER_CH, "E4", 100);
    rig.press(LOWER_CH, "D#4", 90);
    assert_eq!(rig.sink.note_ons(), vec![(0, 64, 100), (0, 62, 90)]);

    rig.release(LOWER_CH, "D#4");
    assert_eq!(rig.sink.note_offs(), vec![(0, 62)]);
}

#[test]
fn test_merge_splits_keyboard() {
    let split = PatchMerge::new(range(LOWER, "C2", "C6"))
        .with_usage(PatchUsage::simple(
            UsageId(1),
            patch("Bass", 33),
            range(LOWER, "C2", "B3"),
        ))
        .with_usage(PatchUsage::simple(
            UsageId(2),
            patch("Piano", 0),
            range(LOWER, "C4", "C6"),
        ));
    let rig = Rig::new(stage(&[0, 1]).with_cue(Cue::new(OPENER, 1, "Split").with_merge(split)));
    rig.enter(0);

    rig.press(LOWER_CH, "C3", 100);
    rig.press(LOWER_CH, "C5", 100);

    let bass = rig.engine().assigned_channel(UsageId(1)).unwrap();
    let piano = rig.engine().assigned_channel(UsageId(2)).unwrap();
    assert_ne!(bass, piano);
    assert_eq!(rig.sink.note_ons(), vec![(bass, 48, 100), (piano, 72, 100)]);
}

#[test]
fn test_layered_usages_both_sound_and_release() {
    let setlist = stage(&[0, 1]).with_cue(
        Cue::new(OPENER, 1, "Layer")
            .with_usage(PatchUsage::simple(
                UsageId(1),
                patch("Piano", 0),
                range(LOWER, "C3", "C5"),
            ))
            .with_usage(PatchUsage::simple(
                UsageId(2),
                patch("Strings", 48),
                range(LOWER, "C4", "C5"),
            )),
    );
    let rig = Rig::new(setlist);
    rig.enter(0);

    rig.press(LOWER_CH, "D4", 100);
    rig.release(LOWER_CH, "D4");

    assert_eq!(rig.sink.note_ons(), vec![(0, 62, 100), (1, 62, 100)]);
    assert_eq!(rig.sink.note_offs(), vec![(0, 62), (1, 62)]);
}

#[test]
fn test_usage_effects_run_before_cue_effects() {
    let setlist = stage(&[0]).with_cue(
        Cue::new(OPENER, 1, "Soft")
            .with_usage(
                PatchUsage::simple(UsageId(1), patch("Piano", 0), range(LOWER, "C3", "C5"))
                    .with_effect(FixedVelocity(90)),
            )
            .with_effect(VelocityScale(0.5)),
    );
    let rig = Rig::new(setlist);
    rig.enter(0);

    rig.press(LOWER_CH, "C4", 20);
    assert_eq!(rig.sink.note_ons(), vec![(0, 60, 45)]);
}

#[test]
fn test_velocity_clamped_once_after_both_chains() {
    let setlist = stage(&[0]).with_cue(
        Cue::new(OPENER, 1, "Boost")
            .with_usage(
                PatchUsage::simple(UsageId(1), patch("Piano", 0), range(LOWER, "C3", "C5"))
                    .with_effect(VelocityScale(2.0)),
            )
            .with_effect(VelocityScale(0.5)),
    );
    let rig = Rig::new(setlist);
    rig.enter(0);

    // 100 * 2 = 200 overflows only in between; halved it lands back at 100.
    rig.press(LOWER_CH, "C4", 100);
    assert_eq!(rig.sink.note_ons(), vec![(0, 60, 100)]);
}

#[test]
fn test_global_effects_can_be_disabled_per_cue() {
    let setlist = stage(&[0])
        .with_global_effects(EffectChain::new().with(FixedVelocity(64)))
        .with_cue(piano_cue())
        .with_cue(
            Cue::new(OPENER, 9, "Dry")
                .with_usage(PatchUsage::simple(
                    UsageId(2),
                    patch("Piano", 0),
                    range(LOWER, "C3", "C5"),
                ))
                .without_global_effects(),
        );
    let rig = Rig::new(setlist);

    rig.enter(0);
    rig.press(LOWER_CH, "C4", 100);
    rig.release(LOWER_CH, "C4");
    assert_eq!(rig.sink.note_ons(), vec![(0, 60, 64)]);

    rig.enter(1);
    rig.press(LOWER_CH, "C4", 100);
    assert_eq!(rig.sink.note_ons(), vec![(0, 60, 100)]);
}

#[test]
fn test_notes_before_first_cue_are_ignored() {
    let rig = Rig::new(stage(&[0]).with_cue(piano_cue()));
    rig.press(LOWER_CH, "C4", 100);
    rig.release(LOWER_CH, "C4");
    assert!(rig.sink.messages().is_empty());
}

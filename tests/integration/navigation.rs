//! Navigation integration tests
//!
//! Tests moving through the setlist: stepping, jumping by song and measure,
//! restart, live edits and shutdown.

use crate::helpers::*;
use cueflow::core::Error;
use cueflow::prelude::*;

fn usage(id: u32, name: &str, program: u8) -> PatchUsage {
    PatchUsage::simple(UsageId(id), patch(name, program), range(LOWER, "C3", "C5"))
}

/// Opener has cues at measures 1 and 17; Closer at 1, 9 and 33.
fn show() -> Setlist {
    stage(&[0, 1, 2, 3])
        .with_cue(Cue::new(CLOSER, 9, "Closer bridge").with_usage(usage(4, "Organ", 16)))
        .with_cue(Cue::new(OPENER, 17, "Opener chorus").with_usage(usage(2, "Strings", 48)))
        .with_cue(Cue::new(OPENER, 1, "Opener intro").with_usage(usage(1, "Piano", 0)))
        .with_cue(Cue::new(CLOSER, 1, "Closer intro").with_usage(usage(3, "Piano", 0)))
        .with_cue(Cue::new(CLOSER, 33, "Closer outro").with_usage(usage(5, "Choir", 52)))
}

#[test]
fn test_first_advance_enters_first_cue() {
    let rig = Rig::new(show());
    assert_eq!(rig.cueflow.position(), Position::Uninitialized);

    rig.cueflow.advance();

    assert_eq!(rig.cueflow.position(), Position::Active(0));
    assert_eq!(
        rig.engine().current_cue_name().as_deref(),
        Some("Opener intro")
    );
    assert_eq!(rig.sink.program_changes(), vec![(0, 0)]);
    assert!(rig.sink.control_changes().contains(&(0, 7, 100)));
    assert_eq!(
        rig.drain_events(),
        vec![PerformanceEvent::LocationChanged {
            index: 0,
            song: OPENER,
            measure: 1,
            name: "Opener intro".to_string(),
        }]
    );
}

#[test]
fn test_cues_are_ordered_by_song_then_measure() {
    let rig = Rig::new(show());
    let keys: Vec<(SongId, u32)> = rig
        .engine()
        .with_setlist(|s| s.cues.iter().map(|c| (c.song, c.measure)).collect());
    assert_eq!(
        keys,
        vec![
            (OPENER, 1),
            (OPENER, 17),
            (CLOSER, 1),
            (CLOSER, 9),
            (CLOSER, 33)
        ]
    );
}

#[test]
fn test_advance_and_reverse_clamp() {
    let rig = Rig::new(show());

    rig.cueflow.reverse();
    assert_eq!(rig.cueflow.position(), Position::Active(0));
    rig.cueflow.reverse();
    assert_eq!(rig.cueflow.position(), Position::Active(0));

    for _ in 0..10 {
        rig.cueflow.advance();
    }
    assert_eq!(rig.cueflow.position(), Position::Active(4));

    rig.cueflow.reverse();
    assert_eq!(rig.cueflow.position(), Position::Active(3));
}

#[test]
fn test_go_to_out_of_range() {
    let rig = Rig::new(show());
    assert_eq!(
        rig.cueflow.go_to(5),
        Err(Error::CueOutOfRange { index: 5, len: 5 })
    );
    assert_eq!(rig.cueflow.position(), Position::Uninitialized);
}

#[test]
fn test_go_to_song_finds_cue_in_effect() {
    let rig = Rig::new(show());

    rig.cueflow.go_to_song(CLOSER, 20).unwrap();
    assert_eq!(
        rig.engine().current_cue(),
        Some(CueKey {
            song: CLOSER,
            measure: 9
        })
    );

    rig.cueflow.go_to_song(CLOSER, 9).unwrap();
    assert_eq!(rig.cueflow.position(), Position::Active(3));

    rig.cueflow.go_to_song(OPENER, 0).unwrap();
    assert_eq!(rig.cueflow.position(), Position::Active(0));

    rig.cueflow.go_to_song(CLOSER, 1000).unwrap();
    assert_eq!(rig.cueflow.position(), Position::Active(4));
}

#[test]
fn test_go_to_unknown_song_or_cue() {
    let rig = Rig::new(show());
    assert_eq!(
        rig.cueflow.go_to_song(SongId(42), 1),
        Err(Error::UnknownSong(SongId(42)))
    );

    let missing = CueKey {
        song: OPENER,
        measure: 2,
    };
    assert_eq!(rig.cueflow.go_to_cue(&missing), Err(Error::UnknownCue(missing)));

    rig.cueflow
        .go_to_cue(&CueKey {
            song: OPENER,
            measure: 17,
        })
        .unwrap();
    assert_eq!(rig.cueflow.position(), Position::Active(1));
}

#[test]
fn test_same_cue_is_not_reapplied() {
    let rig = Rig::new(show());
    rig.enter(2);

    rig.cueflow.go_to(2).unwrap();

    assert!(rig.sink.messages().is_empty());
    assert!(rig.drain_events().is_empty());
}

#[test]
fn test_reload_keeps_loaded_patches() {
    let rig = Rig::new(show());
    rig.enter(1);

    rig.engine().reload();

    assert!(rig.sink.program_changes().is_empty());
    assert_eq!(rig.engine().assigned_channel(UsageId(2)), Some(0));
    assert_eq!(rig.drain_events().len(), 1);
}

#[test]
fn test_restart_panics_then_returns_to_top() {
    let rig = Rig::new(show());
    rig.enter(3);
    rig.press(LOWER_CH, "C4", 100);
    rig.sink.clear();

    rig.cueflow.restart();

    assert_eq!(rig.cueflow.position(), Position::Active(0));
    let all_notes_off = rig
        .sink
        .control_changes()
        .into_iter()
        .filter(|&(_, cc, _)| cc == 123)
        .count();
    assert_eq!(all_notes_off, 16);

    let events = rig.drain_events();
    assert_eq!(events.first(), Some(&PerformanceEvent::Panic));
    assert!(matches!(
        events.last(),
        Some(PerformanceEvent::LocationChanged { index: 0, .. })
    ));

    // The held note was forgotten by the panic.
    rig.sink.clear();
    rig.release(LOWER_CH, "C4");
    assert!(rig.sink.note_offs().is_empty());
}

#[test]
fn test_panic_uses_configured_controllers() {
    let config = EngineConfig {
        panic_controllers: vec![64, 120, 123],
        ..EngineConfig::default()
    };
    let rig = Rig::with_config(show(), config);
    rig.enter(0);

    rig.cueflow.panic();

    let ccs = rig.sink.control_changes();
    assert_eq!(ccs.len(), 48);
    assert_eq!(ccs[0], (0, 64, 0));
    assert_eq!(ccs[16], (0, 120, 0));
    assert_eq!(ccs[47], (15, 123, 0));
}

#[test]
fn test_edit_reloads_current_cue() {
    let rig = Rig::new(show());
    rig.enter(0);

    rig.engine()
        .edit_setlist(|setlist| {
            let cue = setlist.cues[0].clone().with_usage(PatchUsage::simple(
                UsageId(10),
                patch("Strings", 48),
                range(LOWER, "C4", "C5"),
            ));
            setlist.cues[0] = cue;
        })
        .unwrap();

    assert_eq!(rig.cueflow.position(), Position::Active(0));
    assert_eq!(rig.engine().assigned_channel(UsageId(1)), Some(0));
    assert_eq!(rig.engine().assigned_channel(UsageId(10)), Some(1));
    assert_eq!(rig.sink.program_changes(), vec![(1, 48)]);

    rig.sink.clear();
    rig.press(LOWER_CH, "C4", 100);
    assert_eq!(rig.sink.note_ons(), vec![(0, 60, 100), (1, 60, 100)]);
}

#[test]
fn test_invalid_edit_is_discarded() {
    let rig = Rig::new(show());
    rig.enter(0);

    let result = rig.engine().edit_setlist(|setlist| {
        let cue = setlist.cues[1].clone().with_usage(usage(1, "Clone", 1));
        setlist.cues[1] = cue;
    });

    assert_eq!(result, Err(Error::DuplicateUsageId(UsageId(1))));
    assert_eq!(rig.engine().with_setlist(|s| s.cues[1].assignments.len()), 1);
    assert!(rig.sink.messages().is_empty());
}

#[test]
fn test_edit_clamps_position_when_cues_removed() {
    let rig = Rig::new(show());
    rig.enter(4);

    rig.engine()
        .edit_setlist(|setlist| setlist.cues.truncate(2))
        .unwrap();
    assert_eq!(rig.cueflow.position(), Position::Active(1));

    rig.engine()
        .edit_setlist(|setlist| setlist.cues.clear())
        .unwrap();
    assert_eq!(rig.cueflow.position(), Position::Uninitialized);
    assert!(rig.engine().assignments().is_empty());
}

#[test]
fn test_shutdown_is_terminal() {
    let rig = Rig::new(show());
    rig.enter(0);

    rig.cueflow.shutdown();
    assert_eq!(rig.cueflow.position(), Position::ShutDown);
    assert_eq!(rig.drain_events().last(), Some(&PerformanceEvent::ShutDown));

    rig.sink.clear();
    rig.press(LOWER_CH, "C4", 100);
    rig.cueflow.advance();
    assert!(rig.sink.messages().is_empty());
    assert_eq!(rig.cueflow.go_to(0), Err(Error::ShutDown));
    assert_eq!(rig.cueflow.position(), Position::ShutDown);
}

#[test]
fn test_builder_requires_output() {
    let result = Cueflow::builder(show()).build();
    assert!(matches!(
        result,
        Err(cueflow::Error::Core(Error::InvalidConfig(_)))
    ));
}
